//! Error types for the station report service.

use thiserror::Error;

/// Failure reported by a persistence collaborator when appending a report row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistError {
    /// The backing API failed in a way that may succeed on a second attempt
    /// (rate limiting, 5xx, network errors, timeouts).
    #[error("Transient persistence fault: {0}")]
    TransientApiFault(String),

    /// The write can not succeed without operator intervention
    /// (bad credentials, missing spreadsheet, malformed request).
    #[error("Permanent persistence fault: {0}")]
    PermanentFault(String),
}

impl PersistError {
    /// Creates a transient fault
    pub fn transient(message: impl Into<String>) -> Self {
        Self::TransientApiFault(message.into())
    }

    /// Creates a permanent fault
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::PermanentFault(message.into())
    }

    /// Check if a retry of the same write is worthwhile
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientApiFault(_))
    }
}

/// A shared error type for the station report crates.
///
/// Bad user input never shows up here: validators return `Option` and the
/// conversation machine re-prompts in place.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Writing the assembled report failed
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// The messaging collaborator could not deliver an outbound effect
    #[error("Transport error: {0}")]
    Transport(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A report was committed before every field was collected
    #[error("Incomplete report: missing {0}")]
    IncompleteReport(&'static str),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReportError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a persistence error
    pub fn is_persist(&self) -> bool {
        matches!(self, Self::Persist(_))
    }

    /// Check if this is a retryable persistence error
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Persist(e) if e.is_transient())
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ReportError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for ReportError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, ReportError>`.
pub type Result<T> = std::result::Result<T, ReportError>;
