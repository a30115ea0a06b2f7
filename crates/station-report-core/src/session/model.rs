//! Session model.

use crate::conversation::ReportMachine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of a chat user, as assigned by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// One user's in-progress report.
///
/// Lives only in memory: created by `/start`, dropped by `/stop` or after a
/// successful submission.
pub struct ReportSession {
    /// Correlates log lines for this report.
    pub id: Uuid,
    pub user: UserId,
    pub started_at: DateTime<Utc>,
    pub machine: ReportMachine,
    /// Set once the session has been removed from the table; events still
    /// queued on its lock are dropped.
    closed: bool,
    /// The last prompt never reached the user.
    prompt_lost: bool,
}

impl ReportSession {
    pub fn new(user: UserId, machine: ReportMachine) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            started_at: Utc::now(),
            machine,
            closed: false,
            prompt_lost: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn mark_prompt_lost(&mut self) {
        self.prompt_lost = true;
    }

    /// Clears and returns the lost-prompt flag.
    pub fn take_prompt_lost(&mut self) -> bool {
        std::mem::take(&mut self.prompt_lost)
    }
}
