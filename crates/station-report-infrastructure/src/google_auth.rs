//! Google OAuth2 for the Sheets backend.
//!
//! A service-account key signs a short-lived RS256 assertion which the token
//! endpoint exchanges for a bearer token. Tokens are cached and minted again
//! shortly before they expire, or as soon as the API rejects one.

use crate::sheets_sink::{classify_send_error, status_fault};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use station_report_core::PersistError;
use std::path::Path;
use tokio::sync::Mutex;

pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Longest assertion lifetime Google accepts.
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens this close to expiry are replaced before use.
const REFRESH_MARGIN_SECS: i64 = 60;

/// The fields of a downloaded service-account `credentials.json` that
/// sign-in needs.
#[derive(Deserialize, Clone)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        // the error message must not echo the key
        serde_json::from_str(&content).map_err(|e| {
            anyhow::anyhow!(
                "Failed to parse service-account key {}: line {}",
                path.display(),
                e.line()
            )
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Mints and caches access tokens for one service account.
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .context("Invalid service-account private key")?;
        Ok(Self {
            key,
            encoding_key,
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String, PersistError> {
        let claims = AssertionClaims {
            iss: self.key.client_email.clone(),
            scope: SHEETS_SCOPE.to_string(),
            aud: self.key.token_uri.clone(),
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| PersistError::permanent(format!("JWT encode: {e}")))
    }

    /// A token valid for at least the refresh margin.
    pub async fn token(&self, client: &Client) -> Result<String, PersistError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }
        let fresh = self.exchange(client, now).await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn exchange(&self, client: &Client, now: DateTime<Utc>) -> Result<CachedToken, PersistError> {
        let assertion = self.assertion(now)?;
        let response = client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| classify_send_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_fault(status, &body));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PersistError::transient(format!("token response: {e}")))?;
        tracing::debug!(
            client_email = %self.key.client_email,
            expires_in = token.expires_in,
            "access token minted"
        );
        let expires_at = Duration::try_seconds(token.expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or(now);
        Ok(CachedToken {
            value: token.access_token,
            expires_at,
        })
    }

    /// Drops the cached token so the next call mints a new one.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}

/// How the Sheets sink authenticates.
pub enum SheetsAuth {
    /// Pre-minted token from `secret.json` or the environment.
    Static(String),
    ServiceAccount(ServiceAccountAuth),
}

impl std::fmt::Debug for SheetsAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetsAuth::Static(_) => f.write_str("Static(..)"),
            SheetsAuth::ServiceAccount(auth) => f
                .debug_tuple("ServiceAccount")
                .field(&auth.client_email())
                .finish(),
        }
    }
}

impl SheetsAuth {
    pub async fn bearer(&self, client: &Client) -> Result<String, PersistError> {
        match self {
            SheetsAuth::Static(token) => Ok(token.clone()),
            SheetsAuth::ServiceAccount(auth) => auth.token(client).await,
        }
    }

    /// Handles a 401 from the API; returns whether a retry can succeed.
    pub async fn rejected(&self) -> bool {
        match self {
            SheetsAuth::Static(_) => false,
            SheetsAuth::ServiceAccount(auth) => {
                auth.invalidate().await;
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_http::{Reply, serve};
    use jsonwebtoken::{DecodingKey, Validation};

    const PRIVATE_KEY: &str = include_str!("../testdata/service_account_key.pem");
    const PUBLIC_KEY: &str = include_str!("../testdata/service_account_pub.pem");

    fn key(token_uri: &str) -> ServiceAccountKey {
        ServiceAccountKey {
            client_email: "reports@station.iam.gserviceaccount.com".to_string(),
            private_key: PRIVATE_KEY.to_string(),
            token_uri: token_uri.to_string(),
        }
    }

    #[test]
    fn test_assertion_is_signed_for_token_endpoint() {
        let auth = ServiceAccountAuth::new(key(DEFAULT_TOKEN_URI)).unwrap();
        let now = Utc::now();
        let jwt = auth.assertion(now).unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[DEFAULT_TOKEN_URI]);
        let claims = jsonwebtoken::decode::<AssertionClaims>(
            &jwt,
            &DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap()
        .claims;
        assert_eq!(claims.iss, "reports@station.iam.gserviceaccount.com");
        assert_eq!(claims.scope, SHEETS_SCOPE);
        assert_eq!(claims.exp - claims.iat, ASSERTION_LIFETIME_SECS);
    }

    #[test]
    fn test_key_file_parsing() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::json!({
            "type": "service_account",
            "client_email": "reports@station.iam.gserviceaccount.com",
            "private_key": PRIVATE_KEY,
            "private_key_id": "abc",
        });
        std::fs::write(file.path(), json.to_string()).unwrap();

        let key = ServiceAccountKey::from_file(file.path()).unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        assert!(!format!("{key:?}").contains("PRIVATE KEY"));
        assert!(ServiceAccountAuth::new(key).is_ok());
    }

    #[test]
    fn test_invalid_private_key_rejected() {
        let mut bad = key(DEFAULT_TOKEN_URI);
        bad.private_key = "not a key".to_string();
        assert!(ServiceAccountAuth::new(bad).is_err());
    }

    #[test]
    fn test_token_freshness_margin() {
        let now = Utc::now();
        let token = |secs: i64| CachedToken {
            value: "t".to_string(),
            expires_at: now + Duration::try_seconds(secs).unwrap(),
        };
        assert!(token(3600).is_fresh(now));
        assert!(!token(REFRESH_MARGIN_SECS).is_fresh(now));
        assert!(!token(-5).is_fresh(now));
    }

    #[tokio::test]
    async fn test_token_is_cached_until_invalidated() {
        let server = serve(vec![
            Reply::json(200, r#"{"access_token":"first","expires_in":3600}"#),
            Reply::json(200, r#"{"access_token":"second","expires_in":3600}"#),
        ])
        .await;
        let auth = ServiceAccountAuth::new(key(&server.url("/token"))).unwrap();
        let client = Client::new();

        assert_eq!(auth.token(&client).await.unwrap(), "first");
        assert_eq!(auth.token(&client).await.unwrap(), "first");
        assert_eq!(server.requests().len(), 1);
        assert!(server.requests()[0].body.contains("grant_type=urn%3Aietf"));

        auth.invalidate().await;
        assert_eq!(auth.token(&client).await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_token_endpoint_errors_are_classified() {
        let server = serve(vec![
            Reply::json(503, "{}"),
            Reply::json(400, r#"{"error":"invalid_grant"}"#),
        ])
        .await;
        let auth = ServiceAccountAuth::new(key(&server.url("/token"))).unwrap();
        let client = Client::new();

        assert!(auth.token(&client).await.unwrap_err().is_transient());
        let err = auth.token(&client).await.unwrap_err();
        assert!(!err.is_transient());
        assert!(err.to_string().contains("invalid_grant"));
    }

    #[tokio::test]
    async fn test_static_token_cannot_be_refreshed() {
        let auth = SheetsAuth::Static("token".to_string());
        assert_eq!(auth.bearer(&Client::new()).await.unwrap(), "token");
        assert!(!auth.rejected().await);
        assert_eq!(format!("{auth:?}"), "Static(..)");
    }
}
