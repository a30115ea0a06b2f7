//! Google Sheets backend: one `values:append` call per report.

use crate::google_auth::SheetsAuth;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::json;
use station_report_core::PersistError;
use station_report_core::config::SheetsConfig;
use station_report_core::report::{Report, ReportSink, report_row};
use std::time::Duration;

/// Appends report rows to a spreadsheet through the Sheets v4 REST API.
pub struct GoogleSheetsSink {
    client: Client,
    endpoint: Url,
    auth: SheetsAuth,
}

impl std::fmt::Debug for GoogleSheetsSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSheetsSink")
            .field("endpoint", &self.endpoint.as_str())
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl GoogleSheetsSink {
    pub fn new(config: &SheetsConfig, auth: SheetsAuth, timeout: Duration) -> Result<Self> {
        if config.spreadsheet_id.trim().is_empty() {
            anyhow::bail!("persistence.sheets.spreadsheet_id is not set");
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: append_endpoint(config)?,
            auth,
        })
    }
}

/// `{api_base}/v4/spreadsheets/{id}/values/{range}:append` with the
/// query that inserts the row as if typed by a user.
fn append_endpoint(config: &SheetsConfig) -> Result<Url> {
    let range_segment = format!("{}:append", config.range);
    let mut url = Url::parse(&config.api_base)
        .with_context(|| format!("Invalid Sheets API base: {}", config.api_base))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("Sheets API base cannot carry a path: {}", config.api_base))?
        .pop_if_empty()
        .extend([
            "v4",
            "spreadsheets",
            config.spreadsheet_id.as_str(),
            "values",
            range_segment.as_str(),
        ]);
    url.query_pairs_mut()
        .append_pair("valueInputOption", "USER_ENTERED")
        .append_pair("insertDataOption", "INSERT_ROWS");
    Ok(url)
}

/// Maps a non-success HTTP status to a persistence fault.
///
/// Throttling, request timeouts and server errors are worth retrying;
/// anything else (bad token, missing sheet, malformed range) is not.
fn classify_status(status: StatusCode, body: &str) -> Result<(), PersistError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(status_fault(status, body))
    }
}

/// Fault for a status already known to be unsuccessful.
pub(crate) fn status_fault(status: StatusCode, body: &str) -> PersistError {
    let message = match body.trim() {
        "" => status.to_string(),
        body => format!("{status}: {}", truncate(body, 200)),
    };
    if status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
    {
        PersistError::transient(message)
    } else {
        PersistError::permanent(message)
    }
}

pub(crate) fn classify_send_error(err: &reqwest::Error) -> PersistError {
    if err.is_builder() {
        PersistError::permanent(err.to_string())
    } else {
        PersistError::transient(err.to_string())
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl ReportSink for GoogleSheetsSink {
    async fn append_report_row(&self, report: &Report) -> Result<(), PersistError> {
        let body = json!({ "values": [report_row(report)] });
        let token = self.auth.bearer(&self.client).await?;
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_send_error(&e))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        // an expired or revoked token is worth one retry when it can be re-minted
        if status == StatusCode::UNAUTHORIZED && self.auth.rejected().await {
            tracing::warn!(%status, "access token rejected, minting a new one");
            return Err(PersistError::transient(format!("{status}: access token rejected")));
        }
        classify_status(status, &text)?;
        tracing::debug!(%status, date = %report.date, "row appended to spreadsheet");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google_auth::{ServiceAccountAuth, ServiceAccountKey};
    use crate::test_http::{Reply, serve};
    use chrono::NaiveDate;
    use station_report_core::report::{DebtEntry, FuelBlock, FuelType};

    const PRIVATE_KEY: &str = include_str!("../testdata/service_account_key.pem");

    fn report() -> Report {
        let block = |fuel| FuelBlock {
            fuel,
            counter_reading: 1000,
            sold_cash: 300,
            sold_card: 200,
            total_sold: 500,
            debtors: vec![DebtEntry::none()],
        };
        Report {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            operator: "Иванова".to_string(),
            temperature: 5.5,
            comments: "Без комментариев".to_string(),
            blocks: [block(FuelType::Ai92), block(FuelType::Dt)],
        }
    }

    fn service_account(token_uri: String) -> SheetsAuth {
        let key = ServiceAccountKey {
            client_email: "reports@station.iam.gserviceaccount.com".to_string(),
            private_key: PRIVATE_KEY.to_string(),
            token_uri,
        };
        SheetsAuth::ServiceAccount(ServiceAccountAuth::new(key).unwrap())
    }

    fn sink_for(base: &str, auth: SheetsAuth) -> GoogleSheetsSink {
        let config = SheetsConfig {
            api_base: base.to_string(),
            ..config()
        };
        GoogleSheetsSink::new(&config, auth, Duration::from_secs(5)).unwrap()
    }

    fn config() -> SheetsConfig {
        SheetsConfig {
            spreadsheet_id: "abc123".to_string(),
            ..SheetsConfig::default()
        }
    }

    #[test]
    fn test_append_endpoint() {
        let url = append_endpoint(&config()).unwrap();
        assert_eq!(url.host_str(), Some("sheets.googleapis.com"));
        assert!(url.path().starts_with("/v4/spreadsheets/abc123/values/"));
        assert!(url.path().ends_with(":append"));
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            query,
            vec![
                ("valueInputOption".to_string(), "USER_ENTERED".to_string()),
                ("insertDataOption".to_string(), "INSERT_ROWS".to_string()),
            ]
        );
    }

    #[test]
    fn test_append_endpoint_respects_base_path() {
        let config = SheetsConfig {
            api_base: "http://localhost:8080/proxy/".to_string(),
            range: "Sheet1!A1".to_string(),
            ..config()
        };
        let url = append_endpoint(&config).unwrap();
        assert_eq!(
            url.path(),
            "/proxy/v4/spreadsheets/abc123/values/Sheet1!A1:append"
        );
    }

    #[test]
    fn test_status_classification() {
        assert!(classify_status(StatusCode::OK, "{}").is_ok());
        for status in [
            StatusCode::REQUEST_TIMEOUT,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            assert!(classify_status(status, "").unwrap_err().is_transient());
        }
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::UNAUTHORIZED,
            StatusCode::FORBIDDEN,
            StatusCode::NOT_FOUND,
        ] {
            assert!(!classify_status(status, "").unwrap_err().is_transient());
        }
    }

    #[test]
    fn test_fault_message_carries_status_and_body() {
        let err = classify_status(StatusCode::FORBIDDEN, "  caller lacks permission ").unwrap_err();
        assert!(err.to_string().contains("403 Forbidden: caller lacks permission"));
    }

    #[test]
    fn test_requires_spreadsheet_id() {
        let err = GoogleSheetsSink::new(
            &SheetsConfig::default(),
            SheetsAuth::Static("token".to_string()),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(err.to_string().contains("spreadsheet_id"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("Лист", 2), "Ли");
        assert_eq!(truncate("ok", 10), "ok");
    }

    #[tokio::test]
    async fn test_append_sends_row_with_bearer_token() {
        let server = serve(vec![Reply::json(200, "{}")]).await;
        let sink = sink_for(server.base(), SheetsAuth::Static("static-token".to_string()));

        sink.append_report_row(&report()).await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].line.starts_with("POST /v4/spreadsheets/abc123/values/"));
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer static-token"));
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body["values"][0][0], "01.03.2024");
        assert_eq!(body["values"][0].as_array().unwrap().len(), 22);
    }

    #[tokio::test]
    async fn test_rejected_static_token_is_permanent() {
        let server = serve(vec![Reply::json(401, "{}")]).await;
        let sink = sink_for(server.base(), SheetsAuth::Static("expired".to_string()));
        let err = sink.append_report_row(&report()).await.unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_expired_service_account_token_is_reminted() {
        let server = serve(vec![
            Reply::json(200, r#"{"access_token":"old","expires_in":3600}"#),
            Reply::json(401, r#"{"error":{"status":"UNAUTHENTICATED"}}"#),
            Reply::json(200, r#"{"access_token":"new","expires_in":3600}"#),
            Reply::json(200, "{}"),
        ])
        .await;
        let sink = sink_for(server.base(), service_account(server.url("/token")));

        let err = sink.append_report_row(&report()).await.unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("access token rejected"));
        sink.append_report_row(&report()).await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 4);
        assert!(requests[0].line.starts_with("POST /token"));
        assert_eq!(requests[1].authorization.as_deref(), Some("Bearer old"));
        assert!(requests[2].line.starts_with("POST /token"));
        assert_eq!(requests[3].authorization.as_deref(), Some("Bearer new"));
    }
}
