//! Persisting a finished report.

use crate::error::PersistError;
use crate::report::{Report, ReportSink};
use std::time::Duration;

/// First attempt plus one retry on a transient fault.
pub const MAX_ATTEMPTS: usize = 2;

/// Appends `report` through `sink`, bounding each attempt by `timeout`.
///
/// An elapsed timeout counts as a transient fault. Transient faults are
/// retried once with the same report; permanent faults return immediately.
pub async fn persist_with_retry(
    sink: &dyn ReportSink,
    report: &Report,
    timeout: Duration,
) -> Result<(), PersistError> {
    let mut attempt = 1;
    loop {
        let outcome = match tokio::time::timeout(timeout, sink.append_report_row(report)).await {
            Ok(result) => result,
            Err(_) => Err(PersistError::transient(format!(
                "append timed out after {:?}",
                timeout
            ))),
        };

        match outcome {
            Ok(()) => return Ok(()),
            Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                tracing::warn!(attempt, error = %e, "transient persistence fault, retrying");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{DebtEntry, FuelBlock, FuelType};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Returns scripted results in order, then succeeds.
    struct ScriptedSink {
        results: Mutex<VecDeque<Result<(), PersistError>>>,
        calls: Mutex<usize>,
        delay: Duration,
    }

    impl ScriptedSink {
        fn new(results: Vec<Result<(), PersistError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                calls: Mutex::new(0),
                delay: Duration::ZERO,
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::new(Vec::new())
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ReportSink for ScriptedSink {
        async fn append_report_row(&self, _report: &Report) -> Result<(), PersistError> {
            *self.calls.lock().unwrap() += 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.results.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }
    }

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

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_success_writes_once() {
        let sink = ScriptedSink::new(vec![Ok(())]);
        persist_with_retry(&sink, &report(), TIMEOUT).await.unwrap();
        assert_eq!(sink.calls(), 1);
    }

    #[tokio::test]
    async fn test_transient_fault_is_retried_once() {
        let sink = ScriptedSink::new(vec![Err(PersistError::transient("503"))]);
        persist_with_retry(&sink, &report(), TIMEOUT).await.unwrap();
        assert_eq!(sink.calls(), 2);
    }

    #[tokio::test]
    async fn test_second_transient_fault_is_surfaced() {
        let sink = ScriptedSink::new(vec![
            Err(PersistError::transient("503")),
            Err(PersistError::transient("503 again")),
        ]);
        let err = persist_with_retry(&sink, &report(), TIMEOUT).await.unwrap_err();
        assert_eq!(err, PersistError::transient("503 again"));
        assert_eq!(sink.calls(), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_permanent_fault_is_not_retried() {
        let sink = ScriptedSink::new(vec![Err(PersistError::permanent("403"))]);
        let err = persist_with_retry(&sink, &report(), TIMEOUT).await.unwrap_err();
        assert!(!err.is_transient());
        assert_eq!(sink.calls(), 1);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_transient() {
        let sink = ScriptedSink::slow(Duration::from_millis(500));
        let err = persist_with_retry(&sink, &report(), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("timed out"));
        assert_eq!(sink.calls(), 2);
    }
}
