//! Metric enrichers mapping fetch outcomes to output values.

use async_trait::async_trait;
use tracing::warn;

use addrstats_explorer::{AddressSource, Direction, ExplorerError};

use crate::output::MetricValue;

/// Produces one row's metric values for an address.
///
/// `enrich` returns `Err` only for fatal failures that end the run; a fetch
/// that merely fails for this address is logged and mapped to
/// [`MetricValue::Missing`].
#[async_trait]
pub trait AddressEnricher: Send + Sync {
    /// Header names for the metric columns, in output order.
    fn metric_columns(&self) -> &'static [&'static str];

    /// Fetch all metrics for one address. The returned vector always has
    /// `metric_columns().len()` entries.
    async fn enrich(&self, address: &str) -> Result<Vec<MetricValue>, ExplorerError>;
}

/// Native balance plus latest/first transaction age.
pub struct OverviewEnricher<S> {
    source: S,
}

impl<S> OverviewEnricher<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<S: AddressSource> AddressEnricher for OverviewEnricher<S> {
    fn metric_columns(&self) -> &'static [&'static str] {
        &["eth_balance", "latest_days_ago", "first_days_ago"]
    }

    async fn enrich(&self, address: &str) -> Result<Vec<MetricValue>, ExplorerError> {
        let balance = match self.source.native_balance(address).await {
            Ok(balance) => MetricValue::Present(balance.to_string()),
            Err(err) => fetch_failed(address, "balance", err)?,
        };

        // One fetch backs both age columns; an address with no history gets
        // the sentinel in each.
        let (latest, first) = match self.source.activity_window(address).await {
            Ok(window) => (
                days_value(window.latest_days_ago),
                days_value(window.first_days_ago),
            ),
            Err(err) => {
                let missing = fetch_failed(address, "activity window", err)?;
                (missing.clone(), missing)
            }
        };

        Ok(vec![balance, latest, first])
    }
}

/// Outgoing and incoming transaction counts.
pub struct TxCountEnricher<S> {
    source: S,
}

impl<S> TxCountEnricher<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<S: AddressSource> AddressEnricher for TxCountEnricher<S> {
    fn metric_columns(&self) -> &'static [&'static str] {
        &["out_txn", "in_txn"]
    }

    async fn enrich(&self, address: &str) -> Result<Vec<MetricValue>, ExplorerError> {
        let mut values = Vec::with_capacity(2);
        for direction in [Direction::Outgoing, Direction::Incoming] {
            let value = match self.source.transaction_count(address, direction).await {
                Ok(count) => MetricValue::Present(count.to_string()),
                Err(err) => fetch_failed(address, direction.as_str(), err)?,
            };
            values.push(value);
        }
        Ok(values)
    }
}

/// Map a fetch failure to a missing metric, or propagate it when fatal.
fn fetch_failed(
    address: &str,
    what: &str,
    err: ExplorerError,
) -> Result<MetricValue, ExplorerError> {
    if err.is_fatal() {
        return Err(err);
    }
    warn!("Failed to fetch {} for {}: {}", what, address, err);
    Ok(MetricValue::Missing)
}

fn days_value(days: Option<u64>) -> MetricValue {
    match days {
        Some(days) => MetricValue::Present(days.to_string()),
        None => MetricValue::Missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use addrstats_explorer::{ActivityWindow, ExplorerResult};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[derive(Default)]
    struct StubSource {
        balance_fails: bool,
        counts_fatal: bool,
        no_history: bool,
    }

    #[async_trait]
    impl AddressSource for StubSource {
        async fn native_balance(&self, _address: &str) -> ExplorerResult<Decimal> {
            if self.balance_fails {
                Err(ExplorerError::Timeout)
            } else {
                Ok(Decimal::from_str("1.5").unwrap())
            }
        }

        async fn activity_window(&self, _address: &str) -> ExplorerResult<ActivityWindow> {
            if self.no_history {
                Ok(ActivityWindow::default())
            } else {
                Ok(ActivityWindow {
                    latest_days_ago: Some(3),
                    first_days_ago: Some(120),
                })
            }
        }

        async fn transaction_count(
            &self,
            _address: &str,
            _direction: Direction,
        ) -> ExplorerResult<u64> {
            if self.counts_fatal {
                Err(ExplorerError::SessionRejected("HTTP 403 Forbidden".to_string()))
            } else {
                Ok(42)
            }
        }
    }

    #[tokio::test]
    async fn test_overview_happy_path() {
        let enricher = OverviewEnricher::new(StubSource::default());
        let values = enricher.enrich("0xabc").await.unwrap();
        assert_eq!(
            values,
            vec![
                MetricValue::Present("1.5".to_string()),
                MetricValue::Present("3".to_string()),
                MetricValue::Present("120".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_overview_balance_failure_becomes_missing() {
        let enricher = OverviewEnricher::new(StubSource {
            balance_fails: true,
            ..Default::default()
        });
        let values = enricher.enrich("0xabc").await.unwrap();
        assert_eq!(values[0], MetricValue::Missing);
        assert_eq!(values[1], MetricValue::Present("3".to_string()));
        assert_eq!(values[2], MetricValue::Present("120".to_string()));
    }

    #[tokio::test]
    async fn test_overview_no_history_has_missing_ages() {
        let enricher = OverviewEnricher::new(StubSource {
            no_history: true,
            ..Default::default()
        });
        let values = enricher.enrich("0xabc").await.unwrap();
        assert_eq!(values[1], MetricValue::Missing);
        assert_eq!(values[2], MetricValue::Missing);
    }

    #[tokio::test]
    async fn test_tx_counts_happy_path() {
        let enricher = TxCountEnricher::new(StubSource::default());
        let values = enricher.enrich("0xabc").await.unwrap();
        assert_eq!(
            values,
            vec![
                MetricValue::Present("42".to_string()),
                MetricValue::Present("42".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_tx_counts_fatal_propagates() {
        let enricher = TxCountEnricher::new(StubSource {
            counts_fatal: true,
            ..Default::default()
        });
        let err = enricher.enrich("0xabc").await.unwrap_err();
        assert!(err.is_fatal());
    }
}
