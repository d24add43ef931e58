//! HTTP client for Etherscan-compatible explorer APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use addrstats_telemetry::Metrics;

use crate::error::{ExplorerError, ExplorerResult};
use crate::source::{ActivityWindow, AddressSource, Direction};

/// User agent presented to the explorer.
const USER_AGENT: &str = "Mozilla/5.0 (compatible; addrstats/0.1)";

/// Number of wei in one native unit.
const WEI_PER_NATIVE: u64 = 1_000_000_000_000_000_000;

/// Client for an Etherscan-compatible explorer API.
///
/// The explorer is expected to answer `GET {base_url}/api` with the usual
/// `{status, message, result}` envelope for the `account` module actions
/// used here: `balance`, `txlist` (with `page`/`offset`/`sort`), and
/// `txcount` (with `direction=out|in`).
///
/// The underlying HTTP session is built once, before the enrichment loop
/// starts, and released when the client is dropped.
pub struct ExplorerClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    metrics: Metrics,
}

impl ExplorerClient {
    /// Build the HTTP session used for the whole run.
    ///
    /// # Arguments
    /// * `base_url` - Explorer origin (e.g., `https://api.etherscan.io`)
    /// * `api_key` - Optional API key appended to every query
    /// * `timeout` - Per-request timeout
    /// * `metrics` - Metrics collector
    pub fn connect(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
        metrics: Metrics,
    ) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        info!("Initialized explorer client for {}", base_url);

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            metrics,
        })
    }

    async fn call_api(
        &self,
        address: &str,
        action: &str,
        extra: &[(&str, &str)],
    ) -> ExplorerResult<Value> {
        let url = format!("{}/api", self.base_url);
        let mut query: Vec<(&str, &str)> = vec![
            ("module", "account"),
            ("action", action),
            ("address", address),
        ];
        query.extend_from_slice(extra);
        if let Some(key) = self.api_key.as_deref() {
            query.push(("apikey", key));
        }

        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ExplorerError::SessionRejected(format!("HTTP {}", status)));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ExplorerError::RateLimited);
        }
        if !status.is_success() {
            return Err(ExplorerError::Http(status.as_u16()));
        }

        let body: Value = response.json().await.map_err(map_transport)?;
        unwrap_envelope(address, body)
    }

    async fn balance_inner(&self, address: &str) -> ExplorerResult<Decimal> {
        let result = self.call_api(address, "balance", &[("tag", "latest")]).await?;
        let wei = result
            .as_str()
            .ok_or_else(|| ExplorerError::Malformed("balance result is not a string".to_string()))?;
        let balance = wei_to_native(wei)?;
        debug!("Balance for {}: {}", address, balance);
        Ok(balance)
    }

    async fn activity_inner(&self, address: &str) -> ExplorerResult<ActivityWindow> {
        let newest = self
            .call_api(address, "txlist", &[("page", "1"), ("offset", "1"), ("sort", "desc")])
            .await?;
        let oldest = self
            .call_api(address, "txlist", &[("page", "1"), ("offset", "1"), ("sort", "asc")])
            .await?;

        let now = Utc::now();
        let window = ActivityWindow {
            latest_days_ago: first_tx_age_days(&newest, now)?,
            first_days_ago: first_tx_age_days(&oldest, now)?,
        };
        debug!(
            "Activity for {}: latest {:?} days, first {:?} days",
            address, window.latest_days_ago, window.first_days_ago
        );
        Ok(window)
    }

    async fn count_inner(&self, address: &str, direction: Direction) -> ExplorerResult<u64> {
        let result = self
            .call_api(address, "txcount", &[("direction", direction.as_str())])
            .await?;
        let raw = result
            .as_str()
            .ok_or_else(|| ExplorerError::Malformed("txcount result is not a string".to_string()))?;
        let count = parse_count(raw)?;
        debug!("{} transaction count for {}: {}", direction.as_str(), address, count);
        Ok(count)
    }

    async fn timed<T, F>(&self, operation: &str, fut: F) -> ExplorerResult<T>
    where
        F: std::future::Future<Output = ExplorerResult<T>>,
    {
        let start = Instant::now();
        let result = fut.await;
        self.metrics
            .observe_fetch_latency(operation, start.elapsed().as_secs_f64());
        if result.is_err() {
            self.metrics.inc_fetch_errors();
        }
        result
    }
}

#[async_trait]
impl AddressSource for ExplorerClient {
    async fn native_balance(&self, address: &str) -> ExplorerResult<Decimal> {
        self.timed("balance", self.balance_inner(address)).await
    }

    async fn activity_window(&self, address: &str) -> ExplorerResult<ActivityWindow> {
        self.timed("txlist", self.activity_inner(address)).await
    }

    async fn transaction_count(
        &self,
        address: &str,
        direction: Direction,
    ) -> ExplorerResult<u64> {
        self.timed("txcount", self.count_inner(address, direction)).await
    }
}

fn map_transport(err: reqwest::Error) -> ExplorerError {
    if err.is_timeout() {
        ExplorerError::Timeout
    } else {
        ExplorerError::Network(err)
    }
}

/// Unwrap the `{status, message, result}` envelope used by Etherscan-style
/// APIs into the `result` value.
fn unwrap_envelope(address: &str, body: Value) -> ExplorerResult<Value> {
    let status = body["status"].as_str().unwrap_or_default();
    if status == "1" {
        return Ok(body["result"].clone());
    }

    let message = body["message"].as_str().unwrap_or("");
    // An empty transaction list comes back as an error-status envelope.
    if message.eq_ignore_ascii_case("No transactions found") {
        return Ok(Value::Array(Vec::new()));
    }

    let detail = body["result"].as_str().unwrap_or(message).to_string();
    let lowered = detail.to_ascii_lowercase();
    if lowered.contains("rate limit") {
        return Err(ExplorerError::RateLimited);
    }
    if lowered.contains("invalid address") {
        return Err(ExplorerError::NotFound(address.to_string()));
    }
    Err(ExplorerError::Malformed(format!(
        "status {:?}: {}",
        status, detail
    )))
}

/// Age in whole days of the first transaction in a `txlist` result, if any.
fn first_tx_age_days(result: &Value, now: DateTime<Utc>) -> ExplorerResult<Option<u64>> {
    let txs = result
        .as_array()
        .ok_or_else(|| ExplorerError::Malformed("txlist result is not an array".to_string()))?;
    let tx = match txs.first() {
        Some(tx) => tx,
        None => return Ok(None),
    };

    let raw = tx["timeStamp"]
        .as_str()
        .ok_or_else(|| ExplorerError::Malformed("transaction missing timeStamp".to_string()))?;
    let secs: i64 = raw
        .parse()
        .map_err(|_| ExplorerError::Malformed(format!("bad timestamp: {}", raw)))?;
    let then = DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| ExplorerError::Malformed(format!("timestamp out of range: {}", raw)))?;

    Ok(Some(now.signed_duration_since(then).num_days().max(0) as u64))
}

/// Convert a wei-denominated decimal string to native units.
fn wei_to_native(wei: &str) -> ExplorerResult<Decimal> {
    let wei = Decimal::from_str(wei)
        .map_err(|_| ExplorerError::Malformed(format!("bad balance value: {}", wei)))?;
    Ok((wei / Decimal::from(WEI_PER_NATIVE)).normalize())
}

/// Parse a transaction count, tolerating thousands separators.
fn parse_count(raw: &str) -> ExplorerResult<u64> {
    let cleaned = raw.replace(',', "");
    cleaned
        .trim()
        .parse()
        .map_err(|_| ExplorerError::Malformed(format!("bad transaction count: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_wei_to_native_whole_units() {
        let balance = wei_to_native("1000000000000000000").unwrap();
        assert_eq!(balance.to_string(), "1");
    }

    #[test]
    fn test_wei_to_native_fractional() {
        let balance = wei_to_native("1500000000000000000").unwrap();
        assert_eq!(balance.to_string(), "1.5");
    }

    #[test]
    fn test_wei_to_native_rejects_garbage() {
        assert!(matches!(
            wei_to_native("not-a-number"),
            Err(ExplorerError::Malformed(_))
        ));
    }

    #[test]
    fn test_unwrap_envelope_success() {
        let body = json!({"status": "1", "message": "OK", "result": "42"});
        let result = unwrap_envelope("0xabc", body).unwrap();
        assert_eq!(result, json!("42"));
    }

    #[test]
    fn test_unwrap_envelope_empty_txlist() {
        let body = json!({"status": "0", "message": "No transactions found", "result": []});
        let result = unwrap_envelope("0xabc", body).unwrap();
        assert_eq!(result, json!([]));
    }

    #[test]
    fn test_unwrap_envelope_rate_limit() {
        let body = json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Max rate limit reached",
        });
        assert!(matches!(
            unwrap_envelope("0xabc", body),
            Err(ExplorerError::RateLimited)
        ));
    }

    #[test]
    fn test_unwrap_envelope_invalid_address() {
        let body = json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Error! Invalid address format",
        });
        assert!(matches!(
            unwrap_envelope("0xabc", body),
            Err(ExplorerError::NotFound(address)) if address == "0xabc"
        ));
    }

    #[test]
    fn test_first_tx_age_days() {
        let ten_days_before = 1_700_000_000 - 10 * 86_400;
        let result = json!([{"timeStamp": ten_days_before.to_string()}]);
        let age = first_tx_age_days(&result, fixed_now()).unwrap();
        assert_eq!(age, Some(10));
    }

    #[test]
    fn test_first_tx_age_days_empty_list() {
        let age = first_tx_age_days(&json!([]), fixed_now()).unwrap();
        assert_eq!(age, None);
    }

    #[test]
    fn test_first_tx_age_days_missing_timestamp() {
        let result = json!([{"hash": "0xdeadbeef"}]);
        assert!(matches!(
            first_tx_age_days(&result, fixed_now()),
            Err(ExplorerError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_count_with_separators() {
        assert_eq!(parse_count("1,234").unwrap(), 1234);
        assert_eq!(parse_count("17").unwrap(), 17);
        assert!(parse_count("many").is_err());
    }
}
