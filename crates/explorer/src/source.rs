//! Source trait for address statistics.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ExplorerResult;

/// Transaction direction for count queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Outgoing => "out",
            Direction::Incoming => "in",
        }
    }
}

/// Age of an address's most recent and earliest transactions, in whole days.
///
/// Both fields are `None` for an address with no transaction history.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ActivityWindow {
    pub latest_days_ago: Option<u64>,
    pub first_days_ago: Option<u64>,
}

/// Trait for address statistics sources.
///
/// Each method is one independent fetch against the remote source; any of
/// them can fail on its own without affecting the others.
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Fetch the native-token balance of an address, in native units.
    async fn native_balance(&self, address: &str) -> ExplorerResult<Decimal>;

    /// Fetch how many days ago the address last and first transacted.
    async fn activity_window(&self, address: &str) -> ExplorerResult<ActivityWindow>;

    /// Fetch the number of transactions sent from (`Outgoing`) or received
    /// by (`Incoming`) the address.
    async fn transaction_count(&self, address: &str, direction: Direction)
        -> ExplorerResult<u64>;
}
