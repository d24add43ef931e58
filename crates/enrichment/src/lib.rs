//! Resumable address enrichment.
//!
//! Iterates over an ordered list of labeled addresses, fetches statistics
//! for each through an [`enrichers::AddressEnricher`], and persists both the
//! accumulated CSV results and a last-completed-address checkpoint so a
//! restarted run continues instead of repeating work.

pub mod checkpoint;
pub mod enrichers;
pub mod error;
pub mod input;
pub mod output;
pub mod pacing;
pub mod runner;

pub use checkpoint::CheckpointStore;
pub use enrichers::{AddressEnricher, OverviewEnricher, TxCountEnricher};
pub use error::EnrichmentError;
pub use input::{load_addresses, AddressRecord};
pub use output::{MetricValue, ResultRecord, ResultWriter, MISSING_SENTINEL};
pub use pacing::{FixedPacing, NoPacing, PacingPolicy};
pub use runner::{run_fetch_loop, RunSummary};
