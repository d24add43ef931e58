//! Error type for enrichment runs.

use addrstats_explorer::ExplorerError;

/// Error type for an enrichment run.
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    /// The checkpoint names an address that is not in the current input
    /// list, e.g. because the input file changed between runs.
    #[error("checkpoint address {0} not found in the input list; delete the checkpoint file or restore the original input")]
    StaleCheckpoint(String),
    /// The explorer session became unusable and the run cannot continue.
    #[error("explorer session failed: {0}")]
    Fatal(#[source] ExplorerError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
