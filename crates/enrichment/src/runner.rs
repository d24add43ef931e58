//! The resumable fetch loop.

use serde::Serialize;
use tokio::time::sleep;
use tracing::{error, info, warn};

use addrstats_telemetry::{audit, Metrics};

use crate::checkpoint::{resume_index, CheckpointStore};
use crate::enrichers::AddressEnricher;
use crate::error::EnrichmentError;
use crate::input::AddressRecord;
use crate::output::{MetricValue, ResultRecord, ResultWriter};
use crate::pacing::PacingPolicy;

/// Outcome of one enrichment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Records processed in this run.
    pub processed: usize,
    /// Records skipped because the checkpoint already covered them.
    pub skipped: usize,
    /// Metric values written as the missing-data sentinel.
    pub missing_metrics: u64,
}

#[derive(Debug, Serialize)]
struct AuditRecord<'a> {
    address: &'a str,
    label: Option<&'a str>,
    columns: &'static [&'static str],
    values: Vec<&'a str>,
    missing: usize,
}

/// Process every address from the resume point to the end of the list.
///
/// One result row is appended and flushed per address, and the checkpoint is
/// advanced only after the row is durably written. A fatal explorer failure
/// terminates the run without writing a row for the failing address, so the
/// checkpoint still names the last completed one and the next invocation
/// resumes from there.
pub async fn run_fetch_loop(
    inputs: &[AddressRecord],
    enricher: &dyn AddressEnricher,
    writer: &mut ResultWriter,
    checkpoints: &CheckpointStore,
    pacing: &dyn PacingPolicy,
    metrics: &Metrics,
    sample_output_path: Option<&str>,
) -> Result<RunSummary, EnrichmentError> {
    let start_index = match checkpoints.load()? {
        Some(last) => {
            let index = resume_index(inputs, &last)?;
            info!("Resuming from last processed address: {}", last);
            index
        }
        None => {
            info!("No checkpoint found, starting from the beginning");
            0
        }
    };

    let mut missing_metrics = 0u64;
    let mut processed = 0usize;

    for (index, record) in inputs.iter().enumerate().skip(start_index) {
        let values = match enricher.enrich(&record.address).await {
            Ok(values) => values,
            Err(err) => {
                error!("Fatal failure while processing {}: {}", record.address, err);
                return Err(EnrichmentError::Fatal(err));
            }
        };
        debug_assert_eq!(values.len(), enricher.metric_columns().len());

        let missing = values
            .iter()
            .filter(|value| matches!(value, MetricValue::Missing))
            .count();
        if missing > 0 {
            metrics.inc_metrics_missing(missing as u64);
            missing_metrics += missing as u64;
        }

        let row = ResultRecord::new(record, values);
        writer.append_row(&row)?;
        checkpoints.save(&record.address)?;
        metrics.inc_addresses_processed();
        processed += 1;

        info!(
            "Processed {} ({}/{}), {} missing metric(s)",
            record.address,
            index + 1,
            inputs.len(),
            missing
        );

        if sample_output_path.is_some() {
            let sample = AuditRecord {
                address: &record.address,
                label: record.label.as_deref(),
                columns: enricher.metric_columns(),
                values: row.values.iter().map(MetricValue::render).collect(),
                missing,
            };
            if let Err(err) = audit::write_audit_sample(sample_output_path, &sample) {
                warn!("Failed to write audit sample: {}", err);
            }
        }

        if index + 1 < inputs.len() {
            let delay = pacing.delay_after(index);
            if !delay.is_zero() {
                sleep(delay).await;
            }
        }
    }

    Ok(RunSummary {
        processed,
        skipped: start_index,
        missing_metrics,
    })
}
