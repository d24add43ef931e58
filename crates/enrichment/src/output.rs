//! Durable CSV result output.

use anyhow::Result;
use std::fs::OpenOptions;
use std::path::Path;

use crate::input::AddressRecord;

/// Placeholder written for a metric that could not be obtained.
pub const MISSING_SENTINEL: &str = "N/A";

/// One metric value destined for the output table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricValue {
    Present(String),
    Missing,
}

impl MetricValue {
    /// The CSV field for this value, with the sentinel standing in for
    /// missing data.
    pub fn render(&self) -> &str {
        match self {
            MetricValue::Present(value) => value,
            MetricValue::Missing => MISSING_SENTINEL,
        }
    }
}

/// One output row: the input key and label plus the metric values.
#[derive(Debug, Clone)]
pub struct ResultRecord {
    pub address: String,
    pub label: Option<String>,
    pub values: Vec<MetricValue>,
}

impl ResultRecord {
    pub fn new(input: &AddressRecord, values: Vec<MetricValue>) -> Self {
        Self {
            address: input.address.clone(),
            label: input.label.clone(),
            values,
        }
    }

    /// CSV fields in output order: address, label, then each metric.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields = vec![self.address.as_str(), self.label.as_deref().unwrap_or("")];
        for value in &self.values {
            fields.push(value.render());
        }
        fields
    }
}

/// Append-only CSV writer with header-once semantics.
///
/// The output file is opened in append mode so a resumed run continues the
/// same file; the header row is written only when the file is empty. Every
/// appended row is flushed before the caller advances its checkpoint.
pub struct ResultWriter {
    writer: csv::Writer<std::fs::File>,
}

impl ResultWriter {
    /// Open (or continue) the output file at `path` with the given header.
    pub fn append<P: AsRef<Path>>(path: P, columns: &[&str]) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(columns)?;
            writer.flush()?;
        }

        Ok(Self { writer })
    }

    /// Append one result row and flush it to disk.
    pub fn append_row(&mut self, record: &ResultRecord) -> Result<()> {
        self.writer.write_record(record.fields())?;
        self.writer.flush()?;
        Ok(())
    }
}
