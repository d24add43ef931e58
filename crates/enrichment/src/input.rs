//! Input list loading.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// One labeled address from the input CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressRecord {
    pub address: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// Load the address list from a CSV file with an `address` column and an
/// optional `label` column.
///
/// The list is read once at startup and treated as immutable for the rest
/// of the run. Addresses are assumed unique.
pub fn load_addresses<P: AsRef<Path>>(path: P) -> Result<Vec<AddressRecord>> {
    let mut reader = csv::Reader::from_path(&path)?;

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: AddressRecord = result?;
        records.push(record);
    }

    info!("Loaded {} addresses from {:?}", records.len(), path.as_ref());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_labeled_addresses() {
        let file = write_csv("address,label\n0xaaa,exchange\n0xbbb,whale\n");
        let records = load_addresses(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].address, "0xaaa");
        assert_eq!(records[0].label.as_deref(), Some("exchange"));
        assert_eq!(records[1].label.as_deref(), Some("whale"));
    }

    #[test]
    fn test_load_without_label_column() {
        let file = write_csv("address\n0xaaa\n0xbbb\n");
        let records = load_addresses(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].label.is_none());
    }

    #[test]
    fn test_empty_label_field_is_none() {
        let file = write_csv("address,label\n0xaaa,\n");
        let records = load_addresses(file.path()).unwrap();
        assert!(records[0].label.is_none());
    }
}
