//! Raw table sources.
//!
//! The core consumes sub-dataset extracts through the [`TableSource`] port.
//! [`DirectorySource`] serves extracts a fetcher tool has already downloaded
//! into a local directory tree; [`FixtureSource`] serves in-memory tables for
//! deterministic tests.

use crate::app::models::record::RawTable;
use crate::error::{HarmonizerError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;

/// One ordered group of sub-table identifiers (a province, a census year)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubTableGroup {
    pub label: String,
    pub table_ids: Vec<String>,
}

/// Supplier of raw tabular records per sub-dataset.
///
/// Fetch failures are transient concerns of the surrounding ingestion layer;
/// the core treats any error as "no rows for this sub-dataset".
pub trait TableSource {
    fn fetch_table(&self, id: &str) -> Result<RawTable>;
}

/// Serves extracts from `<root>/<id>.tsv`
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Discover the per-group sub-table identifiers below a dataset
    /// directory: `<root>/<dataset>/<group>/<table>.tsv`.
    ///
    /// Groups and tables are returned in lexicographic order so repeated
    /// runs enumerate (and therefore merge) identically.
    pub fn discover_groups(&self, dataset: &str) -> Result<Vec<SubTableGroup>> {
        let dataset_dir = self.root.join(dataset);
        if !dataset_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut group_dirs: Vec<PathBuf> = std::fs::read_dir(&dataset_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        group_dirs.sort();

        let mut groups = Vec::new();
        for dir in group_dirs {
            let label = dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let mut table_ids: Vec<String> = std::fs::read_dir(&dir)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.extension().map(|e| e == "tsv").unwrap_or(false))
                .filter_map(|path| {
                    path.file_stem()
                        .map(|stem| format!("{}/{}/{}", dataset, label, stem.to_string_lossy()))
                })
                .collect();
            table_ids.sort();
            if !table_ids.is_empty() {
                groups.push(SubTableGroup { label, table_ids });
            }
        }
        Ok(groups)
    }
}

impl TableSource for DirectorySource {
    fn fetch_table(&self, id: &str) -> Result<RawTable> {
        let path = self.root.join(format!("{}.tsv", id));
        if !path.is_file() {
            return Err(HarmonizerError::TableNotFound { id: id.to_string() });
        }
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .from_reader(File::open(path)?);
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }
        Ok(RawTable::new(headers, rows))
    }
}

/// In-memory source for tests
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    tables: HashMap<String, RawTable>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, id: impl Into<String>, table: RawTable) -> Self {
        self.tables.insert(id.into(), table);
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, table: RawTable) {
        self.tables.insert(id.into(), table);
    }
}

impl TableSource for FixtureSource {
    fn fetch_table(&self, id: &str) -> Result<RawTable> {
        self.tables
            .get(id)
            .cloned()
            .ok_or_else(|| HarmonizerError::TableNotFound { id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_source_round_trip() {
        let table = RawTable::from_str_rows(&["A", "B"], &[&["1", "2"]]);
        let source = FixtureSource::new().with_table("demo/01/100", table.clone());
        assert_eq!(source.fetch_table("demo/01/100").unwrap(), table);
        assert!(matches!(
            source.fetch_table("demo/01/999"),
            Err(HarmonizerError::TableNotFound { .. })
        ));
    }

    #[test]
    fn test_directory_source_discovery_and_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let group = dir.path().join("rental-distribution-atlas/01");
        std::fs::create_dir_all(&group).unwrap();
        std::fs::write(group.join("30896.tsv"), "A\tTotal\nx\t1,5\n").unwrap();
        std::fs::write(group.join("30831.tsv"), "A\tTotal\ny\t2,0\n").unwrap();

        let source = DirectorySource::new(dir.path());
        let groups = source.discover_groups("rental-distribution-atlas").unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, "01");
        assert_eq!(
            groups[0].table_ids,
            vec![
                "rental-distribution-atlas/01/30831",
                "rental-distribution-atlas/01/30896"
            ]
        );

        let table = source
            .fetch_table("rental-distribution-atlas/01/30896")
            .unwrap();
        assert_eq!(table.headers, vec!["A", "Total"]);
        assert_eq!(table.rows, vec![vec!["x".to_string(), "1,5".to_string()]]);
    }

    #[test]
    fn test_missing_dataset_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(dir.path());
        assert!(source.discover_groups("nope").unwrap().is_empty());
    }
}
