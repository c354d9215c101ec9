//! Dataset registry and builder plumbing shared by the dataset modules.

use crate::app::adapters::source::TableSource;
use crate::app::models::frame::Frame;
use crate::app::models::record::RawTable;
use crate::app::services::tsv;
use crate::error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

pub use crate::app::adapters::source::SubTableGroup;

/// The logical datasets the harmonizer can build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    RentalAtlas,
    PopulationCensus,
    HouseholdPriceIndex,
    RentalPriceIndex,
    ConsumerPriceIndex,
}

impl DatasetKind {
    /// All kinds in build order
    pub fn all() -> &'static [DatasetKind] {
        &[
            DatasetKind::RentalAtlas,
            DatasetKind::PopulationCensus,
            DatasetKind::HouseholdPriceIndex,
            DatasetKind::RentalPriceIndex,
            DatasetKind::ConsumerPriceIndex,
        ]
    }

    /// The dataset name used for CLI selection, source layout, and caching
    pub fn slug(&self) -> &'static str {
        match self {
            DatasetKind::RentalAtlas => "rental-distribution-atlas",
            DatasetKind::PopulationCensus => "population-annual-census",
            DatasetKind::HouseholdPriceIndex => "household-price-index",
            DatasetKind::RentalPriceIndex => "household-rental-price-index",
            DatasetKind::ConsumerPriceIndex => "consumer-price-index",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DatasetKind::RentalAtlas => "Rental Distribution Atlas",
            DatasetKind::PopulationCensus => "Population Annual Census",
            DatasetKind::HouseholdPriceIndex => "Housing Price Index",
            DatasetKind::RentalPriceIndex => "Household Rental Price Index",
            DatasetKind::ConsumerPriceIndex => "Consumer Price Index",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        DatasetKind::all()
            .iter()
            .copied()
            .find(|kind| kind.slug() == slug)
    }
}

/// Options shared by every dataset builder
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Restrict the output to these municipality codes
    pub municipality_filter: Option<Vec<String>>,
    /// Ignore a cached fragment and rebuild from the source
    pub force_rebuild: bool,
    /// Show a progress bar across sub-table groups
    pub show_progress: bool,
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_municipalities(mut self, codes: Vec<String>) -> Self {
        self.municipality_filter = Some(codes);
        self
    }

    pub fn with_force_rebuild(mut self) -> Self {
        self.force_rebuild = true;
        self
    }

    pub fn with_progress(mut self) -> Self {
        self.show_progress = true;
        self
    }
}

/// The final returned object: level name → wide table for that level
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    levels: BTreeMap<String, Frame>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_levels(levels: BTreeMap<String, Frame>) -> Self {
        Self { levels }
    }

    pub fn insert(&mut self, name: impl Into<String>, frame: Frame) {
        self.levels.insert(name.into(), frame);
    }

    pub fn level(&self, name: &str) -> Option<&Frame> {
        self.levels.get(name)
    }

    pub fn level_names(&self) -> Vec<&str> {
        self.levels.keys().map(|k| k.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Frame)> + '_ {
        self.levels.iter()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn total_rows(&self) -> usize {
        self.levels.values().map(Frame::n_rows).sum()
    }

    /// Write one `<Level>.tsv` per level under `dir`, returning the written
    /// paths and their sizes
    pub fn write_to_dir(&self, dir: &Path) -> Result<Vec<(PathBuf, u64)>> {
        let mut written = Vec::new();
        for (name, frame) in &self.levels {
            let path = dir.join(format!("{}.tsv", name));
            tsv::write_frame_to_path(frame, &path)?;
            let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            written.push((path, size));
        }
        Ok(written)
    }
}

/// Fetch a sub-table, degrading any failure to an empty table.
///
/// Transient retrieval concerns belong to the ingestion layer; a sub-dataset
/// that cannot be fetched simply contributes no rows.
pub(crate) fn fetch_or_empty(source: &dyn TableSource, id: &str) -> RawTable {
    match source.fetch_table(id) {
        Ok(table) => table,
        Err(e) => {
            warn!("fetch failed for '{}': {} (treating as empty)", id, e);
            RawTable::default()
        }
    }
}

/// Progress bar over a dataset's sub-table groups, when enabled
pub(crate) fn group_progress(total: usize, message: &str, enabled: bool) -> Option<ProgressBar> {
    if !enabled || total == 0 {
        return None;
    }
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    bar.set_message(message.to_string());
    Some(bar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::value::Value;

    #[test]
    fn test_dataset_kind_slugs_round_trip() {
        for kind in DatasetKind::all() {
            assert_eq!(DatasetKind::from_slug(kind.slug()), Some(*kind));
        }
        assert_eq!(DatasetKind::from_slug("nope"), None);
    }

    #[test]
    fn test_dataset_write_to_dir() {
        let mut frame = Frame::new(vec!["Municipality code".into()]);
        frame.push_row(vec![Value::text("01001")]).unwrap();
        let mut dataset = Dataset::new();
        dataset.insert("Municipality", frame);

        let dir = tempfile::tempdir().unwrap();
        let written = dataset.write_to_dir(dir.path()).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].0.ends_with("Municipality.tsv"));
        assert!(written[0].1 > 0);
    }

    #[test]
    fn test_build_options_builders() {
        let opts = BuildOptions::new()
            .with_municipalities(vec!["01001".into()])
            .with_force_rebuild();
        assert!(opts.force_rebuild);
        assert_eq!(opts.municipality_filter.as_deref(), Some(&["01001".to_string()][..]));
        assert!(!opts.show_progress);
    }
}
