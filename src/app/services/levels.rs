//! Level splitting.
//!
//! Partitions a combined fragment into disjoint per-granularity subsets. A
//! row belongs to a level when every hierarchy field at that depth or coarser
//! is present and every finer field is absent; rows with orphaned codes match
//! no level and are dropped, not erred.

use crate::app::models::frame::Frame;
use crate::app::models::geo::GeoLevel;
use std::collections::BTreeMap;
use tracing::debug;

/// Ordered hierarchy layout for one dataset: (level name, marker column),
/// coarse to fine.
#[derive(Debug, Clone)]
pub struct LevelScheme {
    levels: Vec<(String, String)>,
}

impl LevelScheme {
    pub fn new(levels: Vec<(String, String)>) -> Self {
        Self { levels }
    }

    /// The full five-level geographic scheme
    pub fn geographic() -> Self {
        Self::new(
            GeoLevel::all()
                .iter()
                .map(|level| (level.name().to_string(), level.marker_column().to_string()))
                .collect(),
        )
    }

    /// The scheme truncated at `deepest` (e.g. district-level datasets)
    pub fn geographic_until(deepest: GeoLevel) -> Self {
        let mut levels = Vec::new();
        for level in GeoLevel::all() {
            levels.push((level.name().to_string(), level.marker_column().to_string()));
            if level == &deepest {
                break;
            }
        }
        Self::new(levels)
    }

    pub fn marker_columns(&self) -> Vec<&str> {
        self.levels.iter().map(|(_, field)| field.as_str()).collect()
    }
}

/// Result of a level split: the per-level subsets plus how many rows matched
/// no level.
#[derive(Debug)]
pub struct SplitOutcome {
    pub levels: BTreeMap<String, Frame>,
    pub dropped_rows: usize,
}

impl SplitOutcome {
    /// Keep only the requested level names
    pub fn retain_levels(mut self, names: &[&str]) -> Self {
        self.levels.retain(|name, _| names.contains(&name.as_str()));
        self
    }
}

/// Partition a combined fragment by granularity.
///
/// Each subset then sheds its all-missing columns: a column relevant only to
/// another granularity carries nothing at this one.
pub fn split_levels(frame: &Frame, scheme: &LevelScheme) -> SplitOutcome {
    let markers = scheme.marker_columns();

    // Depth of each row: longest present prefix with nothing finer present
    let assignments: Vec<Option<usize>> = (0..frame.n_rows())
        .map(|row| {
            let presence: Vec<bool> = markers
                .iter()
                .map(|field| frame.cell(field, row).is_present())
                .collect();
            let depth = presence.iter().take_while(|p| **p).count();
            if depth == 0 || presence[depth..].iter().any(|p| *p) {
                None
            } else {
                Some(depth - 1)
            }
        })
        .collect();

    let dropped_rows = assignments.iter().filter(|a| a.is_none()).count();
    if dropped_rows > 0 {
        debug!(
            "level split dropped {} rows with orphaned hierarchy codes",
            dropped_rows
        );
    }

    let mut levels = BTreeMap::new();
    for (depth, (name, _)) in scheme.levels.iter().enumerate() {
        let mut subset = frame.clone();
        subset.retain_rows(|row| assignments[row] == Some(depth));
        // An empty subset keeps its key columns so it stays correctly keyed
        if !subset.is_empty() {
            subset.drop_all_missing_columns();
        }
        levels.insert(name.clone(), subset);
    }

    SplitOutcome {
        levels,
        dropped_rows,
    }
}
