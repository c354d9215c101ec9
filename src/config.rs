//! Configuration management.
//!
//! Paths and behavior switches for a harmonizer run. The cache directory
//! defaults to the platform cache location; everything else is explicit.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global configuration for a harmonizer invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarmonizerConfig {
    /// Directory holding pre-downloaded source extracts
    pub source_dir: PathBuf,

    /// Directory holding cached combined fragments
    pub cache_dir: PathBuf,

    /// Directory the per-level output tables are written to
    pub output_dir: PathBuf,

    /// Rebuild fragments even when a cached copy exists
    pub force_rebuild: bool,

    /// Show progress bars while building
    pub show_progress: bool,

    /// Restrict atlas output to these municipality codes
    pub municipality_filter: Option<Vec<String>>,
}

impl Default for HarmonizerConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("data"),
            cache_dir: default_cache_dir(),
            output_dir: PathBuf::from("output"),
            force_rebuild: false,
            show_progress: true,
            municipality_filter: None,
        }
    }
}

impl HarmonizerConfig {
    /// Configuration with a custom source directory
    pub fn with_source_dir(mut self, source_dir: impl Into<PathBuf>) -> Self {
        self.source_dir = source_dir.into();
        self
    }

    /// Configuration with a custom cache directory
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    /// Configuration with a custom output directory
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Enable forced rebuilds
    pub fn with_force_rebuild(mut self) -> Self {
        self.force_rebuild = true;
        self
    }

    /// Disable progress bars
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Restrict atlas output to the given municipality codes
    pub fn with_municipality_filter(mut self, codes: Vec<String>) -> Self {
        self.municipality_filter = Some(codes);
        self
    }
}

/// Platform cache directory for the harmonizer,
/// `~/.cache/ine-harmonizer` on Linux
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("ine-harmonizer")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_methods() {
        let config = HarmonizerConfig::default()
            .with_source_dir("/tmp/extracts")
            .with_force_rebuild()
            .without_progress();
        assert_eq!(config.source_dir, PathBuf::from("/tmp/extracts"));
        assert!(config.force_rebuild);
        assert!(!config.show_progress);
    }

    #[test]
    fn test_default_cache_dir_is_namespaced() {
        assert!(default_cache_dir().ends_with("ine-harmonizer"));
    }
}
