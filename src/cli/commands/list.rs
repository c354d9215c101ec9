//! List command implementation
//!
//! Shows the known datasets and whether a combined fragment is cached for
//! each of them.

use super::shared::{setup_logging, ProcessingStats};
use crate::app::adapters::cache::DiskCache;
use crate::app::datasets::DatasetKind;
use crate::cli::args::ListArgs;
use crate::config::default_cache_dir;
use crate::error::Result;
use colored::Colorize;

/// List command runner
pub fn run_list(args: ListArgs) -> Result<ProcessingStats> {
    setup_logging(args.get_log_level(), false)?;

    let cache_dir = args.cache_path.clone().unwrap_or_else(default_cache_dir);
    let cache = DiskCache::new(&cache_dir);
    let cached = cache.cached_entries();

    println!("Known datasets (cache: {})", cache_dir.display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for kind in DatasetKind::all() {
        let status = if cached.iter().any(|entry| entry == kind.slug()) {
            "cached".green()
        } else {
            "not cached".dimmed()
        };
        println!("   {:<34} {:<32} [{}]", kind.slug(), kind.title(), status);
    }
    println!();

    Ok(ProcessingStats::default())
}
