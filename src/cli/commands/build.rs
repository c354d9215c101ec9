//! Build command implementation
//!
//! Orchestrates the full harmonization workflow: configuration, per-dataset
//! building through the source/cache/translator ports, and report generation.

use super::shared::{setup_logging, ProcessingStats};
use crate::app::adapters::cache::DiskCache;
use crate::app::adapters::source::DirectorySource;
use crate::app::datasets::{
    consumer_price_index, household_price_index, population_census, rental_atlas,
    rental_price_index, BuildOptions, Dataset, DatasetKind,
};
use crate::app::translate::default_translator;
use crate::cli::args::BuildArgs;
use crate::config::{default_cache_dir, HarmonizerConfig};
use crate::error::{HarmonizerError, Result};
use indicatif::HumanDuration;
use std::time::Instant;
use tracing::{debug, error, info};

/// Build command runner
///
/// 1. Set up logging and validate arguments
/// 2. Build each requested dataset through its ports
/// 3. Write the per-level tables and report statistics
pub fn run_build(args: BuildArgs) -> Result<ProcessingStats> {
    let start_time = Instant::now();

    setup_logging(args.get_log_level(), args.quiet)?;
    info!("Starting INE harmonizer");
    args.validate()?;

    let config = configuration(&args);
    debug!("Loaded configuration: {:?}", config);

    let source = DirectorySource::new(&config.source_dir);
    let cache = DiskCache::new(&config.cache_dir);
    let translator = default_translator();
    let opts = {
        let mut opts = BuildOptions::new();
        if let Some(codes) = &config.municipality_filter {
            opts = opts.with_municipalities(codes.clone());
        }
        if config.force_rebuild {
            opts = opts.with_force_rebuild();
        }
        if config.show_progress {
            opts = opts.with_progress();
        }
        opts
    };

    let datasets = args.get_datasets();
    info!("Building {} datasets: {:?}", datasets.len(), datasets);

    let mut stats = ProcessingStats::default();
    for (i, slug) in datasets.iter().enumerate() {
        info!("Building dataset {} of {}: {}", i + 1, datasets.len(), slug);

        let kind = DatasetKind::from_slug(slug)
            .ok_or_else(|| HarmonizerError::unknown_dataset(slug.clone()))?;
        match build_dataset(kind, &source, &cache, &translator, &opts) {
            Ok(dataset) => {
                stats.datasets_built += 1;
                stats.rows_written += dataset.total_rows();
                let out_dir = config.output_dir.join(slug);
                let written = dataset.write_to_dir(&out_dir)?;
                for (path, size) in written {
                    stats.level_tables_written += 1;
                    stats
                        .output_sizes
                        .push((path.display().to_string(), size));
                }
                info!(
                    "Completed {}: {} level tables, {} rows",
                    slug,
                    dataset.len(),
                    dataset.total_rows()
                );
            }
            Err(e) => {
                error!("Failed to build dataset {}: {}", slug, e);
                stats.errors_encountered += 1;
            }
        }
    }

    stats.processing_time = start_time.elapsed();
    if !args.quiet {
        print_report(&stats);
    }
    Ok(stats)
}

/// Assemble the run configuration from the parsed arguments
fn configuration(args: &BuildArgs) -> HarmonizerConfig {
    let mut config = HarmonizerConfig::default()
        .with_source_dir(&args.input_path)
        .with_output_dir(&args.output_path)
        .with_cache_dir(args.cache_path.clone().unwrap_or_else(default_cache_dir));
    if let Some(codes) = args.get_municipalities() {
        config = config.with_municipality_filter(codes);
    }
    if args.force {
        config = config.with_force_rebuild();
    }
    if !args.show_progress() {
        config = config.without_progress();
    }
    config
}

/// Build one dataset through its ports
fn build_dataset(
    kind: DatasetKind,
    source: &DirectorySource,
    cache: &DiskCache,
    translator: &crate::app::translate::MapTranslator,
    opts: &BuildOptions,
) -> Result<Dataset> {
    match kind {
        DatasetKind::RentalAtlas => {
            let groups = source.discover_groups(kind.slug())?;
            rental_atlas::build(source, cache, translator, &groups, opts)
        }
        DatasetKind::PopulationCensus => {
            let groups = source.discover_groups(kind.slug())?;
            population_census::build(source, cache, translator, &groups, opts)
        }
        DatasetKind::HouseholdPriceIndex => {
            household_price_index::build(source, cache, translator, opts)
        }
        DatasetKind::RentalPriceIndex => rental_price_index::build(source, cache, opts),
        DatasetKind::ConsumerPriceIndex => {
            consumer_price_index::build(source, cache, translator, opts)
        }
    }
}

/// Print the human-readable final report
fn print_report(stats: &ProcessingStats) {
    let duration = HumanDuration(stats.processing_time);
    let total_size = ProcessingStats::format_size(stats.total_output_size());

    println!("\nINE harmonization complete");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   • Datasets built: {}", stats.datasets_built);
    println!("   • Level tables written: {}", stats.level_tables_written);
    println!("   • Rows written: {}", stats.rows_written);
    println!("   • Total output size: {}", total_size);
    println!("   • Processing time: {}", duration);

    if stats.errors_encountered > 0 {
        println!("   • Errors encountered: {}", stats.errors_encountered);
    }

    if !stats.output_sizes.is_empty() {
        println!("\nOutput files:");
        for (filename, size) in &stats.output_sizes {
            println!("   • {}: {}", filename, ProcessingStats::format_size(*size));
        }
    }
    println!();
}
