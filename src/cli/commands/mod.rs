//! Command implementations for the INE harmonizer CLI
//!
//! Each command lives in its own module; this module dispatches on the
//! parsed arguments.

pub mod build;
pub mod list;
pub mod shared;

pub use shared::ProcessingStats;

use crate::cli::args::Commands;
use crate::error::Result;

/// Main command runner for the harmonizer
pub fn run(command: Commands) -> Result<ProcessingStats> {
    match command {
        Commands::Build(build_args) => build::run_build(build_args),
        Commands::List(list_args) => list::run_list(list_args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_stats_re_export() {
        let stats = ProcessingStats::default();
        assert_eq!(stats.datasets_built, 0);
        assert_eq!(stats.total_output_size(), 0);
    }
}
