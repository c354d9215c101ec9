//! Command-line argument definitions for the INE harmonizer
//!
//! Defines the CLI interface using the clap derive API.

use crate::constants::{DATASET_NAMES, DEFAULT_DATASETS};
use crate::error::{HarmonizerError, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

/// CLI arguments for the INE harmonizer
///
/// Harmonizes INE statistical extracts (population, income, housing and
/// consumer price series) into consistent wide-format tables keyed by the
/// geographic hierarchy and a time period.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ine-harmonizer",
    version,
    about = "Harmonize INE statistical extracts into consistent per-level tables",
    long_about = "Reshapes heterogeneous INE extracts into wide-format tables keyed by the \
                  country/province/municipality/district/section hierarchy and a time period. \
                  Extracts are read from a local directory previously populated by a fetcher \
                  tool; combined fragments are cached as TSV between runs."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands for the harmonizer
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Build harmonized datasets and write per-level TSV tables
    Build(BuildArgs),
    /// List known datasets and their cache status
    List(ListArgs),
}

/// Arguments for the build command (main harmonization)
#[derive(Debug, Clone, Parser)]
pub struct BuildArgs {
    /// Input path to the directory of pre-downloaded extracts
    ///
    /// Should contain one directory per dataset, e.g.
    /// rental-distribution-atlas/<province>/<table>.tsv.
    #[arg(
        short = 'i',
        long = "input",
        value_name = "PATH",
        default_value = "data",
        help = "Input path to the directory of pre-downloaded extracts"
    )]
    pub input_path: PathBuf,

    /// Output path for the per-level TSV tables
    ///
    /// Will be created if it doesn't exist. Generated files are named like
    /// rental-distribution-atlas/Municipality.tsv.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        default_value = "output",
        help = "Output path for the per-level TSV tables"
    )]
    pub output_path: PathBuf,

    /// Cache path for combined fragments
    ///
    /// Defaults to the platform cache directory
    /// (~/.cache/ine-harmonizer on Linux).
    #[arg(
        long = "cache-path",
        value_name = "PATH",
        help = "Cache path for combined fragments"
    )]
    pub cache_path: Option<PathBuf>,

    /// Specific datasets to build (comma-separated list)
    ///
    /// Available datasets: rental-distribution-atlas, population-annual-census,
    /// household-price-index, household-rental-price-index, consumer-price-index
    #[arg(
        short = 'd',
        long = "datasets",
        value_name = "LIST",
        help = "Comma-separated list of datasets to build"
    )]
    pub datasets: Option<DatasetList>,

    /// Restrict atlas output to specific municipality codes
    /// (comma-separated 5-digit codes)
    #[arg(
        short = 'm',
        long = "municipalities",
        value_name = "CODES",
        help = "Restrict atlas output to these municipality codes"
    )]
    pub municipalities: Option<String>,

    /// Rebuild fragments even when a cached copy exists
    #[arg(long = "force", help = "Ignore cached fragments and rebuild")]
    pub force: bool,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Arguments for the list command
#[derive(Debug, Clone, Parser)]
pub struct ListArgs {
    /// Cache path to inspect
    #[arg(
        long = "cache-path",
        value_name = "PATH",
        help = "Cache path to inspect"
    )]
    pub cache_path: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity"
    )]
    pub verbose: u8,
}

/// Wrapper for parsing comma-separated dataset lists
#[derive(Debug, Clone)]
pub struct DatasetList {
    pub datasets: Vec<String>,
}

impl FromStr for DatasetList {
    type Err = HarmonizerError;

    fn from_str(s: &str) -> Result<Self> {
        let datasets: Vec<String> = s
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if datasets.is_empty() {
            return Err(HarmonizerError::configuration(
                "Dataset list cannot be empty".to_string(),
            ));
        }

        for dataset in &datasets {
            if !DATASET_NAMES.contains(&dataset.as_str()) {
                return Err(HarmonizerError::configuration(format!(
                    "Unknown dataset '{}'. Available datasets: {}",
                    dataset,
                    DATASET_NAMES.join(", ")
                )));
            }
        }

        Ok(DatasetList { datasets })
    }
}

impl Args {
    /// Get the command if one was specified
    pub fn get_command(&self) -> Commands {
        self.command
            .clone()
            .expect("Command should be present when get_command() is called")
    }
}

impl BuildArgs {
    /// Validate the build command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if !self.input_path.exists() {
            return Err(HarmonizerError::configuration(format!(
                "Input path does not exist: {}",
                self.input_path.display()
            )));
        }
        if !self.input_path.is_dir() {
            return Err(HarmonizerError::configuration(format!(
                "Input path is not a directory: {}",
                self.input_path.display()
            )));
        }
        if let Some(municipalities) = &self.municipalities {
            for code in Self::split_codes(municipalities) {
                if code.len() != 5 || !code.chars().all(|c| c.is_ascii_digit()) {
                    return Err(HarmonizerError::configuration(format!(
                        "Invalid municipality code '{}': expected 5 digits",
                        code
                    )));
                }
            }
        }
        Ok(())
    }

    /// Get the list of datasets to build
    pub fn get_datasets(&self) -> Vec<String> {
        match &self.datasets {
            Some(dataset_list) => dataset_list.datasets.clone(),
            None => DEFAULT_DATASETS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Get the parsed municipality filter, if any
    pub fn get_municipalities(&self) -> Option<Vec<String>> {
        self.municipalities
            .as_ref()
            .map(|codes| Self::split_codes(codes))
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }

    fn split_codes(codes: &str) -> Vec<String> {
        codes
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    }
}

impl ListArgs {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn build_args(input: PathBuf) -> BuildArgs {
        BuildArgs {
            input_path: input,
            output_path: PathBuf::from("output"),
            cache_path: None,
            datasets: None,
            municipalities: None,
            force: false,
            verbose: 0,
            quiet: false,
        }
    }

    #[test]
    fn test_dataset_list_parsing() {
        let result = DatasetList::from_str("rental-distribution-atlas").unwrap();
        assert_eq!(result.datasets, vec!["rental-distribution-atlas"]);

        let result =
            DatasetList::from_str(" rental-distribution-atlas , consumer-price-index ").unwrap();
        assert_eq!(
            result.datasets,
            vec!["rental-distribution-atlas", "consumer-price-index"]
        );

        assert!(DatasetList::from_str("invalid-dataset").is_err());
        assert!(DatasetList::from_str("").is_err());
        assert!(DatasetList::from_str(",,,").is_err());
    }

    #[test]
    fn test_build_args_validation() {
        let temp_dir = TempDir::new().unwrap();
        let args = build_args(temp_dir.path().to_path_buf());
        assert!(args.validate().is_ok());

        let mut invalid = args.clone();
        invalid.input_path = PathBuf::from("/nonexistent/path");
        assert!(invalid.validate().is_err());

        let mut invalid = args.clone();
        invalid.municipalities = Some("01001,0200".to_string());
        assert!(invalid.validate().is_err());

        let mut valid = args;
        valid.municipalities = Some("01001,02003".to_string());
        assert!(valid.validate().is_ok());
        assert_eq!(
            valid.get_municipalities(),
            Some(vec!["01001".to_string(), "02003".to_string()])
        );
    }

    #[test]
    fn test_default_datasets() {
        let temp_dir = TempDir::new().unwrap();
        let args = build_args(temp_dir.path().to_path_buf());
        assert_eq!(args.get_datasets(), DEFAULT_DATASETS);
    }

    #[test]
    fn test_log_level() {
        let temp_dir = TempDir::new().unwrap();
        let mut args = build_args(temp_dir.path().to_path_buf());
        assert_eq!(args.get_log_level(), "warn");

        args.verbose = 1;
        assert_eq!(args.get_log_level(), "info");
        args.verbose = 3;
        assert_eq!(args.get_log_level(), "trace");

        args.quiet = true;
        assert_eq!(args.get_log_level(), "error");
        assert!(!args.show_progress());
    }
}
