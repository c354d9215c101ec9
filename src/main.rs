use anyhow::Context;
use clap::Parser;
use ine_harmonizer::cli::{args::Args, commands};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let result = commands::run(args.get_command()).context("harmonization failed");

    match result {
        Ok(_stats) => {
            // Success - stats have already been reported by the command
            process::exit(0);
        }
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("INE Harmonizer - Spanish Statistics Harmonization Tool");
    println!("======================================================");
    println!();
    println!("Harmonize INE statistical extracts (population, income, housing-price,");
    println!("rental-price and consumer-price series) into consistent wide-format");
    println!("tables keyed by the geographic hierarchy and a time period.");
    println!();
    println!("USAGE:");
    println!("    ine-harmonizer <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    build    Build harmonized datasets and write per-level TSV tables");
    println!("    list     List known datasets and their cache status");
    println!("    help     Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Build the default datasets from ./data into ./output:");
    println!("    ine-harmonizer build");
    println!();
    println!("    # Build specific datasets with custom paths:");
    println!("    ine-harmonizer build --input /path/to/extracts --output /path/to/output \\");
    println!("                         --datasets rental-distribution-atlas,consumer-price-index");
    println!();
    println!("    # Restrict the atlas to two municipalities and force a rebuild:");
    println!("    ine-harmonizer build -d rental-distribution-atlas -m 01001,28079 --force");
    println!();
    println!("For detailed help on any command, use:");
    println!("    ine-harmonizer <COMMAND> --help");
}
