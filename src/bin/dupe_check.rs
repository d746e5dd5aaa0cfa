//! Report duplicate contest entries for manual review.
//!
//! Usage: dupe-check [--input contestants.csv] [--output duplicates.csv]

use anyhow::{Context, Result};
use clap::Parser;
use eurovision_data::config::{DupeConfig, DEFAULT_CONTESTANTS, DEFAULT_DUPLICATES_OUTPUT};
use eurovision_data::dupes::identify_duplicates;
use eurovision_data::progress::{format_duration, report_warnings, set_log_only};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "dupe-check")]
#[command(about = "Find rows sharing (year, to_country_id, performer) and write a review report")]
struct Args {
    #[arg(long, default_value = DEFAULT_CONTESTANTS)]
    input: PathBuf,

    #[arg(long, default_value = DEFAULT_DUPLICATES_OUTPUT)]
    output: PathBuf,

    /// Hide progress bars and print periodic log lines instead
    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_log_only(args.log_only);

    let config = DupeConfig {
        input: args.input,
        output: args.output,
    };

    let start = Instant::now();
    let report = identify_duplicates(&config)
        .with_context(|| format!("Failed to check {} for duplicates", config.input.display()))?;

    report_warnings(&report.warnings);

    println!(
        "Found {} sets of duplicates. Details written to {}",
        report.groups,
        config.output.display()
    );
    println!("  Duplicate rows: {}", report.duplicate_rows);
    println!("  Elapsed: {}", format_duration(start.elapsed()));

    Ok(())
}
