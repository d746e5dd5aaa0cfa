//! Merge YouTube links from the contestant cache into contestants.csv.
//!
//! Usage: youtube-update [--input contestants.csv] [--cache contestants.json] [--output contestants_updated.csv]

use anyhow::Result;
use clap::Parser;
use eurovision_data::config::{
    MergeConfig, DEFAULT_CACHE, DEFAULT_CONTESTANTS, DEFAULT_UPDATED_OUTPUT,
};
use eurovision_data::progress::{format_duration, report_warnings, set_log_only};
use eurovision_data::youtube::update_csv_with_json;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "youtube-update")]
#[command(about = "Fill youtube_url from the external contestant cache, keyed by (country, artist)")]
struct Args {
    #[arg(long, default_value = DEFAULT_CONTESTANTS)]
    input: PathBuf,

    #[arg(long, default_value = DEFAULT_CACHE)]
    cache: PathBuf,

    #[arg(long, default_value = DEFAULT_UPDATED_OUTPUT)]
    output: PathBuf,

    /// Hide progress bars and print periodic log lines instead
    #[arg(long)]
    log_only: bool,
}

fn run(config: &MergeConfig) -> Result<()> {
    let start = Instant::now();
    let report = update_csv_with_json(config)?;

    println!("CSV Fieldnames: {:?}", report.fieldnames);
    report_warnings(&report.warnings);

    println!(
        "CSV update completed successfully. {} rows were updated.",
        report.updated
    );
    println!("  Rows written: {}", report.rows);
    if report.unverified > 0 {
        println!("  Links without a recognizable video id: {}", report.unverified);
    }
    println!("  Elapsed: {}", format_duration(start.elapsed()));
    Ok(())
}

fn main() {
    let args = Args::parse();
    set_log_only(args.log_only);

    let config = MergeConfig {
        input: args.input,
        cache: args.cache,
        output: args.output,
    };

    if let Err(e) = run(&config) {
        eprintln!("Error: {:#}", e);
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}
