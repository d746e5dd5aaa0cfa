//! Prepend a unique three-character id to every contestant row.
//!
//! Usage: id-gen [--input contestants.csv] [--output contestants2.csv]

use anyhow::{Context, Result};
use clap::Parser;
use eurovision_data::config::{IdGenConfig, DEFAULT_CONTESTANTS, DEFAULT_IDS_OUTPUT};
use eurovision_data::ids::{add_id_to_csv, CAPACITY};
use eurovision_data::progress::{format_duration, report_warnings, set_log_only};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "id-gen")]
#[command(about = "Assign deterministic 3-character ids (aaa, aab, ...) to contestant rows")]
struct Args {
    #[arg(long, default_value = DEFAULT_CONTESTANTS)]
    input: PathBuf,

    #[arg(long, default_value = DEFAULT_IDS_OUTPUT)]
    output: PathBuf,

    /// Hide progress bars and print periodic log lines instead
    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_log_only(args.log_only);

    let config = IdGenConfig {
        input: args.input,
        output: args.output,
    };

    let start = Instant::now();
    let report = add_id_to_csv(&config)
        .with_context(|| format!("Failed to assign ids to {}", config.input.display()))?;

    report_warnings(&report.warnings);
    println!("Wrote {:?}", config.output);
    println!(
        "  Rows: {} ({} ids left)",
        report.rows,
        CAPACITY - report.rows
    );
    if let Some(last) = report.last_code {
        println!("  Last id: {}", last);
    }
    println!("  Elapsed: {}", format_duration(start.elapsed()));

    Ok(())
}
