//! Split contestants.csv into a main file and a lyrics side file.
//!
//! Usage: split-lyrics [--input contestants.csv] [--main-output main.csv] [--lyrics-output lyrics.csv]

use anyhow::{Context, Result};
use clap::Parser;
use eurovision_data::config::{
    SplitConfig, DEFAULT_CONTESTANTS, DEFAULT_LYRICS_OUTPUT, DEFAULT_MAIN_OUTPUT,
};
use eurovision_data::progress::{format_duration, report_warnings, set_log_only};
use eurovision_data::split::split_eurovision_csv;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "split-lyrics")]
#[command(about = "Move the lyric columns of the contestant CSV into a separate file")]
struct Args {
    #[arg(long, default_value = DEFAULT_CONTESTANTS)]
    input: PathBuf,

    #[arg(long, default_value = DEFAULT_MAIN_OUTPUT)]
    main_output: PathBuf,

    #[arg(long, default_value = DEFAULT_LYRICS_OUTPUT)]
    lyrics_output: PathBuf,

    /// Hide progress bars and print periodic log lines instead
    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_log_only(args.log_only);

    let config = SplitConfig {
        input: args.input,
        main_output: args.main_output,
        lyrics_output: args.lyrics_output,
    };

    let start = Instant::now();
    println!("Reading {:?}", config.input);

    let report = split_eurovision_csv(&config)
        .with_context(|| format!("Failed to split {}", config.input.display()))?;

    report_warnings(&report.warnings);

    println!("Original CSV shape: {}", report.input_shape);
    println!("Main file shape: {}", report.main_shape);
    println!("Lyrics file shape: {}", report.lyrics_shape);
    if !report.warnings.is_empty() {
        println!("Skipped {} malformed lines", report.warnings.len());
    }
    println!("Elapsed: {}", format_duration(start.elapsed()));

    Ok(())
}
