//! Create an HTML report from a peer-and-self survey: one printable section
//! per participant, with their overall responses, the ratings they gave and
//! received, and their self reviews.

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process;

use coursekit::cli::LogArgs;
use coursekit::report::html::render_survey_report;
use coursekit::survey::{report_data, Survey};

/// Render a survey CSV as a per-participant HTML report
#[derive(Parser, Debug)]
#[command(name = "survey-report")]
#[command(version)]
struct Args {
    /// Survey export CSV
    #[arg(value_name = "CSV_FILE")]
    input: PathBuf,

    /// Output HTML file (defaults to the input with an .html extension)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[command(flatten)]
    log: LogArgs,
}

fn main() {
    if let Err(e) = run() {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    args.log.init()?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("html"));

    let survey = Survey::load(&args.input)?;
    let data = report_data(&survey)
        .with_context(|| format!("Summarizing {}", args.input.display()))?;
    let html = render_survey_report(&data);

    std::fs::write(&output, html)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote {}", output.display());
    Ok(())
}
