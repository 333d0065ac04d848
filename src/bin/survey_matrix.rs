//! Create a spreadsheet that summarizes peer-and-self survey results in
//! matrix form: one worksheet per question, raters down the side, ratees
//! across the top.

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process;

use coursekit::cli::LogArgs;
use coursekit::report::xlsx::write_matrix_workbook;
use coursekit::survey::{question_matrices, Survey};

/// Pivot a survey CSV into per-question rating matrices
#[derive(Parser, Debug)]
#[command(name = "survey-matrix")]
#[command(version)]
struct Args {
    /// Survey export CSV
    #[arg(value_name = "CSV_FILE")]
    input: PathBuf,

    /// Output workbook (defaults to the input with a " matrices.xlsx" suffix)
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

    let output = args.output.clone().unwrap_or_else(|| {
        let stem = args
            .input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("survey");
        args.input.with_file_name(format!("{} matrices.xlsx", stem))
    });

    let survey = Survey::load(&args.input)?;
    let matrices = question_matrices(&survey)
        .with_context(|| format!("Pivoting {}", args.input.display()))?;
    info!("{} questions have responses", matrices.len());

    write_matrix_workbook(&output, &matrices)?;
    info!("Wrote {}", output.display());
    Ok(())
}
