//! Collate the README.md files of all repos generated from a template into a
//! single Markdown file with a section for each student.
//!
//! Each README is prepended with a header naming the student, as inferred
//! from the generated repo name and the roster. With `--late-after`, repos
//! with late or missing commits are also reported to stdout.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process;

use coursekit::cli::LogArgs;
use coursekit::collate;
use coursekit::github::{self, graphql};
use coursekit::roster::Roster;

/// Collate student READMEs into one Markdown document
#[derive(Parser, Debug)]
#[command(name = "collate-readmes")]
#[command(version)]
struct Args {
    /// Source repository the student repos were generated from (owner/name)
    #[arg(value_name = "ORG/REPO")]
    repo: String,

    /// Roster CSV mapping GitHub logins to display names
    #[arg(long, value_name = "FILE", default_value = "Roster.csv")]
    roster: PathBuf,

    /// Output Markdown file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Ignore commits authored by this email when deciding who has commits
    #[arg(long, value_name = "EMAIL")]
    instructor_email: Option<String>,

    /// Report late and missing commits against this RFC 3339 deadline
    #[arg(long, value_name = "DATETIME")]
    late_after: Option<DateTime<FixedOffset>>,

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

    let (org, _) = args
        .repo
        .split_once('/')
        .context("REPO must be owner/name")?;

    let client = github::Client::from_environment()?;
    let repos = client.organization_repos(org)?;
    info!("Fetched {} repositories from {}", repos.len(), org);
    let (_source, generated) = graphql::partition_generated(repos, &args.repo)?;

    let roster = Roster::load_or_default(&args.roster)?;
    let mut repos =
        collate::annotate_repos(&generated, &roster, args.instructor_email.as_deref());
    repos.retain(|repo| !repo.commits.is_empty());
    repos.sort_by(|a, b| a.author.cmp(&b.author));
    info!("{} generated repositories have student commits", repos.len());

    if let Some(deadline) = args.late_after {
        print!("{}", collate::late_report(&repos, deadline));
    }

    let collated = collate::collate(&repos);
    match &args.output {
        Some(path) => {
            std::fs::write(path, collated)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => print!("{}", collated),
    }
    Ok(())
}
