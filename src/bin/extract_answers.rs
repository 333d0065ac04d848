//! Build a combined notebook summarizing every student's answer to each
//! question in a template notebook.
//!
//! Question prompts come from the template's `is_question` cells; each
//! submission is sliced by fuzzy cell matching. Alongside the combined
//! notebook, a response-count CSV and one CSV per poll question land in the
//! summary directory.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use log::{error, info};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process;

use coursekit::cli::LogArgs;
use coursekit::fetch::{self, DEFAULT_WORKERS};
use coursekit::notebook::extract::{self, MATCH_THRESHOLD};
use coursekit::notebook::Notebook;
use coursekit::report::tables::format_compact_table;

/// Extract answers from student notebooks
#[derive(Parser, Debug)]
#[command(name = "extract-answers")]
#[command(version)]
struct Args {
    /// Template notebook defining the question prompts
    #[arg(value_name = "TEMPLATE")]
    template: PathBuf,

    /// Submissions CSV with gh_username, Full Name, and notebook_url columns
    #[arg(value_name = "SUBMISSIONS")]
    submissions: PathBuf,

    /// Directory the combined notebook is written to
    #[arg(long, value_name = "DIR", default_value = "processed_notebooks")]
    output_dir: PathBuf,

    /// Directory the summary CSVs are written to
    #[arg(long, value_name = "DIR", default_value = "summaries")]
    summary_dir: PathBuf,

    /// Head each answer with the student's name, and keep duplicate answers
    #[arg(long)]
    include_usernames: bool,

    /// Maximum edit distance to consider a cell a match
    #[arg(long, value_name = "N", default_value_t = MATCH_THRESHOLD)]
    threshold: usize,

    /// Worker pool size for notebook downloads
    #[arg(long, value_name = "N", default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Check that the GitHub usernames exist before fetching
    #[arg(long)]
    validate_usernames: bool,

    #[command(flatten)]
    log: LogArgs,
}

#[derive(Debug)]
struct Submission {
    username: String,
    full_name: String,
    notebook_url: String,
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

    let template = Notebook::from_path(&args.template)?;
    let mut submissions = read_submissions(&args.submissions)?;
    if args.include_usernames {
        // Sort by username so students are easy to find in the output
        submissions.sort_by_key(|s| s.username.to_lowercase());
    }
    let full_names: HashMap<String, String> = submissions
        .iter()
        .map(|s| (s.username.clone(), s.full_name.clone()))
        .collect();

    let http = reqwest::blocking::Client::new();

    if args.validate_usernames {
        let usernames: Vec<String> =
            submissions.iter().map(|s| s.username.clone()).collect();
        let (_, invalid) = fetch::validate_usernames(&http, &usernames, args.workers)?;
        if !invalid.is_empty() {
            eprintln!(
                "{}",
                format!("Invalid github username(s): {}", invalid.join(", ")).yellow()
            );
        }
    }

    let jobs: Vec<(String, String)> = submissions
        .iter()
        .map(|s| (s.username.clone(), s.notebook_url.clone()))
        .collect();
    info!("Fetching {} notebooks...", jobs.len());
    let mut bodies = fetch::fetch_text_batch(&http, &jobs, args.workers)?;

    let notebooks: Vec<(String, Option<Notebook>)> = submissions
        .iter()
        .map(|s| {
            let notebook = bodies
                .remove(&s.username)
                .flatten()
                .and_then(|body| Notebook::parse(&body).ok());
            (s.username.clone(), notebook)
        })
        .collect();

    let missing: Vec<&str> = notebooks
        .iter()
        .filter(|(_, nb)| nb.is_none())
        .map(|(username, _)| {
            full_names
                .get(username)
                .map(String::as_str)
                .unwrap_or(username.as_str())
        })
        .collect();
    if !missing.is_empty() {
        let mut missing = missing;
        missing.sort_unstable();
        eprintln!(
            "{}",
            format!("Users missing notebooks: {}", missing.join(", ")).yellow()
        );
    }

    let extractions = extract::extract(&template, &notebooks, args.threshold);

    for line in extract::missing_answer_report(&extractions, &full_names) {
        println!("{}", line);
    }

    // Students with a fetched notebook, ordered by full name
    let mut students: Vec<(String, String)> = notebooks
        .iter()
        .filter(|(_, nb)| nb.is_some())
        .map(|(username, _)| {
            let full_name = full_names
                .get(username)
                .cloned()
                .unwrap_or_else(|| username.clone());
            (username.clone(), full_name)
        })
        .collect();
    students.sort_by(|a, b| a.1.cmp(&b.1));

    let stem = args
        .template
        .file_stem()
        .and_then(|s| s.to_str())
        .context("Template path has no file name")?;
    let suffix = if args.include_usernames {
        "_responses_with_names"
    } else {
        "_responses"
    };

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;
    let notebook_path = args.output_dir.join(format!("{}{}.ipynb", stem, suffix));
    let combined = extract::combined_notebook(
        &template,
        &extractions,
        args.include_usernames,
        &full_names,
    );
    info!("Writing {}", notebook_path.display());
    combined.write_to(&notebook_path)?;

    std::fs::create_dir_all(&args.summary_dir)
        .with_context(|| format!("Failed to create {}", args.summary_dir.display()))?;
    let counts_path = args
        .summary_dir
        .join(format!("{}_response_counts.csv", stem));
    info!("Writing {}", counts_path.display());
    let totals = extract::write_response_counts(&counts_path, &extractions, &students)?;

    println!("Answer counts:");
    let rows: Vec<Vec<String>> = totals
        .into_iter()
        .map(|(title, total)| vec![title, total.to_string()])
        .collect();
    print!("{}", format_compact_table(&["Question", "Total"], &rows));

    extract::write_poll_results(&args.summary_dir, stem, &extractions, &students)?;
    Ok(())
}

/// Read the submissions CSV: `gh_username`, `Full Name`, `notebook_url`
fn read_submissions(path: &PathBuf) -> Result<Vec<Submission>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to read submissions: {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .with_context(|| format!("Submissions CSV has no {:?} column", name))
    };
    let username_ix = column("gh_username")?;
    let full_name_ix = column("Full Name")?;
    let url_ix = column("notebook_url")?;

    let mut submissions = Vec::new();
    for record in reader.records() {
        let record = record.context("Failed to read submissions row")?;
        let get = |ix: usize| record.get(ix).unwrap_or("").trim().to_string();
        let username = get(username_ix);
        if username.is_empty() {
            continue;
        }
        submissions.push(Submission {
            full_name: get(full_name_ix),
            notebook_url: get(url_ix),
            username,
        });
    }
    Ok(submissions)
}
