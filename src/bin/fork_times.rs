//! Collect the times each student last modified each file in their fork, as
//! a CSV matrix with one row per file and one column per student.
//!
//! Files whose contents match the source repository are dropped, as are
//! files matching the ignore pattern, so the matrix shows actual student
//! work.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use log::{error, info, warn};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::process;

use coursekit::cli::LogArgs;
use coursekit::config::ConfigFile;
use coursekit::github;
use coursekit::text::natural_sort_key;

const DEFAULT_IGNORE: &str =
    r".*\.(bak|csv|exe|jff|jpe?g|JE?PG|png|pyc|svg)|.*~|\.gitignore|FETCH_HEAD";

/// Build a file × student matrix of last-modified times
#[derive(Parser, Debug)]
#[command(name = "fork-times")]
#[command(version)]
struct Args {
    /// Course key from the configuration file, or a source repo (owner/name)
    #[arg(value_name = "COURSE")]
    repo: String,

    /// YAML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output CSV file
    #[arg(short, long, value_name = "FILE", default_value = "fork_mod_times.csv")]
    output: PathBuf,

    /// Skip files matching this pattern
    #[arg(long, value_name = "REGEX", default_value = DEFAULT_IGNORE)]
    ignore: String,

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

    let ignore_re = Regex::new(&format!("^(?:{})", args.ignore))
        .with_context(|| format!("Invalid ignore pattern: {}", args.ignore))?;

    let config = ConfigFile::load(args.config.as_deref())?;
    let course = config.resolve(&args.repo);
    let client = github::Client::from_environment()?;

    // Instructors come from the configuration plus the organization team
    let team_members =
        client.team_member_logins(course.organization(), course.team_name());

    let mut forks = client.forks(&course.source_repo)?;
    forks.retain(|fork| {
        !course.is_excluded(&fork.owner.login) && !team_members.contains(&fork.owner.login)
    });
    forks.sort_by_key(|fork| fork.owner.login.to_lowercase());
    info!("Collecting file times for {} forks of {}", forks.len(), course.source_repo);

    let source_hashes = client.head_tree_hashes(&course.source_repo)?;

    // (login, filename) -> latest time the owner touched the file
    let mut file_mod_times: HashMap<(String, String), DateTime<Utc>> = HashMap::new();
    for fork in &forks {
        let login = &fork.owner.login;
        info!("fetching commits for {}", login);
        let commits = match client.commits(&fork.full_name) {
            Ok(commits) => commits,
            Err(e) => {
                warn!("{}: could not list commits: {}", login, e);
                continue;
            }
        };

        let fork_hashes = match client.head_tree_hashes(&fork.full_name) {
            Ok(hashes) => hashes,
            Err(e) => {
                warn!("{}: could not list files: {}", login, e);
                continue;
            }
        };

        for commit in commits
            .iter()
            .filter(|c| c.author_login() == Some(login.as_str()) && !c.is_merge())
        {
            let detail = client.commit(&fork.full_name, &commit.sha)?;
            let Some(timestamp) = detail.timestamp() else {
                continue;
            };
            for file in &detail.files {
                // A file identical to the source copy is not student work
                if let Some(hash) = fork_hashes.get(&file.filename) {
                    if source_hashes.get(&file.filename) == Some(hash) {
                        continue;
                    }
                }
                if ignore_re.is_match(&file.filename) {
                    continue;
                }
                file_mod_times
                    .entry((login.clone(), file.filename.clone()))
                    .and_modify(|existing| *existing = (*existing).max(timestamp))
                    .or_insert(timestamp);
            }
        }
    }

    let mut students: Vec<String> = file_mod_times
        .keys()
        .map(|(login, _)| login.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    students.sort_by_key(|login| login.to_lowercase());

    let mut filenames: Vec<String> = file_mod_times
        .keys()
        .map(|(_, filename)| filename.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    filenames.sort_by_key(|filename| natural_sort_key(filename));

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut header = vec![String::new()];
    header.extend(students.iter().cloned());
    writer.write_record(&header)?;
    for filename in &filenames {
        let mut record = vec![filename.clone()];
        for student in &students {
            let cell = file_mod_times
                .get(&(student.clone(), filename.clone()))
                .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default();
            record.push(cell);
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    info!("Wrote {}", args.output.display());
    Ok(())
}
