//! Download all the forks of a GitHub repository, one directory per student.
//!
//! Only files that differ from the source repository are fetched, and files
//! already downloaded are skipped when their git blob hash matches, so
//! re-runs are cheap. Blobs the content API refuses as too large are skipped
//! with a warning.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::process;

use coursekit::cli::LogArgs;
use coursekit::config::ConfigFile;
use coursekit::github::rest::Repository;
use coursekit::github::{self, GithubError};
use coursekit::hashing::git_blob_hash_if_exists;
use std::collections::HashMap;

/// Download the forks of a course source repository
#[derive(Parser, Debug)]
#[command(name = "download-forks")]
#[command(version)]
struct Args {
    /// Course key from the configuration file, or a source repo (owner/name)
    #[arg(value_name = "COURSE")]
    repo: String,

    /// YAML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Download only the first N repos
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// Download only repos whose owner login contains SUBSTRING
    #[arg(long = "match", value_name = "SUBSTRING")]
    match_substring: Option<String>,

    /// Override the configured download directory
    #[arg(long, value_name = "DIR")]
    download_path: Option<PathBuf>,

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

    let config = ConfigFile::load(args.config.as_deref())?;
    let course = config.resolve(&args.repo);
    let download_path = args
        .download_path
        .clone()
        .or_else(|| course.download_path.clone())
        .context("No download directory: pass --download-path or configure download_path")?;

    let client = github::Client::from_environment()?;
    let mut forks = client.forks(&course.source_repo)?;
    forks.retain(|fork| !course.is_excluded(&fork.owner.login));
    forks.sort_by(|a, b| a.owner.login.cmp(&b.owner.login));
    if let Some(substring) = &args.match_substring {
        forks.retain(|fork| fork.owner.login.contains(substring.as_str()));
    }
    if let Some(limit) = args.limit {
        forks.truncate(limit);
    }
    info!("Downloading {} forks of {}", forks.len(), course.source_repo);

    let source_hashes = client.head_tree_hashes(&course.source_repo)?;

    for fork in &forks {
        let dst_path = download_path.join(&fork.owner.login);
        if let Err(e) = download_contents(&client, fork, &dst_path, &source_hashes) {
            return Err(e).with_context(|| format!("Downloading {}", fork.full_name));
        }
    }
    Ok(())
}

/// Download the files of one fork that differ from the source repository and
/// from what is already on disk.
fn download_contents(
    client: &github::Client,
    repo: &Repository,
    dst_path: &Path,
    source_hashes: &HashMap<String, String>,
) -> Result<()> {
    let owner = &repo.owner.login;
    let fork_hashes = match client.head_tree_hashes(&repo.full_name) {
        Ok(hashes) => hashes,
        Err(e) => {
            warn!("{}: could not list files: {}", owner, e);
            return Ok(());
        }
    };

    let mut entries: Vec<(&String, &String)> = fork_hashes
        .iter()
        .filter(|(path, sha)| source_hashes.get(path.as_str()) != Some(*sha))
        .collect();
    entries.sort();

    if entries.is_empty() {
        info!("{}: no files", owner);
        return Ok(());
    }

    let mut changed_entries = Vec::new();
    for (path, sha) in entries {
        let local_hash = git_blob_hash_if_exists(&dst_path.join(path))?;
        if local_hash.as_deref() != Some(sha.as_str()) {
            changed_entries.push((path, sha));
        }
    }

    if changed_entries.is_empty() {
        info!("{}: no new files", owner);
        return Ok(());
    }

    info!("{}:", owner);
    for (path, sha) in changed_entries {
        info!("  {}", path);
        let bytes = match client.blob(&repo.full_name, sha, path) {
            Ok(bytes) => bytes,
            Err(GithubError::BlobTooLarge { path }) => {
                eprintln!("{}", format!("{}/{}: too large; skipping", owner, path).yellow());
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let dst_name = dst_path.join(path);
        if let Some(parent) = dst_name.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&dst_name, bytes)
            .with_context(|| format!("Failed to write {}", dst_name.display()))?;
    }
    Ok(())
}
