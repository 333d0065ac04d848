//! Parallel HTTP fetches
//!
//! A fixed-size worker pool parallelises the two batch-download paths:
//! student notebook URLs and GitHub username validation. Results are keyed
//! by username, so completion order does not matter. There is no retry,
//! cancellation, or backpressure; a hung request stalls the batch.

use anyhow::{Context, Result};
use log::{debug, warn};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::collections::HashMap;

/// HTTP fetch parallelism. This number is empirically good.
pub const DEFAULT_WORKERS: usize = 20;

/// Build a fixed-size worker pool
pub fn worker_pool(workers: usize) -> Result<ThreadPool> {
    let workers = workers.max(1).min(num_cpus::get() * 8);
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .context("Failed to build worker pool")
}

/// Fetch each `(username, url)` pair, returning body text keyed by username.
/// A failed or non-success fetch yields `None` for that user.
pub fn fetch_text_batch(
    client: &reqwest::blocking::Client,
    jobs: &[(String, String)],
    workers: usize,
) -> Result<HashMap<String, Option<String>>> {
    let pool = worker_pool(workers)?;
    let results = pool.install(|| {
        jobs.par_iter()
            .map(|(username, url)| (username.clone(), fetch_text(client, username, url)))
            .collect()
    });
    Ok(results)
}

fn fetch_text(client: &reqwest::blocking::Client, username: &str, url: &str) -> Option<String> {
    if url.trim().is_empty() {
        return None;
    }
    debug!("Fetching {} for {}", url, username);
    match client.get(url).send() {
        Ok(response) if response.status().is_success() => response.text().ok(),
        Ok(response) => {
            warn!("{}: {} returned {}", username, url, response.status());
            None
        }
        Err(e) => {
            warn!("{}: fetch failed: {}", username, e);
            None
        }
    }
}

/// Validate GitHub usernames by probing their profile pages in parallel.
/// Returns `(valid, invalid)` username lists, each in input order.
pub fn validate_usernames(
    client: &reqwest::blocking::Client,
    usernames: &[String],
    workers: usize,
) -> Result<(Vec<String>, Vec<String>)> {
    let pool = worker_pool(workers)?;
    let statuses: Vec<bool> = pool.install(|| {
        usernames
            .par_iter()
            .map(|name| {
                let url = format!("https://github.com/{}", name);
                match client.get(&url).send() {
                    Ok(response) => response.status().is_success(),
                    Err(e) => {
                        warn!("{}: validation request failed: {}", name, e);
                        false
                    }
                }
            })
            .collect()
    });

    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    for (name, ok) in usernames.iter().zip(statuses) {
        if ok {
            valid.push(name.clone());
        } else {
            invalid.push(name.clone());
        }
    }
    Ok((valid, invalid))
}
