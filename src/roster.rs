//! Roster and name handling
//!
//! `Roster.csv` maps GitHub logins to display names. The first-name column
//! may be titled `Preferred`, `English`, or `First`; the first present wins.
//! Logins without a usable name fall back to the login itself.

use anyhow::{Context, Result};
use log::debug;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

const LOGIN_COLUMN: &str = "GitHub Login";
const FIRST_NAME_COLUMNS: [&str; 3] = ["Preferred", "English", "First"];
const LAST_NAME_COLUMN: &str = "Last";

/// Login -> display name lookup table
#[derive(Debug, Default, Clone)]
pub struct Roster {
    names: HashMap<String, String>,
}

impl Roster {
    /// Load a roster CSV. Rows with an empty first or last name are skipped.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to read roster: {}", path.display()))?;

        let headers = reader
            .headers()
            .context("Failed to read roster headers")?
            .clone();
        let login_ix = column_index(&headers, LOGIN_COLUMN)
            .with_context(|| format!("Roster {} has no {:?} column", path.display(), LOGIN_COLUMN))?;
        let first_ix = FIRST_NAME_COLUMNS
            .iter()
            .find_map(|name| column_index(&headers, name))
            .with_context(|| {
                format!(
                    "Roster {} has none of the first-name columns {:?}",
                    path.display(),
                    FIRST_NAME_COLUMNS
                )
            })?;
        let last_ix = column_index(&headers, LAST_NAME_COLUMN).with_context(|| {
            format!("Roster {} has no {:?} column", path.display(), LAST_NAME_COLUMN)
        })?;

        let mut names = HashMap::new();
        for record in reader.records() {
            let record = record.context("Failed to read roster row")?;
            let login = record.get(login_ix).unwrap_or("").trim();
            let first = record.get(first_ix).unwrap_or("").trim();
            let last = record.get(last_ix).unwrap_or("").trim();
            if login.is_empty() || first.is_empty() || last.is_empty() {
                continue;
            }
            names.insert(login.to_string(), format!("{} {}", first, last));
        }
        debug!("Loaded {} roster names from {}", names.len(), path.display());
        Ok(Self { names })
    }

    /// Load a roster, treating a missing file as empty
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("No roster at {}; using logins as names", path.display());
            Ok(Self::default())
        }
    }

    /// Display name for a login, falling back to the login itself
    pub fn display_name(&self, login: &str) -> String {
        self.names
            .get(login)
            .cloned()
            .unwrap_or_else(|| login.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

/// Short-name mapping over (first, last) name pairs: a person's first name
/// when it is unique among the set, else their full name.
///
/// The result is injective over the input pairs.
pub fn short_names(pairs: &[(String, String)]) -> HashMap<(String, String), String> {
    let mut first_name_count: HashMap<&str, usize> = HashMap::new();
    let mut seen: Vec<&(String, String)> = Vec::new();
    for pair in pairs {
        if !seen.contains(&pair) {
            seen.push(pair);
            *first_name_count.entry(pair.0.as_str()).or_insert(0) += 1;
        }
    }

    pairs
        .iter()
        .map(|pair| {
            let short = if first_name_count.get(pair.0.as_str()) == Some(&1) {
                pair.0.clone()
            } else {
                format!("{} {}", pair.0, pair.1)
            };
            (pair.clone(), short)
        })
        .collect()
}

/// Nickname list: `First "Nick" Last` lines, straight or curly quotes.
/// Lookup keys are Unicode-NFD case-folded (first, last) pairs.
#[derive(Debug, Default)]
pub struct Nicknames {
    map: HashMap<(String, String), String>,
}

impl Nicknames {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read nicknames: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let line_re = Regex::new(r#"(.+?)\s*["“](.+)["”]\s*(.+)"#).unwrap();
        let mut map = HashMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let captures = line_re
                .captures(line)
                .with_context(|| format!("Unparsable nickname line: {:?}", line))?;
            let first = captures.get(1).unwrap().as_str();
            let nickname = captures.get(2).unwrap().as_str();
            let last = captures.get(3).unwrap().as_str();
            map.insert(normalize_name_for_lookup(first, last), capitalize(nickname));
        }
        Ok(Self { map })
    }

    /// Load a nicknames file when a path is given, else an empty table
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// The nickname for (first, last), falling back to the first name
    pub fn preferred_first_name(&self, first: &str, last: &str) -> String {
        self.map
            .get(&normalize_name_for_lookup(first, last))
            .cloned()
            .unwrap_or_else(|| first.to_string())
    }
}

fn normalize_name_for_lookup(first: &str, last: &str) -> (String, String) {
    (
        first.nfd().collect::<String>().to_lowercase(),
        last.nfd().collect::<String>().to_lowercase(),
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
