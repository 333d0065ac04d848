//! Course configuration
//!
//! Courses are described in a YAML file mapping a short course key to its
//! GitHub source repository and download settings:
//!
//! ```yaml
//! softdes:
//!   source_repo: sd16fall/ReadingJournal
//!   download_path: build/sd16-reading-repos
//!   instructors: [osteele]
//!   dropped: [wentworth]
//! ```
//!
//! Discovery order: explicit `--config` path, `./courses.yaml`,
//! `~/.config/coursekit/courses.yaml`. A missing file yields an empty
//! configuration; a course argument that matches no entry is treated as a
//! bare `owner/name` source repository.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "courses.yaml";
pub const DEFAULT_TEAM_NAME: &str = "Instructors";

/// Per-course settings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CourseConfig {
    /// Source repository, `owner/name`
    pub source_repo: String,

    /// Directory that downloaded student files land in
    #[serde(default)]
    pub download_path: Option<PathBuf>,

    /// Logins of instructors who forked the repo but are not students
    #[serde(default)]
    pub instructors: Vec<String>,

    /// Logins of students who forked the repo but dropped the course
    #[serde(default)]
    pub dropped: Vec<String>,

    /// Organization team whose members are treated as instructors
    #[serde(default)]
    pub team: Option<String>,
}

impl CourseConfig {
    /// Source repository owner (the organization login)
    pub fn organization(&self) -> &str {
        self.source_repo
            .split('/')
            .next()
            .unwrap_or(&self.source_repo)
    }

    /// Team name to resolve instructors from
    pub fn team_name(&self) -> &str {
        self.team.as_deref().unwrap_or(DEFAULT_TEAM_NAME)
    }

    /// True when `login` belongs to an instructor or a dropped student
    pub fn is_excluded(&self, login: &str) -> bool {
        self.instructors.iter().any(|l| l == login) || self.dropped.iter().any(|l| l == login)
    }
}

/// The parsed configuration file: course key -> settings
#[derive(Debug, Default)]
pub struct ConfigFile {
    courses: HashMap<String, CourseConfig>,
    path: Option<PathBuf>,
}

impl ConfigFile {
    /// Load using the discovery hierarchy. An explicit path must exist;
    /// discovered paths are optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        for path in discover_config_files() {
            debug!("Attempting to load config from: {}", path.display());
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        info!("No course configuration file found, using empty configuration");
        Ok(Self::default())
    }

    /// Load configuration from an explicit file path
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let courses: HashMap<String, CourseConfig> = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!("Loaded course configuration from: {}", path.display());
        Ok(Self {
            courses,
            path: Some(path.to_path_buf()),
        })
    }

    /// Path the configuration was loaded from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Resolve a course key or `owner/name` source repository.
    ///
    /// Lookup order: course key, then an entry whose `source_repo` matches,
    /// then a bare configuration naming `key_or_repo` as the source repo.
    pub fn resolve(&self, key_or_repo: &str) -> CourseConfig {
        if let Some(config) = self.courses.get(key_or_repo) {
            return config.clone();
        }
        if let Some(config) = self
            .courses
            .values()
            .find(|c| c.source_repo == key_or_repo)
        {
            return config.clone();
        }
        debug!(
            "No configured course matches {:?}; treating it as a source repository",
            key_or_repo
        );
        CourseConfig {
            source_repo: key_or_repo.to_string(),
            ..CourseConfig::default()
        }
    }
}

/// Configuration file discovery hierarchy
fn discover_config_files() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(DEFAULT_CONFIG_FILE)];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("coursekit").join(DEFAULT_CONFIG_FILE));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
softdes:
  source_repo: sd16fall/ReadingJournal
  download_path: build/sd16-reading-repos
  instructors: [osteele]
  dropped: [wentworth]
focs:
  source_repo: focs16fall/focs-homework
";

    fn sample_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_resolve_by_course_key() {
        let file = sample_file();
        let config = ConfigFile::load_from_file(file.path()).unwrap();
        let course = config.resolve("softdes");
        assert_eq!(course.source_repo, "sd16fall/ReadingJournal");
        assert_eq!(
            course.download_path.as_deref(),
            Some(Path::new("build/sd16-reading-repos"))
        );
        assert_eq!(course.instructors, vec!["osteele"]);
    }

    #[test]
    fn test_resolve_by_source_repo() {
        let file = sample_file();
        let config = ConfigFile::load_from_file(file.path()).unwrap();
        let course = config.resolve("focs16fall/focs-homework");
        assert_eq!(course.source_repo, "focs16fall/focs-homework");
        assert!(course.instructors.is_empty());
    }

    #[test]
    fn test_resolve_unknown_repo_falls_back() {
        let config = ConfigFile::default();
        let course = config.resolve("someorg/some-repo");
        assert_eq!(course.source_repo, "someorg/some-repo");
        assert!(course.download_path.is_none());
    }

    #[test]
    fn test_organization_and_exclusions() {
        let file = sample_file();
        let config = ConfigFile::load_from_file(file.path()).unwrap();
        let course = config.resolve("softdes");
        assert_eq!(course.organization(), "sd16fall");
        assert_eq!(course.team_name(), DEFAULT_TEAM_NAME);
        assert!(course.is_excluded("osteele"));
        assert!(course.is_excluded("wentworth"));
        assert!(!course.is_excluded("student"));
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"course: [unterminated").unwrap();
        assert!(ConfigFile::load_from_file(file.path()).is_err());
    }
}
