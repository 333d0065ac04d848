//! REST API resources: repositories, forks, commits, trees, blobs, teams

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;

use super::{Client, GithubError, GithubResult};

const PER_PAGE: usize = 100;

/// A user or organization account
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Account {
    /// Profile name when set, else the login
    pub fn display_name(&self) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(&self.login)
    }
}

/// A repository as returned by the repos and forks endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub owner: Account,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// Commit author/committer signature
#[derive(Debug, Clone, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub date: DateTime<Utc>,
}

/// The git-level commit payload
#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub author: Option<Signature>,
    pub committer: Option<Signature>,
    #[serde(default)]
    pub message: String,
}

/// A file entry in a commit detail response
#[derive(Debug, Clone, Deserialize)]
pub struct CommitFile {
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitParent {
    pub sha: String,
}

/// A commit from the list or detail endpoints. `files` is only populated by
/// the detail endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub commit: CommitDetail,
    #[serde(default)]
    pub author: Option<Account>,
    #[serde(default)]
    pub parents: Vec<CommitParent>,
    #[serde(default)]
    pub files: Vec<CommitFile>,
}

impl Commit {
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// The commit timestamp (committer date, falling back to author date)
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.commit
            .committer
            .as_ref()
            .or(self.commit.author.as_ref())
            .map(|sig| sig.date)
    }

    /// Login of the GitHub account that authored the commit, if resolved
    pub fn author_login(&self) -> Option<&str> {
        self.author.as_ref().map(|a| a.login.as_str())
    }
}

/// A git tree entry
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub tree: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Deserialize)]
struct BlobPayload {
    content: String,
    encoding: String,
}

/// An organization team
#[derive(Debug, Clone, Deserialize)]
pub struct Team {
    pub name: String,
    pub slug: String,
}

impl Client {
    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> GithubResult<T> {
        let url = self.api_url(path);
        debug!("GET {}", url);
        let request = self.authorize(self.http().get(&url)).query(query);
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(GithubError::Status {
                status: status.as_u16(),
                url,
            });
        }
        Ok(response.json()?)
    }

    fn get_paginated<T: DeserializeOwned>(&self, path: &str) -> GithubResult<Vec<T>> {
        let mut results = Vec::new();
        let mut page = 1usize;
        loop {
            let batch: Vec<T> = self.get_json(
                path,
                &[
                    ("per_page", PER_PAGE.to_string()),
                    ("page", page.to_string()),
                ],
            )?;
            let len = batch.len();
            results.extend(batch);
            if len < PER_PAGE {
                return Ok(results);
            }
            page += 1;
        }
    }

    /// Fetch a repository by `owner/name`
    pub fn repository(&self, full_name: &str) -> GithubResult<Repository> {
        self.get_json(&format!("repos/{}", full_name), &[])
    }

    /// All forks of a repository
    pub fn forks(&self, full_name: &str) -> GithubResult<Vec<Repository>> {
        self.get_paginated(&format!("repos/{}/forks", full_name))
    }

    /// All commits on the default branch (no file lists)
    pub fn commits(&self, full_name: &str) -> GithubResult<Vec<Commit>> {
        self.get_paginated(&format!("repos/{}/commits", full_name))
    }

    /// The most recent commit on the default branch
    pub fn head_commit(&self, full_name: &str) -> GithubResult<Commit> {
        let mut commits: Vec<Commit> = self.get_json(
            &format!("repos/{}/commits", full_name),
            &[("per_page", "1".to_string())],
        )?;
        if commits.is_empty() {
            return Err(GithubError::Api {
                message: format!("{} has no commits", full_name),
            });
        }
        Ok(commits.remove(0))
    }

    /// A single commit, including the files it touched
    pub fn commit(&self, full_name: &str, sha: &str) -> GithubResult<Commit> {
        self.get_json(&format!("repos/{}/commits/{}", full_name, sha), &[])
    }

    /// The recursive git tree at a commit
    pub fn tree(&self, full_name: &str, sha: &str) -> GithubResult<Tree> {
        self.get_json(
            &format!("repos/{}/git/trees/{}", full_name, sha),
            &[("recursive", "1".to_string())],
        )
    }

    /// Blob paths and hashes at a repository's head commit
    pub fn head_tree_hashes(&self, full_name: &str) -> GithubResult<HashMap<String, String>> {
        let head = self.head_commit(full_name)?;
        let tree = self.tree(full_name, &head.sha)?;
        Ok(tree
            .tree
            .into_iter()
            .filter(|entry| entry.kind == "blob")
            .map(|entry| (entry.path, entry.sha))
            .collect())
    }

    /// Decoded contents of a blob. `path` is only used in error reports.
    /// The content API refuses oversized blobs; that case maps to
    /// [`GithubError::BlobTooLarge`] so callers can skip and continue.
    pub fn blob(&self, full_name: &str, sha: &str, path: &str) -> GithubResult<Vec<u8>> {
        let url_path = format!("repos/{}/git/blobs/{}", full_name, sha);
        let url = self.api_url(&url_path);
        debug!("GET {}", url);
        let response = self.authorize(self.http().get(&url)).send()?;
        let status = response.status();
        if status.as_u16() == 403 {
            return Err(GithubError::BlobTooLarge {
                path: path.to_string(),
            });
        }
        if !status.is_success() {
            return Err(GithubError::Status {
                status: status.as_u16(),
                url,
            });
        }
        let payload: BlobPayload = response.json()?;
        match payload.encoding.as_str() {
            "base64" => {
                let cleaned: String = payload
                    .content
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                Ok(BASE64.decode(cleaned)?)
            }
            "utf-8" => Ok(payload.content.into_bytes()),
            other => Err(GithubError::Api {
                message: format!("Unknown blob encoding {:?} for {}", other, path),
            }),
        }
    }

    /// Teams of an organization
    pub fn org_teams(&self, org: &str) -> GithubResult<Vec<Team>> {
        self.get_paginated(&format!("orgs/{}/teams", org))
    }

    /// Members of an organization team
    pub fn team_members(&self, org: &str, team_slug: &str) -> GithubResult<Vec<Account>> {
        self.get_paginated(&format!("orgs/{}/teams/{}/members", org, team_slug))
    }

    /// Logins of the members of a named team, when the team exists and the
    /// token can read it. Failures resolve to an empty set.
    pub fn team_member_logins(&self, org: &str, team_name: &str) -> Vec<String> {
        let teams = match self.org_teams(org) {
            Ok(teams) => teams,
            Err(e) => {
                debug!("Could not list teams for {}: {}", org, e);
                return Vec::new();
            }
        };
        let Some(team) = teams.iter().find(|t| t.name == team_name) else {
            return Vec::new();
        };
        match self.team_members(org, &team.slug) {
            Ok(members) => members.into_iter().map(|m| m.login).collect(),
            Err(e) => {
                debug!("Could not list members of {}/{}: {}", org, team.slug, e);
                Vec::new()
            }
        }
    }
}
