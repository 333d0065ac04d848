//! GraphQL queries
//!
//! One paginated query drives README collation: every repository of an
//! organization, with its README blob, template parent, and recent history.

use chrono::{DateTime, FixedOffset};
use log::debug;
use serde::Deserialize;
use serde_json::json;

use super::{Client, GithubError, GithubResult};

const ORG_REPOS_QUERY: &str = r#"
query($organizationLogin: String!, $cursor: String) {
  organization(login: $organizationLogin) {
    repositories(first: 100, after: $cursor) {
      nodes {
        name
        nameWithOwner
        readme: object(expression: "master:README.md") {
          ... on Blob {
            text
          }
        }
        templateRepository {
          nameWithOwner
        }
        ref(qualifiedName: "master") {
          target {
            ... on Commit {
              history(first: 100) {
                edges {
                  node {
                    oid
                    author {
                      name
                      email
                      date
                    }
                  }
                }
              }
            }
          }
        }
      }
      pageInfo {
        endCursor
        hasNextPage
      }
    }
  }
}
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct OrgRepo {
    pub name: String,
    #[serde(rename = "nameWithOwner")]
    pub name_with_owner: String,
    #[serde(default)]
    pub readme: Option<ReadmeBlob>,
    #[serde(rename = "templateRepository", default)]
    pub template_repository: Option<TemplateRepository>,
    #[serde(rename = "ref", default)]
    pub default_ref: Option<Ref>,
}

impl OrgRepo {
    /// History commits of the default branch, newest first
    pub fn history(&self) -> Vec<&HistoryCommit> {
        self.default_ref
            .iter()
            .filter_map(|r| r.target.as_ref())
            .flat_map(|t| t.history.edges.iter())
            .map(|e| &e.node)
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadmeBlob {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateRepository {
    #[serde(rename = "nameWithOwner")]
    pub name_with_owner: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ref {
    pub target: Option<RefTarget>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefTarget {
    #[serde(default)]
    pub history: History,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct History {
    #[serde(default)]
    pub edges: Vec<HistoryEdge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEdge {
    pub node: HistoryCommit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryCommit {
    pub oid: String,
    pub author: Option<CommitAuthor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitAuthor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub date: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct OrgReposData {
    organization: Option<OrganizationNode>,
}

#[derive(Debug, Deserialize)]
struct OrganizationNode {
    repositories: RepositoryConnection,
}

#[derive(Debug, Deserialize)]
struct RepositoryConnection {
    nodes: Vec<OrgRepo>,
    #[serde(rename = "pageInfo")]
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(rename = "endCursor")]
    end_cursor: Option<String>,
    #[serde(rename = "hasNextPage")]
    has_next_page: bool,
}

impl Client {
    /// Execute a GraphQL query. GraphQL-level errors are joined into one
    /// [`GithubError::Api`].
    pub fn graphql(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> GithubResult<serde_json::Value> {
        self.require_token()?;
        let url = self.api_url("graphql");
        debug!("POST {}", url);
        let response = self
            .authorize(self.http().post(&url))
            .json(&json!({ "query": query, "variables": variables }))
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(GithubError::Status {
                status: status.as_u16(),
                url,
            });
        }
        let body: GraphQlResponse = response.json()?;
        if !body.errors.is_empty() {
            let message = body
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            return Err(GithubError::Api { message });
        }
        body.data.ok_or_else(|| GithubError::Api {
            message: "GraphQL response carried no data".to_string(),
        })
    }

    /// All repositories of an organization, across pages
    pub fn organization_repos(&self, org: &str) -> GithubResult<Vec<OrgRepo>> {
        let mut repos = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let data = self.graphql(
                ORG_REPOS_QUERY,
                json!({ "organizationLogin": org, "cursor": cursor }),
            )?;
            let page: OrgReposData = serde_json::from_value(data)?;
            let organization = page.organization.ok_or_else(|| GithubError::Api {
                message: format!("No such organization: {}", org),
            })?;
            repos.extend(organization.repositories.nodes);
            let page_info = organization.repositories.page_info;
            if !page_info.has_next_page {
                return Ok(repos);
            }
            cursor = page_info.end_cursor;
        }
    }
}

/// Split an organization's repositories into the source repository and the
/// repositories generated from it as a template.
pub fn partition_generated(
    repos: Vec<OrgRepo>,
    source_name_with_owner: &str,
) -> GithubResult<(OrgRepo, Vec<OrgRepo>)> {
    let source_ix = repos
        .iter()
        .position(|r| r.name_with_owner == source_name_with_owner)
        .ok_or_else(|| GithubError::Api {
            message: format!(
                "Source repository {} not found in the organization",
                source_name_with_owner
            ),
        })?;

    let mut repos = repos;
    let source = repos.remove(source_ix);
    let generated = repos
        .into_iter()
        .filter(|r| {
            r.template_repository
                .as_ref()
                .map(|t| t.name_with_owner == source_name_with_owner)
                .unwrap_or(false)
        })
        .collect();
    Ok((source, generated))
}
