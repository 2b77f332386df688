use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Owner and name of a repository, extracted by parse_repo_url() in repo/mod.rs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Aggregated metadata about one repository.
///
/// `base` holds the repository lookup response verbatim. Every derived field
/// is optional: a secondary request that failed leaves its field as None.
#[derive(Debug, Clone, Serialize)]
pub struct RepoRecord {
    /// Fields of `GET /repos/{owner}/{name}`, flattened when serialized
    #[serde(flatten)]
    pub base: Map<String, Value>,
    #[serde(rename = "owner_name")]
    pub owner: String,
    pub branches: Option<usize>,
    #[serde(rename = "contributors_count")]
    pub contributors: Option<usize>,
    #[serde(rename = "commits_count")]
    pub commits: Option<usize>,
    #[serde(rename = "files_count")]
    pub files: Option<usize>,
    #[serde(rename = "languages_used")]
    pub languages: Option<Vec<String>>,
    #[serde(rename = "releases_count")]
    pub releases: Option<usize>,
    #[serde(rename = "workflows_count")]
    pub workflows: Option<usize>,
    #[serde(rename = "issues_count")]
    pub issues: Option<usize>,
    #[serde(rename = "pulls_count")]
    pub pulls: Option<usize>,
    pub code_frequency_link: String,
    pub days_since_creation: Option<i64>,
    pub last_commit_date: Option<DateTime<Utc>>,
}

impl RepoRecord {
    pub fn name(&self) -> Option<&str> {
        self.base_str("name")
    }

    pub fn description(&self) -> Option<&str> {
        self.base_str("description")
    }

    pub fn license_name(&self) -> Option<&str> {
        self.base
            .get("license")
            .and_then(|license| license.get("name"))
            .and_then(Value::as_str)
    }

    pub fn created_at(&self) -> Option<&str> {
        self.base_str("created_at")
    }

    pub fn stars(&self) -> Option<u64> {
        self.base.get("stargazers_count").and_then(Value::as_u64)
    }

    pub fn forks(&self) -> Option<u64> {
        self.base.get("forks_count").and_then(Value::as_u64)
    }

    fn base_str(&self, key: &str) -> Option<&str> {
        self.base.get(key).and_then(Value::as_str)
    }
}
