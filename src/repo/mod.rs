pub mod client;
pub mod types;

pub use client::{GitHubClient, JsonSource};
pub use types::{RepoId, RepoRecord};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Timestamp layout used by the GitHub API for `created_at` / `updated_at`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Sub-resources of `repos/{owner}/{name}` fetched after the repository itself.
const SECONDARY_ENDPOINTS: [&str; 9] = [
    "branches",
    "contributors",
    "commits",
    "contents",
    "languages",
    "releases",
    "actions/workflows",
    "issues",
    "pulls",
];

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid repository URL: {0}")]
    InvalidUrl(String),

    #[error("Could not fetch repository information for {0}")]
    NotFound(RepoId),
}

/// Parse a repository URL into owner and name.
///
/// Accepts full URLs (`https://github.com/octo/demo.git`), scheme-less paths
/// (`github.com/octo/demo`) and bare `octo/demo`. The last two path segments
/// win; anything with fewer than two is rejected.
pub fn parse_repo_url(url: &str) -> Result<RepoId, RepoError> {
    let trimmed = url.trim();
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

    let segments: Vec<String> = match reqwest::Url::parse(trimmed) {
        Ok(parsed) if !parsed.cannot_be_a_base() => parsed
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        _ => trimmed
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect(),
    };

    match segments.as_slice() {
        [.., owner, name] => Ok(RepoId {
            owner: owner.clone(),
            name: name.clone(),
        }),
        _ => Err(RepoError::InvalidUrl(url.to_string())),
    }
}

/// Aggregate everything we know about `id` as of now.
pub async fn aggregate(
    source: &dyn JsonSource,
    id: &RepoId,
    web_url: &str,
) -> Option<RepoRecord> {
    aggregate_at(source, id, web_url, Utc::now()).await
}

/// Aggregate repository metadata, computing ages relative to `now`.
///
/// The repository lookup must succeed; without it nothing else is requested
/// and None is returned. The nine secondary requests are issued together and
/// each one that fails only blanks its own field.
///
/// Counts are the length of the first page of results. Pagination is not
/// followed, so any collection larger than one page is undercounted.
#[instrument(skip(source, web_url, now), fields(repo = %id))]
pub async fn aggregate_at(
    source: &dyn JsonSource,
    id: &RepoId,
    web_url: &str,
    now: DateTime<Utc>,
) -> Option<RepoRecord> {
    let base_path = format!("repos/{}/{}", id.owner, id.name);

    debug!("fetching repository metadata");
    let base = match source.fetch_json(&base_path).await? {
        Value::Object(map) => map,
        other => {
            warn!(kind = json_kind(&other), "repository response is not an object");
            return None;
        }
    };

    let [branches, contributors, commits, contents, languages, releases, workflows, issues, pulls] =
        SECONDARY_ENDPOINTS.map(|sub| format!("{}/{}", base_path, sub));
    let (branches, contributors, commits, contents, languages, releases, workflows, issues, pulls) = tokio::join!(
        source.fetch_json(&branches),
        source.fetch_json(&contributors),
        source.fetch_json(&commits),
        source.fetch_json(&contents),
        source.fetch_json(&languages),
        source.fetch_json(&releases),
        source.fetch_json(&workflows),
        source.fetch_json(&issues),
        source.fetch_json(&pulls),
    );

    let days_since_creation = parse_timestamp(&base, "created_at")
        .map(|created| (now - created).num_days());
    let last_commit_date = parse_timestamp(&base, "updated_at");

    let record = RepoRecord {
        owner: id.owner.clone(),
        branches: count(branches.as_ref(), "branches"),
        contributors: count(contributors.as_ref(), "contributors"),
        commits: count(commits.as_ref(), "commits"),
        files: count(contents.as_ref(), "contents"),
        languages: language_names(languages.as_ref()),
        releases: count(releases.as_ref(), "releases"),
        workflows: count(
            workflows.as_ref().and_then(|w| w.get("workflows")),
            "workflows",
        ),
        issues: count(issues.as_ref(), "issues"),
        pulls: count(pulls.as_ref(), "pulls"),
        code_frequency_link: format!(
            "{}/{}/{}/graphs/code-frequency",
            web_url.trim_end_matches('/'),
            id.owner,
            id.name
        ),
        days_since_creation,
        last_commit_date,
        base,
    };

    info!(
        branches = ?record.branches,
        commits = ?record.commits,
        contributors = ?record.contributors,
        "aggregated repository metadata"
    );
    Some(record)
}

/// Number of elements in an array response. Missing or non-array bodies
/// count as unknown rather than zero.
fn count(value: Option<&Value>, field: &str) -> Option<usize> {
    match value {
        Some(Value::Array(items)) => Some(items.len()),
        Some(other) => {
            warn!(field, kind = json_kind(other), "expected an array");
            None
        }
        None => None,
    }
}

fn language_names(value: Option<&Value>) -> Option<Vec<String>> {
    match value {
        Some(Value::Object(map)) => Some(map.keys().cloned().collect()),
        Some(other) => {
            warn!(field = "languages", kind = json_kind(other), "expected an object");
            None
        }
        None => None,
    }
}

fn parse_timestamp(base: &serde_json::Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    let raw = base.get(key).and_then(Value::as_str)?;
    match NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
        Ok(naive) => Some(naive.and_utc()),
        Err(err) => {
            warn!(key, raw, error = %err, "unparseable timestamp");
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
