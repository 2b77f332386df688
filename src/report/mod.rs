use crate::repo::RepoRecord;
use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

/// Shown in place of any value that could not be fetched or derived.
const MISSING: &str = "N/A";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where and how the report is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format<'a> {
    /// Labeled lines on stdout
    Terminal,
    /// Pretty JSON of the whole record on stdout
    Json,
    /// Markdown written to a file
    Markdown(&'a Path),
}

/// The report as an ordered list of (label, value) pairs.
///
/// Order and labels never change; absent values become "N/A".
pub fn fields(record: &RepoRecord) -> Vec<(&'static str, String)> {
    vec![
        ("Repository Name", text(record.name())),
        ("Owner", record.owner.clone()),
        ("Description", text(record.description())),
        ("License", text(record.license_name())),
        ("Date Created", text(record.created_at())),
        ("Days Since Creation", display(record.days_since_creation)),
        ("Stars", display(record.stars())),
        ("Forks", display(record.forks())),
        ("Branches", display(record.branches)),
        ("Number of Commits", display(record.commits)),
        ("Total Number of Files", display(record.files)),
        (
            "Languages Used",
            record
                .languages
                .as_ref()
                .map(|langs| langs.join(", "))
                .unwrap_or_else(|| MISSING.to_string()),
        ),
        ("Releases", display(record.releases)),
        ("Workflows (Actions)", display(record.workflows)),
        ("Issues", display(record.issues)),
        ("Pull Requests", display(record.pulls)),
        ("Total Number of Contributors", display(record.contributors)),
        ("Last Commit Date", display(record.last_commit_date)),
        ("Code Frequency", record.code_frequency_link.clone()),
    ]
}

fn text(value: Option<&str>) -> String {
    value.unwrap_or(MISSING).to_string()
}

fn display<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

/// Render the record in the requested format.
#[instrument(skip(record), fields(owner = %record.owner))]
pub fn output(record: &RepoRecord, format: Format<'_>) -> Result<(), ReportError> {
    match format {
        Format::Terminal => {
            debug!("writing report to terminal");
            print_terminal_report(record);
            Ok(())
        }
        Format::Json => {
            debug!("writing JSON report to terminal");
            println!("{}", render_json(record)?);
            Ok(())
        }
        Format::Markdown(path) => {
            debug!(path = %path.display(), "writing report to file");
            write_markdown_report(record, path)
        }
    }
}

/// The record as pretty JSON: API fields and derived fields in one object.
fn render_json(record: &RepoRecord) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(record)?)
}

fn print_terminal_report(record: &RepoRecord) {
    for (label, value) in fields(record) {
        let value = if value == MISSING {
            value.dimmed()
        } else {
            value.normal()
        };
        println!("{} {}", format!("{}:", label).bold(), value);
    }
}

/// Write the report as a markdown file: a heading with the repository name
/// followed by one bullet per field.
fn write_markdown_report(record: &RepoRecord, path: &Path) -> Result<(), ReportError> {
    let mut md = String::new();
    md.push_str(&format!(
        "# {}/{}\n\n",
        record.owner,
        record.name().unwrap_or(MISSING)
    ));
    for (label, value) in fields(record) {
        md.push_str(&format!("- **{}:** {}\n", label, value));
    }

    std::fs::write(path, md)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    const LABELS: [&str; 19] = [
        "Repository Name",
        "Owner",
        "Description",
        "License",
        "Date Created",
        "Days Since Creation",
        "Stars",
        "Forks",
        "Branches",
        "Number of Commits",
        "Total Number of Files",
        "Languages Used",
        "Releases",
        "Workflows (Actions)",
        "Issues",
        "Pull Requests",
        "Total Number of Contributors",
        "Last Commit Date",
        "Code Frequency",
    ];

    fn sample_record() -> RepoRecord {
        RepoRecord {
            base: json!({
                "name": "demo",
                "description": "Demo repository",
                "license": { "name": "MIT License" },
                "created_at": "2020-01-01T00:00:00Z",
                "stargazers_count": 42,
                "forks_count": 7
            })
            .as_object()
            .cloned()
            .unwrap(),
            owner: "octo".to_string(),
            branches: Some(3),
            contributors: Some(5),
            commits: Some(30),
            files: Some(12),
            languages: Some(vec!["Rust".to_string(), "Shell".to_string()]),
            releases: Some(2),
            workflows: Some(1),
            issues: Some(4),
            pulls: Some(1),
            code_frequency_link: "https://github.com/octo/demo/graphs/code-frequency".to_string(),
            days_since_creation: Some(10),
            last_commit_date: Some(Utc.with_ymd_and_hms(2020, 1, 5, 12, 30, 0).unwrap()),
        }
    }

    fn empty_record() -> RepoRecord {
        RepoRecord {
            base: serde_json::Map::new(),
            owner: "octo".to_string(),
            branches: None,
            contributors: None,
            commits: None,
            files: None,
            languages: None,
            releases: None,
            workflows: None,
            issues: None,
            pulls: None,
            code_frequency_link: "https://github.com/octo/demo/graphs/code-frequency".to_string(),
            days_since_creation: None,
            last_commit_date: None,
        }
    }

    fn labels(record: &RepoRecord) -> Vec<&'static str> {
        fields(record).into_iter().map(|(label, _)| label).collect()
    }

    #[test]
    fn test_field_order_is_fixed() {
        assert_eq!(labels(&sample_record()), LABELS);
        assert_eq!(labels(&empty_record()), LABELS);
    }

    #[test]
    fn test_field_values() {
        let values: Vec<String> = fields(&sample_record()).into_iter().map(|(_, v)| v).collect();
        assert_eq!(values[0], "demo");
        assert_eq!(values[3], "MIT License");
        assert_eq!(values[5], "10");
        assert_eq!(values[8], "3");
        assert_eq!(values[11], "Rust, Shell");
        assert_eq!(values[17], "2020-01-05 12:30:00 UTC");
    }

    #[test]
    fn test_absent_fields_render_placeholder() {
        let fields = fields(&empty_record());
        let license = fields.iter().find(|(l, _)| *l == "License").unwrap();
        assert_eq!(license.1, "N/A");
        let contributors = fields
            .iter()
            .find(|(l, _)| *l == "Total Number of Contributors")
            .unwrap();
        assert_eq!(contributors.1, "N/A");
        let owner = fields.iter().find(|(l, _)| *l == "Owner").unwrap();
        assert_eq!(owner.1, "octo");
    }

    #[test]
    fn test_empty_language_list() {
        let mut record = sample_record();
        record.languages = Some(vec![]);
        let langs = fields(&record)
            .into_iter()
            .find(|(l, _)| *l == "Languages Used")
            .unwrap();
        assert_eq!(langs.1, "");
    }

    #[test]
    fn test_write_markdown_report() {
        let path = std::env::temp_dir().join("repo_info_test_report.md");
        write_markdown_report(&sample_record(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# octo/demo"));
        assert!(content.contains("- **Stars:** 42"));
        assert!(content.contains("- **Workflows (Actions):** 1"));
        assert!(content.contains("- **Code Frequency:** https://github.com/octo/demo/graphs/code-frequency"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_output_to_file() {
        let path = std::env::temp_dir().join("repo_info_test_output.md");
        output(&empty_record(), Format::Markdown(&path)).unwrap();
        assert!(path.exists());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_output_to_terminal() {
        // Should not panic
        output(&sample_record(), Format::Terminal).unwrap();
        output(&empty_record(), Format::Terminal).unwrap();
    }

    #[test]
    fn test_render_json_flattens_record() {
        let rendered = render_json(&sample_record()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["name"], "demo");
        assert_eq!(value["license"]["name"], "MIT License");
        assert_eq!(value["stargazers_count"], 42);
        assert_eq!(value["owner_name"], "octo");
        assert_eq!(value["branches"], 3);
        assert_eq!(value["contributors_count"], 5);
        assert_eq!(value["workflows_count"], 1);
        assert_eq!(value["languages_used"], json!(["Rust", "Shell"]));
        assert_eq!(value["days_since_creation"], 10);
        assert_eq!(value["last_commit_date"], "2020-01-05T12:30:00Z");
        assert!(value.get("base").is_none());
    }

    #[test]
    fn test_render_json_keeps_absent_fields_as_null() {
        let rendered = render_json(&empty_record()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert!(value["pulls_count"].is_null());
        assert!(value["languages_used"].is_null());
        assert!(value["last_commit_date"].is_null());
        assert_eq!(
            value["code_frequency_link"],
            "https://github.com/octo/demo/graphs/code-frequency"
        );
    }

    #[test]
    fn test_output_json() {
        output(&sample_record(), Format::Json).unwrap();
    }
}
