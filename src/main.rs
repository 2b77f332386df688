mod config;
mod repo;
mod report;

use clap::Parser;
use indicatif::ProgressBar;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

/// repo-info: summarize a GitHub repository's metadata (stars, branches,
/// contributors, commits, workflows and more) in one report.
#[derive(Parser, Debug)]
#[command(name = "repo-info", version, about)]
struct Cli {
    /// Repository URL (e.g., https://github.com/org/repo or org/repo)
    ///
    /// Prompted for on the terminal when omitted.
    repo_url: Option<String>,

    /// GitHub personal access token. Overrides the config file and GITHUB_TOKEN.
    #[arg(short, long)]
    token: Option<String>,

    /// Path to a config file (defaults to .repo-info.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write a markdown report to this path instead of printing
    #[arg(short, long, conflicts_with = "json")]
    output: Option<PathBuf>,

    /// Print the aggregated record as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let repo_url = match cli.repo_url {
        Some(url) => url,
        None => prompt(&mut io::stdin().lock(), &mut io::stderr(), "Enter GitHub repository URL: ")?,
    };

    let _main_span = info_span!("repo_info", repo_url = %repo_url).entered();

    info!("parsing repository URL");
    let repo_id = repo::parse_repo_url(&repo_url)?;
    debug!(owner = %repo_id.owner, name = %repo_id.name, "parsed repository URL");

    info!("loading configuration");
    let config = config::Config::load(cli.config.as_deref())?;
    let mut token = config.github_token(cli.token.as_deref());
    if token.is_none() && io::stdin().is_terminal() {
        let answer = prompt(
            &mut io::stdin().lock(),
            &mut io::stderr(),
            "Enter your GitHub personal access token (optional): ",
        )?;
        token = config.github_token(Some(&answer));
    }
    debug!(authenticated = token.is_some(), api_url = %config.github.api_url, "resolved credentials");

    let client = repo::GitHubClient::new(&config, token)?;

    info!("fetching repository information");
    let spinner = spinner("Calculating...");
    let record = repo::aggregate(&client, &repo_id, &config.github.web_url).await;
    spinner.finish_and_clear();
    let record = record.ok_or_else(|| repo::RepoError::NotFound(repo_id.clone()))?;

    let format = match (&cli.output, cli.json) {
        (Some(path), _) => report::Format::Markdown(path),
        (None, true) => report::Format::Json,
        (None, false) => report::Format::Terminal,
    };
    report::output(&record, format)?;
    info!("done");

    Ok(())
}

/// Spinner on stderr while the requests are in flight. Hidden when stderr
/// isn't a terminal so piped or logged output stays clean.
fn spinner(message: &'static str) -> ProgressBar {
    if !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Write `message` to `output` and read one trimmed line from `input`.
/// Prompts go to stderr so stdout carries only the report.
fn prompt(input: &mut impl BufRead, output: &mut impl Write, message: &str) -> io::Result<String> {
    write!(output, "{}", message)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}
