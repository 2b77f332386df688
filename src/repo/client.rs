use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use super::RepoError;
use crate::config::Config;

/// Source of JSON documents keyed by API path (e.g. `repos/octo/demo/branches`).
///
/// A failed lookup yields None; callers treat that as "field unavailable".
#[async_trait]
pub trait JsonSource: Send + Sync {
    async fn fetch_json(&self, endpoint: &str) -> Option<Value>;
}

/// GitHub REST client shared by every request of a run.
///
/// Holds one pooled reqwest::Client, the optional token and a semaphore that
/// caps the number of requests in flight.
pub struct GitHubClient {
    client: Client,
    api_url: String,
    token: Option<String>,
    permits: Arc<Semaphore>,
}

impl GitHubClient {
    pub fn new(config: &Config, token: Option<String>) -> Result<Self, RepoError> {
        let client = Client::builder()
            .timeout(config.http.timeout())
            .user_agent(config.http.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            api_url: config.github.api_url.trim_end_matches('/').to_string(),
            token,
            permits: Arc::new(Semaphore::new(config.http.max_concurrency.max(1))),
        })
    }

    fn url_for(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_url, endpoint.trim_start_matches('/'))
    }

    async fn get(&self, url: &str) -> Result<Value, reqwest::Error> {
        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        request.send().await?.error_for_status()?.json::<Value>().await
    }
}

#[async_trait]
impl JsonSource for GitHubClient {
    #[instrument(skip(self))]
    async fn fetch_json(&self, endpoint: &str) -> Option<Value> {
        let url = self.url_for(endpoint);

        // The semaphore is never closed, so acquire only fails if it were.
        let _permit = self.permits.acquire().await.ok()?;

        debug!(%url, "sending request");
        match self.get(&url).await {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%url, error = %err, "error fetching data");
                None
            }
        }
    }
}
