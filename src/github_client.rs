use anyhow::Context;
use reqwest::Client;

use crate::digest::parse_events;
use crate::domain::ActivityEvent;

/// Reads the public GitHub events feed.
pub struct GitHubClient {
    http_client: Client,
    base_url: String,
    per_page: u8,
}

impl GitHubClient {
    pub fn new(
        base_url: String,
        user_agent: &str,
        per_page: u8,
        timeout: std::time::Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http_client,
            base_url,
            per_page,
        })
    }

    /// Fetches recent events. A response that is not JSON is treated as an
    /// empty feed; transport failures and error statuses are returned.
    #[tracing::instrument(name = "Fetching GitHub events", skip(self))]
    pub async fn fetch_events(&self) -> Result<Vec<ActivityEvent>, anyhow::Error> {
        let url = format!("{}/events", self.base_url.trim_end_matches('/'));
        let body = self
            .http_client
            .get(&url)
            .query(&[("per_page", self.per_page)])
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .context("Failed to reach the GitHub events API.")?
            .error_for_status()
            .context("The GitHub events API returned an error.")?
            .bytes()
            .await
            .context("Failed to read the GitHub events response.")?;

        match serde_json::from_slice(&body) {
            Ok(raw) => Ok(parse_events(&raw)),
            Err(error) => {
                tracing::warn!(error.message = %error, "The GitHub events response is not JSON.");
                Ok(Vec::new())
            }
        }
    }
}
