//! reqwest-backed upstream client with basic authentication.

use super::{Upstream, UpstreamResponse};
use crate::config::Credentials;
use crate::error::{FeedError, FeedResult};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::debug;

/// HTTP client bound to one Atlassian account.
pub struct AtlassianClient {
    http_client: reqwest::Client,
    email: String,
    token: String,
}

impl AtlassianClient {
    /// Build a client for the given credentials.
    ///
    /// Without a timeout the transport default applies.
    pub fn new(credentials: &Credentials, timeout_seconds: Option<u64>) -> FeedResult<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("portal-feed/", env!("CARGO_PKG_VERSION")));

        if let Some(secs) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let http_client = builder
            .build()
            .map_err(|e| FeedError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            email: credentials.email.clone(),
            token: credentials.token.clone(),
        })
    }
}

#[async_trait]
impl Upstream for AtlassianClient {
    async fn get(&self, url: &str, query: &[(&str, String)]) -> FeedResult<UpstreamResponse> {
        debug!("GET {} {:?}", url, query);

        let response = self
            .http_client
            .get(url)
            .basic_auth(&self.email, Some(&self.token))
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("{} -> {} ({} bytes)", url, status, body.len());

        Ok(UpstreamResponse::new(status, body))
    }
}
