//! Upstream HTTP access.
//!
//! Sources talk to Jira and Confluence through the [`Upstream`] trait so the
//! transport can be swapped for canned responses in tests.

mod client;
#[cfg(test)]
pub mod fake;

pub use client::AtlassianClient;

use crate::error::FeedResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;

/// Status and body of an upstream reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Only a plain 200 counts; anything else degrades to "no records".
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Decode the body into a wire type.
    pub fn json<T: DeserializeOwned>(&self) -> FeedResult<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// A GET-only view of an Atlassian site.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Issue a GET against `url` with the given query parameters.
    async fn get(&self, url: &str, query: &[(&str, String)]) -> FeedResult<UpstreamResponse>;
}
