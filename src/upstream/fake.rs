//! Canned upstream used by the unit tests.

use super::{Upstream, UpstreamResponse};
use crate::error::{FeedError, FeedResult};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

enum Reply {
    Response(UpstreamResponse),
    Failure(String),
}

/// Replies are queued per URL; the last reply for a URL repeats forever.
/// Unknown URLs answer 404.
#[derive(Default)]
pub struct FakeUpstream {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl FakeUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, url: &str, status: u16, body: &str) -> Self {
        self.push(url, Reply::Response(UpstreamResponse::new(status, body)));
        self
    }

    pub fn fail(self, url: &str, reason: &str) -> Self {
        self.push(url, Reply::Failure(reason.to_string()));
        self
    }

    fn push(&self, url: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }

    /// URLs requested so far, in order.
    pub fn called_urls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// Query value sent with the n-th call.
    pub fn query_param(&self, call: usize, name: &str) -> Option<String> {
        let calls = self.calls.lock().unwrap();
        calls.get(call).and_then(|(_, query)| {
            query
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        })
    }
}

#[async_trait]
impl Upstream for FakeUpstream {
    async fn get(&self, url: &str, query: &[(&str, String)]) -> FeedResult<UpstreamResponse> {
        self.calls.lock().unwrap().push((
            url.to_string(),
            query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        ));

        let mut replies = self.replies.lock().unwrap();
        let Some(queue) = replies.get_mut(url) else {
            return Ok(UpstreamResponse::new(404, "Not Found"));
        };

        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            None
        };

        match reply.as_ref().or_else(|| queue.front()) {
            Some(Reply::Response(response)) => Ok(response.clone()),
            Some(Reply::Failure(reason)) => Err(FeedError::Client(reason.clone())),
            None => Ok(UpstreamResponse::new(404, "Not Found")),
        }
    }
}
