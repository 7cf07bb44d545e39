//! HTTP transport for intel feeds
//!
//! Conditional GETs over one shared client. The stores own retry and
//! isolation policy; this layer only answers "what did the server say",
//! with `None` for anything that never produced a usable body.

use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

use crate::intel::{FeedBody, FeedFetch};
use crate::utils::{FEED_TIMEOUT_SECS, USER_AGENT};

/// Production feed transport
#[derive(Debug, Clone)]
pub struct HttpFeedFetch {
    client: reqwest::Client,
}

impl Default for HttpFeedFetch {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFeedFetch {
    pub fn new() -> Self {
        let client = match reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(FEED_TIMEOUT_SECS))
            .gzip(true)
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!("⚠️ Feed client builder failed ({}), using defaults", e);
                reqwest::Client::new()
            }
        };
        Self { client }
    }
}

impl FeedFetch for HttpFeedFetch {
    async fn fetch(&self, url: &str, etag: Option<&str>) -> Option<FeedBody> {
        let mut request = self.client.get(url);
        if let Some(etag) = etag {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Feed request failed for {}: {}", url, e);
                return None;
            }
        };

        if response.status() == StatusCode::NOT_MODIFIED {
            return Some(FeedBody::not_modified(etag.map(|e| e.to_string())));
        }
        if !response.status().is_success() {
            debug!("Feed {} answered {}", url, response.status());
            return None;
        }

        let new_etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        match response.text().await {
            Ok(body) => Some(FeedBody {
                body,
                etag: new_etag,
            }),
            Err(e) => {
                debug!("Feed body read failed for {}: {}", url, e);
                None
            }
        }
    }
}
