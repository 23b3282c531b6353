// Upstream HTTP transport
// This file implements the single-shot JSON fetch against the NNFCM
// statistics and monitoring REST endpoints

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use tracing::{debug, info};
use url::Url;

use crate::errors::ExporterError;
use crate::source::{Payload, SourceKind};

/// Query parameter carrying the shared operator selector.
pub const SELECTOR_PARAM: &str = "operatorIdentifier";

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
}

impl Default for UpstreamClient {
    fn default() -> Self {
        Self {
            http: Client::new(),
        }
    }
}

impl UpstreamClient {
    pub fn new(timeout: Option<Duration>) -> Result<Self, ExporterError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ExporterError::Client(e.to_string()))?;
        Ok(Self { http })
    }

    /// One GET, no retries. Anything but a 200 with a body of the expected
    /// shape is an error tagged with the URL.
    pub async fn fetch(&self, url: &Url, kind: SourceKind) -> Result<Payload, ExporterError> {
        info!(url = %url, source = %kind, "fetching upstream category");
        let started = Instant::now();

        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ExporterError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(ExporterError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|e| ExporterError::Transport {
            url: url.to_string(),
            reason: format!("read body: {e}"),
        })?;

        debug!(
            url = %url,
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream responded"
        );

        kind.decode(url.as_str(), &body)
    }
}

/// `{base}/{kind base path}/{category}?operatorIdentifier={selector}`
pub fn category_url(base: &Url, kind: SourceKind, category: &str, selector: &str) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty();
        segments.extend(kind.base_path());
        segments.push(category);
    }
    url.query_pairs_mut().append_pair(SELECTOR_PARAM, selector);
    url
}
