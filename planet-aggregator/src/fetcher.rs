use crate::traits::FetchFeed;
use crate::types::{AggregatorError, FetchConfig, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// HTTP feed fetcher. Compression and redirects are handled by the client;
/// a failed request is reported once and never retried within a run.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FetchFeed for Fetcher {
    async fn fetch_document(&self, url: &str) -> Result<Vec<u8>> {
        let parsed = Url::parse(url)?;
        let start_time = Instant::now();

        debug!("Fetching feed: {}", url);

        let response = self.client.get(parsed).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Feed {} answered HTTP {}", url, status);
            return Err(AggregatorError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        info!(
            "Fetched feed: {} ({} bytes in {}ms)",
            url,
            body.len(),
            start_time.elapsed().as_millis()
        );
        Ok(body.to_vec())
    }
}
