use crate::types::Result;
use async_trait::async_trait;

/// Retrieves raw feed documents. The HTTP implementation lives in
/// `fetcher.rs`; anything that can hand back bytes for a URL can drive the
/// aggregator.
#[async_trait]
pub trait FetchFeed: Send + Sync {
    /// Fetch the document at `url`. One request, no retries.
    async fn fetch_document(&self, url: &str) -> Result<Vec<u8>>;
}
