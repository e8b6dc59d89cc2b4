use crate::types::PageRequest;
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Network operations needed to download a fan's collections.
///
/// This trait is the seam between the download logic and the HTTP stack, so
/// the pagination protocol can be driven against scripted responses in tests.
///
/// # Mocking Support
///
/// When the `mock` feature is enabled, this crate provides `MockCollectionApi`
/// that implements this trait using the `mockall` library.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait(?Send)]
pub trait CollectionApi {
    /// Fetch an HTML page (the fan's profile page) with the session cookies.
    async fn fetch_page(&self, url: &str) -> Result<String>;

    /// Post one page request to a collection endpoint and return the decoded
    /// JSON response body, unvalidated.
    async fn collection_page(&self, endpoint: &str, request: &PageRequest) -> Result<Value>;
}
