use crate::download::{self, Endpoints, DEFAULT_BASE_URL};
use crate::headers;
use crate::profile::ProfileData;
use crate::r#trait::CollectionApi;
use crate::session::SessionContext;
use crate::types::{CollectionSource, PageRequest, PaginationToken};
use crate::{Result, WishlistError};
use async_trait::async_trait;
use http_client::{HttpClient, Request, Response};
use http_types::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Client for a fan's collections on Bandcamp.
///
/// Every request carries the cookies of the [`SessionContext`] it was built
/// with; nothing is stored between runs.
///
/// # Examples
///
/// ```rust,no_run
/// use bandcamp_wishlist::{cookies, BandcampClient, CollectionRecord, Result};
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     let session = cookies::resolve("firefox", None)?;
///     let http_client = http_client::native::NativeClient::new();
///     let client = BandcampClient::new(Box::new(http_client), session);
///
///     let wishlist: Vec<CollectionRecord> = client.download_wishlist("somefan").await?;
///     println!("{} items", wishlist.len());
///     Ok(())
/// }
/// ```
pub struct BandcampClient {
    client: Box<dyn HttpClient>,
    endpoints: Endpoints,
    session: SessionContext,
    debug_save_responses: bool,
}

impl BandcampClient {
    /// Create a client for `https://bandcamp.com`, or for the site named by
    /// `BANDCAMP_BASE_URL` when it is set.
    pub fn new(client: Box<dyn HttpClient>, session: SessionContext) -> Self {
        let base_url =
            std::env::var("BANDCAMP_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(client, session, base_url)
    }

    /// Create a client for a custom base URL, e.g. a local test server.
    pub fn with_base_url(
        client: Box<dyn HttpClient>,
        session: SessionContext,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoints: Endpoints::new(base_url),
            session,
            debug_save_responses: std::env::var("BANDCAMP_DEBUG_SAVE_RESPONSES").is_ok(),
        }
    }

    pub fn base_url(&self) -> &str {
        self.endpoints.base_url()
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Load the page data of `username`'s profile page.
    pub async fn fetch_profile(&self, username: &str) -> Result<ProfileData> {
        download::fetch_profile(self, &self.endpoints, username).await
    }

    /// Describe the wishlist of the fan in `profile`, newest items first.
    pub fn wishlist_source<T>(&self, profile: &ProfileData) -> Result<CollectionSource<T>> {
        download::wishlist_source(&self.endpoints, profile, PaginationToken::starting_now())
    }

    /// Describe the followed bands of the fan in `profile`.
    pub fn followed_bands_source<T: DeserializeOwned>(
        &self,
        profile: &ProfileData,
    ) -> Result<CollectionSource<T>> {
        download::followed_bands_source(&self.endpoints, profile)
    }

    /// Download the complete wishlist of `username`.
    pub async fn download_wishlist<T: DeserializeOwned>(&self, username: &str) -> Result<Vec<T>> {
        download::download_wishlist(self, &self.endpoints, username).await
    }

    /// Download every band `username` follows.
    pub async fn download_followed_bands<T: DeserializeOwned>(
        &self,
        username: &str,
    ) -> Result<Vec<T>> {
        download::download_followed_bands(self, &self.endpoints, username).await
    }

    fn parse_url(url: &str) -> Result<Url> {
        url.parse::<Url>()
            .map_err(|e| WishlistError::Http(format!("Invalid URL '{url}': {e}")))
    }

    async fn get_with_redirects(&self, url: &str, redirect_count: u32) -> Result<Response> {
        if redirect_count > 5 {
            return Err(WishlistError::Http("Too many redirects".to_string()));
        }

        let mut request = Request::new(Method::Get, Self::parse_url(url)?);
        headers::add_page_headers(&mut request);
        headers::add_cookies(&mut request, &self.session);

        let response = self
            .client
            .send(request)
            .await
            .map_err(|e| WishlistError::Http(e.to_string()))?;

        // Redirects are followed by hand so the cookies go along
        if response.status() == 302 || response.status() == 301 {
            if let Some(location) = response.header("location") {
                if let Some(redirect_url) = location.get(0) {
                    let redirect_url = redirect_url.as_str();
                    log::debug!("Following redirect from {url} to {redirect_url}");

                    let full_redirect_url = if redirect_url.starts_with('/') {
                        format!("{}{redirect_url}", self.endpoints.base_url())
                    } else {
                        redirect_url.to_string()
                    };

                    return Box::pin(
                        self.get_with_redirects(&full_redirect_url, redirect_count + 1),
                    )
                    .await;
                }
            }
        }

        Ok(response)
    }

    /// Read the body and reject non-2xx responses.
    async fn extract_response_body(&self, url: &str, response: &mut Response) -> Result<String> {
        let body = response
            .body_string()
            .await
            .map_err(|e| WishlistError::Http(e.to_string()))?;

        if self.debug_save_responses {
            self.save_debug_response(url, response.status().into(), &body);
        }

        if !response.status().is_success() {
            return Err(WishlistError::Http(format!(
                "{url} returned status {}",
                response.status()
            )));
        }

        Ok(body)
    }

    fn save_debug_response(&self, url: &str, status_code: u16, body: &str) {
        if let Err(e) = self.try_save_debug_response(url, status_code, body) {
            log::warn!("Failed to save debug response: {e}");
        }
    }

    fn try_save_debug_response(&self, url: &str, status_code: u16, body: &str) -> Result<()> {
        let debug_dir = Path::new("debug_responses");
        fs::create_dir_all(debug_dir)?;

        let url_path = url
            .strip_prefix(self.endpoints.base_url())
            .unwrap_or(url);

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S_%3f");
        let safe_path = url_path.replace(['/', '?', '&', '=', '%', '+', ':'], "_");
        let file_path = debug_dir.join(format!("{timestamp}_{safe_path}_status{status_code}.txt"));

        fs::write(&file_path, body)?;
        log::debug!("Saved HTTP response to {file_path:?} (status: {status_code}, url: {url_path})");

        Ok(())
    }
}

#[async_trait(?Send)]
impl CollectionApi for BandcampClient {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let mut response = self.get_with_redirects(url, 0).await?;
        self.extract_response_body(url, &mut response).await
    }

    async fn collection_page(&self, endpoint: &str, request: &PageRequest) -> Result<Value> {
        let body = serde_json::to_string(request)?;

        let mut http_request = Request::new(Method::Post, Self::parse_url(endpoint)?);
        headers::add_api_headers(
            &mut http_request,
            self.endpoints.base_url(),
            self.endpoints.base_url(),
        );
        headers::add_cookies(&mut http_request, &self.session);
        http_request.set_body(body);

        log::debug!(
            "POST {endpoint} (fan_id={}, count={}, older_than_token={})",
            request.fan_id,
            request.count,
            request.older_than_token
        );

        let mut response = self
            .client
            .send(http_request)
            .await
            .map_err(|e| WishlistError::Http(e.to_string()))?;
        let body = self.extract_response_body(endpoint, &mut response).await?;

        serde_json::from_str(&body).map_err(|e| {
            WishlistError::ProtocolViolation(format!("response from {endpoint} is not JSON: {e}"))
        })
    }
}
