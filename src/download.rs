//! Downloading the wishlist and the followed-bands list of a fan.
//!
//! Both collections go through the same pager; they differ in endpoint, in
//! the response key holding the items, and in the followed bands shipping a
//! first batch inside the profile page.

use crate::iterator::fetch_collection;
use crate::profile::ProfileData;
use crate::r#trait::CollectionApi;
use crate::types::{CollectionSource, PaginationToken};
use crate::Result;
use serde::de::DeserializeOwned;

/// Default Bandcamp site.
pub const DEFAULT_BASE_URL: &str = "https://bandcamp.com";

const WISHLIST_PATH: &str = "/api/fancollection/1/wishlist_items";
const FOLLOWING_BANDS_PATH: &str = "/api/fancollection/1/following_bands";

/// Response key holding wishlist items.
pub const WISHLIST_RESULT_KEY: &str = "items";
/// Response key holding followed bands (the server's spelling).
pub const FOLLOWING_BANDS_RESULT_KEY: &str = "followeers";

/// URLs of the pages and endpoints used for a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Endpoints {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn profile_url(&self, username: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(username))
    }

    pub fn wishlist(&self) -> String {
        format!("{}{WISHLIST_PATH}", self.base_url)
    }

    pub fn following_bands(&self) -> String {
        format!("{}{FOLLOWING_BANDS_PATH}", self.base_url)
    }
}

/// Load and decode the page data of `username`'s profile page.
pub async fn fetch_profile<C: CollectionApi + ?Sized>(
    api: &C,
    endpoints: &Endpoints,
    username: &str,
) -> Result<ProfileData> {
    let url = endpoints.profile_url(username);
    log::debug!("Loading profile page {url}");
    let html = api.fetch_page(&url).await?;
    ProfileData::from_html(&html, &url)
}

/// Describe the wishlist of the fan in `profile`.
///
/// The whole reported item count is requested as the page size, starting
/// from `initial_token`.
pub fn wishlist_source<T>(
    endpoints: &Endpoints,
    profile: &ProfileData,
    initial_token: PaginationToken,
) -> Result<CollectionSource<T>> {
    let item_count = profile.wishlist_count()?;
    Ok(CollectionSource::new(
        endpoints.wishlist(),
        WISHLIST_RESULT_KEY,
        profile.fan_id()?,
        item_count,
        initial_token,
    )
    .with_expected_total(item_count))
}

/// Describe the followed bands of the fan in `profile`.
///
/// Pagination resumes after the batch embedded in the profile page, asking
/// for the remaining count.
pub fn followed_bands_source<T: DeserializeOwned>(
    endpoints: &Endpoints,
    profile: &ProfileData,
) -> Result<CollectionSource<T>> {
    let initial = profile.initial_followed_bands::<T>()?;
    let remaining = initial.remaining();
    Ok(CollectionSource::new(
        endpoints.following_bands(),
        FOLLOWING_BANDS_RESULT_KEY,
        profile.fan_id()?,
        remaining,
        PaginationToken::new(initial.last_token),
    )
    .with_initial_items(initial.items)
    .with_expected_total(initial.item_count))
}

/// Download the complete wishlist of `username`.
pub async fn download_wishlist<C, T>(api: &C, endpoints: &Endpoints, username: &str) -> Result<Vec<T>>
where
    C: CollectionApi + ?Sized,
    T: DeserializeOwned,
{
    let profile = fetch_profile(api, endpoints, username).await?;
    let source = wishlist_source(endpoints, &profile, PaginationToken::starting_now())?;
    log::info!("getting {} wishlist items...", source.target_count);
    fetch_collection(api, source).await
}

/// Download the complete followed-bands list of `username`.
pub async fn download_followed_bands<C, T>(
    api: &C,
    endpoints: &Endpoints,
    username: &str,
) -> Result<Vec<T>>
where
    C: CollectionApi + ?Sized,
    T: DeserializeOwned,
{
    let profile = fetch_profile(api, endpoints, username).await?;
    let source = followed_bands_source(endpoints, &profile)?;
    log::info!(
        "getting {} followed bands ({} already on the profile page)...",
        source.expected_total.unwrap_or_default(),
        source.initial_items.len()
    );
    fetch_collection(api, source).await
}
