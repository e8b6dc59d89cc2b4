//! Data types for Bandcamp fan collections.
//!
//! This module contains the records stored in downloaded collection files,
//! the pagination token and request body of the fan-collection API, and the
//! description of a collection to page through.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ================================================================================================
// COLLECTION RECORDS
// ================================================================================================

/// Kind of item saved in a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Album,
    Track,
    Other,
}

impl From<&str> for ItemType {
    fn from(value: &str) -> Self {
        match value {
            "album" => ItemType::Album,
            "track" => ItemType::Track,
            _ => ItemType::Other,
        }
    }
}

/// One item of a fan's wishlist, as returned by the collection API.
///
/// Only the fields used by the selection filters are typed. Everything else
/// the server sends is kept in [`extra`](Self::extra), so a collection can be
/// loaded and written back without losing data.
///
/// # Examples
///
/// ```rust
/// use bandcamp_wishlist::{CollectionRecord, ItemType};
///
/// let record: CollectionRecord = serde_json::from_str(r#"{
///     "item_type": "album",
///     "item_title": "Pink Moon",
///     "item_url": "https://example.bandcamp.com/album/pink-moon",
///     "band_id": 42,
///     "band_name": "Nick Drake",
///     "added": "21 Jan 2023 17:02:13 GMT",
///     "download_available": true,
///     "is_purchasable": true,
///     "also_collected_count": 12,
///     "genre_id": 12,
///     "tralbum_id": 555
/// }"#).unwrap();
///
/// assert_eq!(record.item_type(), ItemType::Album);
/// assert_eq!(record.extra["tralbum_id"], 555);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRecord {
    /// Raw item type string (`album`, `track`, ...)
    pub item_type: String,
    pub item_title: String,
    pub item_url: String,
    /// Joins against [`FollowRecord::band_id`]
    pub band_id: u64,
    pub band_name: String,
    /// When the item was saved, in the server's date format
    pub added: String,
    #[serde(default)]
    pub download_available: Option<bool>,
    #[serde(default)]
    pub is_purchasable: Option<bool>,
    /// How many other fans also collected this item
    #[serde(default)]
    pub also_collected_count: u64,
    #[serde(default)]
    pub genre_id: Option<u64>,
    /// All remaining fields, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CollectionRecord {
    /// Classified [`ItemType`] of this record.
    pub fn item_type(&self) -> ItemType {
        ItemType::from(self.item_type.as_str())
    }

    pub fn is_download_available(&self) -> bool {
        self.download_available == Some(true)
    }

    pub fn is_purchasable(&self) -> bool {
        self.is_purchasable == Some(true)
    }
}

impl fmt::Display for CollectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}': {}", self.band_name, self.item_title, self.item_url)
    }
}

/// One followed artist, from the followed-bands collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowRecord {
    pub band_id: u64,
    /// When the fan followed the band, in the server's date format
    pub date_followed: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ================================================================================================
// PAGINATION PROTOCOL
// ================================================================================================

/// Opaque cursor of the collection API.
///
/// The server hands out a new token with every page and expects the latest
/// one back verbatim as `older_than_token`. Nothing is assumed about its
/// contents beyond that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaginationToken(String);

impl PaginationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Token that starts a walk from "now" backwards.
    pub fn starting_now() -> Self {
        let now = Utc::now().timestamp().max(0) as u64;
        Self::starting_at(now)
    }

    /// Token that starts a walk from the given unix time backwards.
    pub fn starting_at(unix_seconds: u64) -> Self {
        Self(format!("{unix_seconds}::a::"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaginationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of one collection API request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// The fan whose collection is paged
    pub fan_id: u64,
    /// Page size hint; the server may return more or fewer items
    pub count: u64,
    pub older_than_token: PaginationToken,
}

/// Everything needed to page through one collection.
///
/// The wishlist and the followed-bands list share the same protocol and only
/// differ in endpoint, in the response key holding the items, and in whether
/// a first batch already came embedded in the profile page.
#[derive(Debug, Clone)]
pub struct CollectionSource<T> {
    /// Absolute URL of the collection endpoint
    pub endpoint: String,
    /// Response field holding the page's items
    pub result_key: String,
    pub fan_id: u64,
    /// Page size hint sent with every request
    pub target_count: u64,
    pub initial_token: PaginationToken,
    /// Items already known before the first request, prepended to the result
    pub initial_items: Vec<T>,
    /// Total item count reported by the server, if known
    pub expected_total: Option<u64>,
}

impl<T> CollectionSource<T> {
    /// A collection paged from scratch.
    pub fn new(
        endpoint: impl Into<String>,
        result_key: impl Into<String>,
        fan_id: u64,
        target_count: u64,
        initial_token: PaginationToken,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            result_key: result_key.into(),
            fan_id,
            target_count,
            initial_token,
            initial_items: Vec::new(),
            expected_total: None,
        }
    }

    /// Continue a collection whose first batch is already hydrated.
    pub fn with_initial_items(mut self, items: Vec<T>) -> Self {
        self.initial_items = items;
        self
    }

    pub fn with_expected_total(mut self, total: u64) -> Self {
        self.expected_total = Some(total);
        self
    }
}
