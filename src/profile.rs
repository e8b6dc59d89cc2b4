//! Parsing of the embedded page data on a fan's profile page.
//!
//! Bandcamp renders the fan page with a `<div id="pagedata" data-blob="...">`
//! whose attribute holds an HTML-escaped JSON document. It carries the fan id
//! needed by the collection API, the wishlist size, and the first batch of
//! followed bands.

use crate::{Result, WishlistError};
use scraper::{Html, Selector};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decoded page data of a fan's profile page.
#[derive(Debug, Clone)]
pub struct ProfileData {
    blob: Value,
}

/// First batch of a collection shipped inside the page data.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialBatch<T> {
    pub items: Vec<T>,
    /// Token to continue pagination from
    pub last_token: String,
    /// Total item count reported for the whole collection
    pub item_count: u64,
}

impl<T> InitialBatch<T> {
    /// Items still to be fetched after this batch.
    pub fn remaining(&self) -> u64 {
        self.item_count.saturating_sub(self.items.len() as u64)
    }
}

impl ProfileData {
    /// Extract the page data from a profile page's HTML.
    ///
    /// `url` is only used in the error when the container is missing.
    pub fn from_html(html: &str, url: &str) -> Result<Self> {
        let document = Html::parse_document(html);
        let selector = Selector::parse("div#pagedata").unwrap();

        let blob = document
            .select(&selector)
            .next()
            .and_then(|div| div.value().attr("data-blob"))
            .ok_or_else(|| WishlistError::ProfileDataNotFound(url.to_string()))?;

        let blob: Value = serde_json::from_str(blob).map_err(|e| {
            WishlistError::ProtocolViolation(format!("pagedata blob is not valid JSON: {e}"))
        })?;
        log::debug!("Parsed pagedata blob from {url}");

        Ok(Self { blob })
    }

    pub fn from_value(blob: Value) -> Self {
        Self { blob }
    }

    /// The raw decoded document.
    pub fn raw(&self) -> &Value {
        &self.blob
    }

    fn field(&self, pointer: &str) -> Result<&Value> {
        self.blob.pointer(pointer).ok_or_else(|| {
            WishlistError::ProtocolViolation(format!("pagedata has no '{pointer}'"))
        })
    }

    fn u64_field(&self, pointer: &str) -> Result<u64> {
        self.field(pointer)?.as_u64().ok_or_else(|| {
            WishlistError::ProtocolViolation(format!("pagedata '{pointer}' is not an integer"))
        })
    }

    /// The fan id the collection API is keyed by.
    pub fn fan_id(&self) -> Result<u64> {
        self.u64_field("/fan_data/fan_id")
    }

    /// Number of items the server reports in the wishlist.
    pub fn wishlist_count(&self) -> Result<u64> {
        self.u64_field("/wishlist_data/item_count")
    }

    /// The first batch of followed bands, hydrated from the item cache.
    ///
    /// `following_bands_data.pending_sequence` lists keys into
    /// `item_cache.following_bands`, in display order.
    pub fn initial_followed_bands<T: DeserializeOwned>(&self) -> Result<InitialBatch<T>> {
        let sequence = self
            .field("/following_bands_data/pending_sequence")?
            .as_array()
            .ok_or_else(|| {
                WishlistError::ProtocolViolation(
                    "following_bands_data.pending_sequence is not a list".to_string(),
                )
            })?;
        let cache = self.field("/item_cache/following_bands")?;

        let mut items = Vec::with_capacity(sequence.len());
        for key in sequence {
            let key = match key {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let entry = cache.get(&key).ok_or_else(|| {
                WishlistError::ProtocolViolation(format!(
                    "followed band '{key}' missing from item_cache"
                ))
            })?;
            let item = serde_json::from_value(entry.clone()).map_err(|e| {
                WishlistError::ProtocolViolation(format!("followed band '{key}': {e}"))
            })?;
            items.push(item);
        }

        let last_token = self
            .field("/following_bands_data/last_token")?
            .as_str()
            .ok_or_else(|| {
                WishlistError::ProtocolViolation(
                    "following_bands_data.last_token is not a string".to_string(),
                )
            })?
            .to_string();
        let item_count = self.u64_field("/following_bands_data/item_count")?;

        Ok(InitialBatch {
            items,
            last_token,
            item_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FollowRecord;

    const PROFILE_HTML: &str = r#"<!DOCTYPE html>
<html><head><title>somefan | Bandcamp</title></head>
<body>
<div id="pagedata" data-blob="{&quot;fan_data&quot;:{&quot;fan_id&quot;:4242,&quot;name&quot;:&quot;Some &amp; Fan&quot;},
&quot;wishlist_data&quot;:{&quot;item_count&quot;:57},
&quot;following_bands_data&quot;:{&quot;pending_sequence&quot;:[&quot;77&quot;,&quot;12&quot;],&quot;last_token&quot;:&quot;1690000000:12&quot;,&quot;item_count&quot;:5},
&quot;item_cache&quot;:{&quot;following_bands&quot;:{
&quot;12&quot;:{&quot;band_id&quot;:12,&quot;date_followed&quot;:&quot;01 Mar 2023 10:00:00 GMT&quot;,&quot;name&quot;:&quot;B&quot;},
&quot;77&quot;:{&quot;band_id&quot;:77,&quot;date_followed&quot;:&quot;02 Mar 2023 10:00:00 GMT&quot;,&quot;name&quot;:&quot;A&quot;}}}}"></div>
</body></html>"#;

    #[test]
    fn test_parse_profile_blob() {
        let profile = ProfileData::from_html(PROFILE_HTML, "https://bandcamp.com/somefan").unwrap();
        assert_eq!(profile.fan_id().unwrap(), 4242);
        assert_eq!(profile.wishlist_count().unwrap(), 57);
        assert_eq!(profile.raw()["fan_data"]["name"], "Some & Fan");
    }

    #[test]
    fn test_initial_followed_bands_in_sequence_order() {
        let profile = ProfileData::from_html(PROFILE_HTML, "https://bandcamp.com/somefan").unwrap();
        let batch: InitialBatch<FollowRecord> = profile.initial_followed_bands().unwrap();

        let ids: Vec<_> = batch.items.iter().map(|b| b.band_id).collect();
        assert_eq!(ids, vec![77, 12]);
        assert_eq!(batch.last_token, "1690000000:12");
        assert_eq!(batch.remaining(), 3);
    }

    #[test]
    fn test_missing_pagedata() {
        let result = ProfileData::from_html(
            "<html><body><div id=\"other\"></div></body></html>",
            "https://bandcamp.com/nobody",
        );
        match result {
            Err(WishlistError::ProfileDataNotFound(url)) => {
                assert_eq!(url, "https://bandcamp.com/nobody")
            }
            other => panic!("Expected missing pagedata error, got: {other:?}"),
        }
    }

    #[test]
    fn test_missing_fields_are_protocol_violations() {
        let profile = ProfileData::from_value(serde_json::json!({"fan_data": {}}));
        assert!(matches!(profile.fan_id(), Err(WishlistError::ProtocolViolation(_))));
        assert!(matches!(
            profile.initial_followed_bands::<Value>(),
            Err(WishlistError::ProtocolViolation(_))
        ));
    }
}
