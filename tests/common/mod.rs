#![allow(dead_code)]
use bandcamp_wishlist::{CollectionRecord, FollowRecord};
use serde_json::{json, Value};

/// Raw JSON of a wishlist item as the collection API returns it
pub fn wishlist_item(band_id: u64, item_type: &str, also_collected: u64, added: &str) -> Value {
    json!({
        "fan_id": 9,
        "item_id": 1000 + band_id,
        "item_type": item_type,
        "item_title": format!("Record {band_id}"),
        "item_url": format!("https://band{band_id}.bandcamp.com/{item_type}/record-{band_id}"),
        "band_id": band_id,
        "band_name": format!("Band {band_id}"),
        "added": added,
        "download_available": false,
        "is_purchasable": true,
        "also_collected_count": also_collected,
        "genre_id": 18,
        "price": 7.0,
        "currency": "EUR"
    })
}

pub fn record(band_id: u64, item_type: &str, also_collected: u64, added: &str) -> CollectionRecord {
    serde_json::from_value(wishlist_item(band_id, item_type, also_collected, added))
        .expect("wishlist item fixture should deserialize")
}

pub fn followed_band(band_id: u64, date_followed: &str) -> Value {
    json!({
        "band_id": band_id,
        "name": format!("Band {band_id}"),
        "date_followed": date_followed,
        "url_hints": {"subdomain": format!("band{band_id}")}
    })
}

pub fn follow(band_id: u64, date_followed: &str) -> FollowRecord {
    serde_json::from_value(followed_band(band_id, date_followed))
        .expect("followed band fixture should deserialize")
}

/// A profile page embedding `blob` the way Bandcamp does
pub fn profile_html(blob: &Value) -> String {
    let escaped = blob
        .to_string()
        .replace('&', "&amp;")
        .replace('"', "&quot;");
    format!(
        "<!DOCTYPE html><html><head><title>somefan | Bandcamp</title></head>\
         <body><div id=\"pagedata\" data-blob=\"{escaped}\"></div></body></html>"
    )
}

/// Page data of a fan with `wishlist_count` wishlist items and a first batch
/// of followed bands
pub fn profile_blob(fan_id: u64, wishlist_count: u64, bands: &[Value], bands_total: u64) -> Value {
    let sequence: Vec<String> = bands
        .iter()
        .map(|b| b["band_id"].to_string())
        .collect();
    let cache: serde_json::Map<String, Value> = bands
        .iter()
        .map(|b| (b["band_id"].to_string(), b.clone()))
        .collect();

    json!({
        "fan_data": {"fan_id": fan_id, "name": "Some Fan"},
        "wishlist_data": {"item_count": wishlist_count},
        "following_bands_data": {
            "pending_sequence": sequence,
            "last_token": "1680000000:1",
            "item_count": bands_total
        },
        "item_cache": {"following_bands": cache}
    })
}

/// One response of the collection API
pub fn page(result_key: &str, items: Vec<Value>, last_token: &str, more_available: bool) -> Value {
    let mut response = json!({
        "last_token": last_token,
        "more_available": more_available
    });
    response[result_key] = Value::Array(items);
    response
}
