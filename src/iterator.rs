use crate::r#trait::CollectionApi;
use crate::types::{CollectionSource, PageRequest, PaginationToken};
use crate::{Result, WishlistError};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// One decoded response of the collection API.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionPage<T> {
    pub items: Vec<T>,
    /// Token to send with the next request
    pub last_token: PaginationToken,
    pub more_available: bool,
}

impl<T: DeserializeOwned> CollectionPage<T> {
    /// Decode a raw response, taking the items from `result_key`.
    ///
    /// An `error` field wins over everything else in the response: the page is
    /// rejected without looking at its items.
    pub fn from_response(mut response: Value, result_key: &str) -> Result<Self> {
        if let Some(error) = response.get("error") {
            let message = response
                .get("error_message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(WishlistError::RemoteApi(message));
        }

        let items = match response.get_mut(result_key).map(Value::take) {
            Some(items @ Value::Array(_)) => serde_json::from_value(items).map_err(|e| {
                WishlistError::ProtocolViolation(format!("items under '{result_key}': {e}"))
            })?,
            Some(_) => {
                return Err(WishlistError::ProtocolViolation(format!(
                    "'{result_key}' in response is not a list"
                )))
            }
            None => {
                return Err(WishlistError::ProtocolViolation(format!(
                    "No '{result_key}' found in response"
                )))
            }
        };

        let last_token = response
            .get("last_token")
            .and_then(Value::as_str)
            .map(PaginationToken::new)
            .ok_or_else(|| {
                WishlistError::ProtocolViolation("No 'last_token' found in response".to_string())
            })?;

        let more_available = response
            .get("more_available")
            .and_then(Value::as_bool)
            .ok_or_else(|| {
                WishlistError::ProtocolViolation(
                    "No 'more_available' found in response".to_string(),
                )
            })?;

        Ok(Self {
            items,
            last_token,
            more_available,
        })
    }
}

/// Walks a collection page by page along the server's token chain.
///
/// Requests are strictly sequential: every request carries the token returned
/// by the previous response. A pre-hydrated first batch, if the source has
/// one, is yielded as the first page without a request.
///
/// # Examples
///
/// ```rust,no_run
/// # use bandcamp_wishlist::{BandcampClient, CollectionPager, SessionContext};
/// # tokio_test::block_on(async {
/// let client = BandcampClient::new(
///     Box::new(http_client::native::NativeClient::new()),
///     SessionContext::default(),
/// );
/// let profile = client.fetch_profile("somefan").await?;
/// let source = client.wishlist_source::<serde_json::Value>(&profile)?;
///
/// let mut pager = CollectionPager::new(&client, source);
/// while let Some(page) = pager.next_page().await? {
///     println!("got {} items, {} so far", page.len(), pager.items_fetched());
/// }
/// # Ok::<(), bandcamp_wishlist::WishlistError>(())
/// # });
/// ```
pub struct CollectionPager<'a, C: CollectionApi + ?Sized, T> {
    api: &'a C,
    endpoint: String,
    result_key: String,
    fan_id: u64,
    target_count: u64,
    token: PaginationToken,
    initial_items: Option<Vec<T>>,
    more_available: bool,
    items_fetched: u64,
    requests_made: u32,
    expected_total: Option<u64>,
    overflow_reported: bool,
}

impl<'a, C: CollectionApi + ?Sized, T: DeserializeOwned> CollectionPager<'a, C, T> {
    pub fn new(api: &'a C, source: CollectionSource<T>) -> Self {
        let initial_items = Some(source.initial_items).filter(|items| !items.is_empty());
        Self {
            api,
            endpoint: source.endpoint,
            result_key: source.result_key,
            fan_id: source.fan_id,
            target_count: source.target_count,
            token: source.initial_token,
            initial_items,
            more_available: true,
            items_fetched: 0,
            requests_made: 0,
            expected_total: source.expected_total,
            overflow_reported: false,
        }
    }

    /// Fetch the next page of items.
    ///
    /// Returns `None` once a response said no more items are available; no
    /// further request is made after that.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        if let Some(initial) = self.initial_items.take() {
            self.record_items(initial.len());
            log::debug!(
                "using {} pre-hydrated items, continuing from token '{}'",
                initial.len(),
                self.token
            );
            return Ok(Some(initial));
        }

        if !self.more_available {
            return Ok(None);
        }

        let request = PageRequest {
            fan_id: self.fan_id,
            count: self.target_count,
            older_than_token: self.token.clone(),
        };
        let response = self.api.collection_page(&self.endpoint, &request).await?;
        self.requests_made += 1;

        let page = CollectionPage::<T>::from_response(response, &self.result_key)?;

        if page.more_available && page.last_token == self.token {
            return Err(WishlistError::ProtocolViolation(format!(
                "server returned the same token '{}' while claiming more items are available",
                self.token
            )));
        }

        self.record_items(page.items.len());
        self.token = page.last_token;
        self.more_available = page.more_available;

        log::debug!(
            "got batch of {} items. total: {}. last token: '{}'. more available? {}",
            page.items.len(),
            self.items_fetched,
            self.token,
            self.more_available
        );

        Ok(Some(page.items))
    }

    /// Fetch every remaining page and concatenate them in arrival order.
    pub async fn collect_all(&mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page);
        }

        if let Some(total) = self.expected_total {
            if self.items_fetched < total {
                log::debug!(
                    "collection ended with {} of {} reported items",
                    self.items_fetched,
                    total
                );
            }
        }
        Ok(items)
    }

    fn record_items(&mut self, count: usize) {
        self.items_fetched += count as u64;
        if let Some(total) = self.expected_total {
            if self.items_fetched > total && !self.overflow_reported {
                self.overflow_reported = true;
                log::warn!(
                    "fetched {} items but the server reported only {}; the collection API may have changed",
                    self.items_fetched,
                    total
                );
            }
        }
    }

    /// Items yielded so far, pre-hydrated ones included.
    pub fn items_fetched(&self) -> u64 {
        self.items_fetched
    }

    /// Requests sent to the server so far.
    pub fn requests_made(&self) -> u32 {
        self.requests_made
    }

    /// Token the next request would carry.
    pub fn current_token(&self) -> &PaginationToken {
        &self.token
    }

    pub fn expected_total(&self) -> Option<u64> {
        self.expected_total
    }
}

/// Download a whole collection described by `source`.
pub async fn fetch_collection<C, T>(api: &C, source: CollectionSource<T>) -> Result<Vec<T>>
where
    C: CollectionApi + ?Sized,
    T: DeserializeOwned,
{
    CollectionPager::new(api, source).collect_all().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned responses and records every request.
    struct ScriptedApi {
        responses: RefCell<VecDeque<Value>>,
        requests: RefCell<Vec<(String, PageRequest)>>,
    }

    impl ScriptedApi {
        fn new(responses: Vec<Value>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    #[async_trait(?Send)]
    impl CollectionApi for ScriptedApi {
        async fn fetch_page(&self, _url: &str) -> Result<String> {
            unreachable!("pagination never loads pages")
        }

        async fn collection_page(&self, endpoint: &str, request: &PageRequest) -> Result<Value> {
            self.requests
                .borrow_mut()
                .push((endpoint.to_string(), request.clone()));
            Ok(self
                .responses
                .borrow_mut()
                .pop_front()
                .expect("request issued after the script ended"))
        }
    }

    fn page(key: &str, items: Vec<u64>, token: &str, more: bool) -> Value {
        let mut response = json!({ "last_token": token, "more_available": more });
        response[key] = json!(items);
        response
    }

    fn wishlist(target_count: u64) -> CollectionSource<u64> {
        CollectionSource::new(
            "https://bandcamp.test/api/fancollection/1/wishlist_items",
            "items",
            99,
            target_count,
            PaginationToken::new("100::a::"),
        )
    }

    #[test_log::test(tokio::test)]
    async fn test_pages_are_concatenated_in_arrival_order() {
        let api = ScriptedApi::new(vec![
            page("items", vec![1, 2, 3], "t1", true),
            page("items", vec![4], "t2", true),
            page("items", vec![5, 6], "t3", false),
        ]);

        let items = fetch_collection(&api, wishlist(3)).await.unwrap();
        assert_eq!(items, vec![1, 2, 3, 4, 5, 6]);

        let requests = api.requests.borrow();
        let tokens: Vec<_> = requests
            .iter()
            .map(|(_, r)| r.older_than_token.as_str().to_string())
            .collect();
        assert_eq!(tokens, vec!["100::a::", "t1", "t2"]);
        assert!(requests.iter().all(|(_, r)| r.fan_id == 99 && r.count == 3));
        assert!(requests
            .iter()
            .all(|(endpoint, _)| endpoint.ends_with("/wishlist_items")));
    }

    #[test_log::test(tokio::test)]
    async fn test_no_request_after_more_available_is_false() {
        let api = ScriptedApi::new(vec![page("items", vec![1], "t1", false)]);
        let mut pager = CollectionPager::new(&api, wishlist(20));

        assert_eq!(pager.next_page().await.unwrap(), Some(vec![1]));
        assert_eq!(pager.next_page().await.unwrap(), None);
        assert_eq!(pager.next_page().await.unwrap(), None);
        assert_eq!(pager.requests_made(), 1);
        assert_eq!(api.requests.borrow().len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_error_field_fails_immediately() {
        let api = ScriptedApi::new(vec![
            page("items", vec![1, 2], "t1", true),
            json!({"error": true, "error_message": "bad fan", "items": [3], "more_available": true}),
            page("items", vec![4], "t3", false),
        ]);

        match fetch_collection(&api, wishlist(2)).await {
            Err(WishlistError::RemoteApi(msg)) => assert_eq!(msg, "bad fan"),
            other => panic!("Expected remote api error, got: {other:?}"),
        }
        assert_eq!(api.requests.borrow().len(), 2);
    }

    #[test_log::test(tokio::test)]
    async fn test_error_without_message() {
        let api = ScriptedApi::new(vec![json!({"error": true})]);
        match fetch_collection(&api, wishlist(2)).await {
            Err(WishlistError::RemoteApi(msg)) => assert_eq!(msg, "true"),
            other => panic!("Expected remote api error, got: {other:?}"),
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_missing_result_key_is_protocol_violation() {
        let api = ScriptedApi::new(vec![page("followeers", vec![1], "t1", false)]);
        assert!(matches!(
            fetch_collection(&api, wishlist(2)).await,
            Err(WishlistError::ProtocolViolation(_))
        ));
    }

    #[test_log::test(tokio::test)]
    async fn test_missing_continuation_fields_are_protocol_violations() {
        let api = ScriptedApi::new(vec![json!({"items": [1], "more_available": true})]);
        assert!(matches!(
            fetch_collection(&api, wishlist(2)).await,
            Err(WishlistError::ProtocolViolation(_))
        ));

        let api = ScriptedApi::new(vec![json!({"items": [1], "last_token": "t1"})]);
        assert!(matches!(
            fetch_collection(&api, wishlist(2)).await,
            Err(WishlistError::ProtocolViolation(_))
        ));
    }

    #[test_log::test(tokio::test)]
    async fn test_stalled_token_is_protocol_violation() {
        let api = ScriptedApi::new(vec![page("items", vec![], "100::a::", true)]);
        assert!(matches!(
            fetch_collection(&api, wishlist(2)).await,
            Err(WishlistError::ProtocolViolation(_))
        ));
    }

    #[test_log::test(tokio::test)]
    async fn test_prehydrated_batch_is_prepended() {
        let api = ScriptedApi::new(vec![
            page("followeers", vec![3, 4], "f2", true),
            page("followeers", vec![5], "f3", false),
        ]);
        let source = CollectionSource::new(
            "https://bandcamp.test/api/fancollection/1/following_bands",
            "followeers",
            99,
            3,
            PaginationToken::new("f1"),
        )
        .with_initial_items(vec![1, 2])
        .with_expected_total(5);

        let mut pager = CollectionPager::new(&api, source);
        let items = pager.collect_all().await.unwrap();

        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(pager.items_fetched(), 5);
        assert_eq!(pager.requests_made(), 2);
        assert_eq!(
            api.requests.borrow()[0].1.older_than_token,
            PaginationToken::new("f1")
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_more_items_than_reported_is_not_fatal() {
        let api = ScriptedApi::new(vec![
            page("items", vec![1, 2], "t1", true),
            page("items", vec![3, 4], "t2", false),
        ]);

        let items = fetch_collection(&api, wishlist(2).with_expected_total(3))
            .await
            .unwrap();
        assert_eq!(items.len(), 4);
    }

    #[test]
    fn test_page_decoding_keeps_item_order() {
        let page: CollectionPage<Value> = CollectionPage::from_response(
            json!({"items": [{"a": 1}, {"b": 2}], "last_token": "x", "more_available": false}),
            "items",
        )
        .unwrap();
        assert_eq!(page.items, vec![json!({"a": 1}), json!({"b": 2})]);
        assert!(!page.more_available);
    }
}
