use thiserror::Error;

/// Error types for wishlist download and selection.
///
/// Every failure is fatal for the current invocation: nothing in this crate
/// retries, because the collection API gives no signal that would tell a
/// transient failure apart from a permanent one.
///
/// # Error Handling Examples
///
/// ```rust,no_run
/// use bandcamp_wishlist::{cookies, WishlistError};
///
/// match cookies::resolve("netscape", None) {
///     Ok(session) => println!("{} cookies loaded", session.len()),
///     Err(WishlistError::UnknownBrowser(name)) => eprintln!("unsupported browser {name}"),
///     Err(WishlistError::CookieLoad(msg)) => eprintln!("no cookies: {msg}"),
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum WishlistError {
    /// The requested browser has no cookie loader.
    #[error("Browser type [{0}] is unknown, can't pull cookies to authenticate with bandcamp")]
    UnknownBrowser(String),

    /// Neither a Mozilla cookie file nor the browser's own store could be read.
    #[error("Failed to load cookies: {0}")]
    CookieLoad(String),

    /// The profile page did not contain the embedded page data.
    ///
    /// Usually a wrong username, or the page layout changed.
    #[error("No pagedata found for user at url [{0}]")]
    ProfileDataNotFound(String),

    /// The collection API answered with an `error` field.
    #[error("Error from api request: {0}")]
    RemoteApi(String),

    /// A response was missing a field the pagination protocol depends on.
    ///
    /// This signals that the API changed shape underneath us.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Invalid filter configuration, detected before any record is examined.
    ///
    /// # Common Causes
    /// - A follow-based filter without a followed-bands file
    /// - A genre slug that is not in the taxonomy
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The filters eliminated every candidate.
    #[error("No items match the given filters")]
    EmptySelection,

    /// HTTP/network related errors, including non-success status codes.
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON (de)serialization of persisted collections.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File system I/O errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading a browser's SQLite cookie store failed.
    #[error("Cookie store error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
