use serde::{Deserialize, Serialize};

/// Domain all authenticated requests go to.
pub const BANDCAMP_DOMAIN: &str = "bandcamp.com";

/// A single browser cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Domain as stored by the browser, possibly with a leading dot
    pub domain: String,
    pub name: String,
    pub value: String,
    pub path: String,
    pub secure: bool,
    /// Unix expiry time; `None` for session cookies
    pub expires: Option<i64>,
}

impl Cookie {
    /// Check whether the cookie is sent to `host` (same domain or a subdomain).
    pub fn matches_domain(&self, host: &str) -> bool {
        let domain = self.domain.trim_start_matches('.');
        host == domain || host.ends_with(&format!(".{domain}"))
    }

    pub fn is_expired(&self, now: i64) -> bool {
        matches!(self.expires, Some(expiry) if expiry > 0 && expiry < now)
    }
}

/// Browser session used to authenticate against Bandcamp.
///
/// This carries the visitor's cookies, as lifted from a browser profile or
/// an exported cookie file, and renders them into a `Cookie` header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    cookies: Vec<Cookie>,
}

impl SessionContext {
    pub fn new(cookies: Vec<Cookie>) -> Self {
        Self { cookies }
    }

    /// Keep only live cookies that would be sent to `host`.
    pub fn for_host(self, host: &str, now: i64) -> Self {
        Self {
            cookies: self
                .cookies
                .into_iter()
                .filter(|c| c.matches_domain(host) && !c.is_expired(now))
                .collect(),
        }
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Value for a `Cookie` request header, `None` without cookies.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
