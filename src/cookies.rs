//! Loading Bandcamp session cookies from a browser or an exported cookie file.
//!
//! A cookie path is first read as a Mozilla `cookies.txt` file. If it is not
//! one, it is handed to the named browser's own store reader instead. Without
//! a path the browser's default profile is used.

use crate::session::{Cookie, SessionContext, BANDCAMP_DOMAIN};
use crate::{Result, WishlistError};
use chrono::Utc;
use rusqlite::{Connection, OpenFlags};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Browsers whose cookies can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browser {
    Firefox,
    Chrome,
    Chromium,
    Brave,
    Opera,
    Edge,
}

impl Browser {
    pub const ALL: [Browser; 6] = [
        Browser::Firefox,
        Browser::Chrome,
        Browser::Chromium,
        Browser::Brave,
        Browser::Opera,
        Browser::Edge,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Browser::Firefox => "firefox",
            Browser::Chrome => "chrome",
            Browser::Chromium => "chromium",
            Browser::Brave => "brave",
            Browser::Opera => "opera",
            Browser::Edge => "edge",
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Browser {
    type Err = WishlistError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Browser::ALL
            .into_iter()
            .find(|b| b.name() == wanted)
            .ok_or_else(|| WishlistError::UnknownBrowser(s.to_string()))
    }
}

/// Resolve a Bandcamp session for `browser`, optionally from `cookie_path`.
///
/// Fails with [`WishlistError::UnknownBrowser`] for unsupported browser names
/// and with [`WishlistError::CookieLoad`] when no cookie source can be read.
pub fn resolve(browser: &str, cookie_path: Option<&Path>) -> Result<SessionContext> {
    let browser: Browser = browser.parse()?;

    let cookies = match cookie_path {
        Some(path) => match load_mozilla_cookie_file(path) {
            Ok(cookies) => cookies,
            Err(e) => {
                log::info!(
                    "Cookie file at [{}] not a mozilla cookie jar ({e}). Trying it as a cookie store for the browser [{browser}]...",
                    path.display()
                );
                load_browser_store(browser, Some(path))?
            }
        },
        None => load_browser_store(browser, None)?,
    };

    let total = cookies.len();
    let session = SessionContext::new(cookies).for_host(BANDCAMP_DOMAIN, Utc::now().timestamp());
    log::debug!(
        "Kept {} of {} cookies for {BANDCAMP_DOMAIN}",
        session.len(),
        total
    );
    if session.is_empty() {
        log::warn!("No {BANDCAMP_DOMAIN} cookies found; requests will not be authenticated");
    }
    Ok(session)
}

/// Parse a Netscape/Mozilla `cookies.txt` file.
pub fn load_mozilla_cookie_file(path: &Path) -> Result<Vec<Cookie>> {
    let content = fs::read_to_string(path)?;
    parse_mozilla_cookies(&content)
}

/// Parse the contents of a Netscape/Mozilla `cookies.txt` file.
///
/// The file must start with the `# Netscape HTTP Cookie File` (or
/// `# HTTP Cookie File`) magic line. Lines prefixed with `#HttpOnly_` are
/// cookies, other `#` lines are comments.
pub fn parse_mozilla_cookies(content: &str) -> Result<Vec<Cookie>> {
    let mut lines = content.lines();
    let magic = lines.next().unwrap_or_default();
    if !(magic.starts_with("# Netscape HTTP Cookie File") || magic.starts_with("# HTTP Cookie File"))
    {
        return Err(WishlistError::CookieLoad(
            "does not look like a Netscape format cookies file".to_string(),
        ));
    }

    let mut cookies = Vec::new();
    for (number, line) in lines.enumerate() {
        let line = line.trim_end_matches(['\r', '\n']);
        let line = match line.strip_prefix("#HttpOnly_") {
            Some(rest) => rest,
            None if line.trim().is_empty() || line.starts_with('#') => continue,
            None => line,
        };

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 7 {
            return Err(WishlistError::CookieLoad(format!(
                "invalid cookie line {}: expected 7 tab separated fields, got {}",
                number + 2,
                fields.len()
            )));
        }

        let expires = match fields[4].trim() {
            "" | "0" => None,
            value => Some(value.parse::<i64>().map_err(|_| {
                WishlistError::CookieLoad(format!(
                    "invalid expiry '{value}' on cookie line {}",
                    number + 2
                ))
            })?),
        };

        cookies.push(Cookie {
            domain: fields[0].to_string(),
            path: fields[2].to_string(),
            secure: fields[3].eq_ignore_ascii_case("TRUE"),
            expires,
            name: fields[5].to_string(),
            value: fields[6].to_string(),
        });
    }

    Ok(cookies)
}

/// Read cookies from a browser's own store, at `path` or the default profile.
pub fn load_browser_store(browser: Browser, path: Option<&Path>) -> Result<Vec<Cookie>> {
    match browser {
        Browser::Firefox => {
            let store = match path {
                Some(path) => path.to_path_buf(),
                None => find_firefox_cookie_store().ok_or_else(|| {
                    WishlistError::CookieLoad("could not find a Firefox profile".to_string())
                })?,
            };
            log::debug!("Reading Firefox cookies from {}", store.display());
            read_firefox_store(&store).map_err(|e| {
                WishlistError::CookieLoad(format!(
                    "failed to read Firefox cookie store at [{}]: {e}",
                    store.display()
                ))
            })
        }
        other => Err(WishlistError::CookieLoad(format!(
            "the {other} cookie store is encrypted with the system keyring and can't be read; \
             export your bandcamp.com cookies to a Netscape cookies.txt file and pass it with --cookies"
        ))),
    }
}

/// Read the `moz_cookies` table of a Firefox `cookies.sqlite`.
///
/// The database is opened immutable so a running Firefox holding the lock
/// does not block us.
pub fn read_firefox_store(path: &Path) -> Result<Vec<Cookie>> {
    let escaped = path
        .to_string_lossy()
        .replace('%', "%25")
        .replace('?', "%3f")
        .replace('#', "%23");
    let conn = Connection::open_with_flags(
        format!("file:{escaped}?immutable=1"),
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
    )?;

    let mut stmt = conn.prepare(
        "SELECT host, name, value, path, expiry, isSecure FROM moz_cookies WHERE host LIKE ?1",
    )?;
    let rows = stmt.query_map([format!("%{BANDCAMP_DOMAIN}")], |row| {
        let expiry: i64 = row.get(4)?;
        let secure: i64 = row.get(5)?;
        Ok(Cookie {
            domain: row.get(0)?,
            name: row.get(1)?,
            value: row.get(2)?,
            path: row.get(3)?,
            secure: secure != 0,
            expires: normalize_expiry(expiry),
        })
    })?;

    let mut cookies = Vec::new();
    for cookie in rows {
        cookies.push(cookie?);
    }
    Ok(cookies)
}

/// Recent Firefox versions store the expiry in milliseconds.
fn normalize_expiry(expiry: i64) -> Option<i64> {
    match expiry {
        e if e <= 0 => None,
        e if e > 100_000_000_000 => Some(e / 1000),
        e => Some(e),
    }
}

fn firefox_profile_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(home) = dirs::home_dir() {
        roots.push(home.join(".mozilla/firefox"));
        roots.push(home.join("snap/firefox/common/.mozilla/firefox"));
        roots.push(home.join(".var/app/org.mozilla.firefox/.mozilla/firefox"));
        roots.push(home.join("Library/Application Support/Firefox/Profiles"));
    }
    if let Some(data) = dirs::data_dir() {
        roots.push(data.join("Mozilla/Firefox/Profiles"));
    }
    roots
}

/// The most recently used `cookies.sqlite` across all Firefox profiles.
fn find_firefox_cookie_store() -> Option<PathBuf> {
    firefox_profile_roots()
        .into_iter()
        .filter_map(|root| fs::read_dir(root).ok())
        .flat_map(|entries| entries.filter_map(|e| e.ok()))
        .map(|entry| entry.path().join("cookies.sqlite"))
        .filter_map(|store| {
            let modified = fs::metadata(&store).and_then(|m| m.modified()).ok()?;
            Some((modified, store))
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, store)| store)
}
