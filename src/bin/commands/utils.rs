use bandcamp_wishlist::{cookies, dates, BandcampClient, Browser};
use chrono::{DateTime, Utc};

use super::SessionArgs;

/// Validate a browser name for clap
pub fn parse_browser(name: &str) -> Result<String, String> {
    name.parse::<Browser>()
        .map(|browser| browser.name().to_string())
        .map_err(|e| e.to_string())
}

/// Parse a date argument relative to now
pub fn parse_date_arg(value: &str) -> Result<DateTime<Utc>, String> {
    dates::parse_user_date(value, Utc::now()).map_err(|e| e.to_string())
}

/// Resolve the session cookies and build a client with them
pub fn create_client(args: &SessionArgs) -> Result<BandcampClient, Box<dyn std::error::Error>> {
    let session = cookies::resolve(&args.browser, args.cookies.as_deref())?;
    log::info!("Using {} bandcamp cookies from {}", session.len(), args.browser);

    let http_client = http_client::native::NativeClient::new();
    Ok(BandcampClient::new(Box::new(http_client), session))
}

/// Open a URL in the default browser
pub fn open_in_browser(url: &str) -> std::io::Result<()> {
    log::debug!("Opening {url} in the default browser");
    open::that(url)
}
