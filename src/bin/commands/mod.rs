pub mod download;
pub mod random;
pub mod utils;

use clap::{ArgGroup, Args, Subcommand};
use std::path::PathBuf;

/// Where the session cookies come from
#[derive(Args)]
pub struct SessionArgs {
    /// The browser whose cookies to use for accessing bandcamp
    #[arg(short, long, default_value = "firefox", value_parser = utils::parse_browser)]
    pub browser: String,

    /// Path to a cookie file. It is first read as a Mozilla cookies.txt; if
    /// that fails, it is used as the browser's own cookie store
    #[arg(short, long)]
    pub cookies: Option<PathBuf>,

    /// Write the JSON here instead of printing it
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Bandcamp username (the last part of https://bandcamp.com/<username>)
    pub username: String,
}

#[derive(Args)]
#[command(
    group(ArgGroup::new("position").args(["first", "after_first", "last", "before", "since"])),
    group(ArgGroup::new("follows").args(["only_followed", "no_followed", "followed_since", "followed_before"])),
)]
pub struct RandomArgs {
    /// Wishlist file written by `download`
    #[arg(short, long)]
    pub input: PathBuf,

    /// Only the first N items
    #[arg(long)]
    pub first: Option<usize>,

    /// Only items after the first N
    #[arg(long)]
    pub after_first: Option<usize>,

    /// Only the last N items
    #[arg(long)]
    pub last: Option<usize>,

    /// Only items added before this date
    #[arg(long, value_parser = utils::parse_date_arg)]
    pub before: Option<chrono::DateTime<chrono::Utc>>,

    /// Only items added since this date
    #[arg(long, value_parser = utils::parse_date_arg)]
    pub since: Option<chrono::DateTime<chrono::Utc>>,

    /// Only albums, no single tracks
    #[arg(long)]
    pub only_albums: bool,

    /// Only items with a free download
    #[arg(long)]
    pub download_available: bool,

    /// Only items that can be bought
    #[arg(long)]
    pub is_purchasable: bool,

    /// Only items at least N other fans collected
    #[arg(long)]
    pub min_also_collected: Option<u64>,

    /// Only items at most N other fans collected
    #[arg(long)]
    pub max_also_collected: Option<u64>,

    /// Only items of this genre (see `genres`)
    #[arg(short, long)]
    pub genre: Option<String>,

    /// Followed-bands file written by `download-bands`
    #[arg(short, long)]
    pub bands: Option<PathBuf>,

    /// Only items by bands you follow (needs --bands)
    #[arg(long)]
    pub only_followed: bool,

    /// Only items by bands you don't follow (needs --bands)
    #[arg(long)]
    pub no_followed: bool,

    /// Only items by bands followed since this date (needs --bands)
    #[arg(long, value_parser = utils::parse_date_arg)]
    pub followed_since: Option<chrono::DateTime<chrono::Utc>>,

    /// Only items by bands followed before this date (needs --bands)
    #[arg(long, value_parser = utils::parse_date_arg)]
    pub followed_before: Option<chrono::DateTime<chrono::Utc>>,

    /// Print the choice without opening it in the browser
    #[arg(long)]
    pub no_open: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download your wishlist as JSON
    ///
    /// Usage examples:
    /// # Print the wishlist using Firefox's cookies
    /// bandcamp-wishlist download somefan
    ///
    /// # Save it, with cookies exported to a cookies.txt
    /// bandcamp-wishlist download -c cookies.txt -o wishlist.json somefan
    Download(SessionArgs),

    /// Download the bands you follow as JSON
    DownloadBands(SessionArgs),

    /// Pick a random item from a downloaded wishlist and open it
    ///
    /// Dates accept e.g. "2023-05-01", "2023-05-01 18:00:00", "yesterday" or
    /// "3 weeks ago".
    ///
    /// Usage examples:
    /// # Any album from the last 20 items
    /// bandcamp-wishlist random -i wishlist.json --last 20 --only-albums
    ///
    /// # Something by a band followed this year
    /// bandcamp-wishlist random -i wishlist.json -b bands.json --followed-since 2024-01-01
    Random(RandomArgs),

    /// List the genre slugs accepted by `random --genre`
    Genres,
}

pub async fn execute_command(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Download(args) => download::handle_download_wishlist(&args).await,
        Commands::DownloadBands(args) => download::handle_download_bands(&args).await,
        Commands::Random(args) => random::handle_random(&args),
        Commands::Genres => {
            random::handle_genres();
            Ok(())
        }
    }
}
