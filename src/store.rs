//! Reading and writing downloaded collections.
//!
//! Collections are stored as a plain JSON array of the records the server
//! returned, so files written by older versions, or by hand, load as well.

use crate::{Result, WishlistError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Load a collection file.
///
/// # Examples
///
/// ```rust,no_run
/// use bandcamp_wishlist::{store, CollectionRecord};
///
/// let wishlist: Vec<CollectionRecord> = store::load_collection("wishlist.json".as_ref())?;
/// # Ok::<(), bandcamp_wishlist::WishlistError>(())
/// ```
pub fn load_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = fs::read_to_string(path).map_err(|e| {
        WishlistError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read {}: {e}", path.display()),
        ))
    })?;
    let items: Vec<T> = serde_json::from_str(&content)?;
    log::debug!("Loaded {} records from {}", items.len(), path.display());
    Ok(items)
}

/// Write a collection as compact JSON, creating parent directories.
pub fn save_collection<T: Serialize>(items: &[T], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string(items)?;
    fs::write(path, json)?;

    log::info!("Saved {} records to {}", items.len(), path.display());
    Ok(())
}

/// Write a collection as indented JSON, followed by a newline.
pub fn write_pretty<T: Serialize, W: Write>(items: &[T], mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, items)?;
    writeln!(writer)?;
    Ok(())
}

/// Save to `output` when given, otherwise pretty-print to stdout.
pub fn emit_collection<T: Serialize>(items: &[T], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => save_collection(items, path),
        None => write_pretty(items, std::io::stdout().lock()),
    }
}
