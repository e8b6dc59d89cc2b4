use super::utils::create_client;
use super::SessionArgs;
use bandcamp_wishlist::store;
use serde_json::Value;

/// Download the wishlist and save or print it.
///
/// Records are kept as raw JSON so nothing the server sends is dropped.
pub async fn handle_download_wishlist(args: &SessionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let client = create_client(args)?;
    let items: Vec<Value> = client.download_wishlist(&args.username).await?;

    log::info!("Downloaded {} wishlist items", items.len());
    store::emit_collection(&items, args.output.as_deref())?;
    Ok(())
}

/// Download the followed bands and save or print them.
pub async fn handle_download_bands(args: &SessionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let client = create_client(args)?;
    let bands: Vec<Value> = client.download_followed_bands(&args.username).await?;

    log::info!("Downloaded {} followed bands", bands.len());
    store::emit_collection(&bands, args.output.as_deref())?;
    Ok(())
}
