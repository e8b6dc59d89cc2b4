use super::utils::open_in_browser;
use super::RandomArgs;
use bandcamp_wishlist::genre::GENRES;
use bandcamp_wishlist::{
    store, CollectionRecord, FilterCriterion, FilterPlan, FollowRecord, SelectionCriteria,
};

/// Turn the command line flags into selection criteria
pub fn criteria_from_args(args: &RandomArgs) -> SelectionCriteria {
    let mut criteria = SelectionCriteria::new();

    if let Some(n) = args.first {
        criteria.push(FilterCriterion::First(n));
    }
    if let Some(n) = args.after_first {
        criteria.push(FilterCriterion::AfterFirst(n));
    }
    if let Some(n) = args.last {
        criteria.push(FilterCriterion::Last(n));
    }
    if let Some(t) = args.before {
        criteria.push(FilterCriterion::Before(t));
    }
    if let Some(t) = args.since {
        criteria.push(FilterCriterion::Since(t));
    }
    if args.only_albums {
        criteria.push(FilterCriterion::OnlyAlbums);
    }
    if args.download_available {
        criteria.push(FilterCriterion::DownloadAvailable);
    }
    if args.is_purchasable {
        criteria.push(FilterCriterion::IsPurchasable);
    }
    if let Some(n) = args.min_also_collected {
        criteria.push(FilterCriterion::MinAlsoCollected(n));
    }
    if let Some(n) = args.max_also_collected {
        criteria.push(FilterCriterion::MaxAlsoCollected(n));
    }
    if let Some(slug) = &args.genre {
        criteria.push(FilterCriterion::Genre(slug.clone()));
    }
    if args.only_followed {
        criteria.push(FilterCriterion::OnlyFollowed);
    }
    if args.no_followed {
        criteria.push(FilterCriterion::NoFollowed);
    }
    if let Some(t) = args.followed_since {
        criteria.push(FilterCriterion::FollowedSince(t));
    }
    if let Some(t) = args.followed_before {
        criteria.push(FilterCriterion::FollowedBefore(t));
    }

    criteria
}

/// Pick a random wishlist item matching the flags and open it
pub fn handle_random(args: &RandomArgs) -> Result<(), Box<dyn std::error::Error>> {
    let criteria = criteria_from_args(args);

    let bands: Option<Vec<FollowRecord>> = match &args.bands {
        Some(path) => {
            let bands = store::load_collection(path)?;
            println!("loaded {} bands from {}", bands.len(), path.display());
            Some(bands)
        }
        None => None,
    };

    // Configuration problems surface before the wishlist is read
    let plan = FilterPlan::compile(criteria.criteria(), bands.as_deref())?;

    let wishlist: Vec<CollectionRecord> = store::load_collection(&args.input)?;
    println!("loaded {} items from {}", wishlist.len(), args.input.display());

    let selection = plan.select(&wishlist, &mut rand::thread_rng())?;
    let chosen = selection.record;

    println!("Opening: {chosen}\n(added on {})", chosen.added);
    if args.no_open {
        return Ok(());
    }
    open_in_browser(&chosen.item_url)?;
    Ok(())
}

/// Print the genre table
pub fn handle_genres() {
    for genre in GENRES {
        println!("{:<14} {:>3}  {}", genre.slug, genre.id, genre.label);
    }
}
