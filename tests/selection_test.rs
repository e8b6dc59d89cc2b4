mod common;

use bandcamp_wishlist::{
    dates, filter, store, CollectionRecord, FilterCriterion, FilterPlan, FollowRecord,
    SelectionCriteria, WishlistError,
};
use chrono::{TimeZone, Utc};
use common::{follow, followed_band, record, wishlist_item};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

fn wishlist() -> Vec<CollectionRecord> {
    vec![
        record(1, "album", 1, "05 Jan 2024 10:00:00 GMT"),
        record(2, "track", 5, "01 Dec 2023 10:00:00 GMT"),
        record(3, "album", 10, "15 Oct 2023 10:00:00 GMT"),
        record(4, "album", 2, "02 Jul 2023 10:00:00 GMT"),
        record(5, "track", 8, "20 Mar 2023 10:00:00 GMT"),
    ]
}

#[test_log::test]
fn test_select_from_files_on_disk() {
    let dir = TempDir::new().unwrap();
    let wishlist_path = dir.path().join("wishlist.json");
    let bands_path = dir.path().join("bands.json");

    let raw_items: Vec<_> = (1..=6)
        .map(|i| wishlist_item(i, if i % 2 == 0 { "track" } else { "album" }, i, "01 Jan 2024 00:00:00 GMT"))
        .collect();
    store::save_collection(&raw_items, &wishlist_path).unwrap();
    store::save_collection(
        &[
            followed_band(3, "01 Feb 2020 00:00:00 GMT"),
            followed_band(5, "01 Feb 2024 00:00:00 GMT"),
        ],
        &bands_path,
    )
    .unwrap();

    let records: Vec<CollectionRecord> = store::load_collection(&wishlist_path).unwrap();
    let follows: Vec<FollowRecord> = store::load_collection(&bands_path).unwrap();
    assert_eq!(records[0].extra["currency"], "EUR");

    let criteria = SelectionCriteria::new()
        .with(FilterCriterion::OnlyAlbums)
        .with(FilterCriterion::FollowedSince(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()));

    let selection =
        filter::select(&records, Some(&follows), &criteria, &mut StdRng::seed_from_u64(3)).unwrap();
    assert_eq!(selection.position, 4);
    assert_eq!(selection.record.band_id, 5);
    assert_eq!(selection.candidates, 1);
    assert_eq!(
        selection.record.to_string(),
        "Band 5 'Record 5': https://band5.bandcamp.com/album/record-5"
    );
}

#[test_log::test]
fn test_min_also_collected_positions() {
    let plan = FilterPlan::compile(&[FilterCriterion::MinAlsoCollected(5)], None).unwrap();
    assert_eq!(plan.filter(&wishlist()), vec![1, 2, 4]);
}

#[test_log::test]
fn test_last_is_relative_to_full_input() {
    let records = wishlist();
    let plan =
        FilterPlan::compile(&[FilterCriterion::Last(3), FilterCriterion::OnlyAlbums], None).unwrap();
    // positions 2..5 are the last three; of those only 2 and 3 are albums
    assert_eq!(plan.filter(&records), vec![2, 3]);
}

#[test_log::test]
fn test_criteria_order_does_not_matter() {
    let records = wishlist();
    let since = dates::parse_user_date("2023-06-01", Utc::now()).unwrap();
    let criteria = [
        FilterCriterion::Since(since),
        FilterCriterion::AfterFirst(1),
        FilterCriterion::MaxAlsoCollected(9),
    ];

    let forward = FilterPlan::compile(&criteria, None).unwrap().filter(&records);
    let mut reversed = criteria.to_vec();
    reversed.reverse();
    let backward = FilterPlan::compile(&reversed, None).unwrap().filter(&records);

    assert_eq!(forward, backward);
    assert_eq!(forward, vec![1, 3]);
}

#[test_log::test]
fn test_followed_before_excludes_unfollowed_bands() {
    let records = wishlist();
    let follows = vec![
        follow(1, "10 Jan 2022 00:00:00 GMT"),
        follow(3, "10 Jan 2024 00:00:00 GMT"),
    ];
    let cutoff = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();

    let plan =
        FilterPlan::compile(&[FilterCriterion::FollowedBefore(cutoff)], Some(&follows)).unwrap();
    assert_eq!(plan.filter(&records), vec![0]);

    let plan =
        FilterPlan::compile(&[FilterCriterion::FollowedSince(cutoff)], Some(&follows)).unwrap();
    assert_eq!(plan.filter(&records), vec![2]);
}

#[test_log::test]
fn test_nothing_matches() {
    let records = wishlist();
    let criteria = SelectionCriteria::new().with(FilterCriterion::MinAlsoCollected(11));
    let result = filter::select(&records, None, &criteria, &mut StdRng::seed_from_u64(0));

    match result {
        Err(e @ WishlistError::EmptySelection) => {
            assert_eq!(e.to_string(), "No items match the given filters")
        }
        other => panic!("Expected empty selection, got: {other:?}"),
    }
}

#[test_log::test]
fn test_genre_slugs() {
    let mut records = wishlist();
    records[4].genre_id = Some(15);

    let metal = FilterPlan::compile(&[FilterCriterion::Genre("metal".to_string())], None).unwrap();
    assert_eq!(metal.filter(&records), vec![0, 1, 2, 3]);

    let jazz = FilterPlan::compile(&[FilterCriterion::Genre("jazz".to_string())], None).unwrap();
    assert_eq!(jazz.filter(&records), vec![4]);

    assert!(matches!(
        FilterPlan::compile(&[FilterCriterion::Genre("nonexistent".to_string())], None),
        Err(WishlistError::Configuration(_))
    ));
}

#[test_log::test]
fn test_follow_criteria_without_follow_data() {
    let criteria = SelectionCriteria::new()
        .with(FilterCriterion::OnlyAlbums)
        .with(FilterCriterion::NoFollowed);
    assert!(criteria.needs_follows());

    let records = wishlist();
    let result = filter::select(&records, None, &criteria, &mut StdRng::seed_from_u64(0));
    assert!(matches!(result, Err(WishlistError::Configuration(_))));
}
