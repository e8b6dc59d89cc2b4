//! Filtering a wishlist and picking a random item from what is left.
//!
//! Criteria are plain data ([`FilterCriterion`]). They are compiled into a
//! [`FilterPlan`] once: genre slugs are resolved, and the follow index is
//! built when follow data is needed. Everything that can be wrong with a
//! configuration fails at that point, before any record is looked at.
//!
//! A plan is a pure conjunction. Position criteria (`first`, `after_first`,
//! `last`) always refer to a record's index in the full input, so their
//! meaning does not depend on the other criteria.

use crate::dates::parse_timestamp;
use crate::genre;
use crate::types::{CollectionRecord, FollowRecord, ItemType};
use crate::{Result, WishlistError};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One selection criterion.
///
/// # Examples
///
/// ```rust
/// use bandcamp_wishlist::FilterCriterion;
///
/// let criterion: FilterCriterion =
///     serde_json::from_str(r#"{"filter": "min_also_collected", "value": 5}"#).unwrap();
/// assert_eq!(criterion, FilterCriterion::MinAlsoCollected(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "filter", content = "value", rename_all = "snake_case")]
pub enum FilterCriterion {
    /// Position in the input is `< n`
    First(usize),
    /// Position in the input is `>= n`
    AfterFirst(usize),
    /// One of the last `n` records of the input
    Last(usize),
    /// Added strictly before the date
    Before(DateTime<Utc>),
    /// Added on or after the date
    Since(DateTime<Utc>),
    OnlyAlbums,
    DownloadAvailable,
    IsPurchasable,
    MinAlsoCollected(u64),
    MaxAlsoCollected(u64),
    /// Genre slug, resolved through [`crate::genre::GENRES`]
    Genre(String),
    OnlyFollowed,
    NoFollowed,
    FollowedSince(DateTime<Utc>),
    FollowedBefore(DateTime<Utc>),
}

impl FilterCriterion {
    /// Whether this criterion needs the followed-bands collection.
    pub fn needs_follows(&self) -> bool {
        matches!(
            self,
            FilterCriterion::OnlyFollowed
                | FilterCriterion::NoFollowed
                | FilterCriterion::FollowedSince(_)
                | FilterCriterion::FollowedBefore(_)
        )
    }

    fn name(&self) -> &'static str {
        match self {
            FilterCriterion::First(_) => "first",
            FilterCriterion::AfterFirst(_) => "after-first",
            FilterCriterion::Last(_) => "last",
            FilterCriterion::Before(_) => "before",
            FilterCriterion::Since(_) => "since",
            FilterCriterion::OnlyAlbums => "only-albums",
            FilterCriterion::DownloadAvailable => "download-available",
            FilterCriterion::IsPurchasable => "is-purchasable",
            FilterCriterion::MinAlsoCollected(_) => "min-also-collected",
            FilterCriterion::MaxAlsoCollected(_) => "max-also-collected",
            FilterCriterion::Genre(_) => "genre",
            FilterCriterion::OnlyFollowed => "only-followed",
            FilterCriterion::NoFollowed => "no-followed",
            FilterCriterion::FollowedSince(_) => "followed-since",
            FilterCriterion::FollowedBefore(_) => "followed-before",
        }
    }
}

/// An ordered set of criteria, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionCriteria {
    criteria: Vec<FilterCriterion>,
}

impl SelectionCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, criterion: FilterCriterion) -> Self {
        self.push(criterion);
        self
    }

    pub fn push(&mut self, criterion: FilterCriterion) {
        self.criteria.push(criterion);
    }

    pub fn criteria(&self) -> &[FilterCriterion] {
        &self.criteria
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn needs_follows(&self) -> bool {
        self.criteria.iter().any(FilterCriterion::needs_follows)
    }
}

impl FromIterator<FilterCriterion> for SelectionCriteria {
    fn from_iter<I: IntoIterator<Item = FilterCriterion>>(iter: I) -> Self {
        Self {
            criteria: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<FilterCriterion>> for SelectionCriteria {
    fn from(criteria: Vec<FilterCriterion>) -> Self {
        Self { criteria }
    }
}

/// Band id → follow date. A band whose follow date could not be parsed is
/// still followed, it just has no date.
#[derive(Debug, Clone, Default)]
struct FollowIndex {
    followed: HashMap<u64, Option<DateTime<Utc>>>,
}

impl FollowIndex {
    fn build(follows: &[FollowRecord]) -> Self {
        let mut followed = HashMap::with_capacity(follows.len());
        for follow in follows {
            let date = parse_timestamp(&follow.date_followed);
            if date.is_none() {
                log::debug!(
                    "Unparseable follow date '{}' for band {}",
                    follow.date_followed,
                    follow.band_id
                );
            }
            // Duplicate band ids: the later entry wins
            followed.insert(follow.band_id, date);
        }
        Self { followed }
    }

    fn contains(&self, band_id: u64) -> bool {
        self.followed.contains_key(&band_id)
    }

    fn followed_at(&self, band_id: u64) -> Option<DateTime<Utc>> {
        self.followed.get(&band_id).copied().flatten()
    }
}

#[derive(Debug, Clone)]
enum Predicate {
    First(usize),
    AfterFirst(usize),
    Last(usize),
    Before(DateTime<Utc>),
    Since(DateTime<Utc>),
    OnlyAlbums,
    DownloadAvailable,
    IsPurchasable,
    MinAlsoCollected(u64),
    MaxAlsoCollected(u64),
    GenreId(u64),
    OnlyFollowed,
    NoFollowed,
    FollowedSince(DateTime<Utc>),
    FollowedBefore(DateTime<Utc>),
}

/// Compiled, validated criteria.
#[derive(Debug, Clone)]
pub struct FilterPlan {
    predicates: Vec<Predicate>,
    follows: Option<FollowIndex>,
}

/// The outcome of [`FilterPlan::select`].
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'a> {
    /// Index of the chosen record in the input
    pub position: usize,
    pub record: &'a CollectionRecord,
    /// How many records matched all criteria
    pub candidates: usize,
}

impl FilterPlan {
    /// Validate `criteria` and prepare them for evaluation.
    ///
    /// Fails with [`WishlistError::Configuration`] for an unknown genre slug,
    /// or for a follow criterion when `follows` is `None`.
    pub fn compile(
        criteria: &[FilterCriterion],
        follows: Option<&[FollowRecord]>,
    ) -> Result<Self> {
        let mut predicates = Vec::with_capacity(criteria.len());
        let mut needs_follows = false;

        for criterion in criteria {
            if criterion.needs_follows() {
                if follows.is_none() {
                    return Err(WishlistError::Configuration(format!(
                        "'{}' requires follow data",
                        criterion.name()
                    )));
                }
                needs_follows = true;
            }

            let predicate = match criterion {
                FilterCriterion::First(n) => Predicate::First(*n),
                FilterCriterion::AfterFirst(n) => Predicate::AfterFirst(*n),
                FilterCriterion::Last(n) => Predicate::Last(*n),
                FilterCriterion::Before(t) => Predicate::Before(*t),
                FilterCriterion::Since(t) => Predicate::Since(*t),
                FilterCriterion::OnlyAlbums => Predicate::OnlyAlbums,
                FilterCriterion::DownloadAvailable => Predicate::DownloadAvailable,
                FilterCriterion::IsPurchasable => Predicate::IsPurchasable,
                FilterCriterion::MinAlsoCollected(n) => Predicate::MinAlsoCollected(*n),
                FilterCriterion::MaxAlsoCollected(n) => Predicate::MaxAlsoCollected(*n),
                FilterCriterion::Genre(slug) => {
                    let genre = genre::by_slug(slug).ok_or_else(|| {
                        WishlistError::Configuration(format!("unknown genre '{slug}'"))
                    })?;
                    Predicate::GenreId(genre.id)
                }
                FilterCriterion::OnlyFollowed => Predicate::OnlyFollowed,
                FilterCriterion::NoFollowed => Predicate::NoFollowed,
                FilterCriterion::FollowedSince(t) => Predicate::FollowedSince(*t),
                FilterCriterion::FollowedBefore(t) => Predicate::FollowedBefore(*t),
            };
            predicates.push(predicate);
        }

        let follows = match follows {
            Some(follows) if needs_follows => Some(FollowIndex::build(follows)),
            _ => None,
        };

        Ok(Self {
            predicates,
            follows,
        })
    }

    /// Number of active criteria.
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Whether the record at `position` of an input of `total` records passes
    /// every criterion.
    pub fn matches(&self, position: usize, total: usize, record: &CollectionRecord) -> bool {
        self.predicates
            .iter()
            .all(|predicate| self.evaluate(predicate, position, total, record))
    }

    fn evaluate(
        &self,
        predicate: &Predicate,
        position: usize,
        total: usize,
        record: &CollectionRecord,
    ) -> bool {
        match predicate {
            Predicate::First(n) => position < *n,
            Predicate::AfterFirst(n) => position >= *n,
            Predicate::Last(n) => position >= total.saturating_sub(*n),
            Predicate::Before(t) => added_at(record).is_some_and(|added| added < *t),
            Predicate::Since(t) => added_at(record).is_some_and(|added| added >= *t),
            Predicate::OnlyAlbums => record.item_type() == ItemType::Album,
            Predicate::DownloadAvailable => record.is_download_available(),
            Predicate::IsPurchasable => record.is_purchasable(),
            Predicate::MinAlsoCollected(n) => record.also_collected_count >= *n,
            Predicate::MaxAlsoCollected(n) => record.also_collected_count <= *n,
            Predicate::GenreId(id) => record.genre_id == Some(*id),
            Predicate::OnlyFollowed => self.is_followed(record.band_id),
            Predicate::NoFollowed => !self.is_followed(record.band_id),
            Predicate::FollowedSince(t) => self
                .followed_at(record.band_id)
                .is_some_and(|followed| followed >= *t),
            Predicate::FollowedBefore(t) => self
                .followed_at(record.band_id)
                .is_some_and(|followed| followed < *t),
        }
    }

    fn is_followed(&self, band_id: u64) -> bool {
        self.follows
            .as_ref()
            .is_some_and(|index| index.contains(band_id))
    }

    fn followed_at(&self, band_id: u64) -> Option<DateTime<Utc>> {
        self.follows
            .as_ref()
            .and_then(|index| index.followed_at(band_id))
    }

    /// Positions of all matching records, in input order.
    pub fn filter(&self, records: &[CollectionRecord]) -> Vec<usize> {
        let total = records.len();
        let positions: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(position, record)| self.matches(*position, total, record))
            .map(|(position, _)| position)
            .collect();

        if !self.is_empty() {
            log::info!(
                "applied {} filters, now {} items",
                self.len(),
                positions.len()
            );
        }
        positions
    }

    /// Pick one matching record uniformly at random.
    ///
    /// Fails with [`WishlistError::EmptySelection`] when nothing matches.
    pub fn select<'a, R: Rng + ?Sized>(
        &self,
        records: &'a [CollectionRecord],
        rng: &mut R,
    ) -> Result<Selection<'a>> {
        let positions = self.filter(records);
        let position = *positions.choose(rng).ok_or(WishlistError::EmptySelection)?;

        Ok(Selection {
            position,
            record: &records[position],
            candidates: positions.len(),
        })
    }
}

fn added_at(record: &CollectionRecord) -> Option<DateTime<Utc>> {
    let added = parse_timestamp(&record.added);
    if added.is_none() {
        log::debug!("Unparseable added date '{}' for {}", record.added, record.item_url);
    }
    added
}

/// Compile `criteria` and pick one matching record at random.
///
/// # Examples
///
/// ```rust
/// use bandcamp_wishlist::{filter, CollectionRecord, FilterCriterion, SelectionCriteria};
///
/// let records: Vec<CollectionRecord> = serde_json::from_str(r#"[
///     {"item_type": "track", "item_title": "A", "item_url": "https://a.bandcamp.com/track/a",
///      "band_id": 1, "band_name": "A", "added": "01 Jan 2023 00:00:00 GMT"},
///     {"item_type": "album", "item_title": "B", "item_url": "https://b.bandcamp.com/album/b",
///      "band_id": 2, "band_name": "B", "added": "02 Jan 2023 00:00:00 GMT"}
/// ]"#).unwrap();
///
/// let criteria = SelectionCriteria::new().with(FilterCriterion::OnlyAlbums);
/// let selection = filter::select(&records, None, &criteria, &mut rand::thread_rng()).unwrap();
/// assert_eq!(selection.position, 1);
/// ```
pub fn select<'a, R: Rng + ?Sized>(
    records: &'a [CollectionRecord],
    follows: Option<&[FollowRecord]>,
    criteria: &SelectionCriteria,
    rng: &mut R,
) -> Result<Selection<'a>> {
    FilterPlan::compile(criteria.criteria(), follows)?.select(records, rng)
}
