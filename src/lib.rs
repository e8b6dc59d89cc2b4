pub mod client;
pub mod cookies;
pub mod dates;
pub mod download;
pub mod error;
pub mod filter;
pub mod genre;
pub mod headers;
pub mod iterator;
pub mod profile;
pub mod session;
pub mod store;
pub mod r#trait;
pub mod types;

pub use client::BandcampClient;
pub use cookies::Browser;
pub use download::Endpoints;
pub use error::WishlistError;
pub use filter::{FilterCriterion, FilterPlan, Selection, SelectionCriteria};
pub use genre::Genre;
pub use iterator::{fetch_collection, CollectionPage, CollectionPager};
pub use profile::{InitialBatch, ProfileData};
pub use r#trait::CollectionApi;
pub use session::{Cookie, SessionContext};
pub use types::{
    CollectionRecord, CollectionSource, FollowRecord, ItemType, PageRequest, PaginationToken,
};

#[cfg(feature = "mock")]
pub use r#trait::MockCollectionApi;

pub type Result<T> = std::result::Result<T, WishlistError>;
