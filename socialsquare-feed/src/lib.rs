//! Feed composition for SocialSquare.
//!
//! [`FeedEngine`] builds the chronological follower feed and the ranked for-you feed, and
//! records per viewer exposure of posts. Storage is reached only through the traits in
//! [`store`] and [`ranking`].

mod engine;
mod enrich;
mod error;
mod exposure;
mod follower;
mod personalized;
pub mod ranking;
mod repository;
pub mod store;

#[cfg(test)]
mod memory;

pub use engine::{FeedEngine, FeedStores};
pub use enrich::{EnrichError, Enricher};
pub use error::{FeedError, FeedErrorKind};
pub use exposure::Exposure;
pub use repository::{CreatorPosts, PostRepository};

/// Maximum number of posts in one feed page.
pub const PAGE_SIZE: usize = 10;
