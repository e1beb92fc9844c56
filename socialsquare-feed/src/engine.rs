use crate::{
    PAGE_SIZE,
    enrich::Enricher,
    ranking::RankingOracle,
    repository::PostRepository,
    store::{EngagementStore, UserDirectory},
};
use std::sync::Arc;

/// Everything the engine reads from or writes to.
#[derive(Clone)]
pub struct FeedStores {
    pub users: Arc<dyn UserDirectory>,
    pub posts: PostRepository,
    pub engagement: Arc<dyn EngagementStore>,
    pub oracle: Arc<dyn RankingOracle>,
}

/// Entry point of the feed engine.
///
/// Holds no per request state; one instance serves any number of concurrent requests.
#[derive(Clone)]
pub struct FeedEngine {
    pub(crate) users: Arc<dyn UserDirectory>,
    pub(crate) posts: PostRepository,
    pub(crate) enricher: Enricher,
    pub(crate) oracle: Arc<dyn RankingOracle>,
    pub(crate) page_size: usize,
}

impl FeedEngine {
    #[must_use]
    pub fn new(stores: FeedStores) -> Self {
        let enricher = Enricher::new(Arc::clone(&stores.users), stores.engagement);

        Self {
            users: stores.users,
            posts: stores.posts,
            enricher,
            oracle: stores.oracle,
            page_size: PAGE_SIZE,
        }
    }
}
