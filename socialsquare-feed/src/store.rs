//! Storage collaborators of the feed engine.

use async_trait::async_trait;
use socialsquare_common::model::{
    Id,
    post::{Category, CategoryMarker, Post, PostKind, PostMarker, PostStub},
    user::{PublicId, User, UserMarker},
    vote::{PollTally, VoteTally},
};
use std::error::Error as StdError;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of a backing store, opaque to the engine.
#[derive(Debug, Error)]
#[error("Store operation failed: {0}")]
pub struct StoreError(Box<dyn StdError + Send + Sync>);

impl StoreError {
    pub fn new(error: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self(error.into())
    }
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_by_id(&self, id: Id<UserMarker>) -> StoreResult<Option<User>>;

    async fn user_by_public_id(&self, public_id: PublicId) -> StoreResult<Option<User>>;
}

/// The collection of one content kind.
#[async_trait]
pub trait PostStore: Send + Sync {
    fn kind(&self) -> PostKind;

    /// Stubs of every post of `creator`. `interacted` is computed for `viewer`.
    async fn stubs_by_creator(
        &self,
        creator: Id<UserMarker>,
        viewer: PublicId,
    ) -> StoreResult<Vec<PostStub>>;

    /// Full records of the given posts, in no particular order. Unknown ids are skipped.
    async fn posts_by_ids(&self, ids: &[Id<PostMarker>]) -> StoreResult<Vec<Post>>;

    /// Adds one exposure of `post` to `viewer`. Returns the new amount, or `None` if the post
    /// does not exist.
    async fn increment_exposure(
        &self,
        post: Id<PostMarker>,
        viewer: PublicId,
    ) -> StoreResult<Option<u32>>;
}

/// Votes, comments and categories needed to render posts.
#[async_trait]
pub trait EngagementStore: Send + Sync {
    async fn vote_tally(
        &self,
        kind: PostKind,
        post: Id<PostMarker>,
        viewer: PublicId,
    ) -> StoreResult<VoteTally>;

    async fn poll_tally(
        &self,
        post: Id<PostMarker>,
        viewer: Id<UserMarker>,
        options: usize,
    ) -> StoreResult<PollTally>;

    async fn comment_count(&self, kind: PostKind, post: Id<PostMarker>) -> StoreResult<u64>;

    async fn category(&self, id: Id<CategoryMarker>) -> StoreResult<Option<Category>>;
}
