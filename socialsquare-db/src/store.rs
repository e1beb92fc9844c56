//! The feed engine's store traits, backed by [`DbClient`].

use crate::client::{DbClient, DbError};
use async_trait::async_trait;
use socialsquare_common::model::{
    Id,
    post::{Category, CategoryMarker, Post, PostKind, PostMarker, PostStub},
    user::{PublicId, User, UserMarker},
    vote::{PollTally, VoteTally},
};
use socialsquare_feed::{
    PostRepository,
    ranking::{RankingCandidate, RankingCandidates},
    store::{EngagementStore, PostStore, StoreError, StoreResult, UserDirectory},
};
use std::sync::Arc;

impl From<DbError> for StoreError {
    fn from(error: DbError) -> Self {
        StoreError::new(error)
    }
}

/// The table of one post kind.
#[derive(Clone, Debug)]
pub struct PgPostStore {
    kind: PostKind,
    client: DbClient,
}

impl DbClient {
    #[must_use]
    pub fn post_store(&self, kind: PostKind) -> PgPostStore {
        PgPostStore {
            kind,
            client: self.clone(),
        }
    }

    #[must_use]
    pub fn post_repository(&self) -> PostRepository {
        PostRepository::new(
            Arc::new(self.post_store(PostKind::Image)),
            Arc::new(self.post_store(PostKind::Poll)),
            Arc::new(self.post_store(PostKind::Thread)),
        )
    }
}

#[async_trait]
impl UserDirectory for DbClient {
    async fn user_by_id(&self, id: Id<UserMarker>) -> StoreResult<Option<User>> {
        Ok(self.fetch_user(id).await?)
    }

    async fn user_by_public_id(&self, public_id: PublicId) -> StoreResult<Option<User>> {
        Ok(self.fetch_user_by_public_id(public_id).await?)
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    fn kind(&self) -> PostKind {
        self.kind
    }

    async fn stubs_by_creator(
        &self,
        creator: Id<UserMarker>,
        viewer: PublicId,
    ) -> StoreResult<Vec<PostStub>> {
        Ok(self.client.fetch_stubs(self.kind, creator, viewer).await?)
    }

    async fn posts_by_ids(&self, ids: &[Id<PostMarker>]) -> StoreResult<Vec<Post>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.client.fetch_posts(self.kind, ids).await?)
    }

    async fn increment_exposure(
        &self,
        post: Id<PostMarker>,
        viewer: PublicId,
    ) -> StoreResult<Option<u32>> {
        Ok(self.client.increment_exposure(self.kind, post, viewer).await?)
    }
}

#[async_trait]
impl EngagementStore for DbClient {
    async fn vote_tally(
        &self,
        kind: PostKind,
        post: Id<PostMarker>,
        viewer: PublicId,
    ) -> StoreResult<VoteTally> {
        Ok(self.fetch_vote_tally(kind, post, viewer).await?)
    }

    async fn poll_tally(
        &self,
        post: Id<PostMarker>,
        viewer: Id<UserMarker>,
        options: usize,
    ) -> StoreResult<PollTally> {
        Ok(self.fetch_poll_tally(post, viewer, options).await?)
    }

    async fn comment_count(&self, kind: PostKind, post: Id<PostMarker>) -> StoreResult<u64> {
        Ok(self.fetch_comment_count(kind, post).await?)
    }

    async fn category(&self, id: Id<CategoryMarker>) -> StoreResult<Option<Category>> {
        Ok(self.fetch_category(id).await?)
    }
}

#[async_trait]
impl RankingCandidates for DbClient {
    async fn recent_image_candidates(
        &self,
        viewer: PublicId,
        limit: usize,
    ) -> StoreResult<Vec<RankingCandidate>> {
        Ok(self.fetch_image_candidates(viewer, limit).await?)
    }
}
