use crate::store::{PostStore, StoreResult};
use socialsquare_common::model::{
    Id,
    post::{Post, PostKind, PostMarker, PostStub},
    user::{PublicId, UserMarker},
};
use std::sync::Arc;
use tracing::warn;

/// Uniform access to the three post collections. Kinds are never merged here.
#[derive(Clone)]
pub struct PostRepository {
    images: Arc<dyn PostStore>,
    polls: Arc<dyn PostStore>,
    threads: Arc<dyn PostStore>,
}

/// Stubs of one creator, per kind.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct CreatorPosts {
    pub images: Vec<PostStub>,
    pub polls: Vec<PostStub>,
    pub threads: Vec<PostStub>,
}

impl CreatorPosts {
    /// Images, then polls, then threads.
    pub fn into_stubs(self) -> impl Iterator<Item = PostStub> {
        self.images
            .into_iter()
            .chain(self.polls)
            .chain(self.threads)
    }
}

impl PostRepository {
    /// # Panics
    ///
    /// Panics if a store serves another kind than the slot it is passed in.
    #[must_use]
    pub fn new(
        images: Arc<dyn PostStore>,
        polls: Arc<dyn PostStore>,
        threads: Arc<dyn PostStore>,
    ) -> Self {
        assert_eq!(images.kind(), PostKind::Image);
        assert_eq!(polls.kind(), PostKind::Poll);
        assert_eq!(threads.kind(), PostKind::Thread);

        Self {
            images,
            polls,
            threads,
        }
    }

    #[must_use]
    pub fn store(&self, kind: PostKind) -> &dyn PostStore {
        match kind {
            PostKind::Image => &*self.images,
            PostKind::Poll => &*self.polls,
            PostKind::Thread => &*self.threads,
        }
    }

    /// Fetches the stubs of all three kinds concurrently. A failing collection contributes no
    /// stubs instead of failing the whole fetch.
    pub async fn fetch_by_creator(&self, creator: Id<UserMarker>, viewer: PublicId) -> CreatorPosts {
        let (images, polls, threads) = futures::join!(
            self.stubs_or_empty(PostKind::Image, creator, viewer),
            self.stubs_or_empty(PostKind::Poll, creator, viewer),
            self.stubs_or_empty(PostKind::Thread, creator, viewer),
        );

        CreatorPosts {
            images,
            polls,
            threads,
        }
    }

    pub async fn fetch_by_ids(&self, kind: PostKind, ids: &[Id<PostMarker>]) -> StoreResult<Vec<Post>> {
        self.store(kind).posts_by_ids(ids).await
    }

    async fn stubs_or_empty(
        &self,
        kind: PostKind,
        creator: Id<UserMarker>,
        viewer: PublicId,
    ) -> Vec<PostStub> {
        match self.store(kind).stubs_by_creator(creator, viewer).await {
            Ok(stubs) => stubs,
            Err(error) => {
                warn!(%creator, %kind, %error, "Fetching post stubs failed, continuing without them");
                Vec::new()
            }
        }
    }
}
