//! Chronological feed of everyone the viewer follows.
//!
//! Candidates from all followed users are sorted newest first and split into posts the viewer
//! has not seen enough yet and posts they have. The page is filled from the unseen posts first
//! and topped up with seen ones, skipping everything the client already renders.

use crate::{engine::FeedEngine, error::FeedError};
use futures::future::join_all;
use socialsquare_common::model::{
    Id,
    post::{Post, PostKind, PostMarker, PostStub},
    user::{PublicId, User, UserMarker},
    view::FeedPage,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

#[derive(Clone, Eq, PartialEq, Debug)]
struct Candidate {
    stub: PostStub,
    seen: bool,
}

impl FeedEngine {
    pub async fn compose_follower_feed(
        &self,
        viewer_id: Id<UserMarker>,
        already_rendered: &HashSet<Id<PostMarker>>,
    ) -> Result<FeedPage, FeedError> {
        let viewer = self
            .users
            .user_by_id(viewer_id)
            .await?
            .ok_or(FeedError::ViewerNotFound(viewer_id))?;

        if viewer.following.is_empty() {
            return Err(FeedError::FollowsNoOne);
        }

        let stubs = self.followed_stubs(&viewer).await;
        let window = select_window(stubs, viewer.public_id, already_rendered, self.page_size);
        debug!(
            viewer = %viewer.public_id,
            unseen = window.iter().filter(|candidate| !candidate.seen).count(),
            seen = window.iter().filter(|candidate| candidate.seen).count(),
            "Selected follower feed window"
        );

        let seen: HashMap<Id<PostMarker>, bool> = window
            .iter()
            .map(|candidate| (candidate.stub.id, candidate.seen))
            .collect();
        let posts = self.load_window(&window).await;

        let mut views = self.enricher.enrich(posts, &viewer).await;
        if views.is_empty() {
            return Err(FeedError::NoFollowedPosts);
        }
        for view in &mut views {
            view.has_seen_posts = seen.get(&view.id).copied();
        }

        Ok(FeedPage::new(views))
    }

    /// Stubs of every followed user, in follow order. Users that cannot be resolved
    /// contribute nothing.
    async fn followed_stubs(&self, viewer: &User) -> Vec<PostStub> {
        let per_user = join_all(
            viewer
                .following
                .iter()
                .map(|&followed| self.stubs_of_followed(followed, viewer.public_id)),
        )
        .await;

        per_user.into_iter().flatten().collect()
    }

    async fn stubs_of_followed(&self, followed: PublicId, viewer: PublicId) -> Vec<PostStub> {
        match self.users.user_by_public_id(followed).await {
            Ok(Some(user)) => self
                .posts
                .fetch_by_creator(user.id, viewer)
                .await
                .into_stubs()
                .collect(),
            Ok(None) => {
                debug!(%followed, "Followed user does not exist anymore");
                Vec::new()
            }
            Err(error) => {
                warn!(%followed, %error, "Resolving followed user failed");
                Vec::new()
            }
        }
    }

    /// Full records of the window, in window order. Each kind is fetched in one batch.
    async fn load_window(&self, window: &[Candidate]) -> Vec<Post> {
        let batches = join_all(PostKind::ALL.map(|kind| {
            let ids: Vec<Id<PostMarker>> = window
                .iter()
                .filter(|candidate| candidate.stub.kind == kind)
                .map(|candidate| candidate.stub.id)
                .collect();

            async move {
                if ids.is_empty() {
                    return Vec::new();
                }
                match self.posts.fetch_by_ids(kind, &ids).await {
                    Ok(posts) => posts,
                    Err(error) => {
                        warn!(%kind, %error, "Loading feed posts failed, leaving them out");
                        Vec::new()
                    }
                }
            }
        }))
        .await;

        let mut by_id: HashMap<Id<PostMarker>, Post> = batches
            .into_iter()
            .flatten()
            .map(|post| (post.id, post))
            .collect();

        window
            .iter()
            .filter_map(|candidate| {
                let post = by_id.remove(&candidate.stub.id);
                if post.is_none() {
                    debug!(post = %candidate.stub.id, "Feed candidate vanished before loading");
                }
                post
            })
            .collect()
    }
}

/// Orders, partitions and pages the candidates.
///
/// Stubs without a date are dropped. The sort is stable, so equal dates keep the order the
/// stubs were collected in.
fn select_window(
    stubs: Vec<PostStub>,
    viewer: PublicId,
    already_rendered: &HashSet<Id<PostMarker>>,
    page_size: usize,
) -> Vec<Candidate> {
    let mut dated: Vec<PostStub> = stubs
        .into_iter()
        .filter(|stub| stub.date_posted.is_some())
        .collect();
    dated.sort_by(|a, b| b.date_posted.cmp(&a.date_posted));

    let (seen, unseen): (Vec<PostStub>, Vec<PostStub>) =
        dated.into_iter().partition(|stub| stub.is_seen_by(viewer));

    let unseen = unseen
        .into_iter()
        .filter(|stub| !already_rendered.contains(&stub.id))
        .map(|stub| Candidate { stub, seen: false });
    let seen = seen
        .into_iter()
        .filter(|stub| !already_rendered.contains(&stub.id))
        .map(|stub| Candidate { stub, seen: true });

    unseen.chain(seen).take(page_size).collect()
}
