//! Owner resolution and per kind enrichment of raw posts into [`PostView`]s.

use crate::store::{EngagementStore, StoreError, UserDirectory};
use futures::future::join_all;
use socialsquare_common::model::{
    Id,
    post::{CategoryMarker, ImageContent, Post, PostContent, PollContent, ThreadContent},
    user::{User, UserMarker},
    view::{ImageDetails, PollDetails, PollOptionView, PostDetails, PostView, ThreadDetails},
};
use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};
use thiserror::Error;
use time::UtcDateTime;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("The owner {0} of the post could not be resolved")]
    OwnerNotFound(Id<UserMarker>),
    #[error("The category {0} of the thread does not exist")]
    CategoryNotFound(Id<CategoryMarker>),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct Enricher {
    users: Arc<dyn UserDirectory>,
    engagement: Arc<dyn EngagementStore>,
}

impl Enricher {
    #[must_use]
    pub fn new(users: Arc<dyn UserDirectory>, engagement: Arc<dyn EngagementStore>) -> Self {
        Self { users, engagement }
    }

    /// Builds the views of `posts` as seen by `viewer`.
    ///
    /// The output keeps the input order. Posts whose owner cannot be resolved, or whose
    /// enrichment fails, are left out; this never fails as a whole.
    pub async fn enrich(&self, posts: Vec<Post>, viewer: &User) -> Vec<PostView> {
        let owners = self.resolve_owners(&posts).await;

        let results = join_all(
            posts
                .iter()
                .map(|post| self.enrich_post(post, owners.get(&post.creator_id), viewer)),
        )
        .await;

        posts
            .iter()
            .zip(results)
            .filter_map(|(post, result)| match result {
                Ok(view) => Some(view),
                Err(error) => {
                    warn!(post = %post.id, kind = %post.kind(), %error, "Dropping post that could not be enriched");
                    None
                }
            })
            .collect()
    }

    /// One lookup per distinct creator.
    async fn resolve_owners(&self, posts: &[Post]) -> HashMap<Id<UserMarker>, User> {
        let creators: BTreeSet<Id<UserMarker>> = posts.iter().map(|post| post.creator_id).collect();

        let lookups = join_all(
            creators
                .into_iter()
                .map(|creator| async move { (creator, self.users.user_by_id(creator).await) }),
        )
        .await;

        lookups
            .into_iter()
            .filter_map(|(creator, result)| match result {
                Ok(Some(owner)) => Some((creator, owner)),
                Ok(None) => {
                    debug!(%creator, "Post owner no longer exists");
                    None
                }
                Err(error) => {
                    warn!(%creator, %error, "Resolving post owner failed");
                    None
                }
            })
            .collect()
    }

    async fn enrich_post(
        &self,
        post: &Post,
        owner: Option<&User>,
        viewer: &User,
    ) -> Result<PostView, EnrichError> {
        let owner = owner.ok_or(EnrichError::OwnerNotFound(post.creator_id))?;
        let kind = post.kind();

        let (tally, comments) = futures::try_join!(
            self.engagement.vote_tally(kind, post.id, viewer.public_id),
            self.engagement.comment_count(kind, post.id),
        )?;

        let details = match &post.content {
            PostContent::Image(image) => enrich_image(image),
            PostContent::Poll(poll) => self.enrich_poll(post, poll, viewer).await?,
            PostContent::Thread(thread) => self.enrich_thread(thread).await?,
        };

        Ok(PostView {
            id: post.id,
            format: kind,
            has_seen_posts: None,
            date_posted: epoch_millis(post.date_posted),
            creator_name: owner.handle.clone(),
            creator_display_name: owner.display_name.clone(),
            creator_pfp_key: owner.profile_image_key.clone(),
            creator_public_id: owner.public_id,
            votes: tally.score(),
            upvoted: tally.upvoted(),
            downvoted: tally.downvoted(),
            vote_id: tally.viewer_vote.map(|vote| vote.id),
            is_owner: owner.id == viewer.id,
            interacted: tally.viewer_vote.is_some(),
            comments,
            details,
        })
    }

    async fn enrich_poll(
        &self,
        post: &Post,
        poll: &PollContent,
        viewer: &User,
    ) -> Result<PostDetails, EnrichError> {
        let tally = self
            .engagement
            .poll_tally(post.id, viewer.id, poll.options.len())
            .await?;

        let options = poll
            .options
            .iter()
            .enumerate()
            .map(|(index, option)| PollOptionView {
                text: option.text.clone(),
                color: option.color.clone(),
                votes: tally.option_votes.get(index).copied().unwrap_or(0),
            })
            .collect();

        Ok(PostDetails::Poll(PollDetails {
            poll_title: poll.title.clone(),
            poll_sub_title: poll.subtitle.clone(),
            options,
            voted_for: tally.voted_for.filter(|&index| index < poll.options.len()),
            allow_screen_shots: poll.allow_screenshots,
        }))
    }

    async fn enrich_thread(&self, thread: &ThreadContent) -> Result<PostDetails, EnrichError> {
        let category = self
            .engagement
            .category(thread.category_id)
            .await?
            .ok_or(EnrichError::CategoryNotFound(thread.category_id))?;

        Ok(PostDetails::Thread(ThreadDetails {
            thread_title: thread.title.clone(),
            thread_subtitle: thread.subtitle.clone(),
            thread_body: thread.body.clone(),
            thread_tags: thread.tags.clone(),
            thread_image_key: thread.image.as_ref().map(|image| image.key.clone()),
            thread_image_description: thread.image.as_ref().map(|image| image.description.clone()),
            thread_nsfw: thread.nsfw,
            thread_nsfl: thread.nsfl,
            category_id: category.id,
            category_title: category.title,
            category_image_key: category.image_key,
        }))
    }
}

fn enrich_image(image: &ImageContent) -> PostDetails {
    PostDetails::Image(ImageDetails {
        image_key: image.image_key.clone(),
        image_title: image.title.clone(),
        image_description: image.description.clone(),
        allow_screen_shots: image.allow_screenshots,
        tags: image.tags.clone(),
    })
}

fn epoch_millis(time: UtcDateTime) -> i64 {
    i64::try_from(time.unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX)
}
