//! Client facing projections of posts, relative to the viewer that requested them.

use crate::model::{
    Id,
    post::{CategoryMarker, PostKind, PostMarker},
    user::{PublicId, UserHandle},
    vote::VoteMarker,
};
use serde::Serialize;

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Id<PostMarker>,
    pub format: PostKind,
    /// Only set by the follower feed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_seen_posts: Option<bool>,
    /// Milliseconds since the unix epoch.
    pub date_posted: i64,
    pub creator_name: UserHandle,
    pub creator_display_name: String,
    pub creator_pfp_key: Option<String>,
    pub creator_public_id: PublicId,
    pub votes: i64,
    pub upvoted: bool,
    pub downvoted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_id: Option<Id<VoteMarker>>,
    pub is_owner: bool,
    pub interacted: bool,
    pub comments: u64,
    #[serde(flatten)]
    pub details: PostDetails,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
#[serde(untagged)]
pub enum PostDetails {
    Image(ImageDetails),
    Poll(PollDetails),
    Thread(ThreadDetails),
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDetails {
    pub image_key: String,
    pub image_title: String,
    pub image_description: String,
    pub allow_screen_shots: bool,
    pub tags: Vec<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollDetails {
    pub poll_title: String,
    pub poll_sub_title: String,
    pub options: Vec<PollOptionView>,
    /// Zero based index into `options`.
    pub voted_for: Option<usize>,
    pub allow_screen_shots: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOptionView {
    pub text: String,
    pub color: String,
    pub votes: u64,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadDetails {
    pub thread_title: String,
    pub thread_subtitle: String,
    pub thread_body: String,
    pub thread_tags: String,
    pub thread_image_key: Option<String>,
    pub thread_image_description: Option<String>,
    pub thread_nsfw: bool,
    pub thread_nsfl: bool,
    pub category_id: Id<CategoryMarker>,
    pub category_title: String,
    pub category_image_key: Option<String>,
}

/// One page of a feed. Never longer than the page size of the composer that built it.
#[derive(Clone, Eq, PartialEq, Debug, Default, Serialize)]
#[serde(transparent)]
pub struct FeedPage(Vec<PostView>);

impl FeedPage {
    #[must_use]
    pub fn new(posts: Vec<PostView>) -> Self {
        Self(posts)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn posts(&self) -> &[PostView] {
        &self.0
    }

    pub fn ids(&self) -> impl Iterator<Item = Id<PostMarker>> + '_ {
        self.0.iter().map(|post| post.id)
    }
}
