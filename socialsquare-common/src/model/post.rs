use crate::model::{
    Id,
    user::{PublicId, UserMarker},
};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};
use thiserror::Error;
use time::UtcDateTime;

pub const POLL_MAX_OPTIONS: usize = 6;

/// Exposure amount from which a viewer counts as having seen a post.
pub const SEEN_THRESHOLD: u32 = 2;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CategoryMarker;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Deserialize, Serialize)]
pub enum PostKind {
    Image,
    Poll,
    Thread,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Unknown post format: {0}")]
pub struct InvalidPostKindError(String);

impl PostKind {
    pub const ALL: [PostKind; 3] = [PostKind::Image, PostKind::Poll, PostKind::Thread];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PostKind::Image => "Image",
            PostKind::Poll => "Poll",
            PostKind::Thread => "Thread",
        }
    }
}

impl Display for PostKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostKind {
    type Err = InvalidPostKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PostKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| InvalidPostKindError(s.to_owned()))
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct ViewRecord {
    pub viewer: PublicId,
    pub amount: u32,
}

/// Per viewer exposure counters of one post. Holds at most one record per viewer.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct ViewedBy(Vec<ViewRecord>);

impl ViewedBy {
    #[must_use]
    pub fn amount_for(&self, viewer: PublicId) -> u32 {
        self.0
            .iter()
            .find(|record| record.viewer == viewer)
            .map_or(0, |record| record.amount)
    }

    /// Appends a record with amount 1 or increments the existing one. Returns the new amount.
    pub fn record_exposure(&mut self, viewer: PublicId) -> u32 {
        if let Some(record) = self.0.iter_mut().find(|record| record.viewer == viewer) {
            record.amount = record.amount.saturating_add(1);
            record.amount
        } else {
            self.0.push(ViewRecord { viewer, amount: 1 });
            1
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViewRecord> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ViewRecord> for ViewedBy {
    /// Duplicate viewers collapse into one record keeping the larger amount.
    fn from_iter<T: IntoIterator<Item = ViewRecord>>(iter: T) -> Self {
        let mut viewed_by = Self::default();
        for record in iter {
            match viewed_by.0.iter_mut().find(|r| r.viewer == record.viewer) {
                Some(existing) => existing.amount = existing.amount.max(record.amount),
                None => viewed_by.0.push(record),
            }
        }
        viewed_by
    }
}

/// Lightweight projection used to order and partition feed candidates.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct PostStub {
    pub id: Id<PostMarker>,
    pub kind: PostKind,
    pub date_posted: Option<UtcDateTime>,
    pub viewed_by: ViewedBy,
    /// Whether the viewer the stub was loaded for has voted on the post.
    pub interacted: bool,
}

impl PostStub {
    #[must_use]
    pub fn is_seen_by(&self, viewer: PublicId) -> bool {
        self.interacted || self.viewed_by.amount_for(viewer) >= SEEN_THRESHOLD
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub creator_id: Id<UserMarker>,
    pub date_posted: UtcDateTime,
    pub content: PostContent,
}

impl Post {
    #[must_use]
    pub fn kind(&self) -> PostKind {
        self.content.kind()
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum PostContent {
    Image(ImageContent),
    Poll(PollContent),
    Thread(ThreadContent),
}

impl PostContent {
    #[must_use]
    pub fn kind(&self) -> PostKind {
        match self {
            PostContent::Image(_) => PostKind::Image,
            PostContent::Poll(_) => PostKind::Poll,
            PostContent::Thread(_) => PostKind::Thread,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct ImageContent {
    pub image_key: String,
    pub title: String,
    pub description: String,
    pub allow_screenshots: bool,
    pub tags: Vec<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PollContent {
    pub title: String,
    pub subtitle: String,
    pub options: Vec<PollOption>,
    pub allow_screenshots: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PollOption {
    pub text: String,
    pub color: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct ThreadContent {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub tags: String,
    pub category_id: Id<CategoryMarker>,
    pub image: Option<ThreadImage>,
    pub nsfw: bool,
    pub nsfl: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct ThreadImage {
    pub key: String,
    pub description: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct Category {
    pub id: Id<CategoryMarker>,
    pub title: String,
    pub image_key: Option<String>,
}
