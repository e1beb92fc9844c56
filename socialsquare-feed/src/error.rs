use crate::{ranking::RankingError, store::StoreError};
use socialsquare_common::model::{
    Id,
    post::{PostKind, PostMarker},
    user::UserMarker,
};
use thiserror::Error;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum FeedErrorKind {
    BadInput,
    NotFound,
    Server,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Could not find user with id {0}.")]
    ViewerNotFound(Id<UserMarker>),
    #[error("Could not find {1} post with id {0}.")]
    PostNotFound(Id<PostMarker>, PostKind),
    #[error("You do not follow anyone.")]
    FollowsNoOne,
    #[error("There are no posts from anyone you follow.")]
    NoFollowedPosts,
    #[error("There are no more posts that you have not seen multiple times already.")]
    NoUnseenPosts,
    #[error("Images could not be obtained.")]
    ImagesUnavailable,
    #[error("No valid posts.")]
    NoValidPosts,
    #[error(transparent)]
    Ranking(#[from] RankingError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FeedError {
    #[must_use]
    pub fn kind(&self) -> FeedErrorKind {
        match self {
            FeedError::FollowsNoOne | FeedError::NoValidPosts => FeedErrorKind::BadInput,
            FeedError::ViewerNotFound(_)
            | FeedError::PostNotFound(..)
            | FeedError::NoFollowedPosts
            | FeedError::NoUnseenPosts
            | FeedError::ImagesUnavailable => FeedErrorKind::NotFound,
            FeedError::Ranking(_) | FeedError::Store(_) => FeedErrorKind::Server,
        }
    }
}
