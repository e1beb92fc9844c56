use crate::{engine::FeedEngine, error::FeedError};
use socialsquare_common::model::{
    Id,
    post::{PostKind, PostMarker},
    user::UserMarker,
};
use tracing::debug;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Exposure {
    /// The exposure was recorded; `amount` is the viewer's counter after the increment.
    Viewed { amount: u32 },
}

impl FeedEngine {
    /// Counts one more exposure of a post to a viewer.
    ///
    /// This is a counter, not a flag: every call increments.
    pub async fn register_view(
        &self,
        viewer_id: Id<UserMarker>,
        post_id: Id<PostMarker>,
        kind: PostKind,
    ) -> Result<Exposure, FeedError> {
        let viewer = self
            .users
            .user_by_id(viewer_id)
            .await?
            .ok_or(FeedError::ViewerNotFound(viewer_id))?;

        let amount = self
            .posts
            .store(kind)
            .increment_exposure(post_id, viewer.public_id)
            .await?
            .ok_or(FeedError::PostNotFound(post_id, kind))?;

        debug!(viewer = %viewer.public_id, post = %post_id, %kind, amount, "Recorded exposure");
        Ok(Exposure::Viewed { amount })
    }
}
