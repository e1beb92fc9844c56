//! Candidate selection for the for-you feed.
//!
//! The composer treats [`RankingOracle`] as a black box. [`EngagementRanking`] is the default
//! oracle: recent image posts ordered by their vote score, total views and recency, leaving
//! out posts the viewer was shown too often already.

use crate::store::{StoreError, StoreResult};
use async_trait::async_trait;
use socialsquare_common::model::{
    Id,
    post::PostMarker,
    user::{PublicId, User},
};
use std::{collections::HashSet, sync::Arc};
use thiserror::Error;
use time::UtcDateTime;
use tracing::debug;

/// Exposure amount above which a post is no longer recommended to a viewer.
pub const SEEN_TOO_MUCH: u32 = 5;

#[derive(Debug, Error)]
pub enum RankingError {
    #[error("Loading ranking candidates failed: {0}")]
    Candidates(#[from] StoreError),
    #[error("The ranking oracle failed: {0}")]
    Oracle(String),
}

#[async_trait]
pub trait RankingOracle: Send + Sync {
    /// Ordered ids of at most `page_size` image posts for `viewer`, none of them in `exclude`.
    async fn rank(
        &self,
        viewer: &User,
        exclude: &HashSet<Id<PostMarker>>,
        page_size: usize,
    ) -> Result<Vec<Id<PostMarker>>, RankingError>;
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct RankingCandidate {
    pub id: Id<PostMarker>,
    pub date_posted: UtcDateTime,
    /// Upvotes minus downvotes.
    pub score: i64,
    /// Exposures summed over all viewers.
    pub total_views: u64,
    /// Exposures of the viewer the candidate was loaded for.
    pub viewer_exposure: u32,
}

#[async_trait]
pub trait RankingCandidates: Send + Sync {
    /// The `limit` most recent image posts.
    async fn recent_image_candidates(
        &self,
        viewer: PublicId,
        limit: usize,
    ) -> StoreResult<Vec<RankingCandidate>>;
}

pub struct EngagementRanking {
    candidates: Arc<dyn RankingCandidates>,
    candidate_limit: usize,
}

impl EngagementRanking {
    #[must_use]
    pub fn new(candidates: Arc<dyn RankingCandidates>, candidate_limit: usize) -> Self {
        Self {
            candidates,
            candidate_limit,
        }
    }
}

#[async_trait]
impl RankingOracle for EngagementRanking {
    async fn rank(
        &self,
        viewer: &User,
        exclude: &HashSet<Id<PostMarker>>,
        page_size: usize,
    ) -> Result<Vec<Id<PostMarker>>, RankingError> {
        let candidates = self
            .candidates
            .recent_image_candidates(viewer.public_id, self.candidate_limit)
            .await?;
        debug!(viewer = %viewer.public_id, candidates = candidates.len(), "Ranking candidates");

        Ok(order_candidates(candidates, exclude, page_size))
    }
}

fn order_candidates(
    mut candidates: Vec<RankingCandidate>,
    exclude: &HashSet<Id<PostMarker>>,
    page_size: usize,
) -> Vec<Id<PostMarker>> {
    candidates.retain(|candidate| {
        candidate.viewer_exposure <= SEEN_TOO_MUCH && !exclude.contains(&candidate.id)
    });
    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(b.total_views.cmp(&a.total_views))
            .then(b.date_posted.cmp(&a.date_posted))
    });

    candidates
        .into_iter()
        .take(page_size)
        .map(|candidate| candidate.id)
        .collect()
}
