use crate::server::{FeedTimeout, Result, ServerRouter, Success, json::Json, viewer::Viewer};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use serde::Deserialize;
use socialsquare_common::model::{
    Id,
    post::{PostKind, PostMarker},
    view::FeedPage,
};
use socialsquare_feed::{Exposure, FeedEngine};
use std::{collections::HashSet, sync::Arc};
use tracing::debug;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(following_feed)
        .typed_post(for_you_feed)
        .typed_post(viewed)
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedRequest {
    /// Comma separated ids of the posts the client already shows.
    #[serde(default)]
    already_on_current_feed: String,
}

impl FeedRequest {
    /// Tokens that are not post ids could never match a post and are skipped.
    fn rendered_ids(&self) -> HashSet<Id<PostMarker>> {
        self.already_on_current_feed
            .split(',')
            .filter_map(|token| token.trim().parse().ok())
            .collect()
    }
}

#[derive(TypedPath)]
#[typed_path("/feed/following")]
struct FollowingFeedPath;

async fn following_feed(
    _: FollowingFeedPath,
    Viewer(viewer): Viewer,
    State(engine): State<Arc<FeedEngine>>,
    State(timeout): State<FeedTimeout>,
    Json(request): Json<FeedRequest>,
) -> Result<Json<Success<FeedPage>>> {
    let rendered = request.rendered_ids();
    debug!(%viewer, rendered = rendered.len(), "Composing following feed");

    let page = timeout
        .run(engine.compose_follower_feed(viewer, &rendered))
        .await??;

    Ok(Json(Success::new("Found posts", page)))
}

#[derive(TypedPath)]
#[typed_path("/feed/for-you")]
struct ForYouFeedPath;

async fn for_you_feed(
    _: ForYouFeedPath,
    Viewer(viewer): Viewer,
    State(engine): State<Arc<FeedEngine>>,
    State(timeout): State<FeedTimeout>,
    Json(request): Json<FeedRequest>,
) -> Result<Json<Success<FeedPage>>> {
    let rendered = request.rendered_ids();
    debug!(%viewer, rendered = rendered.len(), "Composing for-you feed");

    let page = timeout
        .run(engine.compose_personalized_feed(viewer, &rendered))
        .await??;

    Ok(Json(Success::new("Found posts", page)))
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewedRequest {
    post_id: Id<PostMarker>,
    post_format: PostKind,
}

#[derive(TypedPath)]
#[typed_path("/feed/viewed")]
struct ViewedPath;

async fn viewed(
    _: ViewedPath,
    Viewer(viewer): Viewer,
    State(engine): State<Arc<FeedEngine>>,
    Json(request): Json<ViewedRequest>,
) -> Result<Json<Success<()>>> {
    let Exposure::Viewed { amount } = engine
        .register_view(viewer, request.post_id, request.post_format)
        .await?;
    debug!(%viewer, post = %request.post_id, amount, "Post viewed");

    Ok(Json(Success::message("Viewed")))
}
