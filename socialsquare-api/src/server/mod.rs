use axum::{
    Router,
    extract::{FromRef, Request, rejection::JsonRejection},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::typed_header::TypedHeaderRejection;
use json::Json;
use serde::Serialize;
use socialsquare_feed::{FeedEngine, FeedError, FeedErrorKind};
use std::{future::Future, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::error;

mod json;
mod routes;
mod viewer;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, FromRef)]
pub struct ServerState {
    pub engine: Arc<FeedEngine>,
    pub feed_timeout: FeedTimeout,
}

/// Upper bound on the time one feed request may spend in the engine.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct FeedTimeout(pub Duration);

impl FeedTimeout {
    pub async fn run<F: Future>(self, future: F) -> Result<F::Output> {
        tokio::time::timeout(self.0, future)
            .await
            .map_err(|_| ServerError::Timeout(self.0))
    }
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Viewer header was missing or invalid: {0}")]
    InvalidViewerHeader(TypedHeaderRejection),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error("Composing the feed took longer than {0:?}")]
    Timeout(Duration),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidViewerHeader(_) => StatusCode::UNAUTHORIZED,
            ServerError::JsonRejection(_) => StatusCode::BAD_REQUEST,
            ServerError::Feed(error) => match error.kind() {
                FeedErrorKind::BadInput => StatusCode::BAD_REQUEST,
                FeedErrorKind::NotFound => StatusCode::NOT_FOUND,
                FeedErrorKind::Server => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::JsonResponse(_) | ServerError::Timeout(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// What the client gets to read. Server side failures stay opaque.
    fn public_message(&self, status: StatusCode) -> String {
        if status.is_server_error() {
            "An error occurred. Please try again.".to_owned()
        } else {
            self.to_string()
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
struct ErrorResponse {
    status: u16,
    message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(error = %self, %status, "Replying with error");

        let error_response = ErrorResponse {
            status: status.as_u16(),
            message: self.public_message(status),
        };
        (status, Json(error_response)).into_response()
    }
}

/// Body of every successful reply.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Success<T> {
    status: &'static str,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T> Success<T> {
    pub fn new(message: &'static str, data: T) -> Self {
        Self {
            status: "SUCCESS",
            message,
            data: Some(data),
        }
    }

    pub fn message(message: &'static str) -> Self {
        Self {
            status: "SUCCESS",
            message,
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ServerError, Success};
    use axum::http::StatusCode;
    use serde_json::json;
    use socialsquare_common::model::{Id, post::PostKind};
    use socialsquare_feed::FeedError;
    use std::time::Duration;

    #[test]
    fn feed_error_statuses() {
        let cases = [
            (FeedError::FollowsNoOne, StatusCode::BAD_REQUEST),
            (FeedError::NoValidPosts, StatusCode::BAD_REQUEST),
            (FeedError::ViewerNotFound(Id::new(1)), StatusCode::NOT_FOUND),
            (
                FeedError::PostNotFound(Id::new(2), PostKind::Poll),
                StatusCode::NOT_FOUND,
            ),
            (FeedError::NoFollowedPosts, StatusCode::NOT_FOUND),
            (FeedError::NoUnseenPosts, StatusCode::NOT_FOUND),
            (FeedError::ImagesUnavailable, StatusCode::NOT_FOUND),
        ];

        for (error, status) in cases {
            assert_eq!(ServerError::from(error).status(), status);
        }
    }

    #[test]
    fn server_errors_stay_opaque() {
        let timeout = ServerError::Timeout(Duration::from_secs(10));
        let status = timeout.status();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!timeout.public_message(status).contains("10s"));

        let not_found = ServerError::from(FeedError::FollowsNoOne);
        assert_eq!(
            not_found.public_message(not_found.status()),
            FeedError::FollowsNoOne.to_string()
        );
    }

    #[test]
    fn success_body() {
        assert_eq!(
            serde_json::to_value(Success::new("Found posts", [1, 2])).unwrap(),
            json!({ "status": "SUCCESS", "message": "Found posts", "data": [1, 2] })
        );
        assert_eq!(
            serde_json::to_value(Success::<()>::message("Viewed")).unwrap(),
            json!({ "status": "SUCCESS", "message": "Viewed" })
        );
    }
}
