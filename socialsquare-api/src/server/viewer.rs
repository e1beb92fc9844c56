use crate::server::ServerError;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::TypedHeader;
use headers::{Header, HeaderName, HeaderValue};
use socialsquare_common::model::{Id, user::UserMarker};
use std::iter;

static VIEWER_ID: HeaderName = HeaderName::from_static("x-viewer-id");

/// `x-viewer-id`, the internal id of the user the authenticating gateway admitted.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct ViewerIdHeader(Id<UserMarker>);

impl Header for ViewerIdHeader {
    fn name() -> &'static HeaderName {
        &VIEWER_ID
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        if values.next().is_some() {
            return Err(headers::Error::invalid());
        }

        value
            .to_str()
            .ok()
            .and_then(|value| value.trim().parse().ok())
            .map(Self)
            .ok_or_else(headers::Error::invalid)
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        values.extend(iter::once(HeaderValue::from(self.0.get())));
    }
}

/// The requesting viewer.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct Viewer(pub Id<UserMarker>);

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(ViewerIdHeader(id)) =
            TypedHeader::<ViewerIdHeader>::from_request_parts(parts, state)
                .await
                .map_err(ServerError::InvalidViewerHeader)?;

        Ok(Self(id))
    }
}
