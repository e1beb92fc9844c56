use crate::server::ServerRouter;
use axum::Router;

mod feed;

pub fn routes() -> ServerRouter {
    Router::new().merge(feed::routes())
}
