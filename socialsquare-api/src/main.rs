use serde::Deserialize;
use server::{FeedTimeout, ServerState};
use socialsquare_db::DbClient;
use socialsquare_feed::{FeedEngine, FeedStores, ranking::EngagementRanking};
use sqlx::{migrate::MigrateError, postgres::PgPoolOptions};
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::Duration,
};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod server;

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Error connecting to the database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Error migrating the database: {0}")]
    Migrate(#[from] MigrateError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Env {
    server_address: IpAddr,
    server_port: u16,
    database_url: String,
    #[serde(default = "default_database_max_connections")]
    database_max_connections: u32,
    #[serde(default = "default_feed_timeout_ms")]
    feed_timeout_ms: u64,
    #[serde(default = "default_ranking_candidate_limit")]
    ranking_candidate_limit: usize,
}

fn default_database_max_connections() -> u32 {
    10
}

fn default_feed_timeout_ms() -> u64 {
    10_000
}

fn default_ranking_candidate_limit() -> usize {
    200
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "socialsquare_api=debug,\
                socialsquare_feed=debug,\
                socialsquare_db=debug,\
                tower_http=debug,axum::rejection=trace,sqlx=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

fn feed_engine(db: &DbClient, ranking_candidate_limit: usize) -> FeedEngine {
    let oracle = EngagementRanking::new(Arc::new(db.clone()), ranking_candidate_limit);

    FeedEngine::new(FeedStores {
        users: Arc::new(db.clone()),
        posts: db.post_repository(),
        engagement: Arc::new(db.clone()),
        oracle: Arc::new(oracle),
    })
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "Could not listen for the shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(env.database_max_connections)
        .connect(&env.database_url)
        .await?;
    let db = DbClient::new(pool);
    db.migrate().await?;

    let state = ServerState {
        engine: Arc::new(feed_engine(&db, env.ranking_candidate_limit)),
        feed_timeout: FeedTimeout(Duration::from_millis(env.feed_timeout_ms)),
    };

    let tracing_layer = TraceLayer::new_for_http();
    let app = server::routes().with_state(state).layer(tracing_layer);

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Serving feeds");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}
