//! PostgreSQL storage for SocialSquare feeds.

mod client;
mod record;
mod store;

pub use client::{DbClient, DbError, Result};
pub use store::PgPostStore;
