// storefront/src/db/mod.rs

//! Postgres implementations of the storefront's collaborator traits.
//!
//! One [`PgStore`] backs every seam. Queries use runtime `query_as` with the
//! row structs in [`rows`]; notification and message inserts are published
//! on the realtime hub once they have committed.

pub mod accounts;
pub mod inbox;
pub mod orders;
pub mod rows;

use bagworks::{RealtimeHub, Stores};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
  hub: RealtimeHub,
}

impl PgStore {
  pub fn new(pool: PgPool, hub: RealtimeHub) -> Self {
    Self { pool, hub }
  }

  pub fn into_stores(self) -> Stores {
    Stores::from_single(Arc::new(self))
  }
}

pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
  let pool = PgPoolOptions::new()
    .max_connections(max_connections)
    .connect(database_url)
    .await?;
  info!(max_connections, "Database pool ready.");
  Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
  sqlx::migrate!("./migrations").run(pool).await?;
  info!("Database migrations applied.");
  Ok(())
}
