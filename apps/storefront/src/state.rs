// storefront/src/state.rs
use crate::config::AppConfig;
use bagworks::Storefront;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub storefront: Storefront,
  pub config: Arc<AppConfig>,
}
