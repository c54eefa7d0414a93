// storefront/src/web/handlers/admin_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::Caller;

#[instrument(name = "handler::admin_stats", skip_all, fields(user_id = %caller.user_id))]
pub async fn stats_handler(app_state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse, AppError> {
  let stats = app_state.storefront.dashboard.stats(&caller).await?;
  Ok(HttpResponse::Ok().json(stats))
}

#[instrument(name = "handler::admin_customers", skip_all, fields(user_id = %caller.user_id))]
pub async fn customers_handler(app_state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse, AppError> {
  let customers = app_state.storefront.dashboard.customers(&caller).await?;
  Ok(HttpResponse::Ok().json(json!({ "customers": customers })))
}
