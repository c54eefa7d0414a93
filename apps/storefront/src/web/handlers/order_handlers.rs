// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use bagworks::{DirectOrderRequest, OrderStatus, OrderTimeline, OrderWithItems};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::Caller;

#[derive(Deserialize, Debug)]
pub struct StatusChangePayload {
  pub status: String,
}

fn placed_response(placed: &OrderWithItems) -> HttpResponse {
  HttpResponse::Created().json(json!({
    "order": placed,
    "timeline": OrderTimeline::for_order(&placed.order),
  }))
}

/// Turns the caller's cart into a pending order.
#[instrument(name = "handler::checkout", skip_all, fields(user_id = %caller.user_id))]
pub async fn checkout_handler(app_state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse, AppError> {
  let placed = app_state.storefront.orders.place_order(&caller).await?;
  info!(order_id = %placed.order.id, lines = placed.items.len(), "Checkout completed.");
  Ok(placed_response(&placed))
}

#[instrument(
  name = "handler::direct_order",
  skip(app_state, caller, payload),
  fields(user_id = %caller.user_id, product_id = %payload.product_id)
)]
pub async fn direct_order_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  payload: web::Json<DirectOrderRequest>,
) -> Result<HttpResponse, AppError> {
  let placed = app_state
    .storefront
    .orders
    .place_direct_order(&caller, payload.into_inner())
    .await?;
  info!(order_id = %placed.order.id, "Direct order placed.");
  Ok(placed_response(&placed))
}

#[instrument(name = "handler::list_orders", skip_all, fields(user_id = %caller.user_id))]
pub async fn list_orders_handler(app_state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse, AppError> {
  let orders = app_state.storefront.orders.list_orders(&caller).await?;
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}

#[instrument(name = "handler::get_order", skip(app_state, caller), fields(user_id = %caller.user_id))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let found = app_state.storefront.orders.get_order(&caller, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
    "order": found,
    "timeline": OrderTimeline::for_order(&found.order),
  })))
}

#[instrument(
  name = "handler::set_order_status",
  skip(app_state, caller, payload),
  fields(user_id = %caller.user_id, status = %payload.status)
)]
pub async fn set_status_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<Uuid>,
  payload: web::Json<StatusChangePayload>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let status = payload
    .status
    .parse::<OrderStatus>()
    .map_err(|e| AppError::Validation(e.to_string()))?;
  match app_state.storefront.status.set_status(&caller, order_id, status).await? {
    Some(order) => Ok(HttpResponse::Ok().json(json!({ "order": order }))),
    None => {
      warn!(%order_id, "Status change for an order that no longer exists.");
      Err(AppError::NotFound(format!("order {}", order_id)))
    }
  }
}
