// storefront/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use bagworks::Customization;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::Caller;

#[derive(Deserialize, Debug)]
pub struct AddToCartPayload {
  pub product_id: Uuid,
  pub size: Option<String>,
  pub quantity: i32,
  #[serde(default)]
  pub customization: Customization,
}

#[derive(Deserialize, Debug)]
pub struct SetQuantityPayload {
  pub quantity: i32,
}

#[instrument(name = "handler::list_cart", skip_all, fields(user_id = %caller.user_id))]
pub async fn list_cart_handler(app_state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse, AppError> {
  let items = app_state.storefront.cart.list(&caller).await?;
  Ok(HttpResponse::Ok().json(json!({ "items": items })))
}

#[instrument(
  name = "handler::add_to_cart",
  skip(app_state, caller, payload),
  fields(user_id = %caller.user_id, product_id = %payload.product_id, quantity = payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  payload: web::Json<AddToCartPayload>,
) -> Result<HttpResponse, AppError> {
  let AddToCartPayload {
    product_id,
    size,
    quantity,
    customization,
  } = payload.into_inner();
  let item = app_state
    .storefront
    .cart
    .add_product(&caller, product_id, size.as_deref(), quantity, customization)
    .await?;
  info!(cart_item_id = %item.id, "Item added to cart.");
  Ok(HttpResponse::Created().json(json!({ "cartItem": item })))
}

#[instrument(name = "handler::set_cart_quantity", skip(app_state, caller, payload), fields(user_id = %caller.user_id))]
pub async fn set_quantity_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<Uuid>,
  payload: web::Json<SetQuantityPayload>,
) -> Result<HttpResponse, AppError> {
  let updated = app_state
    .storefront
    .cart
    .set_quantity(&caller, path.into_inner(), payload.quantity)
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "cartItem": updated })))
}

#[instrument(name = "handler::remove_cart_item", skip(app_state, caller), fields(user_id = %caller.user_id))]
pub async fn remove_item_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let removed = app_state.storefront.cart.remove(&caller, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "removed": removed })))
}

#[instrument(name = "handler::clear_cart", skip_all, fields(user_id = %caller.user_id))]
pub async fn clear_cart_handler(app_state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse, AppError> {
  let removed = app_state.storefront.cart.clear(&caller).await?;
  Ok(HttpResponse::Ok().json(json!({ "removed": removed })))
}

#[instrument(name = "handler::checkout_readiness", skip_all, fields(user_id = %caller.user_id))]
pub async fn checkout_readiness_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
) -> Result<HttpResponse, AppError> {
  let readiness = app_state.storefront.cart.checkout_precondition(&caller).await?;
  Ok(HttpResponse::Ok().json(readiness))
}
