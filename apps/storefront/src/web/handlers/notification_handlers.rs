// storefront/src/web/handlers/notification_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::Caller;
use crate::web::sse;

#[instrument(name = "handler::list_notifications", skip_all, fields(user_id = %caller.user_id))]
pub async fn list_notifications_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
) -> Result<HttpResponse, AppError> {
  let (notifications, unread) = app_state.storefront.notifications.page(&caller).await?;
  Ok(HttpResponse::Ok().json(json!({
    "notifications": notifications,
    "unreadCount": unread,
  })))
}

#[instrument(name = "handler::mark_notification_read", skip(app_state, caller), fields(user_id = %caller.user_id))]
pub async fn mark_read_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let marked = app_state.storefront.notifications.mark_read(&caller, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "marked": marked })))
}

#[instrument(name = "handler::mark_all_notifications_read", skip_all, fields(user_id = %caller.user_id))]
pub async fn mark_all_read_handler(app_state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse, AppError> {
  let marked = app_state.storefront.notifications.mark_all_read(&caller).await?;
  Ok(HttpResponse::Ok().json(json!({ "marked": marked })))
}

#[instrument(name = "handler::delete_notification", skip(app_state, caller), fields(user_id = %caller.user_id))]
pub async fn delete_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let deleted = app_state.storefront.notifications.delete(&caller, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "deleted": deleted })))
}

#[instrument(name = "handler::notification_stream", skip_all, fields(user_id = %caller.user_id))]
pub async fn notification_stream_handler(app_state: web::Data<AppState>, caller: Caller) -> HttpResponse {
  sse::event_stream(app_state.storefront.notifications.subscribe(&caller))
}
