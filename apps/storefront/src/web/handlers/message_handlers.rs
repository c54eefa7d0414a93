// storefront/src/web/handlers/message_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::Caller;
use crate::web::sse;

#[derive(Deserialize, Debug)]
pub struct SendMessagePayload {
  pub message: String,
  /// Defaults to the caller's counterpart on this order.
  pub recipient_id: Option<Uuid>,
}

#[instrument(name = "handler::list_messages", skip(app_state, caller), fields(user_id = %caller.user_id))]
pub async fn list_messages_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let messaging = &app_state.storefront.messaging;
  let messages = messaging.list_messages(&caller, order_id).await?;
  let unread = messaging.unread_count(&caller, order_id).await?;
  // No counterpart means sending is disabled for this caller.
  let counterpart = messaging.resolve_counterpart(&caller, order_id).await?;
  Ok(HttpResponse::Ok().json(json!({
    "messages": messages,
    "unreadCount": unread,
    "counterpartId": counterpart,
  })))
}

#[instrument(name = "handler::send_message", skip(app_state, caller, payload), fields(user_id = %caller.user_id))]
pub async fn send_message_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<Uuid>,
  payload: web::Json<SendMessagePayload>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let messaging = &app_state.storefront.messaging;
  let sent = match payload.recipient_id {
    Some(recipient_id) => messaging.send(&caller, order_id, recipient_id, &payload.message).await?,
    None => messaging.send_to_counterpart(&caller, order_id, &payload.message).await?,
  };
  info!(message_id = %sent.id, %order_id, "Message sent.");
  Ok(HttpResponse::Created().json(sent))
}

#[instrument(name = "handler::mark_thread_read", skip(app_state, caller), fields(user_id = %caller.user_id))]
pub async fn mark_thread_read_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let marked = app_state
    .storefront
    .messaging
    .mark_thread_read(&caller, path.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(json!({ "marked": marked })))
}

#[instrument(name = "handler::message_stream", skip(app_state, caller), fields(user_id = %caller.user_id))]
pub async fn message_stream_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let subscription = app_state.storefront.messaging.subscribe(&caller, path.into_inner()).await?;
  Ok(sse::event_stream(subscription))
}
