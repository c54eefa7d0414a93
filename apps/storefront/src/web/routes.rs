// storefront/src/web/routes.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::warn;

use crate::state::AppState;
use crate::web::handlers::{
  admin_handlers, cart_handlers, catalog_handlers, message_handlers, notification_handlers, order_handlers,
  profile_handlers,
};

/// Liveness plus a database round trip.
async fn health_check_handler(app_state: web::Data<AppState>) -> HttpResponse {
  match sqlx::query("SELECT 1").execute(&app_state.db_pool).await {
    Ok(_) => HttpResponse::Ok().json(json!({
      "status": "ok",
      "outboxPending": app_state.storefront.outbox.pending_len(),
      "orderWebhook": app_state.config.order_webhook_url.is_some(),
    })),
    Err(e) => {
      warn!(error = %e, "Health check could not reach the database.");
      HttpResponse::ServiceUnavailable().json(json!({ "status": "degraded" }))
    }
  }
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/products")
          .route("", web::get().to(catalog_handlers::list_products_handler))
          .route("/{product_id}", web::get().to(catalog_handlers::get_product_handler))
          .route("/{product_id}/quote", web::post().to(catalog_handlers::request_quote_handler)),
      )
      .service(
        web::resource("/profile")
          .route(web::get().to(profile_handlers::get_profile_handler))
          .route(web::put().to(profile_handlers::upsert_profile_handler)),
      )
      .service(
        web::resource("/profile/preferences")
          .route(web::get().to(profile_handlers::get_preferences_handler))
          .route(web::put().to(profile_handlers::save_preferences_handler)),
      )
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::list_cart_handler))
          .route("", web::post().to(cart_handlers::add_to_cart_handler))
          .route("", web::delete().to(cart_handlers::clear_cart_handler))
          // Registered before `/{item_id}` so it isn't taken for an item id.
          .route("/checkout-readiness", web::get().to(cart_handlers::checkout_readiness_handler))
          .route("/{item_id}", web::patch().to(cart_handlers::set_quantity_handler))
          .route("/{item_id}", web::delete().to(cart_handlers::remove_item_handler)),
      )
      .route("/checkout", web::post().to(order_handlers::checkout_handler))
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::direct_order_handler))
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route("/{order_id}/status", web::patch().to(order_handlers::set_status_handler))
          .route("/{order_id}/messages", web::get().to(message_handlers::list_messages_handler))
          .route("/{order_id}/messages", web::post().to(message_handlers::send_message_handler))
          .route("/{order_id}/messages/read", web::post().to(message_handlers::mark_thread_read_handler))
          .route("/{order_id}/messages/stream", web::get().to(message_handlers::message_stream_handler)),
      )
      .service(
        web::scope("/notifications")
          .route("", web::get().to(notification_handlers::list_notifications_handler))
          .route("/stream", web::get().to(notification_handlers::notification_stream_handler))
          .route("/read-all", web::post().to(notification_handlers::mark_all_read_handler))
          .route("/{notification_id}/read", web::post().to(notification_handlers::mark_read_handler))
          .route("/{notification_id}", web::delete().to(notification_handlers::delete_handler)),
      )
      .service(
        web::scope("/admin")
          .route("/stats", web::get().to(admin_handlers::stats_handler))
          .route("/customers", web::get().to(admin_handlers::customers_handler)),
      ),
  );
}

