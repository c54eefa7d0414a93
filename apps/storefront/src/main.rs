// storefront/src/main.rs

mod config;
mod db;
mod errors;
mod services;
mod state;
mod web;

use crate::config::{AppConfig, LogFormat};
use crate::db::PgStore;
use crate::errors::AppError;
use crate::services::HttpOrderWebhook;
use crate::state::AppState;

use actix_web::{web::Data, App, HttpServer};
use bagworks::{DisabledWebhook, OrderWebhook, RealtimeHub, Storefront};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

fn init_tracing(format: LogFormat) {
  let builder = tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

fn order_webhook(config: &AppConfig) -> Result<Arc<dyn OrderWebhook>, AppError> {
  match &config.order_webhook_url {
    Some(url) => {
      let webhook = HttpOrderWebhook::new(url.clone(), config.order_webhook_token.clone())
        .map_err(|e| AppError::Config(format!("Could not build the order webhook client: {}", e)))?;
      info!(%url, "Order webhook enabled.");
      Ok(Arc::new(webhook))
    }
    None => {
      warn!("ORDER_WEBHOOK_URL is not set; order webhooks are disabled.");
      Ok(Arc::new(DisabledWebhook))
    }
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  let app_config = AppConfig::from_env()?;
  init_tracing(app_config.log_format);
  info!("Starting storefront server...");

  let db_pool = db::connect(&app_config.database_url, app_config.database_max_connections).await?;
  if app_config.run_migrations {
    db::run_migrations(&db_pool).await?;
  }

  let hub = RealtimeHub::default();
  let stores = PgStore::new(db_pool.clone(), hub.clone()).into_stores();
  let storefront = Storefront::new(stores, hub, order_webhook(&app_config)?, app_config.to_settings());

  let outbox_worker = tokio::spawn(storefront.outbox_processor.clone().run());

  let app_state = AppState {
    db_pool,
    storefront: storefront.clone(),
    config: Arc::new(app_config.clone()),
  };

  let bind_address = (app_config.server_host.clone(), app_config.server_port);
  info!("Server listening on http://{}:{}", bind_address.0, bind_address.1);

  HttpServer::new(move || {
    App::new()
      .app_data(Data::new(app_state.clone()))
      .wrap(TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(bind_address)?
  .run()
  .await?;

  // Deliver what is still queued before exiting.
  outbox_worker.abort();
  let report = storefront.outbox_processor.process_pending().await;
  info!(delivered = report.delivered, dead = report.dead, "Outbox drained on shutdown.");
  Ok(())
}
