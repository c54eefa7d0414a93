// storefront/src/config.rs

use crate::errors::{AppError, Result};
use bagworks::outbox::DEFAULT_DEAD_LETTER_LIMIT;
use bagworks::{RetryPolicy, StorefrontSettings};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub database_max_connections: u32,
  pub run_migrations: bool,

  /// Absent means the order webhook is disabled.
  pub order_webhook_url: Option<String>,
  pub order_webhook_token: Option<String>,
  pub whatsapp_business_number: Option<String>,

  pub default_lead_time_days: i32,
  pub notification_page_size: i64,
  pub outbox_max_attempts: u32,
  pub outbox_retry_base_ms: u64,
  pub outbox_dead_letter_limit: usize,

  pub log_format: LogFormat,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any variable source. Blank values count as unset.
  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let server_host = get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parse_or(&get, "SERVER_PORT", 8080u16)?;
    let database_url =
      get("DATABASE_URL").ok_or_else(|| AppError::Config("Missing environment variable 'DATABASE_URL'".to_string()))?;
    let database_max_connections = parse_or(&get, "DATABASE_MAX_CONNECTIONS", 5u32)?;
    let run_migrations = parse_or(&get, "RUN_MIGRATIONS", true)?;

    let default_lead_time_days = parse_or(&get, "DEFAULT_LEAD_TIME_DAYS", 7i32)?;
    if default_lead_time_days < 1 {
      return Err(AppError::Config("DEFAULT_LEAD_TIME_DAYS must be at least 1".to_string()));
    }
    let notification_page_size = parse_or(&get, "NOTIFICATION_PAGE_SIZE", 50i64)?;
    if notification_page_size < 1 {
      return Err(AppError::Config("NOTIFICATION_PAGE_SIZE must be at least 1".to_string()));
    }
    let outbox_max_attempts = parse_or(&get, "OUTBOX_MAX_ATTEMPTS", 3u32)?;
    if outbox_max_attempts == 0 {
      return Err(AppError::Config("OUTBOX_MAX_ATTEMPTS must be at least 1".to_string()));
    }
    let outbox_retry_base_ms = parse_or(&get, "OUTBOX_RETRY_BASE_MS", 1000u64)?;
    let outbox_dead_letter_limit = parse_or(&get, "OUTBOX_DEAD_LETTER_LIMIT", DEFAULT_DEAD_LETTER_LIMIT)?;

    let log_format = match get("LOG_FORMAT").as_deref().map(str::to_ascii_lowercase).as_deref() {
      None | Some("pretty") => LogFormat::Pretty,
      Some("json") => LogFormat::Json,
      Some(other) => return Err(AppError::Config(format!("Invalid LOG_FORMAT '{}'", other))),
    };

    Ok(Self {
      server_host,
      server_port,
      database_url,
      database_max_connections,
      run_migrations,
      order_webhook_url: get("ORDER_WEBHOOK_URL"),
      order_webhook_token: get("ORDER_WEBHOOK_TOKEN"),
      whatsapp_business_number: get("WHATSAPP_BUSINESS_NUMBER"),
      default_lead_time_days,
      notification_page_size,
      outbox_max_attempts,
      outbox_retry_base_ms,
      outbox_dead_letter_limit,
      log_format,
    })
  }

  pub fn to_settings(&self) -> StorefrontSettings {
    StorefrontSettings {
      default_lead_time_days: self.default_lead_time_days,
      notification_page_size: self.notification_page_size,
      retry: RetryPolicy {
        max_attempts: self.outbox_max_attempts,
        base_delay: Duration::from_millis(self.outbox_retry_base_ms),
      },
      dead_letter_limit: self.outbox_dead_letter_limit,
      whatsapp_number: self.whatsapp_business_number.clone(),
      ..Default::default()
    }
  }
}

fn parse_or<T, G>(get: &G, name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
  G: Fn(&str) -> Option<String>,
{
  match get(name) {
    None => Ok(default),
    Some(raw) => raw
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, raw, e))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |name| vars.get(name).cloned()
  }

  #[actix_web::test]
  async fn defaults_apply_when_only_database_url_is_set() {
    let config = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/bags")])).unwrap();
    assert_eq!(config.server_host, "127.0.0.1");
    assert_eq!(config.server_port, 8080);
    assert_eq!(config.database_max_connections, 5);
    assert!(config.run_migrations);
    assert_eq!(config.order_webhook_url, None);
    assert_eq!(config.log_format, LogFormat::Pretty);

    let settings = config.to_settings();
    assert_eq!(settings.default_lead_time_days, 7);
    assert_eq!(settings.notification_page_size, 50);
    assert_eq!(settings.retry.max_attempts, 3);
    assert_eq!(settings.retry.base_delay, Duration::from_millis(1000));
    assert_eq!(settings.dead_letter_limit, DEFAULT_DEAD_LETTER_LIMIT);
  }

  #[actix_web::test]
  async fn missing_database_url_is_a_config_error() {
    let err = AppConfig::from_lookup(lookup(&[("SERVER_PORT", "9000")])).unwrap_err();
    assert!(matches!(err, AppError::Config(ref m) if m.contains("DATABASE_URL")));
  }

  #[actix_web::test]
  async fn overrides_and_blank_values() {
    let config = AppConfig::from_lookup(lookup(&[
      ("DATABASE_URL", "postgres://db/bags"),
      ("SERVER_PORT", "9090"),
      ("RUN_MIGRATIONS", "false"),
      ("ORDER_WEBHOOK_URL", "https://hooks.example.com/orders"),
      ("ORDER_WEBHOOK_TOKEN", "   "),
      ("WHATSAPP_BUSINESS_NUMBER", "+91 98450 12345"),
      ("OUTBOX_RETRY_BASE_MS", "250"),
      ("OUTBOX_DEAD_LETTER_LIMIT", "20"),
      ("NOTIFICATION_PAGE_SIZE", "10"),
      ("LOG_FORMAT", "JSON"),
    ]))
    .unwrap();
    assert_eq!(config.server_port, 9090);
    assert!(!config.run_migrations);
    assert_eq!(config.order_webhook_url.as_deref(), Some("https://hooks.example.com/orders"));
    assert_eq!(config.order_webhook_token, None);
    assert_eq!(config.log_format, LogFormat::Json);
    let settings = config.to_settings();
    assert_eq!(settings.whatsapp_number.as_deref(), Some("+91 98450 12345"));
    assert_eq!(settings.retry.base_delay, Duration::from_millis(250));
    assert_eq!(settings.dead_letter_limit, 20);
    assert_eq!(settings.notification_page_size, 10);
  }

  #[actix_web::test]
  async fn rejects_unparseable_values() {
    for (name, value) in [
      ("SERVER_PORT", "eighty"),
      ("DEFAULT_LEAD_TIME_DAYS", "0"),
      ("OUTBOX_MAX_ATTEMPTS", "0"),
      ("NOTIFICATION_PAGE_SIZE", "0"),
      ("NOTIFICATION_PAGE_SIZE", "-5"),
      ("OUTBOX_DEAD_LETTER_LIMIT", "-1"),
      ("LOG_FORMAT", "xml"),
    ] {
      let result = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://db/bags"), (name, value)]));
      assert!(matches!(result, Err(AppError::Config(_))), "{} accepted", name);
    }
  }
}
