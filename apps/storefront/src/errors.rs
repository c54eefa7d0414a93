// storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use bagworks::BagworksError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Precondition Failed: {0}")]
  Precondition(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Not permitted")]
  Forbidden,

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  /// Storefront failures that don't map to a request problem.
  #[error("Storefront Error: {source}")]
  Domain {
    #[source]
    source: BagworksError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<BagworksError> for AppError {
  fn from(err: BagworksError) -> Self {
    match err {
      BagworksError::Validation(m) => AppError::Validation(m),
      BagworksError::Precondition(m) => AppError::Precondition(m),
      BagworksError::Authorization => AppError::Forbidden,
      BagworksError::NotFound(m) => AppError::NotFound(m),
      other => AppError::Domain { source: other },
    }
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(db_err) => AppError::Sqlx(db_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl AppError {
  /// Whether retrying the same request may succeed.
  pub fn is_retryable(&self) -> bool {
    match self {
      AppError::Sqlx(_) => true,
      AppError::Domain { source } => source.is_retryable(),
      _ => false,
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Precondition(_) => StatusCode::CONFLICT,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Domain {
        source: BagworksError::Collaborator { .. },
      } => StatusCode::BAD_GATEWAY,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Domain { .. } | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Rejecting request");
    }
    let message = match self {
      AppError::Validation(m) | AppError::Precondition(m) | AppError::Auth(m) | AppError::NotFound(m) => m.clone(),
      AppError::Forbidden => self.to_string(),
      AppError::Sqlx(_) => "Database operation failed".to_string(),
      AppError::Config(_) => "Configuration issue".to_string(),
      AppError::Domain {
        source: BagworksError::PartialCheckout { order_id, .. },
      } => format!("Order {} was placed but the cart could not be cleared", order_id),
      AppError::Domain { .. } | AppError::Internal(_) => "An internal error occurred".to_string(),
    };
    HttpResponse::build(status).json(json!({
      "error": message,
      "retryable": self.is_retryable(),
    }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::body::to_bytes;
  use uuid::Uuid;

  async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.error_response();
    let status = response.status();
    let bytes = to_bytes(response.into_body()).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[actix_web::test]
  async fn request_errors_keep_their_message() {
    let (status, body) = body_of(BagworksError::Validation("Quantity must be at least 1".into()).into()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Quantity must be at least 1");
    assert_eq!(body["retryable"], false);

    let (status, _) = body_of(BagworksError::Precondition("Complete your profile".into()).into()).await;
    assert_eq!(status, StatusCode::CONFLICT);
  }

  #[actix_web::test]
  async fn authorization_never_names_a_role() {
    let (status, body) = body_of(BagworksError::Authorization.into()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Not permitted");
  }

  #[actix_web::test]
  async fn collaborator_failures_are_retryable() {
    let err: AppError = BagworksError::from(anyhow::anyhow!("connection reset")).into();
    let (status, body) = body_of(err).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["retryable"], true);
    assert_eq!(body["error"], "An internal error occurred");
  }

  #[actix_web::test]
  async fn partial_checkout_names_the_order() {
    let order_id = Uuid::new_v4();
    let err: AppError = BagworksError::PartialCheckout {
      order_id,
      source: anyhow::anyhow!("clear failed"),
    }
    .into();
    let (status, body) = body_of(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["retryable"], true);
    assert!(body["error"].as_str().unwrap().contains(&order_id.to_string()));
  }
}
