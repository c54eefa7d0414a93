// storefront/src/web/extractors.rs

//! Request identity. The upstream auth collaborator puts the session's user
//! id in `X-User-Id`; roles are looked up per request.

use crate::errors::AppError;
use crate::state::AppState;

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use bagworks::AuthContext;
use futures_util::future::{ready, LocalBoxFuture, Ready};
use std::ops::Deref;
use tracing::warn;
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "X-User-Id";

/// The trusted user id, without a role lookup.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(user_id_from(req).map(|user_id| AuthenticatedUser { user_id }))
  }
}

fn user_id_from(req: &HttpRequest) -> Result<Uuid, AppError> {
  req
    .headers()
    .get(USER_ID_HEADER)
    .and_then(|value| value.to_str().ok())
    .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
    .ok_or_else(|| {
      warn!("Missing or invalid {} header.", USER_ID_HEADER);
      AppError::Auth(format!("Authentication required: missing or invalid {} header", USER_ID_HEADER))
    })
}

/// The caller with roles resolved, ready to hand to storefront operations.
#[derive(Debug, Clone)]
pub struct Caller(pub AuthContext);

impl Deref for Caller {
  type Target = AuthContext;

  fn deref(&self) -> &AuthContext {
    &self.0
  }
}

impl FromRequest for Caller {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
    let user = AuthenticatedUser::from_request(req, payload).into_inner();
    let state = req.app_data::<web::Data<AppState>>().cloned();
    Box::pin(async move {
      let user = user?;
      let state = state.ok_or_else(|| AppError::Internal("Application state is not configured".to_string()))?;
      let auth = state.storefront.authenticate(user.user_id).await?;
      Ok(Caller(auth))
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::test::TestRequest;

  #[actix_web::test]
  async fn reads_the_user_header() {
    let user_id = Uuid::new_v4();
    let req = TestRequest::default()
      .insert_header((USER_ID_HEADER, user_id.to_string()))
      .to_http_request();
    let user = AuthenticatedUser::extract(&req).await.unwrap();
    assert_eq!(user.user_id, user_id);
  }

  #[actix_web::test]
  async fn missing_or_garbled_header_is_unauthorized() {
    let req = TestRequest::default().to_http_request();
    assert!(matches!(AuthenticatedUser::extract(&req).await, Err(AppError::Auth(_))));

    let req = TestRequest::default()
      .insert_header((USER_ID_HEADER, "not-a-uuid"))
      .to_http_request();
    assert!(matches!(AuthenticatedUser::extract(&req).await, Err(AppError::Auth(_))));
  }

  #[actix_web::test]
  async fn caller_rejects_anonymous_requests_before_any_lookup() {
    let req = TestRequest::default().to_http_request();
    assert!(matches!(Caller::extract(&req).await, Err(AppError::Auth(_))));
  }
}
