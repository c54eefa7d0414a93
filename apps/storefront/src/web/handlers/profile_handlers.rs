// storefront/src/web/handlers/profile_handlers.rs

use actix_web::{web, HttpResponse};
use bagworks::{PreferencesUpdate, ProfileUpdate};
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::Caller;

#[instrument(name = "handler::get_profile", skip_all, fields(user_id = %caller.user_id))]
pub async fn get_profile_handler(app_state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse, AppError> {
  let profile = app_state
    .storefront
    .profiles
    .get(&caller)
    .await?
    .ok_or_else(|| AppError::NotFound("profile".to_string()))?;
  Ok(HttpResponse::Ok().json(profile))
}

#[instrument(name = "handler::upsert_profile", skip_all, fields(user_id = %caller.user_id))]
pub async fn upsert_profile_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  payload: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, AppError> {
  let profile = app_state.storefront.profiles.upsert(&caller, payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(profile))
}

#[instrument(name = "handler::get_preferences", skip_all, fields(user_id = %caller.user_id))]
pub async fn get_preferences_handler(app_state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse, AppError> {
  let preferences = app_state.storefront.profiles.preferences(&caller).await?;
  Ok(HttpResponse::Ok().json(preferences))
}

#[instrument(name = "handler::save_preferences", skip_all, fields(user_id = %caller.user_id))]
pub async fn save_preferences_handler(
  app_state: web::Data<AppState>,
  caller: Caller,
  payload: web::Json<PreferencesUpdate>,
) -> Result<HttpResponse, AppError> {
  let preferences = app_state
    .storefront
    .profiles
    .save_preferences(&caller, payload.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(preferences))
}
