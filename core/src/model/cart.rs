// bagworks/src/model/cart.rs
use super::customization::Customization;
use super::product::ProductSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
  pub id: Uuid,
  pub user_id: Uuid,
  #[serde(flatten)]
  pub product: ProductSnapshot,
  /// Always >= 1.
  pub quantity: i32,
  pub customization: Customization,
  /// Rendered from `customization` at add time.
  pub notes: String,
  pub created_at: DateTime<Utc>,
}

impl CartItem {
  pub fn logo_url(&self) -> Option<&str> {
    self.customization.logo_ref.as_deref()
  }
}

/// A cart row before the store assigns it an id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartItem {
  pub user_id: Uuid,
  pub product: ProductSnapshot,
  pub quantity: i32,
  pub customization: Customization,
  pub notes: String,
}
