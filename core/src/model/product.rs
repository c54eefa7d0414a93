// bagworks/src/model/product.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog entry. Read-only from the order flow's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub product_type: String,
  pub size: Option<String>,
  pub price_cents: i64,
  pub images: Vec<String>,
  pub description: Option<String>,
  pub moq: i32,
  pub delivery_days: Option<i32>,
  pub features: Vec<String>,
  pub printing_options: Vec<String>,
  /// Available size variants.
  pub dimensions: Vec<String>,
  pub created_at: DateTime<Utc>,
}

impl Product {
  /// Captures the product fields an order line keeps. `size` overrides the
  /// catalog size when the customer picked a variant.
  pub fn snapshot(&self, size: Option<&str>) -> ProductSnapshot {
    ProductSnapshot {
      product_id: self.id,
      name: self.name.clone(),
      product_type: self.product_type.clone(),
      size: size.map(str::to_string).or_else(|| self.size.clone()),
    }
  }
}

/// Product fields copied at the time of an action. Never re-read from the
/// catalog afterwards, so later catalog edits don't change past lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
  pub product_id: Uuid,
  pub name: String,
  pub product_type: String,
  pub size: Option<String>,
}
