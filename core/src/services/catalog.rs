// bagworks/src/services/catalog.rs

//! Catalog browsing and WhatsApp quote enquiries.

use crate::error::{BagworksError, BagworksResult};
use crate::model::Product;
use crate::outbox::{OutboxProcessor, SideEffect};
use crate::services::notifications::admin_alerts;
use crate::store::CatalogStore;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

const TO_BE_DISCUSSED: &str = "To be discussed";
const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
  #[default]
  Newest,
  Oldest,
  NameAsc,
  NameDesc,
  MoqAsc,
  MoqDesc,
}

impl ProductSort {
  /// Unknown values fall back to newest first.
  pub fn parse_lenient(raw: &str) -> Self {
    match raw.trim().to_ascii_lowercase().as_str() {
      "oldest" => ProductSort::Oldest,
      "name_asc" => ProductSort::NameAsc,
      "name_desc" => ProductSort::NameDesc,
      "moq_asc" => ProductSort::MoqAsc,
      "moq_desc" => ProductSort::MoqDesc,
      _ => ProductSort::Newest,
    }
  }

  fn compare(&self, a: &Product, b: &Product) -> Ordering {
    match self {
      ProductSort::Newest => b.created_at.cmp(&a.created_at),
      ProductSort::Oldest => a.created_at.cmp(&b.created_at),
      ProductSort::NameAsc => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
      ProductSort::NameDesc => b.name.to_lowercase().cmp(&a.name.to_lowercase()),
      ProductSort::MoqAsc => a.moq.cmp(&b.moq),
      ProductSort::MoqDesc => b.moq.cmp(&a.moq),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductQuery {
  pub search: Option<String>,
  pub product_type: Option<String>,
  #[serde(default)]
  pub sort: ProductSort,
}

impl ProductQuery {
  fn matches(&self, product: &Product) -> bool {
    if let Some(wanted) = self.product_type.as_deref().map(str::trim).filter(|t| !t.is_empty() && *t != "all") {
      if !product.product_type.eq_ignore_ascii_case(wanted) {
        return false;
      }
    }
    match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
      None => true,
      Some(needle) => {
        let needle = needle.to_lowercase();
        product.name.to_lowercase().contains(&needle)
          || product.product_type.to_lowercase().contains(&needle)
          || product.features.iter().any(|f| f.to_lowercase().contains(&needle))
      }
    }
  }
}

/// Substring search over name, type and features, then sort. Stable, so
/// equal keys keep catalog order.
pub fn filter_and_sort(products: Vec<Product>, query: &ProductQuery) -> Vec<Product> {
  let mut matched: Vec<Product> = products.into_iter().filter(|p| query.matches(p)).collect();
  matched.sort_by(|a, b| query.sort.compare(a, b));
  matched
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QuoteRequest {
  pub customer_name: String,
  pub company_name: Option<String>,
  pub preferred_color: Option<String>,
  pub preferred_size: Option<String>,
  pub quantity: Option<String>,
  pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteLink {
  pub message: String,
  pub url: String,
}

fn filled(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn list_or_na(values: &[String]) -> String {
  if values.is_empty() {
    NOT_AVAILABLE.to_string()
  } else {
    values.join(", ")
  }
}

/// The enquiry text sent to the business over WhatsApp.
pub fn quote_message(product: &Product, request: &QuoteRequest) -> String {
  let available_sizes = if product.dimensions.is_empty() {
    product.size.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())
  } else {
    product.dimensions.join(", ")
  };
  let delivery = product
    .delivery_days
    .map(|d| format!("{} days", d))
    .unwrap_or_else(|| TO_BE_DISCUSSED.to_string());

  let mut msg = String::new();
  let _ = writeln!(msg, "*QUOTE REQUEST*\n");
  let _ = writeln!(msg, "*Customer Details:*");
  let _ = writeln!(msg, "• Name: {}", request.customer_name.trim());
  let _ = writeln!(msg, "• Company: {}\n", filled(&request.company_name).unwrap_or(NOT_AVAILABLE));
  let _ = writeln!(msg, "*Customer Preferences:*");
  let _ = writeln!(msg, "• Preferred Color: {}", filled(&request.preferred_color).unwrap_or(TO_BE_DISCUSSED));
  let _ = writeln!(msg, "• Preferred Size: {}", filled(&request.preferred_size).unwrap_or(TO_BE_DISCUSSED));
  let _ = writeln!(msg, "• Quantity Required: {}", filled(&request.quantity).unwrap_or(TO_BE_DISCUSSED));
  if let Some(notes) = filled(&request.notes) {
    let _ = writeln!(msg, "• Additional Notes: {}", notes);
  }
  let _ = writeln!(msg, "\n*Product Details:*");
  let _ = writeln!(msg, "• Product: {}", product.name);
  let _ = writeln!(msg, "• Type: {}", product.product_type);
  let _ = writeln!(msg, "• Current Size: {}", product.size.as_deref().unwrap_or(NOT_AVAILABLE));
  let _ = writeln!(msg, "• Available Sizes: {}", available_sizes);
  let _ = writeln!(msg, "• MOQ: {} units", product.moq);
  let _ = writeln!(msg, "• Delivery: {}\n", delivery);
  let _ = writeln!(msg, "*Features:* {}", list_or_na(&product.features));
  let _ = writeln!(msg, "*Printing Options:* {}\n", list_or_na(&product.printing_options));
  let _ = writeln!(
    msg,
    "*Description:* {}\n",
    product.description.as_deref().unwrap_or(NOT_AVAILABLE)
  );
  msg.push_str("Please provide pricing and availability.");
  msg
}

/// Percent-encodes everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
pub fn encode_uri_component(input: &str) -> String {
  let mut out = String::with_capacity(input.len() * 3);
  for byte in input.bytes() {
    match byte {
      b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')' => {
        out.push(byte as char)
      }
      other => {
        let _ = write!(out, "%{:02X}", other);
      }
    }
  }
  out
}

pub fn whatsapp_link(number: &str, message: &str) -> String {
  let digits: String = number.chars().filter(char::is_ascii_digit).collect();
  format!("https://wa.me/{}?text={}", digits, encode_uri_component(message))
}

pub struct CatalogService {
  catalog: Arc<dyn CatalogStore>,
  effects: Arc<OutboxProcessor>,
  whatsapp_number: Option<String>,
}

impl CatalogService {
  pub fn new(catalog: Arc<dyn CatalogStore>, effects: Arc<OutboxProcessor>, whatsapp_number: Option<String>) -> Self {
    Self {
      catalog,
      effects,
      whatsapp_number,
    }
  }

  pub async fn search(&self, query: &ProductQuery) -> BagworksResult<Vec<Product>> {
    let products = self.catalog.list_products().await?;
    Ok(filter_and_sort(products, query))
  }

  pub async fn get(&self, product_id: Uuid) -> BagworksResult<Product> {
    self
      .catalog
      .get_product(product_id)
      .await?
      .ok_or_else(|| BagworksError::NotFound(format!("product {}", product_id)))
  }

  /// Builds the WhatsApp enquiry for a product and alerts the admins.
  #[instrument(name = "CatalogService::request_quote", skip(self, request))]
  pub async fn request_quote(&self, product_id: Uuid, request: QuoteRequest) -> BagworksResult<QuoteLink> {
    if request.customer_name.trim().is_empty() {
      return Err(BagworksError::Validation("Your name is required".to_string()));
    }
    let number = self
      .whatsapp_number
      .as_deref()
      .ok_or_else(|| BagworksError::Configuration("WhatsApp business number is not configured".to_string()))?;
    let product = self.get(product_id).await?;
    let message = quote_message(&product, &request);
    let url = whatsapp_link(number, &message);

    self
      .effects
      .submit([SideEffect::NotifyAdmins {
        draft: admin_alerts::quote_request(&request.customer_name, request.company_name.as_deref(), &product.name),
      }])
      .await;
    info!(product = %product.name, "Quote request prepared.");
    Ok(QuoteLink { message, url })
  }
}
