// storefront/src/db/rows.rs

//! Row shapes as they come out of Postgres, and their conversion into the
//! storefront records.

use anyhow::Result;
use bagworks::model::{NotificationType, Role};
use bagworks::{
  CartItem, CustomerPreferences, Customization, Notification, Order, OrderItem, OrderMessage, OrderStatus, Product,
  ProductSnapshot, Profile,
};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

pub const PRODUCT_COLUMNS: &str = "\
  id, name, product_type, size, price_cents, images, description, moq, \
  delivery_days, features, printing_options, dimensions, created_at";

pub const CART_ITEM_COLUMNS: &str = "\
  id, user_id, product_id, product_name, product_type, product_size, quantity, \
  customization, notes, created_at";

pub const ORDER_COLUMNS: &str = "\
  id, user_id, product_name, product_type, product_size, quantity, \
  price_per_unit_cents, total_price_cents, delivery_days, expected_completion_date, \
  status, notes, created_at";

pub const ORDER_ITEM_COLUMNS: &str = "\
  id, order_id, product_id, product_name, product_type, product_size, quantity, \
  notes, customization, custom_text, logo_url";

pub const NOTIFICATION_COLUMNS: &str = "id, user_id, title, message, type, order_id, is_read, created_at";

pub const MESSAGE_COLUMNS: &str = "id, order_id, sender_id, recipient_id, message, is_read, created_at";

pub const PROFILE_COLUMNS: &str = "\
  id, email, full_name, business_name, business_type, gst_number, phone, address, \
  city, state, pincode";

pub const PREFERENCES_COLUMNS: &str = "user_id, preferred_product_types, preferred_sizes, notes";

#[derive(Debug, FromRow)]
pub struct ProductRow {
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
  pub dimensions: Vec<String>,
  pub created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
  fn from(row: ProductRow) -> Self {
    Product {
      id: row.id,
      name: row.name,
      product_type: row.product_type,
      size: row.size,
      price_cents: row.price_cents,
      images: row.images,
      description: row.description,
      moq: row.moq,
      delivery_days: row.delivery_days,
      features: row.features,
      printing_options: row.printing_options,
      dimensions: row.dimensions,
      created_at: row.created_at,
    }
  }
}

#[derive(Debug, FromRow)]
pub struct CartItemRow {
  pub id: Uuid,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub product_name: String,
  pub product_type: String,
  pub product_size: Option<String>,
  pub quantity: i32,
  pub customization: Json<Customization>,
  pub notes: String,
  pub created_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
  fn from(row: CartItemRow) -> Self {
    CartItem {
      id: row.id,
      user_id: row.user_id,
      product: ProductSnapshot {
        product_id: row.product_id,
        name: row.product_name,
        product_type: row.product_type,
        size: row.product_size,
      },
      quantity: row.quantity,
      customization: row.customization.0,
      notes: row.notes,
      created_at: row.created_at,
    }
  }
}

#[derive(Debug, FromRow)]
pub struct OrderRow {
  pub id: Uuid,
  pub user_id: Uuid,
  pub product_name: String,
  pub product_type: String,
  pub product_size: Option<String>,
  pub quantity: i32,
  pub price_per_unit_cents: i64,
  pub total_price_cents: i64,
  pub delivery_days: i32,
  pub expected_completion_date: DateTime<Utc>,
  pub status: String,
  pub notes: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
  type Error = anyhow::Error;

  fn try_from(row: OrderRow) -> Result<Self> {
    Ok(Order {
      id: row.id,
      user_id: row.user_id,
      product_name: row.product_name,
      product_type: row.product_type,
      product_size: row.product_size,
      quantity: row.quantity,
      price_per_unit_cents: row.price_per_unit_cents,
      total_price_cents: row.total_price_cents,
      delivery_days: row.delivery_days,
      expected_completion_date: row.expected_completion_date,
      status: row.status.parse::<OrderStatus>()?,
      notes: row.notes,
      created_at: row.created_at,
    })
  }
}

pub fn orders_from_rows(rows: Vec<OrderRow>) -> Result<Vec<Order>> {
  rows.into_iter().map(Order::try_from).collect()
}

#[derive(Debug, FromRow)]
pub struct OrderItemRow {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub product_name: String,
  pub product_type: String,
  pub product_size: Option<String>,
  pub quantity: i32,
  pub notes: String,
  /// Null on rows written before customizations were stored structurally.
  pub customization: Option<Json<Customization>>,
  pub custom_text: Option<String>,
  pub logo_url: Option<String>,
}

impl From<OrderItemRow> for OrderItem {
  fn from(row: OrderItemRow) -> Self {
    let customization = match row.customization {
      Some(Json(c)) => c,
      None => Customization::parse_legacy_notes(&row.notes, row.logo_url.as_deref()),
    };
    OrderItem {
      id: row.id,
      order_id: row.order_id,
      product: ProductSnapshot {
        product_id: row.product_id,
        name: row.product_name,
        product_type: row.product_type,
        size: row.product_size,
      },
      quantity: row.quantity,
      notes: row.notes,
      customization,
      custom_text: row.custom_text,
      logo_url: row.logo_url,
    }
  }
}

#[derive(Debug, FromRow)]
pub struct NotificationRow {
  pub id: Uuid,
  pub user_id: Uuid,
  pub title: String,
  pub message: String,
  #[sqlx(rename = "type")]
  pub kind: String,
  pub order_id: Option<Uuid>,
  pub is_read: bool,
  pub created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
  fn from(row: NotificationRow) -> Self {
    Notification {
      id: row.id,
      user_id: row.user_id,
      title: row.title,
      message: row.message,
      kind: NotificationType::parse_lenient(&row.kind),
      order_id: row.order_id,
      is_read: row.is_read,
      created_at: row.created_at,
    }
  }
}

#[derive(Debug, FromRow)]
pub struct MessageRow {
  pub id: Uuid,
  pub order_id: Uuid,
  pub sender_id: Uuid,
  pub recipient_id: Uuid,
  pub message: String,
  pub is_read: bool,
  pub created_at: DateTime<Utc>,
}

impl From<MessageRow> for OrderMessage {
  fn from(row: MessageRow) -> Self {
    OrderMessage {
      id: row.id,
      order_id: row.order_id,
      sender_id: row.sender_id,
      recipient_id: row.recipient_id,
      message: row.message,
      is_read: row.is_read,
      created_at: row.created_at,
    }
  }
}

#[derive(Debug, FromRow)]
pub struct ProfileRow {
  pub id: Uuid,
  pub email: Option<String>,
  pub full_name: Option<String>,
  pub business_name: Option<String>,
  pub business_type: Option<String>,
  pub gst_number: Option<String>,
  pub phone: Option<String>,
  pub address: Option<String>,
  pub city: Option<String>,
  pub state: Option<String>,
  pub pincode: Option<String>,
}

impl From<ProfileRow> for Profile {
  fn from(row: ProfileRow) -> Self {
    Profile {
      id: row.id,
      email: row.email,
      full_name: row.full_name,
      business_name: row.business_name,
      business_type: row.business_type,
      gst_number: row.gst_number,
      phone: row.phone,
      address: row.address,
      city: row.city,
      state: row.state,
      pincode: row.pincode,
    }
  }
}

/// An upserted profile plus whether the insert branch ran.
#[derive(Debug, FromRow)]
pub struct UpsertedProfileRow {
  #[sqlx(flatten)]
  pub profile: ProfileRow,
  pub created: bool,
}

#[derive(Debug, FromRow)]
pub struct PreferencesRow {
  pub user_id: Uuid,
  pub preferred_product_types: Vec<String>,
  pub preferred_sizes: Vec<String>,
  pub notes: Option<String>,
}

impl From<PreferencesRow> for CustomerPreferences {
  fn from(row: PreferencesRow) -> Self {
    CustomerPreferences {
      user_id: row.user_id,
      preferred_product_types: row.preferred_product_types,
      preferred_sizes: row.preferred_sizes,
      notes: row.notes,
    }
  }
}

#[derive(Debug, FromRow)]
pub struct RoleRow {
  pub role: String,
}

impl RoleRow {
  /// Unknown role names are ignored.
  pub fn role(&self) -> Option<Role> {
    Role::parse(&self.role)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn order_row_reads_legacy_status() {
    let now = Utc::now();
    let row = OrderRow {
      id: Uuid::new_v4(),
      user_id: Uuid::new_v4(),
      product_name: "Jute Tote".into(),
      product_type: "Jute".into(),
      product_size: None,
      quantity: 200,
      price_per_unit_cents: 0,
      total_price_cents: 0,
      delivery_days: 7,
      expected_completion_date: now,
      status: "in_production".into(),
      notes: None,
      created_at: now,
    };
    assert_eq!(Order::try_from(row).unwrap().status, OrderStatus::Processing);
  }

  #[test]
  fn order_item_without_structured_customization_reads_notes() {
    let row = OrderItemRow {
      id: Uuid::new_v4(),
      order_id: Uuid::new_v4(),
      product_id: Uuid::new_v4(),
      product_name: "Canvas Tote".into(),
      product_type: "Canvas".into(),
      product_size: Some("Large".into()),
      quantity: 100,
      notes: "Colors: Red, Print: Screen, Text: Hello, Logo: Uploaded".into(),
      customization: None,
      custom_text: Some("Hello".into()),
      logo_url: Some("logos/a.png".into()),
    };
    let item = OrderItem::from(row);
    assert_eq!(item.customization.colors, vec!["Red".to_string()]);
    assert_eq!(item.customization.custom_text.as_deref(), Some("Hello"));
    assert_eq!(item.customization.logo_ref.as_deref(), Some("logos/a.png"));
  }

  #[test]
  fn unknown_notification_type_reads_as_info() {
    let row = NotificationRow {
      id: Uuid::new_v4(),
      user_id: Uuid::new_v4(),
      title: "t".into(),
      message: "m".into(),
      kind: "promo".into(),
      order_id: None,
      is_read: false,
      created_at: Utc::now(),
    };
    assert_eq!(Notification::from(row).kind, NotificationType::Info);
  }
}
