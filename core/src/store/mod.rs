// bagworks/src/store/mod.rs

//! Collaborator seams: persistence and role lookup.
//!
//! Every method reports failure as `anyhow::Error`; services turn that into
//! [`crate::error::BagworksError::Collaborator`]. Implementations that store
//! notifications or messages publish the insert on the
//! [`crate::realtime::RealtimeHub`] after commit.

pub mod memory;

use crate::model::{
  CartItem, CustomerPreferences, NewCartItem, NewNotification, NewOrder, NewOrderItem, NewOrderMessage, Notification,
  Order, OrderItem, OrderMessage, OrderStatus, Product, Profile, Role,
};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

pub use memory::{FailPoint, InMemoryStore};

#[async_trait]
pub trait CatalogStore: Send + Sync {
  /// Newest first.
  async fn list_products(&self) -> Result<Vec<Product>>;
  async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
  /// Newest first.
  async fn list_cart(&self, user_id: Uuid) -> Result<Vec<CartItem>>;
  async fn get_cart_item(&self, item_id: Uuid) -> Result<Option<CartItem>>;
  async fn insert_cart_item(&self, item: NewCartItem) -> Result<CartItem>;
  /// `None` when the item no longer exists.
  async fn update_cart_quantity(&self, item_id: Uuid, quantity: i32) -> Result<Option<CartItem>>;
  async fn delete_cart_item(&self, item_id: Uuid) -> Result<bool>;
  /// Returns the number of rows removed.
  async fn clear_cart(&self, user_id: Uuid) -> Result<u64>;
  /// Removes the listed items of one user's cart, leaving anything else.
  async fn delete_cart_items(&self, user_id: Uuid, item_ids: &[Uuid]) -> Result<u64>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Writes the order and all its items, or nothing.
  async fn create_order(&self, order: NewOrder, items: Vec<NewOrderItem>) -> Result<(Order, Vec<OrderItem>)>;
  async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>>;
  /// Newest first. `None` lists every customer's orders.
  async fn list_orders(&self, user_id: Option<Uuid>) -> Result<Vec<Order>>;
  async fn list_order_items(&self, order_ids: &[Uuid]) -> Result<Vec<OrderItem>>;
  /// `None` when the order does not exist.
  async fn update_order_status(&self, order_id: Uuid, status: OrderStatus) -> Result<Option<Order>>;
  async fn count_orders(&self, status: Option<OrderStatus>) -> Result<i64>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
  async fn insert_notification(&self, notification: NewNotification) -> Result<Notification>;
  async fn get_notification(&self, notification_id: Uuid) -> Result<Option<Notification>>;
  /// Newest first, at most `limit` rows.
  async fn list_notifications(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>>;
  async fn mark_notification_read(&self, notification_id: Uuid) -> Result<bool>;
  async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64>;
  async fn delete_notification(&self, notification_id: Uuid) -> Result<bool>;
  async fn unread_notification_count(&self, user_id: Uuid) -> Result<i64>;
  /// One page, newest first, plus the user's total unread count. Both come
  /// from the same snapshot.
  async fn notification_page(&self, user_id: Uuid, limit: i64) -> Result<(Vec<Notification>, i64)>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
  async fn insert_message(&self, message: NewOrderMessage) -> Result<OrderMessage>;
  /// Oldest first.
  async fn list_messages(&self, order_id: Uuid) -> Result<Vec<OrderMessage>>;
  /// Marks unread messages addressed to `reader_id` in the thread.
  async fn mark_thread_read(&self, order_id: Uuid, reader_id: Uuid) -> Result<u64>;
  async fn unread_message_count(&self, order_id: Uuid, reader_id: Uuid) -> Result<i64>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
  async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>>;
  /// Returns the stored profile and whether this call created it.
  async fn upsert_profile(&self, profile: Profile) -> Result<(Profile, bool)>;
  async fn list_profiles(&self) -> Result<Vec<Profile>>;
  async fn count_profiles(&self) -> Result<i64>;
  async fn get_preferences(&self, user_id: Uuid) -> Result<Option<CustomerPreferences>>;
  /// Replaces the user's preferences wholesale.
  async fn upsert_preferences(&self, preferences: CustomerPreferences) -> Result<CustomerPreferences>;
}

#[async_trait]
pub trait RoleDirectory: Send + Sync {
  async fn roles_for(&self, user_id: Uuid) -> Result<Vec<Role>>;
  /// Every admin, ordered by grant time then id.
  async fn admin_ids(&self) -> Result<Vec<Uuid>>;

  /// The admin customers talk to. The first in [`RoleDirectory::admin_ids`]
  /// order, so every session resolves the same one.
  async fn primary_admin(&self) -> Result<Option<Uuid>> {
    Ok(self.admin_ids().await?.into_iter().next())
  }
}

/// The full set of collaborators the storefront runs against.
#[derive(Clone)]
pub struct Stores {
  pub catalog: Arc<dyn CatalogStore>,
  pub carts: Arc<dyn CartStore>,
  pub orders: Arc<dyn OrderStore>,
  pub notifications: Arc<dyn NotificationStore>,
  pub messages: Arc<dyn MessageStore>,
  pub profiles: Arc<dyn ProfileStore>,
  pub roles: Arc<dyn RoleDirectory>,
}

impl Stores {
  /// One object backing every seam, as the in-memory and Postgres stores do.
  pub fn from_single<S>(store: Arc<S>) -> Self
  where
    S: CatalogStore + CartStore + OrderStore + NotificationStore + MessageStore + ProfileStore + RoleDirectory + 'static,
  {
    Self {
      catalog: store.clone(),
      carts: store.clone(),
      orders: store.clone(),
      notifications: store.clone(),
      messages: store.clone(),
      profiles: store.clone(),
      roles: store,
    }
  }
}
