// bagworks/src/store/memory.rs

//! An in-process implementation of every collaborator trait.
//!
//! Used by the test suite and the benchmarks. Rows live in insertion order,
//! so "newest first" is reverse iteration. Any write can be made to fail on
//! demand through [`FailPoint`].

use super::{CartStore, CatalogStore, MessageStore, NotificationStore, OrderStore, ProfileStore, RoleDirectory};
use crate::model::{
  CartItem, CustomerPreferences, NewCartItem, NewNotification, NewOrder, NewOrderItem, NewOrderMessage, Notification,
  Order, OrderItem, OrderMessage, OrderStatus, Product, Profile, Role,
};
use crate::realtime::{RealtimeEvent, RealtimeHub};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Store operations that can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
  InsertCartItem,
  UpdateCartQuantity,
  ClearCart,
  DeleteCartItems,
  CreateOrder,
  UpdateOrderStatus,
  InsertNotification,
  InsertMessage,
  MarkThreadRead,
  ListAdmins,
  UpsertProfile,
  UpsertPreferences,
}

#[derive(Default)]
struct Tables {
  products: Vec<Product>,
  cart: Vec<CartItem>,
  orders: Vec<Order>,
  order_items: Vec<OrderItem>,
  notifications: Vec<Notification>,
  messages: Vec<OrderMessage>,
  profiles: Vec<Profile>,
  preferences: Vec<CustomerPreferences>,
  roles: Vec<(Uuid, Role)>,
  last_timestamp: Option<DateTime<Utc>>,
}

impl Tables {
  /// Strictly increasing timestamps so ordering by `created_at` matches
  /// insertion order.
  fn next_timestamp(&mut self) -> DateTime<Utc> {
    let now = Utc::now();
    let ts = match self.last_timestamp {
      Some(last) if now <= last => last + Duration::microseconds(1),
      _ => now,
    };
    self.last_timestamp = Some(ts);
    ts
  }
}

#[derive(Default)]
pub struct InMemoryStore {
  tables: Mutex<Tables>,
  /// Remaining forced failures per point; `u32::MAX` means always.
  failures: Mutex<HashMap<FailPoint, u32>>,
  writes: AtomicU64,
  hub: Option<RealtimeHub>,
}

impl InMemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_hub(hub: RealtimeHub) -> Self {
    Self {
      hub: Some(hub),
      ..Self::default()
    }
  }

  pub fn fail_always(&self, point: FailPoint) {
    self.failures.lock().insert(point, u32::MAX);
  }

  /// Fails the next `times` calls at `point`, then recovers.
  pub fn fail_times(&self, point: FailPoint, times: u32) {
    self.failures.lock().insert(point, times);
  }

  pub fn heal(&self, point: FailPoint) {
    self.failures.lock().remove(&point);
  }

  /// Successful writes so far, across all tables.
  pub fn write_count(&self) -> u64 {
    self.writes.load(Ordering::SeqCst)
  }

  pub fn add_product(&self, mut product: Product) -> Product {
    let mut tables = self.tables.lock();
    product.created_at = tables.next_timestamp();
    tables.products.push(product.clone());
    product
  }

  pub fn grant_role(&self, user_id: Uuid, role: Role) {
    let mut tables = self.tables.lock();
    if !tables.roles.contains(&(user_id, role)) {
      tables.roles.push((user_id, role));
    }
  }

  pub fn put_profile(&self, profile: Profile) {
    let mut tables = self.tables.lock();
    tables.profiles.retain(|p| p.id != profile.id);
    tables.profiles.push(profile);
  }

  pub fn all_notifications(&self) -> Vec<Notification> {
    self.tables.lock().notifications.clone()
  }

  fn check(&self, point: FailPoint) -> Result<()> {
    let mut failures = self.failures.lock();
    match failures.get_mut(&point) {
      Some(remaining) if *remaining == u32::MAX => Err(anyhow!("injected failure at {:?}", point)),
      Some(remaining) => {
        *remaining -= 1;
        if *remaining == 0 {
          failures.remove(&point);
        }
        Err(anyhow!("injected failure at {:?}", point))
      }
      None => Ok(()),
    }
  }

  fn wrote(&self) {
    self.writes.fetch_add(1, Ordering::SeqCst);
  }

  fn publish(&self, event: RealtimeEvent) {
    if let Some(hub) = &self.hub {
      hub.publish(event);
    }
  }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
  async fn list_products(&self) -> Result<Vec<Product>> {
    Ok(self.tables.lock().products.iter().rev().cloned().collect())
  }

  async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>> {
    Ok(self.tables.lock().products.iter().find(|p| p.id == product_id).cloned())
  }
}

#[async_trait]
impl CartStore for InMemoryStore {
  async fn list_cart(&self, user_id: Uuid) -> Result<Vec<CartItem>> {
    Ok(
      self
        .tables
        .lock()
        .cart
        .iter()
        .rev()
        .filter(|i| i.user_id == user_id)
        .cloned()
        .collect(),
    )
  }

  async fn get_cart_item(&self, item_id: Uuid) -> Result<Option<CartItem>> {
    Ok(self.tables.lock().cart.iter().find(|i| i.id == item_id).cloned())
  }

  async fn insert_cart_item(&self, item: NewCartItem) -> Result<CartItem> {
    self.check(FailPoint::InsertCartItem)?;
    let mut tables = self.tables.lock();
    let row = CartItem {
      id: Uuid::new_v4(),
      user_id: item.user_id,
      product: item.product,
      quantity: item.quantity,
      customization: item.customization,
      notes: item.notes,
      created_at: tables.next_timestamp(),
    };
    tables.cart.push(row.clone());
    self.wrote();
    Ok(row)
  }

  async fn update_cart_quantity(&self, item_id: Uuid, quantity: i32) -> Result<Option<CartItem>> {
    self.check(FailPoint::UpdateCartQuantity)?;
    let mut tables = self.tables.lock();
    let updated = tables.cart.iter_mut().find(|i| i.id == item_id).map(|item| {
      item.quantity = quantity;
      item.clone()
    });
    if updated.is_some() {
      self.wrote();
    }
    Ok(updated)
  }

  async fn delete_cart_item(&self, item_id: Uuid) -> Result<bool> {
    let mut tables = self.tables.lock();
    let before = tables.cart.len();
    tables.cart.retain(|i| i.id != item_id);
    let removed = tables.cart.len() != before;
    if removed {
      self.wrote();
    }
    Ok(removed)
  }

  async fn clear_cart(&self, user_id: Uuid) -> Result<u64> {
    self.check(FailPoint::ClearCart)?;
    let mut tables = self.tables.lock();
    let before = tables.cart.len();
    tables.cart.retain(|i| i.user_id != user_id);
    let removed = (before - tables.cart.len()) as u64;
    if removed > 0 {
      self.wrote();
    }
    Ok(removed)
  }

  async fn delete_cart_items(&self, user_id: Uuid, item_ids: &[Uuid]) -> Result<u64> {
    self.check(FailPoint::DeleteCartItems)?;
    let mut tables = self.tables.lock();
    let before = tables.cart.len();
    tables
      .cart
      .retain(|i| !(i.user_id == user_id && item_ids.contains(&i.id)));
    let removed = (before - tables.cart.len()) as u64;
    if removed > 0 {
      self.wrote();
    }
    Ok(removed)
  }
}

#[async_trait]
impl OrderStore for InMemoryStore {
  async fn create_order(&self, order: NewOrder, items: Vec<NewOrderItem>) -> Result<(Order, Vec<OrderItem>)> {
    self.check(FailPoint::CreateOrder)?;
    let mut tables = self.tables.lock();
    let row = Order {
      id: Uuid::new_v4(),
      user_id: order.user_id,
      product_name: order.product_name,
      product_type: order.product_type,
      product_size: order.product_size,
      quantity: order.quantity,
      price_per_unit_cents: order.price_per_unit_cents,
      total_price_cents: order.total_price_cents,
      delivery_days: order.delivery_days,
      expected_completion_date: order.expected_completion_date,
      status: order.status,
      notes: order.notes,
      created_at: tables.next_timestamp(),
    };
    let item_rows: Vec<OrderItem> = items
      .into_iter()
      .map(|item| OrderItem {
        id: Uuid::new_v4(),
        order_id: row.id,
        custom_text: item.custom_text().map(str::to_string),
        logo_url: item.logo_url().map(str::to_string),
        product: item.product,
        quantity: item.quantity,
        notes: item.notes,
        customization: item.customization,
      })
      .collect();
    tables.orders.push(row.clone());
    tables.order_items.extend(item_rows.iter().cloned());
    self.wrote();
    Ok((row, item_rows))
  }

  async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>> {
    Ok(self.tables.lock().orders.iter().find(|o| o.id == order_id).cloned())
  }

  async fn list_orders(&self, user_id: Option<Uuid>) -> Result<Vec<Order>> {
    Ok(
      self
        .tables
        .lock()
        .orders
        .iter()
        .rev()
        .filter(|o| user_id.map_or(true, |uid| o.user_id == uid))
        .cloned()
        .collect(),
    )
  }

  async fn list_order_items(&self, order_ids: &[Uuid]) -> Result<Vec<OrderItem>> {
    Ok(
      self
        .tables
        .lock()
        .order_items
        .iter()
        .filter(|i| order_ids.contains(&i.order_id))
        .cloned()
        .collect(),
    )
  }

  async fn update_order_status(&self, order_id: Uuid, status: OrderStatus) -> Result<Option<Order>> {
    self.check(FailPoint::UpdateOrderStatus)?;
    let mut tables = self.tables.lock();
    let updated = tables.orders.iter_mut().find(|o| o.id == order_id).map(|order| {
      order.status = status;
      order.clone()
    });
    if updated.is_some() {
      self.wrote();
    }
    Ok(updated)
  }

  async fn count_orders(&self, status: Option<OrderStatus>) -> Result<i64> {
    Ok(
      self
        .tables
        .lock()
        .orders
        .iter()
        .filter(|o| status.map_or(true, |s| o.status == s))
        .count() as i64,
    )
  }
}

#[async_trait]
impl NotificationStore for InMemoryStore {
  async fn insert_notification(&self, notification: NewNotification) -> Result<Notification> {
    self.check(FailPoint::InsertNotification)?;
    let row = {
      let mut tables = self.tables.lock();
      let row = Notification {
        id: Uuid::new_v4(),
        user_id: notification.user_id,
        title: notification.draft.title,
        message: notification.draft.message,
        kind: notification.draft.kind,
        order_id: notification.draft.order_id,
        is_read: false,
        created_at: tables.next_timestamp(),
      };
      tables.notifications.push(row.clone());
      row
    };
    self.wrote();
    self.publish(RealtimeEvent::NotificationInserted(row.clone()));
    Ok(row)
  }

  async fn get_notification(&self, notification_id: Uuid) -> Result<Option<Notification>> {
    Ok(
      self
        .tables
        .lock()
        .notifications
        .iter()
        .find(|n| n.id == notification_id)
        .cloned(),
    )
  }

  async fn list_notifications(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>> {
    Ok(
      self
        .tables
        .lock()
        .notifications
        .iter()
        .rev()
        .filter(|n| n.user_id == user_id)
        .take(limit.max(0) as usize)
        .cloned()
        .collect(),
    )
  }

  async fn mark_notification_read(&self, notification_id: Uuid) -> Result<bool> {
    let mut tables = self.tables.lock();
    let found = match tables.notifications.iter_mut().find(|n| n.id == notification_id) {
      Some(n) => {
        n.is_read = true;
        true
      }
      None => false,
    };
    if found {
      self.wrote();
    }
    Ok(found)
  }

  async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64> {
    let mut tables = self.tables.lock();
    let mut changed = 0u64;
    for n in tables.notifications.iter_mut().filter(|n| n.user_id == user_id && !n.is_read) {
      n.is_read = true;
      changed += 1;
    }
    if changed > 0 {
      self.wrote();
    }
    Ok(changed)
  }

  async fn delete_notification(&self, notification_id: Uuid) -> Result<bool> {
    let mut tables = self.tables.lock();
    let before = tables.notifications.len();
    tables.notifications.retain(|n| n.id != notification_id);
    let removed = tables.notifications.len() != before;
    if removed {
      self.wrote();
    }
    Ok(removed)
  }

  async fn unread_notification_count(&self, user_id: Uuid) -> Result<i64> {
    Ok(
      self
        .tables
        .lock()
        .notifications
        .iter()
        .filter(|n| n.user_id == user_id && !n.is_read)
        .count() as i64,
    )
  }

  async fn notification_page(&self, user_id: Uuid, limit: i64) -> Result<(Vec<Notification>, i64)> {
    let tables = self.tables.lock();
    let mine: Vec<&Notification> = tables.notifications.iter().filter(|n| n.user_id == user_id).collect();
    let unread = mine.iter().filter(|n| !n.is_read).count() as i64;
    let page = mine.into_iter().rev().take(limit.max(0) as usize).cloned().collect();
    Ok((page, unread))
  }
}

#[async_trait]
impl MessageStore for InMemoryStore {
  async fn insert_message(&self, message: NewOrderMessage) -> Result<OrderMessage> {
    self.check(FailPoint::InsertMessage)?;
    let row = {
      let mut tables = self.tables.lock();
      let row = OrderMessage {
        id: Uuid::new_v4(),
        order_id: message.order_id,
        sender_id: message.sender_id,
        recipient_id: message.recipient_id,
        message: message.message,
        is_read: false,
        created_at: tables.next_timestamp(),
      };
      tables.messages.push(row.clone());
      row
    };
    self.wrote();
    self.publish(RealtimeEvent::MessageInserted(row.clone()));
    Ok(row)
  }

  async fn list_messages(&self, order_id: Uuid) -> Result<Vec<OrderMessage>> {
    Ok(
      self
        .tables
        .lock()
        .messages
        .iter()
        .filter(|m| m.order_id == order_id)
        .cloned()
        .collect(),
    )
  }

  async fn mark_thread_read(&self, order_id: Uuid, reader_id: Uuid) -> Result<u64> {
    self.check(FailPoint::MarkThreadRead)?;
    let mut tables = self.tables.lock();
    let mut changed = 0u64;
    for m in tables
      .messages
      .iter_mut()
      .filter(|m| m.order_id == order_id && m.recipient_id == reader_id && !m.is_read)
    {
      m.is_read = true;
      changed += 1;
    }
    if changed > 0 {
      self.wrote();
    }
    Ok(changed)
  }

  async fn unread_message_count(&self, order_id: Uuid, reader_id: Uuid) -> Result<i64> {
    Ok(
      self
        .tables
        .lock()
        .messages
        .iter()
        .filter(|m| m.order_id == order_id && m.recipient_id == reader_id && !m.is_read)
        .count() as i64,
    )
  }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
  async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
    Ok(self.tables.lock().profiles.iter().find(|p| p.id == user_id).cloned())
  }

  async fn upsert_profile(&self, profile: Profile) -> Result<(Profile, bool)> {
    self.check(FailPoint::UpsertProfile)?;
    let mut tables = self.tables.lock();
    let created = match tables.profiles.iter_mut().find(|p| p.id == profile.id) {
      Some(existing) => {
        *existing = profile.clone();
        false
      }
      None => {
        tables.profiles.push(profile.clone());
        true
      }
    };
    self.wrote();
    Ok((profile, created))
  }

  async fn list_profiles(&self) -> Result<Vec<Profile>> {
    Ok(self.tables.lock().profiles.clone())
  }

  async fn count_profiles(&self) -> Result<i64> {
    Ok(self.tables.lock().profiles.len() as i64)
  }

  async fn get_preferences(&self, user_id: Uuid) -> Result<Option<CustomerPreferences>> {
    Ok(self.tables.lock().preferences.iter().find(|p| p.user_id == user_id).cloned())
  }

  async fn upsert_preferences(&self, preferences: CustomerPreferences) -> Result<CustomerPreferences> {
    self.check(FailPoint::UpsertPreferences)?;
    let mut tables = self.tables.lock();
    tables.preferences.retain(|p| p.user_id != preferences.user_id);
    tables.preferences.push(preferences.clone());
    self.wrote();
    Ok(preferences)
  }
}

#[async_trait]
impl RoleDirectory for InMemoryStore {
  async fn roles_for(&self, user_id: Uuid) -> Result<Vec<Role>> {
    Ok(
      self
        .tables
        .lock()
        .roles
        .iter()
        .filter(|(uid, _)| *uid == user_id)
        .map(|(_, role)| *role)
        .collect(),
    )
  }

  async fn admin_ids(&self) -> Result<Vec<Uuid>> {
    self.check(FailPoint::ListAdmins)?;
    Ok(
      self
        .tables
        .lock()
        .roles
        .iter()
        .filter(|(_, role)| *role == Role::Admin)
        .map(|(uid, _)| *uid)
        .collect(),
    )
  }
}
