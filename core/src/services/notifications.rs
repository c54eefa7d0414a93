// bagworks/src/services/notifications.rs

//! Notification Dispatcher: per-user inbox writes, admin fan-out, read state
//! and the live feed a signed-in client keeps.

use crate::error::{BagworksError, BagworksResult};
use crate::model::{AuthContext, Notification, NotificationDraft, NotificationType, NewNotification};
use crate::realtime::{RealtimeEvent, RealtimeFilter, RealtimeHub, Subscription};
use crate::store::{NotificationStore, RoleDirectory};

use std::sync::Arc;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

/// Drafts for the alerts admins receive.
pub mod admin_alerts {
  use super::{NotificationDraft, NotificationType};
  use uuid::Uuid;

  fn or_default<'a>(name: Option<&'a str>, fallback: &'a str) -> &'a str {
    name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or(fallback)
  }

  pub fn new_order(customer_name: Option<&str>, order_id: Uuid) -> NotificationDraft {
    NotificationDraft::new(
      "New Order Received",
      format!("{} has placed a new order.", or_default(customer_name, "A customer")),
      NotificationType::Order,
    )
    .for_order(order_id)
  }

  pub fn new_user(name: Option<&str>, email: Option<&str>) -> NotificationDraft {
    let who = or_default(name, "A new user");
    let message = match email.map(str::trim).filter(|e| !e.is_empty()) {
      Some(email) => format!("{} ({}) has joined.", who, email),
      None => format!("{} has joined.", who),
    };
    NotificationDraft::new("New User Registered", message, NotificationType::User)
  }

  pub fn quote_request(customer_name: &str, company: Option<&str>, product_name: &str) -> NotificationDraft {
    let company = company
      .map(str::trim)
      .filter(|c| !c.is_empty())
      .map(|c| format!(" ({})", c))
      .unwrap_or_default();
    NotificationDraft::new(
      "New Quote Request",
      format!("{}{} requested a quote for {}.", customer_name.trim(), company, product_name),
      NotificationType::Quote,
    )
  }

  pub fn customization(customer_name: Option<&str>, product_name: &str, quantity: i32) -> NotificationDraft {
    NotificationDraft::new(
      "New Customization Added",
      format!(
        "{} added {} (qty: {}) to cart with customizations.",
        or_default(customer_name, "A customer"),
        product_name,
        quantity
      ),
      NotificationType::Customization,
    )
  }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
  notifications: Arc<dyn NotificationStore>,
  roles: Arc<dyn RoleDirectory>,
  hub: RealtimeHub,
  page_size: i64,
}

impl NotificationDispatcher {
  pub fn new(
    notifications: Arc<dyn NotificationStore>,
    roles: Arc<dyn RoleDirectory>,
    hub: RealtimeHub,
    page_size: i64,
  ) -> Self {
    Self {
      notifications,
      roles,
      hub,
      page_size,
    }
  }

  /// Inserts one notification and reports failure.
  #[instrument(name = "NotificationDispatcher::try_notify", skip(self, draft), fields(kind = %draft.kind), err(Display))]
  pub async fn try_notify(&self, user_id: Uuid, draft: NotificationDraft) -> BagworksResult<Notification> {
    let notification = self.notifications.insert_notification(NewNotification { user_id, draft }).await?;
    debug!(notification_id = %notification.id, "Notification stored.");
    Ok(notification)
  }

  /// Inserts one notification. Failures are logged, never returned.
  pub async fn notify(&self, user_id: Uuid, draft: NotificationDraft) -> Option<Notification> {
    match self.try_notify(user_id, draft).await {
      Ok(n) => Some(n),
      Err(e) => {
        warn!(%user_id, error = %e, "Notification dropped.");
        None
      }
    }
  }

  pub async fn admin_recipients(&self) -> BagworksResult<Vec<Uuid>> {
    Ok(self.roles.admin_ids().await?)
  }

  /// One notification per admin. Zero admins is a silent no-op. Returns how
  /// many were stored.
  #[instrument(name = "NotificationDispatcher::notify_all_admins", skip_all, fields(title = %draft.title))]
  pub async fn notify_all_admins(&self, draft: NotificationDraft) -> usize {
    let admins = match self.admin_recipients().await {
      Ok(admins) => admins,
      Err(e) => {
        error!(error = %e, "Could not resolve admins; fan-out skipped.");
        return 0;
      }
    };
    let mut delivered = 0;
    for admin_id in admins {
      if self.notify(admin_id, draft.clone()).await.is_some() {
        delivered += 1;
      }
    }
    delivered
  }

  pub async fn notify_admin_new_order(&self, customer_name: Option<&str>, order_id: Uuid) -> usize {
    self.notify_all_admins(admin_alerts::new_order(customer_name, order_id)).await
  }

  pub async fn notify_admin_new_user(&self, name: Option<&str>, email: Option<&str>) -> usize {
    self.notify_all_admins(admin_alerts::new_user(name, email)).await
  }

  pub async fn notify_admin_quote_request(&self, customer: &str, company: Option<&str>, product: &str) -> usize {
    self.notify_all_admins(admin_alerts::quote_request(customer, company, product)).await
  }

  pub async fn notify_admin_customization(&self, customer: Option<&str>, product: &str, quantity: i32) -> usize {
    self
      .notify_all_admins(admin_alerts::customization(customer, product, quantity))
      .await
  }

  /// The caller's newest notifications, one page.
  pub async fn list(&self, auth: &AuthContext) -> BagworksResult<Vec<Notification>> {
    Ok(self.notifications.list_notifications(auth.user_id, self.page_size).await?)
  }

  pub async fn unread_count(&self, auth: &AuthContext) -> BagworksResult<i64> {
    Ok(self.notifications.unread_notification_count(auth.user_id).await?)
  }

  /// One page plus the unread count, consistent with each other.
  pub async fn page(&self, auth: &AuthContext) -> BagworksResult<(Vec<Notification>, i64)> {
    Ok(self.notifications.notification_page(auth.user_id, self.page_size).await?)
  }

  /// Looks up a notification the caller owns. A stale id is `Ok(None)`.
  async fn owned(&self, auth: &AuthContext, notification_id: Uuid) -> BagworksResult<Option<Notification>> {
    match self.notifications.get_notification(notification_id).await? {
      Some(n) if n.user_id != auth.user_id => Err(BagworksError::Authorization),
      other => Ok(other),
    }
  }

  /// Returns whether a notification was marked. Stale ids are a no-op.
  #[instrument(name = "NotificationDispatcher::mark_read", skip(self, auth), fields(user_id = %auth.user_id))]
  pub async fn mark_read(&self, auth: &AuthContext, notification_id: Uuid) -> BagworksResult<bool> {
    if self.owned(auth, notification_id).await?.is_none() {
      debug!("Notification already gone; nothing to mark.");
      return Ok(false);
    }
    Ok(self.notifications.mark_notification_read(notification_id).await?)
  }

  #[instrument(name = "NotificationDispatcher::mark_all_read", skip_all, fields(user_id = %auth.user_id))]
  pub async fn mark_all_read(&self, auth: &AuthContext) -> BagworksResult<u64> {
    Ok(self.notifications.mark_all_notifications_read(auth.user_id).await?)
  }

  #[instrument(name = "NotificationDispatcher::delete", skip(self, auth), fields(user_id = %auth.user_id))]
  pub async fn delete(&self, auth: &AuthContext, notification_id: Uuid) -> BagworksResult<bool> {
    if self.owned(auth, notification_id).await?.is_none() {
      return Ok(false);
    }
    Ok(self.notifications.delete_notification(notification_id).await?)
  }

  pub fn subscribe(&self, auth: &AuthContext) -> Subscription {
    self.hub.subscribe(RealtimeFilter::NotificationsFor(auth.user_id))
  }

  /// Opens the caller's live feed: the current page plus a subscription for
  /// what arrives afterwards.
  pub async fn open_feed(&self, auth: &AuthContext) -> BagworksResult<NotificationFeed> {
    // Subscribe before loading so nothing inserted in between is missed.
    let subscription = self.subscribe(auth);
    // Inserts after the snapshot arrive as events; ones inside it are skipped by id.
    let (items, unread) = self.page(auth).await?;
    Ok(NotificationFeed {
      items,
      unread,
      subscription,
    })
  }
}

/// Client-side view of a user's inbox, updated from realtime events without
/// refetching. Dropping it ends the subscription.
pub struct NotificationFeed {
  items: Vec<Notification>,
  unread: i64,
  subscription: Subscription,
}

impl NotificationFeed {
  /// Newest first.
  pub fn items(&self) -> &[Notification] {
    &self.items
  }

  pub fn unread_count(&self) -> i64 {
    self.unread
  }

  fn apply(&mut self, event: RealtimeEvent) -> Option<Notification> {
    let RealtimeEvent::NotificationInserted(notification) = event else {
      return None;
    };
    if self.items.iter().any(|n| n.id == notification.id) {
      return None;
    }
    if !notification.is_read {
      self.unread += 1;
    }
    self.items.insert(0, notification.clone());
    Some(notification)
  }

  /// Applies every event already delivered. Returns how many were new.
  pub fn apply_pending(&mut self) -> usize {
    let mut applied = 0;
    while let Some(event) = self.subscription.try_recv() {
      if self.apply(event).is_some() {
        applied += 1;
      }
    }
    applied
  }

  /// Waits for the next new notification and applies it.
  pub async fn next(&mut self) -> Option<Notification> {
    loop {
      let event = self.subscription.recv().await?;
      if let Some(n) = self.apply(event) {
        return Some(n);
      }
    }
  }

  /// Mirrors a successful mark-read call locally.
  pub fn mark_read_locally(&mut self, notification_id: Uuid) {
    if let Some(n) = self.items.iter_mut().find(|n| n.id == notification_id && !n.is_read) {
      n.is_read = true;
      self.unread = (self.unread - 1).max(0);
    }
  }

  pub fn mark_all_read_locally(&mut self) {
    self.items.iter_mut().for_each(|n| n.is_read = true);
    self.unread = 0;
  }
}

#[cfg(test)]
mod tests {
  use super::admin_alerts;

  #[test]
  fn admin_alert_texts() {
    let order = admin_alerts::new_order(None, uuid::Uuid::nil());
    assert_eq!(order.title, "New Order Received");
    assert_eq!(order.message, "A customer has placed a new order.");

    let user = admin_alerts::new_user(Some("Ravi"), Some("ravi@example.com"));
    assert_eq!(user.message, "Ravi (ravi@example.com) has joined.");

    let quote = admin_alerts::quote_request("Meera", Some("Loom Co"), "Canvas Tote");
    assert_eq!(quote.message, "Meera (Loom Co) requested a quote for Canvas Tote.");

    let custom = admin_alerts::customization(Some(" "), "Jute Bag", 40);
    assert_eq!(custom.message, "A customer added Jute Bag (qty: 40) to cart with customizations.");
  }
}
