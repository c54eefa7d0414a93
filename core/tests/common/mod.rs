// tests/common/mod.rs
#![allow(dead_code)] // Not every test file uses every fixture.

use async_trait::async_trait;
use bagworks::model::{Customization, NotificationType, Product, Profile, Role};
use bagworks::outbox::OrderWebhook;
use bagworks::store::InMemoryStore;
use bagworks::{AuthContext, Notification, Storefront, StorefrontSettings};
use chrono::Utc;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Webhook double ---

/// Records every call. Can be told to fail a number of times first.
#[derive(Default)]
pub struct RecordingWebhook {
  calls: Mutex<Vec<Uuid>>,
  failures_left: AtomicU32,
}

impl RecordingWebhook {
  pub fn failing(times: u32) -> Self {
    Self {
      calls: Mutex::new(Vec::new()),
      failures_left: AtomicU32::new(times),
    }
  }

  pub fn always_failing() -> Self {
    Self::failing(u32::MAX)
  }

  pub fn calls(&self) -> Vec<Uuid> {
    self.calls.lock().clone()
  }
}

#[async_trait]
impl OrderWebhook for RecordingWebhook {
  async fn order_placed(&self, order_id: Uuid) -> anyhow::Result<()> {
    self.calls.lock().push(order_id);
    let left = self.failures_left.load(Ordering::SeqCst);
    if left == 0 {
      return Ok(());
    }
    if left != u32::MAX {
      self.failures_left.store(left - 1, Ordering::SeqCst);
    }
    Err(anyhow::anyhow!("webhook endpoint returned 503"))
  }
}

// --- Storefront fixture ---

pub struct Shop {
  pub storefront: Storefront,
  pub store: Arc<InMemoryStore>,
  pub webhook: Arc<RecordingWebhook>,
  pub customer: AuthContext,
  pub admin: AuthContext,
}

impl Shop {
  /// Notifications a user holds, oldest first.
  pub fn inbox(&self, user_id: Uuid) -> Vec<Notification> {
    self
      .store
      .all_notifications()
      .into_iter()
      .filter(|n| n.user_id == user_id)
      .collect()
  }

  pub fn inbox_of_kind(&self, user_id: Uuid, kind: NotificationType) -> Vec<Notification> {
    self.inbox(user_id).into_iter().filter(|n| n.kind == kind).collect()
  }

  pub async fn add_admin(&self) -> AuthContext {
    let admin_id = Uuid::new_v4();
    self.store.grant_role(admin_id, Role::Admin);
    self.storefront.authenticate(admin_id).await.unwrap()
  }

  pub async fn add_customer(&self) -> AuthContext {
    let user_id = Uuid::new_v4();
    self.store.put_profile(complete_profile(user_id, "Kiran Shah"));
    self.storefront.authenticate(user_id).await.unwrap()
  }

  pub fn add_product(&self, name: &str, price_cents: i64, delivery_days: Option<i32>) -> Product {
    self.store.add_product(product(name, price_cents, delivery_days))
  }
}

/// A storefront with one admin and one customer whose profile is complete.
pub async fn shop() -> Shop {
  shop_with(StorefrontSettings::default(), RecordingWebhook::default()).await
}

pub async fn shop_with(settings: StorefrontSettings, webhook: RecordingWebhook) -> Shop {
  setup_tracing();
  let webhook = Arc::new(webhook);
  let (storefront, store) = Storefront::in_memory_with_webhook(settings, webhook.clone());

  let admin_id = Uuid::new_v4();
  store.grant_role(admin_id, Role::Admin);
  let customer_id = Uuid::new_v4();
  store.put_profile(complete_profile(customer_id, "Asha Rao"));

  let admin = storefront.authenticate(admin_id).await.unwrap();
  let customer = storefront.authenticate(customer_id).await.unwrap();
  Shop {
    storefront,
    store,
    webhook,
    customer,
    admin,
  }
}

/// A shop without any admin, for the "no recipients" paths.
pub async fn shop_without_admins() -> Shop {
  setup_tracing();
  let webhook = Arc::new(RecordingWebhook::default());
  let (storefront, store) = Storefront::in_memory_with_webhook(StorefrontSettings::default(), webhook.clone());
  let customer_id = Uuid::new_v4();
  store.put_profile(complete_profile(customer_id, "Asha Rao"));
  let customer = storefront.authenticate(customer_id).await.unwrap();
  Shop {
    storefront,
    store,
    webhook,
    customer,
    // Never granted, so never an admin.
    admin: AuthContext::customer(Uuid::new_v4()),
  }
}

pub fn complete_profile(user_id: Uuid, full_name: &str) -> Profile {
  Profile {
    id: user_id,
    email: Some(format!("{}@example.com", full_name.split(' ').next().unwrap_or("user").to_lowercase())),
    full_name: Some(full_name.to_string()),
    business_name: Some("Rao Textiles".to_string()),
    phone: Some("+91 98450 00000".to_string()),
    address: Some("12 Mill Road".to_string()),
    city: Some("Coimbatore".to_string()),
    ..Default::default()
  }
}

pub fn product(name: &str, price_cents: i64, delivery_days: Option<i32>) -> Product {
  Product {
    id: Uuid::new_v4(),
    name: name.to_string(),
    product_type: "Jute".to_string(),
    size: Some("Medium".to_string()),
    price_cents,
    images: vec![],
    description: None,
    moq: 100,
    delivery_days,
    features: vec!["Reusable".to_string()],
    printing_options: vec!["Screen".to_string()],
    dimensions: vec!["Small".to_string(), "Medium".to_string(), "Large".to_string()],
    created_at: Utc::now(),
  }
}

pub fn logo_customization() -> Customization {
  Customization {
    colors: vec!["Red".to_string(), "Blue".to_string()],
    print_type: Some("Screen".to_string()),
    custom_text: Some("ACME".to_string()),
    logo_ref: Some("logos/acme.png".to_string()),
  }
}
