// bagworks/src/storefront.rs

//! `Storefront`: wires the collaborators, the workflow registry, the outbox
//! and every service into one value the server keeps in its state.

use crate::error::{BagworksError, BagworksResult};
use crate::model::AuthContext;
use crate::outbox::{DisabledWebhook, Outbox, OutboxProcessor, OrderWebhook};
use crate::realtime::RealtimeHub;
use crate::registry::Workflows;
use crate::services::{
  AdminDashboard, CartManager, CatalogService, NotificationDispatcher, OrderAggregator, OrderMessagingChannel,
  OrderStatusMachine, ProfileService,
};
use crate::settings::StorefrontSettings;
use crate::store::{InMemoryStore, Stores};

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct Storefront {
  pub stores: Stores,
  pub hub: RealtimeHub,
  pub outbox: Arc<Outbox>,
  pub outbox_processor: Arc<OutboxProcessor>,
  pub workflows: Arc<Workflows<BagworksError>>,
  pub cart: Arc<CartManager>,
  pub orders: Arc<OrderAggregator>,
  pub status: Arc<OrderStatusMachine>,
  pub notifications: NotificationDispatcher,
  pub messaging: OrderMessagingChannel,
  pub catalog: Arc<CatalogService>,
  pub profiles: Arc<ProfileService>,
  pub dashboard: Arc<AdminDashboard>,
  pub settings: Arc<StorefrontSettings>,
}

impl Storefront {
  /// `hub` must be the hub the stores publish inserts on.
  pub fn new(stores: Stores, hub: RealtimeHub, webhook: Arc<dyn OrderWebhook>, settings: StorefrontSettings) -> Self {
    let workflows = Arc::new(Workflows::<BagworksError>::new());
    let outbox = Arc::new(Outbox::with_dead_letter_limit(settings.dead_letter_limit));
    let notifications = NotificationDispatcher::new(
      stores.notifications.clone(),
      stores.roles.clone(),
      hub.clone(),
      settings.notification_page_size,
    );
    let outbox_processor = Arc::new(
      OutboxProcessor::new(outbox.clone(), notifications.clone(), webhook, settings.retry)
        .with_inline(settings.inline_side_effects),
    );

    let cart = Arc::new(CartManager::new(
      stores.carts.clone(),
      stores.catalog.clone(),
      stores.profiles.clone(),
      outbox_processor.clone(),
    ));
    let orders = Arc::new(OrderAggregator::new(
      workflows.clone(),
      cart.clone(),
      stores.carts.clone(),
      stores.catalog.clone(),
      stores.orders.clone(),
      stores.profiles.clone(),
      outbox_processor.clone(),
      settings.default_lead_time_days,
    ));
    let status = Arc::new(OrderStatusMachine::new(
      workflows.clone(),
      stores.orders.clone(),
      outbox_processor.clone(),
      settings.status_messages.clone(),
    ));
    let messaging = OrderMessagingChannel::new(
      workflows.clone(),
      stores.orders.clone(),
      stores.messages.clone(),
      stores.roles.clone(),
      hub.clone(),
      outbox_processor.clone(),
      settings.message_preview_chars,
    );
    let catalog = Arc::new(CatalogService::new(
      stores.catalog.clone(),
      outbox_processor.clone(),
      settings.whatsapp_number.clone(),
    ));
    let profiles = Arc::new(ProfileService::new(stores.profiles.clone(), outbox_processor.clone()));
    let dashboard = Arc::new(AdminDashboard::new(
      stores.orders.clone(),
      stores.profiles.clone(),
      orders.clone(),
    ));

    Self {
      stores,
      hub,
      outbox,
      outbox_processor,
      workflows,
      cart,
      orders,
      status,
      notifications,
      messaging,
      catalog,
      profiles,
      dashboard,
      settings: Arc::new(settings),
    }
  }

  /// A storefront over a fresh [`InMemoryStore`] with the webhook disabled.
  pub fn in_memory(settings: StorefrontSettings) -> (Self, Arc<InMemoryStore>) {
    Self::in_memory_with_webhook(settings, Arc::new(DisabledWebhook))
  }

  pub fn in_memory_with_webhook(
    settings: StorefrontSettings,
    webhook: Arc<dyn OrderWebhook>,
  ) -> (Self, Arc<InMemoryStore>) {
    let hub = RealtimeHub::default();
    let store = Arc::new(InMemoryStore::with_hub(hub.clone()));
    let storefront = Self::new(Stores::from_single(store.clone()), hub, webhook, settings);
    (storefront, store)
  }

  /// Builds the caller's context from a trusted session user id.
  pub async fn authenticate(&self, user_id: Uuid) -> BagworksResult<AuthContext> {
    let roles = self.stores.roles.roles_for(user_id).await?;
    debug!(%user_id, ?roles, "Authenticated.");
    Ok(AuthContext::new(user_id, roles))
  }
}
