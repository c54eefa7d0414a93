// bagworks/src/lib.rs

//! Bagworks: the order lifecycle core of a custom bag storefront.
//!
//! A customer fills a cart with customized products, checks out into an
//! order, and follows it as admins move it through its statuses. Both sides
//! get inbox notifications and can talk in a per-order thread.
//!
//!  - [`services`] holds the operations: cart, checkout, status changes,
//!    notifications, messaging, catalog, profiles and admin dashboards.
//!  - Multi-step writes run as named-step [`pipeline`]s registered in a
//!    [`registry::Workflows`] keyed by context type.
//!  - Side effects (webhook, notifications) go through the [`outbox`] after
//!    the primary write commits, with their own retry policy.
//!  - Inserts users watch live are published on the [`realtime`] hub.
//!  - Persistence and role lookup sit behind the traits in [`store`], with an
//!    in-memory implementation for tests.

pub mod error;
pub mod model;
pub mod outbox;
pub mod pipeline;
pub mod realtime;
pub mod registry;
pub mod services;
pub mod settings;
pub mod store;
pub mod storefront;

pub use error::{BagworksError, BagworksResult};
pub use model::{
  AuthContext, CartItem, CustomerPreferences, Customization, Notification, NotificationDraft, NotificationType, Order,
  OrderItem, OrderMessage, OrderStatus, OrderTimeline, OrderWithItems, PreferencesUpdate, Product, ProductSnapshot,
  Profile, ProfileUpdate, Role,
};
pub use outbox::{DisabledWebhook, OrderWebhook, Outbox, OutboxProcessor, OutboxReport, RetryPolicy, SideEffect};
pub use pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};
pub use realtime::{RealtimeEvent, RealtimeFilter, RealtimeHub, Subscription};
pub use registry::Workflows;
pub use services::{
  AdminDashboard, AdminStats, CartManager, CatalogService, CheckoutReadiness, CustomerOverview, DirectOrderRequest,
  NotificationDispatcher, NotificationFeed, OrderAggregator, OrderMessagingChannel, OrderStatusMachine,
  ProductQuery, ProductSort, ProfileService, QuoteLink, QuoteRequest, ThreadViewer,
};
pub use settings::StorefrontSettings;
pub use store::Stores;
pub use storefront::Storefront;

pub mod prelude {
  pub use crate::error::{BagworksError, BagworksResult};
  pub use crate::model::{AuthContext, Customization, OrderStatus, ProductSnapshot};
  pub use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};
  pub use crate::storefront::Storefront;
}
