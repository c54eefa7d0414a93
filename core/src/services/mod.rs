// bagworks/src/services/mod.rs

//! The storefront's operations, each over the collaborator traits in
//! [`crate::store`].

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod dashboard;
pub mod messaging;
pub mod notifications;
pub mod profiles;
pub mod status;

pub use cart::{CartManager, CheckoutReadiness};
pub use catalog::{CatalogService, ProductQuery, ProductSort, QuoteLink, QuoteRequest};
pub use checkout::{DirectOrderRequest, OrderAggregator};
pub use dashboard::{AdminDashboard, AdminStats, CustomerOverview};
pub use messaging::{OrderMessagingChannel, ThreadViewer};
pub use notifications::{NotificationDispatcher, NotificationFeed};
pub use profiles::ProfileService;
pub use status::OrderStatusMachine;
