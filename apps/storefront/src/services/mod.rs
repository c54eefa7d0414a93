// storefront/src/services/mod.rs
pub mod order_webhook;

pub use order_webhook::HttpOrderWebhook;
