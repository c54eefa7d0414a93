// storefront/src/web/handlers/mod.rs

pub mod admin_handlers;
pub mod cart_handlers;
pub mod catalog_handlers;
pub mod message_handlers;
pub mod notification_handlers;
pub mod order_handlers;
pub mod profile_handlers;
