// bagworks/src/model/mod.rs

//! Storefront records. These are plain owned values; persistence lives
//! behind the traits in [`crate::store`].

pub mod auth;
pub mod cart;
pub mod customization;
pub mod message;
pub mod notification;
pub mod order;
pub mod product;
pub mod profile;

pub use auth::{AuthContext, Role};
pub use cart::{CartItem, NewCartItem};
pub use customization::Customization;
pub use message::{NewOrderMessage, OrderMessage};
pub use notification::{NewNotification, Notification, NotificationDraft, NotificationType};
pub use order::{
  NewOrder, NewOrderItem, Order, OrderItem, OrderStatus, OrderTimeline, OrderWithItems, StatusMessages, StepState,
  TimelineStep, UnknownStatus,
};
pub use product::{Product, ProductSnapshot};
pub use profile::{CustomerPreferences, PreferencesUpdate, Profile, ProfileUpdate};
