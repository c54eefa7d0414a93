// bagworks/src/model/notification.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
  Order,
  Quote,
  Customization,
  User,
  Info,
}

impl NotificationType {
  pub fn as_str(&self) -> &'static str {
    match self {
      NotificationType::Order => "order",
      NotificationType::Quote => "quote",
      NotificationType::Customization => "customization",
      NotificationType::User => "user",
      NotificationType::Info => "info",
    }
  }

  /// Unknown values read back as `Info`.
  pub fn parse_lenient(raw: &str) -> Self {
    match raw {
      "order" => NotificationType::Order,
      "quote" => NotificationType::Quote,
      "customization" => NotificationType::Customization,
      "user" => NotificationType::User,
      _ => NotificationType::Info,
    }
  }
}

impl fmt::Display for NotificationType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
  pub id: Uuid,
  pub user_id: Uuid,
  pub title: String,
  pub message: String,
  #[serde(rename = "type")]
  pub kind: NotificationType,
  pub order_id: Option<Uuid>,
  /// Only ever goes from false to true.
  pub is_read: bool,
  pub created_at: DateTime<Utc>,
}

/// Content of a notification, not yet addressed to a recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDraft {
  pub title: String,
  pub message: String,
  pub kind: NotificationType,
  pub order_id: Option<Uuid>,
}

impl NotificationDraft {
  pub fn new(title: impl Into<String>, message: impl Into<String>, kind: NotificationType) -> Self {
    Self {
      title: title.into(),
      message: message.into(),
      kind,
      order_id: None,
    }
  }

  pub fn for_order(mut self, order_id: Uuid) -> Self {
    self.order_id = Some(order_id);
    self
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
  pub user_id: Uuid,
  pub draft: NotificationDraft,
}
