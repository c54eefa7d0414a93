// bagworks/src/model/message.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entry in an order's two-party thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMessage {
  pub id: Uuid,
  pub order_id: Uuid,
  pub sender_id: Uuid,
  pub recipient_id: Uuid,
  pub message: String,
  pub is_read: bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderMessage {
  pub order_id: Uuid,
  pub sender_id: Uuid,
  pub recipient_id: Uuid,
  pub message: String,
}
