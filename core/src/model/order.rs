// bagworks/src/model/order.rs
use super::customization::Customization;
use super::product::ProductSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  /// Older rows say `in_production`.
  #[serde(alias = "in_production")]
  Processing,
  Completed,
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Processing,
    OrderStatus::Completed,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Confirmed => "confirmed",
      OrderStatus::Processing => "processing",
      OrderStatus::Completed => "completed",
      OrderStatus::Cancelled => "cancelled",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "Pending",
      OrderStatus::Confirmed => "Confirmed",
      OrderStatus::Processing => "Processing",
      OrderStatus::Completed => "Completed",
      OrderStatus::Cancelled => "Cancelled",
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "unknown order status '{}'", self.0)
  }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for OrderStatus {
  type Err = UnknownStatus;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "pending" => Ok(OrderStatus::Pending),
      "confirmed" => Ok(OrderStatus::Confirmed),
      "processing" | "in_production" => Ok(OrderStatus::Processing),
      "completed" => Ok(OrderStatus::Completed),
      "cancelled" => Ok(OrderStatus::Cancelled),
      other => Err(UnknownStatus(other.to_string())),
    }
  }
}

/// Customer-facing text sent when an order moves to a status.
#[derive(Debug, Clone)]
pub struct StatusMessages {
  title: String,
  messages: HashMap<OrderStatus, String>,
}

impl Default for StatusMessages {
  fn default() -> Self {
    let messages = [
      (OrderStatus::Pending, "Your order has been received and is awaiting confirmation."),
      (OrderStatus::Confirmed, "Great news! Your order has been confirmed and will be scheduled for production."),
      (OrderStatus::Processing, "Your order is now in production."),
      (OrderStatus::Completed, "Your order has been completed and is ready for dispatch."),
      (OrderStatus::Cancelled, "Your order has been cancelled. Please contact us if you have any questions."),
    ]
    .into_iter()
    .map(|(status, text)| (status, text.to_string()))
    .collect();

    Self {
      title: "Order Status Updated".to_string(),
      messages,
    }
  }
}

impl StatusMessages {
  pub fn title(&self) -> &str {
    &self.title
  }

  /// The message for `status`, or a generic one naming the status.
  pub fn message_for(&self, status: OrderStatus) -> String {
    self
      .messages
      .get(&status)
      .cloned()
      .unwrap_or_else(|| format!("Your order status has been updated to {}.", status.label()))
  }

  pub fn with_message(mut self, status: OrderStatus, message: impl Into<String>) -> Self {
    self.messages.insert(status, message.into());
    self
  }

  pub fn without_message(mut self, status: OrderStatus) -> Self {
    self.messages.remove(&status);
    self
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  /// Summary of the first line, kept for list views.
  pub product_name: String,
  pub product_type: String,
  pub product_size: Option<String>,
  /// Sum over all lines.
  pub quantity: i32,
  pub price_per_unit_cents: i64,
  pub total_price_cents: i64,
  pub delivery_days: i32,
  pub expected_completion_date: DateTime<Utc>,
  pub status: OrderStatus,
  pub notes: Option<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
  pub user_id: Uuid,
  pub product_name: String,
  pub product_type: String,
  pub product_size: Option<String>,
  pub quantity: i32,
  pub price_per_unit_cents: i64,
  pub total_price_cents: i64,
  pub delivery_days: i32,
  pub expected_completion_date: DateTime<Utc>,
  pub status: OrderStatus,
  pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  #[serde(flatten)]
  pub product: ProductSnapshot,
  pub quantity: i32,
  pub notes: String,
  pub customization: Customization,
  pub custom_text: Option<String>,
  pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
  pub product: ProductSnapshot,
  pub quantity: i32,
  pub notes: String,
  pub customization: Customization,
}

impl NewOrderItem {
  pub fn custom_text(&self) -> Option<&str> {
    self.customization.custom_text.as_deref()
  }

  pub fn logo_url(&self) -> Option<&str> {
    self.customization.logo_ref.as_deref()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderWithItems {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
  Completed,
  Current,
  Upcoming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineStep {
  pub status: OrderStatus,
  pub label: &'static str,
  pub state: StepState,
}

/// Progress view of an order for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderTimeline {
  Progress {
    steps: Vec<TimelineStep>,
    expected_completion_date: DateTime<Utc>,
  },
  Cancelled,
}

const TIMELINE: [(OrderStatus, &str); 4] = [
  (OrderStatus::Pending, "Order Placed"),
  (OrderStatus::Confirmed, "Confirmed"),
  (OrderStatus::Processing, "Processing"),
  (OrderStatus::Completed, "Completed"),
];

impl OrderTimeline {
  pub fn for_order(order: &Order) -> Self {
    if order.status == OrderStatus::Cancelled {
      return OrderTimeline::Cancelled;
    }
    let current = TIMELINE.iter().position(|(s, _)| *s == order.status).unwrap_or(0);
    let steps = TIMELINE
      .iter()
      .enumerate()
      .map(|(idx, (status, label))| TimelineStep {
        status: *status,
        label,
        state: match idx.cmp(&current) {
          std::cmp::Ordering::Less => StepState::Completed,
          std::cmp::Ordering::Equal => StepState::Current,
          std::cmp::Ordering::Greater => StepState::Upcoming,
        },
      })
      .collect();
    OrderTimeline::Progress {
      steps,
      expected_completion_date: order.expected_completion_date,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  fn order_with(status: OrderStatus) -> Order {
    let now = Utc::now();
    Order {
      id: Uuid::new_v4(),
      user_id: Uuid::new_v4(),
      product_name: "Tote".into(),
      product_type: "Jute".into(),
      product_size: None,
      quantity: 10,
      price_per_unit_cents: 0,
      total_price_cents: 0,
      delivery_days: 7,
      expected_completion_date: now + Duration::days(7),
      status,
      notes: None,
      created_at: now,
    }
  }

  #[test]
  fn parses_in_production_alias() {
    assert_eq!("in_production".parse::<OrderStatus>(), Ok(OrderStatus::Processing));
    assert_eq!(" Confirmed ".parse::<OrderStatus>(), Ok(OrderStatus::Confirmed));
    assert!("shipped".parse::<OrderStatus>().is_err());
    let from_json: OrderStatus = serde_json::from_str("\"in_production\"").unwrap();
    assert_eq!(from_json, OrderStatus::Processing);
  }

  #[test]
  fn status_message_falls_back_to_generic_text() {
    let table = StatusMessages::default().without_message(OrderStatus::Confirmed);
    assert_eq!(
      table.message_for(OrderStatus::Confirmed),
      "Your order status has been updated to Confirmed."
    );
    assert!(table.message_for(OrderStatus::Cancelled).contains("cancelled"));
  }

  #[test]
  fn timeline_marks_current_step() {
    let timeline = OrderTimeline::for_order(&order_with(OrderStatus::Confirmed));
    let OrderTimeline::Progress { steps, .. } = timeline else {
      panic!("expected progress timeline");
    };
    let states: Vec<StepState> = steps.iter().map(|s| s.state).collect();
    assert_eq!(
      states,
      vec![StepState::Completed, StepState::Current, StepState::Upcoming, StepState::Upcoming]
    );
  }

  #[test]
  fn cancelled_timeline_is_a_marker() {
    assert_eq!(OrderTimeline::for_order(&order_with(OrderStatus::Cancelled)), OrderTimeline::Cancelled);
  }
}
