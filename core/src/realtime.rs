// bagworks/src/realtime.rs

//! In-process realtime channel for inserts that clients watch live.
//!
//! Stores publish a [`RealtimeEvent`] after each committed notification or
//! message insert. Consumers hold a [`Subscription`] with an explicit
//! [`RealtimeFilter`]; dropping the subscription is the teardown.

use crate::model::{Notification, OrderMessage};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{event, Level};
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealtimeEvent {
  NotificationInserted(Notification),
  MessageInserted(OrderMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealtimeFilter {
  /// Notifications whose `user_id` is this user.
  NotificationsFor(Uuid),
  /// Messages whose `order_id` is this order.
  OrderThread(Uuid),
}

impl RealtimeFilter {
  pub fn matches(&self, event: &RealtimeEvent) -> bool {
    match (self, event) {
      (RealtimeFilter::NotificationsFor(user_id), RealtimeEvent::NotificationInserted(n)) => n.user_id == *user_id,
      (RealtimeFilter::OrderThread(order_id), RealtimeEvent::MessageInserted(m)) => m.order_id == *order_id,
      _ => false,
    }
  }
}

/// Fan-out hub. Cheap to clone; all clones share one channel.
#[derive(Debug, Clone)]
pub struct RealtimeHub {
  sender: broadcast::Sender<RealtimeEvent>,
}

impl Default for RealtimeHub {
  fn default() -> Self {
    Self::new(DEFAULT_CAPACITY)
  }
}

impl RealtimeHub {
  /// When the buffer is full the oldest events are dropped and slow
  /// subscribers skip ahead.
  pub fn new(capacity: usize) -> Self {
    let (sender, _) = broadcast::channel(capacity);
    Self { sender }
  }

  pub fn publish(&self, event: RealtimeEvent) {
    // Zero receivers is not an error.
    let _ = self.sender.send(event);
  }

  pub fn subscribe(&self, filter: RealtimeFilter) -> Subscription {
    Subscription {
      filter,
      receiver: self.sender.subscribe(),
    }
  }

  pub fn subscriber_count(&self) -> usize {
    self.sender.receiver_count()
  }
}

/// A filtered view of the hub. Events arrive in publish order.
#[derive(Debug)]
pub struct Subscription {
  filter: RealtimeFilter,
  receiver: broadcast::Receiver<RealtimeEvent>,
}

impl Subscription {
  pub fn filter(&self) -> RealtimeFilter {
    self.filter
  }

  /// Waits for the next matching event. `None` once the hub is gone.
  pub async fn recv(&mut self) -> Option<RealtimeEvent> {
    loop {
      match self.receiver.recv().await {
        Ok(ev) if self.filter.matches(&ev) => return Some(ev),
        Ok(_) => continue,
        Err(RecvError::Lagged(skipped)) => {
          event!(Level::WARN, skipped, filter = ?self.filter, "Realtime subscriber lagged.");
        }
        Err(RecvError::Closed) => return None,
      }
    }
  }

  /// Drains the next matching event without waiting.
  pub fn try_recv(&mut self) -> Option<RealtimeEvent> {
    loop {
      match self.receiver.try_recv() {
        Ok(ev) if self.filter.matches(&ev) => return Some(ev),
        Ok(_) => continue,
        Err(TryRecvError::Lagged(skipped)) => {
          event!(Level::WARN, skipped, filter = ?self.filter, "Realtime subscriber lagged.");
        }
        Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::NotificationType;
  use chrono::Utc;

  fn notification_for(user_id: Uuid) -> Notification {
    Notification {
      id: Uuid::new_v4(),
      user_id,
      title: "t".into(),
      message: "m".into(),
      kind: NotificationType::Info,
      order_id: None,
      is_read: false,
      created_at: Utc::now(),
    }
  }

  #[tokio::test]
  async fn subscription_only_sees_matching_events() {
    let hub = RealtimeHub::default();
    let me = Uuid::new_v4();
    let mut sub = hub.subscribe(RealtimeFilter::NotificationsFor(me));

    hub.publish(RealtimeEvent::NotificationInserted(notification_for(Uuid::new_v4())));
    let mine = notification_for(me);
    hub.publish(RealtimeEvent::NotificationInserted(mine.clone()));

    assert_eq!(sub.recv().await, Some(RealtimeEvent::NotificationInserted(mine)));
    assert_eq!(sub.try_recv(), None);
  }

  #[test]
  fn dropping_subscription_tears_it_down() {
    let hub = RealtimeHub::default();
    let sub = hub.subscribe(RealtimeFilter::OrderThread(Uuid::new_v4()));
    assert_eq!(hub.subscriber_count(), 1);
    drop(sub);
    assert_eq!(hub.subscriber_count(), 0);
    hub.publish(RealtimeEvent::NotificationInserted(notification_for(Uuid::new_v4())));
  }
}
