// bagworks/src/services/messaging.rs

//! Order Messaging Channel: a two-party thread per order between the
//! customer and an admin.

use crate::error::{BagworksError, BagworksResult};
use crate::model::{AuthContext, NewOrderMessage, NotificationDraft, NotificationType, Order, OrderMessage, Role};
use crate::outbox::{OutboxProcessor, SideEffect};
use crate::pipeline::{ContextData, Pipeline, PipelineControl};
use crate::realtime::{RealtimeEvent, RealtimeFilter, RealtimeHub, Subscription};
use crate::registry::Workflows;
use crate::store::{MessageStore, OrderStore, RoleDirectory};

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Cuts `text` to `max_chars` characters, marking the cut with `...`.
pub fn preview(text: &str, max_chars: usize) -> String {
  let mut chars = text.chars();
  let head: String = chars.by_ref().take(max_chars).collect();
  if chars.next().is_some() {
    format!("{}...", head)
  } else {
    head
  }
}

pub struct SendMessageContext {
  auth: AuthContext,
  order_id: Uuid,
  recipient_id: Uuid,
  text: String,
  sent: Option<OrderMessage>,
}

#[derive(Clone)]
pub struct OrderMessagingChannel {
  workflows: Arc<Workflows<BagworksError>>,
  orders: Arc<dyn OrderStore>,
  messages: Arc<dyn MessageStore>,
  roles: Arc<dyn RoleDirectory>,
  hub: RealtimeHub,
}

impl OrderMessagingChannel {
  pub fn new(
    workflows: Arc<Workflows<BagworksError>>,
    orders: Arc<dyn OrderStore>,
    messages: Arc<dyn MessageStore>,
    roles: Arc<dyn RoleDirectory>,
    hub: RealtimeHub,
    effects: Arc<OutboxProcessor>,
    preview_chars: usize,
  ) -> Self {
    workflows.register(send_pipeline(
      orders.clone(),
      messages.clone(),
      roles.clone(),
      effects,
      preview_chars,
    ));
    Self {
      workflows,
      orders,
      messages,
      roles,
      hub,
    }
  }

  /// Loads the order and checks the caller takes part in its thread.
  async fn thread_order(&self, auth: &AuthContext, order_id: Uuid) -> BagworksResult<Order> {
    let order = self
      .orders
      .get_order(order_id)
      .await?
      .ok_or_else(|| BagworksError::NotFound(format!("order {}", order_id)))?;
    auth.require_owner_or_admin(order.user_id)?;
    Ok(order)
  }

  /// Who the caller talks to on this order: the customer for an admin, the
  /// primary admin for a customer. `None` means nobody can receive, so
  /// sending should be disabled.
  pub async fn resolve_counterpart(&self, auth: &AuthContext, order_id: Uuid) -> BagworksResult<Option<Uuid>> {
    let order = self.thread_order(auth, order_id).await?;
    if auth.is_admin() {
      return Ok(Some(order.user_id));
    }
    match self.roles.primary_admin().await {
      Ok(admin) => {
        if admin.is_none() {
          warn!(%order_id, "No admin available to receive messages.");
        }
        Ok(admin)
      }
      Err(e) => {
        warn!(%order_id, error = %e, "Admin lookup failed; messaging disabled.");
        Ok(None)
      }
    }
  }

  /// Oldest first.
  pub async fn list_messages(&self, auth: &AuthContext, order_id: Uuid) -> BagworksResult<Vec<OrderMessage>> {
    self.thread_order(auth, order_id).await?;
    Ok(self.messages.list_messages(order_id).await?)
  }

  /// Posts a message and notifies the recipient.
  #[instrument(
    name = "OrderMessagingChannel::send",
    skip(self, auth, text),
    fields(sender = %auth.user_id),
    err(Display)
  )]
  pub async fn send(
    &self,
    auth: &AuthContext,
    order_id: Uuid,
    recipient_id: Uuid,
    text: &str,
  ) -> BagworksResult<OrderMessage> {
    let ctx_data = ContextData::new(SendMessageContext {
      auth: auth.clone(),
      order_id,
      recipient_id,
      text: text.to_string(),
      sent: None,
    });
    self.workflows.run(ctx_data.clone()).await?;
    let sent = ctx_data.write().sent.take();
    sent.ok_or_else(|| BagworksError::Internal("message pipeline finished without a message".to_string()))
  }

  /// Sends to whoever [`Self::resolve_counterpart`] picks.
  pub async fn send_to_counterpart(
    &self,
    auth: &AuthContext,
    order_id: Uuid,
    text: &str,
  ) -> BagworksResult<OrderMessage> {
    let recipient = self
      .resolve_counterpart(auth, order_id)
      .await?
      .ok_or_else(|| BagworksError::Precondition("no admin is available to receive messages".to_string()))?;
    self.send(auth, order_id, recipient, text).await
  }

  /// Marks every unread message addressed to the caller in this thread.
  #[instrument(name = "OrderMessagingChannel::mark_thread_read", skip(self, auth), fields(reader = %auth.user_id))]
  pub async fn mark_thread_read(&self, auth: &AuthContext, order_id: Uuid) -> BagworksResult<u64> {
    self.thread_order(auth, order_id).await?;
    let marked = self.messages.mark_thread_read(order_id, auth.user_id).await?;
    debug!(marked, "Thread marked read.");
    Ok(marked)
  }

  pub async fn unread_count(&self, auth: &AuthContext, order_id: Uuid) -> BagworksResult<i64> {
    self.thread_order(auth, order_id).await?;
    Ok(self.messages.unread_message_count(order_id, auth.user_id).await?)
  }

  pub async fn subscribe(&self, auth: &AuthContext, order_id: Uuid) -> BagworksResult<Subscription> {
    self.thread_order(auth, order_id).await?;
    Ok(self.hub.subscribe(RealtimeFilter::OrderThread(order_id)))
  }

  /// Opens the thread for viewing: loads it, marks it read, and starts
  /// following new messages.
  pub async fn open_thread(&self, auth: &AuthContext, order_id: Uuid) -> BagworksResult<ThreadViewer> {
    let subscription = self.subscribe(auth, order_id).await?;
    let messages = self.messages.list_messages(order_id).await?;
    self.messages.mark_thread_read(order_id, auth.user_id).await?;
    let messages = messages
      .into_iter()
      .map(|mut m| {
        if m.recipient_id == auth.user_id {
          m.is_read = true;
        }
        m
      })
      .collect();
    Ok(ThreadViewer {
      order_id,
      viewer_id: auth.user_id,
      messages,
      unread: 0,
      open: true,
      store: self.messages.clone(),
      subscription,
    })
  }
}

/// Client-side view of one order thread.
///
/// While open, messages addressed to the viewer are marked read as they
/// arrive. While closed they only raise the unread badge. Dropping the
/// viewer ends its subscription; writes already sent are unaffected.
pub struct ThreadViewer {
  order_id: Uuid,
  viewer_id: Uuid,
  messages: Vec<OrderMessage>,
  unread: i64,
  open: bool,
  store: Arc<dyn MessageStore>,
  subscription: Subscription,
}

impl ThreadViewer {
  /// Oldest first.
  pub fn messages(&self) -> &[OrderMessage] {
    &self.messages
  }

  pub fn unread_badge(&self) -> i64 {
    self.unread
  }

  pub fn is_open(&self) -> bool {
    self.open
  }

  pub fn close(&mut self) {
    self.open = false;
  }

  /// Reopens the thread and clears the badge.
  pub async fn reopen(&mut self) -> BagworksResult<()> {
    self.open = true;
    self.store.mark_thread_read(self.order_id, self.viewer_id).await?;
    self.mark_local_read();
    self.unread = 0;
    Ok(())
  }

  fn mark_local_read(&mut self) {
    let viewer = self.viewer_id;
    self
      .messages
      .iter_mut()
      .filter(|m| m.recipient_id == viewer)
      .for_each(|m| m.is_read = true);
  }

  async fn apply(&mut self, event: RealtimeEvent) -> BagworksResult<Option<OrderMessage>> {
    let RealtimeEvent::MessageInserted(message) = event else {
      return Ok(None);
    };
    if self.messages.iter().any(|m| m.id == message.id) {
      return Ok(None);
    }
    self.messages.push(message.clone());
    if message.recipient_id == self.viewer_id {
      if self.open {
        self.store.mark_thread_read(self.order_id, self.viewer_id).await?;
        self.mark_local_read();
      } else {
        self.unread += 1;
      }
    }
    Ok(Some(message))
  }

  /// Applies every message already delivered. Returns how many were new.
  pub async fn apply_pending(&mut self) -> BagworksResult<usize> {
    let mut applied = 0;
    while let Some(event) = self.subscription.try_recv() {
      if self.apply(event).await?.is_some() {
        applied += 1;
      }
    }
    Ok(applied)
  }

  /// Waits for the next new message. `None` once the channel is gone.
  pub async fn next(&mut self) -> BagworksResult<Option<OrderMessage>> {
    loop {
      let Some(event) = self.subscription.recv().await else {
        return Ok(None);
      };
      if let Some(message) = self.apply(event).await? {
        return Ok(Some(message));
      }
    }
  }
}

fn send_pipeline(
  orders: Arc<dyn OrderStore>,
  messages: Arc<dyn MessageStore>,
  roles: Arc<dyn RoleDirectory>,
  effects: Arc<OutboxProcessor>,
  preview_chars: usize,
) -> Pipeline<SendMessageContext, BagworksError> {
  let mut p = Pipeline::<SendMessageContext, BagworksError>::new(
    "order_message",
    &[
      ("validate", false),
      ("persist_message", false),
      ("queue_recipient_notice", false),
      ("deliver_side_effects", true),
    ],
  );

  p.on_root("validate", move |ctx_data: ContextData<SendMessageContext>| {
    let orders = orders.clone();
    let roles = roles.clone();
    async move {
      let (auth, order_id, recipient_id, blank) =
        ctx_data.with(|c| (c.auth.clone(), c.order_id, c.recipient_id, c.text.trim().is_empty()));
      if blank {
        return Err(BagworksError::Validation("Message cannot be empty".to_string()));
      }
      if recipient_id == auth.user_id {
        return Err(BagworksError::Validation("Cannot send a message to yourself".to_string()));
      }
      let order = orders
        .get_order(order_id)
        .await?
        .ok_or_else(|| BagworksError::NotFound(format!("order {}", order_id)))?;
      auth.require_owner_or_admin(order.user_id)?;

      // The thread is between the order's customer and an admin.
      let recipient_ok = if auth.is_admin() {
        recipient_id == order.user_id
      } else {
        roles.roles_for(recipient_id).await?.contains(&Role::Admin)
      };
      if !recipient_ok {
        return Err(BagworksError::Validation(
          "Recipient is not part of this order's thread".to_string(),
        ));
      }
      Ok(PipelineControl::Continue)
    }
  });

  let store = messages;
  p.on_root("persist_message", move |ctx_data: ContextData<SendMessageContext>| {
    let store = store.clone();
    async move {
      let new_message = ctx_data.with(|c| NewOrderMessage {
        order_id: c.order_id,
        sender_id: c.auth.user_id,
        recipient_id: c.recipient_id,
        message: c.text.trim().to_string(),
      });
      let sent = store.insert_message(new_message).await?;
      info!(message_id = %sent.id, order_id = %sent.order_id, "Message sent.");
      ctx_data.update(|c| c.sent = Some(sent));
      Ok::<_, BagworksError>(PipelineControl::Continue)
    }
  });

  let queue = effects.clone();
  p.on_root("queue_recipient_notice", move |ctx_data: ContextData<SendMessageContext>| {
    let queue = queue.clone();
    async move {
      let (sent, from_admin) = ctx_data.with(|c| (c.sent.clone(), c.auth.is_admin()));
      let sent = sent.ok_or_else(|| BagworksError::Internal("notice for an unsent message".to_string()))?;
      let title = if from_admin {
        "New message from Admin"
      } else {
        "New message from Customer"
      };
      let draft = NotificationDraft::new(title, preview(&sent.message, preview_chars), NotificationType::Order)
        .for_order(sent.order_id);
      queue.outbox().enqueue(SideEffect::Notify {
        user_id: sent.recipient_id,
        draft,
      });
      Ok::<_, BagworksError>(PipelineControl::Continue)
    }
  });

  let inline = effects.is_inline();
  p.on_root("deliver_side_effects", move |_ctx_data: ContextData<SendMessageContext>| {
    let effects = effects.clone();
    async move {
      effects.process_due().await;
      Ok::<_, BagworksError>(PipelineControl::Continue)
    }
  });
  p.skip_step_if("deliver_side_effects", move |_| !inline);

  p
}

#[cfg(test)]
mod tests {
  use super::preview;

  #[test]
  fn preview_keeps_short_text() {
    assert_eq!(preview("hello", 100), "hello");
    assert_eq!(preview(&"a".repeat(100), 100), "a".repeat(100));
  }

  #[test]
  fn preview_truncates_on_characters() {
    let long = "é".repeat(150);
    let cut = preview(&long, 100);
    assert!(cut.ends_with("..."));
    assert_eq!(cut.chars().count(), 103);
  }
}
