// bagworks/src/services/status.rs

//! Order Status State Machine.
//!
//! Only admins move an order between statuses. Any status may follow any
//! other: admins use this to correct mistakes, so there is no transition
//! guard. Every accepted change notifies the order's customer.

use crate::error::{BagworksError, BagworksResult};
use crate::model::{AuthContext, NotificationDraft, NotificationType, Order, OrderStatus, StatusMessages};
use crate::outbox::{OutboxProcessor, SideEffect};
use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};
use crate::registry::Workflows;
use crate::store::OrderStore;

use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub struct StatusChangeContext {
  auth: AuthContext,
  order_id: Uuid,
  new_status: OrderStatus,
  updated: Option<Order>,
}

pub struct OrderStatusMachine {
  workflows: Arc<Workflows<BagworksError>>,
}

impl OrderStatusMachine {
  pub fn new(
    workflows: Arc<Workflows<BagworksError>>,
    orders: Arc<dyn OrderStore>,
    effects: Arc<OutboxProcessor>,
    messages: StatusMessages,
  ) -> Self {
    workflows.register(status_pipeline(orders, effects, Arc::new(messages)));
    Self { workflows }
  }

  /// Sets the status and notifies the customer.
  ///
  /// Non-admins get [`BagworksError::Authorization`]. An order that no
  /// longer exists is skipped: `Ok(None)` and no notification.
  #[instrument(
    name = "OrderStatusMachine::set_status",
    skip(self, auth),
    fields(actor = %auth.user_id),
    err(Display)
  )]
  pub async fn set_status(
    &self,
    auth: &AuthContext,
    order_id: Uuid,
    new_status: OrderStatus,
  ) -> BagworksResult<Option<Order>> {
    let ctx_data = ContextData::new(StatusChangeContext {
      auth: auth.clone(),
      order_id,
      new_status,
      updated: None,
    });
    match self.workflows.run(ctx_data.clone()).await? {
      PipelineResult::Completed => Ok(ctx_data.write().updated.take()),
      PipelineResult::Stopped => Ok(None),
    }
  }
}

fn status_pipeline(
  orders: Arc<dyn OrderStore>,
  effects: Arc<OutboxProcessor>,
  messages: Arc<StatusMessages>,
) -> Pipeline<StatusChangeContext, BagworksError> {
  let mut p = Pipeline::<StatusChangeContext, BagworksError>::new(
    "order_status",
    &[
      ("authorize", false),
      ("persist_status", false),
      ("queue_customer_notice", false),
      ("deliver_side_effects", true),
    ],
  );

  p.on_root("authorize", |ctx_data: ContextData<StatusChangeContext>| async move {
    ctx_data.read().auth.require_admin()?;
    Ok::<_, BagworksError>(PipelineControl::Continue)
  });

  let store = orders;
  p.on_root("persist_status", move |ctx_data: ContextData<StatusChangeContext>| {
    let store = store.clone();
    async move {
      let (order_id, new_status) = ctx_data.with(|c| (c.order_id, c.new_status));
      let previous = store.get_order(order_id).await?.map(|o| o.status);
      match store.update_order_status(order_id, new_status).await? {
        Some(order) => {
          info!(%order_id, from = ?previous, to = %new_status, "Order status changed.");
          ctx_data.update(|c| c.updated = Some(order));
          Ok::<_, BagworksError>(PipelineControl::Continue)
        }
        None => {
          warn!(%order_id, "Status change for an order that no longer exists; skipped.");
          Ok(PipelineControl::Stop)
        }
      }
    }
  });

  let queue = effects.clone();
  p.on_root("queue_customer_notice", move |ctx_data: ContextData<StatusChangeContext>| {
    let queue = queue.clone();
    let messages = messages.clone();
    async move {
      let order = ctx_data
        .read()
        .updated
        .clone()
        .ok_or_else(|| BagworksError::Internal("status notice without an order".to_string()))?;
      let draft = NotificationDraft::new(
        messages.title(),
        messages.message_for(order.status),
        NotificationType::Order,
      )
      .for_order(order.id);
      queue.outbox().enqueue(SideEffect::Notify {
        user_id: order.user_id,
        draft,
      });
      Ok::<_, BagworksError>(PipelineControl::Continue)
    }
  });

  let inline = effects.is_inline();
  p.on_root("deliver_side_effects", move |_ctx_data: ContextData<StatusChangeContext>| {
    let effects = effects.clone();
    async move {
      effects.process_due().await;
      Ok::<_, BagworksError>(PipelineControl::Continue)
    }
  });
  p.skip_step_if("deliver_side_effects", move |_| !inline);

  p
}
