// bagworks/src/services/checkout.rs

//! Order Aggregator: turns a cart (or a single catalog product) into one
//! order with its lines.
//!
//! Both flows run the `checkout` pipeline:
//!
//! | step                    | kind        | does                                         |
//! |-------------------------|-------------|----------------------------------------------|
//! | `validate`              | required    | checkout gate, loads cart or product         |
//! | `price_order`           | required    | builds the order row and its lines           |
//! | `persist_order`         | required    | writes order + lines together                |
//! | `queue_side_effects`    | required    | webhook + admin alert into the outbox        |
//! | `drain_cart`            | required    | removes the ordered lines (cart flow only)   |
//! | `deliver_side_effects`  | best-effort | first delivery attempt (inline mode only)    |
//!
//! Nothing is written before `persist_order`. Side effects are queued as
//! soon as the order exists, so a later drain failure still announces it.
//! That failure leaves the order in place and surfaces as
//! [`BagworksError::PartialCheckout`].

use crate::error::{BagworksError, BagworksResult};
use crate::model::{
  AuthContext, CartItem, Customization, NewOrder, NewOrderItem, Order, OrderItem, OrderStatus, OrderTimeline,
  OrderWithItems, Product, Profile,
};
use crate::outbox::{OutboxProcessor, SideEffect};
use crate::pipeline::{ContextData, Pipeline, PipelineControl};
use crate::registry::Workflows;
use crate::services::cart::{check_minimum_order, CartManager};
use crate::services::notifications::admin_alerts;
use crate::store::{CartStore, CatalogStore, OrderStore, ProfileStore};

use chrono::{Duration, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub const MIN_DELIVERY_DAYS: i32 = 1;
pub const MAX_DELIVERY_DAYS: i32 = 365;

/// A single-product order placed straight from the catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DirectOrderRequest {
  pub product_id: Uuid,
  pub size: Option<String>,
  pub quantity: i32,
  pub delivery_days: Option<i32>,
  pub notes: Option<String>,
  #[serde(default)]
  pub customization: Customization,
}

#[derive(Debug, Clone)]
enum CheckoutSource {
  Cart,
  Direct(DirectOrderRequest),
}

/// Run state of one checkout.
pub struct CheckoutContext {
  auth: AuthContext,
  source: CheckoutSource,
  cart_items: Vec<CartItem>,
  product: Option<Product>,
  profile: Option<Profile>,
  new_order: Option<(NewOrder, Vec<NewOrderItem>)>,
  placed: Option<(Order, Vec<OrderItem>)>,
}

impl CheckoutContext {
  fn new(auth: AuthContext, source: CheckoutSource) -> Self {
    Self {
      auth,
      source,
      cart_items: Vec::new(),
      product: None,
      profile: None,
      new_order: None,
      placed: None,
    }
  }

  fn is_direct(&self) -> bool {
    matches!(self.source, CheckoutSource::Direct(_))
  }

  fn placed_order_id(&self) -> Option<Uuid> {
    self.placed.as_ref().map(|(order, _)| order.id)
  }
}

/// Dependencies the checkout step handlers close over.
#[derive(Clone)]
struct CheckoutDeps {
  cart: Arc<CartManager>,
  carts: Arc<dyn CartStore>,
  catalog: Arc<dyn CatalogStore>,
  orders: Arc<dyn OrderStore>,
  profiles: Arc<dyn ProfileStore>,
  effects: Arc<OutboxProcessor>,
  default_lead_time_days: i32,
}

pub struct OrderAggregator {
  workflows: Arc<Workflows<BagworksError>>,
  orders: Arc<dyn OrderStore>,
}

impl OrderAggregator {
  #[allow(clippy::too_many_arguments)]
  pub fn new(
    workflows: Arc<Workflows<BagworksError>>,
    cart: Arc<CartManager>,
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
    profiles: Arc<dyn ProfileStore>,
    effects: Arc<OutboxProcessor>,
    default_lead_time_days: i32,
  ) -> Self {
    let deps = CheckoutDeps {
      cart,
      carts,
      catalog,
      orders: orders.clone(),
      profiles,
      effects,
      default_lead_time_days,
    };
    workflows.register(checkout_pipeline(deps));
    Self { workflows, orders }
  }

  /// Drains the caller's cart into a new pending order.
  #[instrument(name = "OrderAggregator::place_order", skip_all, fields(user_id = %auth.user_id), err(Display))]
  pub async fn place_order(&self, auth: &AuthContext) -> BagworksResult<OrderWithItems> {
    self.run(CheckoutContext::new(auth.clone(), CheckoutSource::Cart)).await
  }

  /// Orders one catalog product directly, priced from the catalog.
  #[instrument(
    name = "OrderAggregator::place_direct_order",
    skip_all,
    fields(user_id = %auth.user_id, product_id = %request.product_id),
    err(Display)
  )]
  pub async fn place_direct_order(
    &self,
    auth: &AuthContext,
    request: DirectOrderRequest,
  ) -> BagworksResult<OrderWithItems> {
    self
      .run(CheckoutContext::new(auth.clone(), CheckoutSource::Direct(request)))
      .await
  }

  async fn run(&self, ctx: CheckoutContext) -> BagworksResult<OrderWithItems> {
    let ctx_data = ContextData::new(ctx);
    self.workflows.run(ctx_data.clone()).await?;
    let placed = ctx_data.write().placed.take();
    let (order, items) =
      placed.ok_or_else(|| BagworksError::Internal("checkout finished without an order".to_string()))?;
    Ok(OrderWithItems { order, items })
  }

  /// Customers see their own orders, admins see everyone's. Newest first.
  pub async fn list_orders(&self, auth: &AuthContext) -> BagworksResult<Vec<OrderWithItems>> {
    let owner = if auth.is_admin() { None } else { Some(auth.user_id) };
    let orders = self.orders.list_orders(owner).await?;
    self.attach_items(orders).await
  }

  pub async fn get_order(&self, auth: &AuthContext, order_id: Uuid) -> BagworksResult<OrderWithItems> {
    let order = self
      .orders
      .get_order(order_id)
      .await?
      .ok_or_else(|| BagworksError::NotFound(format!("order {}", order_id)))?;
    auth.require_owner_or_admin(order.user_id)?;
    let items = self.orders.list_order_items(&[order.id]).await?;
    Ok(OrderWithItems { order, items })
  }

  pub async fn timeline(&self, auth: &AuthContext, order_id: Uuid) -> BagworksResult<OrderTimeline> {
    let found = self.get_order(auth, order_id).await?;
    Ok(OrderTimeline::for_order(&found.order))
  }

  pub(crate) async fn attach_items(&self, orders: Vec<Order>) -> BagworksResult<Vec<OrderWithItems>> {
    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in self.orders.list_order_items(&ids).await? {
      by_order.entry(item.order_id).or_default().push(item);
    }
    Ok(
      orders
        .into_iter()
        .map(|order| OrderWithItems {
          items: by_order.remove(&order.id).unwrap_or_default(),
          order,
        })
        .collect(),
    )
  }
}

/// `"Tote"` for one line, `"Tote + 2 more"` for three.
fn summary_name(items: &[NewOrderItem]) -> String {
  match items {
    [] => String::new(),
    [only] => only.product.name.clone(),
    [first, rest @ ..] => format!("{} + {} more", first.product.name, rest.len()),
  }
}

fn build_cart_order(
  user_id: Uuid,
  cart_items: &[CartItem],
  lead_time_days: i32,
) -> BagworksResult<(NewOrder, Vec<NewOrderItem>)> {
  let lines: Vec<NewOrderItem> = cart_items
    .iter()
    .map(|item| NewOrderItem {
      product: item.product.clone(),
      quantity: item.quantity,
      notes: item.notes.clone(),
      customization: item.customization.clone(),
    })
    .collect();
  let quantity = lines.iter().map(|l| l.quantity).sum();
  let first = lines
    .first()
    .map(|l| l.product.clone())
    .ok_or_else(|| BagworksError::Validation("cart empty".to_string()))?;
  let order = NewOrder {
    user_id,
    product_name: summary_name(&lines),
    product_type: first.product_type,
    product_size: first.size,
    quantity,
    // Custom bulk orders are quoted later.
    price_per_unit_cents: 0,
    total_price_cents: 0,
    delivery_days: lead_time_days,
    expected_completion_date: Utc::now() + Duration::days(lead_time_days as i64),
    status: OrderStatus::Pending,
    notes: None,
  };
  Ok((order, lines))
}

fn build_direct_order(
  user_id: Uuid,
  product: &Product,
  request: &DirectOrderRequest,
  lead_time_days: i32,
) -> (NewOrder, Vec<NewOrderItem>) {
  let customization = request.customization.clone().normalized();
  let snapshot = product.snapshot(request.size.as_deref());
  let notes = request
    .notes
    .as_deref()
    .map(str::trim)
    .filter(|n| !n.is_empty())
    .map(str::to_string);
  let line = NewOrderItem {
    product: snapshot.clone(),
    quantity: request.quantity,
    notes: notes.clone().unwrap_or_else(|| customization.render_notes()),
    customization,
  };
  let order = NewOrder {
    user_id,
    product_name: snapshot.name,
    product_type: snapshot.product_type,
    product_size: snapshot.size,
    quantity: request.quantity,
    price_per_unit_cents: product.price_cents,
    total_price_cents: product.price_cents * request.quantity as i64,
    delivery_days: lead_time_days,
    expected_completion_date: Utc::now() + Duration::days(lead_time_days as i64),
    status: OrderStatus::Pending,
    notes,
  };
  (order, vec![line])
}

fn validate_direct(request: &DirectOrderRequest) -> BagworksResult<()> {
  if request.quantity < 1 {
    return Err(BagworksError::Validation("Quantity must be at least 1".to_string()));
  }
  if let Some(days) = request.delivery_days {
    if !(MIN_DELIVERY_DAYS..=MAX_DELIVERY_DAYS).contains(&days) {
      return Err(BagworksError::Validation(format!(
        "Delivery days must be between {} and {}",
        MIN_DELIVERY_DAYS, MAX_DELIVERY_DAYS
      )));
    }
  }
  Ok(())
}

fn checkout_pipeline(deps: CheckoutDeps) -> Pipeline<CheckoutContext, BagworksError> {
  let mut p = Pipeline::<CheckoutContext, BagworksError>::new(
    "checkout",
    &[
      ("validate", false),
      ("price_order", false),
      ("persist_order", false),
      ("queue_side_effects", false),
      ("drain_cart", false),
      ("deliver_side_effects", true),
    ],
  );

  let d = deps.clone();
  p.on_root("validate", move |ctx_data: ContextData<CheckoutContext>| {
    let d = d.clone();
    async move {
      let (auth, source) = ctx_data.with(|c| (c.auth.clone(), c.source.clone()));
      match source {
        CheckoutSource::Cart => {
          let (items, profile) = d.cart.ensure_checkout_ready(&auth).await?;
          ctx_data.update(|c| {
            c.cart_items = items;
            c.profile = Some(profile);
          });
        }
        CheckoutSource::Direct(request) => {
          validate_direct(&request)?;
          let product = d
            .catalog
            .get_product(request.product_id)
            .await?
            .ok_or_else(|| BagworksError::NotFound(format!("product {}", request.product_id)))?;
          check_minimum_order(&product, request.quantity)?;
          let profile = d.profiles.get_profile(auth.user_id).await?;
          ctx_data.update(|c| {
            c.product = Some(product);
            c.profile = profile;
          });
        }
      }
      Ok::<_, BagworksError>(PipelineControl::Continue)
    }
  });

  let d = deps.clone();
  p.on_root("price_order", move |ctx_data: ContextData<CheckoutContext>| {
    let d = d.clone();
    async move {
      let (user_id, source, cart_items, product) =
        ctx_data.with(|c| (c.auth.user_id, c.source.clone(), c.cart_items.clone(), c.product.clone()));
      let built = match (source, product) {
        (CheckoutSource::Cart, _) => {
          // The longest catalog lead time among the lines wins; otherwise the default.
          let mut lead_time = None;
          for item in &cart_items {
            if let Some(days) = d
              .catalog
              .get_product(item.product.product_id)
              .await?
              .and_then(|p| p.delivery_days)
            {
              lead_time = Some(lead_time.map_or(days, |current: i32| current.max(days)));
            }
          }
          build_cart_order(user_id, &cart_items, lead_time.unwrap_or(d.default_lead_time_days))?
        }
        (CheckoutSource::Direct(request), Some(product)) => {
          let lead_time = request
            .delivery_days
            .or(product.delivery_days)
            .unwrap_or(d.default_lead_time_days);
          build_direct_order(user_id, &product, &request, lead_time)
        }
        (CheckoutSource::Direct(_), None) => {
          return Err(BagworksError::Internal("direct order has no product loaded".to_string()));
        }
      };
      ctx_data.update(|c| c.new_order = Some(built));
      Ok::<_, BagworksError>(PipelineControl::Continue)
    }
  });

  let d = deps.clone();
  p.on_root("persist_order", move |ctx_data: ContextData<CheckoutContext>| {
    let d = d.clone();
    async move {
      let (order, items) = ctx_data
        .write()
        .new_order
        .take()
        .ok_or_else(|| BagworksError::Internal("order was not priced".to_string()))?;
      let placed = d.orders.create_order(order, items).await?;
      info!(order_id = %placed.0.id, lines = placed.1.len(), quantity = placed.0.quantity, "Order placed.");
      ctx_data.update(|c| c.placed = Some(placed));
      Ok::<_, BagworksError>(PipelineControl::Continue)
    }
  });

  let d = deps.clone();
  p.on_root("drain_cart", move |ctx_data: ContextData<CheckoutContext>| {
    let d = d.clone();
    async move {
      let (user_id, order_id, ordered) = ctx_data.with(|c| {
        (
          c.auth.user_id,
          c.placed_order_id(),
          c.cart_items.iter().map(|i| i.id).collect::<Vec<_>>(),
        )
      });
      let order_id = order_id.ok_or_else(|| BagworksError::Internal("cart drained before order".to_string()))?;
      // Only the lines that went into the order; later additions stay.
      match d.carts.delete_cart_items(user_id, &ordered).await {
        Ok(removed) => {
          info!(%order_id, removed, "Cart drained.");
          Ok::<_, BagworksError>(PipelineControl::Continue)
        }
        Err(source) => {
          warn!(%order_id, error = %source, "Order placed but cart could not be drained.");
          Err(BagworksError::PartialCheckout { order_id, source })
        }
      }
    }
  });
  p.skip_step_if("drain_cart", CheckoutContext::is_direct);

  let d = deps.clone();
  p.on_root("queue_side_effects", move |ctx_data: ContextData<CheckoutContext>| {
    let d = d.clone();
    async move {
      let (order_id, customer) = ctx_data.with(|c| {
        (
          c.placed_order_id(),
          c.profile.as_ref().and_then(|p| p.display_name().map(str::to_string)),
        )
      });
      let order_id = order_id.ok_or_else(|| BagworksError::Internal("no order to announce".to_string()))?;
      let outbox = d.effects.outbox();
      outbox.enqueue(SideEffect::OrderWebhook { order_id });
      outbox.enqueue(SideEffect::NotifyAdmins {
        draft: admin_alerts::new_order(customer.as_deref(), order_id),
      });
      Ok::<_, BagworksError>(PipelineControl::Continue)
    }
  });

  let deps_inline = deps.effects.is_inline();
  let d = deps;
  p.on_root("deliver_side_effects", move |_ctx_data: ContextData<CheckoutContext>| {
    let d = d.clone();
    async move {
      d.effects.process_due().await;
      Ok::<_, BagworksError>(PipelineControl::Continue)
    }
  });
  p.skip_step_if("deliver_side_effects", move |_| !deps_inline);

  p
}
