// bagworks/src/services/dashboard.rs
use crate::error::BagworksResult;
use crate::model::{AuthContext, OrderStatus, OrderWithItems, Profile};
use crate::services::checkout::OrderAggregator;
use crate::store::{OrderStore, ProfileStore};

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdminStats {
  pub total_orders: i64,
  pub pending_orders: i64,
  pub completed_orders: i64,
  pub total_customers: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerOverview {
  pub profile: Profile,
  pub orders: Vec<OrderWithItems>,
}

/// Admin-only read models.
pub struct AdminDashboard {
  orders: Arc<dyn OrderStore>,
  profiles: Arc<dyn ProfileStore>,
  aggregator: Arc<OrderAggregator>,
}

impl AdminDashboard {
  pub fn new(orders: Arc<dyn OrderStore>, profiles: Arc<dyn ProfileStore>, aggregator: Arc<OrderAggregator>) -> Self {
    Self {
      orders,
      profiles,
      aggregator,
    }
  }

  pub async fn stats(&self, auth: &AuthContext) -> BagworksResult<AdminStats> {
    auth.require_admin()?;
    Ok(AdminStats {
      total_orders: self.orders.count_orders(None).await?,
      pending_orders: self.orders.count_orders(Some(OrderStatus::Pending)).await?,
      completed_orders: self.orders.count_orders(Some(OrderStatus::Completed)).await?,
      total_customers: self.profiles.count_profiles().await?,
    })
  }

  /// Every profile with its orders, newest order first.
  pub async fn customers(&self, auth: &AuthContext) -> BagworksResult<Vec<CustomerOverview>> {
    auth.require_admin()?;
    let mut by_customer: HashMap<Uuid, Vec<OrderWithItems>> = HashMap::new();
    for order in self.aggregator.list_orders(auth).await? {
      by_customer.entry(order.order.user_id).or_default().push(order);
    }
    Ok(
      self
        .profiles
        .list_profiles()
        .await?
        .into_iter()
        .map(|profile| CustomerOverview {
          orders: by_customer.remove(&profile.id).unwrap_or_default(),
          profile,
        })
        .collect(),
    )
  }
}
