// bagworks/src/services/cart.rs
use crate::error::{BagworksError, BagworksResult};
use crate::model::{AuthContext, CartItem, Customization, NewCartItem, Product, ProductSnapshot, Profile};
use crate::outbox::{OutboxProcessor, SideEffect};
use crate::services::notifications::admin_alerts;
use crate::store::{CartStore, CatalogStore, ProfileStore};

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Outcome of the checkout gate, for clients that want to show why
/// checkout is disabled rather than attempt it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutReadiness {
  pub ok: bool,
  pub reason: Option<String>,
  pub missing_fields: Vec<&'static str>,
  pub item_count: usize,
}

/// Rejects quantities below the product's minimum order quantity.
pub(crate) fn check_minimum_order(product: &Product, quantity: i32) -> BagworksResult<()> {
  if quantity < product.moq {
    return Err(BagworksError::Validation(format!("Minimum order: {} units", product.moq)));
  }
  Ok(())
}

pub struct CartManager {
  carts: Arc<dyn CartStore>,
  catalog: Arc<dyn CatalogStore>,
  profiles: Arc<dyn ProfileStore>,
  effects: Arc<OutboxProcessor>,
}

impl CartManager {
  pub fn new(
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn CatalogStore>,
    profiles: Arc<dyn ProfileStore>,
    effects: Arc<OutboxProcessor>,
  ) -> Self {
    Self {
      carts,
      catalog,
      profiles,
      effects,
    }
  }

  /// Newest first.
  pub async fn list(&self, auth: &AuthContext) -> BagworksResult<Vec<CartItem>> {
    Ok(self.carts.list_cart(auth.user_id).await?)
  }

  /// Adds a customized product. Quantity must be at least 1. A non-empty
  /// customization also alerts the admins.
  #[instrument(
    name = "CartManager::add",
    skip(self, auth, product, customization),
    fields(user_id = %auth.user_id, product_id = %product.product_id)
  )]
  pub async fn add(
    &self,
    auth: &AuthContext,
    product: ProductSnapshot,
    quantity: i32,
    customization: Customization,
  ) -> BagworksResult<CartItem> {
    if quantity < 1 {
      return Err(BagworksError::Validation("Quantity must be at least 1".to_string()));
    }
    let customization = customization.normalized();
    let notes = customization.render_notes();
    let item = self
      .carts
      .insert_cart_item(NewCartItem {
        user_id: auth.user_id,
        product,
        quantity,
        customization,
        notes,
      })
      .await?;
    info!(cart_item_id = %item.id, quantity, "Added to cart.");

    if !item.customization.is_empty() {
      let customer = self.customer_name(auth.user_id).await;
      self
        .effects
        .submit([SideEffect::NotifyAdmins {
          draft: admin_alerts::customization(customer.as_deref(), &item.product.name, item.quantity),
        }])
        .await;
    }
    Ok(item)
  }

  /// Looks the product up in the catalog and adds it. `size` picks one of the
  /// product's size variants; `quantity` must reach the product's minimum
  /// order quantity.
  pub async fn add_product(
    &self,
    auth: &AuthContext,
    product_id: Uuid,
    size: Option<&str>,
    quantity: i32,
    customization: Customization,
  ) -> BagworksResult<CartItem> {
    let product = self
      .catalog
      .get_product(product_id)
      .await?
      .ok_or_else(|| BagworksError::NotFound(format!("product {}", product_id)))?;
    if let Some(size) = size {
      if !product.dimensions.is_empty() && !product.dimensions.iter().any(|d| d == size) {
        return Err(BagworksError::Validation(format!("Size '{}' is not offered for this product", size)));
      }
    }
    check_minimum_order(&product, quantity)?;
    self.add(auth, product.snapshot(size), quantity, customization).await
  }

  /// Quantities below 1 are ignored, as are items that no longer exist.
  /// Returns the updated item when a write happened.
  #[instrument(name = "CartManager::set_quantity", skip(self, auth), fields(user_id = %auth.user_id))]
  pub async fn set_quantity(
    &self,
    auth: &AuthContext,
    item_id: Uuid,
    quantity: i32,
  ) -> BagworksResult<Option<CartItem>> {
    if quantity < 1 {
      debug!("Quantity below 1 ignored.");
      return Ok(None);
    }
    let Some(item) = self.carts.get_cart_item(item_id).await? else {
      debug!("Cart item already gone.");
      return Ok(None);
    };
    auth.require_owner_or_admin(item.user_id)?;
    Ok(self.carts.update_cart_quantity(item_id, quantity).await?)
  }

  pub async fn remove(&self, auth: &AuthContext, item_id: Uuid) -> BagworksResult<bool> {
    let Some(item) = self.carts.get_cart_item(item_id).await? else {
      return Ok(false);
    };
    auth.require_owner_or_admin(item.user_id)?;
    Ok(self.carts.delete_cart_item(item_id).await?)
  }

  pub async fn clear(&self, auth: &AuthContext) -> BagworksResult<u64> {
    let removed = self.carts.clear_cart(auth.user_id).await?;
    info!(user_id = %auth.user_id, removed, "Cart cleared.");
    Ok(removed)
  }

  /// Checks that checkout can go ahead and hands back the cart it would use.
  ///
  /// An empty cart is a validation failure; a profile missing business
  /// name, phone or address is a precondition failure naming the fields.
  pub async fn ensure_checkout_ready(&self, auth: &AuthContext) -> BagworksResult<(Vec<CartItem>, Profile)> {
    let items = self.list(auth).await?;
    if items.is_empty() {
      return Err(BagworksError::Validation("cart empty".to_string()));
    }
    let profile = self.profiles.get_profile(auth.user_id).await?.unwrap_or_else(|| Profile {
      id: auth.user_id,
      ..Default::default()
    });
    let missing = profile.missing_checkout_fields();
    if !missing.is_empty() {
      return Err(BagworksError::Precondition(format!(
        "incomplete profile: please add {} before checkout",
        missing.join(", ")
      )));
    }
    Ok((items, profile))
  }

  pub async fn checkout_precondition(&self, auth: &AuthContext) -> BagworksResult<CheckoutReadiness> {
    let items = self.list(auth).await?;
    let missing = self
      .profiles
      .get_profile(auth.user_id)
      .await?
      .map(|p| p.missing_checkout_fields())
      .unwrap_or_else(|| vec!["business_name", "phone", "address"]);
    let reason = if items.is_empty() {
      Some("cart empty".to_string())
    } else if !missing.is_empty() {
      Some("incomplete profile".to_string())
    } else {
      None
    };
    Ok(CheckoutReadiness {
      ok: reason.is_none(),
      reason,
      missing_fields: missing,
      item_count: items.len(),
    })
  }

  async fn customer_name(&self, user_id: Uuid) -> Option<String> {
    self
      .profiles
      .get_profile(user_id)
      .await
      .ok()
      .flatten()
      .and_then(|p| p.display_name().map(str::to_string))
  }
}
