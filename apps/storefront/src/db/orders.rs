// storefront/src/db/orders.rs

use super::rows::{
  orders_from_rows, CartItemRow, OrderItemRow, OrderRow, ProductRow, CART_ITEM_COLUMNS, ORDER_COLUMNS,
  ORDER_ITEM_COLUMNS, PRODUCT_COLUMNS,
};
use super::PgStore;

use anyhow::Result;
use async_trait::async_trait;
use bagworks::model::{NewCartItem, NewOrder, NewOrderItem};
use bagworks::store::{CartStore, CatalogStore, OrderStore};
use bagworks::{CartItem, Order, OrderItem, OrderStatus, Product};
use sqlx::types::Json;
use tracing::{debug, instrument};
use uuid::Uuid;

#[async_trait]
impl CatalogStore for PgStore {
  async fn list_products(&self) -> Result<Vec<Product>> {
    let query = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, id");
    let rows = sqlx::query_as::<_, ProductRow>(&query).fetch_all(&self.pool).await?;
    Ok(rows.into_iter().map(Product::from).collect())
  }

  async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>> {
    let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
    let row = sqlx::query_as::<_, ProductRow>(&query)
      .bind(product_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row.map(Product::from))
  }
}

#[async_trait]
impl CartStore for PgStore {
  async fn list_cart(&self, user_id: Uuid) -> Result<Vec<CartItem>> {
    let query = format!("SELECT {CART_ITEM_COLUMNS} FROM cart_items WHERE user_id = $1 ORDER BY created_at DESC, id");
    let rows = sqlx::query_as::<_, CartItemRow>(&query)
      .bind(user_id)
      .fetch_all(&self.pool)
      .await?;
    Ok(rows.into_iter().map(CartItem::from).collect())
  }

  async fn get_cart_item(&self, item_id: Uuid) -> Result<Option<CartItem>> {
    let query = format!("SELECT {CART_ITEM_COLUMNS} FROM cart_items WHERE id = $1");
    let row = sqlx::query_as::<_, CartItemRow>(&query)
      .bind(item_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row.map(CartItem::from))
  }

  async fn insert_cart_item(&self, item: NewCartItem) -> Result<CartItem> {
    let query = format!(
      "INSERT INTO cart_items \
         (id, user_id, product_id, product_name, product_type, product_size, quantity, customization, notes) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
       RETURNING {CART_ITEM_COLUMNS}"
    );
    let row = sqlx::query_as::<_, CartItemRow>(&query)
      .bind(Uuid::new_v4())
      .bind(item.user_id)
      .bind(item.product.product_id)
      .bind(&item.product.name)
      .bind(&item.product.product_type)
      .bind(&item.product.size)
      .bind(item.quantity)
      .bind(Json(&item.customization))
      .bind(&item.notes)
      .fetch_one(&self.pool)
      .await?;
    Ok(row.into())
  }

  async fn update_cart_quantity(&self, item_id: Uuid, quantity: i32) -> Result<Option<CartItem>> {
    let query = format!("UPDATE cart_items SET quantity = $2 WHERE id = $1 RETURNING {CART_ITEM_COLUMNS}");
    let row = sqlx::query_as::<_, CartItemRow>(&query)
      .bind(item_id)
      .bind(quantity)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row.map(CartItem::from))
  }

  async fn delete_cart_item(&self, item_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1")
      .bind(item_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn clear_cart(&self, user_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
      .bind(user_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected())
  }

  async fn delete_cart_items(&self, user_id: Uuid, item_ids: &[Uuid]) -> Result<u64> {
    if item_ids.is_empty() {
      return Ok(0);
    }
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND id = ANY($2)")
      .bind(user_id)
      .bind(item_ids)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected())
  }
}

#[async_trait]
impl OrderStore for PgStore {
  #[instrument(name = "PgStore::create_order", skip_all, fields(user_id = %order.user_id, lines = items.len()))]
  async fn create_order(&self, order: NewOrder, items: Vec<NewOrderItem>) -> Result<(Order, Vec<OrderItem>)> {
    let mut tx = self.pool.begin().await?;

    let order_query = format!(
      "INSERT INTO orders \
         (id, user_id, product_name, product_type, product_size, quantity, price_per_unit_cents, \
          total_price_cents, delivery_days, expected_completion_date, status, notes) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
       RETURNING {ORDER_COLUMNS}"
    );
    let order_row = sqlx::query_as::<_, OrderRow>(&order_query)
      .bind(Uuid::new_v4())
      .bind(order.user_id)
      .bind(&order.product_name)
      .bind(&order.product_type)
      .bind(&order.product_size)
      .bind(order.quantity)
      .bind(order.price_per_unit_cents)
      .bind(order.total_price_cents)
      .bind(order.delivery_days)
      .bind(order.expected_completion_date)
      .bind(order.status.as_str())
      .bind(&order.notes)
      .fetch_one(&mut *tx)
      .await?;
    let created = Order::try_from(order_row)?;

    let item_query = format!(
      "INSERT INTO order_items \
         (id, order_id, product_id, product_name, product_type, product_size, quantity, notes, \
          customization, custom_text, logo_url, position) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
       RETURNING {ORDER_ITEM_COLUMNS}"
    );
    let mut stored = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
      let row = sqlx::query_as::<_, OrderItemRow>(&item_query)
        .bind(Uuid::new_v4())
        .bind(created.id)
        .bind(item.product.product_id)
        .bind(&item.product.name)
        .bind(&item.product.product_type)
        .bind(&item.product.size)
        .bind(item.quantity)
        .bind(&item.notes)
        .bind(Json(&item.customization))
        .bind(item.custom_text())
        .bind(item.logo_url())
        .bind(position as i32)
        .fetch_one(&mut *tx)
        .await?;
      stored.push(OrderItem::from(row));
    }

    tx.commit().await?;
    debug!(order_id = %created.id, "Order committed.");
    Ok((created, stored))
  }

  async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>> {
    let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let row = sqlx::query_as::<_, OrderRow>(&query)
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await?;
    row.map(Order::try_from).transpose()
  }

  async fn list_orders(&self, user_id: Option<Uuid>) -> Result<Vec<Order>> {
    let query = format!(
      "SELECT {ORDER_COLUMNS} FROM orders \
       WHERE ($1::UUID IS NULL OR user_id = $1) \
       ORDER BY created_at DESC, id"
    );
    let rows = sqlx::query_as::<_, OrderRow>(&query)
      .bind(user_id)
      .fetch_all(&self.pool)
      .await?;
    orders_from_rows(rows)
  }

  async fn list_order_items(&self, order_ids: &[Uuid]) -> Result<Vec<OrderItem>> {
    if order_ids.is_empty() {
      return Ok(Vec::new());
    }
    let query = format!("SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY position, id");
    let rows = sqlx::query_as::<_, OrderItemRow>(&query)
      .bind(order_ids)
      .fetch_all(&self.pool)
      .await?;
    Ok(rows.into_iter().map(OrderItem::from).collect())
  }

  async fn update_order_status(&self, order_id: Uuid, status: OrderStatus) -> Result<Option<Order>> {
    let query = format!("UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}");
    let row = sqlx::query_as::<_, OrderRow>(&query)
      .bind(order_id)
      .bind(status.as_str())
      .fetch_optional(&self.pool)
      .await?;
    row.map(Order::try_from).transpose()
  }

  async fn count_orders(&self, status: Option<OrderStatus>) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE ($1::TEXT IS NULL OR status = $1)")
      .bind(status.map(|s| s.as_str()))
      .fetch_one(&self.pool)
      .await?;
    Ok(count)
  }
}
