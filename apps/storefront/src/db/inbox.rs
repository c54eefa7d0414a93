// storefront/src/db/inbox.rs

use super::rows::{MessageRow, NotificationRow, MESSAGE_COLUMNS, NOTIFICATION_COLUMNS};
use super::PgStore;

use anyhow::Result;
use async_trait::async_trait;
use bagworks::model::{NewNotification, NewOrderMessage};
use bagworks::store::{MessageStore, NotificationStore};
use bagworks::{Notification, OrderMessage, RealtimeEvent};
use uuid::Uuid;

#[async_trait]
impl NotificationStore for PgStore {
  async fn insert_notification(&self, notification: NewNotification) -> Result<Notification> {
    let query = format!(
      "INSERT INTO notifications (id, user_id, title, message, type, order_id) \
       VALUES ($1, $2, $3, $4, $5, $6) \
       RETURNING {NOTIFICATION_COLUMNS}"
    );
    let row = sqlx::query_as::<_, NotificationRow>(&query)
      .bind(Uuid::new_v4())
      .bind(notification.user_id)
      .bind(&notification.draft.title)
      .bind(&notification.draft.message)
      .bind(notification.draft.kind.as_str())
      .bind(notification.draft.order_id)
      .fetch_one(&self.pool)
      .await?;
    let stored = Notification::from(row);
    self.hub.publish(RealtimeEvent::NotificationInserted(stored.clone()));
    Ok(stored)
  }

  async fn get_notification(&self, notification_id: Uuid) -> Result<Option<Notification>> {
    let query = format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1");
    let row = sqlx::query_as::<_, NotificationRow>(&query)
      .bind(notification_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row.map(Notification::from))
  }

  async fn list_notifications(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>> {
    let query = format!(
      "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = $1 \
       ORDER BY created_at DESC, id LIMIT $2"
    );
    let rows = sqlx::query_as::<_, NotificationRow>(&query)
      .bind(user_id)
      .bind(limit)
      .fetch_all(&self.pool)
      .await?;
    Ok(rows.into_iter().map(Notification::from).collect())
  }

  async fn mark_notification_read(&self, notification_id: Uuid) -> Result<bool> {
    let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1")
      .bind(notification_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64> {
    let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read")
      .bind(user_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected())
  }

  async fn delete_notification(&self, notification_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
      .bind(notification_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn unread_notification_count(&self, user_id: Uuid) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read")
      .bind(user_id)
      .fetch_one(&self.pool)
      .await?;
    Ok(count)
  }

  async fn notification_page(&self, user_id: Uuid, limit: i64) -> Result<(Vec<Notification>, i64)> {
    let mut tx = self.pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
      .execute(&mut *tx)
      .await?;
    let query = format!(
      "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = $1 \
       ORDER BY created_at DESC, id LIMIT $2"
    );
    let rows = sqlx::query_as::<_, NotificationRow>(&query)
      .bind(user_id)
      .bind(limit)
      .fetch_all(&mut *tx)
      .await?;
    let unread = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read")
      .bind(user_id)
      .fetch_one(&mut *tx)
      .await?;
    tx.commit().await?;
    Ok((rows.into_iter().map(Notification::from).collect(), unread))
  }
}

#[async_trait]
impl MessageStore for PgStore {
  async fn insert_message(&self, message: NewOrderMessage) -> Result<OrderMessage> {
    let query = format!(
      "INSERT INTO order_messages (id, order_id, sender_id, recipient_id, message) \
       VALUES ($1, $2, $3, $4, $5) \
       RETURNING {MESSAGE_COLUMNS}"
    );
    let row = sqlx::query_as::<_, MessageRow>(&query)
      .bind(Uuid::new_v4())
      .bind(message.order_id)
      .bind(message.sender_id)
      .bind(message.recipient_id)
      .bind(&message.message)
      .fetch_one(&self.pool)
      .await?;
    let stored = OrderMessage::from(row);
    self.hub.publish(RealtimeEvent::MessageInserted(stored.clone()));
    Ok(stored)
  }

  async fn list_messages(&self, order_id: Uuid) -> Result<Vec<OrderMessage>> {
    let query = format!("SELECT {MESSAGE_COLUMNS} FROM order_messages WHERE order_id = $1 ORDER BY created_at, id");
    let rows = sqlx::query_as::<_, MessageRow>(&query)
      .bind(order_id)
      .fetch_all(&self.pool)
      .await?;
    Ok(rows.into_iter().map(OrderMessage::from).collect())
  }

  async fn mark_thread_read(&self, order_id: Uuid, reader_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
      "UPDATE order_messages SET is_read = TRUE \
       WHERE order_id = $1 AND recipient_id = $2 AND NOT is_read",
    )
    .bind(order_id)
    .bind(reader_id)
    .execute(&self.pool)
    .await?;
    Ok(result.rows_affected())
  }

  async fn unread_message_count(&self, order_id: Uuid, reader_id: Uuid) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
      "SELECT COUNT(*) FROM order_messages WHERE order_id = $1 AND recipient_id = $2 AND NOT is_read",
    )
    .bind(order_id)
    .bind(reader_id)
    .fetch_one(&self.pool)
    .await?;
    Ok(count)
  }
}
