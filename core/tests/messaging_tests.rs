// tests/messaging_tests.rs
mod common;

use bagworks::model::{NotificationType, Role};
use bagworks::store::FailPoint;
use bagworks::{BagworksError, Customization, OrderWithItems};
use common::*;
use serial_test::serial;
use uuid::Uuid;

async fn placed_order(shop: &Shop) -> OrderWithItems {
  let tote = shop.add_product("Canvas Tote", 4500, None);
  shop
    .storefront
    .cart
    .add(&shop.customer, tote.snapshot(None), 100, Customization::default())
    .await
    .unwrap();
  shop.storefront.orders.place_order(&shop.customer).await.unwrap()
}

#[tokio::test]
#[serial]
async fn test_customer_messages_reach_the_primary_admin() {
  let shop = shop().await;
  let later_admin = shop.add_admin().await;
  let order = placed_order(&shop).await.order;
  let messaging = &shop.storefront.messaging;

  let counterpart = messaging.resolve_counterpart(&shop.customer, order.id).await.unwrap();
  assert_eq!(counterpart, Some(shop.admin.user_id));

  let sent = messaging
    .send_to_counterpart(&shop.customer, order.id, "  When will the samples ship?  ")
    .await
    .unwrap();
  assert_eq!(sent.sender_id, shop.customer.user_id);
  assert_eq!(sent.recipient_id, shop.admin.user_id);
  assert_eq!(sent.message, "When will the samples ship?");
  assert!(!sent.is_read);

  let notices: Vec<_> = shop
    .inbox_of_kind(shop.admin.user_id, NotificationType::Order)
    .into_iter()
    .filter(|n| n.title == "New message from Customer")
    .collect();
  assert_eq!(notices.len(), 1);
  assert_eq!(notices[0].message, "When will the samples ship?");
  assert_eq!(notices[0].order_id, Some(order.id));
  assert!(shop.inbox(later_admin.user_id).iter().all(|n| !n.title.starts_with("New message")));
}

#[tokio::test]
#[serial]
async fn test_admin_replies_to_the_order_customer() {
  let shop = shop().await;
  let order = placed_order(&shop).await.order;
  let messaging = &shop.storefront.messaging;

  assert_eq!(
    messaging.resolve_counterpart(&shop.admin, order.id).await.unwrap(),
    Some(shop.customer.user_id)
  );
  messaging
    .send_to_counterpart(&shop.admin, order.id, "Samples leave on Monday.")
    .await
    .unwrap();

  let inbox = shop.inbox(shop.customer.user_id);
  assert_eq!(inbox.len(), 1);
  assert_eq!(inbox[0].title, "New message from Admin");
  assert_eq!(inbox[0].message, "Samples leave on Monday.");
}

#[tokio::test]
#[serial]
async fn test_long_messages_are_previewed() {
  let shop = shop().await;
  let order = placed_order(&shop).await.order;
  let text = "x".repeat(140);

  let sent = shop
    .storefront
    .messaging
    .send_to_counterpart(&shop.admin, order.id, &text)
    .await
    .unwrap();

  assert_eq!(sent.message, text);
  let inbox = shop.inbox(shop.customer.user_id);
  assert_eq!(inbox[0].message, format!("{}...", "x".repeat(100)));
}

#[tokio::test]
#[serial]
async fn test_invalid_messages_write_nothing() {
  let shop = shop().await;
  let order = placed_order(&shop).await.order;
  let messaging = &shop.storefront.messaging;
  let writes_before = shop.store.write_count();

  let err = messaging.send(&shop.customer, order.id, shop.admin.user_id, "   ").await.unwrap_err();
  assert!(matches!(err, BagworksError::Validation(_)));

  let err = messaging
    .send(&shop.customer, order.id, shop.customer.user_id, "hello me")
    .await
    .unwrap_err();
  assert!(matches!(err, BagworksError::Validation(_)));

  // Customers may only write to admins.
  let other = shop.add_customer().await;
  let err = messaging.send(&shop.customer, order.id, other.user_id, "hi").await.unwrap_err();
  assert!(matches!(err, BagworksError::Validation(_)));

  // Admins may only write to the order's customer.
  let err = messaging.send(&shop.admin, order.id, other.user_id, "hi").await.unwrap_err();
  assert!(matches!(err, BagworksError::Validation(_)));

  let err = messaging
    .send(&shop.customer, Uuid::new_v4(), shop.admin.user_id, "hi")
    .await
    .unwrap_err();
  assert!(matches!(err, BagworksError::NotFound(_)));

  assert_eq!(shop.store.write_count(), writes_before);
}

#[tokio::test]
#[serial]
async fn test_strangers_cannot_read_or_write_a_thread() {
  let shop = shop().await;
  let order = placed_order(&shop).await.order;
  let stranger = shop.add_customer().await;
  let messaging = &shop.storefront.messaging;

  let err = messaging.list_messages(&stranger, order.id).await.unwrap_err();
  assert!(matches!(err, BagworksError::Authorization));
  let err = messaging
    .send(&stranger, order.id, shop.admin.user_id, "let me in")
    .await
    .unwrap_err();
  assert!(matches!(err, BagworksError::Authorization));
  assert!(messaging.subscribe(&stranger, order.id).await.is_err());
}

#[tokio::test]
#[serial]
async fn test_no_admin_disables_sending() {
  let shop = shop_without_admins().await;
  let order = placed_order(&shop).await.order;
  let messaging = &shop.storefront.messaging;

  assert_eq!(messaging.resolve_counterpart(&shop.customer, order.id).await.unwrap(), None);
  let err = messaging
    .send_to_counterpart(&shop.customer, order.id, "anyone there?")
    .await
    .unwrap_err();
  assert!(matches!(err, BagworksError::Precondition(_)));
  assert!(messaging.list_messages(&shop.customer, order.id).await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_admin_lookup_failure_disables_sending() {
  let shop = shop().await;
  let order = placed_order(&shop).await.order;
  shop.store.fail_always(FailPoint::ListAdmins);

  let counterpart = shop
    .storefront
    .messaging
    .resolve_counterpart(&shop.customer, order.id)
    .await
    .unwrap();
  assert_eq!(counterpart, None);
}

#[tokio::test]
#[serial]
async fn test_notice_failure_keeps_the_message() {
  let shop = shop().await;
  let order = placed_order(&shop).await.order;
  shop.store.fail_always(FailPoint::InsertNotification);

  let sent = shop
    .storefront
    .messaging
    .send_to_counterpart(&shop.customer, order.id, "Still there?")
    .await
    .unwrap();

  let thread = shop.storefront.messaging.list_messages(&shop.customer, order.id).await.unwrap();
  assert_eq!(thread, vec![sent]);
  assert_eq!(shop.storefront.outbox.pending_len(), 1);
}

#[tokio::test]
#[serial]
async fn test_thread_is_oldest_first_and_read_per_recipient() {
  let shop = shop().await;
  let order = placed_order(&shop).await.order;
  let messaging = &shop.storefront.messaging;

  messaging.send_to_counterpart(&shop.customer, order.id, "one").await.unwrap();
  messaging.send_to_counterpart(&shop.admin, order.id, "two").await.unwrap();
  messaging.send_to_counterpart(&shop.customer, order.id, "three").await.unwrap();

  let texts: Vec<String> = messaging
    .list_messages(&shop.admin, order.id)
    .await
    .unwrap()
    .into_iter()
    .map(|m| m.message)
    .collect();
  assert_eq!(texts, vec!["one", "two", "three"]);

  assert_eq!(messaging.unread_count(&shop.admin, order.id).await.unwrap(), 2);
  assert_eq!(messaging.unread_count(&shop.customer, order.id).await.unwrap(), 1);

  // Reading only marks what was addressed to the reader.
  assert_eq!(messaging.mark_thread_read(&shop.admin, order.id).await.unwrap(), 2);
  assert_eq!(messaging.unread_count(&shop.admin, order.id).await.unwrap(), 0);
  assert_eq!(messaging.unread_count(&shop.customer, order.id).await.unwrap(), 1);
}

#[tokio::test]
#[serial]
async fn test_open_thread_marks_incoming_read_and_badges_when_closed() {
  let shop = shop().await;
  let order = placed_order(&shop).await.order;
  let messaging = &shop.storefront.messaging;
  messaging.send_to_counterpart(&shop.admin, order.id, "Proof attached").await.unwrap();

  let mut viewer = messaging.open_thread(&shop.customer, order.id).await.unwrap();
  assert!(viewer.is_open());
  assert_eq!(viewer.messages().len(), 1);
  assert!(viewer.messages()[0].is_read);
  assert_eq!(messaging.unread_count(&shop.customer, order.id).await.unwrap(), 0);

  // Open: a new message is read on arrival.
  messaging.send_to_counterpart(&shop.admin, order.id, "Any changes?").await.unwrap();
  assert_eq!(viewer.apply_pending().await.unwrap(), 1);
  assert_eq!(viewer.unread_badge(), 0);
  assert_eq!(messaging.unread_count(&shop.customer, order.id).await.unwrap(), 0);

  // The viewer's own messages never count against them.
  messaging.send_to_counterpart(&shop.customer, order.id, "Looks good").await.unwrap();
  assert_eq!(viewer.apply_pending().await.unwrap(), 1);
  assert_eq!(viewer.unread_badge(), 0);

  // Closed: arrivals only raise the badge.
  viewer.close();
  messaging.send_to_counterpart(&shop.admin, order.id, "Printing now").await.unwrap();
  messaging.send_to_counterpart(&shop.admin, order.id, "Shipped").await.unwrap();
  assert_eq!(viewer.apply_pending().await.unwrap(), 2);
  assert_eq!(viewer.unread_badge(), 2);
  assert_eq!(messaging.unread_count(&shop.customer, order.id).await.unwrap(), 2);

  viewer.reopen().await.unwrap();
  assert_eq!(viewer.unread_badge(), 0);
  assert_eq!(messaging.unread_count(&shop.customer, order.id).await.unwrap(), 0);
  assert_eq!(viewer.messages().len(), 5);
  assert!(viewer
    .messages()
    .iter()
    .filter(|m| m.recipient_id == shop.customer.user_id)
    .all(|m| m.is_read));
}

#[tokio::test]
#[serial]
async fn test_thread_viewer_ignores_other_orders() {
  let shop = shop().await;
  let first = placed_order(&shop).await.order;
  let second = placed_order(&shop).await.order;
  let messaging = &shop.storefront.messaging;

  let mut viewer = messaging.open_thread(&shop.customer, first.id).await.unwrap();
  messaging.send_to_counterpart(&shop.admin, second.id, "Other order").await.unwrap();

  assert_eq!(viewer.apply_pending().await.unwrap(), 0);
  assert!(viewer.messages().is_empty());
  assert_eq!(messaging.unread_count(&shop.customer, second.id).await.unwrap(), 1);
}

#[tokio::test]
#[serial]
async fn test_authenticate_reads_roles_from_the_directory() {
  let shop = shop().await;
  let helper_id = Uuid::new_v4();
  shop.store.grant_role(helper_id, Role::Customer);

  let helper = shop.storefront.authenticate(helper_id).await.unwrap();
  assert!(!helper.is_admin());
  assert_eq!(helper.roles, vec![Role::Customer]);

  shop.store.grant_role(helper_id, Role::Admin);
  let helper = shop.storefront.authenticate(helper_id).await.unwrap();
  assert!(helper.is_admin());
}
