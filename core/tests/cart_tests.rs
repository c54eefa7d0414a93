// tests/cart_tests.rs
mod common;

use bagworks::model::NotificationType;
use bagworks::store::FailPoint;
use bagworks::{BagworksError, Customization};
use common::*;
use serial_test::serial;
use uuid::Uuid;

#[tokio::test]
#[serial]
async fn test_add_stores_snapshot_and_rendered_notes() {
  let shop = shop().await;
  let bag = shop.add_product("Canvas Tote", 4500, Some(10));

  let item = shop
    .storefront
    .cart
    .add_product(&shop.customer, bag.id, Some("Large"), 250, logo_customization())
    .await
    .unwrap();

  assert_eq!(item.user_id, shop.customer.user_id);
  assert_eq!(item.product.product_id, bag.id);
  assert_eq!(item.product.name, "Canvas Tote");
  assert_eq!(item.product.size.as_deref(), Some("Large"));
  assert_eq!(item.quantity, 250);
  assert_eq!(item.notes, "Colors: Red, Blue, Print: Screen, Text: ACME, Logo: Uploaded");
  assert_eq!(item.logo_url(), Some("logos/acme.png"));
}

#[tokio::test]
#[serial]
async fn test_add_rejects_quantity_below_one() {
  let shop = shop().await;
  let bag = shop.add_product("Canvas Tote", 4500, None);

  for quantity in [0, -3] {
    let err = shop
      .storefront
      .cart
      .add(&shop.customer, bag.snapshot(None), quantity, Customization::default())
      .await
      .unwrap_err();
    assert!(matches!(err, BagworksError::Validation(_)), "got {:?}", err);
  }
  assert_eq!(shop.store.write_count(), 0);
  assert!(shop.storefront.cart.list(&shop.customer).await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_add_product_rejects_unknown_size_and_product() {
  let shop = shop().await;
  let bag = shop.add_product("Canvas Tote", 4500, None);

  let err = shop
    .storefront
    .cart
    .add_product(&shop.customer, bag.id, Some("Huge"), 10, Customization::default())
    .await
    .unwrap_err();
  assert!(matches!(err, BagworksError::Validation(_)));

  let err = shop
    .storefront
    .cart
    .add_product(&shop.customer, Uuid::new_v4(), None, 10, Customization::default())
    .await
    .unwrap_err();
  assert!(matches!(err, BagworksError::NotFound(_)));
}

#[tokio::test]
#[serial]
async fn test_add_product_enforces_minimum_order_quantity() {
  let shop = shop().await;
  let bag = shop.add_product("Canvas Tote", 4500, None);
  assert_eq!(bag.moq, 100);
  let cart = &shop.storefront.cart;

  for quantity in [1, 99] {
    let err = cart
      .add_product(&shop.customer, bag.id, None, quantity, Customization::default())
      .await
      .unwrap_err();
    match err {
      BagworksError::Validation(msg) => assert_eq!(msg, "Minimum order: 100 units"),
      other => panic!("expected a validation error, got {:?}", other),
    }
  }
  assert!(cart.list(&shop.customer).await.unwrap().is_empty());

  let item = cart
    .add_product(&shop.customer, bag.id, None, 100, Customization::default())
    .await
    .unwrap();
  assert_eq!(item.quantity, 100);
}

#[tokio::test]
#[serial]
async fn test_cart_lists_newest_first() {
  let shop = shop().await;
  let first = shop.add_product("Jute Shopper", 3000, None);
  let second = shop.add_product("Cotton Sling", 2000, None);
  let cart = &shop.storefront.cart;

  cart.add(&shop.customer, first.snapshot(None), 100, Customization::default()).await.unwrap();
  cart.add(&shop.customer, second.snapshot(None), 50, Customization::default()).await.unwrap();

  let names: Vec<String> = cart
    .list(&shop.customer)
    .await
    .unwrap()
    .into_iter()
    .map(|i| i.product.name)
    .collect();
  assert_eq!(names, vec!["Cotton Sling", "Jute Shopper"]);
}

#[tokio::test]
#[serial]
async fn test_set_quantity_below_one_is_a_no_op() {
  let shop = shop().await;
  let bag = shop.add_product("Canvas Tote", 4500, None);
  let cart = &shop.storefront.cart;
  let item = cart.add(&shop.customer, bag.snapshot(None), 10, Customization::default()).await.unwrap();
  let writes_before = shop.store.write_count();

  assert_eq!(cart.set_quantity(&shop.customer, item.id, 0).await.unwrap(), None);
  assert_eq!(cart.set_quantity(&shop.customer, item.id, -1).await.unwrap(), None);

  assert_eq!(shop.store.write_count(), writes_before);
  assert_eq!(cart.list(&shop.customer).await.unwrap()[0].quantity, 10);
}

#[tokio::test]
#[serial]
async fn test_set_quantity_updates_and_ignores_stale_items() {
  let shop = shop().await;
  let bag = shop.add_product("Canvas Tote", 4500, None);
  let cart = &shop.storefront.cart;
  let item = cart.add(&shop.customer, bag.snapshot(None), 10, Customization::default()).await.unwrap();

  let updated = cart.set_quantity(&shop.customer, item.id, 40).await.unwrap().unwrap();
  assert_eq!(updated.quantity, 40);

  assert!(cart.remove(&shop.customer, item.id).await.unwrap());
  let writes_before = shop.store.write_count();
  assert_eq!(cart.set_quantity(&shop.customer, item.id, 5).await.unwrap(), None);
  assert!(!cart.remove(&shop.customer, item.id).await.unwrap());
  assert_eq!(shop.store.write_count(), writes_before);
}

#[tokio::test]
#[serial]
async fn test_other_customers_cannot_touch_an_item() {
  let shop = shop().await;
  let bag = shop.add_product("Canvas Tote", 4500, None);
  let item = shop
    .storefront
    .cart
    .add(&shop.customer, bag.snapshot(None), 10, Customization::default())
    .await
    .unwrap();
  let stranger = shop.add_customer().await;

  let err = shop.storefront.cart.set_quantity(&stranger, item.id, 99).await.unwrap_err();
  assert!(matches!(err, BagworksError::Authorization));
  let err = shop.storefront.cart.remove(&stranger, item.id).await.unwrap_err();
  assert!(matches!(err, BagworksError::Authorization));

  // Admins may adjust any cart.
  let updated = shop.storefront.cart.set_quantity(&shop.admin, item.id, 12).await.unwrap();
  assert_eq!(updated.map(|i| i.quantity), Some(12));
}

#[tokio::test]
#[serial]
async fn test_store_failure_on_add_surfaces_as_retryable() {
  let shop = shop().await;
  let bag = shop.add_product("Canvas Tote", 4500, None);
  shop.store.fail_times(FailPoint::InsertCartItem, 1);

  let err = shop
    .storefront
    .cart
    .add(&shop.customer, bag.snapshot(None), 10, Customization::default())
    .await
    .unwrap_err();
  assert!(matches!(err, BagworksError::Collaborator { .. }));
  assert!(err.is_retryable());

  // The next attempt goes through.
  shop
    .storefront
    .cart
    .add(&shop.customer, bag.snapshot(None), 10, Customization::default())
    .await
    .unwrap();
}

#[tokio::test]
#[serial]
async fn test_customized_add_alerts_admins() {
  let shop = shop().await;
  let bag = shop.add_product("Jute Bag", 3000, None);
  let cart = &shop.storefront.cart;

  cart.add(&shop.customer, bag.snapshot(None), 40, Customization::default()).await.unwrap();
  assert!(shop.inbox(shop.admin.user_id).is_empty());

  cart.add(&shop.customer, bag.snapshot(None), 40, logo_customization()).await.unwrap();
  let alerts = shop.inbox_of_kind(shop.admin.user_id, NotificationType::Customization);
  assert_eq!(alerts.len(), 1);
  assert_eq!(alerts[0].title, "New Customization Added");
  assert_eq!(
    alerts[0].message,
    "Asha Rao added Jute Bag (qty: 40) to cart with customizations."
  );
}

#[tokio::test]
#[serial]
async fn test_customization_alert_failure_keeps_the_item() {
  let shop = shop().await;
  let bag = shop.add_product("Jute Bag", 3000, None);
  shop.store.fail_always(FailPoint::InsertNotification);

  let item = shop
    .storefront
    .cart
    .add(&shop.customer, bag.snapshot(None), 40, logo_customization())
    .await
    .unwrap();

  assert_eq!(shop.storefront.cart.list(&shop.customer).await.unwrap(), vec![item]);
  assert!(shop.store.all_notifications().is_empty());
  assert_eq!(shop.storefront.outbox.pending_len(), 1);
}

#[tokio::test]
#[serial]
async fn test_checkout_readiness_reports_the_gate() {
  let shop = shop().await;
  let cart = &shop.storefront.cart;

  let readiness = cart.checkout_precondition(&shop.customer).await.unwrap();
  assert!(!readiness.ok);
  assert_eq!(readiness.reason.as_deref(), Some("cart empty"));

  let bag = shop.add_product("Canvas Tote", 4500, None);
  cart.add(&shop.customer, bag.snapshot(None), 10, Customization::default()).await.unwrap();
  let readiness = cart.checkout_precondition(&shop.customer).await.unwrap();
  assert!(readiness.ok);
  assert_eq!(readiness.item_count, 1);
  assert!(readiness.missing_fields.is_empty());

  let mut profile = complete_profile(shop.customer.user_id, "Asha Rao");
  profile.phone = Some("  ".to_string());
  profile.address = None;
  shop.store.put_profile(profile);
  let readiness = cart.checkout_precondition(&shop.customer).await.unwrap();
  assert!(!readiness.ok);
  assert_eq!(readiness.reason.as_deref(), Some("incomplete profile"));
  assert_eq!(readiness.missing_fields, vec!["phone", "address"]);
}

#[tokio::test]
#[serial]
async fn test_clear_empties_only_the_callers_cart() {
  let shop = shop().await;
  let bag = shop.add_product("Canvas Tote", 4500, None);
  let other = shop.add_customer().await;
  let cart = &shop.storefront.cart;

  cart.add(&shop.customer, bag.snapshot(None), 10, Customization::default()).await.unwrap();
  cart.add(&shop.customer, bag.snapshot(None), 20, Customization::default()).await.unwrap();
  cart.add(&other, bag.snapshot(None), 30, Customization::default()).await.unwrap();

  assert_eq!(cart.clear(&shop.customer).await.unwrap(), 2);
  assert!(cart.list(&shop.customer).await.unwrap().is_empty());
  assert_eq!(cart.list(&other).await.unwrap().len(), 1);
}
