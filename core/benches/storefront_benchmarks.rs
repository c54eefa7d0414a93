use bagworks::model::{NotificationDraft, NotificationType, Product, Profile, Role};
use bagworks::services::catalog::filter_and_sort;
use bagworks::{
  AuthContext, ContextData, Customization, Pipeline, PipelineControl, ProductQuery, ProductSort, Storefront,
  StorefrontSettings,
};
use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;
use uuid::Uuid;

fn catalog(size: usize) -> Vec<Product> {
  let kinds = ["Jute", "Cotton", "Canvas", "Non-woven"];
  (0..size)
    .map(|i| Product {
      id: Uuid::new_v4(),
      name: format!("Bag {}", i),
      product_type: kinds[i % kinds.len()].to_string(),
      size: Some("Medium".to_string()),
      price_cents: 1000 + (i as i64 % 50) * 100,
      images: vec![],
      description: None,
      moq: 50 + (i as i32 % 20) * 25,
      delivery_days: Some(7),
      features: vec!["Reusable".to_string(), format!("Feature {}", i % 7)],
      printing_options: vec!["Screen".to_string()],
      dimensions: vec!["Small".to_string(), "Medium".to_string()],
      created_at: Utc::now() - Duration::minutes(i as i64),
    })
    .collect()
}

fn bench_catalog_search(c: &mut Criterion) {
  let mut group = c.benchmark_group("CatalogSearch");
  for size in [100usize, 1_000, 10_000] {
    let products = catalog(size);
    let query = ProductQuery {
      search: Some("feature 3".to_string()),
      product_type: Some("Cotton".to_string()),
      sort: ProductSort::MoqDesc,
    };
    group.throughput(Throughput::Elements(size as u64));
    group.bench_with_input(BenchmarkId::from_parameter(size), &products, |b, products| {
      b.iter(|| criterion::black_box(filter_and_sort(products.clone(), &query)));
    });
  }
  group.finish();
}

/// A fresh storefront, a customer with a complete profile and one admin.
fn storefront_with_customer() -> (Storefront, AuthContext, Vec<Product>) {
  let (storefront, store) = Storefront::in_memory(StorefrontSettings::default());
  store.grant_role(Uuid::new_v4(), Role::Admin);
  let customer = AuthContext::customer(Uuid::new_v4());
  store.put_profile(Profile {
    id: customer.user_id,
    full_name: Some("Bench Customer".to_string()),
    business_name: Some("Bench Bags".to_string()),
    phone: Some("0000000000".to_string()),
    address: Some("1 Bench Street".to_string()),
    ..Default::default()
  });
  let products = catalog(8).into_iter().map(|p| store.add_product(p)).collect();
  (storefront, customer, products)
}

fn bench_checkout(c: &mut Criterion) {
  let mut group = c.benchmark_group("CartCheckout");
  let rt = Runtime::new().unwrap();

  for lines in [1usize, 5, 20] {
    group.throughput(Throughput::Elements(lines as u64));
    group.bench_with_input(BenchmarkId::from_parameter(lines), &lines, |b, &lines| {
      b.to_async(&rt).iter(move || async move {
        let (storefront, customer, products) = storefront_with_customer();
        for i in 0..lines {
          let product = &products[i % products.len()];
          storefront
            .cart
            .add(&customer, product.snapshot(None), 100, Customization::default())
            .await
            .unwrap();
        }
        criterion::black_box(storefront.orders.place_order(&customer).await.unwrap());
      });
    });
  }
  group.finish();
}

fn bench_admin_fan_out(c: &mut Criterion) {
  let mut group = c.benchmark_group("AdminFanOut");
  let rt = Runtime::new().unwrap();

  for admins in [1usize, 10, 50] {
    let (storefront, store) = Storefront::in_memory(StorefrontSettings::default());
    for _ in 0..admins {
      store.grant_role(Uuid::new_v4(), Role::Admin);
    }
    group.throughput(Throughput::Elements(admins as u64));
    group.bench_with_input(BenchmarkId::from_parameter(admins), &storefront, |b, storefront| {
      b.to_async(&rt).iter(move || async move {
        let draft = NotificationDraft::new("Bench", "Fan-out", NotificationType::Info);
        criterion::black_box(storefront.notifications.notify_all_admins(draft).await);
      });
    });
  }
  group.finish();
}

fn bench_pipeline_overhead(c: &mut Criterion) {
  let mut group = c.benchmark_group("PipelineOverhead");
  let rt = Runtime::new().unwrap();

  for steps in [1usize, 5, 10] {
    let names: Vec<&'static str> = (0..steps)
      .map(|i| &*Box::leak(format!("step_{}", i).into_boxed_str()))
      .collect();
    let defs: Vec<(&str, bool)> = names.iter().map(|n| (*n, false)).collect();
    let mut pipeline = Pipeline::<u64, bagworks::BagworksError>::new("bench", &defs);
    for name in &names {
      pipeline.on_root(name, |ctx: ContextData<u64>| {
        ctx.update(|n| *n += 1);
        std::future::ready(Ok::<_, bagworks::BagworksError>(PipelineControl::Continue))
      });
    }
    group.bench_with_input(BenchmarkId::from_parameter(steps), &pipeline, |b, pipeline| {
      b.to_async(&rt).iter(move || async move {
        let ctx = ContextData::new(0u64);
        criterion::black_box(pipeline.run(ctx).await.unwrap());
      });
    });
  }
  group.finish();
}

criterion_group!(
  benches,
  bench_catalog_search,
  bench_checkout,
  bench_admin_fan_out,
  bench_pipeline_overhead
);
criterion_main!(benches);
