// storefront/src/web/handlers/catalog_handlers.rs

use actix_web::{web, HttpResponse};
use bagworks::{ProductQuery, ProductSort, QuoteRequest};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListProductsParams {
  pub q: Option<String>,
  #[serde(rename = "type")]
  pub product_type: Option<String>,
  pub sort: Option<String>,
}

impl From<ListProductsParams> for ProductQuery {
  fn from(params: ListProductsParams) -> Self {
    ProductQuery {
      search: params.q,
      product_type: params.product_type,
      sort: params.sort.as_deref().map(ProductSort::parse_lenient).unwrap_or_default(),
    }
  }
}

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  params: web::Query<ListProductsParams>,
) -> Result<HttpResponse, AppError> {
  let products = app_state.storefront.catalog.search(&params.into_inner().into()).await?;
  info!(count = products.len(), "Listed products.");
  Ok(HttpResponse::Ok().json(json!({ "products": products })))
}

#[instrument(name = "handler::get_product", skip(app_state))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product = app_state.storefront.catalog.get(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::request_quote", skip(app_state, payload))]
pub async fn request_quote_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<QuoteRequest>,
) -> Result<HttpResponse, AppError> {
  let link = app_state
    .storefront
    .catalog
    .request_quote(path.into_inner(), payload.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(link))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[actix_web::test]
  async fn query_params_map_onto_the_catalog_query() {
    let params: ListProductsParams =
      web::Query::<ListProductsParams>::from_query("q=tote&type=Jute&sort=moq_desc").unwrap().into_inner();
    let query = ProductQuery::from(params);
    assert_eq!(query.search.as_deref(), Some("tote"));
    assert_eq!(query.product_type.as_deref(), Some("Jute"));
    assert_eq!(query.sort, ProductSort::MoqDesc);

    let params = web::Query::<ListProductsParams>::from_query("sort=sideways").unwrap().into_inner();
    assert_eq!(ProductQuery::from(params).sort, ProductSort::Newest);
  }
}
