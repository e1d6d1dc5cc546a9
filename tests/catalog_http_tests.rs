mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use wishlist_lib::catalog::{CatalogSource, HttpCatalogSource};
use wishlist_lib::error::AppError;

use common::{catalog_server, shirt_and_hat, spawn_server, PRODUCTS_PATH};

fn source(url: &str, timeout: Duration) -> HttpCatalogSource {
  HttpCatalogSource::new(url, timeout).expect("build client")
}

#[test]
fn fetch_returns_products_in_server_order() {
  let url = catalog_server(shirt_and_hat());
  let products = source(&url, Duration::from_secs(5))
    .fetch_catalog()
    .expect("fetch catalog");

  let titles: Vec<&str> = products.iter().map(|p| p.title.as_str()).collect();
  assert_eq!(titles, vec!["Shirt", "Hat"]);
  assert_eq!(products[0].extra.get("price"), Some(&json!(20)));
}

#[test]
fn fetch_is_repeatable() {
  let url = catalog_server(shirt_and_hat());
  let source = source(&url, Duration::from_secs(5));
  let first = source.fetch_catalog().expect("first fetch");
  let second = source.fetch_catalog().expect("second fetch");
  assert_eq!(first, second);
}

#[test]
fn server_error_status_is_a_network_error_with_the_code() {
  let url = spawn_server(Router::new().route(
    PRODUCTS_PATH,
    get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
  ));

  let error = source(&url, Duration::from_secs(5))
    .fetch_catalog()
    .expect_err("500 fails");
  assert_eq!(
    error,
    AppError::Network("Error 500: products could not be loaded.".to_string())
  );
}

#[test]
fn not_found_status_is_a_network_error() {
  let url = catalog_server(shirt_and_hat());
  let missing = url.replace(PRODUCTS_PATH, "/api/v1/nothing");
  let error = source(&missing, Duration::from_secs(5))
    .fetch_catalog()
    .expect_err("404 fails");
  assert!(error.cause().contains("404"));
}

#[test]
fn slow_server_hits_the_timeout() {
  let url = spawn_server(Router::new().route(
    PRODUCTS_PATH,
    get(|| async {
      tokio::time::sleep(Duration::from_secs(5)).await;
      Json(json!([]))
    }),
  ));

  let error = source(&url, Duration::from_millis(300))
    .fetch_catalog()
    .expect_err("timeout");
  assert!(matches!(error, AppError::Network(_)));
}

#[test]
fn refused_connection_is_a_network_error() {
  let error = source("http://127.0.0.1:1/api/v1/products", Duration::from_secs(2))
    .fetch_catalog()
    .expect_err("nothing listens on port 1");
  assert!(matches!(error, AppError::Network(_)));
}

#[test]
fn malformed_body_is_a_network_error() {
  let url = spawn_server(Router::new().route(PRODUCTS_PATH, get(|| async { "not json" })));
  let error = source(&url, Duration::from_secs(5))
    .fetch_catalog()
    .expect_err("malformed body");
  assert!(error.cause().starts_with("invalid catalog payload"));
}

#[test]
fn outage_between_fetches_only_fails_the_second() {
  let hits = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&hits);
  let url = spawn_server(Router::new().route(
    PRODUCTS_PATH,
    get(move || {
      let counter = Arc::clone(&counter);
      async move {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
          Json(shirt_and_hat()).into_response()
        } else {
          StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
      }
    }),
  ));

  let source = source(&url, Duration::from_secs(5));
  assert_eq!(source.fetch_catalog().expect("first fetch").len(), 2);
  let error = source.fetch_catalog().expect_err("second fetch");
  assert!(error.cause().contains("503"));
  assert_eq!(hits.load(Ordering::SeqCst), 2);
}
