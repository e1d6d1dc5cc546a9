#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::mpsc;
use std::thread;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

pub const PRODUCTS_PATH: &str = "/api/v1/products";

/// Serves `app` on an ephemeral port from a background runtime and returns the
/// products endpoint URL.
pub fn spawn_server(app: Router) -> String {
  let (addr_tx, addr_rx) = mpsc::channel::<SocketAddr>();
  thread::spawn(move || {
    let runtime = tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .expect("server runtime");
    runtime.block_on(async move {
      let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind catalog server");
      addr_tx
        .send(listener.local_addr().expect("catalog server addr"))
        .expect("send addr");
      axum::serve(listener, app).await.expect("serve catalog");
    });
  });
  let addr = addr_rx.recv().expect("catalog server started");
  format!("http://{}{}", addr, PRODUCTS_PATH)
}

pub fn catalog_server(products: Value) -> String {
  spawn_server(Router::new().route(
    PRODUCTS_PATH,
    get(move || {
      let products = products.clone();
      async move { Json(products) }
    }),
  ))
}

pub fn shirt_and_hat() -> Value {
  json!([
    { "id": 1, "title": "Shirt", "price": 20 },
    { "id": 2, "title": "Hat", "price": 12 }
  ])
}
