use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::product::Product;

pub const DEFAULT_CATALOG_URL: &str = "https://api.escuelajs.co/api/v1/products";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Load state of a data source owned by a screen.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus<T> {
  NotLoaded,
  Loading,
  Loaded(T),
}

impl<T> Default for LoadStatus<T> {
  fn default() -> Self {
    LoadStatus::NotLoaded
  }
}

impl<T> LoadStatus<T> {
  pub fn loaded(&self) -> Option<&T> {
    match self {
      LoadStatus::Loaded(value) => Some(value),
      _ => None,
    }
  }

  pub fn is_loaded(&self) -> bool {
    matches!(self, LoadStatus::Loaded(_))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
  pub products: Vec<Product>,
  pub fetched_at: String,
  pub state_hash: String,
}

impl Catalog {
  pub fn new(products: Vec<Product>) -> Self {
    let state_hash = compute_catalog_state_hash(&products);
    Self {
      products,
      fetched_at: Utc::now().to_rfc3339(),
      state_hash,
    }
  }

  pub fn ids(&self) -> HashSet<i64> {
    self.products.iter().map(|product| product.id).collect()
  }

  pub fn find(&self, id: i64) -> Option<&Product> {
    self.products.iter().find(|product| product.id == id)
  }

  pub fn len(&self) -> usize {
    self.products.len()
  }
}

fn compute_catalog_state_hash(products: &[Product]) -> String {
  let mut hasher = Sha256::new();
  for product in products {
    let line = format!("{}|{}\n", product.id, product.title);
    hasher.update(line.as_bytes());
  }
  format!("{:x}", hasher.finalize())
}

/// Where the product list comes from.
pub trait CatalogSource: Send + Sync {
  fn fetch_catalog(&self) -> Result<Vec<Product>, AppError>;
}

pub struct HttpCatalogSource {
  client: Client,
  url: String,
}

impl HttpCatalogSource {
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| AppError::Network(e.to_string()))?;
    Ok(Self {
      client,
      url: url.into(),
    })
  }
}

impl CatalogSource for HttpCatalogSource {
  fn fetch_catalog(&self) -> Result<Vec<Product>, AppError> {
    log::debug!("fetching catalog from {}", self.url);
    let response = self
      .client
      .get(&self.url)
      .header(USER_AGENT, concat!("catalog-wishlist/", env!("CARGO_PKG_VERSION")))
      .header(ACCEPT, "application/json")
      .send()
      .map_err(|e| AppError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      return Err(AppError::Network(format!(
        "Error {}: products could not be loaded.",
        status.as_u16()
      )));
    }

    let body = response
      .text()
      .map_err(|e| AppError::Network(e.to_string()))?;
    serde_json::from_str::<Vec<Product>>(&body)
      .map_err(|e| AppError::Network(format!("invalid catalog payload: {}", e)))
  }
}
