use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A product as served by the catalog API.
///
/// Only `id` and `title` are interpreted. Every other field the API sends is kept
/// in `extra` so a wishlist entry stays a verbatim copy of the remote object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: i64,
  pub title: String,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl Product {
  pub fn new(id: i64, title: impl Into<String>) -> Self {
    Self {
      id,
      title: title.into(),
      extra: Map::new(),
    }
  }
}
