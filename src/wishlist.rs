//! Reconciliation only hides entries the catalog dropped; it never deletes them.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::catalog::Catalog;
use crate::error::AppError;
use crate::kv_store::{load_json, save_json, KeyValueStore};
use crate::product::Product;

pub const WISHLIST_KEY: &str = "wishlist";

pub fn contains(entries: &[Product], id: i64) -> bool {
  entries.iter().any(|entry| entry.id == id)
}

/// Entries whose id is still in the catalog, in persisted order.
pub fn reconcile(persisted: &[Product], catalog: &Catalog) -> Vec<Product> {
  let known = catalog.ids();
  persisted
    .iter()
    .filter(|entry| known.contains(&entry.id))
    .cloned()
    .collect()
}

/// Entries hidden by [`reconcile`] because the catalog no longer lists them.
pub fn stale(persisted: &[Product], catalog: &Catalog) -> Vec<Product> {
  let known = catalog.ids();
  persisted
    .iter()
    .filter(|entry| !known.contains(&entry.id))
    .cloned()
    .collect()
}

pub fn toggle_entry(current: &[Product], product: &Product) -> Vec<Product> {
  if contains(current, product.id) {
    remove_entry(current, product.id)
  } else {
    add_entry(current, product)
  }
}

pub fn add_entry(current: &[Product], product: &Product) -> Vec<Product> {
  let mut next = current.to_vec();
  if !contains(current, product.id) {
    next.push(product.clone());
  }
  next
}

pub fn remove_entry(current: &[Product], id: i64) -> Vec<Product> {
  current
    .iter()
    .filter(|entry| entry.id != id)
    .cloned()
    .collect()
}

fn dedupe_by_id(entries: Vec<Product>) -> Vec<Product> {
  let mut seen = HashSet::new();
  entries
    .into_iter()
    .filter(|entry| seen.insert(entry.id))
    .collect()
}

/// Wishlist persistence over a [`KeyValueStore`].
///
/// Every mutation reads the stored sequence, applies the change and writes the
/// whole sequence back while holding `write_lock`, so two mutations issued back
/// to back never interleave their read and write halves.
pub struct WishlistStore<S: KeyValueStore> {
  store: S,
  write_lock: Mutex<()>,
}

impl<S: KeyValueStore> WishlistStore<S> {
  pub fn new(store: S) -> Self {
    Self {
      store,
      write_lock: Mutex::new(()),
    }
  }

  pub fn kv_store(&self) -> &S {
    &self.store
  }

  pub fn load_persisted(&self) -> Result<Vec<Product>, AppError> {
    let entries: Option<Vec<Product>> =
      load_json(&self.store, WISHLIST_KEY).map_err(AppError::StorageRead)?;
    Ok(dedupe_by_id(entries.unwrap_or_default()))
  }

  pub fn toggle(&self, product: &Product) -> Result<Vec<Product>, AppError> {
    self.mutate(|current| toggle_entry(current, product))
  }

  pub fn add_if_absent(&self, product: &Product) -> Result<Vec<Product>, AppError> {
    self.mutate(|current| add_entry(current, product))
  }

  pub fn remove(&self, id: i64) -> Result<Vec<Product>, AppError> {
    self.mutate(|current| remove_entry(current, id))
  }

  /// Overwrites the stored sequence. Duplicate ids keep their first occurrence.
  pub fn replace(&self, entries: Vec<Product>) -> Result<Vec<Product>, AppError> {
    let _guard = self.lock()?;
    let entries = dedupe_by_id(entries);
    self.persist(&entries)?;
    Ok(entries)
  }

  fn mutate<F>(&self, change: F) -> Result<Vec<Product>, AppError>
  where
    F: FnOnce(&[Product]) -> Vec<Product>,
  {
    let _guard = self.lock()?;
    let current = self.load_persisted()?;
    let next = change(&current);
    self.persist(&next)?;
    log::debug!(
      "wishlist persisted: {} -> {} entries",
      current.len(),
      next.len()
    );
    Ok(next)
  }

  fn persist(&self, entries: &[Product]) -> Result<(), AppError> {
    save_json(&self.store, WISHLIST_KEY, entries).map_err(AppError::StorageWrite)
  }

  fn lock(&self) -> Result<MutexGuard<'_, ()>, AppError> {
    self
      .write_lock
      .lock()
      .map_err(|_| AppError::StorageWrite("wishlist write lock poisoned".to_string()))
  }
}
