use std::sync::Arc;

use serde::Serialize;

use crate::catalog::{Catalog, CatalogSource, LoadStatus};
use crate::error::AppError;
use crate::kv_store::KeyValueStore;
use crate::product::Product;
use crate::wishlist::{self, WishlistStore};

pub const EMPTY_WISHLIST_MESSAGE: &str = "You have no products in your wishlist.";
pub const IN_WISHLIST_LABEL: &str = "In wishlist";
pub const ADD_TO_WISHLIST_LABEL: &str = "Add to wishlist";

/// Identifies one catalog fetch. Results carrying an outdated ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

#[derive(Debug, Default)]
struct CatalogSlot {
  status: LoadStatus<Catalog>,
  last_loaded: Option<Catalog>,
  generation: u64,
}

impl CatalogSlot {
  fn begin_fetch(&mut self) -> FetchTicket {
    self.generation += 1;
    self.status = LoadStatus::Loading;
    FetchTicket(self.generation)
  }

  fn complete_fetch(
    &mut self,
    ticket: FetchTicket,
    result: Result<Vec<Product>, AppError>,
  ) -> Option<Result<(), AppError>> {
    if ticket.0 != self.generation {
      log::debug!(
        "discarding catalog fetch {} (current generation {})",
        ticket.0,
        self.generation
      );
      return None;
    }

    match result {
      Ok(products) => {
        let catalog = Catalog::new(products);
        match &self.last_loaded {
          Some(previous) if previous.state_hash == catalog.state_hash => {
            log::debug!("catalog unchanged ({} products)", catalog.len())
          }
          _ => log::info!(
            "catalog loaded: {} products, state {}",
            catalog.len(),
            catalog.state_hash
          ),
        }
        self.last_loaded = Some(catalog.clone());
        self.status = LoadStatus::Loaded(catalog);
        Some(Ok(()))
      }
      Err(error) => {
        self.restore();
        Some(Err(error))
      }
    }
  }

  /// Drops any in-flight fetch and falls back to the last loaded catalog.
  fn cancel(&mut self) {
    self.generation += 1;
    if matches!(self.status, LoadStatus::Loading) {
      self.restore();
    }
  }

  fn restore(&mut self) {
    self.status = match &self.last_loaded {
      Some(catalog) => LoadStatus::Loaded(catalog.clone()),
      None => LoadStatus::NotLoaded,
    };
  }

  fn current(&self) -> Option<&Catalog> {
    self.status.loaded()
  }
}

fn report(error_slot: &mut Option<String>, context: &str, error: &AppError) {
  log::warn!("{}: {} error: {}", context, error.kind(), error.cause());
  *error_slot = Some(error.user_message());
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRow {
  pub id: i64,
  pub title: String,
  pub in_wishlist: bool,
}

impl CatalogRow {
  pub fn button_label(&self) -> &'static str {
    if self.in_wishlist {
      IN_WISHLIST_LABEL
    } else {
      ADD_TO_WISHLIST_LABEL
    }
  }
}

pub struct CatalogScreen<S: KeyValueStore> {
  source: Arc<dyn CatalogSource>,
  wishlist_store: Arc<WishlistStore<S>>,
  catalog: CatalogSlot,
  wishlist: Vec<Product>,
  error: Option<String>,
}

impl<S: KeyValueStore> CatalogScreen<S> {
  pub fn new(source: Arc<dyn CatalogSource>, wishlist_store: Arc<WishlistStore<S>>) -> Self {
    Self {
      source,
      wishlist_store,
      catalog: CatalogSlot::default(),
      wishlist: Vec::new(),
      error: None,
    }
  }

  /// Loads the catalog and the saved wishlist. Failures land in the error banner.
  pub fn enter(&mut self) {
    self.error = None;
    let ticket = self.begin_fetch();
    let result = self.source.fetch_catalog();
    self.complete_fetch(ticket, result);
    self.load_wishlist();
  }

  pub fn begin_fetch(&mut self) -> FetchTicket {
    self.catalog.begin_fetch()
  }

  /// Applies a fetch result. Returns `false` when the ticket is stale and the
  /// result was discarded.
  pub fn complete_fetch(
    &mut self,
    ticket: FetchTicket,
    result: Result<Vec<Product>, AppError>,
  ) -> bool {
    match self.catalog.complete_fetch(ticket, result) {
      None => false,
      Some(Ok(())) => true,
      Some(Err(error)) => {
        report(&mut self.error, "catalog fetch failed", &error);
        true
      }
    }
  }

  pub fn leave(&mut self) {
    self.catalog.cancel();
  }

  pub fn catalog_status(&self) -> &LoadStatus<Catalog> {
    &self.catalog.status
  }

  pub fn wishlist(&self) -> &[Product] {
    &self.wishlist
  }

  pub fn rows(&self) -> Vec<CatalogRow> {
    let Some(catalog) = self.catalog.current() else {
      return Vec::new();
    };
    catalog
      .products
      .iter()
      .map(|product| CatalogRow {
        id: product.id,
        title: product.title.clone(),
        in_wishlist: wishlist::contains(&self.wishlist, product.id),
      })
      .collect()
  }

  /// Flips wishlist membership of a catalog product.
  ///
  /// The in-memory wishlist changes first. If persisting fails the change is
  /// kept on screen and the error banner is set. Returns the new membership, or
  /// `None` when the id is not in the loaded catalog.
  pub fn toggle(&mut self, product_id: i64) -> Option<bool> {
    let product = self.catalog.current()?.find(product_id)?.clone();
    let adding = !wishlist::contains(&self.wishlist, product_id);

    self.wishlist = wishlist::toggle_entry(&self.wishlist, &product);
    let persisted = if adding {
      self.wishlist_store.add_if_absent(&product)
    } else {
      self.wishlist_store.remove(product_id)
    };
    match persisted {
      Ok(entries) => self.wishlist = entries,
      Err(error) => report(&mut self.error, "wishlist update failed", &error),
    }

    Some(adding)
  }

  /// Saves a catalog product unless it is already saved. Returns whether it was
  /// newly added, or `None` when the id is not in the loaded catalog.
  pub fn add(&mut self, product_id: i64) -> Option<bool> {
    let product = self.catalog.current()?.find(product_id)?.clone();
    if wishlist::contains(&self.wishlist, product_id) {
      return Some(false);
    }

    self.wishlist = wishlist::add_entry(&self.wishlist, &product);
    match self.wishlist_store.add_if_absent(&product) {
      Ok(entries) => self.wishlist = entries,
      Err(error) => report(&mut self.error, "wishlist update failed", &error),
    }
    Some(true)
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  pub fn dismiss_error(&mut self) {
    self.error = None;
  }

  fn load_wishlist(&mut self) {
    match self.wishlist_store.load_persisted() {
      Ok(entries) => self.wishlist = entries,
      Err(error) => report(&mut self.error, "wishlist load failed", &error),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WishlistView {
  NotLoaded,
  Loading,
  Empty,
  Items(Vec<Product>),
}

impl WishlistView {
  pub fn empty_message(&self) -> Option<&'static str> {
    match self {
      WishlistView::Empty => Some(EMPTY_WISHLIST_MESSAGE),
      _ => None,
    }
  }
}

pub struct WishlistScreen<S: KeyValueStore> {
  source: Arc<dyn CatalogSource>,
  wishlist_store: Arc<WishlistStore<S>>,
  catalog: CatalogSlot,
  persisted: Vec<Product>,
  error: Option<String>,
}

impl<S: KeyValueStore> WishlistScreen<S> {
  pub fn new(source: Arc<dyn CatalogSource>, wishlist_store: Arc<WishlistStore<S>>) -> Self {
    Self {
      source,
      wishlist_store,
      catalog: CatalogSlot::default(),
      persisted: Vec::new(),
      error: None,
    }
  }

  pub fn enter(&mut self) {
    self.refresh();
  }

  /// Re-runs fetch, load and reconcile from scratch.
  pub fn refresh(&mut self) {
    self.error = None;
    let ticket = self.begin_fetch();
    let result = self.source.fetch_catalog();
    self.complete_fetch(ticket, result);
    self.reload_persisted();
  }

  pub fn begin_fetch(&mut self) -> FetchTicket {
    self.catalog.begin_fetch()
  }

  pub fn complete_fetch(
    &mut self,
    ticket: FetchTicket,
    result: Result<Vec<Product>, AppError>,
  ) -> bool {
    match self.catalog.complete_fetch(ticket, result) {
      None => false,
      Some(Ok(())) => true,
      Some(Err(error)) => {
        report(&mut self.error, "catalog fetch failed", &error);
        true
      }
    }
  }

  pub fn leave(&mut self) {
    self.catalog.cancel();
  }

  pub fn catalog_status(&self) -> &LoadStatus<Catalog> {
    &self.catalog.status
  }

  pub fn reload_persisted(&mut self) {
    match self.wishlist_store.load_persisted() {
      Ok(entries) => self.persisted = entries,
      Err(error) => report(&mut self.error, "wishlist load failed", &error),
    }
  }

  pub fn persisted(&self) -> &[Product] {
    &self.persisted
  }

  pub fn view(&self) -> WishlistView {
    match &self.catalog.status {
      LoadStatus::NotLoaded => WishlistView::NotLoaded,
      LoadStatus::Loading => WishlistView::Loading,
      LoadStatus::Loaded(catalog) => {
        let items = wishlist::reconcile(&self.persisted, catalog);
        if items.is_empty() {
          WishlistView::Empty
        } else {
          WishlistView::Items(items)
        }
      }
    }
  }

  /// Saved entries the current catalog no longer lists. Empty until a catalog is loaded.
  pub fn stale_entries(&self) -> Vec<Product> {
    match self.catalog.current() {
      Some(catalog) => wishlist::stale(&self.persisted, catalog),
      None => Vec::new(),
    }
  }

  /// Explicit removal; the only way a stale entry leaves the store.
  pub fn remove(&mut self, product_id: i64) -> bool {
    if !wishlist::contains(&self.persisted, product_id) {
      return false;
    }
    self.persisted = wishlist::remove_entry(&self.persisted, product_id);
    match self.wishlist_store.remove(product_id) {
      Ok(entries) => self.persisted = entries,
      Err(error) => report(&mut self.error, "wishlist update failed", &error),
    }
    true
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  pub fn dismiss_error(&mut self) {
    self.error = None;
  }
}
