use serde::Serialize;

use crate::catalog::LoadStatus;
use crate::kv_store::SqliteKvStore;
use crate::product::Product;
use crate::screens::{CatalogRow, CatalogScreen, WishlistScreen, WishlistView};
use crate::AppState;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPageDto {
  pub products: Vec<CatalogRow>,
  pub state_hash: String,
  pub error: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WishlistPageDto {
  pub status: String,
  pub items: Vec<Product>,
  pub stale_items: Vec<Product>,
  pub message: Option<String>,
  pub error: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WishlistChangeDto {
  pub id: i64,
  pub title: Option<String>,
  pub in_wishlist: bool,
  pub changed: bool,
  pub wishlist_size: usize,
}

fn open_catalog_screen(state: &AppState) -> Result<CatalogScreen<SqliteKvStore>, String> {
  let mut screen = CatalogScreen::new(state.catalog_source(), state.wishlist_store());
  screen.enter();
  if !screen.catalog_status().is_loaded() {
    return Err(
      screen
        .error()
        .unwrap_or("Products could not be loaded.")
        .to_string(),
    );
  }
  Ok(screen)
}

fn change_result(
  screen: &CatalogScreen<SqliteKvStore>,
  id: i64,
  changed: bool,
) -> Result<WishlistChangeDto, String> {
  if let Some(error) = screen.error() {
    return Err(error.to_string());
  }
  let title = screen
    .rows()
    .into_iter()
    .find(|row| row.id == id)
    .map(|row| row.title);
  Ok(WishlistChangeDto {
    id,
    title,
    in_wishlist: screen.wishlist().iter().any(|entry| entry.id == id),
    changed,
    wishlist_size: screen.wishlist().len(),
  })
}

pub fn list_products(state: &AppState) -> Result<CatalogPageDto, String> {
  let screen = open_catalog_screen(state)?;
  let state_hash = match screen.catalog_status() {
    LoadStatus::Loaded(catalog) => catalog.state_hash.clone(),
    _ => String::new(),
  };
  Ok(CatalogPageDto {
    products: screen.rows(),
    state_hash,
    error: screen.error().map(str::to_string),
  })
}

pub fn get_wishlist(state: &AppState, include_stale: bool) -> Result<WishlistPageDto, String> {
  let mut screen = WishlistScreen::new(state.catalog_source(), state.wishlist_store());
  screen.enter();

  let view = screen.view();
  let message = view.empty_message().map(str::to_string);
  let (status, items) = match view {
    WishlistView::NotLoaded => {
      return Err(
        screen
          .error()
          .unwrap_or("Products could not be loaded.")
          .to_string(),
      )
    }
    WishlistView::Loading => ("loading", Vec::new()),
    WishlistView::Empty => ("empty", Vec::new()),
    WishlistView::Items(items) => ("items", items),
  };
  let stale_items = if include_stale {
    screen.stale_entries()
  } else {
    Vec::new()
  };

  Ok(WishlistPageDto {
    status: status.to_string(),
    items,
    stale_items,
    message,
    error: screen.error().map(str::to_string),
  })
}

pub fn toggle_wishlist_item(state: &AppState, id: i64) -> Result<WishlistChangeDto, String> {
  let mut screen = open_catalog_screen(state)?;
  screen.dismiss_error();
  if screen.toggle(id).is_none() {
    return Err(format!("Product {} is not in the catalog.", id));
  }
  change_result(&screen, id, true)
}

pub fn add_to_wishlist(state: &AppState, id: i64) -> Result<WishlistChangeDto, String> {
  let mut screen = open_catalog_screen(state)?;
  screen.dismiss_error();
  let Some(added) = screen.add(id) else {
    return Err(format!("Product {} is not in the catalog.", id));
  };
  change_result(&screen, id, added)
}

/// Removal does not need the catalog, so stale entries can be dropped offline.
pub fn remove_from_wishlist(state: &AppState, id: i64) -> Result<WishlistChangeDto, String> {
  let mut screen = WishlistScreen::new(state.catalog_source(), state.wishlist_store());
  screen.reload_persisted();
  if let Some(error) = screen.error() {
    return Err(error.to_string());
  }

  let title = screen
    .persisted()
    .iter()
    .find(|entry| entry.id == id)
    .map(|entry| entry.title.clone());
  let changed = screen.remove(id);
  if let Some(error) = screen.error() {
    return Err(error.to_string());
  }

  Ok(WishlistChangeDto {
    id,
    title,
    in_wishlist: false,
    changed,
    wishlist_size: screen.persisted().len(),
  })
}

/// Empties the wishlist. Also the way out of an unreadable store.
pub fn clear_wishlist(state: &AppState) -> Result<usize, String> {
  let store = state.wishlist_store();
  let removed = match store.load_persisted() {
    Ok(entries) => entries.len(),
    Err(error) => {
      log::warn!("clearing unreadable wishlist: {}", error);
      0
    }
  };
  store.replace(Vec::new()).map_err(|e| e.user_message())?;
  log::info!("wishlist cleared ({} entries removed)", removed);
  Ok(removed)
}
