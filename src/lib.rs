pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;
pub mod kv_store;
pub mod logging;
pub mod product;
pub mod screens;
pub mod wishlist;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;

use crate::catalog::{CatalogSource, HttpCatalogSource};
use crate::commands::{CatalogPageDto, WishlistChangeDto, WishlistPageDto};
use crate::config::{Cli, Command, Config};
use crate::kv_store::SqliteKvStore;
use crate::wishlist::WishlistStore;

#[derive(Clone)]
pub struct AppState {
  catalog_source: Arc<dyn CatalogSource>,
  wishlist_store: Arc<WishlistStore<SqliteKvStore>>,
}

impl AppState {
  pub fn new(
    catalog_source: Arc<dyn CatalogSource>,
    wishlist_store: Arc<WishlistStore<SqliteKvStore>>,
  ) -> Self {
    Self {
      catalog_source,
      wishlist_store,
    }
  }

  /// Opens the wishlist database under the data directory and builds the HTTP catalog client.
  pub fn from_config(config: &Config) -> Result<Self, String> {
    let db_path = config.db_path();
    let kv_store = SqliteKvStore::open(&db_path)?;
    log::debug!("wishlist database at {}", db_path.display());

    let source = HttpCatalogSource::new(config.catalog_url.clone(), config.fetch_timeout)
      .map_err(|e| e.to_string())?;
    Ok(Self::new(
      Arc::new(source),
      Arc::new(WishlistStore::new(kv_store)),
    ))
  }

  pub fn catalog_source(&self) -> Arc<dyn CatalogSource> {
    Arc::clone(&self.catalog_source)
  }

  pub fn wishlist_store(&self) -> Arc<WishlistStore<SqliteKvStore>> {
    Arc::clone(&self.wishlist_store)
  }
}

/// Output of one command, printed as text or JSON.
#[derive(Serialize)]
#[serde(untagged)]
enum Output {
  Catalog(CatalogPageDto),
  Wishlist(WishlistPageDto),
  Change(WishlistChangeDto),
  Cleared { removed: usize },
}

fn execute(state: &AppState, command: &Command) -> Result<Output, String> {
  match command {
    Command::Products => commands::list_products(state).map(Output::Catalog),
    Command::Wishlist { all } => commands::get_wishlist(state, *all).map(Output::Wishlist),
    Command::Toggle { id } => commands::toggle_wishlist_item(state, *id).map(Output::Change),
    Command::Add { id } => commands::add_to_wishlist(state, *id).map(Output::Change),
    Command::Remove { id } => commands::remove_from_wishlist(state, *id).map(Output::Change),
    Command::Clear => commands::clear_wishlist(state).map(|removed| Output::Cleared { removed }),
  }
}

fn render_text(output: &Output) -> String {
  let mut lines = Vec::new();
  match output {
    Output::Catalog(page) => {
      for row in &page.products {
        let marker = if row.in_wishlist { "*" } else { " " };
        lines.push(format!("{} {:>5}  {}  [{}]", marker, row.id, row.title, row.button_label()));
      }
      if let Some(error) = &page.error {
        lines.push(format!("error: {}", error));
      }
    }
    Output::Wishlist(page) => {
      for item in &page.items {
        lines.push(format!("{:>5}  {}", item.id, item.title));
      }
      if let Some(message) = &page.message {
        lines.push(message.clone());
      }
      if !page.stale_items.is_empty() {
        lines.push("no longer in the catalog:".to_string());
        for item in &page.stale_items {
          lines.push(format!("{:>5}  {}", item.id, item.title));
        }
      }
      if let Some(error) = &page.error {
        lines.push(format!("error: {}", error));
      }
    }
    Output::Change(change) => {
      let title = change.title.as_deref().unwrap_or("(unknown product)");
      let verb = match (change.changed, change.in_wishlist) {
        (false, true) => "already in wishlist",
        (false, false) => "not in wishlist",
        (true, true) => "added to wishlist",
        (true, false) => "removed from wishlist",
      };
      lines.push(format!(
        "{} {}: {} ({} saved)",
        change.id, title, verb, change.wishlist_size
      ));
    }
    Output::Cleared { removed } => lines.push(format!("removed {} saved product(s)", removed)),
  }
  lines.join("\n")
}

pub fn run() -> ExitCode {
  let cli = Cli::parse();
  let config = Config::from_cli_and_env(&cli);
  logging::init(config.log_level);

  let state = match AppState::from_config(&config) {
    Ok(state) => state,
    Err(error) => {
      log::error!("setup failed: {}", error);
      eprintln!("error: {}", error);
      return ExitCode::FAILURE;
    }
  };

  let output = match execute(&state, &cli.command) {
    Ok(output) => output,
    Err(error) => {
      eprintln!("error: {}", error);
      return ExitCode::FAILURE;
    }
  };

  if config.json {
    match serde_json::to_string_pretty(&output) {
      Ok(json) => println!("{}", json),
      Err(error) => {
        eprintln!("error: {}", error);
        return ExitCode::FAILURE;
      }
    }
  } else {
    let text = render_text(&output);
    if !text.is_empty() {
      println!("{}", text);
    }
  }
  ExitCode::SUCCESS
}
