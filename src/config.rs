//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::catalog::{DEFAULT_CATALOG_URL, DEFAULT_FETCH_TIMEOUT_SECS};
use crate::logging;

pub const DB_FILE_NAME: &str = "wishlist.db";
const APP_DIR_NAME: &str = "catalog-wishlist";

/// Browse the product catalog and manage a locally saved wishlist.
///
/// CLI arguments take precedence over environment variables.
#[derive(Parser, Debug)]
#[command(name = "wishlist", version, about)]
pub struct Cli {
  /// Directory holding the wishlist database [env: WISHLIST_HOME]
  #[arg(long, short = 'd', global = true)]
  pub data_dir: Option<PathBuf>,

  /// Product list endpoint [env: WISHLIST_CATALOG_URL]
  #[arg(long, global = true)]
  pub catalog_url: Option<String>,

  /// Catalog request timeout in seconds [env: WISHLIST_TIMEOUT_SECS] [default: 30]
  #[arg(long, global = true)]
  pub timeout_secs: Option<u64>,

  /// Print results as JSON
  #[arg(long, global = true)]
  pub json: bool,

  /// Debug logging [env: WISHLIST_LOG]
  #[arg(long, short = 'v', global = true)]
  pub verbose: bool,

  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
  /// List the catalog with wishlist markers
  Products,
  /// Show the wishlist reconciled against the current catalog
  Wishlist {
    /// Also list saved products the catalog no longer has
    #[arg(long)]
    all: bool,
  },
  /// Add a catalog product to the wishlist, or remove it if already saved
  Toggle { id: i64 },
  /// Add a catalog product to the wishlist if it is not saved yet
  Add { id: i64 },
  /// Remove a product from the wishlist, even one the catalog no longer lists
  Remove { id: i64 },
  /// Remove every saved product
  Clear,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
  pub data_dir: PathBuf,
  pub catalog_url: String,
  pub fetch_timeout: Duration,
  pub json: bool,
  pub log_level: LevelFilter,
}

impl Config {
  pub fn from_cli_and_env(cli: &Cli) -> Self {
    Self::resolve(cli, |name| std::env::var(name).ok())
  }

  fn resolve(cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Self {
    let data_dir = cli
      .data_dir
      .clone()
      .or_else(|| env("WISHLIST_HOME").map(PathBuf::from))
      .unwrap_or_else(default_data_dir);

    let catalog_url = cli
      .catalog_url
      .clone()
      .or_else(|| env("WISHLIST_CATALOG_URL"))
      .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string());

    let timeout_secs = cli
      .timeout_secs
      .or_else(|| env("WISHLIST_TIMEOUT_SECS").and_then(|raw| raw.trim().parse().ok()))
      .filter(|secs| *secs > 0)
      .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS);

    let log_level = if cli.verbose {
      LevelFilter::Debug
    } else {
      env("WISHLIST_LOG")
        .and_then(|raw| logging::parse_level(&raw))
        .unwrap_or(LevelFilter::Info)
    };

    Self {
      data_dir,
      catalog_url,
      fetch_timeout: Duration::from_secs(timeout_secs),
      json: cli.json,
      log_level,
    }
  }

  pub fn db_path(&self) -> PathBuf {
    self.data_dir.join(DB_FILE_NAME)
  }
}

fn default_data_dir() -> PathBuf {
  dirs::data_dir()
    .map(|dir| dir.join(APP_DIR_NAME))
    .unwrap_or_else(|| PathBuf::from(format!(".{}", APP_DIR_NAME)))
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;

  fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).expect("valid arguments")
  }

  fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    move |name| vars.get(name).cloned()
  }

  #[test]
  fn defaults_apply_without_flags_or_env() {
    let cli = parse(&["wishlist", "products"]);
    let config = Config::resolve(&cli, env_from(&[]));

    assert_eq!(cli.command, Command::Products);
    assert_eq!(config.catalog_url, DEFAULT_CATALOG_URL);
    assert_eq!(config.fetch_timeout, Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS));
    assert_eq!(config.log_level, LevelFilter::Info);
    assert!(config.db_path().ends_with(DB_FILE_NAME));
  }

  #[test]
  fn flags_win_over_environment() {
    let cli = parse(&[
      "wishlist",
      "toggle",
      "3",
      "--data-dir",
      "/tmp/flag",
      "--timeout-secs",
      "5",
      "-v",
    ]);
    let config = Config::resolve(
      &cli,
      env_from(&[
        ("WISHLIST_HOME", "/tmp/env"),
        ("WISHLIST_TIMEOUT_SECS", "9"),
        ("WISHLIST_LOG", "warn"),
      ]),
    );

    assert_eq!(cli.command, Command::Toggle { id: 3 });
    assert_eq!(config.data_dir, PathBuf::from("/tmp/flag"));
    assert_eq!(config.fetch_timeout, Duration::from_secs(5));
    assert_eq!(config.log_level, LevelFilter::Debug);
  }

  #[test]
  fn environment_fills_missing_flags() {
    let cli = parse(&["wishlist", "wishlist", "--all"]);
    let config = Config::resolve(
      &cli,
      env_from(&[
        ("WISHLIST_HOME", "/tmp/env"),
        ("WISHLIST_CATALOG_URL", "http://127.0.0.1:9/products"),
        ("WISHLIST_TIMEOUT_SECS", "0"),
        ("WISHLIST_LOG", "error"),
      ]),
    );

    assert_eq!(cli.command, Command::Wishlist { all: true });
    assert_eq!(config.db_path(), PathBuf::from("/tmp/env").join(DB_FILE_NAME));
    assert_eq!(config.catalog_url, "http://127.0.0.1:9/products");
    assert_eq!(config.fetch_timeout, Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS));
    assert_eq!(config.log_level, LevelFilter::Error);
  }
}
