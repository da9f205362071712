//! `ringside`: command-line administration of a promotion's roster.
//!
//! # Usage
//!
//! ```
//! ringside add wrestler "Dusty Rhodes"
//! ringside apply employ 7d0c...e1 --at 2024-01-01T00:00:00Z
//! ringside list --type wrestler --filter bookable
//! ringside title crown 93af...0c 7d0c...e1
//! ```
//!
//! Every command prints its result as JSON on stdout; logs go to stderr.

mod commands;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::{Context as _, Result};
use clap::Parser;
use ringside_core::service::Roster;
use ringside_store_sqlite::SqliteStore;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::commands::Command;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "ringside", version, about = "Roster administration for a wrestling promotion")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", default_value = "ringside.toml")]
  config: PathBuf,

  /// SQLite database to use, overriding the configured `store_path`.
  #[arg(long, value_name = "FILE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Settings read from the config file and `RINGSIDE_*` environment variables.
#[derive(Debug, Deserialize)]
struct CliConfig {
  #[serde(default = "default_store_path")]
  store_path: PathBuf,
}

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/ringside/roster.db") }

fn load_config(path: &Path) -> Result<CliConfig> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("RINGSIDE"))
    .build()
    .context("failed to read config file")?
    .try_deserialize()
    .context("failed to deserialise CliConfig")
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let cfg = load_config(&args.config)?;

  // The flag wins over the file and the environment.
  let store_path = expand_tilde(args.store.as_deref().unwrap_or(&cfg.store_path));
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  tracing::debug!(path = %store_path.display(), "store opened");

  let roster = Roster::new(Arc::new(store));
  let output = commands::run(&roster, args.command).await?;
  println!("{}", serde_json::to_string_pretty(&output)?);

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
