//! herald-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `HERALD_*` environment variables, opens the SQLite subscription store and
//! serves the JSON API over HTTP.
//!
//! ```toml
//! host             = "0.0.0.0"
//! port             = 7070
//! store_path       = "~/.local/share/herald/subscriptions.db"
//! exception_policy = "alternative"   # or "veto"
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use herald_api::ServerConfig;
use herald_core::service::SubscriptionService;
use herald_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Herald subscription matching server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // RUST_LOG overrides the INFO default, e.g. `herald_core=debug` to log
  // per-lookup match counts.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // config.toml first, then HERALD_PORT, HERALD_EXCEPTION_POLICY and friends.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("HERALD"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Queues and subscribers live in external systems, so references are not
  // checked here; only the matching policy comes from config.
  let service = SubscriptionService::new(store)
    .with_exception_policy(server_cfg.exception_policy);
  tracing::info!(
    store = %store_path.display(),
    policy = ?server_cfg.exception_policy,
    "subscription store ready"
  );

  let app = herald_api::api_router(Arc::new(service));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(%address, "herald listening");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// `~/…` store paths resolve against `$HOME`; anything else is used as is.
fn expand_tilde(path: &Path) -> PathBuf {
  match (path.strip_prefix("~"), std::env::var_os("HOME")) {
    (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
    _ => path.to_path_buf(),
  }
}
