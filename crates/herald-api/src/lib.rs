//! JSON administration and dispatch API for Herald.
//!
//! Exposes an axum [`Router`] backed by a [`SubscriptionService`] over any
//! [`SubscriptionStore`]. Auth and TLS are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", herald_api::api_router(service.clone()))
//! ```

pub mod dispatch;
pub mod error;
pub mod subscriptions;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use herald_core::{
  category::ExceptionPolicy, service::SubscriptionService,
  store::SubscriptionStore,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `HERALD_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  pub store_path:       PathBuf,
  /// How exception patterns combine during dispatch lookups.
  #[serde(default)]
  pub exception_policy: ExceptionPolicy,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 7070 }

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(service: Arc<SubscriptionService<S>>) -> Router<()>
where
  S: SubscriptionStore + 'static,
{
  Router::new()
    .route(
      "/subscriptions",
      get(subscriptions::list::<S>).post(subscriptions::create::<S>),
    )
    .route(
      "/subscriptions/{id}",
      get(subscriptions::get_one::<S>)
        .patch(subscriptions::update_one::<S>)
        .delete(subscriptions::delete_one::<S>),
    )
    .route("/queues/{queue}/matches", get(dispatch::handler::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(service)
}
