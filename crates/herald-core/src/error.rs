//! Error types for `herald-core`.

use thiserror::Error;

use crate::subscription::SubscriptionId;

#[derive(Debug, Error)]
pub enum Error {
  /// A required field was missing or held a value of the wrong shape.
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("subscription not found: {0}")]
  NotFound(SubscriptionId),

  /// A failure reported by the storage backend, passed through unchanged.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }

  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
