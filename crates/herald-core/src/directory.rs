//! Collaborator interfaces for reference validation.
//!
//! The queue registry and subscriber directory live outside this crate. The
//! service consults them when a subscription is created; [`Unchecked`]
//! accepts every reference for deployments that validate elsewhere.

use std::future::Future;

use crate::subscription::{QueueId, SubscriberId};

/// Knows which queues exist.
pub trait QueueRegistry: Send + Sync {
  fn queue_exists<'a>(
    &'a self,
    queue: &'a QueueId,
  ) -> impl Future<Output = bool> + Send + 'a;
}

/// Knows which subscribers exist.
pub trait SubscriberDirectory: Send + Sync {
  fn subscriber_exists(
    &self,
    subscriber: SubscriberId,
  ) -> impl Future<Output = bool> + Send + '_;
}

/// Treats every queue and subscriber as existing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unchecked;

impl QueueRegistry for Unchecked {
  async fn queue_exists(&self, _queue: &QueueId) -> bool { true }
}

impl SubscriberDirectory for Unchecked {
  async fn subscriber_exists(&self, _subscriber: SubscriberId) -> bool { true }
}
