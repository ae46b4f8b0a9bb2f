//! The `SubscriptionStore` trait.
//!
//! Implemented by storage backends (`herald-store-memory`,
//! `herald-store-sqlite`). The store owns identity assignment; the service
//! owns validation and timestamps. Absence is reported as `Ok(None)` and
//! lifted to [`Error::NotFound`](crate::Error::NotFound) by the service.

use std::future::Future;

use crate::{
  filter::SubscriptionFilter,
  subscription::{Subscription, SubscriptionDraft, SubscriptionId},
};

/// Abstraction over a subscription store backend.
///
/// No operation physically removes a subscription. All methods return `Send`
/// futures so the trait can be used from multi-threaded runtimes.
pub trait SubscriptionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new subscription and its patterns, assigning a fresh id.
  fn insert(
    &self,
    draft: SubscriptionDraft,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + '_;

  /// Retrieve a subscription by id, whatever its lifecycle state.
  fn get(
    &self,
    id: SubscriptionId,
  ) -> impl Future<Output = Result<Option<Subscription>, Self::Error>> + Send + '_;

  /// Overwrite the mutable fields (label, state, patterns) of an existing
  /// subscription. Queue, subscriber and `created_on` are never written,
  /// and a row that is already `Deleted` stays `Deleted`.
  /// Returns the stored result, or `None` if `subscription.id` is unknown.
  fn update(
    &self,
    subscription: Subscription,
  ) -> impl Future<Output = Result<Option<Subscription>, Self::Error>> + Send + '_;

  /// Mark a subscription `Deleted`. Repeating the call is harmless.
  /// Returns `None` if `id` is unknown.
  fn soft_delete(
    &self,
    id: SubscriptionId,
  ) -> impl Future<Output = Result<Option<Subscription>, Self::Error>> + Send + '_;

  /// Return every subscription passing all clauses of `filter`, ordered by id.
  fn find<'a>(
    &'a self,
    filter: &'a SubscriptionFilter,
  ) -> impl Future<Output = Result<Vec<Subscription>, Self::Error>> + Send + 'a;
}
