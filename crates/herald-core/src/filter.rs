//! [`SubscriptionFilter`]: a strongly-typed query over the subscription
//! store.
//!
//! Each clause is optional and clauses combine with AND. Builder methods take
//! `self` by value and return the updated filter, so a filter handed to
//! someone else is never changed behind their back; clone it to branch.
//!
//! ```
//! use herald_core::filter::SubscriptionFilter;
//!
//! let filter = SubscriptionFilter::new()
//!   .with_queue("orders")
//!   .current_only()
//!   .matching_category(["orders.created"]);
//! assert!(filter.is_current_only());
//! ```

use crate::{
  category::{self, CategoryPattern, ExceptionPolicy},
  subscription::{QueueId, SubscriberId, Subscription},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
  queue:            Option<QueueId>,
  subscriber:       Option<SubscriberId>,
  current_only:     bool,
  /// Every entry must independently satisfy the subscription's pattern set.
  categories:       Vec<String>,
  exception_policy: ExceptionPolicy,
}

impl SubscriptionFilter {
  /// An unconstrained filter: every stored subscription passes.
  pub fn new() -> Self { Self::default() }

  // ── Clauses ─────────────────────────────────────────────────────────────

  /// Require `queue_id == queue`. A later call replaces the earlier value.
  pub fn with_queue(mut self, queue: impl Into<QueueId>) -> Self {
    self.queue = Some(queue.into());
    self
  }

  /// Require `subscriber_id == subscriber`. A later call replaces the earlier
  /// value.
  pub fn with_subscriber(mut self, subscriber: SubscriberId) -> Self {
    self.subscriber = Some(subscriber);
    self
  }

  /// Exclude soft-deleted subscriptions.
  pub fn current_only(mut self) -> Self {
    self.current_only = true;
    self
  }

  /// Require every supplied category to match the subscription's pattern
  /// set. Pass a single category as `[c]` or `Some(c)`; an empty sequence or
  /// `None` leaves the filter unchanged. Repeated calls accumulate.
  pub fn matching_category<I, C>(mut self, categories: I) -> Self
  where
    I: IntoIterator<Item = C>,
    C: Into<String>,
  {
    self.categories.extend(categories.into_iter().map(Into::into));
    self
  }

  /// Choose how exception patterns combine when evaluating categories.
  pub fn with_exception_policy(mut self, policy: ExceptionPolicy) -> Self {
    self.exception_policy = policy;
    self
  }

  // ── Accessors ───────────────────────────────────────────────────────────

  pub fn queue(&self) -> Option<&QueueId> { self.queue.as_ref() }

  pub fn subscriber(&self) -> Option<SubscriberId> { self.subscriber }

  pub fn is_current_only(&self) -> bool { self.current_only }

  pub fn categories(&self) -> &[String] { &self.categories }

  pub fn exception_policy(&self) -> ExceptionPolicy { self.exception_policy }

  // ── Evaluation ──────────────────────────────────────────────────────────

  /// Evaluate only the category clause against a pattern set.
  pub fn matches_categories(&self, patterns: &[CategoryPattern]) -> bool {
    self
      .categories
      .iter()
      .all(|c| category::matches(c, patterns, self.exception_policy))
  }

  /// Evaluate every clause against `subscription`.
  pub fn matches(&self, subscription: &Subscription) -> bool {
    self.queue.as_ref().is_none_or(|q| *q == subscription.queue_id)
      && self.subscriber.is_none_or(|s| s == subscription.subscriber_id)
      && !(self.current_only && subscription.is_deleted())
      && self.matches_categories(&subscription.categories)
  }
}
