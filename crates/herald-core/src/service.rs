//! [`SubscriptionService`]: subscription lifecycle and dispatch lookups over
//! any [`SubscriptionStore`].
//!
//! The service validates input, stamps creation time from an injected
//! [`Clock`], and turns store-level absence into [`Error::NotFound`]. Store
//! failures are surfaced unchanged inside [`Error::Store`]; there is no retry.

use crate::{
  Error, Result,
  category::ExceptionPolicy,
  clock::{Clock, SystemClock},
  directory::{QueueRegistry, SubscriberDirectory, Unchecked},
  filter::SubscriptionFilter,
  store::SubscriptionStore,
  subscription::{
    NewSubscription, QueueId, Subscription, SubscriptionDraft, SubscriptionId,
  },
};

pub struct SubscriptionService<
  S,
  Q = Unchecked,
  D = Unchecked,
  C = SystemClock,
> {
  store:       S,
  queues:      Q,
  subscribers: D,
  clock:       C,
  policy:      ExceptionPolicy,
}

impl<S: SubscriptionStore> SubscriptionService<S> {
  /// A service over `store` using the wall clock, no reference validation and
  /// the [`ExceptionPolicy::Alternative`] matching policy.
  pub fn new(store: S) -> Self {
    Self {
      store,
      queues: Unchecked,
      subscribers: Unchecked,
      clock: SystemClock,
      policy: ExceptionPolicy::default(),
    }
  }
}

impl<S, Q, D, C> SubscriptionService<S, Q, D, C>
where
  S: SubscriptionStore,
  Q: QueueRegistry,
  D: SubscriberDirectory,
  C: Clock,
{
  // ── Configuration ───────────────────────────────────────────────────────

  pub fn with_clock<C2: Clock>(
    self,
    clock: C2,
  ) -> SubscriptionService<S, Q, D, C2> {
    SubscriptionService {
      store: self.store,
      queues: self.queues,
      subscribers: self.subscribers,
      clock,
      policy: self.policy,
    }
  }

  pub fn with_queue_registry<Q2: QueueRegistry>(
    self,
    queues: Q2,
  ) -> SubscriptionService<S, Q2, D, C> {
    SubscriptionService {
      store: self.store,
      queues,
      subscribers: self.subscribers,
      clock: self.clock,
      policy: self.policy,
    }
  }

  pub fn with_subscriber_directory<D2: SubscriberDirectory>(
    self,
    subscribers: D2,
  ) -> SubscriptionService<S, Q, D2, C> {
    SubscriptionService {
      store: self.store,
      queues: self.queues,
      subscribers,
      clock: self.clock,
      policy: self.policy,
    }
  }

  pub fn with_exception_policy(mut self, policy: ExceptionPolicy) -> Self {
    self.policy = policy;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn exception_policy(&self) -> ExceptionPolicy { self.policy }

  /// An empty filter carrying this service's exception policy.
  pub fn filter(&self) -> SubscriptionFilter {
    SubscriptionFilter::new().with_exception_policy(self.policy)
  }

  // ── Lifecycle ───────────────────────────────────────────────────────────

  /// Validate and persist a new subscription. `created_on` is taken from the
  /// clock at this moment; the id is assigned by the store.
  pub async fn create(&self, input: NewSubscription) -> Result<Subscription> {
    let queue_id = input
      .queue_id
      .filter(|q| !q.as_str().trim().is_empty())
      .ok_or_else(|| Error::validation("queue_id is required"))?;
    let subscriber_id = input
      .subscriber_id
      .ok_or_else(|| Error::validation("subscriber_id is required"))?;

    if !self.queues.queue_exists(&queue_id).await {
      return Err(Error::validation(format!("unknown queue {queue_id:?}")));
    }
    if !self.subscribers.subscriber_exists(subscriber_id).await {
      return Err(Error::validation(format!("unknown subscriber {subscriber_id}")));
    }

    let draft = SubscriptionDraft {
      queue_id,
      subscriber_id,
      label: input.label,
      created_on: self.clock.now(),
      categories: input.categories,
    };

    let subscription = self.store.insert(draft).await.map_err(Error::store)?;
    tracing::info!(
      id = %subscription.id,
      queue = %subscription.queue_id,
      subscriber = %subscription.subscriber_id,
      "subscription created"
    );
    Ok(subscription)
  }

  pub async fn get(&self, id: SubscriptionId) -> Result<Subscription> {
    self
      .store
      .get(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(id))
  }

  /// Write the label, patterns and lifecycle state of `subscription`.
  ///
  /// The queue and subscriber references must equal the stored ones, and a
  /// deleted subscription cannot be made active again, including when a
  /// delete lands between the read and the write. The stored `created_on`
  /// always wins.
  pub async fn update(&self, subscription: Subscription) -> Result<Subscription> {
    let id = subscription.id;
    let existing = self.get(id).await?;

    if subscription.queue_id != existing.queue_id {
      return Err(Error::validation("queue_id cannot be changed"));
    }
    if subscription.subscriber_id != existing.subscriber_id {
      return Err(Error::validation("subscriber_id cannot be changed"));
    }
    if existing.is_deleted() && !subscription.is_deleted() {
      return Err(Error::validation(format!(
        "subscription {id} is deleted and cannot be restored"
      )));
    }

    let requested = subscription.state;
    let updated = self
      .store
      .update(Subscription { created_on: existing.created_on, ..subscription })
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(id))?;
    if updated.state != requested {
      tracing::debug!(id = %id, "subscription deleted concurrently; state kept");
    }
    tracing::debug!(id = %id, "subscription updated");
    Ok(updated)
  }

  /// Mark a subscription deleted. It stays in storage but drops out of
  /// current-only queries.
  pub async fn soft_delete(&self, id: SubscriptionId) -> Result<Subscription> {
    let deleted = self
      .store
      .soft_delete(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(id))?;
    tracing::info!(id = %id, "subscription soft-deleted");
    Ok(deleted)
  }

  // ── Queries ─────────────────────────────────────────────────────────────

  /// Execute a composed filter as given.
  pub async fn find(
    &self,
    filter: &SubscriptionFilter,
  ) -> Result<Vec<Subscription>> {
    self.store.find(filter).await.map_err(Error::store)
  }

  /// Current subscriptions on `queue` whose patterns accept `category`.
  pub async fn find_matching_subscriptions(
    &self,
    queue: &QueueId,
    category: &str,
  ) -> Result<Vec<Subscription>> {
    let filter = self
      .filter()
      .with_queue(queue.clone())
      .current_only()
      .matching_category([category]);
    let matched = self.find(&filter).await?;
    tracing::debug!(
      queue = %queue,
      category,
      matched = matched.len(),
      "matched subscriptions"
    );
    Ok(matched)
  }
}
