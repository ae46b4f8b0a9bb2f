//! [`MemoryStore`]: the in-memory implementation of [`SubscriptionStore`].

use std::{collections::BTreeMap, convert::Infallible, sync::Arc};

use herald_core::{
  filter::SubscriptionFilter,
  store::SubscriptionStore,
  subscription::{
    Subscription, SubscriptionDraft, SubscriptionId, SubscriptionState,
  },
};
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
  last_id: i64,
  rows:    BTreeMap<SubscriptionId, Subscription>,
}

/// A subscription store held entirely in memory.
///
/// Cloning is cheap; clones share the same rows.
#[derive(Clone, Default)]
pub struct MemoryStore {
  inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Number of stored subscriptions, deleted ones included.
  pub async fn len(&self) -> usize { self.inner.read().await.rows.len() }

  pub async fn is_empty(&self) -> bool { self.len().await == 0 }
}

impl SubscriptionStore for MemoryStore {
  type Error = Infallible;

  async fn insert(&self, draft: SubscriptionDraft) -> Result<Subscription, Infallible> {
    let mut inner = self.inner.write().await;
    inner.last_id += 1;
    let subscription = draft.into_subscription(SubscriptionId(inner.last_id));
    inner.rows.insert(subscription.id, subscription.clone());
    tracing::trace!(id = %subscription.id, "inserted subscription");
    Ok(subscription)
  }

  async fn get(&self, id: SubscriptionId) -> Result<Option<Subscription>, Infallible> {
    Ok(self.inner.read().await.rows.get(&id).cloned())
  }

  async fn update(
    &self,
    subscription: Subscription,
  ) -> Result<Option<Subscription>, Infallible> {
    let mut inner = self.inner.write().await;
    let Some(row) = inner.rows.get_mut(&subscription.id) else {
      return Ok(None);
    };
    row.label = subscription.label;
    // The lifecycle only moves forward, even if a delete landed after the
    // caller read the row.
    if !row.is_deleted() {
      row.state = subscription.state;
    }
    row.categories = subscription.categories;
    Ok(Some(row.clone()))
  }

  async fn soft_delete(
    &self,
    id: SubscriptionId,
  ) -> Result<Option<Subscription>, Infallible> {
    let mut inner = self.inner.write().await;
    Ok(inner.rows.get_mut(&id).map(|row| {
      row.state = SubscriptionState::Deleted;
      row.clone()
    }))
  }

  async fn find(
    &self,
    filter: &SubscriptionFilter,
  ) -> Result<Vec<Subscription>, Infallible> {
    let inner = self.inner.read().await;
    Ok(
      inner
        .rows
        .values()
        .filter(|s| filter.matches(s))
        .cloned()
        .collect(),
    )
  }
}
