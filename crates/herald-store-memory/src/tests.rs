//! Service-level tests for `SubscriptionService` over `MemoryStore`.

use std::convert::Infallible;

use chrono::{DateTime, TimeZone, Utc};
use herald_core::{
  Error,
  category::{CategoryPattern, ExceptionPolicy},
  clock::FixedClock,
  directory::{QueueRegistry, SubscriberDirectory},
  filter::SubscriptionFilter,
  service::SubscriptionService,
  store::SubscriptionStore,
  subscription::{
    NewSubscription, QueueId, SubscriberId, Subscription, SubscriptionDraft,
    SubscriptionId, SubscriptionState,
  },
};

use crate::MemoryStore;

fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() }

fn service() -> SubscriptionService<MemoryStore> {
  SubscriptionService::new(MemoryStore::new())
}

fn orders_sub(queue: &str, subscriber: i64) -> NewSubscription {
  NewSubscription::new(queue, SubscriberId(subscriber))
    .with_category(CategoryPattern::include("orders.%"))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_assigns_id_and_clock_time() {
  let svc = service().with_clock(FixedClock(t0()));

  let a = svc.create(orders_sub("1", 7).with_label("mine")).await.unwrap();
  let b = svc.create(orders_sub("1", 8)).await.unwrap();

  assert_eq!(a.id, SubscriptionId(1));
  assert_eq!(b.id, SubscriptionId(2));
  assert_eq!(a.created_on, t0());
  assert_eq!(a.state, SubscriptionState::Active);
  assert_eq!(a.label.as_deref(), Some("mine"));
  assert_eq!(a.categories, vec![CategoryPattern::include("orders.%")]);
}

#[tokio::test]
async fn create_requires_queue_and_subscriber() {
  let svc = service();

  let no_queue = NewSubscription {
    subscriber_id: Some(SubscriberId(7)),
    ..Default::default()
  };
  assert!(matches!(svc.create(no_queue).await, Err(Error::Validation(_))));

  let blank_queue = NewSubscription {
    queue_id: Some(QueueId::new("  ")),
    subscriber_id: Some(SubscriberId(7)),
    ..Default::default()
  };
  assert!(matches!(svc.create(blank_queue).await, Err(Error::Validation(_))));

  let no_subscriber = NewSubscription {
    queue_id: Some("1".into()),
    ..Default::default()
  };
  assert!(matches!(svc.create(no_subscriber).await, Err(Error::Validation(_))));

  // Nothing was partially written.
  assert!(svc.store().is_empty().await);
}

struct KnownQueues(Vec<&'static str>);

impl QueueRegistry for KnownQueues {
  async fn queue_exists(&self, queue: &QueueId) -> bool {
    self.0.iter().any(|known| *known == queue.as_str())
  }
}

struct KnownSubscribers(Vec<i64>);

impl SubscriberDirectory for KnownSubscribers {
  async fn subscriber_exists(&self, subscriber: SubscriberId) -> bool {
    self.0.contains(&subscriber.get())
  }
}

#[tokio::test]
async fn create_consults_collaborators() {
  let svc = service()
    .with_queue_registry(KnownQueues(vec!["1"]))
    .with_subscriber_directory(KnownSubscribers(vec![7]));

  assert!(svc.create(orders_sub("1", 7)).await.is_ok());
  assert!(matches!(
    svc.create(orders_sub("2", 7)).await,
    Err(Error::Validation(_))
  ));
  assert!(matches!(
    svc.create(orders_sub("1", 8)).await,
    Err(Error::Validation(_))
  ));
  assert_eq!(svc.store().len().await, 1);
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_changes_label_and_keeps_created_on() {
  let svc = service().with_clock(FixedClock(t0()));
  let created = svc.create(orders_sub("1", 7)).await.unwrap();

  let mut edited = created.clone();
  edited.label = Some("renamed".into());
  edited.created_on = Utc::now();
  edited.categories = vec![CategoryPattern::exception("orders.test.%")];

  let updated = svc.update(edited).await.unwrap();
  assert_eq!(updated.label.as_deref(), Some("renamed"));
  assert_eq!(updated.created_on, t0());
  assert_eq!(
    updated.categories,
    vec![CategoryPattern::exception("orders.test.%")]
  );

  let fetched = svc.get(created.id).await.unwrap();
  assert_eq!(fetched, updated);
}

#[tokio::test]
async fn update_rejects_reference_changes() {
  let svc = service();
  let created = svc.create(orders_sub("1", 7)).await.unwrap();

  let mut moved = created.clone();
  moved.queue_id = "2".into();
  assert!(matches!(svc.update(moved).await, Err(Error::Validation(_))));

  let mut reassigned = created.clone();
  reassigned.subscriber_id = SubscriberId(8);
  assert!(matches!(svc.update(reassigned).await, Err(Error::Validation(_))));
}

#[tokio::test]
async fn update_unknown_id_is_not_found() {
  let svc = service();
  let mut ghost = svc.create(orders_sub("1", 7)).await.unwrap();
  ghost.id = SubscriptionId(99);
  assert!(matches!(
    svc.update(ghost).await,
    Err(Error::NotFound(SubscriptionId(99)))
  ));
}

#[tokio::test]
async fn deleted_subscription_cannot_be_restored() {
  let svc = service();
  let created = svc.create(orders_sub("1", 7)).await.unwrap();
  let deleted = svc.soft_delete(created.id).await.unwrap();

  let mut revived = deleted.clone();
  revived.state = SubscriptionState::Active;
  assert!(matches!(svc.update(revived).await, Err(Error::Validation(_))));

  // Editing the label of a deleted subscription is still allowed.
  let mut relabelled = deleted;
  relabelled.label = Some("archived".into());
  let updated = svc.update(relabelled).await.unwrap();
  assert!(updated.is_deleted());
}

// ─── Soft delete ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn soft_delete_is_idempotent_and_keeps_the_row() {
  let svc = service();
  let created = svc.create(orders_sub("1", 7)).await.unwrap();

  let first = svc.soft_delete(created.id).await.unwrap();
  let second = svc.soft_delete(created.id).await.unwrap();
  assert!(first.is_deleted());
  assert!(second.is_deleted());

  let stored = svc.get(created.id).await.unwrap();
  assert!(stored.is_deleted());
  assert_eq!(svc.store().len().await, 1);
}

#[tokio::test]
async fn soft_delete_unknown_id_is_not_found() {
  let svc = service();
  assert!(matches!(
    svc.soft_delete(SubscriptionId(42)).await,
    Err(Error::NotFound(SubscriptionId(42)))
  ));
}

// ─── Queries ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn dispatch_lookup_end_to_end() {
  let svc = service();
  let x = svc.create(orders_sub("1", 7)).await.unwrap();
  let queue = QueueId::from("1");

  let hits = svc.find_matching_subscriptions(&queue, "orders.created").await.unwrap();
  assert_eq!(hits, vec![x.clone()]);

  let misses = svc
    .find_matching_subscriptions(&queue, "billing.created")
    .await
    .unwrap();
  assert!(misses.is_empty());

  svc.soft_delete(x.id).await.unwrap();
  let after = svc.find_matching_subscriptions(&queue, "orders.created").await.unwrap();
  assert!(after.is_empty());
}

#[tokio::test]
async fn dispatch_lookup_is_scoped_to_queue() {
  let svc = service();
  svc.create(orders_sub("1", 7)).await.unwrap();
  let other = svc.create(orders_sub("2", 7)).await.unwrap();

  let hits = svc
    .find_matching_subscriptions(&QueueId::from("2"), "orders.created")
    .await
    .unwrap();
  assert_eq!(hits, vec![other]);
}

#[tokio::test]
async fn subscription_without_patterns_receives_everything() {
  let svc = service();
  let catch_all = svc
    .create(NewSubscription::new("1", SubscriberId(3)))
    .await
    .unwrap();

  let hits = svc
    .find_matching_subscriptions(&QueueId::from("1"), "anything.at.all")
    .await
    .unwrap();
  assert_eq!(hits, vec![catch_all]);
}

#[tokio::test]
async fn dispatch_lookup_follows_service_policy() {
  let input = NewSubscription::new("1", SubscriberId(7))
    .with_category(CategoryPattern::include("a.%"))
    .with_category(CategoryPattern::exception("a.b"));
  let queue = QueueId::from("1");

  let alternative = service();
  alternative.create(input.clone()).await.unwrap();
  assert_eq!(
    alternative
      .find_matching_subscriptions(&queue, "a.b")
      .await
      .unwrap()
      .len(),
    1
  );

  let veto = service().with_exception_policy(ExceptionPolicy::Veto);
  veto.create(input).await.unwrap();
  assert!(veto.find_matching_subscriptions(&queue, "a.b").await.unwrap().is_empty());
  assert_eq!(veto.find_matching_subscriptions(&queue, "a.c").await.unwrap().len(), 1);
}

#[tokio::test]
async fn find_by_subscriber_with_and_without_deleted() {
  let svc = service();
  let a = svc.create(orders_sub("1", 7)).await.unwrap();
  let b = svc.create(orders_sub("2", 7)).await.unwrap();
  svc.create(orders_sub("1", 8)).await.unwrap();
  svc.soft_delete(b.id).await.unwrap();

  let all = svc
    .find(&SubscriptionFilter::new().with_subscriber(SubscriberId(7)))
    .await
    .unwrap();
  assert_eq!(all.len(), 2);

  let current = svc
    .find(&svc.filter().with_subscriber(SubscriberId(7)).current_only())
    .await
    .unwrap();
  assert_eq!(current, vec![a]);
}

#[tokio::test]
async fn store_update_never_touches_references() {
  let store = MemoryStore::new();
  let svc = SubscriptionService::new(store.clone());
  let created = svc.create(orders_sub("1", 7)).await.unwrap();

  let mut sneaky = created.clone();
  sneaky.queue_id = "9".into();
  sneaky.subscriber_id = SubscriberId(9);
  sneaky.created_on = Utc::now();
  let stored = store.update(sneaky).await.unwrap().unwrap();

  assert_eq!(stored.queue_id, created.queue_id);
  assert_eq!(stored.subscriber_id, created.subscriber_id);
  assert_eq!(stored.created_on, created.created_on);
}

#[tokio::test]
async fn store_update_never_revives_a_deleted_row() {
  let store = MemoryStore::new();
  let svc = SubscriptionService::new(store.clone());
  let created = svc.create(orders_sub("1", 7)).await.unwrap();
  store.soft_delete(created.id).await.unwrap();

  let mut stale = created.clone();
  stale.label = Some("late edit".into());
  let stored = store.update(stale).await.unwrap().unwrap();

  assert_eq!(stored.state, SubscriptionState::Deleted);
  assert_eq!(stored.label.as_deref(), Some("late edit"));
}

/// Deletes the row just before every write, as a concurrent DELETE would.
#[derive(Clone, Default)]
struct DeleteBeforeWrite(MemoryStore);

impl SubscriptionStore for DeleteBeforeWrite {
  type Error = Infallible;

  async fn insert(
    &self,
    draft: SubscriptionDraft,
  ) -> Result<Subscription, Self::Error> {
    self.0.insert(draft).await
  }

  async fn get(
    &self,
    id: SubscriptionId,
  ) -> Result<Option<Subscription>, Self::Error> {
    self.0.get(id).await
  }

  async fn update(
    &self,
    subscription: Subscription,
  ) -> Result<Option<Subscription>, Self::Error> {
    self.0.soft_delete(subscription.id).await?;
    self.0.update(subscription).await
  }

  async fn soft_delete(
    &self,
    id: SubscriptionId,
  ) -> Result<Option<Subscription>, Self::Error> {
    self.0.soft_delete(id).await
  }

  async fn find(
    &self,
    filter: &SubscriptionFilter,
  ) -> Result<Vec<Subscription>, Self::Error> {
    self.0.find(filter).await
  }
}

#[tokio::test]
async fn delete_racing_an_update_stays_deleted() {
  let store = DeleteBeforeWrite::default();
  let svc = SubscriptionService::new(store.clone());
  let created = svc.create(orders_sub("1", 7)).await.unwrap();

  let mut relabelled = created.clone();
  relabelled.label = Some("renamed".into());
  let returned = svc.update(relabelled).await.unwrap();
  assert!(returned.is_deleted());

  let stored = svc.get(created.id).await.unwrap();
  assert!(stored.is_deleted());
  assert!(
    svc
      .find_matching_subscriptions(&QueueId::from("1"), "orders.created")
      .await
      .unwrap()
      .is_empty()
  );
}
