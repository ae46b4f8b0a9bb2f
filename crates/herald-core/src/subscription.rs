//! A subscription is one subscriber's registration of interest on one queue.
//!
//! The queue and subscriber references are fixed at creation, as is the
//! `created_on` timestamp. Only the label, the pattern set and the lifecycle
//! state change afterwards, and the lifecycle only moves forward.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
  Error,
  category::{CategoryPattern, ExceptionPolicy, matches},
};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Store-assigned identity of a subscription.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct SubscriptionId(pub i64);

impl fmt::Display for SubscriptionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Name of the queue a subscription is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueId(String);

impl QueueId {
  pub fn new(name: impl Into<String>) -> Self { Self(name.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for QueueId {
  fn from(name: &str) -> Self { Self::new(name) }
}

impl From<String> for QueueId {
  fn from(name: String) -> Self { Self(name) }
}

impl fmt::Display for QueueId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Integer identity of a subscriber in the external subscriber directory.
///
/// Parses from integers and from integer-valued strings (optional sign,
/// surrounding whitespace allowed). Anything else is a validation error.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
#[serde(transparent)]
pub struct SubscriberId(pub i64);

impl SubscriberId {
  pub fn get(self) -> i64 { self.0 }
}

impl fmt::Display for SubscriberId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl FromStr for SubscriberId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
      return Err(Error::validation(format!(
        "subscriber id must be an integer, got {s:?}"
      )));
    }
    trimmed.parse().map(Self).map_err(|_| {
      Error::validation(format!("subscriber id out of range: {s:?}"))
    })
  }
}

impl<'de> Deserialize<'de> for SubscriberId {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
      Int(i64),
      Text(String),
    }

    match Raw::deserialize(d) {
      Ok(Raw::Int(n)) => Ok(Self(n)),
      Ok(Raw::Text(s)) => s.parse().map_err(serde::de::Error::custom),
      Err(_) => Err(serde::de::Error::custom("subscriber id must be an integer")),
    }
  }
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

/// Lifecycle of a subscription. `Active` is initial; `Deleted` is terminal.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
  #[default]
  Active,
  Deleted,
}

impl SubscriptionState {
  pub fn is_deleted(self) -> bool { matches!(self, Self::Deleted) }
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// A persisted subscription together with the category patterns it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
  pub id:            SubscriptionId,
  pub queue_id:      QueueId,
  pub subscriber_id: SubscriberId,
  pub label:         Option<String>,
  /// UTC; stamped once when first persisted.
  pub created_on:    DateTime<Utc>,
  #[serde(default)]
  pub state:         SubscriptionState,
  #[serde(default)]
  pub categories:    Vec<CategoryPattern>,
}

impl Subscription {
  pub fn is_deleted(&self) -> bool { self.state.is_deleted() }

  /// Whether `category` satisfies this subscription's pattern set.
  pub fn matches_category(
    &self,
    category: &str,
    policy: ExceptionPolicy,
  ) -> bool {
    matches(category, &self.categories, policy)
  }
}

/// Caller input for creating a subscription.
///
/// The references are optional here so that a missing one surfaces as a
/// validation error rather than a deserialisation failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSubscription {
  pub queue_id:      Option<QueueId>,
  pub subscriber_id: Option<SubscriberId>,
  #[serde(default)]
  pub label:         Option<String>,
  #[serde(default)]
  pub categories:    Vec<CategoryPattern>,
}

impl NewSubscription {
  pub fn new(queue_id: impl Into<QueueId>, subscriber_id: SubscriberId) -> Self {
    Self {
      queue_id: Some(queue_id.into()),
      subscriber_id: Some(subscriber_id),
      ..Default::default()
    }
  }

  pub fn with_label(mut self, label: impl Into<String>) -> Self {
    self.label = Some(label.into());
    self
  }

  pub fn with_category(mut self, pattern: CategoryPattern) -> Self {
    self.categories.push(pattern);
    self
  }
}

/// A validated, timestamped subscription awaiting an identity from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionDraft {
  pub queue_id:      QueueId,
  pub subscriber_id: SubscriberId,
  pub label:         Option<String>,
  pub created_on:    DateTime<Utc>,
  pub categories:    Vec<CategoryPattern>,
}

impl SubscriptionDraft {
  /// Attach the store-assigned identity. New subscriptions start `Active`.
  pub fn into_subscription(self, id: SubscriptionId) -> Subscription {
    Subscription {
      id,
      queue_id: self.queue_id,
      subscriber_id: self.subscriber_id,
      label: self.label,
      created_on: self.created_on,
      state: SubscriptionState::Active,
      categories: self.categories,
    }
  }
}
