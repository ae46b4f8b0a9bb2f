//! Encoding and decoding helpers between Herald domain types and the plain
//! column values stored in SQLite.
//!
//! Timestamps are stored as RFC 3339 strings; booleans as `0`/`1` integers.

use chrono::{DateTime, Utc};
use herald_core::{
  category::CategoryPattern,
  subscription::{
    QueueId, SubscriberId, Subscription, SubscriptionId, SubscriptionState,
  },
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Flags ───────────────────────────────────────────────────────────────────

pub fn encode_state(state: SubscriptionState) -> i64 {
  match state {
    SubscriptionState::Active => 0,
    SubscriptionState::Deleted => 1,
  }
}

pub fn decode_state(flag: i64) -> Result<SubscriptionState> {
  match flag {
    0 => Ok(SubscriptionState::Active),
    1 => Ok(SubscriptionState::Deleted),
    other => Err(Error::Corrupt(format!("is_deleted = {other}"))),
  }
}

pub fn decode_flag(column: &str, flag: i64) -> Result<bool> {
  match flag {
    0 => Ok(false),
    1 => Ok(true),
    other => Err(Error::Corrupt(format!("{column} = {other}"))),
  }
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A `subscriptions` row exactly as read from SQLite.
pub struct RawSubscription {
  pub id:            i64,
  pub queue_id:      String,
  pub subscriber_id: i64,
  pub label:         Option<String>,
  pub created_on:    String,
  pub is_deleted:    i64,
}

impl RawSubscription {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      queue_id:      row.get(1)?,
      subscriber_id: row.get(2)?,
      label:         row.get(3)?,
      created_on:    row.get(4)?,
      is_deleted:    row.get(5)?,
    })
  }

  pub fn into_subscription(
    self,
    categories: Vec<RawCategory>,
  ) -> Result<Subscription> {
    Ok(Subscription {
      id:            SubscriptionId(self.id),
      queue_id:      QueueId::from(self.queue_id),
      subscriber_id: SubscriberId(self.subscriber_id),
      label:         self.label,
      created_on:    decode_dt(&self.created_on)?,
      state:         decode_state(self.is_deleted)?,
      categories:    categories
        .into_iter()
        .map(RawCategory::into_pattern)
        .collect::<Result<_>>()?,
    })
  }
}

/// A `subscription_categories` row exactly as read from SQLite.
pub struct RawCategory {
  pub category:     String,
  pub is_exception: i64,
}

impl RawCategory {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { category: row.get(0)?, is_exception: row.get(1)? })
  }

  pub fn into_pattern(self) -> Result<CategoryPattern> {
    Ok(CategoryPattern {
      pattern:      self.category,
      is_exception: decode_flag("is_exception", self.is_exception)?,
    })
  }
}
