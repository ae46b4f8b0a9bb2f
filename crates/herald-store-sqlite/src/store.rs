//! [`SqliteStore`]: the SQLite implementation of [`SubscriptionStore`].

use std::{collections::HashMap, path::Path};

use herald_core::{
  category::CategoryPattern,
  filter::SubscriptionFilter,
  store::SubscriptionStore,
  subscription::{Subscription, SubscriptionDraft, SubscriptionId},
};
use rusqlite::{OptionalExtension as _, types::Value};

use crate::{
  Result,
  encode::{RawCategory, RawSubscription, encode_dt, encode_state},
  schema::SCHEMA,
};

const SELECT_SUBSCRIPTION: &str = "
  SELECT id, queue_id, subscriber_id, label, created_on, is_deleted
  FROM subscriptions";

type RawRow = (RawSubscription, Vec<RawCategory>);

// ─── Row helpers (run on the connection thread) ──────────────────────────────

fn fetch_categories(
  conn: &rusqlite::Connection,
  subscription_id: i64,
) -> rusqlite::Result<Vec<RawCategory>> {
  let mut stmt = conn.prepare_cached(
    "SELECT category, is_exception FROM subscription_categories
     WHERE subscription_id = ?1
     ORDER BY id",
  )?;
  let categories = stmt
    .query_map(rusqlite::params![subscription_id], RawCategory::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(categories)
}

fn fetch_one(
  conn: &rusqlite::Connection,
  id: i64,
) -> rusqlite::Result<Option<RawRow>> {
  let raw = conn
    .query_row(
      &format!("{SELECT_SUBSCRIPTION} WHERE id = ?1"),
      rusqlite::params![id],
      RawSubscription::from_row,
    )
    .optional()?;
  let Some(raw) = raw else { return Ok(None) };
  Ok(Some((raw, fetch_categories(conn, id)?)))
}

fn insert_categories(
  conn: &rusqlite::Connection,
  subscription_id: i64,
  categories: &[(String, bool)],
) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare_cached(
    "INSERT INTO subscription_categories (subscription_id, category, is_exception)
     VALUES (?1, ?2, ?3)",
  )?;
  for (category, is_exception) in categories {
    stmt.execute(rusqlite::params![subscription_id, category, is_exception])?;
  }
  Ok(())
}

fn owned_categories(patterns: &[CategoryPattern]) -> Vec<(String, bool)> {
  patterns
    .iter()
    .map(|p| (p.pattern.clone(), p.is_exception))
    .collect()
}

fn decode(raw: Option<RawRow>) -> Result<Option<Subscription>> {
  raw
    .map(|(sub, categories)| sub.into_subscription(categories))
    .transpose()
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A subscription store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SubscriptionStore impl ──────────────────────────────────────────────────

impl SubscriptionStore for SqliteStore {
  type Error = crate::Error;

  async fn insert(&self, draft: SubscriptionDraft) -> Result<Subscription> {
    let queue_id      = draft.queue_id.as_str().to_owned();
    let subscriber_id = draft.subscriber_id.get();
    let label         = draft.label.clone();
    let created_on    = encode_dt(draft.created_on);
    let categories    = owned_categories(&draft.categories);

    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO subscriptions (queue_id, subscriber_id, label, created_on, is_deleted)
           VALUES (?1, ?2, ?3, ?4, 0)",
          rusqlite::params![queue_id, subscriber_id, label, created_on],
        )?;
        let id = tx.last_insert_rowid();
        insert_categories(&tx, id, &categories)?;
        tx.commit()?;
        Ok(id)
      })
      .await?;

    tracing::trace!(id, "inserted subscription");
    Ok(draft.into_subscription(SubscriptionId(id)))
  }

  async fn get(&self, id: SubscriptionId) -> Result<Option<Subscription>> {
    let raw = self
      .conn
      .call(move |conn| Ok(fetch_one(conn, id.0)?))
      .await?;
    decode(raw)
  }

  async fn update(&self, subscription: Subscription) -> Result<Option<Subscription>> {
    let id         = subscription.id.0;
    let label      = subscription.label.clone();
    let is_deleted = encode_state(subscription.state);
    let categories = owned_categories(&subscription.categories);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // MAX keeps a deleted row deleted whatever state the caller sends.
        let changed = tx.execute(
          "UPDATE subscriptions SET label = ?1, is_deleted = MAX(is_deleted, ?2)
           WHERE id = ?3",
          rusqlite::params![label, is_deleted, id],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        tx.execute(
          "DELETE FROM subscription_categories WHERE subscription_id = ?1",
          rusqlite::params![id],
        )?;
        insert_categories(&tx, id, &categories)?;
        let row = fetch_one(&tx, id)?;
        tx.commit()?;
        Ok(row)
      })
      .await?;

    decode(raw)
  }

  async fn soft_delete(&self, id: SubscriptionId) -> Result<Option<Subscription>> {
    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE subscriptions SET is_deleted = 1 WHERE id = ?1",
          rusqlite::params![id.0],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(fetch_one(conn, id.0)?)
      })
      .await?;

    decode(raw)
  }

  async fn find(&self, filter: &SubscriptionFilter) -> Result<Vec<Subscription>> {
    // Equality and lifecycle clauses run in SQL with bound parameters. The
    // category clause runs through the core matcher below so that SQLite's
    // case-insensitive LIKE never decides a match.
    let mut conds: Vec<&'static str> = vec![];
    let mut args: Vec<Value> = vec![];
    if let Some(queue) = filter.queue() {
      conds.push("queue_id = ?");
      args.push(Value::Text(queue.as_str().to_owned()));
    }
    if let Some(subscriber) = filter.subscriber() {
      conds.push("subscriber_id = ?");
      args.push(Value::Integer(subscriber.get()));
    }
    if filter.is_current_only() {
      conds.push("is_deleted = 0");
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };
    let subs_sql = format!("{SELECT_SUBSCRIPTION} {where_clause} ORDER BY id");
    let cats_sql = format!(
      "SELECT subscription_id, category, is_exception FROM subscription_categories
       WHERE subscription_id IN (SELECT id FROM subscriptions {where_clause})
       ORDER BY subscription_id, id"
    );

    // The candidate rows, then every pattern they own, in two statements.
    let raws: Vec<RawRow> = self
      .conn
      .call(move |conn| {
        let conn: &rusqlite::Connection = conn;
        let mut stmt = conn.prepare(&subs_sql)?;
        let subs = stmt
          .query_map(
            rusqlite::params_from_iter(args.iter()),
            RawSubscription::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(&cats_sql)?;
        let mut by_id: HashMap<i64, Vec<RawCategory>> = HashMap::new();
        let cats = stmt.query_map(rusqlite::params_from_iter(args.iter()), |row| {
          Ok((row.get::<_, i64>(0)?, RawCategory {
            category:     row.get(1)?,
            is_exception: row.get(2)?,
          }))
        })?;
        for cat in cats {
          let (subscription_id, category) = cat?;
          by_id.entry(subscription_id).or_default().push(category);
        }

        let rows = subs
          .into_iter()
          .map(|raw| {
            let categories = by_id.remove(&raw.id).unwrap_or_default();
            (raw, categories)
          })
          .collect();
        Ok(rows)
      })
      .await?;

    let candidates = raws.len();
    let mut subscriptions = raws
      .into_iter()
      .map(|(sub, categories)| sub.into_subscription(categories))
      .collect::<Result<Vec<_>>>()?;
    subscriptions.retain(|s| filter.matches_categories(&s.categories));

    tracing::trace!(candidates, matched = subscriptions.len(), "executed filter");
    Ok(subscriptions)
  }
}
