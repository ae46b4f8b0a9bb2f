//! SQL schema for the Herald SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Rows are never deleted by the store; `is_deleted` marks soft deletion.
CREATE TABLE IF NOT EXISTS subscriptions (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    queue_id      TEXT    NOT NULL,
    subscriber_id INTEGER NOT NULL,
    label         TEXT,
    created_on    TEXT    NOT NULL,   -- RFC 3339 UTC; set once on insert
    is_deleted    INTEGER NOT NULL DEFAULT 0 CHECK (is_deleted IN (0, 1))
);

-- Patterns belong to their subscription and go with it.
CREATE TABLE IF NOT EXISTS subscription_categories (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    subscription_id INTEGER NOT NULL
                    REFERENCES subscriptions(id) ON DELETE CASCADE,
    category        TEXT    NOT NULL,  -- LIKE-style pattern
    is_exception    INTEGER NOT NULL DEFAULT 0 CHECK (is_exception IN (0, 1))
);

CREATE INDEX IF NOT EXISTS subscriptions_queue_idx
    ON subscriptions(queue_id, is_deleted);
CREATE INDEX IF NOT EXISTS subscriptions_subscriber_idx
    ON subscriptions(subscriber_id);
CREATE INDEX IF NOT EXISTS subscription_categories_sub_idx
    ON subscription_categories(subscription_id);

PRAGMA user_version = 1;
";
