//! In-memory backend for the Herald subscription store.
//!
//! Rows live in a `BTreeMap` keyed by id behind a `tokio` read/write lock.
//! Ids are assigned sequentially from 1. Nothing survives the process.

mod store;

pub use store::MemoryStore;

#[cfg(test)]
mod tests;
