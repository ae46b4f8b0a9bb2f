//! Core types and trait definitions for Herald subscription matching.
//!
//! Decides which subscriptions on a queue should receive a message carrying a
//! given category tag, and composes filtered lookups over a subscription
//! store. This crate is free of HTTP and database dependencies; storage
//! backends implement [`store::SubscriptionStore`].

pub mod category;
pub mod clock;
pub mod directory;
pub mod error;
pub mod filter;
pub mod service;
pub mod store;
pub mod subscription;

pub use error::{Error, Result};
