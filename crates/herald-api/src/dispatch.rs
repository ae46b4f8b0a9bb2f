//! Handler for `GET /queues/:queue/matches`, the lookup a dispatcher makes
//! when a message is published.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State, rejection::QueryRejection},
};
use herald_core::{
  service::SubscriptionService,
  store::SubscriptionStore,
  subscription::{QueueId, Subscription},
};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct MatchParams {
  /// The published message's category tag.
  pub category: String,
}

/// `GET /queues/:queue/matches?category=...`
///
/// Returns the current subscriptions on `queue` whose patterns accept
/// `category`.
pub async fn handler<S>(
  State(service): State<Arc<SubscriptionService<S>>>,
  Path(queue): Path<QueueId>,
  params: Result<Query<MatchParams>, QueryRejection>,
) -> Result<Json<Vec<Subscription>>, ApiError>
where
  S: SubscriptionStore,
{
  let Query(params) = params?;
  let matched = service
    .find_matching_subscriptions(&queue, &params.category)
    .await?;
  Ok(Json(matched))
}
