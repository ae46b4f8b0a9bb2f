//! Handlers for `/subscriptions` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/subscriptions` | Optional `queue`, `subscriber`, `current_only`, `categories` (comma-separated) |
//! | `POST`   | `/subscriptions` | Body: [`NewSubscription`]; returns 201 + stored subscription |
//! | `GET`    | `/subscriptions/:id` | 404 if not found |
//! | `PATCH`  | `/subscriptions/:id` | Body: [`UpdateBody`] |
//! | `DELETE` | `/subscriptions/:id` | Soft delete; returns the deleted subscription |

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use herald_core::{
  category::CategoryPattern,
  service::SubscriptionService,
  store::SubscriptionStore,
  subscription::{
    NewSubscription, QueueId, SubscriberId, Subscription, SubscriptionId,
  },
};
use serde::{Deserialize, Deserializer};

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub queue:        Option<QueueId>,
  pub subscriber:   Option<SubscriberId>,
  /// If `true`, leave out soft-deleted subscriptions. Default `false`.
  #[serde(default)]
  pub current_only: bool,
  /// Comma-separated categories; every one must match.
  pub categories:   Option<String>,
}

/// `GET /subscriptions[?queue=...][&subscriber=...][&current_only=true][&categories=a,b]`
pub async fn list<S>(
  State(service): State<Arc<SubscriptionService<S>>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Subscription>>, ApiError>
where
  S: SubscriptionStore,
{
  let Query(params) = params?;

  let mut filter = service.filter();
  if let Some(queue) = params.queue {
    filter = filter.with_queue(queue);
  }
  if let Some(subscriber) = params.subscriber {
    filter = filter.with_subscriber(subscriber);
  }
  if params.current_only {
    filter = filter.current_only();
  }
  let filter = filter.matching_category(
    params
      .categories
      .iter()
      .flat_map(|s| s.split(','))
      .map(str::trim)
      .filter(|c| !c.is_empty()),
  );

  Ok(Json(service.find(&filter).await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /subscriptions` with body
/// `{"queue_id":"orders","subscriber_id":7,"categories":[{"pattern":"orders.%"}]}`
pub async fn create<S>(
  State(service): State<Arc<SubscriptionService<S>>>,
  body: Result<Json<NewSubscription>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SubscriptionStore,
{
  let Json(input) = body?;
  let subscription = service.create(input).await?;
  Ok((StatusCode::CREATED, Json(subscription)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /subscriptions/:id`
pub async fn get_one<S>(
  State(service): State<Arc<SubscriptionService<S>>>,
  Path(id): Path<SubscriptionId>,
) -> Result<Json<Subscription>, ApiError>
where
  S: SubscriptionStore,
{
  Ok(Json(service.get(id).await?))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// Fields left out keep their stored value; `"label": null` clears the
/// label. `queue_id` and `subscriber_id` are accepted only when they equal
/// the stored references.
#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub queue_id:      Option<QueueId>,
  pub subscriber_id: Option<SubscriberId>,
  #[serde(default, deserialize_with = "present")]
  pub label:         Option<Option<String>>,
  pub categories:    Option<Vec<CategoryPattern>>,
}

/// Wrap a field that was present in the body, `null` included, in `Some`.
fn present<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  T::deserialize(d).map(Some)
}

/// `PATCH /subscriptions/:id`
pub async fn update_one<S>(
  State(service): State<Arc<SubscriptionService<S>>>,
  Path(id): Path<SubscriptionId>,
  body: Result<Json<UpdateBody>, JsonRejection>,
) -> Result<Json<Subscription>, ApiError>
where
  S: SubscriptionStore,
{
  let Json(body) = body?;
  let mut subscription = service.get(id).await?;

  if let Some(queue_id) = body.queue_id {
    subscription.queue_id = queue_id;
  }
  if let Some(subscriber_id) = body.subscriber_id {
    subscription.subscriber_id = subscriber_id;
  }
  if let Some(label) = body.label {
    subscription.label = label;
  }
  if let Some(categories) = body.categories {
    subscription.categories = categories;
  }

  Ok(Json(service.update(subscription).await?))
}

// ─── Soft delete ──────────────────────────────────────────────────────────────

/// `DELETE /subscriptions/:id`
pub async fn delete_one<S>(
  State(service): State<Arc<SubscriptionService<S>>>,
  Path(id): Path<SubscriptionId>,
) -> Result<Json<Subscription>, ApiError>
where
  S: SubscriptionStore,
{
  Ok(Json(service.soft_delete(id).await?))
}
