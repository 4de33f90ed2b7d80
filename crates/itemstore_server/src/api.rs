//! HTTP handlers for the items API.
//!
//! # Responsibility
//! - Map HTTP requests onto `ItemFacade` calls.
//! - Translate facade results into status codes and JSON envelopes.
//!
//! # Invariants
//! - Storage unavailability never produces a 5xx; the facade absorbs it.
//! - Facade calls run on the blocking pool, never on async worker threads.
//! - Error bodies always have the shape `{"detail": "..."}`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use itemstore_core::{HealthReport, Item, ItemError, ItemFacade, ItemId};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body accepted by `POST /items`.
///
/// `id` and `created_at` may be present but are ignored; storage assigns both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Body returned by `DELETE /items/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteItemResponse {
    pub message: String,
    pub id: ItemId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Caller-visible API failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    /// The in-memory store cannot assign another id.
    Conflict(String),
    /// A blocking facade task panicked or was cancelled.
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            Self::NotFound => "Item not found".to_string(),
            Self::BadRequest(message) | Self::Conflict(message) => message.clone(),
            Self::Internal => "Internal server error".to_string(),
        }
    }
}

impl From<ItemError> for ApiError {
    fn from(value: ItemError) -> Self {
        match value {
            ItemError::NotFound(_) => Self::NotFound,
            ItemError::Validation(err) => Self::BadRequest(err.to_string()),
            err @ ItemError::IdSpaceExhausted => Self::Conflict(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorBody {
                detail: self.detail(),
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<(StatusCode, Json<T>), ApiError>;

/// `GET /health`
///
/// # HTTP contract
/// - Always 200; reports database connectivity and the preferred storage mode.
pub async fn handle_health(
    Extension(facade): Extension<Arc<ItemFacade>>,
) -> ApiResult<HealthReport> {
    let report = run_blocking(facade, |facade| facade.health()).await?;
    Ok((StatusCode::OK, Json(report)))
}

/// `GET /items`
///
/// # HTTP contract
/// - Always 200 with items in ascending id order.
pub async fn handle_list_items(
    Extension(facade): Extension<Arc<ItemFacade>>,
) -> ApiResult<Vec<Item>> {
    let items = run_blocking(facade, |facade| facade.list()).await?;
    Ok((StatusCode::OK, Json(items)))
}

/// `GET /items/{id}`
///
/// # HTTP contract
/// - 200 with the item, 404 when absent, 400 when `id` is not an integer.
pub async fn handle_get_item(
    Extension(facade): Extension<Arc<ItemFacade>>,
    Path(id): Path<String>,
) -> ApiResult<Item> {
    let id = parse_item_id(&id)?;
    let item = run_blocking(facade, move |facade| facade.get(id)).await??;
    Ok((StatusCode::OK, Json(item)))
}

/// `POST /items`
///
/// # HTTP contract
/// - 201 with the created item.
/// - 400 when the body is not JSON or `name` is missing or blank.
/// - 409 when the in-memory store has run out of ids.
pub async fn handle_create_item(
    Extension(facade): Extension<Arc<ItemFacade>>,
    payload: Result<Json<CreateItemRequest>, JsonRejection>,
) -> ApiResult<Item> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("event=http_request module=api status=rejected op=create error={rejection}");
        ApiError::BadRequest(rejection.body_text())
    })?;

    let name = request.name.unwrap_or_default();
    let description = request.description;
    let item = run_blocking(facade, move |facade| facade.create(name, description)).await??;
    Ok((StatusCode::CREATED, Json(item)))
}

/// `DELETE /items/{id}`
///
/// # HTTP contract
/// - 200 with `{message, id}`, 404 when absent, 400 when `id` is not an integer.
pub async fn handle_delete_item(
    Extension(facade): Extension<Arc<ItemFacade>>,
    Path(id): Path<String>,
) -> ApiResult<DeleteItemResponse> {
    let id = parse_item_id(&id)?;
    let id = run_blocking(facade, move |facade| facade.delete(id)).await??;
    Ok((
        StatusCode::OK,
        Json(DeleteItemResponse {
            message: "Item deleted".to_string(),
            id,
        }),
    ))
}

fn parse_item_id(raw: &str) -> Result<ItemId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid item id `{raw}`")))
}

async fn run_blocking<T, F>(facade: Arc<ItemFacade>, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&ItemFacade) -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&facade))
        .await
        .map_err(|err| {
            error!("event=http_request module=api status=error error={err}");
            ApiError::Internal
        })
}
