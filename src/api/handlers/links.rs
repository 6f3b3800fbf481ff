//! Handlers for link reconciliation and listing.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde_json::Value;
use validator::Validate;

use crate::api::dto::links::{LinkResponse, ReconcileRequest};
use crate::domain::validation;
use crate::error::AppError;
use crate::state::AppState;

/// Applies one reconciliation batch for an owner.
///
/// # Endpoint
///
/// `POST /api/links/new`
///
/// # Request Body
///
/// ```json
/// {
///   "userID": "u1",
///   "links": [
///     { "_id": "65f1c0ffee00000000000001", "platform": "github", "link": "https://github.com/u1" },
///     { "platform": "youtube", "link": "https://youtube.com/@u1" }
///   ],
///   "linksToRemove": ["65f1c0ffee00000000000002"]
/// }
/// ```
///
/// Removals run first and only delete records owned by `userID`; foreign or
/// unknown identifiers are skipped silently. Entries are then upserted in
/// order.
///
/// # Response
///
/// The records touched by the upserts, in request order:
///
/// ```json
/// [
///   { "_id": "65f1c0ffee00000000000001", "platform": "github", "link": "https://github.com/u1" },
///   { "_id": "65f1c0ffee00000000000003", "platform": "youtube", "link": "https://youtube.com/@u1" }
/// ]
/// ```
///
/// # Errors
///
/// - 400 with the first broken rule: missing user, missing platform or link,
///   unsupported platform, invalid URL (e.g. `{ "message": "Platform and link are required." }`)
/// - 503 when the store stays unavailable after retries
/// - 500 `{ "message": "Internal Server Error" }` on unexpected failures
pub async fn reconcile_links_handler(
    State(state): State<AppState>,
    payload: Result<Json<ReconcileRequest>, JsonRejection>,
) -> Result<Json<Vec<LinkResponse>>, AppError> {
    let Json(payload) =
        payload.map_err(|rejection| AppError::bad_request(rejection.body_text(), Value::Null))?;

    payload.validate()?;
    validation::validate_owner(&payload.user_id)?;
    let entries = payload.entries()?;

    let links = state
        .link_service
        .apply(&payload.user_id, entries, payload.links_to_remove)
        .await?;

    Ok(Json(links.into_iter().map(LinkResponse::from).collect()))
}

/// Returns the canonical link list of an owner.
///
/// # Endpoint
///
/// `GET /api/links/{user_id}`
///
/// An owner without links gets an empty array.
pub async fn list_links_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<LinkResponse>>, AppError> {
    let links = state.link_service.list_links(&user_id).await?;

    Ok(Json(links.into_iter().map(LinkResponse::from).collect()))
}
