//! API route configuration.

use crate::api::handlers::{list_links_handler, reconcile_links_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Link routes, mounted under `/api`.
///
/// # Endpoints
///
/// - `POST /links/new`        - Apply a reconciliation batch
/// - `GET  /links/{user_id}`  - Canonical link list of an owner
pub fn link_routes() -> Router<AppState> {
    Router::new()
        .route("/links/new", post(reconcile_links_handler))
        .route("/links/{user_id}", get(list_links_handler))
}
