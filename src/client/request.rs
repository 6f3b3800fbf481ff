//! Builds reconciliation requests from form state.

use crate::api::dto::links::{LinkPayload, ReconcileRequest};
use crate::domain::entities::LinkEntry;
use crate::domain::validation::{self, ValidationError};

/// Validates `entries` and packages them with `removals` into one request.
///
/// All validation rules run here, duplicate platforms included, so a
/// malformed list never leaves the client. Removal identifiers are
/// deduplicated, keeping their first position.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found, in rule order.
pub fn build_request(
    owner_id: &str,
    entries: &[LinkEntry],
    removals: &[String],
) -> Result<ReconcileRequest, ValidationError> {
    validation::validate_owner(owner_id)?;
    let upserts = validation::validate_for_submit(entries)?;

    let links = upserts
        .into_iter()
        .map(|upsert| LinkPayload {
            id: upsert.id,
            platform: Some(upsert.platform.as_str().to_string()),
            link: Some(upsert.url),
        })
        .collect();

    let mut links_to_remove: Vec<String> = Vec::with_capacity(removals.len());
    for id in removals {
        if !id.is_empty() && !links_to_remove.contains(id) {
            links_to_remove.push(id.clone());
        }
    }

    Ok(ReconcileRequest {
        user_id: owner_id.to_string(),
        links,
        links_to_remove,
    })
}
