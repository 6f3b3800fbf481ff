//! Validation rules for link sets.
//!
//! Rules run in a fixed order, each across the whole set, and the first
//! failure wins:
//!
//! 1. every entry has a platform and a non-empty url
//! 2. every url is an absolute `http`/`https` URL with a host
//! 3. no two entries share a platform
//!
//! Clients run all three before sending anything. The server re-runs 1 and 2
//! and relies on the `(owner, platform)` upsert key for 3. On the wire,
//! platform names are checked against the catalogue between rules 1 and 2
//! (see `ReconcileRequest::entries`).

use std::collections::HashSet;

use url::Url;

use crate::domain::entities::{LinkEntry, Platform};
use crate::domain::reconcile::LinkUpsert;

/// A link set that must not be sent to (or accepted by) the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Platform and link are required.")]
    MissingField { index: usize },

    #[error("Invalid URL: {url}")]
    InvalidUrl { index: usize, url: String },

    #[error("Each platform can only be used once.")]
    DuplicatePlatform { platform: Platform },

    #[error("Unsupported platform: {platform}")]
    UnsupportedPlatform { index: usize, platform: String },

    #[error("User ID is required.")]
    MissingOwner,
}

impl ValidationError {
    /// Position of the offending entry, when the error concerns one entry.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::MissingField { index }
            | Self::InvalidUrl { index, .. }
            | Self::UnsupportedPlatform { index, .. } => Some(*index),
            Self::DuplicatePlatform { .. } | Self::MissingOwner => None,
        }
    }
}

/// Returns true if `input` is an absolute HTTP(S) URL with a host.
pub fn is_valid_url(input: &str) -> bool {
    match Url::parse(input) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// Rejects an empty owner identifier.
pub fn validate_owner(owner_id: &str) -> Result<(), ValidationError> {
    if owner_id.trim().is_empty() {
        return Err(ValidationError::MissingOwner);
    }
    Ok(())
}

/// Applies rules 1 and 2 and returns the entries as upserts.
///
/// # Errors
///
/// - [`ValidationError::MissingField`] for the first entry lacking a platform or url
/// - [`ValidationError::InvalidUrl`] for the first entry with a malformed url
pub fn validate_entries(entries: &[LinkEntry]) -> Result<Vec<LinkUpsert>, ValidationError> {
    if let Some(index) = entries
        .iter()
        .position(|e| e.platform.is_none() || e.url.trim().is_empty())
    {
        return Err(ValidationError::MissingField { index });
    }

    if let Some((index, entry)) = entries
        .iter()
        .enumerate()
        .find(|(_, e)| !is_valid_url(&e.url))
    {
        return Err(ValidationError::InvalidUrl {
            index,
            url: entry.url.clone(),
        });
    }

    Ok(entries
        .iter()
        .filter_map(|e| {
            e.platform.map(|platform| LinkUpsert {
                id: e.id.clone(),
                platform,
                url: e.url.clone(),
            })
        })
        .collect())
}

/// Applies rule 3.
///
/// # Errors
///
/// Returns [`ValidationError::DuplicatePlatform`] naming the first repeated platform.
pub fn ensure_unique_platforms(entries: &[LinkEntry]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();

    for platform in entries.iter().filter_map(|e| e.platform) {
        if !seen.insert(platform) {
            return Err(ValidationError::DuplicatePlatform { platform });
        }
    }

    Ok(())
}

/// Applies all three rules, in order.
pub fn validate_for_submit(entries: &[LinkEntry]) -> Result<Vec<LinkUpsert>, ValidationError> {
    let upserts = validate_entries(entries)?;
    ensure_unique_platforms(entries)?;
    Ok(upserts)
}
