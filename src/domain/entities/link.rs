//! Link entities: persisted records, editable entries and partial updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::platform::Platform;

/// A persisted profile link owned by exactly one user.
///
/// Identity for addressing is `id`; identity for uniqueness is
/// `(owner_id, platform)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub id: String,
    pub owner_id: String,
    pub platform: Platform,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LinkRecord {
    /// Creates a new LinkRecord instance.
    pub fn new(
        id: String,
        owner_id: String,
        platform: Platform,
        url: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            platform,
            url,
            created_at,
            updated_at,
        }
    }

    /// Returns true if `owner_id` owns this record.
    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }
}

/// An editable link row.
///
/// `id` is `None` until the entry has been persisted. `platform` is `None`
/// while the user has not picked one yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkEntry {
    pub id: Option<String>,
    pub platform: Option<Platform>,
    pub url: String,
}

impl LinkEntry {
    /// A row with no platform and an empty url.
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn new(platform: Platform, url: impl Into<String>) -> Self {
        Self {
            id: None,
            platform: Some(platform),
            url: url.into(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

impl From<LinkRecord> for LinkEntry {
    fn from(record: LinkRecord) -> Self {
        Self {
            id: Some(record.id),
            platform: Some(record.platform),
            url: record.url,
        }
    }
}

/// Partial update for an existing link.
///
/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPatch {
    pub platform: Option<Platform>,
    pub url: Option<String>,
}

impl LinkPatch {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            platform: None,
            url: Some(url.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.platform.is_none() && self.url.is_none()
    }

    /// Applies the present fields to `record`.
    ///
    /// Returns `true` if any stored value changed.
    pub fn apply_to(&self, record: &mut LinkRecord) -> bool {
        let mut changed = false;

        if let Some(platform) = self.platform
            && platform != record.platform
        {
            record.platform = platform;
            changed = true;
        }

        if let Some(url) = &self.url
            && *url != record.url
        {
            record.url = url.clone();
            changed = true;
        }

        changed
    }
}
