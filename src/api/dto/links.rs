//! DTOs for link reconciliation and listing.
//!
//! Field names follow the wire format (`userID`, `linksToRemove`, `_id`,
//! `link`). The same types are used by the client gateways.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

use crate::domain::entities::{LinkEntry, LinkRecord, Platform};
use crate::domain::validation::ValidationError;

/// Characters accepted in an owner identifier. Empty is accepted here and
/// rejected by the service with a dedicated message.
static USER_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.@:|-]*$").unwrap());

/// One reconciliation batch for a single owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ReconcileRequest {
    #[serde(rename = "userID")]
    #[validate(length(max = 128), regex(path = "*USER_ID_REGEX"))]
    pub user_id: String,

    #[serde(default)]
    #[validate(length(max = 64))]
    pub links: Vec<LinkPayload>,

    #[serde(rename = "linksToRemove", default)]
    #[validate(length(max = 256))]
    pub links_to_remove: Vec<String>,
}

impl ReconcileRequest {
    /// Converts the wire entries into domain entries.
    ///
    /// Missing fields are looked for across every entry before any platform
    /// name is parsed, so the first broken rule is reported, not the first
    /// broken entry. URL syntax is left to the domain rules.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::MissingField`] for the first entry lacking a platform or link
    /// - [`ValidationError::UnsupportedPlatform`] for the first entry naming a
    ///   platform outside the catalogue
    pub fn entries(&self) -> Result<Vec<LinkEntry>, ValidationError> {
        if let Some(index) = self.links.iter().position(LinkPayload::is_incomplete) {
            return Err(ValidationError::MissingField { index });
        }

        self.links
            .iter()
            .enumerate()
            .map(|(index, payload)| payload.to_entry(index))
            .collect()
    }
}

/// A link as sent by the client.
///
/// Every field is optional on the wire so that a missing platform or link
/// reaches the validation rules instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPayload {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub platform: Option<String>,

    #[serde(default)]
    pub link: Option<String>,
}

impl LinkPayload {
    fn is_incomplete(&self) -> bool {
        is_blank(self.platform.as_deref()) || is_blank(self.link.as_deref())
    }

    fn to_entry(&self, index: usize) -> Result<LinkEntry, ValidationError> {
        let platform = match self.platform.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(name) => Some(name.parse::<Platform>().map_err(|_| {
                ValidationError::UnsupportedPlatform {
                    index,
                    platform: name.to_string(),
                }
            })?),
        };

        Ok(LinkEntry {
            id: self.id.clone().filter(|id| !id.is_empty()),
            platform,
            url: self.link.clone().unwrap_or_default(),
        })
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

impl From<&LinkEntry> for LinkPayload {
    fn from(entry: &LinkEntry) -> Self {
        Self {
            id: entry.id.clone(),
            platform: entry.platform.map(|p| p.as_str().to_string()),
            link: Some(entry.url.clone()),
        }
    }
}

/// A canonical link as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub platform: Platform,
    pub link: String,
}

impl From<LinkRecord> for LinkResponse {
    fn from(record: LinkRecord) -> Self {
        Self {
            id: record.id,
            platform: record.platform,
            link: record.url,
        }
    }
}

impl From<LinkResponse> for LinkEntry {
    fn from(response: LinkResponse) -> Self {
        Self {
            id: Some(response.id),
            platform: Some(response.platform),
            url: response.link,
        }
    }
}
