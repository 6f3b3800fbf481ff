//! Core domain entities representing the link data model.
//!
//! # Entity Types
//!
//! - [`LinkRecord`] - A persisted link owned by one user
//! - [`LinkEntry`] - An editable row, persisted or not
//! - [`LinkPatch`] - Partial update of a persisted link
//! - [`Platform`] - The closed set of supported platforms

pub mod link;
pub mod platform;

pub use link::{LinkEntry, LinkPatch, LinkRecord};
pub use platform::{Platform, UnknownPlatform};
