//! Infrastructure layer for external integrations.
//!
//! Implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`cache`] - Link list caching (Redis and no-op implementations)
//! - [`persistence`] - PostgreSQL and in-memory link repositories

pub mod cache;
pub mod persistence;
