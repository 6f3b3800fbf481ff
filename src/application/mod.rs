//! Application layer services implementing business logic.
//!
//! Services consume repository traits and provide a clean API for HTTP
//! handlers, the admin CLI and the in-process client gateway.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Link batch reconciliation and retrieval

pub mod services;
