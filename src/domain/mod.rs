//! Domain layer containing business entities and logic.
//!
//! Independent of infrastructure and presentation concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Core data structures
//! - [`validation`] - Ordered link-set validation rules
//! - [`reconcile`] - Batch apply algorithm over a unit of work
//! - [`repositories`] - Data access trait definitions
//!
//! # Reconciliation Flow
//!
//! 1. Client validates its entries ([`validation::validate_for_submit`])
//! 2. Server re-validates ([`validation::validate_entries`]) into a [`reconcile::LinkChangeSet`]
//! 3. [`repositories::LinkRepository::reconcile`] runs [`reconcile::apply_changes`] atomically
//! 4. The canonical list goes back to the client

pub mod entities;
pub mod reconcile;
pub mod repositories;
pub mod validation;
