//! Utility functions shared across layers.
//!
//! - [`id_generator`] - Random link identifiers

pub mod id_generator;
