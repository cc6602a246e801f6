//! # flowtutor-core
//!
//! Core types and invariant checks for the flowtutor AI graph-mutation and
//! comment-clustering service.
//!
//! This crate provides the plain data model exchanged with the editor
//! (graphs, cluster items, themes), the error taxonomy shared by every
//! crate, the canonicalizer used for cache keys, and the postcondition
//! validators applied to model output.

pub mod canonical;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod validation;

// Re-export commonly used types at crate root
pub use canonical::{cache_key, canonicalize_cluster_request, canonicalize_graph};
pub use error::{Error, Result};
pub use models::*;
pub use validation::{
    advisory_theme_range, validate_clustering, validate_mutation, ClusterReport,
    MutationReport, ThemeAssignment, ValidationWarning,
};
