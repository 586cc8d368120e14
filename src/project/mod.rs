//! Serialized morph projects.

/// Project record, validation, and JSON helpers.
pub mod model;
