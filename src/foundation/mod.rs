//! Shared primitives: geometry re-exports, identifiers, errors, and fixed-point helpers.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod math;
