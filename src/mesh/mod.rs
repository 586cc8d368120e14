//! Triangulated point meshes: topology, per-triangle geometry, and edge splitting.

pub(crate) mod model;
pub(crate) mod triangle;
