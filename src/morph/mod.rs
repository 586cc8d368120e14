//! Morph sources and the composition that owns them.

/// The composition facade: images, shared mesh edits, weights, animation, output.
pub mod composition;
/// A morph source: raster, mesh, placement, and weight.
pub mod image;
