//! Pixel side of the morph: surfaces, per-triangle warping, blending, and the frame engine.

/// Per-pixel blend strategies used to accumulate warped images.
pub mod blend;
/// The per-frame warp-and-blend engine.
pub mod engine;
/// Raster, working buffer, and output frame types.
pub mod surface;
/// Blended mesh geometry and per-image triangle warping.
pub mod warp;
