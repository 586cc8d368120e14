//! Raster resolution: decoding, an owned LRU cache, and the provider seam.

/// Owned raster cache with least-recently-used eviction by entry count.
pub mod cache;
pub(crate) mod decode;
/// Raster sources and the provider trait that resolves them.
pub mod provider;
