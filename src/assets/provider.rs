use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::assets::cache::{CacheKey, RasterCache};
use crate::assets::decode::decode_image;
use crate::foundation::error::{MorphError, MorphResult};
use crate::foundation::math::Fnv1a64;
use crate::render::surface::Raster;

/// Where an image's pixels come from.
#[derive(Clone, Debug, PartialEq)]
pub enum RasterSource {
    /// Encoded image file, relative to the provider root unless absolute.
    Path(PathBuf),
    /// Encoded image bytes.
    Bytes(Arc<Vec<u8>>),
    /// An already decoded raster.
    Raster(Raster),
}

impl RasterSource {
    pub fn path(p: impl Into<PathBuf>) -> Self {
        Self::Path(p.into())
    }

    /// Identity used for caching; decoded rasters are not cached.
    pub fn cache_key(&self) -> Option<CacheKey> {
        let mut h = Fnv1a64::new_default();
        match self {
            Self::Path(p) => {
                h.write_u8(b'p');
                h.write_bytes(p.to_string_lossy().as_bytes());
            }
            Self::Bytes(b) => {
                h.write_u8(b'b');
                h.write_bytes(b);
            }
            Self::Raster(_) => return None,
        }
        Some(CacheKey(h.finish()))
    }

    /// Short human-readable description, used in events and project export.
    pub fn describe(&self) -> String {
        match self {
            Self::Path(p) => p.display().to_string(),
            Self::Bytes(b) => format!("<{} bytes>", b.len()),
            Self::Raster(r) => format!("<raster {}x{}>", r.width(), r.height()),
        }
    }
}

/// Resolves a [`RasterSource`] into decoded pixels.
///
/// Failures are returned as [`MorphError::Load`]; the composition reports them as events
/// rather than failing the registration.
pub trait RasterProvider {
    fn load(&mut self, source: &RasterSource) -> MorphResult<Raster>;
}

/// Filesystem-backed provider with an owned [`RasterCache`].
#[derive(Clone, Debug)]
pub struct FsRasterProvider {
    root: PathBuf,
    cache: RasterCache,
}

impl FsRasterProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_cache(root, RasterCache::default())
    }

    pub fn with_cache(root: impl Into<PathBuf>, cache: RasterCache) -> Self {
        Self {
            root: root.into(),
            cache,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache(&self) -> &RasterCache {
        &self.cache
    }

    fn decode_uncached(&self, source: &RasterSource) -> MorphResult<Raster> {
        match source {
            RasterSource::Path(p) => {
                let path = self.root.join(p);
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("read image '{}'", path.display()))?;
                decode_image(&bytes)
            }
            RasterSource::Bytes(b) => decode_image(b),
            RasterSource::Raster(r) => Ok(r.clone()),
        }
    }
}

impl RasterProvider for FsRasterProvider {
    fn load(&mut self, source: &RasterSource) -> MorphResult<Raster> {
        let key = source.cache_key();
        if let Some(key) = key
            && let Some(hit) = self.cache.get(key)
        {
            return Ok(hit);
        }
        let raster = self
            .decode_uncached(source)
            .map_err(|e| MorphError::load(format!("{}: {e:#}", source.describe())))?;
        if let Some(key) = key {
            self.cache.insert(key, raster.clone());
        }
        Ok(raster)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/provider.rs"]
mod tests;
