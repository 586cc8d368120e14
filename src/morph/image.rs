use crate::assets::provider::RasterSource;
use crate::foundation::core::{Canvas, ImageId, Point, Vec2};
use crate::mesh::model::Mesh;
use crate::render::surface::Raster;

/// One morph source: a raster bound to its mesh, placed on the canvas with a weight.
///
/// The raster is `None` while unresolved or after a failed load; such an image keeps its
/// mesh (correspondence still holds) but contributes nothing to geometry or pixels.
#[derive(Clone, Debug)]
pub struct MorphImage {
    id: ImageId,
    source: Option<RasterSource>,
    raster: Option<Raster>,
    mesh: Mesh,
    offset: Vec2,
    weight: f64,
}

impl MorphImage {
    pub fn new(id: ImageId, raster: Option<Raster>, mesh: Mesh) -> Self {
        Self {
            id,
            source: None,
            raster,
            mesh,
            offset: Vec2::ZERO,
            weight: 0.0,
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_source(mut self, source: RasterSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn source(&self) -> Option<&RasterSource> {
        self.source.as_ref()
    }

    pub fn raster(&self) -> Option<&Raster> {
        self.raster.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.raster.is_some()
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub(crate) fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    /// Current weight, as last applied by `set` or an animation tick.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub(crate) fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub(crate) fn set_raster(&mut self, raster: Option<Raster>) {
        self.raster = raster;
    }

    pub fn size(&self) -> Option<Vec2> {
        self.raster.as_ref().map(Raster::size)
    }

    /// Mesh-space position relative to the canvas center: `offset + p - size / 2`.
    ///
    /// This is the quantity that blended geometry sums over images.
    pub fn centered_point(&self, idx: usize) -> Option<Vec2> {
        let size = self.size()?;
        let p = self.mesh.point(idx)?.pos;
        Some(self.offset + p.to_vec2() - size / 2.0)
    }

    /// Where point `idx` lands on the canvas when this image is drawn on its own.
    pub fn point_on_canvas(&self, idx: usize, canvas: Canvas) -> Option<Point> {
        Some(canvas.center() + self.centered_point(idx)?)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/morph/image.rs"]
mod tests;
