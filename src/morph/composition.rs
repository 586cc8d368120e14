use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::animation::driver::{AnimState, Animator, Tick};
use crate::animation::ease::Easing;
use crate::assets::provider::{FsRasterProvider, RasterProvider, RasterSource};
use crate::events::{EventBus, ListenerId, MorphEvent};
use crate::foundation::core::{Canvas, ImageId, Point, Vec2};
use crate::foundation::error::{MorphError, MorphResult};
use crate::mesh::model::Mesh;
use crate::morph::image::MorphImage;
use crate::project::model::{Project, ProjectImage, ProjectPoint};
use crate::render::blend::BlendMode;
use crate::render::engine::{EngineSettings, FinalTouch, FrameStats, WarpEngine};
use crate::render::surface::{Frame, OutputSurface};

/// Registration request for [`Composition::add_image`].
#[derive(Clone, Debug)]
pub struct ImageSpec {
    pub source: RasterSource,
    pub offset: Vec2,
    /// Mesh points in the image's pixel frame. `None` copies the first image's points.
    pub points: Option<Vec<Point>>,
}

impl ImageSpec {
    pub fn new(source: RasterSource) -> Self {
        Self {
            source,
            offset: Vec2::ZERO,
            points: None,
        }
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        self.points = Some(points);
        self
    }
}

/// A set of morph images sharing one triangle topology, their weights, and the machinery
/// that turns weights into frames.
///
/// Mesh edits made through the composition are applied to every image in lockstep, so
/// point index `i` keeps naming the same landmark everywhere. Not thread-safe: calls must
/// be serialized by the owner.
pub struct Composition {
    images: Vec<MorphImage>,
    engine: WarpEngine,
    animator: Animator,
    events: EventBus,
    provider: Box<dyn RasterProvider>,
    surface: Option<Box<dyn OutputSurface>>,
    last_frame: Option<Frame>,
    next_image_id: u64,
}

impl std::fmt::Debug for Composition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composition")
            .field("images", &self.images)
            .field("engine", &self.engine)
            .field("animator", &self.animator)
            .field("events", &self.events)
            .field("surface_attached", &self.surface.is_some())
            .finish()
    }
}

impl Composition {
    /// Empty composition resolving file sources relative to the working directory.
    pub fn new(canvas: Canvas, settings: EngineSettings) -> MorphResult<Self> {
        Self::with_provider(canvas, settings, FsRasterProvider::new(PathBuf::from(".")))
    }

    pub fn with_provider(
        canvas: Canvas,
        settings: EngineSettings,
        provider: impl RasterProvider + 'static,
    ) -> MorphResult<Self> {
        Ok(Self {
            images: Vec::new(),
            engine: WarpEngine::new(canvas, settings)?,
            animator: Animator::default(),
            events: EventBus::new(),
            provider: Box::new(provider),
            surface: None,
            last_frame: None,
            next_image_id: 0,
        })
    }

    /// Build a composition from a project record. See [`Composition::load_project`].
    pub fn from_project(
        canvas: Canvas,
        settings: EngineSettings,
        provider: impl RasterProvider + 'static,
        project: &Project,
    ) -> MorphResult<Self> {
        let mut comp = Self::with_provider(canvas, settings, provider)?;
        comp.load_project(project)?;
        Ok(comp)
    }

    // --- observation -----------------------------------------------------------------

    pub fn canvas(&self) -> Canvas {
        self.engine.canvas()
    }

    pub fn images(&self) -> &[MorphImage] {
        &self.images
    }

    pub fn image(&self, id: ImageId) -> Option<&MorphImage> {
        self.images.iter().find(|img| img.id() == id)
    }

    pub fn image_index(&self, id: ImageId) -> Option<usize> {
        self.images.iter().position(|img| img.id() == id)
    }

    pub fn point_count(&self) -> usize {
        self.images.first().map_or(0, |img| img.mesh().point_count())
    }

    pub fn triangle_count(&self) -> usize {
        self.images.first().map_or(0, |img| img.mesh().triangle_count())
    }

    pub fn weights(&self) -> &[f64] {
        self.animator.weights()
    }

    pub fn state(&self) -> AnimState {
        self.animator.state()
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    pub fn last_stats(&self) -> FrameStats {
        self.engine.last_stats()
    }

    // --- configuration ---------------------------------------------------------------

    pub fn on(&mut self, listener: impl FnMut(&MorphEvent) + 'static) -> ListenerId {
        self.events.subscribe(listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn set_provider(&mut self, provider: impl RasterProvider + 'static) {
        self.provider = Box::new(provider);
    }

    pub fn set_blend_mode(&mut self, blend: BlendMode) {
        self.engine.set_blend_mode(blend);
    }

    pub fn set_final_touch(&mut self, final_touch: Option<FinalTouch>) {
        self.engine.set_final_touch(final_touch);
    }

    pub fn resize(&mut self, canvas: Canvas) {
        self.engine.resize(canvas);
    }

    /// Route presented frames to `surface`, returning the previously attached one.
    pub fn attach(
        &mut self,
        surface: impl OutputSurface + 'static,
    ) -> Option<Box<dyn OutputSurface>> {
        self.surface.replace(Box::new(surface))
    }

    pub fn detach(&mut self) -> Option<Box<dyn OutputSurface>> {
        self.surface.take()
    }

    // --- images ----------------------------------------------------------------------

    /// Register an image and resolve its raster.
    ///
    /// A load failure is reported as [`MorphEvent::LoadError`], not returned: the image stays
    /// registered and contributes nothing until it has pixels. Mismatched point counts are
    /// returned as a topology error and register nothing.
    pub fn add_image(&mut self, request: ImageSpec) -> MorphResult<ImageId> {
        let mesh = self.mesh_for_new_image(request.points.as_deref())?;
        let id = ImageId(self.next_image_id);
        self.next_image_id += 1;

        let image = MorphImage::new(id, None, mesh)
            .with_offset(request.offset)
            .with_source(request.source);
        self.images.push(image);
        self.animator.push_weight(0.0);
        let index = self.images.len() - 1;
        self.events.emit(&MorphEvent::ImageAdd { image: id, index });
        self.resolve_raster(index);
        Ok(id)
    }

    /// Retry resolving the raster of an image whose load failed.
    pub fn reload_image(&mut self, id: ImageId) -> MorphResult<bool> {
        let index = self
            .image_index(id)
            .ok_or_else(|| MorphError::validation(format!("unknown image {id:?}")))?;
        Ok(self.resolve_raster(index))
    }

    pub fn remove_image(&mut self, id: ImageId) -> bool {
        let Some(index) = self.image_index(id) else {
            return false;
        };
        self.images.remove(index);
        self.animator.remove_weight(index);
        self.events.emit(&MorphEvent::ImageRemove { image: id, index });
        true
    }

    pub fn set_image_offset(&mut self, id: ImageId, offset: Vec2) -> MorphResult<()> {
        let index = self
            .image_index(id)
            .ok_or_else(|| MorphError::validation(format!("unknown image {id:?}")))?;
        self.images[index].set_offset(offset);
        self.events.emit(&MorphEvent::ImageMove { image: id });
        Ok(())
    }

    fn mesh_for_new_image(&self, points: Option<&[Point]>) -> MorphResult<Mesh> {
        let Some(template) = self.images.first().map(MorphImage::mesh) else {
            return Mesh::from_parts(points.unwrap_or_default(), &[]);
        };
        match points {
            None => Ok(template.clone()),
            Some(points) => {
                if points.len() != template.point_count() {
                    return Err(MorphError::topology(format!(
                        "new image has {} points, registered images have {}",
                        points.len(),
                        template.point_count()
                    )));
                }
                Mesh::from_parts(points, &template.triangle_indices())
            }
        }
    }

    fn resolve_raster(&mut self, index: usize) -> bool {
        let img = &mut self.images[index];
        let Some(source) = img.source().cloned() else {
            return img.is_loaded();
        };
        let id = img.id();
        match self.provider.load(&source) {
            Ok(raster) => {
                img.set_raster(Some(raster));
                self.events.emit(&MorphEvent::Load { image: id });
                true
            }
            Err(e) => {
                img.set_raster(None);
                tracing::warn!(image = ?id, source = %source.describe(), "raster load failed: {e}");
                self.events.emit(&MorphEvent::LoadError {
                    image: id,
                    message: e.to_string(),
                });
                false
            }
        }
    }

    // --- mesh edits (applied to every image) -------------------------------------------

    /// Add a point at the same local position in every image. Returns its index.
    pub fn add_point(&mut self, pos: Point) -> MorphResult<usize> {
        let positions = vec![pos; self.images.len()];
        self.add_point_per_image(&positions)
    }

    /// Add a point with one position per image, in image order. Returns its index.
    pub fn add_point_per_image(&mut self, positions: &[Point]) -> MorphResult<usize> {
        if self.images.is_empty() {
            return Err(MorphError::validation("add_point requires a registered image"));
        }
        if positions.len() != self.images.len() {
            return Err(MorphError::validation(format!(
                "got {} positions for {} images",
                positions.len(),
                self.images.len()
            )));
        }
        let mut index = 0;
        for (img, &pos) in self.images.iter_mut().zip(positions) {
            index = img.mesh_mut().add_point(pos);
        }
        self.events.emit(&MorphEvent::PointAdd { index });
        Ok(index)
    }

    /// Move point `index` of one image.
    pub fn move_point(&mut self, image: ImageId, index: usize, pos: Point) -> MorphResult<()> {
        let k = self
            .image_index(image)
            .ok_or_else(|| MorphError::validation(format!("unknown image {image:?}")))?;
        self.images[k].mesh_mut().move_point(index, pos)?;
        self.events.emit(&MorphEvent::PointMove { image, index });
        Ok(())
    }

    /// Remove point `index` everywhere, cascading to its triangles.
    ///
    /// Returns the number of triangles removed per mesh, or `None` when absent.
    pub fn remove_point(&mut self, index: usize) -> Option<usize> {
        if index >= self.point_count() {
            return None;
        }
        let mut removed = 0;
        for img in &mut self.images {
            removed = img.mesh_mut().remove_point(index).unwrap_or(0);
        }
        self.events.emit(&MorphEvent::PointRemove {
            index,
            triangles_removed: removed,
        });
        Some(removed)
    }

    pub fn add_triangle(&mut self, i: usize, j: usize, k: usize) -> MorphResult<usize> {
        let Some(first) = self.images.first() else {
            return Err(MorphError::validation(
                "add_triangle requires a registered image",
            ));
        };
        // Dry run on a copy so a failure leaves every mesh untouched.
        first.mesh().clone().add_triangle(i, j, k)?;
        let mut index = 0;
        for img in &mut self.images {
            index = img.mesh_mut().add_triangle(i, j, k)?;
        }
        self.events.emit(&MorphEvent::TriangleAdd { index });
        Ok(index)
    }

    pub fn remove_triangle(&mut self, index: usize) -> bool {
        if index >= self.triangle_count() {
            return false;
        }
        for img in &mut self.images {
            img.mesh_mut().remove_triangle(index);
        }
        self.events.emit(&MorphEvent::TriangleRemove { index });
        true
    }

    /// Split edge `(a, b)` in every image at that image's own midpoint.
    ///
    /// No-op (`None`) unless the split applies in every mesh, so correspondence holds.
    pub fn split_edge(&mut self, a: usize, b: usize) -> Option<usize> {
        if self.images.is_empty() || !self.images.iter().all(|img| img.mesh().can_split(a, b)) {
            return None;
        }
        let mut point = None;
        for img in &mut self.images {
            point = img.mesh_mut().split_edge(a, b);
        }
        let point = point?;
        self.events.emit(&MorphEvent::EdgeSplit { a, b, point });
        Some(point)
    }

    // --- weights, animation, output --------------------------------------------------------

    /// Apply `weights` now and render one frame. Cancels a running tween.
    ///
    /// Nothing changes unless the frame is rendered and presented: on error the previous
    /// weights, tween, and last frame are kept and no event is emitted.
    pub fn set(&mut self, weights: &[f64]) -> MorphResult<()> {
        let mut next = self.animator.clone();
        let cancelled = next.set(weights)?;
        let frame = self.compose(next.weights())?;

        self.animator = next;
        self.sync_weights();
        if cancelled {
            self.events.emit(&MorphEvent::Cancel);
        }
        self.events.emit(&MorphEvent::Change);
        self.commit_frame(frame);
        Ok(())
    }

    /// Tween toward `target` over `duration`, starting at `now`. Frames are produced by
    /// [`Composition::tick_at`].
    pub fn animate_at(
        &mut self,
        target: &[f64],
        duration: Duration,
        easing: Option<Easing>,
        now: Instant,
    ) -> MorphResult<()> {
        let cancelled =
            self.animator
                .animate_at(target, duration, easing.unwrap_or_default(), now)?;
        if cancelled {
            self.sync_weights();
            self.events.emit(&MorphEvent::Cancel);
        }
        self.events.emit(&MorphEvent::Start);
        Ok(())
    }

    pub fn animate(
        &mut self,
        target: &[f64],
        duration: Duration,
        easing: Option<Easing>,
    ) -> MorphResult<()> {
        self.animate_at(target, duration, easing, Instant::now())
    }

    /// Advance a running tween to `now` and render the resulting frame.
    ///
    /// A failed render or present leaves the tween where it was, so a later tick retries it.
    pub fn tick_at(&mut self, now: Instant) -> MorphResult<Tick> {
        if !self.animator.is_running() {
            return Ok(Tick::Idle);
        }
        let mut next = self.animator.clone();
        let tick = next.tick_at(now);
        let frame = self.compose(next.weights())?;

        self.animator = next;
        self.sync_weights();
        self.events.emit(&MorphEvent::Change);
        self.commit_frame(frame);
        match tick {
            Tick::Idle => {}
            Tick::Progress { t } => self.events.emit(&MorphEvent::Progress { t }),
            Tick::Complete => self.events.emit(&MorphEvent::Complete),
        }
        Ok(tick)
    }

    pub fn tick(&mut self) -> MorphResult<Tick> {
        self.tick_at(Instant::now())
    }

    /// Stop a running tween at its last sampled weights.
    pub fn cancel(&mut self) -> bool {
        let cancelled = self.animator.cancel();
        if cancelled {
            self.events.emit(&MorphEvent::Cancel);
        }
        cancelled
    }

    /// Composite the current weights and present the frame.
    pub fn draw(&mut self) -> MorphResult<&Frame> {
        let weights = self.animator.weights().to_vec();
        let frame = self.compose(&weights)?;
        Ok(self.commit_frame(frame))
    }

    // Render and present without touching composition state.
    fn compose(&mut self, weights: &[f64]) -> MorphResult<Frame> {
        let frame = self.engine.render(&self.images, weights)?;
        if let Some(surface) = &mut self.surface {
            surface.present(&frame)?;
        }
        Ok(frame)
    }

    fn commit_frame(&mut self, frame: Frame) -> &Frame {
        self.events.emit(&MorphEvent::Draw);
        self.last_frame.insert(frame)
    }

    /// Tear down: stop animation, drop images and surface, notify, and release listeners.
    pub fn dispose(mut self) {
        if self.animator.cancel() {
            self.events.emit(&MorphEvent::Cancel);
        }
        self.images.clear();
        self.surface = None;
        self.last_frame = None;
        self.events.emit(&MorphEvent::Dispose);
        self.events.clear();
    }

    fn sync_weights(&mut self) {
        for (img, &w) in self.images.iter_mut().zip(self.animator.weights()) {
            img.set_weight(w);
        }
    }

    // --- projects --------------------------------------------------------------------

    /// Replace all images with those of `project`.
    ///
    /// The project is validated before anything changes; on error the composition is left
    /// exactly as it was. Afterwards the first image has weight 1 and the rest 0.
    #[tracing::instrument(skip(self, project), fields(images = project.images.len()))]
    pub fn load_project(&mut self, project: &Project) -> MorphResult<()> {
        project.validate()?;

        let mut meshes = Vec::with_capacity(project.images.len());
        for img in &project.images {
            let points: Vec<Point> = img.points.iter().map(|p| Point::new(p.x, p.y)).collect();
            meshes.push(Mesh::from_parts(&points, &project.triangles)?);
        }

        if self.animator.cancel() {
            self.events.emit(&MorphEvent::Cancel);
        }
        while let Some(img) = self.images.last() {
            let id = img.id();
            self.remove_image(id);
        }

        for (img, mesh) in project.images.iter().zip(meshes) {
            let id = ImageId(self.next_image_id);
            self.next_image_id += 1;
            let image = MorphImage::new(id, None, mesh)
                .with_offset(Vec2::new(img.x, img.y))
                .with_source(RasterSource::path(&img.src));
            self.images.push(image);
            self.animator.push_weight(0.0);
            let index = self.images.len() - 1;
            self.events.emit(&MorphEvent::ImageAdd { image: id, index });
            self.resolve_raster(index);
        }

        let mut weights = vec![0.0; self.images.len()];
        if let Some(first) = weights.first_mut() {
            *first = 1.0;
        }
        self.animator.set(&weights)?;
        self.sync_weights();
        tracing::info!(
            points = self.point_count(),
            triangles = self.triangle_count(),
            "project loaded"
        );
        Ok(())
    }

    /// Snapshot the images and shared triangles as a project record.
    ///
    /// Only file sources can be written back; an image registered from bytes or from a
    /// decoded raster makes the export fail with a validation error naming it.
    pub fn to_project(&self) -> MorphResult<Project> {
        let mut images = Vec::with_capacity(self.images.len());
        for img in &self.images {
            let src = match img.source() {
                Some(RasterSource::Path(p)) => p.to_string_lossy().into_owned(),
                other => {
                    return Err(MorphError::validation(format!(
                        "image {:?} has no file source to export ({})",
                        img.id(),
                        other.map_or_else(|| "none".to_owned(), RasterSource::describe)
                    )));
                }
            };
            images.push(ProjectImage {
                src,
                x: img.offset().x,
                y: img.offset().y,
                points: img
                    .mesh()
                    .points()
                    .iter()
                    .map(|p| ProjectPoint {
                        x: p.pos.x,
                        y: p.pos.y,
                    })
                    .collect(),
            });
        }
        let triangles = self
            .images
            .first()
            .map(|img| img.mesh().triangle_indices())
            .unwrap_or_default();
        Ok(Project { images, triangles })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/morph/composition.rs"]
mod tests;
