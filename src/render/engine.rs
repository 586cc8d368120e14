use std::sync::Arc;

use rayon::prelude::*;

use crate::foundation::core::Canvas;
use crate::foundation::error::{MorphError, MorphResult};
use crate::morph::image::MorphImage;
use crate::render::blend::{BlendMode, blend_in_place};
use crate::render::surface::{Frame, PixelBuffer, Rgba};
use crate::render::warp::{Sampling, WarpStats, blended_points, warp_image};

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
/// Engine configuration.
pub struct EngineSettings {
    /// Straight RGBA8 the accumulator starts from each frame; transparent when `None`.
    pub clear_rgba: Option<[u8; 4]>,
    /// Source texel filtering.
    pub sampling: Sampling,
    /// Warp images on a rayon pool. Blending stays sequential in image order.
    pub parallel: bool,
    /// Optional explicit worker thread count for `parallel`.
    pub threads: Option<usize>,
}

/// Signature of a full-frame pass run once after all images are blended.
pub type FinalTouchFn = dyn Fn(&mut PixelBuffer) + Send + Sync;

/// Caller-supplied full-frame transform applied after blending.
#[derive(Clone)]
pub struct FinalTouch(Arc<FinalTouchFn>);

impl std::fmt::Debug for FinalTouch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FinalTouch")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

impl FinalTouch {
    pub fn new(func: impl Fn(&mut PixelBuffer) + Send + Sync + 'static) -> Self {
        Self(Arc::new(func))
    }

    /// Alpha below `threshold` becomes fully transparent, anything else fully opaque.
    pub fn alpha_threshold(threshold: f32) -> Self {
        Self::new(move |buf| {
            for px in buf.pixels_mut() {
                if px[3] < threshold {
                    px.fill(0.0);
                } else {
                    px[3] = 1.0;
                }
            }
        })
    }

    pub fn apply(&self, buf: &mut PixelBuffer) {
        (self.0)(buf)
    }
}

/// Counters for the last rendered frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub images_blended: usize,
    pub images_skipped: usize,
    pub triangles_drawn: usize,
    pub triangles_skipped: usize,
}

impl FrameStats {
    fn add_warp(&mut self, warp: WarpStats) {
        self.images_blended += 1;
        self.triangles_drawn += warp.triangles_drawn;
        self.triangles_skipped += warp.triangles_skipped;
    }
}

/// Warp-and-blend compositor.
///
/// Holds no morph state between frames apart from its reusable scratch and accumulator
/// buffers; every call to [`WarpEngine::render`] recomputes geometry from the images.
pub struct WarpEngine {
    canvas: Canvas,
    settings: EngineSettings,
    blend: BlendMode,
    final_touch: Option<FinalTouch>,
    scratch: PixelBuffer,
    accumulator: PixelBuffer,
    pool: Option<rayon::ThreadPool>,
    last_stats: FrameStats,
}

impl std::fmt::Debug for WarpEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarpEngine")
            .field("canvas", &self.canvas)
            .field("settings", &self.settings)
            .field("blend", &self.blend)
            .field("final_touch", &self.final_touch)
            .field("last_stats", &self.last_stats)
            .finish()
    }
}

impl WarpEngine {
    pub fn new(canvas: Canvas, settings: EngineSettings) -> MorphResult<Self> {
        let pool = if settings.parallel {
            Some(build_thread_pool(settings.threads)?)
        } else {
            None
        };
        Ok(Self {
            canvas,
            settings,
            blend: BlendMode::default(),
            final_touch: None,
            scratch: PixelBuffer::new(canvas.width, canvas.height),
            accumulator: PixelBuffer::new(canvas.width, canvas.height),
            pool,
            last_stats: FrameStats::default(),
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn resize(&mut self, canvas: Canvas) {
        if canvas == self.canvas {
            return;
        }
        self.canvas = canvas;
        self.scratch = PixelBuffer::new(canvas.width, canvas.height);
        self.accumulator = PixelBuffer::new(canvas.width, canvas.height);
    }

    pub fn blend_mode(&self) -> &BlendMode {
        &self.blend
    }

    pub fn set_blend_mode(&mut self, blend: BlendMode) {
        self.blend = blend;
    }

    pub fn set_final_touch(&mut self, final_touch: Option<FinalTouch>) {
        self.final_touch = final_touch;
    }

    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Composite one frame for `weights` (one entry per image, in order).
    ///
    /// Images with a non-positive weight, or without a loaded raster, are skipped.
    #[tracing::instrument(skip(self, images, weights), fields(images = images.len()))]
    pub fn render(&mut self, images: &[MorphImage], weights: &[f64]) -> MorphResult<Frame> {
        if let Some(w) = weights.iter().find(|w| !w.is_finite()) {
            return Err(MorphError::validation(format!("weight {w} is not finite")));
        }
        let dest = blended_points(images, weights, self.canvas)?;

        match self.settings.clear_rgba {
            Some(c) => self.accumulator.fill(rgba_from_u8(c)),
            None => self.accumulator.clear(),
        }

        let mut stats = FrameStats::default();
        let active: Vec<(usize, f64)> = images
            .iter()
            .zip(weights)
            .enumerate()
            .filter_map(|(k, (img, &w))| (w > 0.0 && img.is_loaded()).then_some((k, w)))
            .collect();
        stats.images_skipped = images.len() - active.len();

        let sampling = self.settings.sampling;
        if let Some(pool) = &self.pool {
            let (w, h) = (self.canvas.width, self.canvas.height);
            let warped: Vec<(PixelBuffer, WarpStats)> = pool.install(|| {
                active
                    .par_iter()
                    .map(|&(k, _)| {
                        let mut buf = PixelBuffer::new(w, h);
                        let s = warp_image(&images[k], &dest, sampling, &mut buf);
                        (buf, s)
                    })
                    .collect()
            });
            for ((buf, s), &(_, weight)) in warped.iter().zip(&active) {
                blend_in_place(&mut self.accumulator, buf, weight as f32, &self.blend)?;
                stats.add_warp(*s);
            }
        } else {
            for &(k, weight) in &active {
                let s = warp_image(&images[k], &dest, sampling, &mut self.scratch);
                blend_in_place(&mut self.accumulator, &self.scratch, weight as f32, &self.blend)?;
                stats.add_warp(s);
            }
        }

        if let Some(touch) = &self.final_touch {
            touch.apply(&mut self.accumulator);
        }

        tracing::debug!(
            blended = stats.images_blended,
            skipped = stats.images_skipped,
            triangles = stats.triangles_drawn,
            "frame composited"
        );
        self.last_stats = stats;
        Ok(self.accumulator.to_frame())
    }
}

fn rgba_from_u8(c: [u8; 4]) -> Rgba {
    [
        f32::from(c[0]) / 255.0,
        f32::from(c[1]) / 255.0,
        f32::from(c[2]) / 255.0,
        f32::from(c[3]) / 255.0,
    ]
}

fn build_thread_pool(threads: Option<usize>) -> MorphResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(MorphError::validation(
            "engine 'threads' must be >= 1 when set",
        ));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| MorphError::render(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/engine.rs"]
mod tests;
