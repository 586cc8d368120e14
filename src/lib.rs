//! Meshmorph morphs between any number of images at once.
//!
//! Every image carries a triangulated point mesh with a shared topology: point `i` marks the
//! same landmark in each image, and all meshes use one triangle list. A weight vector picks a
//! blended target geometry; each image is warped triangle-by-triangle onto it and the warps
//! are accumulated into one frame.
//!
//! - Register images and edit meshes through a [`Composition`]
//! - Set weights directly with [`Composition::set`], or tween them with
//!   [`Composition::animate`] and drive frames with [`Composition::tick`]
//! - Receive frames through an [`OutputSurface`] and changes through [`MorphEvent`]s
#![forbid(unsafe_code)]

mod foundation;

/// Weight-vector animation.
pub mod animation;
/// Raster sources, decoding, and caching.
pub mod assets;
/// Composition change notifications.
pub mod events;
pub(crate) mod mesh;
/// Morph images and the composition facade.
pub mod morph;
/// Project import and export.
pub mod project;
/// Warping, blending, and frame output.
pub mod render;

pub use crate::foundation::core::{Affine, Canvas, ImageId, Point, PointId, Rect, Vec2};
pub use crate::foundation::error::{MorphError, MorphResult};
pub use crate::mesh::model::{Mesh, MeshPoint};
pub use crate::mesh::triangle::{Triangle, affine_between, signed_area};

pub use crate::animation::driver::{AnimState, Animator, Tick};
pub use crate::animation::ease::{Ease, Easing};
pub use crate::assets::cache::{CacheStats, RasterCache};
pub use crate::assets::provider::{FsRasterProvider, RasterProvider, RasterSource};
pub use crate::events::{EventBus, ListenerId, MorphEvent};
pub use crate::morph::composition::{Composition, ImageSpec};
pub use crate::morph::image::MorphImage;
pub use crate::project::model::{Project, ProjectImage, ProjectPoint};
pub use crate::render::blend::BlendMode;
pub use crate::render::engine::{EngineSettings, FinalTouch, FrameStats, WarpEngine};
pub use crate::render::surface::{Frame, OutputSurface, PixelBuffer, PngSequence, Raster};
pub use crate::render::warp::Sampling;
