use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::{Point, Vec2};
use crate::foundation::error::{MorphError, MorphResult};
use crate::foundation::math::{mul_div255_u8, unit_to_u8};

/// Normalized straight-alpha RGBA, each channel in `[0, 1]`.
pub type Rgba = [f32; 4];

pub const TRANSPARENT: Rgba = [0.0; 4];

/// Decoded source raster in premultiplied RGBA8 form.
///
/// The buffer always holds exactly `width * height * 4` bytes; [`Raster::new`] and
/// [`Raster::solid`] are the only constructors.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    rgba8_premul: Arc<Vec<u8>>,
}

impl Raster {
    pub fn new(width: u32, height: u32, rgba8_premul: Vec<u8>) -> MorphResult<Self> {
        let expected = buffer_len(width, height, 4)?;
        if rgba8_premul.len() != expected {
            return Err(MorphError::validation(format!(
                "raster {width}x{height} expects {expected} bytes, got {}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// A raster filled with one straight-alpha color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let a = u16::from(rgba[3]);
        let px = [
            mul_div255_u8(u16::from(rgba[0]), a),
            mul_div255_u8(u16::from(rgba[1]), a),
            mul_div255_u8(u16::from(rgba[2]), a),
            rgba[3],
        ];
        let n = (width as usize) * (height as usize);
        Self {
            width,
            height,
            rgba8_premul: Arc::new(px.repeat(n)),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major premultiplied RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.rgba8_premul
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(f64::from(self.width), f64::from(self.height))
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let d = self.rgba8_premul.get(i..i + 4)?;
        Some([d[0], d[1], d[2], d[3]])
    }

    fn texel(&self, x: i64, y: i64) -> Rgba {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return TRANSPARENT;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let Some(d) = self.rgba8_premul.get(i..i + 4) else {
            return TRANSPARENT;
        };
        [
            f32::from(d[0]) / 255.0,
            f32::from(d[1]) / 255.0,
            f32::from(d[2]) / 255.0,
            f32::from(d[3]) / 255.0,
        ]
    }

    /// Premultiplied nearest-texel lookup at a continuous position (pixel centers at `+0.5`).
    pub fn sample_nearest(&self, p: Point) -> Rgba {
        self.texel(p.x.floor() as i64, p.y.floor() as i64)
    }

    /// Bilinear lookup at a continuous position, premultiplied; outside the raster is transparent.
    pub fn sample_bilinear(&self, p: Point) -> Rgba {
        let u = p.x - 0.5;
        let v = p.y - 0.5;
        let x0 = u.floor();
        let y0 = v.floor();
        let fx = (u - x0) as f32;
        let fy = (v - y0) as f32;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let t00 = self.texel(x0, y0);
        let t10 = self.texel(x0 + 1, y0);
        let t01 = self.texel(x0, y0 + 1);
        let t11 = self.texel(x0 + 1, y0 + 1);

        let mut out = TRANSPARENT;
        for c in 0..4 {
            let top = t00[c] * (1.0 - fx) + t10[c] * fx;
            let bottom = t01[c] * (1.0 - fx) + t11[c] * fx;
            out[c] = top * (1.0 - fy) + bottom * fy;
        }
        out
    }
}

/// Convert a premultiplied sample to straight alpha.
pub fn unpremultiply(px: Rgba) -> Rgba {
    let a = px[3];
    if a <= 0.0 {
        return TRANSPARENT;
    }
    [
        (px[0] / a).min(1.0),
        (px[1] / a).min(1.0),
        (px[2] / a).min(1.0),
        a.min(1.0),
    ]
}

/// Canvas-sized working buffer of normalized straight-alpha RGBA.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let n = (width as usize) * (height as usize) * 4;
        Self {
            width,
            height,
            data: vec![0.0; n],
        }
    }

    pub fn filled(width: u32, height: u32, rgba: Rgba) -> Self {
        let mut buf = Self::new(width, height);
        buf.fill(rgba);
        buf
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn same_size(&self, other: &PixelBuffer) -> bool {
        self.width == other.width && self.height == other.height
    }

    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    pub fn fill(&mut self, rgba: Rgba) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        let d = &self.data[i..i + 4];
        Some([d[0], d[1], d[2], d[3]])
    }

    pub fn set(&mut self, x: u32, y: u32, rgba: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.offset(x, y);
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    pub fn pixels(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(4)
    }

    pub fn pixels_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        self.data.chunks_exact_mut(4)
    }

    /// Quantize to a straight-alpha RGBA8 frame.
    pub fn to_frame(&self) -> Frame {
        Frame {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&c| unit_to_u8(c)).collect(),
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }
}

/// A composited output frame in straight-alpha RGBA8.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major RGBA8.
    pub data: Vec<u8>,
}

impl Frame {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let d = self.data.get(i..i + 4)?;
        Some([d[0], d[1], d[2], d[3]])
    }

    pub fn save_png(&self, path: &Path) -> MorphResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        image::save_buffer_with_format(
            path,
            &self.data,
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

/// Destination for composited frames.
pub trait OutputSurface {
    fn present(&mut self, frame: &Frame) -> MorphResult<()>;
}

/// Writes each presented frame as `<prefix><index:05>.png` into a directory.
#[derive(Clone, Debug)]
pub struct PngSequence {
    dir: PathBuf,
    prefix: String,
    next_index: u64,
}

impl PngSequence {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            next_index: 0,
        }
    }

    pub fn frames_written(&self) -> u64 {
        self.next_index
    }

    pub fn path_for(&self, index: u64) -> PathBuf {
        self.dir.join(format!("{}{index:05}.png", self.prefix))
    }
}

impl OutputSurface for PngSequence {
    fn present(&mut self, frame: &Frame) -> MorphResult<()> {
        let path = self.path_for(self.next_index);
        frame.save_png(&path)?;
        self.next_index += 1;
        Ok(())
    }
}

fn buffer_len(width: u32, height: u32, channels: usize) -> MorphResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(channels))
        .ok_or_else(|| MorphError::validation("buffer size overflow"))
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
