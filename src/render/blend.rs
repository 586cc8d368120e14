use std::sync::Arc;

use crate::foundation::error::{MorphError, MorphResult};
use crate::render::surface::{PixelBuffer, Rgba};

/// Signature of a custom blend: `(accumulator, warped source, weight) -> accumulator`.
pub type BlendFn = dyn Fn(Rgba, Rgba, f32) -> Rgba + Send + Sync;

/// How one weighted, warped image is folded into the accumulator.
///
/// All presets keep `alpha = max(acc.alpha, src.alpha * weight)`; they differ in color.
#[derive(Clone, Default)]
pub enum BlendMode {
    /// `acc.rgb + src.rgb * weight`.
    #[default]
    Additive,
    /// Darkens by the weighted source; transparent source areas leave `acc` unchanged.
    Multiply,
    /// `1 - (1 - acc.rgb) * (1 - src.rgb * weight)`.
    Screen,
    Custom(Arc<BlendFn>),
}

impl std::fmt::Debug for BlendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Additive => f.write_str("Additive"),
            Self::Multiply => f.write_str("Multiply"),
            Self::Screen => f.write_str("Screen"),
            Self::Custom(func) => f
                .debug_tuple("Custom")
                .field(&Arc::as_ptr(func).cast::<()>())
                .finish(),
        }
    }
}

impl BlendMode {
    pub fn custom(func: impl Fn(Rgba, Rgba, f32) -> Rgba + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(func))
    }

    pub fn parse(name: &str) -> MorphResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "additive" | "add" => Ok(Self::Additive),
            "multiply" => Ok(Self::Multiply),
            "screen" => Ok(Self::Screen),
            "" => Err(MorphError::validation("blend mode must be non-empty")),
            other => Err(MorphError::validation(format!("unknown blend mode '{other}'"))),
        }
    }

    /// Blend one pixel. The result is always finite and clamped to `[0, 1]`.
    pub fn apply(&self, acc: Rgba, src: Rgba, weight: f32) -> Rgba {
        let out = match self {
            Self::Additive => {
                let mut out = acc;
                for c in 0..3 {
                    out[c] = acc[c] + src[c] * weight;
                }
                out[3] = acc[3].max(src[3] * weight);
                out
            }
            Self::Multiply => {
                let mut out = acc;
                for c in 0..3 {
                    // Composite src over white so uncovered pixels multiply by 1.
                    let over_white = src[c] * src[3] + (1.0 - src[3]);
                    out[c] = acc[c] * (1.0 - weight + weight * over_white);
                }
                out[3] = acc[3].max(src[3] * weight);
                out
            }
            Self::Screen => {
                let mut out = acc;
                for c in 0..3 {
                    out[c] = 1.0 - (1.0 - acc[c]) * (1.0 - src[c] * weight);
                }
                out[3] = acc[3].max(src[3] * weight);
                out
            }
            Self::Custom(func) => func(acc, src, weight),
        };
        sanitize(out)
    }
}

fn sanitize(mut px: Rgba) -> Rgba {
    for c in &mut px {
        *c = if c.is_finite() { c.clamp(0.0, 1.0) } else { 0.0 };
    }
    px
}

/// Fold `src` into `acc` pixel by pixel.
pub fn blend_in_place(
    acc: &mut PixelBuffer,
    src: &PixelBuffer,
    weight: f32,
    mode: &BlendMode,
) -> MorphResult<()> {
    if !acc.same_size(src) {
        return Err(MorphError::validation(format!(
            "blend expects equal-size buffers, got {}x{} and {}x{}",
            acc.width(),
            acc.height(),
            src.width(),
            src.height()
        )));
    }
    for (d, s) in acc.pixels_mut().zip(src.pixels()) {
        let out = mode.apply([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], weight);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Pure form of [`blend_in_place`]: two buffers and a weight in, a new buffer out.
pub fn blend_pixels(
    acc: &PixelBuffer,
    src: &PixelBuffer,
    weight: f32,
    mode: &BlendMode,
) -> MorphResult<PixelBuffer> {
    let mut out = acc.clone();
    blend_in_place(&mut out, src, weight, mode)?;
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/render/blend.rs"]
mod tests;
