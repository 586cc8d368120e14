use std::sync::Arc;

use crate::foundation::error::{MorphError, MorphResult};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InSine,
    OutSine,
    InOutSine,
    /// CSS `cubic-bezier(x1, y1, x2, y2)`.
    CubicBezier(f64, f64, f64, f64),
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
            Self::InSine => 1.0 - (t * std::f64::consts::FRAC_PI_2).cos(),
            Self::OutSine => (t * std::f64::consts::FRAC_PI_2).sin(),
            Self::InOutSine => -((std::f64::consts::PI * t).cos() - 1.0) / 2.0,
            Self::CubicBezier(x1, y1, x2, y2) => {
                if t <= 0.0 || t >= 1.0 {
                    return t;
                }
                let s = solve_bezier_t(t, x1, x2);
                sample_bezier(s, y1, y2)
            }
        }
    }

    /// Parse a preset name such as `"in_out_cubic"` or `"cubic-bezier(0.25,0.1,0.25,1)"`.
    pub fn parse(name: &str) -> MorphResult<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let compact: String = lower.chars().filter(|c| !c.is_whitespace()).collect();
        if let Some(args) = compact
            .strip_prefix("cubic-bezier(")
            .or_else(|| compact.strip_prefix("cubic_bezier("))
            .and_then(|s| s.strip_suffix(')'))
        {
            let v: Vec<f64> = args
                .split(',')
                .map(|a| a.trim().parse::<f64>())
                .collect::<Result<_, _>>()
                .map_err(|e| MorphError::validation(format!("bad cubic-bezier argument: {e}")))?;
            let &[x1, y1, x2, y2] = v.as_slice() else {
                return Err(MorphError::validation("cubic-bezier takes 4 arguments"));
            };
            if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
                return Err(MorphError::validation(
                    "cubic-bezier x control points must be in [0, 1]",
                ));
            }
            return Ok(Self::CubicBezier(x1, y1, x2, y2));
        }
        let norm = lower.replace(['-', ' '], "_");
        Ok(match norm.as_str() {
            "linear" => Self::Linear,
            "in_quad" => Self::InQuad,
            "out_quad" => Self::OutQuad,
            "in_out_quad" => Self::InOutQuad,
            "in_cubic" => Self::InCubic,
            "out_cubic" => Self::OutCubic,
            "in_out_cubic" => Self::InOutCubic,
            "in_sine" => Self::InSine,
            "out_sine" => Self::OutSine,
            "in_out_sine" => Self::InOutSine,
            // CSS keyword curves.
            "ease" => Self::CubicBezier(0.25, 0.1, 0.25, 1.0),
            "ease_in" => Self::CubicBezier(0.42, 0.0, 1.0, 1.0),
            "ease_out" => Self::CubicBezier(0.0, 0.0, 0.58, 1.0),
            "ease_in_out" => Self::CubicBezier(0.42, 0.0, 0.58, 1.0),
            other => return Err(MorphError::validation(format!("unknown easing '{other}'"))),
        })
    }
}

// Newton iterations on x(s) = t, falling back to bisection when the slope flattens.
fn solve_bezier_t(x: f64, x1: f64, x2: f64) -> f64 {
    let mut s = x;
    for _ in 0..8 {
        let residual = sample_bezier(s, x1, x2) - x;
        if residual.abs() < 1e-7 {
            return s;
        }
        let slope = bezier_derivative(s, x1, x2);
        if slope.abs() < 1e-6 {
            break;
        }
        s -= residual / slope;
    }

    let (mut lo, mut hi) = (0.0, 1.0);
    s = x;
    for _ in 0..40 {
        let v = sample_bezier(s, x1, x2);
        if (v - x).abs() < 1e-7 {
            break;
        }
        if v < x {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    s
}

/// Cubic bezier with endpoints 0 and 1.
fn sample_bezier(s: f64, p1: f64, p2: f64) -> f64 {
    let ms = 1.0 - s;
    3.0 * ms * ms * s * p1 + 3.0 * ms * s * s * p2 + s * s * s
}

fn bezier_derivative(s: f64, p1: f64, p2: f64) -> f64 {
    let ms = 1.0 - s;
    3.0 * ms * ms * p1 + 6.0 * ms * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

/// Signature of a custom easing curve over `[0, 1]`.
pub type EaseFn = dyn Fn(f64) -> f64 + Send + Sync;

/// A preset curve or an arbitrary easing function.
#[derive(Clone)]
pub enum Easing {
    Preset(Ease),
    Custom(Arc<EaseFn>),
}

impl Default for Easing {
    fn default() -> Self {
        Self::Preset(Ease::Linear)
    }
}

impl From<Ease> for Easing {
    fn from(ease: Ease) -> Self {
        Self::Preset(ease)
    }
}

impl std::fmt::Debug for Easing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Preset(e) => f.debug_tuple("Preset").field(e).finish(),
            Self::Custom(func) => f
                .debug_tuple("Custom")
                .field(&Arc::as_ptr(func).cast::<()>())
                .finish(),
        }
    }
}

impl Easing {
    pub fn custom(func: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(func))
    }

    /// Eased progress for `t` clamped to `[0, 1]`. A non-finite custom result falls back to `t`.
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        let v = match self {
            Self::Preset(e) => e.apply(t),
            Self::Custom(func) => func(t),
        };
        if v.is_finite() { v } else { t }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
