use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{MorphError, MorphResult};

/// One point of an image's mesh, in that image's pixel frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProjectPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProjectImage {
    /// Raster reference, resolved by the raster provider (a relative path for files).
    pub src: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub points: Vec<ProjectPoint>,
}

/// Persisted morph project: per-image meshes sharing one triangle list.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Project {
    #[serde(default)]
    pub images: Vec<ProjectImage>,
    #[serde(default)]
    pub triangles: Vec<[usize; 3]>,
}

impl Project {
    /// Check the correspondence invariants: equal point counts across images and every
    /// triangle index in range and distinct.
    pub fn validate(&self) -> MorphResult<()> {
        let n = self.images.first().map_or(0, |img| img.points.len());
        for (k, img) in self.images.iter().enumerate() {
            if img.points.len() != n {
                return Err(MorphError::topology(format!(
                    "image {k} ('{}') has {} points, image 0 has {n}",
                    img.src,
                    img.points.len()
                )));
            }
            if !img.x.is_finite() || !img.y.is_finite() {
                return Err(MorphError::validation(format!(
                    "image {k} ('{}') has a non-finite offset",
                    img.src
                )));
            }
            if let Some(p) = img.points.iter().position(|p| !p.x.is_finite() || !p.y.is_finite())
            {
                return Err(MorphError::validation(format!(
                    "image {k} point {p} is not finite"
                )));
            }
        }
        for (t, &[i, j, k]) in self.triangles.iter().enumerate() {
            if let Some(&bad) = [i, j, k].iter().find(|&&v| v >= n) {
                return Err(MorphError::topology(format!(
                    "triangle {t} references point {bad} but images have {n} points"
                )));
            }
            if i == j || j == k || i == k {
                return Err(MorphError::topology(format!(
                    "triangle {t} ({i}, {j}, {k}) must reference three distinct points"
                )));
            }
        }
        Ok(())
    }

    pub fn from_json_str(s: &str) -> MorphResult<Self> {
        serde_json::from_str(s).map_err(|e| MorphError::serde(format!("parse project JSON: {e}")))
    }

    pub fn to_json_string(&self) -> MorphResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| MorphError::serde(format!("serialize project JSON: {e}")))
    }

    pub fn read(path: &Path) -> MorphResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("open project '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    pub fn write(&self, path: &Path) -> MorphResult<()> {
        let s = self.to_json_string()?;
        std::fs::write(path, s).with_context(|| format!("write project '{}'", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/project/model.rs"]
mod tests;
