use crate::foundation::core::{Canvas, Point, Vec2};
use crate::foundation::error::{MorphError, MorphResult};
use crate::mesh::triangle::{self, affine_between};
use crate::morph::image::MorphImage;
use crate::render::surface::{PixelBuffer, Raster, unpremultiply};

/// Source texel filtering used while warping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sampling {
    #[default]
    Bilinear,
    Nearest,
}

/// Per-image warp counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WarpStats {
    pub triangles_drawn: usize,
    pub triangles_skipped: usize,
}

/// Check that every image's mesh has the same number of points.
pub fn check_correspondence(images: &[MorphImage]) -> MorphResult<usize> {
    let Some(first) = images.first() else {
        return Ok(0);
    };
    let n = first.mesh().point_count();
    for img in &images[1..] {
        let m = img.mesh().point_count();
        if m != n {
            return Err(MorphError::topology(format!(
                "image {:?} has {m} mesh points but image {:?} has {n}",
                img.id(),
                first.id()
            )));
        }
    }
    Ok(n)
}

/// Weighted destination position of every point index, in canvas coordinates.
///
/// `dest[i] = center + Σ_k weight[k] * (offset_k + p_ik - size_k / 2)`. Unloaded images are
/// left out of the sum. Weights are used as given, without normalization.
pub fn blended_points(
    images: &[MorphImage],
    weights: &[f64],
    canvas: Canvas,
) -> MorphResult<Vec<Point>> {
    if weights.len() != images.len() {
        return Err(MorphError::validation(format!(
            "weight vector has {} entries for {} images",
            weights.len(),
            images.len()
        )));
    }
    let n = check_correspondence(images)?;

    let mut sums = vec![Vec2::ZERO; n];
    for (img, &w) in images.iter().zip(weights) {
        if w == 0.0 || !img.is_loaded() {
            continue;
        }
        for (i, sum) in sums.iter_mut().enumerate() {
            if let Some(v) = img.centered_point(i) {
                *sum += v * w;
            }
        }
    }
    let center = canvas.center();
    Ok(sums.into_iter().map(|v| center + v).collect())
}

/// Warp every triangle of `image` onto `dest` geometry, overwriting `out`.
///
/// Triangles that are degenerate in either frame are skipped.
pub fn warp_image(
    image: &MorphImage,
    dest: &[Point],
    sampling: Sampling,
    out: &mut PixelBuffer,
) -> WarpStats {
    out.clear();
    let mut stats = WarpStats::default();
    let Some(raster) = image.raster() else {
        return stats;
    };
    let mesh = image.mesh();
    for tri in mesh.triangles() {
        let (Some(src), Some(dst)) = (mesh.triangle_corners(tri), tri.corners(dest)) else {
            stats.triangles_skipped += 1;
            continue;
        };
        if warp_triangle(raster, &src, &dst, sampling, out) {
            stats.triangles_drawn += 1;
        } else {
            tracing::trace!(image = ?image.id(), tri = ?tri.vertices(), "skipped degenerate triangle");
            stats.triangles_skipped += 1;
        }
    }
    stats
}

/// Resample the pixels of `raster` inside `src` onto the pixels of `out` inside `dst`.
///
/// A pixel is covered when its center lies inside `dst` (edges inclusive). Returns `false`
/// without touching `out` when either triangle is degenerate.
pub fn warp_triangle(
    raster: &Raster,
    src: &[Point; 3],
    dst: &[Point; 3],
    sampling: Sampling,
    out: &mut PixelBuffer,
) -> bool {
    if triangle::is_degenerate(src) || triangle::is_degenerate(dst) {
        return false;
    }
    // Inverse map: destination pixel center -> source position.
    let Some(to_src) = affine_between(dst, src) else {
        return false;
    };

    let bounds = triangle::bounds(dst);
    let x0 = bounds.x0.floor().max(0.0) as u32;
    let y0 = bounds.y0.floor().max(0.0) as u32;
    let x1 = bounds.x1.ceil().min(f64::from(out.width())).max(0.0) as u32;
    let y1 = bounds.y1.ceil().min(f64::from(out.height())).max(0.0) as u32;

    let area2 = edge(dst[0], dst[1], dst[2]);
    let sign = area2.signum();
    let tolerance = -1e-9 * area2.abs();

    for y in y0..y1 {
        for x in x0..x1 {
            let c = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let w0 = edge(dst[1], dst[2], c) * sign;
            let w1 = edge(dst[2], dst[0], c) * sign;
            let w2 = edge(dst[0], dst[1], c) * sign;
            if w0 < tolerance || w1 < tolerance || w2 < tolerance {
                continue;
            }
            let p = to_src * c;
            let px = match sampling {
                Sampling::Bilinear => raster.sample_bilinear(p),
                Sampling::Nearest => raster.sample_nearest(p),
            };
            out.set(x, y, unpremultiply(px));
        }
    }
    true
}

/// Twice the signed area of `(a, b, c)`.
fn edge(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

#[cfg(test)]
#[path = "../../tests/unit/render/warp.rs"]
mod tests;
