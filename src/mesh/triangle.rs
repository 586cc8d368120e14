//! Triangle cells and the closed-form affine solve between two vertex frames.

use crate::foundation::core::{Affine, Point, Rect};
use crate::foundation::math::GEOM_EPSILON;

/// One mesh cell: three indices into the owning mesh's point list.
///
/// Vertex order defines winding, which fixes the sign of [`signed_area`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Triangle {
    v: [usize; 3],
}

impl Triangle {
    pub(crate) fn new(a: usize, b: usize, c: usize) -> Self {
        Self { v: [a, b, c] }
    }

    pub fn vertices(self) -> [usize; 3] {
        self.v
    }

    pub fn contains(self, idx: usize) -> bool {
        self.v.contains(&idx)
    }

    pub fn contains_edge(self, a: usize, b: usize) -> bool {
        a != b && self.contains(a) && self.contains(b)
    }

    /// Look up the three corner positions; `None` when any index is out of range.
    pub fn corners(self, points: &[Point]) -> Option<[Point; 3]> {
        Some([
            *points.get(self.v[0])?,
            *points.get(self.v[1])?,
            *points.get(self.v[2])?,
        ])
    }

    /// Split along the edge `(a, b)` at point `mid`, keeping winding.
    ///
    /// Returns `None` when `(a, b)` is not an edge of this triangle.
    pub(crate) fn split(self, a: usize, b: usize, mid: usize) -> Option<[Triangle; 2]> {
        if !self.contains_edge(a, b) {
            return None;
        }
        // Rotate so the edge runs v[i] -> v[i+1] in winding order.
        let i = (0..3).find(|&i| {
            let (p, q) = (self.v[i], self.v[(i + 1) % 3]);
            (p == a && q == b) || (p == b && q == a)
        })?;
        let p = self.v[i];
        let q = self.v[(i + 1) % 3];
        let r = self.v[(i + 2) % 3];
        Some([Triangle::new(p, mid, r), Triangle::new(mid, q, r)])
    }

    /// Rewrite indices after the point at `removed` was deleted from the mesh.
    pub(crate) fn shift_after_removal(&mut self, removed: usize) {
        for v in &mut self.v {
            if *v > removed {
                *v -= 1;
            }
        }
    }
}

/// Signed area; positive for counter-clockwise winding in a y-up frame.
pub fn signed_area(p: &[Point; 3]) -> f64 {
    0.5 * ((p[1].x - p[0].x) * (p[2].y - p[0].y) - (p[2].x - p[0].x) * (p[1].y - p[0].y))
}

pub fn bounds(p: &[Point; 3]) -> Rect {
    Rect::from_points(p[0], p[1]).union_pt(p[2])
}

pub fn is_degenerate(p: &[Point; 3]) -> bool {
    let a = signed_area(p);
    !a.is_finite() || a.abs() * 2.0 < GEOM_EPSILON
}

/// The unique affine map carrying `src[i]` onto `dst[i]` for all three corners.
///
/// `None` when `src` is degenerate or any coordinate is non-finite.
pub fn affine_between(src: &[Point; 3], dst: &[Point; 3]) -> Option<Affine> {
    if is_degenerate(src) || dst.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return None;
    }
    // Each basis maps the unit triangle (0,0),(1,0),(0,1) onto its corners.
    let from_unit = |p: &[Point; 3]| {
        Affine::new([
            p[1].x - p[0].x,
            p[1].y - p[0].y,
            p[2].x - p[0].x,
            p[2].y - p[0].y,
            p[0].x,
            p[0].y,
        ])
    };
    let map = from_unit(dst) * from_unit(src).inverse();
    map.is_finite().then_some(map)
}

#[cfg(test)]
#[path = "../../tests/unit/mesh/triangle.rs"]
mod tests;
