use crate::foundation::core::{Point, PointId};
use crate::foundation::error::{MorphError, MorphResult};
use crate::foundation::math::GEOM_EPSILON;
use crate::mesh::triangle::{self, Triangle};

/// A mesh vertex in its image's local pixel frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshPoint {
    pub id: PointId,
    pub pos: Point,
}

/// Ordered points plus triangles over them for one image.
///
/// Point order is the cross-image correspondence key: index `i` names the same landmark in
/// every mesh taking part in a morph. Triangle order is presentation order only.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    points: Vec<MeshPoint>,
    triangles: Vec<Triangle>,
    next_id: u64,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from positions and index triples, validating every triple.
    pub fn from_parts(points: &[Point], triangles: &[[usize; 3]]) -> MorphResult<Self> {
        let mut mesh = Self::new();
        for &p in points {
            mesh.add_point(p);
        }
        for &[i, j, k] in triangles {
            mesh.add_triangle(i, j, k)?;
        }
        Ok(mesh)
    }

    pub fn points(&self) -> &[MeshPoint] {
        &self.points
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn positions(&self) -> Vec<Point> {
        self.points.iter().map(|p| p.pos).collect()
    }

    pub fn point(&self, idx: usize) -> Option<&MeshPoint> {
        self.points.get(idx)
    }

    pub fn index_of(&self, id: PointId) -> Option<usize> {
        self.points.iter().position(|p| p.id == id)
    }

    pub fn add_point(&mut self, pos: Point) -> usize {
        let id = PointId(self.next_id);
        self.next_id += 1;
        self.points.push(MeshPoint { id, pos });
        self.points.len() - 1
    }

    pub fn move_point(&mut self, idx: usize, pos: Point) -> MorphResult<()> {
        let n = self.points.len();
        let p = self
            .points
            .get_mut(idx)
            .ok_or_else(|| MorphError::topology(format!("point {idx} out of range (len {n})")))?;
        p.pos = pos;
        Ok(())
    }

    pub fn add_triangle(&mut self, i: usize, j: usize, k: usize) -> MorphResult<usize> {
        let n = self.points.len();
        if let Some(&bad) = [i, j, k].iter().find(|&&v| v >= n) {
            return Err(MorphError::topology(format!(
                "triangle ({i}, {j}, {k}) references point {bad} but mesh has {n} points"
            )));
        }
        if i == j || j == k || i == k {
            return Err(MorphError::topology(format!(
                "triangle ({i}, {j}, {k}) must reference three distinct points"
            )));
        }
        self.triangles.push(Triangle::new(i, j, k));
        Ok(self.triangles.len() - 1)
    }

    /// Remove a point and every triangle using it.
    ///
    /// Returns the number of triangles removed, or `None` (no-op) when `idx` is absent.
    pub fn remove_point(&mut self, idx: usize) -> Option<usize> {
        if idx >= self.points.len() {
            return None;
        }
        self.points.remove(idx);
        let before = self.triangles.len();
        self.triangles.retain(|t| !t.contains(idx));
        let removed = before - self.triangles.len();
        for t in &mut self.triangles {
            t.shift_after_removal(idx);
        }
        Some(removed)
    }

    pub fn remove_point_by_id(&mut self, id: PointId) -> Option<usize> {
        let idx = self.index_of(id)?;
        self.remove_point(idx)
    }

    /// Remove one triangle; its points stay, possibly unreferenced.
    pub fn remove_triangle(&mut self, idx: usize) -> Option<Triangle> {
        (idx < self.triangles.len()).then(|| self.triangles.remove(idx))
    }

    /// Indices of triangles having both `a` and `b` as vertices.
    pub fn triangles_on_edge(&self, a: usize, b: usize) -> Vec<usize> {
        self.triangles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.contains_edge(a, b))
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether [`Mesh::split_edge`] would change this mesh.
    pub fn can_split(&self, a: usize, b: usize) -> bool {
        let (Some(pa), Some(pb)) = (self.points.get(a), self.points.get(b)) else {
            return false;
        };
        pa.pos.distance(pb.pos) > GEOM_EPSILON && !self.triangles_on_edge(a, b).is_empty()
    }

    /// Insert the midpoint of `(a, b)` and split every triangle sharing that edge in two.
    ///
    /// Each split triangle keeps its slot for the first half; the second half is appended.
    /// Returns the new point's index, or `None` (no-op) when no triangle shares the edge or
    /// the edge has zero length.
    pub fn split_edge(&mut self, a: usize, b: usize) -> Option<usize> {
        if !self.can_split(a, b) {
            return None;
        }
        let on_edge = self.triangles_on_edge(a, b);
        let mid = self.points[a].pos.midpoint(self.points[b].pos);
        let m = self.add_point(mid);
        for ti in on_edge {
            if let Some([first, second]) = self.triangles[ti].split(a, b, m) {
                self.triangles[ti] = first;
                self.triangles.push(second);
            }
        }
        tracing::trace!(a, b, mid = m, "split mesh edge");
        Some(m)
    }

    pub fn triangle_corners(&self, t: &Triangle) -> Option<[Point; 3]> {
        let [i, j, k] = t.vertices();
        Some([
            self.points.get(i)?.pos,
            self.points.get(j)?.pos,
            self.points.get(k)?.pos,
        ])
    }

    /// Unsigned sum of all triangle areas.
    pub fn total_area(&self) -> f64 {
        self.triangles
            .iter()
            .filter_map(|t| self.triangle_corners(t))
            .map(|c| triangle::signed_area(&c).abs())
            .sum()
    }

    /// Index triples, in presentation order.
    pub fn triangle_indices(&self) -> Vec<[usize; 3]> {
        self.triangles.iter().map(|t| t.vertices()).collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mesh/model.rs"]
mod tests;
