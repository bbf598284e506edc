// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures
//!
//! [`Mesh`] is an indexed triangle surface in double precision. Positions and
//! normals are stored flat (`x, y, z` triples) the way GPU buffers expect them,
//! and named scalar arrays can be attached to points or to triangles.

use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use rustc_hash::FxHashMap;

/// Name of the per-cell region id array written by connectivity filters
pub const REGION_ID_ARRAY: &str = "RegionId";

/// A named scalar array attached to the points or the cells of a mesh
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarArray {
    /// Signed integer values, used for region ids
    Int(Vec<i64>),
    /// Unsigned bytes, used for binary selection masks
    UInt8(Vec<u8>),
}

impl ScalarArray {
    /// Number of tuples in the array
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            ScalarArray::Int(values) => values.len(),
            ScalarArray::UInt8(values) => values.len(),
        }
    }

    /// Check if the array holds no values
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `index` widened to `f64`
    #[inline]
    pub fn value(&self, index: usize) -> Option<f64> {
        match self {
            ScalarArray::Int(values) => values.get(index).map(|&v| v as f64),
            ScalarArray::UInt8(values) => values.get(index).map(|&v| v as f64),
        }
    }

    /// Empty array of the same value type
    pub(crate) fn empty_like(&self) -> Self {
        match self {
            ScalarArray::Int(_) => ScalarArray::Int(Vec::new()),
            ScalarArray::UInt8(_) => ScalarArray::UInt8(Vec::new()),
        }
    }

    /// Append `source[index]` to this array
    pub(crate) fn push_from(&mut self, source: &ScalarArray, index: usize) {
        match (self, source) {
            (ScalarArray::Int(dst), ScalarArray::Int(src)) => dst.push(src.get(index).copied().unwrap_or(0)),
            (ScalarArray::UInt8(dst), ScalarArray::UInt8(src)) => dst.push(src.get(index).copied().unwrap_or(0)),
            _ => {}
        }
    }

    /// Append a value interpolated between `source[a]` and `source[b]`.
    ///
    /// Integer ids cannot be blended, so they take the value of the nearer end.
    pub(crate) fn push_interpolated(&mut self, source: &ScalarArray, a: usize, b: usize, t: f64) {
        match (self, source) {
            (ScalarArray::Int(dst), ScalarArray::Int(src)) => {
                let pick = if t < 0.5 { a } else { b };
                dst.push(src.get(pick).copied().unwrap_or(0));
            }
            (ScalarArray::UInt8(dst), ScalarArray::UInt8(src)) => {
                let va = src.get(a).copied().unwrap_or(0) as f64;
                let vb = src.get(b).copied().unwrap_or(0) as f64;
                dst.push((va + (vb - va) * t).round().clamp(0.0, 255.0) as u8);
            }
            _ => {}
        }
    }

    fn extend_from(&mut self, other: &ScalarArray) -> bool {
        match (self, other) {
            (ScalarArray::Int(dst), ScalarArray::Int(src)) => {
                dst.extend_from_slice(src);
                true
            }
            (ScalarArray::UInt8(dst), ScalarArray::UInt8(src)) => {
                dst.extend_from_slice(src);
                true
            }
            _ => false,
        }
    }
}

/// Named scalar arrays keyed by array name
pub type ScalarArrays = FxHashMap<String, ScalarArray>;

/// Indexed triangle mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f64>,
    /// Vertex normals (nx, ny, nz); either empty or one per vertex
    pub normals: Vec<f64>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
    /// Per-vertex scalar arrays
    pub point_data: ScalarArrays,
    /// Per-triangle scalar arrays
    pub cell_data: ScalarArrays,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::new(),
            indices: Vec::with_capacity(index_count),
            point_data: ScalarArrays::default(),
            cell_data: ScalarArrays::default(),
        }
    }

    /// Build a mesh from points and triangles
    pub fn from_triangles(points: &[Point3<f64>], triangles: &[[u32; 3]]) -> Self {
        let mut mesh = Self::with_capacity(points.len(), triangles.len() * 3);
        for p in points {
            mesh.add_vertex(*p);
        }
        for t in triangles {
            mesh.add_triangle(t[0], t[1], t[2]);
        }
        mesh
    }

    /// Add a vertex and return its index
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>) -> u32 {
        let index = self.vertex_count() as u32;
        self.positions.extend_from_slice(&[position.x, position.y, position.z]);
        index
    }

    /// Add a vertex with normal and return its index
    #[inline]
    pub fn add_vertex_with_normal(&mut self, position: Point3<f64>, normal: Vector3<f64>) -> u32 {
        let index = self.add_vertex(position);
        self.normals.extend_from_slice(&[normal.x, normal.y, normal.z]);
        index
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh has no points
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Check if every vertex carries a normal
    #[inline]
    pub fn has_normals(&self) -> bool {
        !self.positions.is_empty() && self.normals.len() == self.positions.len()
    }

    /// Position of vertex `i`
    #[inline]
    pub fn point(&self, i: usize) -> Point3<f64> {
        Point3::new(self.positions[i * 3], self.positions[i * 3 + 1], self.positions[i * 3 + 2])
    }

    /// Overwrite the position of vertex `i`
    #[inline]
    pub fn set_point(&mut self, i: usize, p: Point3<f64>) {
        self.positions[i * 3] = p.x;
        self.positions[i * 3 + 1] = p.y;
        self.positions[i * 3 + 2] = p.z;
    }

    /// Normal of vertex `i`, or zero if the mesh carries no normals
    #[inline]
    pub fn normal(&self, i: usize) -> Vector3<f64> {
        if self.has_normals() {
            Vector3::new(self.normals[i * 3], self.normals[i * 3 + 1], self.normals[i * 3 + 2])
        } else {
            Vector3::zeros()
        }
    }

    /// All vertex positions as points
    pub fn points(&self) -> Vec<Point3<f64>> {
        (0..self.vertex_count()).map(|i| self.point(i)).collect()
    }

    /// Vertex indices of triangle `t`
    #[inline]
    pub fn triangle(&self, t: usize) -> [u32; 3] {
        [self.indices[t * 3], self.indices[t * 3 + 1], self.indices[t * 3 + 2]]
    }

    /// Iterate over triangle index triples
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]])
    }

    /// Corner positions of triangle `t`
    #[inline]
    pub fn triangle_points(&self, t: usize) -> [Point3<f64>; 3] {
        let [a, b, c] = self.triangle(t);
        [self.point(a as usize), self.point(b as usize), self.point(c as usize)]
    }

    /// Unit normal of triangle `t` from its winding (zero for degenerate triangles)
    pub fn triangle_normal(&self, t: usize) -> Vector3<f64> {
        let [a, b, c] = self.triangle_points(t);
        let n = (b - a).cross(&(c - a));
        let len = n.norm();
        if len > 1e-20 {
            n / len
        } else {
            Vector3::zeros()
        }
    }

    /// Merge another mesh into this one.
    ///
    /// Normals and scalar arrays survive only when both meshes carry them.
    pub fn merge(&mut self, other: &Mesh) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() && self.indices.is_empty() {
            *self = other.clone();
            return;
        }

        let vertex_offset = self.vertex_count() as u32;
        if self.has_normals() && other.has_normals() {
            self.normals.extend_from_slice(&other.normals);
        } else {
            self.normals.clear();
        }
        self.positions.extend_from_slice(&other.positions);
        self.indices.extend(other.indices.iter().map(|&i| i + vertex_offset));

        merge_arrays(&mut self.point_data, &other.point_data);
        merge_arrays(&mut self.cell_data, &other.cell_data);
    }

    /// Calculate bounds (min, max), or `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        if self.is_empty() {
            return None;
        }

        let mut min = Point3::new(f64::MAX, f64::MAX, f64::MAX);
        let mut max = Point3::new(f64::MIN, f64::MIN, f64::MIN);
        self.positions.chunks_exact(3).for_each(|chunk| {
            min.x = min.x.min(chunk[0]);
            min.y = min.y.min(chunk[1]);
            min.z = min.z.min(chunk[2]);
            max.x = max.x.max(chunk[0]);
            max.y = max.y.max(chunk[1]);
            max.z = max.z.max(chunk[2]);
        });
        Some((min, max))
    }

    /// Average of all vertex positions
    pub fn centroid(&self) -> Point3<f64> {
        if self.is_empty() {
            return Point3::origin();
        }
        let mut sum = Vector3::zeros();
        for i in 0..self.vertex_count() {
            sum += self.point(i).coords;
        }
        Point3::from(sum / self.vertex_count() as f64)
    }

    /// Signed volume enclosed by the surface (positive for outward winding)
    pub fn signed_volume(&self) -> f64 {
        (0..self.triangle_count())
            .map(|t| {
                let [a, b, c] = self.triangle_points(t);
                a.coords.dot(&b.coords.cross(&c.coords)) / 6.0
            })
            .sum()
    }

    /// Total surface area
    pub fn area(&self) -> f64 {
        (0..self.triangle_count())
            .map(|t| {
                let [a, b, c] = self.triangle_points(t);
                (b - a).cross(&(c - a)).norm() * 0.5
            })
            .sum()
    }

    /// Reverse the winding of every triangle, leaving normals alone
    pub fn reverse_cells(&mut self) {
        for tri in self.indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
    }

    /// Reverse the winding of every triangle and flip the normals
    pub fn reverse_sense(&mut self) {
        self.reverse_cells();
        for n in self.normals.iter_mut() {
            *n = -*n;
        }
    }

    /// Transform positions (and normals) by a homogeneous matrix.
    ///
    /// Normals use the inverse-transpose of the linear part and are renormalized.
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for i in 0..self.vertex_count() {
            let p = matrix.transform_point(&self.point(i));
            self.set_point(i, p);
        }
        if self.has_normals() {
            let linear: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
            let normal_matrix = linear.try_inverse().map(|m| m.transpose()).unwrap_or(linear);
            for chunk in self.normals.chunks_exact_mut(3) {
                let n = normal_matrix * Vector3::new(chunk[0], chunk[1], chunk[2]);
                let len = n.norm();
                let n = if len > 1e-20 { n / len } else { n };
                chunk.copy_from_slice(&[n.x, n.y, n.z]);
            }
        }
    }

    /// Copy of this mesh transformed by `matrix`
    pub fn transformed(&self, matrix: &Matrix4<f64>) -> Mesh {
        let mut mesh = self.clone();
        mesh.transform(matrix);
        mesh
    }

    /// Extract the listed triangles into a new mesh, dropping unused points
    pub fn extract_triangles(&self, triangles: &[usize]) -> Mesh {
        let mut out = Mesh::with_capacity(0, triangles.len() * 3);
        let mut point_map = vec![u32::MAX; self.vertex_count()];
        let has_normals = self.has_normals();
        let mut point_data = empty_arrays_like(&self.point_data);
        let mut cell_data = empty_arrays_like(&self.cell_data);

        for &t in triangles {
            let tri = self.triangle(t);
            let mut mapped = [0u32; 3];
            for (k, &v) in tri.iter().enumerate() {
                let v = v as usize;
                if point_map[v] == u32::MAX {
                    point_map[v] = if has_normals {
                        out.add_vertex_with_normal(self.point(v), self.normal(v))
                    } else {
                        out.add_vertex(self.point(v))
                    };
                    for (name, array) in point_data.iter_mut() {
                        if let Some(source) = self.point_data.get(name) {
                            array.push_from(source, v);
                        }
                    }
                }
                mapped[k] = point_map[v];
            }
            out.add_triangle(mapped[0], mapped[1], mapped[2]);
            for (name, array) in cell_data.iter_mut() {
                if let Some(source) = self.cell_data.get(name) {
                    array.push_from(source, t);
                }
            }
        }

        out.point_data = point_data;
        out.cell_data = cell_data;
        out
    }

    /// Edges used by exactly one triangle, oriented as in that triangle
    pub fn boundary_edges(&self) -> Vec<(u32, u32)> {
        let mut counts: FxHashMap<(u32, u32), (usize, (u32, u32))> = FxHashMap::default();
        let mut order = Vec::new();
        for [a, b, c] in self.triangles() {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                let key = (u.min(v), u.max(v));
                let entry = counts.entry(key).or_insert_with(|| {
                    order.push(key);
                    (0, (u, v))
                });
                entry.0 += 1;
            }
        }
        order
            .into_iter()
            .filter_map(|key| match counts.get(&key) {
                Some(&(1, edge)) => Some(edge),
                _ => None,
            })
            .collect()
    }

    /// Clear the mesh
    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.indices.clear();
        self.point_data.clear();
        self.cell_data.clear();
    }
}

/// Empty arrays with the same names and value types
pub(crate) fn empty_arrays_like(arrays: &ScalarArrays) -> ScalarArrays {
    arrays
        .iter()
        .map(|(name, array)| (name.clone(), array.empty_like()))
        .collect()
}

fn merge_arrays(target: &mut ScalarArrays, other: &ScalarArrays) {
    target.retain(|name, array| match other.get(name) {
        Some(source) => array.extend_from(source),
        None => false,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Mesh {
        Mesh::from_triangles(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[[0, 1, 2]],
        )
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = Mesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
        assert!(mesh.bounds().is_none());
    }

    #[test]
    fn test_add_vertex() {
        let mut mesh = Mesh::new();
        let i = mesh.add_vertex_with_normal(Point3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(i, 0);
        assert_eq!(mesh.vertex_count(), 1);
        assert_eq!(mesh.positions, vec![1.0, 2.0, 3.0]);
        assert!(mesh.has_normals());
    }

    #[test]
    fn test_merge_keeps_common_arrays_only() {
        let mut a = unit_triangle();
        a.cell_data.insert("RegionId".into(), ScalarArray::Int(vec![4]));
        a.cell_data.insert("Other".into(), ScalarArray::Int(vec![1]));
        let mut b = unit_triangle();
        b.cell_data.insert("RegionId".into(), ScalarArray::Int(vec![7]));

        a.merge(&b);
        assert_eq!(a.vertex_count(), 6);
        assert_eq!(a.triangle(1), [3, 4, 5]);
        assert_eq!(a.cell_data.get("RegionId"), Some(&ScalarArray::Int(vec![4, 7])));
        assert!(a.cell_data.get("Other").is_none());
    }

    #[test]
    fn test_reverse_sense_flips_normal() {
        let mut mesh = unit_triangle();
        assert!((mesh.triangle_normal(0).z - 1.0).abs() < 1e-12);
        mesh.reverse_sense();
        assert!((mesh.triangle_normal(0).z + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_boundary_edges_of_single_triangle() {
        let mesh = unit_triangle();
        assert_eq!(mesh.boundary_edges(), vec![(0, 1), (1, 2), (2, 0)]);
    }

    #[test]
    fn test_extract_triangles_drops_unused_points() {
        let mut mesh = unit_triangle();
        mesh.add_vertex(Point3::new(5.0, 5.0, 5.0));
        mesh.add_vertex(Point3::new(6.0, 5.0, 5.0));
        mesh.add_vertex(Point3::new(5.0, 6.0, 5.0));
        mesh.add_triangle(3, 4, 5);

        let part = mesh.extract_triangles(&[1]);
        assert_eq!(part.vertex_count(), 3);
        assert_eq!(part.triangle(0), [0, 1, 2]);
        assert!((part.point(0).x - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_transform_translates_points() {
        let mut mesh = unit_triangle();
        mesh.transform(&Matrix4::new_translation(&Vector3::new(0.0, 0.0, 2.0)));
        assert!((mesh.point(1).z - 2.0).abs() < 1e-12);
        assert!((mesh.point(1).x - 1.0).abs() < 1e-12);
    }
}
