// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh clipping against scalar fields and implicit functions
//!
//! Each triangle is clipped Sutherland-Hodgman style against the level set
//! `scalar = value`. Intersection points are cached per mesh edge so both
//! triangles sharing an edge reuse the same new vertex, which keeps the
//! output conforming and lets caps built from the same edges seal it exactly.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::implicit::ImplicitFunction;
use crate::mesh::{empty_arrays_like, Mesh, ScalarArrays};

/// Result of a clip: the kept part and, if requested, the removed part
#[derive(Debug, Clone, Default)]
pub struct ClipOutput {
    pub kept: Mesh,
    pub clipped: Option<Mesh>,
}

/// Clip filter configuration.
///
/// By default points with `scalar >= value` are kept; `inside_out` keeps
/// `scalar <= value` instead.
#[derive(Debug, Clone, Copy)]
pub struct Clipper {
    pub value: f64,
    pub inside_out: bool,
    pub generate_clipped_output: bool,
}

impl Default for Clipper {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Clipper {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            inside_out: false,
            generate_clipped_output: false,
        }
    }

    pub fn inside_out(mut self, inside_out: bool) -> Self {
        self.inside_out = inside_out;
        self
    }

    pub fn with_clipped_output(mut self, generate: bool) -> Self {
        self.generate_clipped_output = generate;
        self
    }

    /// Clip `mesh` against an implicit function evaluated at its vertices
    pub fn clip(&self, mesh: &Mesh, function: &dyn ImplicitFunction) -> ClipOutput {
        let scalars = evaluate_at_points(mesh, function);
        self.clip_by_scalars(mesh, &scalars)
    }

    /// Clip `mesh` against per-vertex scalars
    pub fn clip_by_scalars(&self, mesh: &Mesh, scalars: &[f64]) -> ClipOutput {
        let signed: Vec<f64> = scalars
            .iter()
            .map(|&s| if self.inside_out { self.value - s } else { s - self.value })
            .collect();
        let negated: Vec<f64> = signed.iter().map(|s| -s).collect();

        let mut kept = SideBuilder::new(mesh);
        let mut clipped = self.generate_clipped_output.then(|| SideBuilder::new(mesh));

        for t in 0..mesh.triangle_count() {
            kept.clip_triangle(mesh, t, &signed, true);
            if let Some(side) = clipped.as_mut() {
                side.clip_triangle(mesh, t, &negated, false);
            }
        }

        ClipOutput {
            kept: kept.finish(),
            clipped: clipped.map(SideBuilder::finish),
        }
    }
}

/// Evaluate an implicit function at every vertex
pub fn evaluate_at_points(mesh: &Mesh, function: &dyn ImplicitFunction) -> Vec<f64> {
    (0..mesh.vertex_count())
        .map(|i| function.evaluate(&mesh.point(i)))
        .collect()
}

/// Cells whose vertices all lie on the non-negative side of `function`
pub fn extract_positive_cells(mesh: &Mesh, function: &dyn ImplicitFunction) -> Mesh {
    let scalars = evaluate_at_points(mesh, function);
    let selected: Vec<usize> = (0..mesh.triangle_count())
        .filter(|&t| mesh.triangle(t).iter().all(|&v| scalars[v as usize] >= 0.0))
        .collect();
    mesh.extract_triangles(&selected)
}

#[derive(Clone, Copy)]
enum ClipVertex {
    Original(u32),
    Edge(u32, u32),
}

/// Accumulates one side of a clip with its own point numbering
struct SideBuilder {
    mesh: Mesh,
    point_map: Vec<u32>,
    edge_map: FxHashMap<(u32, u32), u32>,
    carry_normals: bool,
    point_data: ScalarArrays,
    cell_data: ScalarArrays,
}

impl SideBuilder {
    fn new(source: &Mesh) -> Self {
        Self {
            mesh: Mesh::new(),
            point_map: vec![u32::MAX; source.vertex_count()],
            edge_map: FxHashMap::default(),
            carry_normals: source.has_normals(),
            point_data: empty_arrays_like(&source.point_data),
            cell_data: empty_arrays_like(&source.cell_data),
        }
    }

    /// Clip triangle `t` keeping the part where `s >= 0`.
    ///
    /// A triangle lying entirely on the level set is emitted only when
    /// `take_flat` is set, so it never lands on both sides.
    fn clip_triangle(&mut self, source: &Mesh, t: usize, s: &[f64], take_flat: bool) {
        let tri = source.triangle(t);
        let values = tri.map(|v| s[v as usize]);

        let any_positive = values.iter().any(|&v| v > 0.0);
        let all_flat = values.iter().all(|&v| v == 0.0);
        if !any_positive && !(all_flat && take_flat) {
            return;
        }

        let mut polygon: SmallVec<[ClipVertex; 4]> = SmallVec::new();
        for k in 0..3 {
            let (a, b) = (tri[k], tri[(k + 1) % 3]);
            let (sa, sb) = (values[k], values[(k + 1) % 3]);
            if sa >= 0.0 {
                polygon.push(ClipVertex::Original(a));
            }
            if (sa > 0.0 && sb < 0.0) || (sa < 0.0 && sb > 0.0) {
                polygon.push(ClipVertex::Edge(a, b));
            }
        }
        if polygon.len() < 3 {
            return;
        }

        let ids: SmallVec<[u32; 4]> = polygon
            .iter()
            .map(|v| match *v {
                ClipVertex::Original(i) => self.original_point(source, i),
                ClipVertex::Edge(a, b) => self.edge_point(source, a, b, s),
            })
            .collect();

        for i in 1..ids.len() - 1 {
            let (a, b, c) = (ids[0], ids[i], ids[i + 1]);
            if a == b || b == c || a == c {
                continue;
            }
            self.mesh.add_triangle(a, b, c);
            for (name, array) in self.cell_data.iter_mut() {
                if let Some(src) = source.cell_data.get(name) {
                    array.push_from(src, t);
                }
            }
        }
    }

    fn original_point(&mut self, source: &Mesh, i: u32) -> u32 {
        let slot = &mut self.point_map[i as usize];
        if *slot != u32::MAX {
            return *slot;
        }
        let index = if self.carry_normals {
            self.mesh.add_vertex_with_normal(source.point(i as usize), source.normal(i as usize))
        } else {
            self.mesh.add_vertex(source.point(i as usize))
        };
        *slot = index;
        for (name, array) in self.point_data.iter_mut() {
            if let Some(src) = source.point_data.get(name) {
                array.push_from(src, i as usize);
            }
        }
        index
    }

    fn edge_point(&mut self, source: &Mesh, a: u32, b: u32, s: &[f64]) -> u32 {
        let key = (a.min(b), a.max(b));
        if let Some(&index) = self.edge_map.get(&key) {
            return index;
        }
        // Interpolate from the lower index so both sides compute identical points
        let (lo, hi) = (key.0 as usize, key.1 as usize);
        let t = s[lo] / (s[lo] - s[hi]);
        let p = source.point(lo) + (source.point(hi) - source.point(lo)) * t;
        let index = if self.carry_normals {
            let n = source.normal(lo) + (source.normal(hi) - source.normal(lo)) * t;
            let len = n.norm();
            self.mesh.add_vertex_with_normal(p, if len > 1e-20 { n / len } else { n })
        } else {
            self.mesh.add_vertex(p)
        };
        for (name, array) in self.point_data.iter_mut() {
            if let Some(src) = source.point_data.get(name) {
                array.push_interpolated(src, lo, hi, t);
            }
        }
        self.edge_map.insert(key, index);
        index
    }

    fn finish(mut self) -> Mesh {
        self.mesh.point_data = self.point_data;
        self.mesh.cell_data = self.cell_data;
        self.mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane::Plane;
    use nalgebra::{Point3, Vector3};

    fn square() -> Mesh {
        Mesh::from_triangles(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_clip_splits_area() {
        let plane = Plane::new(Point3::new(0.25, 0.0, 0.0), Vector3::x()).unwrap();
        let out = Clipper::new(0.0).with_clipped_output(true).clip(&square(), &plane);
        let clipped = out.clipped.unwrap();
        assert!((out.kept.area() - 0.75).abs() < 1e-12);
        assert!((clipped.area() - 0.25).abs() < 1e-12);
        assert!(out.kept.triangles().all(|t| t.iter().all(|&v| out.kept.point(v as usize).x >= 0.25 - 1e-12)));
    }

    #[test]
    fn test_shared_edges_reuse_points() {
        let plane = Plane::new(Point3::new(0.0, 0.5, 0.0), Vector3::y()).unwrap();
        let out = Clipper::new(0.0).clip(&square(), &plane);
        // The diagonal is cut once, not once per adjacent triangle
        assert_eq!(out.kept.vertex_count(), 5);
    }

    #[test]
    fn test_inside_out_keeps_negative_side() {
        let plane = Plane::new(Point3::new(0.25, 0.0, 0.0), Vector3::x()).unwrap();
        let out = Clipper::new(0.0).inside_out(true).clip(&square(), &plane);
        assert!((out.kept.area() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_vertices_on_level_set_are_not_duplicated() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(1.0, -1.0, 0.0)).unwrap();
        let out = Clipper::new(0.0).with_clipped_output(true).clip(&square(), &plane);
        assert_eq!(out.kept.triangle_count(), 1);
        assert_eq!(out.clipped.unwrap().triangle_count(), 1);
    }

    #[test]
    fn test_cell_data_follows_parent_triangle() {
        let mut mesh = square();
        mesh.cell_data
            .insert("RegionId".into(), crate::mesh::ScalarArray::Int(vec![3, 8]));
        let plane = Plane::new(Point3::new(0.5, 0.0, 0.0), Vector3::x()).unwrap();
        let out = Clipper::new(0.0).clip(&mesh, &plane);
        let ids = out.kept.cell_data.get("RegionId").unwrap();
        assert_eq!(ids.len(), out.kept.triangle_count());
    }

    #[test]
    fn test_extract_positive_cells() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(1.0, -1.0, 0.0)).unwrap();
        let part = extract_positive_cells(&square(), &plane);
        assert_eq!(part.triangle_count(), 1);
    }
}
