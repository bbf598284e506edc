// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Selecting the part of a surface enclosed by a curve.
//!
//! The curve is snapped onto the mesh as a loop of edges (closest vertex per
//! curve point, joined by shortest edge paths). The loop splits the surface
//! into edge-connected regions; the smallest region bordering the loop is the
//! selection.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use crate::connectivity::edge_triangles;
use crate::error::{Error, Result};
use crate::geodesic::SurfaceGeodesic;
use crate::locator::PointLocator;
use crate::mesh::Mesh;
use nalgebra::Point3;

/// Vertex sequence following `points` along mesh edges.
///
/// Consecutive duplicates are dropped; a closed curve does not repeat its
/// first vertex at the end.
pub fn snap_curve_to_edges(
    geodesic: &SurfaceGeodesic,
    locator: &PointLocator,
    points: &[Point3<f64>],
    closed: bool,
) -> Vec<u32> {
    let mut anchors: Vec<u32> = Vec::with_capacity(points.len());
    for p in points {
        if let Some(v) = locator.find_closest_point(p) {
            if anchors.last() != Some(&(v as u32)) {
                anchors.push(v as u32);
            }
        }
    }
    if closed && anchors.len() > 1 && anchors.first() == anchors.last() {
        anchors.pop();
    }
    if anchors.len() < 2 {
        return anchors;
    }

    let mut legs: Vec<(u32, u32)> = anchors.windows(2).map(|w| (w[0], w[1])).collect();
    if closed {
        legs.push((anchors[anchors.len() - 1], anchors[0]));
    }

    let mut path = vec![anchors[0]];
    for (from, to) in legs {
        match geodesic.shortest_path(from, to) {
            Some(leg) => path.extend(leg.into_iter().skip(1)),
            None => path.push(to),
        }
    }
    if closed && path.len() > 1 && path.first() == path.last() {
        path.pop();
    }
    path
}

/// Signed selection scalars of a loop selection
#[derive(Debug, Clone)]
pub struct LoopSelection {
    /// Per-vertex distance to the loop, negative inside the selection and zero on it
    pub scalars: Vec<f64>,
    /// Mesh vertices forming the snapped loop
    pub loop_vertices: Vec<u32>,
}

/// Select the smallest region of `mesh` bounded by the closed curve `points`
pub fn select_by_loop(mesh: &Mesh, points: &[Point3<f64>]) -> Result<LoopSelection> {
    if mesh.triangle_count() == 0 {
        return Err(Error::EmptyMesh("loop selection needs a surface".to_string()));
    }
    let locator = PointLocator::from_mesh(mesh);
    let geodesic = SurfaceGeodesic::new(mesh);
    let loop_vertices = snap_curve_to_edges(&geodesic, &locator, points, true);
    if loop_vertices.len() < 3 {
        return Err(Error::InvalidInput(format!(
            "curve snaps to {} mesh vertices, at least 3 are needed",
            loop_vertices.len()
        )));
    }

    let n = loop_vertices.len();
    let loop_edges: FxHashSet<(u32, u32)> = (0..n)
        .map(|i| {
            let (a, b) = (loop_vertices[i], loop_vertices[(i + 1) % n]);
            (a.min(b), a.max(b))
        })
        .collect();

    // Flood fill triangles without crossing the loop
    let edges = edge_triangles(mesh);
    let mut region = vec![usize::MAX; mesh.triangle_count()];
    let mut sizes: Vec<usize> = Vec::new();
    for start in 0..mesh.triangle_count() {
        if region[start] != usize::MAX {
            continue;
        }
        let id = sizes.len();
        sizes.push(0);
        region[start] = id;
        let mut queue = VecDeque::from([start]);
        while let Some(t) = queue.pop_front() {
            sizes[id] += 1;
            let tri = mesh.triangle(t);
            for k in 0..3 {
                let (u, v) = (tri[k], tri[(k + 1) % 3]);
                let key = (u.min(v), u.max(v));
                if loop_edges.contains(&key) {
                    continue;
                }
                if let Some(neighbors) = edges.get(&key) {
                    for &other in neighbors {
                        if region[other] == usize::MAX {
                            region[other] = id;
                            queue.push_back(other);
                        }
                    }
                }
            }
        }
    }

    // Only regions bordering the loop compete; other components stay outside
    let mut bordering: Vec<usize> = Vec::new();
    for key in &loop_edges {
        for &t in edges.get(key).into_iter().flatten() {
            if !bordering.contains(&region[t]) {
                bordering.push(region[t]);
            }
        }
    }
    if bordering.len() < 2 {
        return Err(Error::InvalidInput("curve does not split the surface".to_string()));
    }

    let selected = bordering
        .iter()
        .copied()
        .min_by(|&a, &b| sizes[a].cmp(&sizes[b]).then(a.cmp(&b)))
        .unwrap_or(0);

    let mut inside = vec![false; mesh.vertex_count()];
    for (t, &r) in region.iter().enumerate() {
        if r == selected {
            for v in mesh.triangle(t) {
                inside[v as usize] = true;
            }
        }
    }
    let on_loop: FxHashSet<u32> = loop_vertices.iter().copied().collect();
    let loop_points: Vec<Point3<f64>> = loop_vertices.iter().map(|&v| mesh.point(v as usize)).collect();

    let scalars = (0..mesh.vertex_count())
        .map(|i| {
            if on_loop.contains(&(i as u32)) {
                return 0.0;
            }
            let d = distance_to_closed_polyline(&mesh.point(i), &loop_points);
            if inside[i] {
                -d
            } else {
                d
            }
        })
        .collect();

    Ok(LoopSelection {
        scalars,
        loop_vertices,
    })
}

fn distance_to_closed_polyline(p: &Point3<f64>, polyline: &[Point3<f64>]) -> f64 {
    let n = polyline.len();
    (0..n)
        .map(|i| {
            let (a, b) = (polyline[i], polyline[(i + 1) % n]);
            let ab = b - a;
            let len2 = ab.norm_squared();
            let t = if len2 > 0.0 { ((p - a).dot(&ab) / len2).clamp(0.0, 1.0) } else { 0.0 };
            (a + ab * t - p).norm()
        })
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: u32) -> Mesh {
        let mut mesh = Mesh::new();
        for y in 0..n {
            for x in 0..n {
                mesh.add_vertex(Point3::new(x as f64, y as f64, 0.0));
            }
        }
        for y in 0..n - 1 {
            for x in 0..n - 1 {
                let i = y * n + x;
                mesh.add_triangle(i, i + 1, i + n + 1);
                mesh.add_triangle(i, i + n + 1, i + n);
            }
        }
        mesh
    }

    fn square_curve() -> Vec<Point3<f64>> {
        vec![
            Point3::new(3.0, 3.0, 0.2),
            Point3::new(6.0, 3.0, 0.2),
            Point3::new(6.0, 6.0, 0.2),
            Point3::new(3.0, 6.0, 0.2),
        ]
    }

    #[test]
    fn test_snap_closed_curve() {
        let mesh = grid(10);
        let locator = PointLocator::from_mesh(&mesh);
        let geodesic = SurfaceGeodesic::new(&mesh);
        let path = snap_curve_to_edges(&geodesic, &locator, &square_curve(), true);
        assert_eq!(path.len(), 12);
        assert_ne!(path.first(), path.last());
    }

    #[test]
    fn test_select_inner_square() {
        let mesh = grid(10);
        let selection = select_by_loop(&mesh, &square_curve()).unwrap();
        // Vertex (4, 4) lies inside, (0, 0) outside, (3, 3) on the loop
        assert!(selection.scalars[4 * 10 + 4] < 0.0);
        assert!(selection.scalars[0] > 0.0);
        assert_eq!(selection.scalars[3 * 10 + 3], 0.0);
    }

    #[test]
    fn test_separate_component_is_not_selected() {
        let mut mesh = grid(10);
        let a = mesh.add_vertex(Point3::new(100.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(101.0, 0.0, 0.0));
        let c = mesh.add_vertex(Point3::new(100.0, 1.0, 0.0));
        mesh.add_triangle(a, b, c);

        let selection = select_by_loop(&mesh, &square_curve()).unwrap();
        assert!(selection.scalars[4 * 10 + 4] < 0.0);
        assert!(selection.scalars[a as usize] > 0.0);
        assert!(selection.scalars[0] > 0.0);
    }

    #[test]
    fn test_loop_on_the_rim_does_not_split() {
        let mut mesh = grid(4);
        let a = mesh.add_vertex(Point3::new(100.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(101.0, 0.0, 0.0));
        let c = mesh.add_vertex(Point3::new(100.0, 1.0, 0.0));
        mesh.add_triangle(a, b, c);

        let rim = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(3.0, 3.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
        ];
        assert!(matches!(select_by_loop(&mesh, &rim), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_degenerate_curve_is_rejected() {
        let mesh = grid(4);
        let curve = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.1, 0.0, 0.0)];
        assert!(select_by_loop(&mesh, &curve).is_err());
    }
}
