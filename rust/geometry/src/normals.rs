// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vertex normals and winding orientation.

use std::collections::VecDeque;

use crate::connectivity::{edge_triangles, label_regions};
use crate::mesh::Mesh;
use nalgebra::{Point3, Vector3};

/// Recompute area-weighted vertex normals from the triangle winding
pub fn calculate_normals(mesh: &mut Mesh) {
    let vertex_count = mesh.vertex_count();
    if vertex_count == 0 {
        mesh.normals.clear();
        return;
    }

    let mut normals = vec![Vector3::<f64>::zeros(); vertex_count];
    for t in 0..mesh.triangle_count() {
        let [i0, i1, i2] = mesh.triangle(t);
        let [v0, v1, v2] = mesh.triangle_points(t);
        // Unnormalized cross product weights by area
        let normal = (v1 - v0).cross(&(v2 - v0));
        normals[i0 as usize] += normal;
        normals[i1 as usize] += normal;
        normals[i2 as usize] += normal;
    }

    mesh.normals.clear();
    mesh.normals.reserve(vertex_count * 3);
    for normal in normals {
        let len = normal.norm();
        let n = if len > 1e-20 { normal / len } else { Vector3::z() };
        mesh.normals.extend_from_slice(&[n.x, n.y, n.z]);
    }
}

/// Make neighbouring triangles agree on winding by flood fill across
/// manifold edges. Each connected patch takes the winding of its first triangle.
pub fn orient_consistently(mesh: &mut Mesh) {
    let edges = edge_triangles(mesh);
    let count = mesh.triangle_count();
    let mut visited = vec![false; count];

    for start in 0..count {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut queue = VecDeque::from([start]);
        while let Some(t) = queue.pop_front() {
            let tri = mesh.triangle(t);
            for k in 0..3 {
                let (u, v) = (tri[k], tri[(k + 1) % 3]);
                let Some(neighbors) = edges.get(&(u.min(v), u.max(v))) else {
                    continue;
                };
                if neighbors.len() != 2 {
                    continue;
                }
                for &n in neighbors.iter().filter(|&&n| n != t) {
                    if visited[n] {
                        continue;
                    }
                    visited[n] = true;
                    // A consistent neighbour walks the shared edge as v -> u
                    if traverses(mesh.triangle(n), u, v) {
                        mesh.indices.swap(n * 3 + 1, n * 3 + 2);
                    }
                    queue.push_back(n);
                }
            }
        }
    }
}

fn traverses(tri: [u32; 3], u: u32, v: u32) -> bool {
    (0..3).any(|k| tri[k] == u && tri[(k + 1) % 3] == v)
}

/// Orient every connected region so its normals face away from the solid.
///
/// Regions nested inside an odd number of other regions are cavities and are
/// turned to face inward. Normals are recomputed afterwards.
pub fn auto_orient_normals(mesh: &mut Mesh) {
    orient_consistently(mesh);
    let labels = label_regions(mesh);

    let mut region_triangles: Vec<Vec<usize>> = vec![Vec::new(); labels.count];
    for (t, &r) in labels.cells.iter().enumerate() {
        region_triangles[r as usize].push(t);
    }

    let flips: Vec<bool> = (0..labels.count)
        .map(|r| {
            let volume: f64 = region_triangles[r]
                .iter()
                .map(|&t| {
                    let [a, b, c] = mesh.triangle_points(t);
                    a.coords.dot(&b.coords.cross(&c.coords)) / 6.0
                })
                .sum();
            let sample = mesh.triangle_points(region_triangles[r][0])[0];
            let depth = (0..labels.count)
                .filter(|&other| other != r && encloses(mesh, &region_triangles[other], &sample))
                .count();
            let outward = depth % 2 == 0;
            (volume < 0.0) == outward
        })
        .collect();

    for (t, &r) in labels.cells.iter().enumerate() {
        if flips[r as usize] {
            mesh.indices.swap(t * 3 + 1, t * 3 + 2);
        }
    }
    calculate_normals(mesh);
}

/// Ray-parity test of `p` against a closed set of triangles
fn encloses(mesh: &Mesh, triangles: &[usize], p: &Point3<f64>) -> bool {
    // Skewed direction avoids grazing axis-aligned edges
    let dir = Vector3::new(1.0, 0.001_234_5, 0.000_678_9).normalize();
    let hits = triangles
        .iter()
        .filter(|&&t| {
            let [a, b, c] = mesh.triangle_points(t);
            ray_hits_triangle(p, &dir, &a, &b, &c)
        })
        .count();
    hits % 2 == 1
}

/// Möller-Trumbore ray/triangle intersection for `t > 0`
fn ray_hits_triangle(
    origin: &Point3<f64>,
    dir: &Vector3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> bool {
    let e1 = b - a;
    let e2 = c - a;
    let h = dir.cross(&e2);
    let det = e1.dot(&h);
    if det.abs() < 1e-14 {
        return false;
    }
    let inv = 1.0 / det;
    let s = origin - a;
    let u = inv * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return false;
    }
    let q = s.cross(&e1);
    let v = inv * dir.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return false;
    }
    inv * e2.dot(&q) > 1e-12
}
