// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Contouring a mesh against an implicit function and chaining the
//! resulting segments into polylines.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::implicit::ImplicitFunction;
use crate::mesh::Mesh;
use nalgebra::Point3;

/// Chain of points; `closed` loops repeat no point at the end
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point3<f64>>,
    pub closed: bool,
}

impl Polyline {
    /// Mean of the points
    pub fn center(&self) -> Point3<f64> {
        if self.points.is_empty() {
            return Point3::origin();
        }
        let sum = self.points.iter().fold(nalgebra::Vector3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / self.points.len() as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CutPoint {
    Vertex(u32),
    Edge(u32, u32),
}

/// Intersect `mesh` with the zero level set of `function`.
///
/// Vertices with a value of exactly zero are treated as lying on the
/// positive side; intersection points landing on such vertices reuse the
/// vertex so loops stay connected.
pub fn cut_mesh(mesh: &Mesh, function: &dyn ImplicitFunction) -> Vec<Polyline> {
    let values: Vec<f64> = (0..mesh.vertex_count())
        .map(|i| function.evaluate(&mesh.point(i)))
        .collect();

    let mut ids: FxHashMap<CutPoint, u32> = FxHashMap::default();
    let mut points: Vec<Point3<f64>> = Vec::new();
    let mut segments: Vec<(u32, u32)> = Vec::new();

    let mut intern = |key: CutPoint, points: &mut Vec<Point3<f64>>| -> u32 {
        *ids.entry(key).or_insert_with(|| {
            let p = match key {
                CutPoint::Vertex(v) => mesh.point(v as usize),
                CutPoint::Edge(lo, hi) => {
                    let (lo, hi) = (lo as usize, hi as usize);
                    let t = values[lo] / (values[lo] - values[hi]);
                    mesh.point(lo) + (mesh.point(hi) - mesh.point(lo)) * t
                }
            };
            points.push(p);
            (points.len() - 1) as u32
        })
    };

    for tri in mesh.triangles() {
        let mut crossing: smallvec::SmallVec<[CutPoint; 2]> = smallvec::SmallVec::new();
        for k in 0..3 {
            let (a, b) = (tri[k], tri[(k + 1) % 3]);
            let (sa, sb) = (values[a as usize], values[b as usize]);
            if (sa >= 0.0) == (sb >= 0.0) {
                continue;
            }
            let (lo, hi) = (a.min(b), a.max(b));
            let key = if values[lo as usize] == 0.0 {
                CutPoint::Vertex(lo)
            } else if values[hi as usize] == 0.0 {
                CutPoint::Vertex(hi)
            } else {
                CutPoint::Edge(lo, hi)
            };
            crossing.push(key);
        }
        if crossing.len() == 2 && crossing[0] != crossing[1] {
            let a = intern(crossing[0], &mut points);
            let b = intern(crossing[1], &mut points);
            segments.push((a, b));
        }
    }

    strip_segments(&points, &segments)
}

/// Chain segments that share end points into polylines.
///
/// Open chains are traced from their dangling ends first, then the remaining
/// segments are traced as closed loops. Duplicate segments are ignored.
pub fn strip_segments(points: &[Point3<f64>], segments: &[(u32, u32)]) -> Vec<Polyline> {
    let mut adjacency: FxHashMap<u32, Vec<(u32, usize)>> = FxHashMap::default();
    let mut seen: FxHashSet<(u32, u32)> = FxHashSet::default();
    let mut unique: Vec<(u32, u32)> = Vec::new();
    for &(a, b) in segments {
        if a == b {
            continue;
        }
        let key = (a.min(b), a.max(b));
        if !seen.insert(key) {
            continue;
        }
        adjacency.entry(a).or_default().push((b, unique.len()));
        adjacency.entry(b).or_default().push((a, unique.len()));
        unique.push((a, b));
    }

    let mut used = vec![false; unique.len()];
    let mut polylines = Vec::new();

    let trace = |start: u32, used: &mut Vec<bool>| -> Vec<u32> {
        let mut chain = vec![start];
        let mut current = start;
        loop {
            let next = adjacency
                .get(&current)
                .and_then(|edges| edges.iter().find(|&&(_, e)| !used[e]).copied());
            match next {
                Some((other, e)) => {
                    used[e] = true;
                    chain.push(other);
                    current = other;
                    if current == start {
                        break;
                    }
                }
                None => break,
            }
        }
        chain
    };

    // Dangling ends first, in segment order
    for &(a, b) in &unique {
        for end in [a, b] {
            let degree = adjacency.get(&end).map_or(0, Vec::len);
            if degree == 1 {
                let has_free = adjacency
                    .get(&end)
                    .map_or(false, |edges| edges.iter().any(|&(_, e)| !used[e]));
                if has_free {
                    let chain = trace(end, &mut used);
                    polylines.push(to_polyline(points, chain));
                }
            }
        }
    }

    for (e, &(a, _)) in unique.iter().enumerate() {
        if !used[e] {
            let chain = trace(a, &mut used);
            polylines.push(to_polyline(points, chain));
        }
    }

    polylines
}

fn to_polyline(points: &[Point3<f64>], mut chain: Vec<u32>) -> Polyline {
    let closed = chain.len() > 2 && chain.first() == chain.last();
    if closed {
        chain.pop();
    }
    Polyline {
        points: chain.into_iter().map(|i| points[i as usize]).collect(),
        closed,
    }
}
