// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Surface-following distances over the edge graph of a mesh.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use smallvec::SmallVec;

use crate::mesh::Mesh;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Frontier {
    distance: f64,
    vertex: u32,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap; ties broken by vertex for determinism
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Edge graph of a mesh with Euclidean edge lengths.
///
/// Building the graph is the expensive part; distance queries reuse it.
#[derive(Debug, Clone, Default)]
pub struct SurfaceGeodesic {
    neighbors: Vec<SmallVec<[(u32, f64); 8]>>,
}

impl SurfaceGeodesic {
    pub fn new(mesh: &Mesh) -> Self {
        let mut neighbors: Vec<SmallVec<[(u32, f64); 8]>> = vec![SmallVec::new(); mesh.vertex_count()];
        for [a, b, c] in mesh.triangles() {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                if neighbors[u as usize].iter().any(|&(w, _)| w == v) {
                    continue;
                }
                let length = (mesh.point(u as usize) - mesh.point(v as usize)).norm();
                neighbors[u as usize].push((v, length));
                neighbors[v as usize].push((u, length));
            }
        }
        Self { neighbors }
    }

    pub fn vertex_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Distance from the nearest seed to every vertex.
    ///
    /// Seeds are `(vertex, initial distance)`. Propagation stops beyond
    /// `stop_distance`; unreached vertices get `f64::INFINITY`.
    pub fn distances(&self, seeds: &[(u32, f64)], stop_distance: f64) -> Vec<f64> {
        let mut distance = vec![f64::INFINITY; self.neighbors.len()];
        let mut heap = BinaryHeap::new();
        for &(v, d) in seeds {
            if (v as usize) < distance.len() && d < distance[v as usize] && d <= stop_distance {
                distance[v as usize] = d;
                heap.push(Frontier { distance: d, vertex: v });
            }
        }

        while let Some(Frontier { distance: d, vertex }) = heap.pop() {
            if d > distance[vertex as usize] {
                continue;
            }
            for &(next, length) in &self.neighbors[vertex as usize] {
                let candidate = d + length;
                if candidate <= stop_distance && candidate < distance[next as usize] {
                    distance[next as usize] = candidate;
                    heap.push(Frontier {
                        distance: candidate,
                        vertex: next,
                    });
                }
            }
        }
        distance
    }

    /// Shortest edge path from `from` to `to`, both ends included
    pub fn shortest_path(&self, from: u32, to: u32) -> Option<Vec<u32>> {
        let count = self.neighbors.len();
        if from as usize >= count || to as usize >= count {
            return None;
        }
        if from == to {
            return Some(vec![from]);
        }

        let mut distance = vec![f64::INFINITY; count];
        let mut previous = vec![u32::MAX; count];
        let mut heap = BinaryHeap::new();
        distance[from as usize] = 0.0;
        heap.push(Frontier { distance: 0.0, vertex: from });

        while let Some(Frontier { distance: d, vertex }) = heap.pop() {
            if vertex == to {
                break;
            }
            if d > distance[vertex as usize] {
                continue;
            }
            for &(next, length) in &self.neighbors[vertex as usize] {
                let candidate = d + length;
                if candidate < distance[next as usize] {
                    distance[next as usize] = candidate;
                    previous[next as usize] = vertex;
                    heap.push(Frontier {
                        distance: candidate,
                        vertex: next,
                    });
                }
            }
        }

        if !distance[to as usize].is_finite() {
            return None;
        }
        let mut path = vec![to];
        let mut current = to;
        while current != from {
            current = previous[current as usize];
            path.push(current);
        }
        path.reverse();
        Some(path)
    }
}
