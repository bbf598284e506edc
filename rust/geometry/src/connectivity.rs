// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connected-region labeling and extraction.
//!
//! Two triangles belong to the same region when they share a point.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::mesh::{Mesh, ScalarArray, REGION_ID_ARRAY};

/// Region labels of a mesh
#[derive(Debug, Clone, Default)]
pub struct RegionLabels {
    /// Region of every triangle
    pub cells: Vec<i64>,
    /// Region of every point; `-1` for points no triangle uses
    pub points: Vec<i64>,
    /// Number of regions
    pub count: usize,
}

impl RegionLabels {
    /// Triangle count per region
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.count];
        for &r in &self.cells {
            sizes[r as usize] += 1;
        }
        sizes
    }

    /// Distinct regions containing the given points, in first-seen order
    pub fn regions_of_points(&self, points: &[usize]) -> SmallVec<[i64; 8]> {
        let mut regions: SmallVec<[i64; 8]> = SmallVec::new();
        for &p in points {
            if let Some(&r) = self.points.get(p) {
                if r >= 0 && !regions.contains(&r) {
                    regions.push(r);
                }
            }
        }
        regions
    }
}

struct DisjointSet {
    parent: Vec<u32>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
        }
    }

    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grand = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grand;
            x = grand;
        }
        x
    }

    fn union(&mut self, a: u32, b: u32) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (lo, hi) = (ra.min(rb), ra.max(rb));
            self.parent[hi as usize] = lo;
        }
    }
}

/// Label regions; ids are assigned in order of each region's first triangle
pub fn label_regions(mesh: &Mesh) -> RegionLabels {
    let mut sets = DisjointSet::new(mesh.vertex_count());
    for [a, b, c] in mesh.triangles() {
        sets.union(a, b);
        sets.union(b, c);
    }

    let mut root_to_region: FxHashMap<u32, i64> = FxHashMap::default();
    let mut cells = Vec::with_capacity(mesh.triangle_count());
    for [a, _, _] in mesh.triangles() {
        let root = sets.find(a);
        let next = root_to_region.len() as i64;
        cells.push(*root_to_region.entry(root).or_insert(next));
    }

    let mut points = vec![-1i64; mesh.vertex_count()];
    for [a, b, c] in mesh.triangles() {
        let region = root_to_region.get(&sets.find(a)).copied().unwrap_or(-1);
        for v in [a, b, c] {
            points[v as usize] = region;
        }
    }

    RegionLabels {
        cells,
        points,
        count: root_to_region.len(),
    }
}

/// Copy of `mesh` with every region painted into the `RegionId` cell array
pub fn color_regions(mesh: &Mesh) -> (Mesh, RegionLabels) {
    let labels = label_regions(mesh);
    let mut colored = mesh.clone();
    colored
        .cell_data
        .insert(REGION_ID_ARRAY.to_string(), ScalarArray::Int(labels.cells.clone()));
    (colored, labels)
}

/// Triangles of the regions containing any of the seed points
pub fn extract_seeded_regions(mesh: &Mesh, seed_points: &[usize]) -> Mesh {
    let labels = label_regions(mesh);
    let seeded = labels.regions_of_points(seed_points);
    let kept: Vec<usize> = (0..mesh.triangle_count())
        .filter(|&t| seeded.contains(&labels.cells[t]))
        .collect();
    mesh.extract_triangles(&kept)
}

/// Triangles of the region with the most triangles (lowest id on ties)
pub fn extract_largest_region(mesh: &Mesh) -> Mesh {
    let labels = label_regions(mesh);
    let sizes = labels.sizes();
    let Some(largest) = (0..sizes.len()).max_by(|&a, &b| sizes[a].cmp(&sizes[b]).then(b.cmp(&a)))
    else {
        return Mesh::new();
    };
    let kept: Vec<usize> = (0..mesh.triangle_count())
        .filter(|&t| labels.cells[t] == largest as i64)
        .collect();
    mesh.extract_triangles(&kept)
}

/// Triangles incident to every undirected edge, keyed `(min, max)`
pub fn edge_triangles(mesh: &Mesh) -> FxHashMap<(u32, u32), SmallVec<[usize; 2]>> {
    let mut edges: FxHashMap<(u32, u32), SmallVec<[usize; 2]>> = FxHashMap::default();
    for (t, [a, b, c]) in mesh.triangles().enumerate() {
        for (u, v) in [(a, b), (b, c), (c, a)] {
            edges.entry((u.min(v), u.max(v))).or_default().push(t);
        }
    }
    edges
}
