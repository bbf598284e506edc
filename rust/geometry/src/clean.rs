// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh cleaning: coincident point merging, degenerate and duplicate cell
//! removal.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::mesh::Mesh;

/// Merge points closer than `tolerance`, drop triangles that collapse and
/// points no longer referenced.
///
/// The first point of every cluster survives, together with its normal and
/// point data. A tolerance of zero merges exactly coincident points only.
pub fn clean(mesh: &Mesh, tolerance: f64) -> Mesh {
    let cell_size = if tolerance > 0.0 { tolerance } else { 1.0 };
    let tol_sq = tolerance * tolerance;
    let mut grid: FxHashMap<(i64, i64, i64), Vec<u32>> = FxHashMap::default();
    let mut exact: FxHashMap<[u64; 3], u32> = FxHashMap::default();
    let mut representative = vec![0u32; mesh.vertex_count()];

    for i in 0..mesh.vertex_count() {
        let p = mesh.point(i);
        if tolerance <= 0.0 {
            let key = [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()];
            representative[i] = *exact.entry(key).or_insert(i as u32);
            continue;
        }

        let cell = (
            (p.x / cell_size).floor() as i64,
            (p.y / cell_size).floor() as i64,
            (p.z / cell_size).floor() as i64,
        );
        let mut found = None;
        'search: for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(bucket) = grid.get(&(cell.0 + dx, cell.1 + dy, cell.2 + dz)) {
                        for &j in bucket {
                            if (mesh.point(j as usize) - p).norm_squared() <= tol_sq {
                                found = Some(j);
                                break 'search;
                            }
                        }
                    }
                }
            }
        }
        representative[i] = match found {
            Some(j) => j,
            None => {
                grid.entry(cell).or_default().push(i as u32);
                i as u32
            }
        };
    }

    let mut remapped = mesh.clone();
    for index in remapped.indices.iter_mut() {
        *index = representative[*index as usize];
    }
    let kept: Vec<usize> = (0..remapped.triangle_count())
        .filter(|&t| {
            let [a, b, c] = remapped.triangle(t);
            a != b && b != c && a != c
        })
        .collect();
    remapped.extract_triangles(&kept)
}

/// Remove triangles that repeat the vertex set of an earlier triangle
pub fn remove_duplicate_cells(mesh: &Mesh) -> Mesh {
    let mut seen: FxHashSet<[u32; 3]> = FxHashSet::default();
    let kept: Vec<usize> = (0..mesh.triangle_count())
        .filter(|&t| {
            let mut key = mesh.triangle(t);
            key.sort_unstable();
            seen.insert(key)
        })
        .collect();
    if kept.len() == mesh.triangle_count() {
        return mesh.clone();
    }
    mesh.extract_triangles(&kept)
}
