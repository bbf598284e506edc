// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial locators for nearest-point and nearest-cell queries.
//!
//! [`PointLocator`] buckets points into a uniform grid hash. Closest-point
//! queries walk outward shell by shell from the query cell and stop once no
//! unvisited cell can hold a closer point.

use rustc_hash::FxHashMap;

use crate::mesh::Mesh;
use nalgebra::{Point3, Vector3};

const MAX_SHELL_WALK: i64 = 32;

/// Grid-hash locator over a fixed point set
#[derive(Debug, Clone)]
pub struct PointLocator {
    points: Vec<Point3<f64>>,
    cell_size: f64,
    grid: FxHashMap<(i64, i64, i64), Vec<u32>>,
    min_cell: (i64, i64, i64),
    max_cell: (i64, i64, i64),
}

impl PointLocator {
    /// Build a locator over `points`
    pub fn new(points: Vec<Point3<f64>>) -> Self {
        let cell_size = Self::pick_cell_size(&points);
        let mut locator = Self {
            points: Vec::new(),
            cell_size,
            grid: FxHashMap::default(),
            min_cell: (i64::MAX, i64::MAX, i64::MAX),
            max_cell: (i64::MIN, i64::MIN, i64::MIN),
        };
        for (i, p) in points.iter().enumerate() {
            let cell = locator.cell_coords(p);
            locator.min_cell = (
                locator.min_cell.0.min(cell.0),
                locator.min_cell.1.min(cell.1),
                locator.min_cell.2.min(cell.2),
            );
            locator.max_cell = (
                locator.max_cell.0.max(cell.0),
                locator.max_cell.1.max(cell.1),
                locator.max_cell.2.max(cell.2),
            );
            locator.grid.entry(cell).or_default().push(i as u32);
        }
        locator.points = points;
        locator
    }

    /// Build a locator over the vertices of a mesh
    pub fn from_mesh(mesh: &Mesh) -> Self {
        Self::new(mesh.points())
    }

    /// Aim for a handful of points per occupied cell
    fn pick_cell_size(points: &[Point3<f64>]) -> f64 {
        if points.len() < 2 {
            return 1.0;
        }
        let mut min = points[0];
        let mut max = points[0];
        for p in points {
            min = min.inf(p);
            max = max.sup(p);
        }
        let diagonal = (max - min).norm();
        let per_axis = (points.len() as f64 / 4.0).cbrt().max(1.0);
        let size = diagonal / per_axis;
        if size.is_finite() && size > 1e-9 {
            size
        } else {
            1.0
        }
    }

    /// Number of indexed points
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if no points are indexed
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Indexed point `i`
    #[inline]
    pub fn point(&self, i: usize) -> Point3<f64> {
        self.points[i]
    }

    /// Index of the point closest to `p`
    pub fn find_closest_point(&self, p: &Point3<f64>) -> Option<usize> {
        self.find_closest_point_with_distance(p).map(|(i, _)| i)
    }

    /// Index of the point closest to `p` and its distance
    pub fn find_closest_point_with_distance(&self, p: &Point3<f64>) -> Option<(usize, f64)> {
        if self.points.is_empty() {
            return None;
        }
        let center = self.cell_coords(p);
        let max_ring = [
            (center.0 - self.min_cell.0).abs(),
            (self.max_cell.0 - center.0).abs(),
            (center.1 - self.min_cell.1).abs(),
            (self.max_cell.1 - center.1).abs(),
            (center.2 - self.min_cell.2).abs(),
            (self.max_cell.2 - center.2).abs(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0);

        // Far-away queries would walk many empty shells; a linear scan is cheaper
        if max_ring > MAX_SHELL_WALK {
            return self
                .points
                .iter()
                .enumerate()
                .map(|(i, q)| (i, (q - p).norm_squared()))
                .fold(None, |best: Option<(usize, f64)>, (i, d2)| match best {
                    Some((_, bd)) if bd <= d2 => best,
                    _ => Some((i, d2)),
                })
                .map(|(i, d2)| (i, d2.sqrt()));
        }

        let mut best: Option<(usize, f64)> = None;
        for ring in 0..=max_ring {
            self.visit_shell(center, ring, |i| {
                let d2 = (self.points[i] - p).norm_squared();
                // Ties go to the lower index so results do not depend on bucket order
                let better = match best {
                    None => true,
                    Some((bi, bd)) => d2 < bd || (d2 == bd && i < bi),
                };
                if better {
                    best = Some((i, d2));
                }
            });
            if let Some((_, d2)) = best {
                let reach = ring as f64 * self.cell_size;
                if d2 <= reach * reach {
                    break;
                }
            }
        }
        best.map(|(i, d2)| (i, d2.sqrt()))
    }

    /// Indices of all points within `radius` of `p`, in ascending order
    pub fn find_points_within_radius(&self, p: &Point3<f64>, radius: f64) -> Vec<usize> {
        if self.points.is_empty() || radius < 0.0 {
            return Vec::new();
        }
        let r2 = radius * radius;
        let lo = self.cell_coords(&(p - Vector3::repeat(radius)));
        let hi = self.cell_coords(&(p + Vector3::repeat(radius)));
        let mut found = Vec::new();
        for x in lo.0.max(self.min_cell.0)..=hi.0.min(self.max_cell.0) {
            for y in lo.1.max(self.min_cell.1)..=hi.1.min(self.max_cell.1) {
                for z in lo.2.max(self.min_cell.2)..=hi.2.min(self.max_cell.2) {
                    if let Some(bucket) = self.grid.get(&(x, y, z)) {
                        found.extend(
                            bucket
                                .iter()
                                .map(|&i| i as usize)
                                .filter(|&i| (self.points[i] - p).norm_squared() <= r2),
                        );
                    }
                }
            }
        }
        found.sort_unstable();
        found
    }

    /// Visit every indexed point in the cells at Chebyshev distance `ring`
    fn visit_shell(&self, center: (i64, i64, i64), ring: i64, mut visit: impl FnMut(usize)) {
        for dx in -ring..=ring {
            for dy in -ring..=ring {
                for dz in -ring..=ring {
                    if dx.abs() != ring && dy.abs() != ring && dz.abs() != ring {
                        continue;
                    }
                    if let Some(bucket) = self.grid.get(&(center.0 + dx, center.1 + dy, center.2 + dz)) {
                        for &i in bucket {
                            visit(i as usize);
                        }
                    }
                }
            }
        }
    }

    fn cell_coords(&self, p: &Point3<f64>) -> (i64, i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
            (p.z / self.cell_size).floor() as i64,
        )
    }
}

/// Closest-triangle locator
#[derive(Debug, Clone)]
pub struct CellLocator<'a> {
    mesh: &'a Mesh,
}

impl<'a> CellLocator<'a> {
    pub fn new(mesh: &'a Mesh) -> Self {
        Self { mesh }
    }

    /// Closest triangle to `p`: `(triangle index, closest point, squared distance)`
    pub fn find_closest_cell(&self, p: &Point3<f64>) -> Option<(usize, Point3<f64>, f64)> {
        let mut best: Option<(usize, Point3<f64>, f64)> = None;
        for t in 0..self.mesh.triangle_count() {
            let [a, b, c] = self.mesh.triangle_points(t);
            let q = closest_point_on_triangle(p, &a, &b, &c);
            let d2 = (q - p).norm_squared();
            if best.map_or(true, |(_, _, bd)| d2 < bd) {
                best = Some((t, q, d2));
            }
        }
        best
    }
}

/// Closest point on triangle `abc` to `p` (Voronoi region walk)
pub fn closest_point_on_triangle(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Point3<f64> {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_points() -> Vec<Point3<f64>> {
        let mut points = Vec::new();
        for x in 0..10 {
            for y in 0..10 {
                points.push(Point3::new(x as f64, y as f64, 0.0));
            }
        }
        points
    }

    #[test]
    fn test_closest_point_matches_brute_force() {
        let locator = PointLocator::new(grid_points());
        for q in [
            Point3::new(3.2, 4.7, 0.5),
            Point3::new(-20.0, 3.0, 1.0),
            Point3::new(9.4, 9.6, -3.0),
        ] {
            let found = locator.find_closest_point(&q).unwrap();
            let brute = (0..locator.len())
                .min_by(|&a, &b| {
                    let da = (locator.point(a) - q).norm();
                    let db = (locator.point(b) - q).norm();
                    da.partial_cmp(&db).unwrap()
                })
                .unwrap();
            assert!(((locator.point(found) - q).norm() - (locator.point(brute) - q).norm()).abs() < 1e-12);
        }
    }

    #[test]
    fn test_points_within_radius() {
        let locator = PointLocator::new(grid_points());
        let found = locator.find_points_within_radius(&Point3::new(5.0, 5.0, 0.0), 1.0);
        assert_eq!(found.len(), 5);
    }

    #[test]
    fn test_empty_locator() {
        let locator = PointLocator::new(Vec::new());
        assert!(locator.find_closest_point(&Point3::origin()).is_none());
    }

    #[test]
    fn test_closest_point_on_triangle_regions() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        let inside = closest_point_on_triangle(&Point3::new(0.2, 0.2, 5.0), &a, &b, &c);
        assert!((inside - Point3::new(0.2, 0.2, 0.0)).norm() < 1e-12);
        let corner = closest_point_on_triangle(&Point3::new(-1.0, -1.0, 0.0), &a, &b, &c);
        assert!((corner - a).norm() < 1e-12);
    }
}
