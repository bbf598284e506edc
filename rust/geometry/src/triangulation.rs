// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon triangulation utilities
//!
//! Wrapper around earcutr for planar loops, including nested loops where
//! inner loops become holes of the loop that immediately contains them.

use crate::cut::Polyline;
use crate::mesh::Mesh;
use crate::{Error, Point2, Point3, Result, Vector3};

/// Triangulate a polygon with holes.
/// Returns triangle indices into the combined vertex array (outer + all holes)
pub fn triangulate_polygon_with_holes(
    outer: &[Point2<f64>],
    holes: &[Vec<Point2<f64>>],
) -> Result<Vec<usize>> {
    if outer.len() < 3 {
        return Err(Error::TriangulationError(
            "Need at least 3 points in outer boundary".to_string(),
        ));
    }

    // FAST PATH: lone triangle
    if outer.len() == 3 && holes.is_empty() {
        return Ok(vec![0, 1, 2]);
    }

    let total_points = outer.len() + holes.iter().map(Vec::len).sum::<usize>();
    let mut vertices = Vec::with_capacity(total_points * 2);
    for p in outer {
        vertices.push(p.x);
        vertices.push(p.y);
    }

    let mut hole_indices = Vec::with_capacity(holes.len());
    for hole in holes {
        hole_indices.push(vertices.len() / 2);
        for p in hole {
            vertices.push(p.x);
            vertices.push(p.y);
        }
    }

    earcutr::earcut(&vertices, &hole_indices, 2)
        .map_err(|e| Error::TriangulationError(format!("{:?}", e)))
}

/// Orthonormal in-plane axes for a normal, using the world axis least
/// parallel to it as reference
pub fn plane_basis(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let (ax, ay, az) = (normal.x.abs(), normal.y.abs(), normal.z.abs());
    let reference = if ax <= ay && ax <= az {
        Vector3::x()
    } else if ay <= az {
        Vector3::y()
    } else {
        Vector3::z()
    };
    let u_axis = normal.cross(&reference).normalize();
    let v_axis = normal.cross(&u_axis).normalize();
    (u_axis, v_axis)
}

/// Project 3D points using an existing coordinate system
#[inline]
pub fn project_to_2d_with_basis(
    points_3d: &[Point3<f64>],
    u_axis: &Vector3<f64>,
    v_axis: &Vector3<f64>,
    origin: &Point3<f64>,
) -> Vec<Point2<f64>> {
    points_3d
        .iter()
        .map(|p| {
            let v = p - origin;
            Point2::new(v.dot(u_axis), v.dot(v_axis))
        })
        .collect()
}

/// Even-odd point in polygon test
fn point_in_polygon(p: &Point2<f64>, polygon: &[Point2<f64>]) -> bool {
    let mut inside = false;
    let n = polygon.len();
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (&polygon[i], &polygon[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn signed_area(polygon: &[Point2<f64>]) -> f64 {
    let n = polygon.len();
    (0..n)
        .map(|i| {
            let (a, b) = (&polygon[i], &polygon[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        * 0.5
}

/// Triangulate closed planar loops lying in the plane with the given normal.
///
/// Loops nested at an even depth are outer boundaries; loops at an odd depth
/// are holes of the smallest loop containing them. Open or degenerate loops
/// are skipped. Triangle winding is not normalized; callers orient the result.
pub fn triangulate_loops(loops: &[Polyline], normal: &Vector3<f64>) -> Result<Mesh> {
    let rings: Vec<&Polyline> = loops
        .iter()
        .filter(|l| l.closed && l.points.len() >= 3)
        .collect();
    let mut mesh = Mesh::new();
    if rings.is_empty() {
        return Ok(mesh);
    }

    let (u_axis, v_axis) = plane_basis(normal);
    let origin = rings[0].points[0];
    let flat: Vec<Vec<Point2<f64>>> = rings
        .iter()
        .map(|l| project_to_2d_with_basis(&l.points, &u_axis, &v_axis, &origin))
        .collect();
    let areas: Vec<f64> = flat.iter().map(|r| signed_area(r).abs()).collect();

    // Containing loops of each loop, tested with its first point
    let containers: Vec<Vec<usize>> = (0..flat.len())
        .map(|i| {
            (0..flat.len())
                .filter(|&j| j != i && areas[j] > areas[i] && point_in_polygon(&flat[i][0], &flat[j]))
                .collect()
        })
        .collect();

    for (i, ring) in flat.iter().enumerate() {
        if containers[i].len() % 2 == 1 || areas[i] < 1e-18 {
            continue;
        }
        let holes: Vec<usize> = (0..flat.len())
            .filter(|&h| {
                containers[h].len() == containers[i].len() + 1 && containers[h].contains(&i)
            })
            .collect();
        let hole_rings: Vec<Vec<Point2<f64>>> = holes.iter().map(|&h| flat[h].clone()).collect();

        let indices = triangulate_polygon_with_holes(ring, &hole_rings)?;

        let base = mesh.vertex_count() as u32;
        for p in rings[i].points.iter() {
            mesh.add_vertex(*p);
        }
        for &h in &holes {
            for p in rings[h].points.iter() {
                mesh.add_vertex(*p);
            }
        }
        for tri in indices.chunks_exact(3) {
            mesh.add_triangle(base + tri[0] as u32, base + tri[1] as u32, base + tri[2] as u32);
        }
    }

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64, offset: f64, z: f64) -> Polyline {
        Polyline {
            points: vec![
                Point3::new(offset, offset, z),
                Point3::new(offset + size, offset, z),
                Point3::new(offset + size, offset + size, z),
                Point3::new(offset, offset + size, z),
            ],
            closed: true,
        }
    }

    #[test]
    fn test_triangulate_square_with_hole() {
        let outer = vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ];
        let hole = vec![
            Point2::new(3.0, 3.0),
            Point2::new(7.0, 3.0),
            Point2::new(7.0, 7.0),
            Point2::new(3.0, 7.0),
        ];

        let indices = triangulate_polygon_with_holes(&outer, &[hole]).unwrap();
        assert!(indices.len() > 6);
        assert_eq!(indices.len() % 3, 0);
    }

    #[test]
    fn test_triangulate_insufficient_points() {
        let points = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        assert!(triangulate_polygon_with_holes(&points, &[]).is_err());
    }

    #[test]
    fn test_loops_with_hole_cover_ring_area() {
        let loops = vec![square(10.0, 0.0, 2.0), square(4.0, 3.0, 2.0)];
        let mesh = triangulate_loops(&loops, &Vector3::z()).unwrap();
        assert!((mesh.area() - 84.0).abs() < 1e-9);
        assert_eq!(mesh.vertex_count(), 8);
    }

    #[test]
    fn test_disjoint_loops_are_separate_outers() {
        let loops = vec![square(1.0, 0.0, 0.0), square(1.0, 5.0, 0.0)];
        let mesh = triangulate_loops(&loops, &Vector3::z()).unwrap();
        assert!((mesh.area() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_open_loops_are_skipped() {
        let mut open = square(1.0, 0.0, 0.0);
        open.closed = false;
        let mesh = triangulate_loops(&[open], &Vector3::z()).unwrap();
        assert!(mesh.is_empty());
    }
}
