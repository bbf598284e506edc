// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Kernel pipelines combining clipping, sectioning, triangulation and cleanup.

use approx::assert_relative_eq;
use dynamic_modeler_geometry::{
    auto_orient_normals, calculate_normals, clean, cut_mesh, extract_largest_region, extrude_along_normals,
    triangulate_loops, Clipper, Mesh, Plane, Point3, Vector3,
};

/// Closed unit cube with outward winding
fn unit_cube() -> Mesh {
    let p = |x: f64, y: f64, z: f64| Point3::new(x, y, z);
    Mesh::from_triangles(
        &[
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(0.0, 1.0, 0.0),
            p(0.0, 0.0, 1.0),
            p(1.0, 0.0, 1.0),
            p(1.0, 1.0, 1.0),
            p(0.0, 1.0, 1.0),
        ],
        &[
            [0, 2, 1], [0, 3, 2], [4, 5, 6], [4, 6, 7],
            [0, 1, 5], [0, 5, 4], [1, 2, 6], [1, 6, 5],
            [2, 3, 7], [2, 7, 6], [3, 0, 4], [3, 4, 7],
        ],
    )
}

/// Flip triangles of a planar patch so they all face `normal`
fn face(mut patch: Mesh, normal: &Vector3<f64>) -> Mesh {
    for t in 0..patch.triangle_count() {
        if patch.triangle_normal(t).dot(normal) < 0.0 {
            patch.indices.swap(t * 3 + 1, t * 3 + 2);
        }
    }
    patch
}

#[test]
fn test_clipped_cube_closes_with_section_cap() {
    let cube = unit_cube();
    let plane = Plane::new(Point3::new(0.0, 0.0, 0.25), Vector3::z()).unwrap();

    let loops = cut_mesh(&cube, &plane);
    assert_eq!(loops.len(), 1);
    assert!(loops[0].closed);

    let cap = face(triangulate_loops(&loops, &plane.normal).unwrap(), &-plane.normal);
    let mut upper = Clipper::new(0.0).clip(&cube, &plane).kept;
    upper.merge(&cap);
    let upper = clean(&upper, 1e-9);

    assert!(upper.boundary_edges().is_empty());
    assert_relative_eq!(upper.signed_volume(), 0.75, epsilon = 1e-9);
    let (min, max) = upper.bounds().unwrap();
    assert_relative_eq!(min.z, 0.25, epsilon = 1e-12);
    assert_relative_eq!(max.z, 1.0, epsilon = 1e-12);
}

#[test]
fn test_both_clip_sides_cover_the_input() {
    let cube = unit_cube();
    let plane = Plane::new(Point3::new(0.3, 0.0, 0.0), Vector3::new(1.0, 1.0, 0.0)).unwrap();
    let split = Clipper::new(0.0).with_clipped_output(true).clip(&cube, &plane);
    let clipped = split.clipped.unwrap();
    assert_relative_eq!(split.kept.area() + clipped.area(), cube.area(), epsilon = 1e-9);
}

#[test]
fn test_thickened_patch_is_a_solid() {
    let mut patch = Mesh::from_triangles(
        &[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
            // Stray triangle away from the patch
            Point3::new(9.0, 0.0, 0.0),
            Point3::new(9.5, 0.0, 0.0),
            Point3::new(9.0, 0.5, 0.0),
        ],
        &[[0, 1, 2], [0, 2, 3], [4, 5, 6]],
    );
    patch = extract_largest_region(&patch);
    assert_eq!(patch.triangle_count(), 2);

    calculate_normals(&mut patch);
    let mut solid = extrude_along_normals(&patch, -0.5).unwrap();
    auto_orient_normals(&mut solid);
    assert!(solid.boundary_edges().is_empty());
    assert_relative_eq!(solid.signed_volume(), 2.0, epsilon = 1e-9);
}
