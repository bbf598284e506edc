// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Normal-direction extrusion and warping

use crate::error::{Error, Result};
use crate::mesh::Mesh;

/// Move every vertex along its normal by `distance`.
///
/// The input must carry normals. Point and cell data are preserved.
pub fn warp_along_normals(mesh: &Mesh, distance: f64) -> Result<Mesh> {
    if mesh.is_empty() {
        return Ok(mesh.clone());
    }
    if !mesh.has_normals() {
        return Err(Error::InvalidInput("warp requires vertex normals".to_string()));
    }
    let mut warped = mesh.clone();
    for i in 0..mesh.vertex_count() {
        warped.set_point(i, mesh.point(i) + mesh.normal(i) * distance);
    }
    Ok(warped)
}

/// Extrude a surface along its vertex normals by `distance`, capped at both
/// ends.
///
/// The result holds the original surface, an offset copy, and a wall of
/// quads (as triangle pairs) along every open boundary edge. Windings are
/// arranged so the slab between the two surfaces is a consistently oriented
/// solid: for a positive distance the original surface is turned inward,
/// for a negative distance the offset copy is.
pub fn extrude_along_normals(mesh: &Mesh, distance: f64) -> Result<Mesh> {
    if mesh.is_empty() {
        return Ok(Mesh::new());
    }
    if !mesh.has_normals() {
        return Err(Error::InvalidInput("extrusion requires vertex normals".to_string()));
    }

    let n = mesh.vertex_count() as u32;
    let mut out = Mesh::with_capacity(mesh.vertex_count() * 2, mesh.indices.len() * 2);
    for i in 0..mesh.vertex_count() {
        out.add_vertex(mesh.point(i));
    }
    for i in 0..mesh.vertex_count() {
        out.add_vertex(mesh.point(i) + mesh.normal(i) * distance);
    }

    let outward = distance >= 0.0;
    for [a, b, c] in mesh.triangles() {
        if outward {
            out.add_triangle(a, c, b);
            out.add_triangle(a + n, b + n, c + n);
        } else {
            out.add_triangle(a, b, c);
            out.add_triangle(a + n, c + n, b + n);
        }
    }

    for (a, b) in mesh.boundary_edges() {
        let (a2, b2) = (a + n, b + n);
        if outward {
            out.add_triangle(a, b, b2);
            out.add_triangle(a, b2, a2);
        } else {
            out.add_triangle(a, a2, b2);
            out.add_triangle(a, b2, b);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normals::calculate_normals;
    use nalgebra::Point3;

    fn patch() -> Mesh {
        let mut mesh = Mesh::from_triangles(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[[0, 1, 2], [0, 2, 3]],
        );
        calculate_normals(&mut mesh);
        mesh
    }

    #[test]
    fn test_warp_moves_points() {
        let warped = warp_along_normals(&patch(), 2.5).unwrap();
        assert!((warped.point(0).z - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_warp_requires_normals() {
        let mut mesh = patch();
        mesh.normals.clear();
        assert!(warp_along_normals(&mesh, 1.0).is_err());
    }

    #[test]
    fn test_extruded_patch_is_closed_box() {
        for distance in [0.5, -0.5] {
            let slab = extrude_along_normals(&patch(), distance).unwrap();
            assert_eq!(slab.triangle_count(), 4 + 8);
            assert!(slab.boundary_edges().is_empty());
            assert!((slab.signed_volume() - 0.5).abs() < 1e-12, "distance {distance}");
        }
    }
}
