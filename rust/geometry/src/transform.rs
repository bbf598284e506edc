// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Homogeneous transform helpers
//!
//! All matrices are column-vector 4x4 transforms mapping a child frame into
//! its parent frame.

use crate::error::{Error, Result};
use crate::plane::Plane;
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

/// Invert a transform, failing for singular matrices
pub fn invert(matrix: &Matrix4<f64>) -> Result<Matrix4<f64>> {
    matrix.try_inverse().ok_or(Error::SingularTransform)
}

/// Check whether a matrix is the identity within `1e-12`
pub fn is_identity(matrix: &Matrix4<f64>) -> bool {
    (matrix - Matrix4::identity()).abs().max() < 1e-12
}

/// Reflection across a plane: translate to the origin, apply the
/// Householder matrix `I - 2nnᵀ`, translate back.
pub fn reflection_matrix(plane: &Plane) -> Matrix4<f64> {
    let n = plane.normal;
    let householder: Matrix3<f64> = Matrix3::identity() - 2.0 * n * n.transpose();

    let mut reflect = Matrix4::identity();
    reflect.fixed_view_mut::<3, 3>(0, 0).copy_from(&householder);

    let to_origin = Matrix4::new_translation(&(-plane.origin.coords));
    let back = Matrix4::new_translation(&plane.origin.coords);
    back * reflect * to_origin
}

/// Build a rigid frame from an origin, a z axis and a reference x axis.
///
/// The x axis is projected onto the plane perpendicular to z; if the two are
/// parallel an arbitrary perpendicular direction is used.
pub fn frame_from_axes(
    origin: Point3<f64>,
    z_axis: Vector3<f64>,
    x_axis: Vector3<f64>,
) -> Result<Matrix4<f64>> {
    let z_len = z_axis.norm();
    if z_len < 1e-12 {
        return Err(Error::InvalidInput("frame z axis has no direction".to_string()));
    }
    let z = z_axis / z_len;

    let x_projected = x_axis - z * x_axis.dot(&z);
    let x = if x_projected.norm() > 1e-6 {
        x_projected.normalize()
    } else if z.z.abs() < 0.9 {
        Vector3::z().cross(&z).normalize()
    } else {
        Vector3::x().cross(&z).normalize()
    };
    let y = z.cross(&x).normalize();

    #[rustfmt::skip]
    let frame = Matrix4::new(
        x.x, y.x, z.x, origin.x,
        x.y, y.y, z.y, origin.y,
        x.z, y.z, z.z, origin.z,
        0.0, 0.0, 0.0, 1.0,
    );
    Ok(frame)
}

/// Transform a direction (ignores translation)
#[inline]
pub fn transform_vector(matrix: &Matrix4<f64>, v: &Vector3<f64>) -> Vector3<f64> {
    matrix.transform_vector(v)
}
