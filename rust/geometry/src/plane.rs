// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Oriented planes

use crate::error::{Error, Result};
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

/// Plane through `origin` with unit `normal`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Point on the plane
    pub origin: Point3<f64>,
    /// Unit normal; the positive half-space lies on this side
    pub normal: Vector3<f64>,
}

impl Plane {
    /// Create a plane, normalizing the normal. Fails for a zero-length normal.
    pub fn new(origin: Point3<f64>, normal: Vector3<f64>) -> Result<Self> {
        let len = normal.norm();
        if !len.is_finite() || len < 1e-12 {
            return Err(Error::InvalidPlane(format!(
                "normal ({}, {}, {}) has no direction",
                normal.x, normal.y, normal.z
            )));
        }
        Ok(Self {
            origin,
            normal: normal / len,
        })
    }

    /// Signed distance from point to plane.
    /// Positive = in front, Negative = behind
    #[inline]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        (point - self.origin).dot(&self.normal)
    }

    /// Check if point is in front of the plane
    #[inline]
    pub fn is_front(&self, point: &Point3<f64>) -> bool {
        self.signed_distance(point) >= 0.0
    }

    /// Same plane facing the other way
    pub fn flipped(&self) -> Self {
        Self {
            origin: self.origin,
            normal: -self.normal,
        }
    }

    /// Plane mapped through a homogeneous transform
    pub fn transformed(&self, matrix: &Matrix4<f64>) -> Result<Self> {
        let origin = matrix.transform_point(&self.origin);
        let linear: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = linear.try_inverse().ok_or(Error::SingularTransform)?.transpose();
        Self::new(origin, normal_matrix * self.normal)
    }
}
