// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Implicit functions used to drive clipping and contouring.

use crate::locator::PointLocator;
use crate::plane::Plane;
use nalgebra::Point3;

/// Scalar field over space; the zero level set is the cut surface
pub trait ImplicitFunction {
    fn evaluate(&self, point: &Point3<f64>) -> f64;
}

impl ImplicitFunction for Plane {
    #[inline]
    fn evaluate(&self, point: &Point3<f64>) -> f64 {
        self.signed_distance(point)
    }
}

/// How several implicit functions combine into one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BooleanOperation {
    /// Minimum of all values
    #[default]
    Union,
    /// Maximum of all values
    Intersection,
    /// First value against the negation of the others
    Difference,
}

impl BooleanOperation {
    /// All operations in declaration order
    pub const ALL: [BooleanOperation; 3] = [
        BooleanOperation::Union,
        BooleanOperation::Intersection,
        BooleanOperation::Difference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BooleanOperation::Union => "Union",
            BooleanOperation::Intersection => "Intersection",
            BooleanOperation::Difference => "Difference",
        }
    }

    /// Parse an operation name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

/// Boolean combination of implicit functions.
///
/// With no member functions the combination evaluates to `f64::MAX`, so
/// clipping against it keeps everything.
#[derive(Default)]
pub struct ImplicitBoolean {
    pub operation: BooleanOperation,
    functions: Vec<Box<dyn ImplicitFunction>>,
}

impl ImplicitBoolean {
    pub fn new(operation: BooleanOperation) -> Self {
        Self {
            operation,
            functions: Vec::new(),
        }
    }

    /// Combination of planes
    pub fn from_planes(operation: BooleanOperation, planes: &[Plane]) -> Self {
        let mut combined = Self::new(operation);
        for plane in planes {
            combined.add(Box::new(*plane));
        }
        combined
    }

    pub fn add(&mut self, function: Box<dyn ImplicitFunction>) {
        self.functions.push(function);
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl ImplicitFunction for ImplicitBoolean {
    fn evaluate(&self, point: &Point3<f64>) -> f64 {
        let mut values = self.functions.iter().map(|f| f.evaluate(point));
        let Some(first) = values.next() else {
            return f64::MAX;
        };
        match self.operation {
            BooleanOperation::Union => values.fold(first, f64::min),
            BooleanOperation::Intersection => values.fold(first, f64::max),
            BooleanOperation::Difference => values.fold(first, |acc, v| acc.max(-v)),
        }
    }
}

/// Unsigned distance to the nearest point of a point cloud
pub struct PointCloudDistance {
    locator: PointLocator,
}

impl PointCloudDistance {
    pub fn new(points: Vec<Point3<f64>>) -> Self {
        Self {
            locator: PointLocator::new(points),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.locator.is_empty()
    }
}

impl ImplicitFunction for PointCloudDistance {
    fn evaluate(&self, point: &Point3<f64>) -> f64 {
        self.locator
            .find_closest_point_with_distance(point)
            .map_or(f64::MAX, |(_, d)| d)
    }
}
