// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dynamic Modeler Geometry Kernel
//!
//! Polygonal mesh operations behind the modeling tools: implicit-function
//! clipping and contouring, loop triangulation with earcutr, connectivity,
//! spatial locators, surface geodesics and nalgebra-based transforms.

pub mod clean;
pub mod clip;
pub mod connectivity;
pub mod cut;
pub mod error;
pub mod extrusion;
pub mod geodesic;
pub mod implicit;
pub mod locator;
pub mod mesh;
pub mod normals;
pub mod plane;
pub mod select;
pub mod transform;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, Vector2, Vector3};

pub use clean::{clean, remove_duplicate_cells};
pub use clip::{extract_positive_cells, ClipOutput, Clipper};
pub use connectivity::{color_regions, extract_largest_region, extract_seeded_regions, label_regions, RegionLabels};
pub use cut::{cut_mesh, strip_segments, Polyline};
pub use error::{Error, Result};
pub use extrusion::{extrude_along_normals, warp_along_normals};
pub use geodesic::SurfaceGeodesic;
pub use implicit::{BooleanOperation, ImplicitBoolean, ImplicitFunction, PointCloudDistance};
pub use locator::{CellLocator, PointLocator};
pub use mesh::{Mesh, ScalarArray, REGION_ID_ARRAY};
pub use normals::{auto_orient_normals, calculate_normals};
pub use plane::Plane;
pub use select::{select_by_loop, snap_curve_to_edges, LoopSelection};
pub use triangulation::triangulate_loops;
