// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Select by points: mark the surface around point markers.
//!
//! Points closer to any fiducial than the selection distance get `1` in the
//! `Selection` point array, all others `0`. Distance is either straight-line
//! (sphere radius) or measured along mesh edges (geodesic). The point locator
//! and the edge graph are kept between runs and rebuilt only when the input
//! surface changes, so dragging a fiducial or editing the distance is cheap.

use std::hash::{Hash, Hasher};

use dynamic_modeler_geometry::{Mesh, PointLocator, ScalarArray, SurfaceGeodesic};
use rustc_hash::FxHasher;

use super::{required_reference, write_output};
use crate::descriptor::{InputSlot, OutputSlot, ParameterInfo, ParameterValue, ToolDescriptor};
use crate::error::Result;
use crate::scene::{EntityId, EntityKind, Scene};
use crate::tool::{modeler_node, Tool, ToolKind};

const INPUT_MODEL: &str = "SelectByPoints.InputModel";
const INPUT_FIDUCIAL: &str = "SelectByPoints.InputFiducial";
const OUTPUT_SELECTION_SCALARS_MODEL: &str = "SelectByPoints.SelectionScalarsModel";
const OUTPUT_SELECTED_FACES_MODEL: &str = "SelectByPoints.SelectedFacesModel";

const PARAM_SELECTION_DISTANCE: usize = 0;
const PARAM_SELECTION_ALGORITHM: usize = 1;

const SPHERE_RADIUS: &str = "SphereRadius";
const GEODESIC_DISTANCE: &str = "GeodesicDistance";

/// Point array holding the selection flags
pub const SELECTION_ARRAY: &str = "Selection";

/// Search structures built for one input surface
struct SurfaceCache {
    mesh_hash: u64,
    locator: PointLocator,
    geodesic: Option<SurfaceGeodesic>,
}

pub struct SelectByPointsTool {
    descriptor: ToolDescriptor,
    cache: Option<SurfaceCache>,
}

impl SelectByPointsTool {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor {
                inputs: vec![
                    InputSlot::model("Model", "Surface to select faces on.", INPUT_MODEL),
                    InputSlot::marker(
                        "Fiducials",
                        "Points around which faces are selected.",
                        INPUT_FIDUCIAL,
                        &[EntityKind::PointList],
                    ),
                ],
                outputs: vec![
                    OutputSlot::model(
                        "Selection scalars model",
                        "Input surface with the Selection point scalar: 1 for selected points, 0 for others.",
                        OUTPUT_SELECTION_SCALARS_MODEL,
                    ),
                    OutputSlot::model(
                        "Selected faces model",
                        "Part of the input surface whose points are all selected.",
                        OUTPUT_SELECTED_FACES_MODEL,
                    ),
                ],
                parameters: vec![
                    ParameterInfo::new(
                        "Selection distance",
                        "Points closer to a fiducial than this distance are selected.",
                        "SelectionDistance",
                        ParameterValue::Double(5.0),
                    ),
                    ParameterInfo::string_enum(
                        "Selection algorithm",
                        "SphereRadius measures straight-line distance, GeodesicDistance measures distance along the surface.",
                        "SelectionAlgorithm",
                        &[SPHERE_RADIUS, GEODESIC_DISTANCE],
                        SPHERE_RADIUS,
                    ),
                ],
            },
            cache: None,
        }
    }

    /// Cached search structures for `mesh`, rebuilt when the surface changed
    fn surface(&mut self, mesh: &Mesh) -> &mut SurfaceCache {
        let mesh_hash = compute_mesh_hash(mesh);
        if self.cache.as_ref().map_or(true, |cache| cache.mesh_hash != mesh_hash) {
            tracing::debug!(points = mesh.vertex_count(), "building point locator");
            self.cache = None;
        }
        self.cache.get_or_insert_with(|| SurfaceCache {
            mesh_hash,
            locator: PointLocator::from_mesh(mesh),
            geodesic: None,
        })
    }
}

impl Default for SelectByPointsTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for SelectByPointsTool {
    fn kind(&self) -> ToolKind {
        ToolKind::SelectByPoints
    }

    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    fn create_instance(&self) -> Box<dyn Tool> {
        Box::new(Self::new())
    }

    fn execute(&mut self, scene: &mut Scene, node: EntityId) -> Result<()> {
        let params = modeler_node(scene, node)?;
        let scalars_id = params.reference(OUTPUT_SELECTION_SCALARS_MODEL);
        let faces_id = params.reference(OUTPUT_SELECTED_FACES_MODEL);
        if scalars_id.is_none() && faces_id.is_none() {
            return Ok(());
        }
        let input_id = required_reference(self.name(), params, INPUT_MODEL)?;
        let fiducial_id = required_reference(self.name(), params, INPUT_FIDUCIAL)?;
        let distance = self.parameter_value(PARAM_SELECTION_DISTANCE, params).to_double();
        let geodesic = self.parameter_value(PARAM_SELECTION_ALGORITHM, params).as_str() == GEODESIC_DISTANCE;

        let mut mesh = scene.world_mesh(input_id)?;
        if mesh.is_empty() {
            write_output(scene, scalars_id, Mesh::new())?;
            return write_output(scene, faces_id, Mesh::new());
        }
        let fiducials = scene.world_points(fiducial_id)?;

        let surface = self.surface(&mesh);
        let mut selected = vec![0u8; mesh.vertex_count()];
        if geodesic {
            // Fronts start at the closest vertex, already carrying the gap to the fiducial
            let seeds: Vec<(u32, f64)> = fiducials
                .iter()
                .filter_map(|p| surface.locator.find_closest_point_with_distance(p))
                .map(|(v, gap)| (v as u32, gap))
                .collect();
            let graph = surface.geodesic.get_or_insert_with(|| SurfaceGeodesic::new(&mesh));
            for (flag, d) in selected.iter_mut().zip(graph.distances(&seeds, distance)) {
                if d.is_finite() {
                    *flag = 1;
                }
            }
        } else {
            for p in &fiducials {
                for v in surface.locator.find_points_within_radius(p, distance) {
                    selected[v] = 1;
                }
            }
        }
        tracing::debug!(
            fiducials = fiducials.len(),
            selected = selected.iter().filter(|&&s| s == 1).count(),
            geodesic,
            "selection updated"
        );

        let faces = faces_id.map(|_| {
            let kept: Vec<usize> = (0..mesh.triangle_count())
                .filter(|&t| mesh.triangle(t).iter().all(|&v| selected[v as usize] == 1))
                .collect();
            mesh.extract_triangles(&kept)
        });
        mesh.point_data.insert(SELECTION_ARRAY.to_string(), ScalarArray::UInt8(selected));
        write_output(scene, scalars_id, mesh)?;
        write_output(scene, faces_id, faces.unwrap_or_default())
    }
}

/// Hash of the surface geometry and connectivity
fn compute_mesh_hash(mesh: &Mesh) -> u64 {
    let mut hasher = FxHasher::default();
    mesh.positions.len().hash(&mut hasher);
    mesh.indices.len().hash(&mut hasher);
    for pos in &mesh.positions {
        pos.to_bits().hash(&mut hasher);
    }
    for idx in &mesh.indices {
        idx.hash(&mut hasher);
    }
    hasher.finish()
}
