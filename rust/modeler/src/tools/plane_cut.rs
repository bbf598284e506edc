// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plane cut: split a model by one or more planes, optionally capping the
//! cut with triangulated end caps.

use dynamic_modeler_geometry::{
    cut_mesh, triangulate_loops, BooleanOperation, ClipOutput, Clipper, ImplicitBoolean, ImplicitFunction, Mesh,
    Plane, Point3, Vector3,
};

use super::{required_reference, world_planes, write_output};
use crate::descriptor::{InputSlot, OutputSlot, ParameterInfo, ParameterValue, ToolDescriptor};
use crate::error::Result;
use crate::scene::{EntityId, EntityKind, Scene};
use crate::tool::{modeler_node, Tool, ToolKind};

const INPUT_MODEL: &str = "PlaneCut.InputModel";
const INPUT_PLANE: &str = "PlaneCut.InputPlane";
const OUTPUT_POSITIVE_MODEL: &str = "PlaneCut.OutputPositiveModel";
const OUTPUT_NEGATIVE_MODEL: &str = "PlaneCut.OutputNegativeModel";

const PARAM_CAP_SURFACE: usize = 0;
const PARAM_OPERATION_TYPE: usize = 1;

/// Half-width of the band around the combined cut surface that end cap
/// triangles must lie in.
const CAP_TOLERANCE: f64 = 1e-4;

pub struct PlaneCutTool {
    descriptor: ToolDescriptor,
}

impl PlaneCutTool {
    pub fn new() -> Self {
        let operations: Vec<&str> = BooleanOperation::ALL.iter().map(|op| op.as_str()).collect();
        Self {
            descriptor: ToolDescriptor {
                inputs: vec![
                    InputSlot::model("Model node", "Model node to be cut.", INPUT_MODEL),
                    InputSlot::marker(
                        "Plane node",
                        "Plane node to cut the model node.",
                        INPUT_PLANE,
                        &[EntityKind::Plane, EntityKind::SliceFrame],
                    )
                    .repeatable(),
                ],
                outputs: vec![
                    OutputSlot::model(
                        "Clipped output model (positive side)",
                        "Portion of the cut model that is on the same side of the plane as the normal.",
                        OUTPUT_POSITIVE_MODEL,
                    ),
                    OutputSlot::model(
                        "Clipped output model (negative side)",
                        "Portion of the cut model that is on the opposite side of the plane as the normal.",
                        OUTPUT_NEGATIVE_MODEL,
                    ),
                ],
                parameters: vec![
                    ParameterInfo::new(
                        "Cap surface",
                        "Create a closed surface by triangulating the clipped region",
                        "CapSurface",
                        ParameterValue::Bool(true),
                    ),
                    ParameterInfo::string_enum(
                        "Operation type",
                        "Method used for combining the planes",
                        "OperationType",
                        &operations,
                        BooleanOperation::Union.as_str(),
                    ),
                ],
            },
        }
    }
}

impl Default for PlaneCutTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for PlaneCutTool {
    fn kind(&self) -> ToolKind {
        ToolKind::PlaneCut
    }

    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    fn create_instance(&self) -> Box<dyn Tool> {
        Box::new(Self::new())
    }

    fn execute(&mut self, scene: &mut Scene, node: EntityId) -> Result<()> {
        let params = modeler_node(scene, node)?;
        let positive_id = params.reference(OUTPUT_POSITIVE_MODEL);
        let negative_id = params.reference(OUTPUT_NEGATIVE_MODEL);
        if positive_id.is_none() && negative_id.is_none() {
            return Ok(());
        }
        let input_id = required_reference(self.name(), params, INPUT_MODEL)?;
        let cap = self.parameter_value(PARAM_CAP_SURFACE, params).to_bool();
        let operation = BooleanOperation::from_name(self.parameter_value(PARAM_OPERATION_TYPE, params).as_str())
            .unwrap_or_default();
        let planes = world_planes(scene, params, INPUT_PLANE)?;

        let mesh = scene.world_mesh(input_id)?;
        if mesh.is_empty() {
            write_output(scene, positive_id, Mesh::new())?;
            return write_output(scene, negative_id, Mesh::new());
        }

        tracing::debug!(planes = planes.len(), operation = operation.as_str(), cap, "plane cut");
        let (positive, negative) = cut_with_planes(&mesh, &planes, operation, cap, negative_id.is_some())?;
        write_output(scene, positive_id, positive)?;
        write_output(scene, negative_id, negative.unwrap_or_default())
    }
}

/// Split `mesh` by `planes` combined with `operation`.
///
/// Returns the part where the combined function is non-negative and, when
/// `want_negative` is set, the complementary part. With `cap` set both parts
/// are closed with end caps: the positive cap faces against the plane
/// normals, the negative part gets the same cap reversed. Without planes
/// the whole mesh is positive.
pub fn cut_with_planes(
    mesh: &Mesh,
    planes: &[Plane],
    operation: BooleanOperation,
    cap: bool,
    want_negative: bool,
) -> Result<(Mesh, Option<Mesh>)> {
    let function = ImplicitBoolean::from_planes(operation, planes);
    let ClipOutput { kept, clipped } = Clipper::new(0.0)
        .with_clipped_output(want_negative)
        .clip(mesh, &function);
    if !cap || planes.is_empty() {
        return Ok((kept, clipped));
    }

    let end_cap = create_end_cap(mesh, planes, operation)?;
    let mut positive = kept;
    positive.merge(&end_cap);
    let negative = clipped.map(|mut negative| {
        let mut reversed = end_cap.clone();
        reversed.reverse_sense();
        negative.merge(&reversed);
        negative
    });
    Ok((positive, negative))
}

/// Triangulated patches sealing the cut of `mesh` by the combined planes.
///
/// Each plane's section of the mesh is triangulated, split along every other
/// plane and reduced to the triangles where the combined function is zero,
/// so only the faces of the cut region remain.
pub(crate) fn create_end_cap(mesh: &Mesh, planes: &[Plane], operation: BooleanOperation) -> Result<Mesh> {
    let function = ImplicitBoolean::from_planes(operation, planes);
    let mut end_cap = Mesh::new();

    for (i, plane) in planes.iter().enumerate() {
        let loops = cut_mesh(mesh, plane);
        if loops.is_empty() {
            continue;
        }
        let mut patch = match triangulate_loops(&loops, &plane.normal) {
            Ok(patch) => patch,
            Err(err) => {
                tracing::warn!(plane = i, %err, "could not triangulate section, leaving it open");
                continue;
            }
        };

        for (j, other) in planes.iter().enumerate() {
            if i == j {
                continue;
            }
            let split = Clipper::new(0.0).with_clipped_output(true).clip(&patch, other);
            patch = split.kept;
            if let Some(rest) = split.clipped {
                patch.merge(&rest);
            }
        }

        // After the seams every triangle lies on one side of each plane,
        // so its centroid classifies it
        let on_surface: Vec<usize> = (0..patch.triangle_count())
            .filter(|&t| {
                let [a, b, c] = patch.triangle_points(t);
                let centroid = Point3::from((a.coords + b.coords + c.coords) / 3.0);
                function.evaluate(&centroid).abs() <= CAP_TOLERANCE
            })
            .collect();
        patch = patch.extract_triangles(&on_surface);
        if patch.triangle_count() == 0 {
            continue;
        }

        let desired = if operation == BooleanOperation::Difference && i != 0 {
            plane.normal
        } else {
            -plane.normal
        };
        orient_patch(&mut patch, &desired);
        end_cap.merge(&patch);
    }

    Ok(end_cap)
}

/// Wind every triangle to face `normal` and give every point that normal
fn orient_patch(patch: &mut Mesh, normal: &Vector3<f64>) {
    for t in 0..patch.triangle_count() {
        if patch.triangle_normal(t).dot(normal) < 0.0 {
            patch.indices.swap(t * 3 + 1, t * 3 + 2);
        }
    }
    patch.normals = std::iter::repeat([normal.x, normal.y, normal.z])
        .take(patch.vertex_count())
        .flatten()
        .collect();
}
