// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Curve cut: keep the part of a surface enclosed by a closed curve.

use dynamic_modeler_geometry::{clean, extract_largest_region, select_by_loop, Clipper, Mesh};

use super::{required_reference, write_output};
use crate::descriptor::{InputSlot, OutputSlot, ToolDescriptor};
use crate::error::Result;
use crate::scene::{EntityId, EntityKind, Scene};
use crate::tool::{modeler_node, Tool, ToolKind};

const INPUT_MODEL: &str = "CurveCut.InputModel";
const INPUT_CURVE: &str = "CurveCut.InputCurve";
const OUTPUT_MODEL: &str = "CurveCut.OutputModel";

pub struct CurveCutTool {
    descriptor: ToolDescriptor,
}

impl CurveCutTool {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor {
                inputs: vec![
                    InputSlot::model("Model node", "Model node to be cut with the curve.", INPUT_MODEL),
                    InputSlot::marker(
                        "Curve node",
                        "Closed curve node that outlines the region to keep.",
                        INPUT_CURVE,
                        &[EntityKind::ClosedCurve],
                    ),
                ],
                outputs: vec![OutputSlot::model(
                    "Model node",
                    "Output model containing the region inside the curve.",
                    OUTPUT_MODEL,
                )],
                parameters: Vec::new(),
            },
        }
    }
}

impl Default for CurveCutTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for CurveCutTool {
    fn kind(&self) -> ToolKind {
        ToolKind::CurveCut
    }

    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    fn create_instance(&self) -> Box<dyn Tool> {
        Box::new(Self::new())
    }

    fn execute(&mut self, scene: &mut Scene, node: EntityId) -> Result<()> {
        let params = modeler_node(scene, node)?;
        let Some(output_id) = params.reference(OUTPUT_MODEL) else {
            return Ok(());
        };
        let input_id = required_reference(self.name(), params, INPUT_MODEL)?;
        let curve_id = required_reference(self.name(), params, INPUT_CURVE)?;

        let mesh = clean(&scene.world_mesh(input_id)?, 0.0);
        if mesh.is_empty() {
            return write_output(scene, Some(output_id), Mesh::new());
        }
        let (points, _) = scene.world_curve(curve_id)?;
        if points.len() < 3 {
            tracing::warn!(curve = ?curve_id, points = points.len(), "curve encloses nothing, copying input");
            return write_output(scene, Some(output_id), mesh);
        }

        // Open curves close between their last and first point
        let selection = select_by_loop(&mesh, &points)?;
        let inside = Clipper::new(0.0)
            .inside_out(true)
            .clip_by_scalars(&mesh, &selection.scalars)
            .kept;
        write_output(scene, Some(output_id), extract_largest_region(&inside))
    }
}
