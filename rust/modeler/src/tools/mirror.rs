// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mirror: reflect a model across a plane.

use dynamic_modeler_geometry::transform::reflection_matrix;
use dynamic_modeler_geometry::Mesh;

use super::{required_reference, write_output};
use crate::descriptor::{InputSlot, OutputSlot, ToolDescriptor};
use crate::error::{Error, Result};
use crate::scene::{EntityId, EntityKind, Scene};
use crate::tool::{modeler_node, Tool, ToolKind};

const INPUT_MODEL: &str = "Mirror.InputModel";
const INPUT_PLANE: &str = "Mirror.InputPlane";
const OUTPUT_MODEL: &str = "Mirror.OutputModel";

pub struct MirrorTool {
    descriptor: ToolDescriptor,
}

impl MirrorTool {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor {
                inputs: vec![
                    InputSlot::model("Model", "Model to be mirrored.", INPUT_MODEL),
                    InputSlot::marker(
                        "Mirror plane",
                        "Plane to mirror the model node.",
                        INPUT_PLANE,
                        &[EntityKind::Plane, EntityKind::SliceFrame],
                    ),
                ],
                outputs: vec![OutputSlot::model(
                    "Mirrored model",
                    "Input model mirrored across the plane.",
                    OUTPUT_MODEL,
                )],
                parameters: Vec::new(),
            },
        }
    }
}

impl Default for MirrorTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for MirrorTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Mirror
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
        let plane_id = required_reference(self.name(), params, INPUT_PLANE)?;
        let Some(plane) = scene.world_plane(plane_id)? else {
            return Err(Error::InvalidInput {
                role: INPUT_PLANE.to_string(),
                reason: "plane is not defined".to_string(),
            });
        };

        let mut mesh = scene.world_mesh(input_id)?;
        if mesh.is_empty() {
            return write_output(scene, Some(output_id), Mesh::new());
        }
        // The reflection already maps normals; only the winding is inverted
        mesh.transform(&reflection_matrix(&plane));
        mesh.reverse_cells();
        write_output(scene, Some(output_id), mesh)
    }
}
