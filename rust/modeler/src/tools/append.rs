// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Append: combine several models into one.

use dynamic_modeler_geometry::{clean, remove_duplicate_cells, Mesh};

use super::write_output;
use crate::descriptor::{InputSlot, OutputSlot, ToolDescriptor};
use crate::error::Result;
use crate::scene::{EntityId, Scene};
use crate::tool::{modeler_node, Tool, ToolKind};

const INPUT_MODEL: &str = "Append.InputModel";
const OUTPUT_MODEL: &str = "Append.OutputModel";

pub struct AppendTool {
    descriptor: ToolDescriptor,
}

impl AppendTool {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor {
                inputs: vec![
                    InputSlot::model("Model node", "Model nodes to be appended.", INPUT_MODEL).repeatable(),
                ],
                outputs: vec![OutputSlot::model(
                    "Appended model",
                    "Output model combining the geometry of all input models.",
                    OUTPUT_MODEL,
                )],
                parameters: Vec::new(),
            },
        }
    }
}

impl Default for AppendTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for AppendTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Append
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
        let inputs = params.references(INPUT_MODEL).to_vec();

        let mut combined = Mesh::new();
        for id in inputs {
            combined.merge(&scene.world_mesh(id)?);
        }
        let combined = remove_duplicate_cells(&clean(&combined, 0.0));
        write_output(scene, Some(output_id), combined)
    }
}
