// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Margin: grow or shrink a surface along its normals.

use dynamic_modeler_geometry::{calculate_normals, warp_along_normals, Mesh};

use super::{required_reference, write_output};
use crate::descriptor::{InputSlot, OutputSlot, ParameterInfo, ParameterValue, ToolDescriptor};
use crate::error::Result;
use crate::scene::{EntityId, Scene};
use crate::tool::{modeler_node, Tool, ToolKind};

const INPUT_MODEL: &str = "Margin.InputModel";
const OUTPUT_MODEL: &str = "Margin.OutputModel";

const PARAM_MARGIN: usize = 0;

pub struct MarginTool {
    descriptor: ToolDescriptor,
}

impl MarginTool {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor {
                inputs: vec![InputSlot::model("Model", "Model to be grown or shrunk.", INPUT_MODEL)],
                outputs: vec![OutputSlot::model(
                    "Margin model",
                    "Input model with every point moved along its normal by the margin.",
                    OUTPUT_MODEL,
                )],
                parameters: vec![ParameterInfo::new(
                    "Margin",
                    "Distance to move the surface along its normals. Negative values shrink the model.",
                    "Margin",
                    ParameterValue::Double(3.0),
                )],
            },
        }
    }
}

impl Default for MarginTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for MarginTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Margin
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
        let margin = self.parameter_value(PARAM_MARGIN, params).to_double();

        let mut mesh = scene.world_mesh(input_id)?;
        if mesh.is_empty() {
            return write_output(scene, Some(output_id), Mesh::new());
        }
        if !mesh.has_normals() {
            calculate_normals(&mut mesh);
        }

        let mut grown = warp_along_normals(&mesh, margin)?;
        calculate_normals(&mut grown);
        write_output(scene, Some(output_id), grown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{grid, node_with};
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_patch_moves_by_margin() {
        let mut scene = Scene::new();
        let model = scene.add_model("patch", grid(4));
        let (node, outputs) = node_with(&mut scene, "Margin", INPUT_MODEL, model, &[OUTPUT_MODEL]);
        scene.set_attribute(node, "Margin", "-1.5").unwrap();

        MarginTool::new().run(&mut scene, node).unwrap();
        let moved = scene.mesh(outputs[0]).unwrap();
        assert_eq!(moved.vertex_count(), 16);
        for i in 0..moved.vertex_count() {
            assert_relative_eq!(moved.point(i).z, -1.5, epsilon = 1e-12);
        }
        assert!(moved.normal(5).z > 0.99);
    }

    #[test]
    fn test_default_margin() {
        let mut scene = Scene::new();
        let model = scene.add_model("patch", grid(2));
        let (node, outputs) = node_with(&mut scene, "Margin", INPUT_MODEL, model, &[OUTPUT_MODEL]);

        MarginTool::new().run(&mut scene, node).unwrap();
        assert_relative_eq!(scene.mesh(outputs[0]).unwrap().point(0).z, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_input_writes_empty_output() {
        let mut scene = Scene::new();
        let model = scene.add_model("empty", Mesh::new());
        let (node, outputs) = node_with(&mut scene, "Margin", INPUT_MODEL, model, &[OUTPUT_MODEL]);

        MarginTool::new().run(&mut scene, node).unwrap();
        assert!(scene.mesh(outputs[0]).unwrap().is_empty());
    }
}
