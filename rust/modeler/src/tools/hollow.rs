// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hollow: turn a surface into a shell of fixed thickness.

use dynamic_modeler_geometry::{auto_orient_normals, calculate_normals, extrude_along_normals, Mesh};

use super::{required_reference, write_output};
use crate::descriptor::{InputSlot, OutputSlot, ParameterInfo, ParameterValue, ToolDescriptor};
use crate::error::Result;
use crate::scene::{EntityId, Scene};
use crate::tool::{modeler_node, Tool, ToolKind};

const INPUT_MODEL: &str = "Hollow.InputModel";
const OUTPUT_MODEL: &str = "Hollow.OutputModel";

const PARAM_SHELL_THICKNESS: usize = 0;

pub struct HollowTool {
    descriptor: ToolDescriptor,
}

impl HollowTool {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor {
                inputs: vec![InputSlot::model("Model", "Model to be hollowed.", INPUT_MODEL)],
                outputs: vec![OutputSlot::model(
                    "Hollowed model",
                    "Input model with its boundary surface converted to a shell. Surface normals must be computed for the model, for example using Surface Toolbox module.",
                    OUTPUT_MODEL,
                )],
                parameters: vec![ParameterInfo::new(
                    "Shell thickness",
                    "Shell thickness of the generated hollow model. Keep the value low to avoid self-intersection.",
                    "ShellThickness",
                    ParameterValue::Double(1.0),
                )],
            },
        }
    }
}

impl Default for HollowTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for HollowTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Hollow
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
        let thickness = self.parameter_value(PARAM_SHELL_THICKNESS, params).to_double();

        let mut mesh = scene.world_mesh(input_id)?;
        if mesh.is_empty() {
            return write_output(scene, Some(output_id), Mesh::new());
        }
        if !mesh.has_normals() {
            tracing::warn!(model = ?input_id, "input has no normals, computing them");
            calculate_normals(&mut mesh);
        }

        let mut shell = extrude_along_normals(&mesh, thickness)?;
        auto_orient_normals(&mut shell);
        write_output(scene, Some(output_id), shell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{grid, node_with};
    use approx::assert_relative_eq;

    #[test]
    fn test_patch_becomes_closed_slab() {
        let mut scene = Scene::new();
        let mut patch = grid(3);
        calculate_normals(&mut patch);
        let model = scene.add_model("patch", patch);
        let (node, outputs) = node_with(&mut scene, "Hollow", INPUT_MODEL, model, &[OUTPUT_MODEL]);
        scene.set_attribute(node, "ShellThickness", "0.5").unwrap();

        HollowTool::new().run(&mut scene, node).unwrap();
        let shell = scene.mesh(outputs[0]).unwrap();
        assert!(shell.boundary_edges().is_empty());
        assert!(shell.has_normals());
        // 2 x 2 patch extruded by 0.5
        assert_relative_eq!(shell.signed_volume(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_normals_are_computed() {
        let mut scene = Scene::new();
        let model = scene.add_model("patch", grid(3));
        let (node, outputs) = node_with(&mut scene, "Hollow", INPUT_MODEL, model, &[OUTPUT_MODEL]);

        HollowTool::new().run(&mut scene, node).unwrap();
        let shell = scene.mesh(outputs[0]).unwrap();
        assert_relative_eq!(shell.signed_volume(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_input_writes_empty_output() {
        let mut scene = Scene::new();
        let model = scene.add_model("empty", Mesh::new());
        let (node, outputs) = node_with(&mut scene, "Hollow", INPUT_MODEL, model, &[OUTPUT_MODEL]);

        HollowTool::new().run(&mut scene, node).unwrap();
        assert!(scene.mesh(outputs[0]).unwrap().is_empty());
    }
}
