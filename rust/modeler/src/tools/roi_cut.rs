// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ROI cut: split a model into the parts inside and outside a box.

use dynamic_modeler_geometry::{BooleanOperation, Mesh, Plane};

use super::plane_cut::cut_with_planes;
use super::{required_reference, write_output};
use crate::descriptor::{InputSlot, OutputSlot, ParameterInfo, ParameterValue, ToolDescriptor};
use crate::error::Result;
use crate::scene::{EntityId, EntityKind, Scene};
use crate::tool::{modeler_node, Tool, ToolKind};

const INPUT_MODEL: &str = "ROICut.InputModel";
const INPUT_ROI: &str = "ROICut.InputROI";
const OUTPUT_INSIDE_MODEL: &str = "ROICut.OutputPositiveModel";
const OUTPUT_OUTSIDE_MODEL: &str = "ROICut.OutputNegativeModel";

const PARAM_CAP_SURFACE: usize = 0;

pub struct RoiCutTool {
    descriptor: ToolDescriptor,
}

impl RoiCutTool {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor {
                inputs: vec![
                    InputSlot::model("Model node", "Model node to be cut.", INPUT_MODEL),
                    InputSlot::marker("ROI node", "ROI node to cut the model node.", INPUT_ROI, &[EntityKind::Roi]),
                ],
                outputs: vec![
                    OutputSlot::model(
                        "Clipped output model (inside)",
                        "Portion of the cut model that is inside the ROI.",
                        OUTPUT_INSIDE_MODEL,
                    ),
                    OutputSlot::model(
                        "Clipped output model (outside)",
                        "Portion of the cut model that is outside the ROI.",
                        OUTPUT_OUTSIDE_MODEL,
                    ),
                ],
                parameters: vec![ParameterInfo::new(
                    "Cap surface",
                    "Create a closed surface by triangulating the clipped region",
                    "ROICut.CapSurface",
                    ParameterValue::Bool(true),
                )],
            },
        }
    }
}

impl Default for RoiCutTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for RoiCutTool {
    fn kind(&self) -> ToolKind {
        ToolKind::RoiCut
    }

    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    fn create_instance(&self) -> Box<dyn Tool> {
        Box::new(Self::new())
    }

    fn execute(&mut self, scene: &mut Scene, node: EntityId) -> Result<()> {
        let params = modeler_node(scene, node)?;
        let inside_id = params.reference(OUTPUT_INSIDE_MODEL);
        let outside_id = params.reference(OUTPUT_OUTSIDE_MODEL);
        if inside_id.is_none() && outside_id.is_none() {
            return Ok(());
        }
        let input_id = required_reference(self.name(), params, INPUT_MODEL)?;
        let roi_id = required_reference(self.name(), params, INPUT_ROI)?;
        let cap = self.parameter_value(PARAM_CAP_SURFACE, params).to_bool();

        let mesh = scene.world_mesh(input_id)?;
        if mesh.is_empty() {
            write_output(scene, inside_id, Mesh::new())?;
            return write_output(scene, outside_id, Mesh::new());
        }

        // Face planes point out of the box; flipped, the inside is where all are positive
        let planes: Vec<Plane> = scene.world_roi_planes(roi_id)?.iter().map(Plane::flipped).collect();
        let (inside, outside) = cut_with_planes(&mesh, &planes, BooleanOperation::Union, cap, outside_id.is_some())?;
        write_output(scene, inside_id, inside)?;
        write_output(scene, outside_id, outside.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::RoiMarker;
    use crate::tools::test_support::{cube, node_with};
    use approx::assert_relative_eq;
    use dynamic_modeler_geometry::{clean, Point3, Vector3};

    #[test]
    fn test_box_bottom_face_cuts_cube() {
        let mut scene = Scene::new();
        let model = scene.add_model("cube", cube(0.0, 1.0));
        // Only the bottom face (z = 0.3) of the box crosses the cube
        let roi = scene.add_roi(
            "roi",
            RoiMarker::axis_aligned(Point3::new(0.5, 0.5, 1.3), Vector3::new(1.5, 1.5, 1.0)),
        );
        let (node, outputs) = node_with(
            &mut scene,
            "ROI cut",
            INPUT_MODEL,
            model,
            &[OUTPUT_INSIDE_MODEL, OUTPUT_OUTSIDE_MODEL],
        );
        scene.set_reference(node, INPUT_ROI, Some(roi)).unwrap();

        RoiCutTool::new().run(&mut scene, node).unwrap();
        let inside = scene.mesh(outputs[0]).unwrap();
        let outside = scene.mesh(outputs[1]).unwrap();
        assert_relative_eq!(inside.signed_volume(), 0.7, epsilon = 1e-9);
        assert_relative_eq!(outside.signed_volume(), 0.3, epsilon = 1e-9);
        assert!(clean(inside, 1e-9).boundary_edges().is_empty());
        assert!(clean(outside, 1e-9).boundary_edges().is_empty());
    }

    #[test]
    fn test_cap_can_be_disabled() {
        let mut scene = Scene::new();
        let model = scene.add_model("cube", cube(0.0, 1.0));
        let roi = scene.add_roi(
            "roi",
            RoiMarker::axis_aligned(Point3::new(0.5, 0.5, 1.3), Vector3::new(1.5, 1.5, 1.0)),
        );
        let (node, outputs) = node_with(&mut scene, "ROI cut", INPUT_MODEL, model, &[OUTPUT_INSIDE_MODEL]);
        scene.set_reference(node, INPUT_ROI, Some(roi)).unwrap();
        scene.set_attribute(node, "ROICut.CapSurface", "false").unwrap();

        RoiCutTool::new().run(&mut scene, node).unwrap();
        let inside = scene.mesh(outputs[0]).unwrap();
        assert!(!clean(inside, 1e-9).boundary_edges().is_empty());
    }
}
