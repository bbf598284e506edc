// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tool trait and the shared run contract.

use crate::descriptor::{ParameterValue, ToolDescriptor};
use crate::error::{Error, Result};
use crate::scene::{EntityId, EntityKind, ModelerNode, Scene};

/// Identity of a tool implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ToolKind {
    PlaneCut,
    RoiCut,
    BoundaryCut,
    CurveCut,
    Mirror,
    Hollow,
    Margin,
    Append,
    SelectByPoints,
}

impl ToolKind {
    pub const ALL: [ToolKind; 9] = [
        ToolKind::PlaneCut,
        ToolKind::RoiCut,
        ToolKind::BoundaryCut,
        ToolKind::CurveCut,
        ToolKind::Mirror,
        ToolKind::Hollow,
        ToolKind::Margin,
        ToolKind::Append,
        ToolKind::SelectByPoints,
    ];

    /// Display name, also the tool name stored on parameter nodes
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::PlaneCut => "Plane cut",
            ToolKind::RoiCut => "ROI cut",
            ToolKind::BoundaryCut => "Boundary cut",
            ToolKind::CurveCut => "Curve cut",
            ToolKind::Mirror => "Mirror",
            ToolKind::Hollow => "Hollow",
            ToolKind::Margin => "Margin",
            ToolKind::Append => "Append",
            ToolKind::SelectByPoints => "Select by points",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// A modeling operation bound to a parameter node.
///
/// Implementations provide the descriptor and [`Tool::execute`]; the
/// provided [`Tool::run`] enforces the contract shared by every tool:
/// required inputs present, at least one output bound, output display
/// state created, then the tool-specific pipeline.
pub trait Tool: Send + Sync {
    fn kind(&self) -> ToolKind;

    fn descriptor(&self) -> &ToolDescriptor;

    /// Read inputs from the scene, compute and write the outputs.
    fn execute(&mut self, scene: &mut Scene, node: EntityId) -> Result<()>;

    /// Fresh instance of the same tool with no cached state
    fn create_instance(&self) -> Box<dyn Tool>;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn has_required_inputs(&self, node: &ModelerNode) -> bool {
        self.descriptor().has_required_inputs(node)
    }

    fn has_any_output(&self, node: &ModelerNode) -> bool {
        self.descriptor().has_any_output(node)
    }

    fn parameter_value(&self, index: usize, node: &ModelerNode) -> ParameterValue {
        self.descriptor().parameter_value(index, node)
    }

    fn run(&mut self, scene: &mut Scene, node: EntityId) -> Result<()> {
        let params = modeler_node(scene, node)?;
        if let Some(slot) = self.descriptor().missing_required_input(params) {
            tracing::error!(tool = self.name(), role = %slot.role, "required input is not set");
            return Err(Error::MissingRequiredInput {
                tool: self.name(),
                role: slot.role.clone(),
            });
        }
        if !self.has_any_output(params) {
            tracing::error!(tool = self.name(), "no output model is set");
            return Err(Error::MissingOutput { tool: self.name() });
        }

        self.create_output_display(scene, node)?;
        let result = self.execute(scene, node);
        if let Err(err) = &result {
            tracing::error!(tool = self.name(), node = ?node, %err, "tool run failed");
        }
        result
    }

    /// Give every output model display properties, copied from the first
    /// input model when it has some.
    fn create_output_display(&self, scene: &mut Scene, node: EntityId) -> Result<()> {
        let params = modeler_node(scene, node)?;
        let descriptor = self.descriptor();
        let template = descriptor
            .inputs
            .iter()
            .filter(|slot| slot.accepts(EntityKind::Model))
            .flat_map(|slot| params.references(&slot.role))
            .find_map(|&id| scene.display(id))
            .cloned();
        let outputs: Vec<EntityId> = descriptor
            .outputs
            .iter()
            .flat_map(|slot| params.references(&slot.role))
            .copied()
            .filter(|&id| scene.kind(id) == Some(EntityKind::Model))
            .collect();

        for id in outputs {
            if scene.ensure_display(id, template.clone())? {
                tracing::debug!(output = ?id, "created output display");
            }
        }
        Ok(())
    }
}

/// Parameter node `node`, or `NotAModelerNode`
pub(crate) fn modeler_node(scene: &Scene, node: EntityId) -> Result<&ModelerNode> {
    match scene.modeler(node) {
        Some(params) => Ok(params),
        None if scene.contains(node) => Err(Error::NotAModelerNode(node)),
        None => Err(Error::EntityNotFound(node)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("plane cut"), None);
    }
}
