// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tool registry - factory for tool instances
//!
//! Holds one prototype per tool kind and hands out fresh instances by kind
//! or by display name. Build it once at startup and share it with the
//! modeler logic through an `Arc`.

use rustc_hash::FxHashMap;

use crate::descriptor::ToolDescriptor;
use crate::error::{Error, Result};
use crate::tool::{Tool, ToolKind};
use crate::tools::{
    AppendTool, BoundaryCutTool, CurveCutTool, HollowTool, MarginTool, MirrorTool, PlaneCutTool, RoiCutTool,
    SelectByPointsTool,
};

/// Published description of a registered tool
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ToolSummary {
    pub kind: ToolKind,
    pub name: String,
    pub descriptor: ToolDescriptor,
}

/// Tool prototypes keyed by kind
#[derive(Default)]
pub struct ToolRegistry {
    prototypes: FxHashMap<ToolKind, Box<dyn Tool>>,
    /// Registration order
    order: Vec<ToolKind>,
}

impl ToolRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the nine built-in tools
    pub fn with_builtin_tools() -> Self {
        let mut registry = Self::new();
        let builtin: [Box<dyn Tool>; 9] = [
            Box::new(AppendTool::new()),
            Box::new(BoundaryCutTool::new()),
            Box::new(CurveCutTool::new()),
            Box::new(HollowTool::new()),
            Box::new(MarginTool::new()),
            Box::new(MirrorTool::new()),
            Box::new(PlaneCutTool::new()),
            Box::new(RoiCutTool::new()),
            Box::new(SelectByPointsTool::new()),
        ];
        for tool in builtin {
            if let Err(err) = registry.register(tool) {
                tracing::error!(error = %err, "built-in tool registration failed");
            }
        }
        registry
    }

    /// Register a prototype; fails if its kind is already present
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<()> {
        let kind = tool.kind();
        if self.prototypes.contains_key(&kind) {
            tracing::error!(tool = tool.name(), "tool is already registered");
            return Err(Error::AlreadyRegistered(kind));
        }
        tracing::debug!(tool = tool.name(), "registered tool");
        self.prototypes.insert(kind, tool);
        self.order.push(kind);
        Ok(())
    }

    /// Remove the prototype of `kind`; returns whether one was registered
    pub fn unregister(&mut self, kind: ToolKind) -> bool {
        self.order.retain(|&k| k != kind);
        self.prototypes.remove(&kind).is_some()
    }

    pub fn contains(&self, kind: ToolKind) -> bool {
        self.prototypes.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }

    /// New instance of the tool registered for `kind`
    pub fn create_by_kind(&self, kind: ToolKind) -> Option<Box<dyn Tool>> {
        self.prototypes.get(&kind).map(|prototype| prototype.create_instance())
    }

    /// New instance of the tool whose display name is `name`
    pub fn create_by_name(&self, name: &str) -> Option<Box<dyn Tool>> {
        self.order
            .iter()
            .filter_map(|kind| self.prototypes.get(kind))
            .find(|prototype| prototype.name() == name)
            .map(|prototype| prototype.create_instance())
    }

    /// Display names in registration order
    pub fn names(&self) -> Vec<&'static str> {
        self.order
            .iter()
            .filter_map(|kind| self.prototypes.get(kind))
            .map(|prototype| prototype.name())
            .collect()
    }

    /// Registered kinds in registration order
    pub fn kinds(&self) -> Vec<ToolKind> {
        self.order.clone()
    }

    /// Names and descriptors of every registered tool
    pub fn catalogue(&self) -> Vec<ToolSummary> {
        self.order
            .iter()
            .filter_map(|kind| self.prototypes.get(kind))
            .map(|prototype| ToolSummary {
                kind: prototype.kind(),
                name: prototype.name().to_string(),
                descriptor: prototype.descriptor().clone(),
            })
            .collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.names()).finish()
    }
}
