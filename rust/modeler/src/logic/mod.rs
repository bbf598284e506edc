// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Modeler logic: binds tools to parameter nodes and re-runs them when
//! their inputs change.
//!
//! All notifications flow through [`ModelerLogic::process_events`], which
//! drains the scene queue on the caller's thread. Tool runs queue further
//! notifications (output meshes) that are handled in the same pass.

mod subscriptions;

pub use subscriptions::{Subscription, SubscriptionTable};

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::ModelerConfig;
use crate::descriptor::ToolDescriptor;
use crate::error::Result;
use crate::registry::ToolRegistry;
use crate::scene::{EntityId, EntityKind, ModelerNode, NodeEvent, Scene, SceneEvent};
use crate::tool::{modeler_node, Tool};

/// Binding state of a parameter node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    /// No tool instance (no or unknown tool name)
    Unbound,
    /// Tool bound, node changed since the last sync
    BoundStale,
    /// Tool bound and synchronized
    BoundCurrent,
}

#[derive(Default)]
struct Binding {
    tool: Option<Box<dyn Tool>>,
    current: bool,
}

/// Input references that also appear as output references.
///
/// A pure function of the descriptor and the node's references.
pub fn circular_references(descriptor: &ToolDescriptor, node: &ModelerNode) -> Vec<EntityId> {
    let inputs: FxHashSet<EntityId> = descriptor
        .inputs
        .iter()
        .flat_map(|slot| node.references(&slot.role))
        .copied()
        .collect();
    let mut shared: Vec<EntityId> = descriptor
        .outputs
        .iter()
        .flat_map(|slot| node.references(&slot.role))
        .copied()
        .filter(|id| inputs.contains(id))
        .collect();
    shared.sort();
    shared.dedup();
    shared
}

/// Scheduler for every parameter node of a scene.
pub struct ModelerLogic {
    registry: Arc<ToolRegistry>,
    config: ModelerConfig,
    bindings: FxHashMap<EntityId, Binding>,
    subscriptions: SubscriptionTable,
}

impl ModelerLogic {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self::with_config(registry, ModelerConfig::default())
    }

    pub fn with_config(registry: Arc<ToolRegistry>, config: ModelerConfig) -> Self {
        Self {
            registry,
            config,
            bindings: FxHashMap::default(),
            subscriptions: SubscriptionTable::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ModelerConfig {
        &self.config
    }

    pub fn subscriptions(&self) -> &SubscriptionTable {
        &self.subscriptions
    }

    pub fn binding_state(&self, node: EntityId) -> BindingState {
        match self.bindings.get(&node) {
            Some(Binding { tool: Some(_), current }) if *current => BindingState::BoundCurrent,
            Some(Binding { tool: Some(_), .. }) => BindingState::BoundStale,
            _ => BindingState::Unbound,
        }
    }

    /// Tool bound to `node`
    pub fn tool(&self, node: EntityId) -> Option<&dyn Tool> {
        self.bindings.get(&node).and_then(|b| b.tool.as_deref())
    }

    /// Drain the scene's notification queue.
    ///
    /// Returns the nodes whose tool ran, in run order. At most
    /// `max_dispatch_events` notifications are handled per call; the rest
    /// stay queued.
    #[tracing::instrument(skip_all, fields(pending = scene.pending_events()))]
    pub fn process_events(&mut self, scene: &mut Scene) -> Vec<EntityId> {
        let mut ran = Vec::new();
        let mut handled = 0usize;
        while handled < self.config.max_dispatch_events {
            let Some(event) = scene.pop_event() else {
                return ran;
            };
            handled += 1;
            tracing::trace!(?event, "dispatch");
            match event {
                SceneEvent::NodeAdded(id) => self.on_node_added(scene, id, &mut ran),
                SceneEvent::NodeRemoved(id) => self.on_node_removed(id),
                SceneEvent::ImportFinished => self.on_import_finished(scene),
                SceneEvent::EntityModified { id, event } => self.on_entity_modified(scene, id, event, &mut ran),
            }
        }
        if scene.pending_events() > 0 {
            tracing::warn!(
                limit = self.config.max_dispatch_events,
                remaining = scene.pending_events(),
                "dispatch limit reached, leaving notifications queued"
            );
        }
        ran
    }

    fn on_node_added(&mut self, scene: &mut Scene, id: EntityId, ran: &mut Vec<EntityId>) {
        if scene.kind(id) != Some(EntityKind::Modeler) {
            return;
        }
        self.bindings.entry(id).or_default();
        if !self.sync_logged(scene, id) {
            return;
        }
        if self.config.run_on_node_added {
            self.run_logged(scene, id, ran);
        }
    }

    fn on_node_removed(&mut self, id: EntityId) {
        if self.bindings.remove(&id).is_some() {
            tracing::debug!(node = ?id, "parameter node removed");
        }
        self.subscriptions.remove_entity(id);
    }

    fn on_import_finished(&mut self, scene: &mut Scene) {
        for node in scene.modeler_nodes() {
            self.sync_logged(scene, node);
        }
    }

    /// Sync and report failures; returns whether the node is bound current
    fn sync_logged(&mut self, scene: &Scene, node: EntityId) -> bool {
        match self.sync(scene, node) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(node = ?node, error = %err, "could not sync parameter node");
                false
            }
        }
    }

    fn on_entity_modified(&mut self, scene: &mut Scene, id: EntityId, event: NodeEvent, ran: &mut Vec<EntityId>) {
        if event == NodeEvent::Modified && self.bindings.contains_key(&id) {
            if let Some(binding) = self.bindings.get_mut(&id) {
                binding.current = false;
            }
            self.on_node_changed(scene, id, ran);
        }
        for node in self.subscriptions.subscribers(id, event) {
            tracing::debug!(node = ?node, input = ?id, ?event, "input changed");
            self.on_node_changed(scene, node, ran);
        }
    }

    /// Re-sync, then run when continuous update is on and safe
    fn on_node_changed(&mut self, scene: &mut Scene, node: EntityId, ran: &mut Vec<EntityId>) {
        if !self.sync_logged(scene, node) {
            return;
        }
        let Some(params) = scene.modeler(node) else {
            return;
        };
        if !params.continuous_update() {
            return;
        }
        if self.has_circular_reference(scene, node) {
            tracing::warn!(node = ?node, "output model is also an input, disabling continuous update");
            if let Err(err) = scene.set_continuous_update(node, false) {
                tracing::error!(node = ?node, error = %err, "could not disable continuous update");
            }
            return;
        }
        self.run_logged(scene, node, ran);
    }

    fn run_logged(&mut self, scene: &mut Scene, node: EntityId, ran: &mut Vec<EntityId>) {
        // Failures are logged by the tool and stay scoped to this node
        if let Ok(true) = self.run_tool(scene, node) {
            ran.push(node);
        }
    }

    /// Reconcile the bound tool with the node's declared tool name and
    /// rebuild the node's input subscriptions.
    ///
    /// References are never discarded: roles keep their ids across tool
    /// switches, only the subscriptions are rebuilt.
    #[tracing::instrument(skip(self, scene))]
    pub fn sync(&mut self, scene: &Scene, node: EntityId) -> Result<()> {
        let params = modeler_node(scene, node)?;
        let declared = params.tool_name().unwrap_or_default();
        let binding = self.bindings.entry(node).or_default();

        let matches = binding.tool.as_ref().is_some_and(|tool| tool.name() == declared);
        if !matches {
            self.subscriptions.unsubscribe_node(node);
            binding.tool = if declared.is_empty() {
                None
            } else {
                let tool = self.registry.create_by_name(declared);
                if tool.is_none() {
                    tracing::error!(node = ?node, tool = declared, "no tool registered under this name");
                }
                tool
            };
            if let Some(tool) = &binding.tool {
                tracing::debug!(node = ?node, tool = tool.name(), "bound tool");
            }
        }

        self.subscriptions.unsubscribe_node(node);
        if let Some(tool) = &binding.tool {
            for slot in &tool.descriptor().inputs {
                for &entity in params.references(&slot.role) {
                    self.subscriptions.subscribe(entity, node, &slot.role, &slot.events);
                }
            }
        }
        binding.current = true;
        Ok(())
    }

    /// Run the node's tool now. A no-op when required inputs are missing.
    #[tracing::instrument(skip(self, scene))]
    pub fn run(&mut self, scene: &mut Scene, node: EntityId) -> Result<()> {
        self.run_tool(scene, node).map(|_| ())
    }

    /// Returns whether the tool actually ran
    fn run_tool(&mut self, scene: &mut Scene, node: EntityId) -> Result<bool> {
        if self.binding_state(node) != BindingState::BoundCurrent {
            self.sync(scene, node)?;
        }
        let Some(tool) = self.bindings.get_mut(&node).and_then(|b| b.tool.as_mut()) else {
            tracing::debug!(node = ?node, "no tool bound, nothing to run");
            return Ok(false);
        };
        if !tool.has_required_inputs(modeler_node(scene, node)?) {
            tracing::debug!(node = ?node, tool = tool.name(), "required inputs missing, not running");
            return Ok(false);
        }
        tracing::debug!(node = ?node, tool = tool.name(), "running tool");
        tool.run(scene, node)?;
        Ok(true)
    }

    /// Whether any input reference of the node is also one of its outputs
    pub fn has_circular_reference(&self, scene: &Scene, node: EntityId) -> bool {
        let (Some(tool), Some(params)) = (self.tool(node), scene.modeler(node)) else {
            return false;
        };
        !circular_references(tool.descriptor(), params).is_empty()
    }

    /// Run every parameter node with a bound tool, regardless of continuous update
    pub fn run_all(&mut self, scene: &mut Scene) -> Vec<EntityId> {
        let mut ran = Vec::new();
        for node in scene.modeler_nodes() {
            self.run_logged(scene, node, &mut ran);
        }
        ran
    }
}

impl std::fmt::Debug for ModelerLogic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelerLogic")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("nodes", &self.bindings.len())
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
