// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Change notifications queued by the scene.

use super::EntityId;

/// Kind of change reported for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeEvent {
    /// Any property changed (names, flags, references, attributes)
    Modified,
    /// A model's mesh was replaced
    MeshModified,
    /// A transform above the entity changed, or its parent did
    TransformModified,
    /// Marker points moved
    PointModified,
}

impl NodeEvent {
    /// Events that re-trigger tools reading a model
    pub const MODEL: [NodeEvent; 3] = [NodeEvent::Modified, NodeEvent::MeshModified, NodeEvent::TransformModified];

    /// Events that re-trigger tools reading a marker
    pub const MARKER: [NodeEvent; 3] = [NodeEvent::Modified, NodeEvent::PointModified, NodeEvent::TransformModified];
}

/// Notification drained by the modeler logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEvent {
    NodeAdded(EntityId),
    NodeRemoved(EntityId),
    ImportFinished,
    EntityModified { id: EntityId, event: NodeEvent },
}
