// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for tool execution and scene access.

use crate::scene::{EntityId, EntityKind};
use crate::tool::ToolKind;

/// Result type alias for modeler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while binding or running tools.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required input role has no reference.
    #[error("{tool}: required input {role} is not set")]
    MissingRequiredInput { tool: &'static str, role: String },

    /// None of the tool's output roles is bound.
    #[error("{tool}: no output model is set")]
    MissingOutput { tool: &'static str },

    /// No tool is registered under the requested name.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// A tool of this kind is already registered.
    #[error("tool already registered: {0:?}")]
    AlreadyRegistered(ToolKind),

    /// The entity id does not resolve in the scene.
    #[error("entity not found: {0:?}")]
    EntityNotFound(EntityId),

    /// The entity exists but holds different content.
    #[error("entity {id:?} is a {found:?}, expected {expected}")]
    WrongEntityKind {
        id: EntityId,
        found: EntityKind,
        expected: &'static str,
    },

    /// The entity is not a parameter node.
    #[error("entity {0:?} is not a modeler parameter node")]
    NotAModelerNode(EntityId),

    /// An input marker cannot be used (undefined plane, too few points, ...).
    #[error("invalid input {role}: {reason}")]
    InvalidInput { role: String, reason: String },

    /// None of the borders produced points on the surface.
    #[error("no boundary geometry could be placed on the surface")]
    NoBoundaryGeometry,

    /// Geometry kernel failure.
    #[error("geometry error: {0}")]
    Geometry(#[from] dynamic_modeler_geometry::Error),
}
