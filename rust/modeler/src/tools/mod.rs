// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Built-in tools and the input/output plumbing they share.

mod append;
mod boundary_cut;
mod curve_cut;
mod hollow;
mod margin;
mod mirror;
mod plane_cut;
mod roi_cut;
mod select_by_points;

pub use append::AppendTool;
pub use boundary_cut::BoundaryCutTool;
pub use curve_cut::CurveCutTool;
pub use hollow::HollowTool;
pub use margin::MarginTool;
pub use mirror::MirrorTool;
pub use plane_cut::{cut_with_planes, PlaneCutTool};
pub use roi_cut::RoiCutTool;
pub use select_by_points::{SelectByPointsTool, SELECTION_ARRAY};

use dynamic_modeler_geometry::transform::is_identity;
use dynamic_modeler_geometry::{Mesh, Plane};

use crate::error::{Error, Result};
use crate::scene::{EntityId, ModelerNode, Scene};

/// First reference under a required role
pub(crate) fn required_reference(tool: &'static str, node: &ModelerNode, role: &str) -> Result<EntityId> {
    node.reference(role).ok_or_else(|| Error::MissingRequiredInput {
        tool,
        role: role.to_string(),
    })
}

/// Write a world-space mesh into an output model, expressed in that model's frame.
/// Unbound outputs are skipped.
pub(crate) fn write_output(scene: &mut Scene, output: Option<EntityId>, world_mesh: Mesh) -> Result<()> {
    let Some(id) = output else {
        return Ok(());
    };
    let from_world = scene.from_world(id)?;
    let mesh = if is_identity(&from_world) {
        world_mesh
    } else {
        world_mesh.transformed(&from_world)
    };
    tracing::debug!(
        output = ?id,
        points = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "writing output"
    );
    scene.replace_mesh(id, mesh)
}

/// World planes of every marker under `role`; unusable markers are skipped
pub(crate) fn world_planes(scene: &Scene, node: &ModelerNode, role: &str) -> Result<Vec<Plane>> {
    let mut planes = Vec::new();
    for &id in node.references(role) {
        match scene.world_plane(id)? {
            Some(plane) => planes.push(plane),
            None => tracing::warn!(role, marker = ?id, "plane is not defined, skipping"),
        }
    }
    Ok(planes)
}
