// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene entities and their content.

use std::collections::BTreeMap;

use dynamic_modeler_geometry::{Matrix4, Mesh, Point3, Vector3};
use slotmap::new_key_type;

new_key_type! {
    /// Key of an entity in the scene arena.
    pub struct EntityId;
}

/// Coarse entity classification used by input slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityKind {
    Model,
    Plane,
    SliceFrame,
    Curve,
    ClosedCurve,
    Roi,
    PointList,
    Transform,
    Modeler,
}

/// Display properties of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub visible: bool,
    pub color: [f64; 3],
    pub opacity: f64,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            visible: true,
            color: [0.9, 0.9, 0.9],
            opacity: 1.0,
        }
    }
}

/// Surface model; the mesh is expressed in the model's own frame.
#[derive(Debug, Clone, Default)]
pub struct ModelData {
    pub mesh: Mesh,
    pub display: Option<DisplayState>,
}

/// Plane marker in its parent frame.
#[derive(Debug, Clone, Copy)]
pub struct PlaneMarker {
    pub origin: Point3<f64>,
    pub normal: Vector3<f64>,
    /// Set once the user has placed the plane
    pub defined: bool,
}

/// Polyline marker; `closed` joins the last point to the first.
#[derive(Debug, Clone, Default)]
pub struct CurveMarker {
    pub points: Vec<Point3<f64>>,
    pub closed: bool,
}

/// Oriented box region of interest.
#[derive(Debug, Clone, Copy)]
pub struct RoiMarker {
    pub center: Point3<f64>,
    /// Half extents along the box axes
    pub radius: Vector3<f64>,
    /// Box axes as the rotation columns; translation is ignored
    pub orientation: Matrix4<f64>,
}

impl RoiMarker {
    /// Axis-aligned box.
    pub fn axis_aligned(center: Point3<f64>, radius: Vector3<f64>) -> Self {
        Self {
            center,
            radius,
            orientation: Matrix4::identity(),
        }
    }
}

/// Parameter node: the persistent configuration of one tool instance.
///
/// References are ordered per role; attributes hold parameter values as text.
#[derive(Debug, Clone, Default)]
pub struct ModelerNode {
    pub(crate) tool_name: Option<String>,
    pub(crate) continuous_update: bool,
    pub(crate) references: BTreeMap<String, Vec<EntityId>>,
    pub(crate) attributes: BTreeMap<String, String>,
}

impl ModelerNode {
    pub fn tool_name(&self) -> Option<&str> {
        self.tool_name.as_deref()
    }

    pub fn continuous_update(&self) -> bool {
        self.continuous_update
    }

    /// All references under `role`, in order
    pub fn references(&self, role: &str) -> &[EntityId] {
        self.references.get(role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First reference under `role`
    pub fn reference(&self, role: &str) -> Option<EntityId> {
        self.references(role).first().copied()
    }

    pub fn reference_count(&self, role: &str) -> usize {
        self.references(role).len()
    }

    /// Roles that hold at least one reference
    pub fn roles(&self) -> impl Iterator<Item = &str> + '_ {
        self.references
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(role, _)| role.as_str())
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Entity payload.
#[derive(Debug, Clone)]
pub enum EntityContent {
    Model(ModelData),
    Plane(PlaneMarker),
    /// Slice view frame; the matrix maps slice coordinates to world
    SliceFrame(Matrix4<f64>),
    Curve(CurveMarker),
    Roi(RoiMarker),
    PointList(Vec<Point3<f64>>),
    /// Linear transform mapping this node's children into its parent frame
    Transform(Matrix4<f64>),
    Modeler(ModelerNode),
}

/// Named scene entity with an optional parent transform.
#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    pub(crate) parent: Option<EntityId>,
    pub content: EntityContent,
}

impl Entity {
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn kind(&self) -> EntityKind {
        match &self.content {
            EntityContent::Model(_) => EntityKind::Model,
            EntityContent::Plane(_) => EntityKind::Plane,
            EntityContent::SliceFrame(_) => EntityKind::SliceFrame,
            EntityContent::Curve(curve) if curve.closed => EntityKind::ClosedCurve,
            EntityContent::Curve(_) => EntityKind::Curve,
            EntityContent::Roi(_) => EntityKind::Roi,
            EntityContent::PointList(_) => EntityKind::PointList,
            EntityContent::Transform(_) => EntityKind::Transform,
            EntityContent::Modeler(_) => EntityKind::Modeler,
        }
    }
}
