// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host scene: entity arena, parent transforms and the notification queue.
//!
//! Every mutation goes through a `Scene` method so the matching
//! [`SceneEvent`] is queued. The modeler logic drains the queue; nothing is
//! dispatched re-entrantly from inside a setter.

mod entity;
mod event;

pub use entity::{
    CurveMarker, DisplayState, Entity, EntityContent, EntityId, EntityKind, ModelData, ModelerNode,
    PlaneMarker, RoiMarker,
};
pub use event::{NodeEvent, SceneEvent};

use std::collections::VecDeque;

use dynamic_modeler_geometry::transform::invert;
use dynamic_modeler_geometry::{Matrix4, Mesh, Plane, Point3, Vector3};
use slotmap::SlotMap;

use crate::error::{Error, Result};

/// Parent chains longer than this are treated as broken.
const MAX_PARENT_DEPTH: usize = 64;

/// Entity arena plus pending notifications.
#[derive(Debug, Default)]
pub struct Scene {
    entities: SlotMap<EntityId, Entity>,
    events: VecDeque<SceneEvent>,
    importing: bool,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity and queue `NodeAdded`.
    pub fn add(&mut self, name: impl Into<String>, content: EntityContent) -> EntityId {
        let id = self.entities.insert(Entity {
            name: name.into(),
            parent: None,
            content,
        });
        self.queue(SceneEvent::NodeAdded(id));
        id
    }

    pub fn add_model(&mut self, name: impl Into<String>, mesh: Mesh) -> EntityId {
        self.add(name, EntityContent::Model(ModelData { mesh, display: None }))
    }

    pub fn add_plane(&mut self, name: impl Into<String>, origin: Point3<f64>, normal: Vector3<f64>) -> EntityId {
        self.add(
            name,
            EntityContent::Plane(PlaneMarker {
                origin,
                normal,
                defined: true,
            }),
        )
    }

    pub fn add_slice_frame(&mut self, name: impl Into<String>, slice_to_world: Matrix4<f64>) -> EntityId {
        self.add(name, EntityContent::SliceFrame(slice_to_world))
    }

    pub fn add_curve(&mut self, name: impl Into<String>, points: Vec<Point3<f64>>, closed: bool) -> EntityId {
        self.add(name, EntityContent::Curve(CurveMarker { points, closed }))
    }

    pub fn add_roi(&mut self, name: impl Into<String>, roi: RoiMarker) -> EntityId {
        self.add(name, EntityContent::Roi(roi))
    }

    pub fn add_point_list(&mut self, name: impl Into<String>, points: Vec<Point3<f64>>) -> EntityId {
        self.add(name, EntityContent::PointList(points))
    }

    pub fn add_transform(&mut self, name: impl Into<String>, to_parent: Matrix4<f64>) -> EntityId {
        self.add(name, EntityContent::Transform(to_parent))
    }

    pub fn add_modeler_node(&mut self, name: impl Into<String>) -> EntityId {
        self.add(name, EntityContent::Modeler(ModelerNode::default()))
    }

    /// Remove an entity.
    ///
    /// Children are reparented to the world and every parameter node
    /// referencing the entity drops that reference.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(id)?;

        let children: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|(_, e)| e.parent == Some(id))
            .map(|(child, _)| child)
            .collect();
        for child in children {
            if let Some(e) = self.entities.get_mut(child) {
                e.parent = None;
            }
            self.notify_subtree(child, true);
        }

        let mut referencing = Vec::new();
        for (node_id, e) in self.entities.iter_mut() {
            if let EntityContent::Modeler(node) = &mut e.content {
                let mut changed = false;
                for ids in node.references.values_mut() {
                    let before = ids.len();
                    ids.retain(|&r| r != id);
                    changed |= ids.len() != before;
                }
                if changed {
                    referencing.push(node_id);
                }
            }
        }

        self.queue(SceneEvent::NodeRemoved(id));
        for node_id in referencing {
            self.modified(node_id, NodeEvent::Modified);
        }
        Some(entity)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn kind(&self, id: EntityId) -> Option<EntityKind> {
        self.entities.get(id).map(Entity::kind)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys()
    }

    /// Every parameter node in the scene
    pub fn modeler_nodes(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, e)| matches!(e.content, EntityContent::Modeler(_)))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.entities.iter().find(|(_, e)| e.name == name).map(|(id, _)| id)
    }

    pub fn set_name(&mut self, id: EntityId, name: impl Into<String>) -> Result<()> {
        self.entity_mut(id)?.name = name.into();
        self.modified(id, NodeEvent::Modified);
        Ok(())
    }

    fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.entities.get(id).ok_or(Error::EntityNotFound(id))
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.entities.get_mut(id).ok_or(Error::EntityNotFound(id))
    }

    // ------------------------------------------------------------------
    // Transforms
    // ------------------------------------------------------------------

    /// Place `id` under the transform `parent` (or the world for `None`).
    pub fn set_parent(&mut self, id: EntityId, parent: Option<EntityId>) -> Result<()> {
        self.entity(id)?;
        if let Some(parent) = parent {
            let found = self.entity(parent)?.kind();
            if found != EntityKind::Transform {
                return Err(Error::WrongEntityKind {
                    id: parent,
                    found,
                    expected: "transform",
                });
            }
            if parent == id || self.ancestors(parent).contains(&id) {
                return Err(Error::InvalidInput {
                    role: "parent".to_string(),
                    reason: "transform hierarchy would contain a loop".to_string(),
                });
            }
        }
        self.entity_mut(id)?.parent = parent;
        self.notify_subtree(id, true);
        Ok(())
    }

    /// Replace the matrix of a transform entity and notify everything below it.
    pub fn set_transform_matrix(&mut self, id: EntityId, to_parent: Matrix4<f64>) -> Result<()> {
        match self.entities.get_mut(id).map(|e| &mut e.content) {
            Some(EntityContent::Transform(matrix)) => *matrix = to_parent,
            _ => return Err(self.wrong_kind(id, "transform")),
        }
        self.modified(id, NodeEvent::Modified);
        self.notify_subtree(id, false);
        Ok(())
    }

    /// Transform entities above `id`, nearest first
    fn ancestors(&self, id: EntityId) -> Vec<EntityId> {
        let mut chain = Vec::new();
        let mut current = self.entities.get(id).and_then(|e| e.parent);
        while let Some(parent) = current {
            if chain.len() >= MAX_PARENT_DEPTH || chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = self.entities.get(parent).and_then(|e| e.parent);
        }
        chain
    }

    /// Queue `TransformModified` for every entity below `root`
    fn notify_subtree(&mut self, root: EntityId, include_root: bool) {
        let affected: Vec<EntityId> = self
            .entities
            .keys()
            .filter(|&id| (include_root && id == root) || self.ancestors(id).contains(&root))
            .collect();
        for id in affected {
            self.modified(id, NodeEvent::TransformModified);
        }
    }

    /// Matrix mapping the entity's coordinates to world (its parent chain)
    pub fn to_world(&self, id: EntityId) -> Result<Matrix4<f64>> {
        self.entity(id)?;
        let mut matrix = Matrix4::identity();
        for ancestor in self.ancestors(id) {
            if let Some(EntityContent::Transform(to_parent)) = self.entities.get(ancestor).map(|e| &e.content) {
                matrix = to_parent * matrix;
            }
        }
        Ok(matrix)
    }

    /// Matrix mapping world coordinates into the entity's frame
    pub fn from_world(&self, id: EntityId) -> Result<Matrix4<f64>> {
        Ok(invert(&self.to_world(id)?)?)
    }

    // ------------------------------------------------------------------
    // Models
    // ------------------------------------------------------------------

    fn model(&self, id: EntityId) -> Result<&ModelData> {
        let entity = self.entity(id)?;
        match &entity.content {
            EntityContent::Model(model) => Ok(model),
            _ => Err(Error::WrongEntityKind {
                id,
                found: entity.kind(),
                expected: "model",
            }),
        }
    }

    fn model_mut(&mut self, id: EntityId) -> Result<&mut ModelData> {
        let entity = self.entity_mut(id)?;
        let found = entity.kind();
        match &mut entity.content {
            EntityContent::Model(model) => Ok(model),
            _ => Err(Error::WrongEntityKind {
                id,
                found,
                expected: "model",
            }),
        }
    }

    /// Mesh of a model in its own frame
    pub fn mesh(&self, id: EntityId) -> Option<&Mesh> {
        self.model(id).ok().map(|m| &m.mesh)
    }

    /// Mesh of a model expressed in world coordinates
    pub fn world_mesh(&self, id: EntityId) -> Result<Mesh> {
        let mesh = &self.model(id)?.mesh;
        let to_world = self.to_world(id)?;
        if dynamic_modeler_geometry::transform::is_identity(&to_world) {
            Ok(mesh.clone())
        } else {
            Ok(mesh.transformed(&to_world))
        }
    }

    /// Atomically replace a model's mesh and queue one `MeshModified`.
    pub fn replace_mesh(&mut self, id: EntityId, mesh: Mesh) -> Result<()> {
        self.model_mut(id)?.mesh = mesh;
        self.modified(id, NodeEvent::MeshModified);
        Ok(())
    }

    pub fn display(&self, id: EntityId) -> Option<&DisplayState> {
        self.model(id).ok().and_then(|m| m.display.as_ref())
    }

    /// Give a model display properties if it has none. Returns whether
    /// anything was created. Display state is not observed, so no
    /// notification is queued.
    pub fn ensure_display(&mut self, id: EntityId, template: Option<DisplayState>) -> Result<bool> {
        let model = self.model_mut(id)?;
        if model.display.is_some() {
            return Ok(false);
        }
        model.display = Some(template.unwrap_or_default());
        Ok(true)
    }

    pub fn set_display(&mut self, id: EntityId, display: DisplayState) -> Result<()> {
        self.model_mut(id)?.display = Some(display);
        self.modified(id, NodeEvent::Modified);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Markers
    // ------------------------------------------------------------------

    fn wrong_kind(&self, id: EntityId, expected: &'static str) -> Error {
        match self.kind(id) {
            Some(found) => Error::WrongEntityKind { id, found, expected },
            None => Error::EntityNotFound(id),
        }
    }

    /// Move a plane marker; the plane becomes defined.
    pub fn set_plane(&mut self, id: EntityId, origin: Point3<f64>, normal: Vector3<f64>) -> Result<()> {
        match self.entities.get_mut(id).map(|e| &mut e.content) {
            Some(EntityContent::Plane(plane)) => {
                plane.origin = origin;
                plane.normal = normal;
                plane.defined = true;
            }
            _ => return Err(self.wrong_kind(id, "plane")),
        }
        self.modified(id, NodeEvent::PointModified);
        Ok(())
    }

    pub fn set_plane_defined(&mut self, id: EntityId, defined: bool) -> Result<()> {
        match self.entities.get_mut(id).map(|e| &mut e.content) {
            Some(EntityContent::Plane(plane)) => plane.defined = defined,
            _ => return Err(self.wrong_kind(id, "plane")),
        }
        self.modified(id, NodeEvent::Modified);
        Ok(())
    }

    pub fn set_slice_to_world(&mut self, id: EntityId, slice_to_world: Matrix4<f64>) -> Result<()> {
        match self.entities.get_mut(id).map(|e| &mut e.content) {
            Some(EntityContent::SliceFrame(matrix)) => *matrix = slice_to_world,
            _ => return Err(self.wrong_kind(id, "slice frame")),
        }
        self.modified(id, NodeEvent::Modified);
        Ok(())
    }

    pub fn set_curve_points(&mut self, id: EntityId, points: Vec<Point3<f64>>) -> Result<()> {
        match self.entities.get_mut(id).map(|e| &mut e.content) {
            Some(EntityContent::Curve(curve)) => curve.points = points,
            _ => return Err(self.wrong_kind(id, "curve")),
        }
        self.modified(id, NodeEvent::PointModified);
        Ok(())
    }

    pub fn set_points(&mut self, id: EntityId, points: Vec<Point3<f64>>) -> Result<()> {
        match self.entities.get_mut(id).map(|e| &mut e.content) {
            Some(EntityContent::PointList(list)) => *list = points,
            _ => return Err(self.wrong_kind(id, "point list")),
        }
        self.modified(id, NodeEvent::PointModified);
        Ok(())
    }

    pub fn set_roi(&mut self, id: EntityId, roi: RoiMarker) -> Result<()> {
        match self.entities.get_mut(id).map(|e| &mut e.content) {
            Some(EntityContent::Roi(current)) => *current = roi,
            _ => return Err(self.wrong_kind(id, "roi")),
        }
        self.modified(id, NodeEvent::PointModified);
        Ok(())
    }

    /// World plane of a plane marker or slice frame.
    ///
    /// `Ok(None)` means the marker exists but does not describe a usable
    /// plane (undefined or zero normal).
    pub fn world_plane(&self, id: EntityId) -> Result<Option<Plane>> {
        let entity = self.entity(id)?;
        match &entity.content {
            EntityContent::Plane(marker) => {
                if !marker.defined {
                    return Ok(None);
                }
                let Ok(local) = Plane::new(marker.origin, marker.normal) else {
                    return Ok(None);
                };
                Ok(local.transformed(&self.to_world(id)?).ok())
            }
            EntityContent::SliceFrame(slice_to_world) => {
                let origin = slice_to_world.transform_point(&Point3::origin());
                let normal = slice_to_world.transform_vector(&Vector3::z());
                Ok(Plane::new(origin, normal).ok())
            }
            _ => Err(self.wrong_kind(id, "plane or slice frame")),
        }
    }

    /// Control points of a curve in world coordinates, with its closed flag
    pub fn world_curve(&self, id: EntityId) -> Result<(Vec<Point3<f64>>, bool)> {
        match &self.entity(id)?.content {
            EntityContent::Curve(curve) => {
                let to_world = self.to_world(id)?;
                let points = curve.points.iter().map(|p| to_world.transform_point(p)).collect();
                Ok((points, curve.closed))
            }
            _ => Err(self.wrong_kind(id, "curve")),
        }
    }

    /// Points of a point list in world coordinates
    pub fn world_points(&self, id: EntityId) -> Result<Vec<Point3<f64>>> {
        match &self.entity(id)?.content {
            EntityContent::PointList(points) => {
                let to_world = self.to_world(id)?;
                Ok(points.iter().map(|p| to_world.transform_point(p)).collect())
            }
            _ => Err(self.wrong_kind(id, "point list")),
        }
    }

    /// The six face planes of an ROI box in world coordinates, normals
    /// pointing out of the box.
    pub fn world_roi_planes(&self, id: EntityId) -> Result<Vec<Plane>> {
        let roi = match &self.entity(id)?.content {
            EntityContent::Roi(roi) => *roi,
            _ => return Err(self.wrong_kind(id, "roi")),
        };
        let to_world = self.to_world(id)?;
        let mut planes = Vec::with_capacity(6);
        for axis in 0..3 {
            let direction: Vector3<f64> = roi.orientation.fixed_view::<3, 1>(0, axis).into_owned();
            let offset = direction.normalize() * roi.radius[axis];
            for sign in [1.0, -1.0] {
                let local = Plane::new(roi.center + offset * sign, direction * sign)?;
                planes.push(local.transformed(&to_world)?);
            }
        }
        Ok(planes)
    }

    // ------------------------------------------------------------------
    // Parameter nodes
    // ------------------------------------------------------------------

    pub fn modeler(&self, id: EntityId) -> Option<&ModelerNode> {
        match self.entities.get(id).map(|e| &e.content) {
            Some(EntityContent::Modeler(node)) => Some(node),
            _ => None,
        }
    }

    fn modeler_mut(&mut self, id: EntityId) -> Result<&mut ModelerNode> {
        match self.entities.get_mut(id).map(|e| &mut e.content) {
            Some(EntityContent::Modeler(node)) => Ok(node),
            Some(_) => Err(Error::NotAModelerNode(id)),
            None => Err(Error::EntityNotFound(id)),
        }
    }

    fn edit_modeler(&mut self, id: EntityId, edit: impl FnOnce(&mut ModelerNode)) -> Result<()> {
        edit(self.modeler_mut(id)?);
        self.modified(id, NodeEvent::Modified);
        Ok(())
    }

    pub fn set_tool_name(&mut self, id: EntityId, tool_name: Option<&str>) -> Result<()> {
        let tool_name = tool_name.map(str::to_string);
        self.edit_modeler(id, |node| node.tool_name = tool_name)
    }

    pub fn set_continuous_update(&mut self, id: EntityId, enabled: bool) -> Result<()> {
        self.edit_modeler(id, |node| node.continuous_update = enabled)
    }

    pub fn set_attribute(&mut self, id: EntityId, key: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        self.edit_modeler(id, |node| {
            node.attributes.insert(key.to_string(), value);
        })
    }

    pub fn remove_attribute(&mut self, id: EntityId, key: &str) -> Result<()> {
        self.edit_modeler(id, |node| {
            node.attributes.remove(key);
        })
    }

    /// Make `target` the only reference under `role`, or clear the role.
    pub fn set_reference(&mut self, id: EntityId, role: &str, target: Option<EntityId>) -> Result<()> {
        if let Some(target) = target {
            self.entity(target)?;
        }
        self.edit_modeler(id, |node| {
            let ids = node.references.entry(role.to_string()).or_default();
            ids.clear();
            ids.extend(target);
        })
    }

    /// Append `target` to the references under `role`.
    pub fn add_reference(&mut self, id: EntityId, role: &str, target: EntityId) -> Result<()> {
        self.entity(target)?;
        self.edit_modeler(id, |node| node.references.entry(role.to_string()).or_default().push(target))
    }

    /// Drop every reference to `target` under `role`.
    pub fn remove_reference(&mut self, id: EntityId, role: &str, target: EntityId) -> Result<()> {
        self.edit_modeler(id, |node| {
            if let Some(ids) = node.references.get_mut(role) {
                ids.retain(|&r| r != target);
            }
        })
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    /// Suppress notifications until [`Scene::end_import`].
    pub fn begin_import(&mut self) {
        self.importing = true;
    }

    /// Resume notifications and queue `ImportFinished`.
    pub fn end_import(&mut self) {
        self.importing = false;
        self.queue(SceneEvent::ImportFinished);
    }

    pub fn is_importing(&self) -> bool {
        self.importing
    }

    pub fn pop_event(&mut self) -> Option<SceneEvent> {
        self.events.pop_front()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Queue a change notification for an entity
    pub fn modified(&mut self, id: EntityId, event: NodeEvent) {
        self.queue(SceneEvent::EntityModified { id, event });
    }

    fn queue(&mut self, event: SceneEvent) {
        if self.importing {
            return;
        }
        // Back-to-back duplicates carry no new information
        if self.events.back() == Some(&event) {
            return;
        }
        tracing::trace!(?event, "queued");
        self.events.push_back(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn drain(scene: &mut Scene) -> Vec<SceneEvent> {
        std::iter::from_fn(|| scene.pop_event()).collect()
    }

    #[test]
    fn test_setters_queue_modified() {
        let mut scene = Scene::new();
        let node = scene.add_modeler_node("node");
        drain(&mut scene);

        scene.set_tool_name(node, Some("Mirror")).unwrap();
        scene.set_attribute(node, "Margin", "2").unwrap();
        let events = drain(&mut scene);
        // Identical back-to-back notifications collapse into one
        assert_eq!(
            events,
            vec![SceneEvent::EntityModified {
                id: node,
                event: NodeEvent::Modified
            }]
        );
        assert_eq!(scene.modeler(node).unwrap().tool_name(), Some("Mirror"));
        assert_eq!(scene.modeler(node).unwrap().attribute("Margin"), Some("2"));
    }

    #[test]
    fn test_import_suppresses_events() {
        let mut scene = Scene::new();
        scene.begin_import();
        let node = scene.add_modeler_node("node");
        scene.set_continuous_update(node, true).unwrap();
        scene.end_import();
        assert_eq!(drain(&mut scene), vec![SceneEvent::ImportFinished]);
    }

    #[test]
    fn test_remove_drops_references() {
        let mut scene = Scene::new();
        let node = scene.add_modeler_node("node");
        let model = scene.add_model("model", Mesh::new());
        scene.set_reference(node, "Mirror.InputModel", Some(model)).unwrap();
        drain(&mut scene);

        assert!(scene.remove(model).is_some());
        assert!(scene.modeler(node).unwrap().references("Mirror.InputModel").is_empty());
        assert_eq!(
            drain(&mut scene),
            vec![
                SceneEvent::NodeRemoved(model),
                SceneEvent::EntityModified {
                    id: node,
                    event: NodeEvent::Modified
                }
            ]
        );
    }

    #[test]
    fn test_transform_chain_and_notifications() {
        let mut scene = Scene::new();
        let outer = scene.add_transform("outer", Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0)));
        let inner = scene.add_transform("inner", Matrix4::new_scaling(2.0));
        let model = scene.add_model("model", Mesh::new());
        scene.set_parent(inner, Some(outer)).unwrap();
        scene.set_parent(model, Some(inner)).unwrap();
        drain(&mut scene);

        let p = scene.to_world(model).unwrap().transform_point(&Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(p, Point3::new(3.0, 2.0, 2.0));
        let back = scene.from_world(model).unwrap().transform_point(&p);
        assert_relative_eq!(back, Point3::new(1.0, 1.0, 1.0), epsilon = 1e-12);

        scene
            .set_transform_matrix(outer, Matrix4::new_translation(&Vector3::new(0.0, 5.0, 0.0)))
            .unwrap();
        let events = drain(&mut scene);
        assert!(events.contains(&SceneEvent::EntityModified {
            id: model,
            event: NodeEvent::TransformModified
        }));
        assert!(events.contains(&SceneEvent::EntityModified {
            id: inner,
            event: NodeEvent::TransformModified
        }));
    }

    #[test]
    fn test_parent_must_be_acyclic_transform() {
        let mut scene = Scene::new();
        let a = scene.add_transform("a", Matrix4::identity());
        let b = scene.add_transform("b", Matrix4::identity());
        let model = scene.add_model("model", Mesh::new());
        scene.set_parent(b, Some(a)).unwrap();
        assert!(scene.set_parent(a, Some(b)).is_err());
        assert!(matches!(
            scene.set_parent(a, Some(model)),
            Err(Error::WrongEntityKind { .. })
        ));
    }

    #[test]
    fn test_slice_frame_plane() {
        let mut scene = Scene::new();
        let mut matrix = Matrix4::new_translation(&Vector3::new(0.0, 0.0, 4.0));
        // Swap y and z so the slice normal points along world -y
        matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(&nalgebra::Matrix3::new(
            1.0, 0.0, 0.0, //
            0.0, 0.0, -1.0, //
            0.0, 1.0, 0.0,
        ));
        let slice = scene.add_slice_frame("slice", matrix);
        let plane = scene.world_plane(slice).unwrap().unwrap();
        assert_relative_eq!(plane.origin, Point3::new(0.0, 0.0, 4.0));
        assert_relative_eq!(plane.normal, Vector3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_undefined_plane_is_none() {
        let mut scene = Scene::new();
        let plane = scene.add_plane("plane", Point3::origin(), Vector3::z());
        scene.set_plane_defined(plane, false).unwrap();
        assert!(scene.world_plane(plane).unwrap().is_none());
        let zero = scene.add_plane("zero", Point3::origin(), Vector3::zeros());
        assert!(scene.world_plane(zero).unwrap().is_none());
    }

    #[test]
    fn test_roi_planes_point_outward() {
        let mut scene = Scene::new();
        let roi = scene.add_roi(
            "roi",
            RoiMarker::axis_aligned(Point3::new(1.0, 1.0, 1.0), Vector3::new(1.0, 2.0, 3.0)),
        );
        let planes = scene.world_roi_planes(roi).unwrap();
        assert_eq!(planes.len(), 6);
        let center = Point3::new(1.0, 1.0, 1.0);
        for plane in &planes {
            assert!(plane.signed_distance(&center) < 0.0);
        }
        assert_relative_eq!(planes[5].origin, Point3::new(1.0, 1.0, -2.0));
    }

    #[test]
    fn test_replace_mesh_queues_single_event() {
        let mut scene = Scene::new();
        let model = scene.add_model("model", Mesh::new());
        drain(&mut scene);
        scene.replace_mesh(model, Mesh::new()).unwrap();
        assert_eq!(
            drain(&mut scene),
            vec![SceneEvent::EntityModified {
                id: model,
                event: NodeEvent::MeshModified
            }]
        );
        let plane = scene.add_plane("plane", Point3::origin(), Vector3::z());
        assert!(matches!(
            scene.replace_mesh(plane, Mesh::new()),
            Err(Error::WrongEntityKind { .. })
        ));
    }
}
