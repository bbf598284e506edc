// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scheduling tests: binding, subscriptions, continuous update and cycles.

use std::sync::Arc;

use approx::assert_relative_eq;
use dynamic_modeler::geometry::{Mesh, Point3, Vector3};
use dynamic_modeler::{BindingState, EntityId, ModelerConfig, ModelerLogic, Scene, ToolRegistry};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn cube(min: f64, max: f64) -> Mesh {
    let p = |x: f64, y: f64, z: f64| Point3::new(x, y, z);
    Mesh::from_triangles(
        &[
            p(min, min, min),
            p(max, min, min),
            p(max, max, min),
            p(min, max, min),
            p(min, min, max),
            p(max, min, max),
            p(max, max, max),
            p(min, max, max),
        ],
        &[
            [0, 2, 1], [0, 3, 2], [4, 5, 6], [4, 6, 7],
            [0, 1, 5], [0, 5, 4], [1, 2, 6], [1, 6, 5],
            [2, 3, 7], [2, 7, 6], [3, 0, 4], [3, 4, 7],
        ],
    )
}

fn logic(run_on_node_added: bool) -> ModelerLogic {
    init_tracing();
    ModelerLogic::with_config(
        Arc::new(ToolRegistry::with_builtin_tools()),
        ModelerConfig::fixed(run_on_node_added, 10_000),
    )
}

struct PlaneCutScene {
    scene: Scene,
    node: EntityId,
    model: EntityId,
    plane: EntityId,
    output: EntityId,
}

/// Unit cube cut at z = 0.3, positive side bound
fn plane_cut_scene() -> PlaneCutScene {
    let mut scene = Scene::new();
    let model = scene.add_model("cube", cube(0.0, 1.0));
    let plane = scene.add_plane("plane", Point3::new(0.0, 0.0, 0.3), Vector3::z());
    let output = scene.add_model("positive", Mesh::new());
    let node = scene.add_modeler_node("cut");
    scene.set_tool_name(node, Some("Plane cut")).unwrap();
    scene.set_reference(node, "PlaneCut.InputModel", Some(model)).unwrap();
    scene.add_reference(node, "PlaneCut.InputPlane", plane).unwrap();
    scene.set_reference(node, "PlaneCut.OutputPositiveModel", Some(output)).unwrap();
    PlaneCutScene {
        scene,
        node,
        model,
        plane,
        output,
    }
}

#[test]
fn test_node_added_binds_and_runs() {
    let mut logic = logic(true);
    let PlaneCutScene { mut scene, node, output, .. } = plane_cut_scene();

    let ran = logic.process_events(&mut scene);
    assert!(ran.contains(&node));
    assert_eq!(logic.binding_state(node), BindingState::BoundCurrent);
    assert_eq!(logic.tool(node).map(|tool| tool.name()), Some("Plane cut"));
    assert_relative_eq!(scene.mesh(output).unwrap().signed_volume(), 0.7, epsilon = 1e-9);
    assert!(scene.display(output).is_some());
}

#[test]
fn test_continuous_update_reruns_exactly_once() {
    let mut logic = logic(false);
    let PlaneCutScene { mut scene, node, model, output, .. } = plane_cut_scene();
    scene.set_continuous_update(node, true).unwrap();
    logic.process_events(&mut scene);

    scene.replace_mesh(model, cube(0.0, 2.0)).unwrap();
    let ran = logic.process_events(&mut scene);
    assert_eq!(ran, vec![node]);
    assert_relative_eq!(scene.mesh(output).unwrap().signed_volume(), 2.0 * 2.0 * 1.7, epsilon = 1e-9);
    assert_eq!(scene.pending_events(), 0);
}

#[test]
fn test_marker_moves_trigger_rerun() {
    let mut logic = logic(false);
    let PlaneCutScene { mut scene, node, plane, output, .. } = plane_cut_scene();
    scene.set_continuous_update(node, true).unwrap();
    logic.process_events(&mut scene);

    scene.set_plane(plane, Point3::new(0.0, 0.0, 0.6), Vector3::z()).unwrap();
    assert_eq!(logic.process_events(&mut scene), vec![node]);
    assert_relative_eq!(scene.mesh(output).unwrap().signed_volume(), 0.4, epsilon = 1e-9);
}

#[test]
fn test_without_continuous_update_inputs_only_resync() {
    let mut logic = logic(false);
    let PlaneCutScene { mut scene, node, model, output, .. } = plane_cut_scene();
    logic.process_events(&mut scene);
    assert!(scene.mesh(output).unwrap().is_empty());

    scene.replace_mesh(model, cube(0.0, 2.0)).unwrap();
    assert!(logic.process_events(&mut scene).is_empty());
    assert!(scene.mesh(output).unwrap().is_empty());

    logic.run(&mut scene, node).unwrap();
    assert_relative_eq!(scene.mesh(output).unwrap().signed_volume(), 6.8, epsilon = 1e-9);
}

#[test]
fn test_circular_reference_disables_continuous_update() {
    let mut logic = logic(false);
    let PlaneCutScene { mut scene, node, model, .. } = plane_cut_scene();
    logic.process_events(&mut scene);
    assert!(!logic.has_circular_reference(&scene, node));

    scene.set_reference(node, "PlaneCut.OutputNegativeModel", Some(model)).unwrap();
    scene.set_continuous_update(node, true).unwrap();
    let ran = logic.process_events(&mut scene);

    assert!(ran.is_empty());
    assert!(logic.has_circular_reference(&scene, node));
    assert!(!scene.modeler(node).unwrap().continuous_update());

    // A manual run is still allowed
    logic.run(&mut scene, node).unwrap();
    assert_relative_eq!(scene.mesh(model).unwrap().signed_volume(), 0.3, epsilon = 1e-9);
}

#[test]
fn test_tool_switch_keeps_references() {
    let mut logic = logic(false);
    let PlaneCutScene { mut scene, node, model, plane, .. } = plane_cut_scene();
    scene.set_reference(node, "Mirror.InputModel", Some(model)).unwrap();
    logic.process_events(&mut scene);
    let watched: Vec<EntityId> = logic.subscriptions().watched_by(node).iter().map(|(id, _)| *id).collect();
    assert!(watched.contains(&plane));

    scene.set_tool_name(node, Some("Mirror")).unwrap();
    logic.process_events(&mut scene);
    assert_eq!(logic.tool(node).map(|tool| tool.name()), Some("Mirror"));
    assert_eq!(logic.subscriptions().watched_by(node), vec![(model, "Mirror.InputModel")]);

    let params = scene.modeler(node).unwrap();
    assert_eq!(params.reference("PlaneCut.InputModel"), Some(model));
    assert_eq!(params.reference("PlaneCut.InputPlane"), Some(plane));

    scene.set_tool_name(node, Some("Plane cut")).unwrap();
    logic.process_events(&mut scene);
    let roles: Vec<&str> = logic.subscriptions().watched_by(node).iter().map(|(_, role)| *role).collect();
    assert!(roles.contains(&"PlaneCut.InputModel"));
    assert!(roles.contains(&"PlaneCut.InputPlane"));
}

#[test]
fn test_unknown_tool_leaves_node_unbound() {
    let mut logic = logic(true);
    let mut scene = Scene::new();
    let node = scene.add_modeler_node("node");
    scene.set_tool_name(node, Some("Sculpt")).unwrap();

    assert!(logic.process_events(&mut scene).is_empty());
    assert_eq!(logic.binding_state(node), BindingState::Unbound);
    logic.run(&mut scene, node).unwrap();
}

#[test]
fn test_missing_inputs_make_run_a_no_op() {
    let mut logic = logic(true);
    let mut scene = Scene::new();
    let output = scene.add_model("output", Mesh::new());
    let node = scene.add_modeler_node("node");
    scene.set_tool_name(node, Some("Hollow")).unwrap();
    scene.set_reference(node, "Hollow.OutputModel", Some(output)).unwrap();

    assert!(logic.process_events(&mut scene).is_empty());
    logic.run(&mut scene, node).unwrap();
    assert!(scene.display(output).is_none());
}

#[test]
fn test_node_removal_drops_binding() {
    let mut logic = logic(false);
    let PlaneCutScene { mut scene, node, .. } = plane_cut_scene();
    logic.process_events(&mut scene);
    assert!(!logic.subscriptions().watched_by(node).is_empty());

    scene.remove(node);
    logic.process_events(&mut scene);
    assert_eq!(logic.binding_state(node), BindingState::Unbound);
    assert!(logic.subscriptions().watched_by(node).is_empty());
}

#[test]
fn test_removed_input_is_unsubscribed() {
    let mut logic = logic(false);
    let PlaneCutScene { mut scene, node, plane, .. } = plane_cut_scene();
    logic.process_events(&mut scene);

    scene.remove(plane);
    logic.process_events(&mut scene);
    assert!(scene.modeler(node).unwrap().reference("PlaneCut.InputPlane").is_none());
    assert!(logic.subscriptions().watched_by(node).iter().all(|(id, _)| *id != plane));
}

#[test]
fn test_import_syncs_without_running() {
    let mut logic = logic(true);
    let mut scene = Scene::new();
    scene.begin_import();
    let model = scene.add_model("cube", cube(0.0, 1.0));
    let output = scene.add_model("mirrored", Mesh::new());
    let plane = scene.add_plane("plane", Point3::origin(), Vector3::x());
    let node = scene.add_modeler_node("mirror");
    scene.set_tool_name(node, Some("Mirror")).unwrap();
    scene.set_reference(node, "Mirror.InputModel", Some(model)).unwrap();
    scene.set_reference(node, "Mirror.InputPlane", Some(plane)).unwrap();
    scene.set_reference(node, "Mirror.OutputModel", Some(output)).unwrap();
    scene.end_import();
    assert_eq!(scene.pending_events(), 1);

    assert!(logic.process_events(&mut scene).is_empty());
    assert_eq!(logic.binding_state(node), BindingState::BoundCurrent);
    assert_eq!(logic.subscriptions().watched_by(node).len(), 2);
    assert!(scene.mesh(output).unwrap().is_empty());
}

#[test]
fn test_import_binds_valid_nodes_next_to_broken_ones() {
    let mut logic = logic(true);
    let mut scene = Scene::new();
    scene.begin_import();
    let model = scene.add_model("cube", cube(0.0, 1.0));
    let broken = scene.add_modeler_node("broken");
    scene.set_tool_name(broken, Some("Sculpt")).unwrap();
    let hollow = scene.add_modeler_node("hollow");
    scene.set_tool_name(hollow, Some("Hollow")).unwrap();
    scene.set_reference(hollow, "Hollow.InputModel", Some(model)).unwrap();
    scene.end_import();

    assert!(logic.process_events(&mut scene).is_empty());
    assert_eq!(logic.binding_state(broken), BindingState::Unbound);
    assert_eq!(logic.binding_state(hollow), BindingState::BoundCurrent);
    assert_eq!(logic.subscriptions().watched_by(hollow), vec![(model, "Hollow.InputModel")]);
}

#[test]
fn test_dispatch_limit_leaves_events_queued() {
    init_tracing();
    let mut logic = ModelerLogic::with_config(
        Arc::new(ToolRegistry::with_builtin_tools()),
        ModelerConfig::fixed(false, 1),
    );
    let PlaneCutScene { mut scene, .. } = plane_cut_scene();
    let before = scene.pending_events();
    logic.process_events(&mut scene);
    assert_eq!(scene.pending_events(), before - 1);
}
