// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dynamic Modeler
//!
//! Keeps derived surface models in sync with their inputs. A parameter node
//! in the [`Scene`] names a tool, references its input and output entities
//! and stores parameter values as attributes. [`ModelerLogic`] binds one
//! [`Tool`] instance per node, watches the referenced inputs and re-runs the
//! tool when they change.
//!
//! ```no_run
//! use std::sync::Arc;
//! use dynamic_modeler::{ModelerLogic, Scene, ToolRegistry};
//! use dynamic_modeler::geometry::{Point3, Vector3};
//! # fn surface() -> dynamic_modeler::geometry::Mesh { Default::default() }
//!
//! let registry = Arc::new(ToolRegistry::with_builtin_tools());
//! let mut logic = ModelerLogic::new(registry);
//! let mut scene = Scene::new();
//!
//! let model = scene.add_model("skull", surface());
//! let plane = scene.add_plane("cut", Point3::origin(), Vector3::z());
//! let output = scene.add_model("upper half", Default::default());
//! let node = scene.add_modeler_node("cut skull");
//! scene.set_tool_name(node, Some("Plane cut")).unwrap();
//! scene.set_reference(node, "PlaneCut.InputModel", Some(model)).unwrap();
//! scene.add_reference(node, "PlaneCut.InputPlane", plane).unwrap();
//! scene.set_reference(node, "PlaneCut.OutputPositiveModel", Some(output)).unwrap();
//! scene.set_continuous_update(node, true).unwrap();
//!
//! // Moving the plane re-cuts the model on the next dispatch
//! logic.process_events(&mut scene);
//! scene.set_plane(plane, Point3::new(0.0, 0.0, 10.0), Vector3::z()).unwrap();
//! logic.process_events(&mut scene);
//! ```

pub mod config;
pub mod descriptor;
pub mod error;
pub mod logic;
pub mod registry;
pub mod scene;
pub mod tool;
pub mod tools;

pub use dynamic_modeler_geometry as geometry;

pub use config::ModelerConfig;
pub use descriptor::{InputSlot, OutputSlot, ParameterInfo, ParameterType, ParameterValue, ToolDescriptor};
pub use error::{Error, Result};
pub use logic::{circular_references, BindingState, ModelerLogic};
pub use registry::{ToolRegistry, ToolSummary};
pub use scene::{EntityId, EntityKind, NodeEvent, Scene, SceneEvent};
pub use tool::{Tool, ToolKind};
