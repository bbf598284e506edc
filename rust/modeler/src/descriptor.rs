// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Static description of a tool: input slots, output slots and parameters.
//!
//! Indexed accessors never panic. An out-of-range index is logged at
//! `error` level and a neutral value is returned.

use std::fmt;

use smallvec::SmallVec;

use crate::scene::{EntityKind, ModelerNode, NodeEvent};

/// Named input the tool reads from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputSlot {
    pub name: String,
    pub description: String,
    /// Reference role on the parameter node
    pub role: String,
    /// Entity kinds that may be referenced
    pub kinds: Vec<EntityKind>,
    /// Notifications from a referenced entity that re-trigger the tool
    pub events: SmallVec<[NodeEvent; 4]>,
    pub required: bool,
    pub repeatable: bool,
}

impl InputSlot {
    fn new(name: &str, description: &str, role: &str, kinds: &[EntityKind], events: &[NodeEvent]) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            role: role.to_string(),
            kinds: kinds.to_vec(),
            events: events.iter().copied().collect(),
            required: true,
            repeatable: false,
        }
    }

    /// Required, single model input
    pub fn model(name: &str, description: &str, role: &str) -> Self {
        Self::new(name, description, role, &[EntityKind::Model], &NodeEvent::MODEL)
    }

    /// Required, single marker input of the given kinds
    pub fn marker(name: &str, description: &str, role: &str, kinds: &[EntityKind]) -> Self {
        Self::new(name, description, role, kinds, &NodeEvent::MARKER)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub fn accepts(&self, kind: EntityKind) -> bool {
        self.kinds.contains(&kind)
    }
}

/// Named output the tool writes to.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutputSlot {
    pub name: String,
    pub description: String,
    pub role: String,
    pub kinds: Vec<EntityKind>,
    pub required: bool,
    pub repeatable: bool,
}

impl OutputSlot {
    /// Optional, single model output
    pub fn model(name: &str, description: &str, role: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            role: role.to_string(),
            kinds: vec![EntityKind::Model],
            required: false,
            repeatable: false,
        }
    }
}

/// Value type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParameterType {
    Bool,
    Int,
    Double,
    String,
    /// String restricted to the legal values
    StringEnum,
}

/// Typed parameter value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl ParameterValue {
    /// Parse the attribute text of a parameter of type `ty`
    pub fn parse(ty: ParameterType, text: &str) -> Option<Self> {
        let text = text.trim();
        match ty {
            ParameterType::Bool => match text.to_ascii_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => Some(Self::Bool(true)),
                "false" | "0" | "off" | "no" => Some(Self::Bool(false)),
                _ => None,
            },
            ParameterType::Int => text.parse().ok().map(Self::Int),
            ParameterType::Double => text.parse::<f64>().ok().filter(|v| v.is_finite()).map(Self::Double),
            ParameterType::String | ParameterType::StringEnum => Some(Self::String(text.to_string())),
        }
    }

    pub fn to_bool(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Double(d) => *d != 0.0,
            Self::String(s) => matches!(s.to_ascii_lowercase().as_str(), "true" | "1" | "on" | "yes"),
        }
    }

    pub fn to_int(&self) -> i64 {
        match self {
            Self::Bool(b) => i64::from(*b),
            Self::Int(i) => *i,
            Self::Double(d) => *d as i64,
            Self::String(s) => s.trim().parse().unwrap_or(0),
        }
    }

    pub fn to_double(&self) -> f64 {
        match self {
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Int(i) => *i as f64,
            Self::Double(d) => *d,
            Self::String(s) => s.trim().parse().unwrap_or(0.0),
        }
    }

    /// String payload, empty for other variants
    pub fn as_str(&self) -> &str {
        match self {
            Self::String(s) => s,
            _ => "",
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// Typed, defaulted parameter stored as a node attribute.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterInfo {
    pub name: String,
    pub description: String,
    /// Attribute key on the parameter node
    pub key: String,
    pub ty: ParameterType,
    pub default: ParameterValue,
    /// Allowed values of a `StringEnum` parameter
    pub legal_values: Vec<String>,
}

impl ParameterInfo {
    pub fn new(name: &str, description: &str, key: &str, default: ParameterValue) -> Self {
        let ty = match default {
            ParameterValue::Bool(_) => ParameterType::Bool,
            ParameterValue::Int(_) => ParameterType::Int,
            ParameterValue::Double(_) => ParameterType::Double,
            ParameterValue::String(_) => ParameterType::String,
        };
        Self {
            name: name.to_string(),
            description: description.to_string(),
            key: key.to_string(),
            ty,
            default,
            legal_values: Vec::new(),
        }
    }

    /// Enumerated string parameter
    pub fn string_enum(name: &str, description: &str, key: &str, legal_values: &[&str], default: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            key: key.to_string(),
            ty: ParameterType::StringEnum,
            default: ParameterValue::String(default.to_string()),
            legal_values: legal_values.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Value stored on `node`, or the default when absent or unusable
    pub fn resolve(&self, node: &ModelerNode) -> ParameterValue {
        let Some(text) = node.attribute(&self.key) else {
            return self.default.clone();
        };
        match ParameterValue::parse(self.ty, text) {
            Some(value) if self.ty != ParameterType::StringEnum || self.legal_values.iter().any(|v| v == value.as_str()) => value,
            _ => {
                tracing::warn!(parameter = %self.key, value = text, "unusable parameter value, using default");
                self.default.clone()
            }
        }
    }
}

/// Complete static description of a tool.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ToolDescriptor {
    pub inputs: Vec<InputSlot>,
    pub outputs: Vec<OutputSlot>,
    pub parameters: Vec<ParameterInfo>,
}

fn checked<'a, T>(items: &'a [T], index: usize, what: &'static str) -> Option<&'a T> {
    let item = items.get(index);
    if item.is_none() {
        tracing::error!(index, count = items.len(), "{what} index out of range");
    }
    item
}

impl ToolDescriptor {
    pub fn number_of_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn input_name(&self, index: usize) -> &str {
        checked(&self.inputs, index, "input").map_or("", |s| s.name.as_str())
    }

    pub fn input_description(&self, index: usize) -> &str {
        checked(&self.inputs, index, "input").map_or("", |s| s.description.as_str())
    }

    pub fn input_role(&self, index: usize) -> &str {
        checked(&self.inputs, index, "input").map_or("", |s| s.role.as_str())
    }

    pub fn input_kinds(&self, index: usize) -> &[EntityKind] {
        checked(&self.inputs, index, "input").map_or(&[][..], |s| s.kinds.as_slice())
    }

    pub fn input_events(&self, index: usize) -> &[NodeEvent] {
        checked(&self.inputs, index, "input").map_or(&[][..], |s| s.events.as_slice())
    }

    pub fn input_required(&self, index: usize) -> bool {
        checked(&self.inputs, index, "input").is_some_and(|s| s.required)
    }

    pub fn input_repeatable(&self, index: usize) -> bool {
        checked(&self.inputs, index, "input").is_some_and(|s| s.repeatable)
    }

    pub fn number_of_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn output_name(&self, index: usize) -> &str {
        checked(&self.outputs, index, "output").map_or("", |s| s.name.as_str())
    }

    pub fn output_description(&self, index: usize) -> &str {
        checked(&self.outputs, index, "output").map_or("", |s| s.description.as_str())
    }

    pub fn output_role(&self, index: usize) -> &str {
        checked(&self.outputs, index, "output").map_or("", |s| s.role.as_str())
    }

    pub fn output_kinds(&self, index: usize) -> &[EntityKind] {
        checked(&self.outputs, index, "output").map_or(&[][..], |s| s.kinds.as_slice())
    }

    pub fn output_required(&self, index: usize) -> bool {
        checked(&self.outputs, index, "output").is_some_and(|s| s.required)
    }

    pub fn output_repeatable(&self, index: usize) -> bool {
        checked(&self.outputs, index, "output").is_some_and(|s| s.repeatable)
    }

    pub fn number_of_parameters(&self) -> usize {
        self.parameters.len()
    }

    pub fn parameter_name(&self, index: usize) -> &str {
        checked(&self.parameters, index, "parameter").map_or("", |p| p.name.as_str())
    }

    pub fn parameter_description(&self, index: usize) -> &str {
        checked(&self.parameters, index, "parameter").map_or("", |p| p.description.as_str())
    }

    pub fn parameter_key(&self, index: usize) -> &str {
        checked(&self.parameters, index, "parameter").map_or("", |p| p.key.as_str())
    }

    pub fn parameter_type(&self, index: usize) -> ParameterType {
        checked(&self.parameters, index, "parameter").map_or(ParameterType::String, |p| p.ty)
    }

    pub fn parameter_default(&self, index: usize) -> ParameterValue {
        checked(&self.parameters, index, "parameter")
            .map_or_else(|| ParameterValue::String(String::new()), |p| p.default.clone())
    }

    pub fn parameter_legal_values(&self, index: usize) -> &[String] {
        checked(&self.parameters, index, "parameter").map_or(&[][..], |p| p.legal_values.as_slice())
    }

    /// Current value of parameter `index` on `node`
    pub fn parameter_value(&self, index: usize, node: &ModelerNode) -> ParameterValue {
        checked(&self.parameters, index, "parameter")
            .map_or_else(|| ParameterValue::String(String::new()), |p| p.resolve(node))
    }

    pub fn parameter_index(&self, key: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p.key == key)
    }

    /// First required input role without a reference
    pub fn missing_required_input(&self, node: &ModelerNode) -> Option<&InputSlot> {
        self.inputs
            .iter()
            .find(|slot| slot.required && node.reference_count(&slot.role) == 0)
    }

    pub fn has_required_inputs(&self, node: &ModelerNode) -> bool {
        self.missing_required_input(node).is_none()
    }

    pub fn has_any_output(&self, node: &ModelerNode) -> bool {
        self.outputs.iter().any(|slot| node.reference_count(&slot.role) > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;

    fn descriptor() -> ToolDescriptor {
        ToolDescriptor {
            inputs: vec![
                InputSlot::model("Model", "input model", "Test.InputModel"),
                InputSlot::marker("Seed", "seed points", "Test.InputSeed", &[EntityKind::PointList]).optional(),
            ],
            outputs: vec![OutputSlot::model("Output", "output model", "Test.OutputModel")],
            parameters: vec![
                ParameterInfo::new("Thickness", "shell thickness", "Thickness", ParameterValue::Double(1.0)),
                ParameterInfo::string_enum("Mode", "mode", "Mode", &["A", "B"], "A"),
            ],
        }
    }

    #[test]
    fn test_out_of_range_accessors_return_defaults() {
        let d = descriptor();
        assert_eq!(d.input_name(7), "");
        assert!(!d.input_required(7));
        assert!(d.output_kinds(3).is_empty());
        assert_eq!(d.parameter_type(9), ParameterType::String);
        assert_eq!(d.input_events(0), &NodeEvent::MODEL);
        assert!(!d.input_required(1));
    }

    #[test]
    fn test_parameter_resolution() {
        let d = descriptor();
        let mut scene = Scene::new();
        let node = scene.add_modeler_node("node");
        assert_eq!(d.parameter_value(0, scene.modeler(node).unwrap()), ParameterValue::Double(1.0));

        scene.set_attribute(node, "Thickness", "2.5").unwrap();
        scene.set_attribute(node, "Mode", "B").unwrap();
        let params = scene.modeler(node).unwrap();
        assert_eq!(d.parameter_value(0, params).to_double(), 2.5);
        assert_eq!(d.parameter_value(1, params).as_str(), "B");

        scene.set_attribute(node, "Thickness", "thick").unwrap();
        scene.set_attribute(node, "Mode", "C").unwrap();
        let params = scene.modeler(node).unwrap();
        assert_eq!(d.parameter_value(0, params), ParameterValue::Double(1.0));
        assert_eq!(d.parameter_value(1, params).as_str(), "A");
    }

    #[test]
    fn test_required_inputs_and_outputs() {
        let d = descriptor();
        let mut scene = Scene::new();
        let node = scene.add_modeler_node("node");
        let model = scene.add_model("model", Default::default());
        assert!(!d.has_required_inputs(scene.modeler(node).unwrap()));

        scene.set_reference(node, "Test.InputModel", Some(model)).unwrap();
        let params = scene.modeler(node).unwrap();
        assert!(d.has_required_inputs(params));
        assert!(!d.has_any_output(params));
    }

    #[test]
    fn test_value_coercions() {
        assert!(ParameterValue::parse(ParameterType::Bool, "TRUE").unwrap().to_bool());
        assert_eq!(ParameterValue::Bool(true).to_double(), 1.0);
        assert_eq!(ParameterValue::Double(3.7).to_int(), 3);
        assert_eq!(ParameterValue::parse(ParameterType::Int, "x"), None);
        assert_eq!(ParameterValue::Double(0.5).to_string(), "0.5");
    }
}
