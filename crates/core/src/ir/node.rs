use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::IrError;
use crate::graph::NodeId;
use crate::script::SourceLocation;

// =============================================================================
// Node types
// =============================================================================

/// Closed set of IR node kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum IrNodeType {
    SceneStart,
    SceneEnd,
    Dialogue,
    Choice,
    Branch,
    Switch,
    Loop,
    Goto,
    SetVariable,
    ShowBackground,
    ShowCharacter,
    HideCharacter,
    PlayMusic,
    StopMusic,
    PlaySound,
    Transition,
    Wait,
    Comment,
}

impl IrNodeType {
    pub const ALL: [IrNodeType; 18] = [
        IrNodeType::SceneStart,
        IrNodeType::SceneEnd,
        IrNodeType::Dialogue,
        IrNodeType::Choice,
        IrNodeType::Branch,
        IrNodeType::Switch,
        IrNodeType::Loop,
        IrNodeType::Goto,
        IrNodeType::SetVariable,
        IrNodeType::ShowBackground,
        IrNodeType::ShowCharacter,
        IrNodeType::HideCharacter,
        IrNodeType::PlayMusic,
        IrNodeType::StopMusic,
        IrNodeType::PlaySound,
        IrNodeType::Transition,
        IrNodeType::Wait,
        IrNodeType::Comment,
    ];

    /// Stable tag used in JSON documents and visual graphs.
    pub fn as_str(self) -> &'static str {
        match self {
            IrNodeType::SceneStart => "SceneStart",
            IrNodeType::SceneEnd => "SceneEnd",
            IrNodeType::Dialogue => "Dialogue",
            IrNodeType::Choice => "Choice",
            IrNodeType::Branch => "Branch",
            IrNodeType::Switch => "Switch",
            IrNodeType::Loop => "Loop",
            IrNodeType::Goto => "Goto",
            IrNodeType::SetVariable => "SetVariable",
            IrNodeType::ShowBackground => "ShowBackground",
            IrNodeType::ShowCharacter => "ShowCharacter",
            IrNodeType::HideCharacter => "HideCharacter",
            IrNodeType::PlayMusic => "PlayMusic",
            IrNodeType::StopMusic => "StopMusic",
            IrNodeType::PlaySound => "PlaySound",
            IrNodeType::Transition => "Transition",
            IrNodeType::Wait => "Wait",
            IrNodeType::Comment => "Comment",
        }
    }

    /// Declared properties and their value kinds.
    pub fn property_schema(self) -> &'static [(&'static str, PropertyKind)] {
        use PropertyKind::{Bool, Float, String, StringList};
        match self {
            IrNodeType::SceneStart | IrNodeType::SceneEnd => &[("scene", String)],
            IrNodeType::Dialogue => &[("speaker", String), ("text", String)],
            IrNodeType::Choice => &[("options", StringList), ("conditions", StringList)],
            IrNodeType::Branch => &[("condition", String), ("has_else", Bool)],
            IrNodeType::Switch => &[
                ("subject", String),
                ("cases", StringList),
                ("has_default", Bool),
            ],
            IrNodeType::Loop => &[("condition", String)],
            IrNodeType::Goto => &[("target", String)],
            IrNodeType::SetVariable => &[("variable", String), ("value", String)],
            IrNodeType::ShowBackground | IrNodeType::PlayMusic | IrNodeType::PlaySound => {
                &[("asset", String)]
            }
            IrNodeType::ShowCharacter => &[("character", String), ("position", String)],
            IrNodeType::HideCharacter => &[("character", String)],
            IrNodeType::StopMusic => &[],
            IrNodeType::Transition => &[("kind", String), ("duration", Float)],
            IrNodeType::Wait => &[("duration", Float)],
            IrNodeType::Comment => &[("text", String)],
        }
    }

    pub fn property_kind(self, name: &str) -> Option<PropertyKind> {
        self.property_schema()
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, kind)| *kind)
    }
}

impl fmt::Display for IrNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IrNodeType {
    type Err = IrError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        IrNodeType::ALL
            .into_iter()
            .find(|node_type| node_type.as_str() == tag)
            .ok_or_else(|| IrError::UnknownNodeType(tag.to_string()))
    }
}

// =============================================================================
// Property values
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    StringList,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyKind::Null => "null",
            PropertyKind::Bool => "bool",
            PropertyKind::Int => "int",
            PropertyKind::Float => "float",
            PropertyKind::String => "string",
            PropertyKind::StringList => "string list",
        };
        f.write_str(name)
    }
}

/// Tagged property value stored on IR nodes.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    StringList(Vec<String>),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Null => PropertyKind::Null,
            PropertyValue::Bool(_) => PropertyKind::Bool,
            PropertyValue::Int(_) => PropertyKind::Int,
            PropertyValue::Float(_) => PropertyKind::Float,
            PropertyValue::String(_) => PropertyKind::String,
            PropertyValue::StringList(_) => PropertyKind::StringList,
        }
    }

    /// Converts a JSON value, requiring `expected` when the property is
    /// declared and inferring the variant from the JSON type otherwise.
    pub(crate) fn from_json(
        value: &serde_json::Value,
        expected: Option<PropertyKind>,
    ) -> Result<Self, String> {
        use serde_json::Value;
        let converted = match (expected, value) {
            (_, Value::Null) => PropertyValue::Null,
            (None | Some(PropertyKind::Bool), Value::Bool(flag)) => PropertyValue::Bool(*flag),
            (Some(PropertyKind::Int), Value::Number(number)) => number
                .as_i64()
                .map(PropertyValue::Int)
                .ok_or_else(|| format!("expected int, found {number}"))?,
            (Some(PropertyKind::Float), Value::Number(number)) => number
                .as_f64()
                .map(PropertyValue::Float)
                .ok_or_else(|| format!("expected float, found {number}"))?,
            (None, Value::Number(number)) => match number.as_i64() {
                Some(int) => PropertyValue::Int(int),
                None => PropertyValue::Float(number.as_f64().unwrap_or_default()),
            },
            (None | Some(PropertyKind::String), Value::String(text)) => {
                PropertyValue::String(text.clone())
            }
            (None | Some(PropertyKind::StringList), Value::Array(items)) => {
                let list = items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| "expected a list of strings".to_string())?;
                PropertyValue::StringList(list)
            }
            (Some(kind), other) => return Err(format!("expected {kind}, found {other}")),
            (None, other) => return Err(format!("unsupported property value {other}")),
        };
        Ok(converted)
    }

    /// Text form used by the visual graph's string properties.
    pub fn to_display_string(&self) -> String {
        match self {
            PropertyValue::Null => String::new(),
            PropertyValue::Bool(flag) => flag.to_string(),
            PropertyValue::Int(value) => value.to_string(),
            PropertyValue::Float(value) => crate::script::format_float(*value),
            PropertyValue::String(text) => text.clone(),
            PropertyValue::StringList(items) => {
                serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
            }
        }
    }

    /// Parses the text form produced by [`PropertyValue::to_display_string`].
    pub fn parse_as(kind: PropertyKind, text: &str) -> Result<Self, String> {
        match kind {
            PropertyKind::Null => Ok(PropertyValue::Null),
            PropertyKind::Bool => match text {
                "true" => Ok(PropertyValue::Bool(true)),
                "false" => Ok(PropertyValue::Bool(false)),
                other => Err(format!("expected true or false, found '{other}'")),
            },
            PropertyKind::Int => text
                .trim()
                .parse()
                .map(PropertyValue::Int)
                .map_err(|err| format!("expected int: {err}")),
            PropertyKind::Float => text
                .trim()
                .parse()
                .map(PropertyValue::Float)
                .map_err(|err| format!("expected float: {err}")),
            PropertyKind::String => Ok(PropertyValue::String(text.to_string())),
            PropertyKind::StringList => {
                if text.trim().is_empty() {
                    return Ok(PropertyValue::StringList(Vec::new()));
                }
                serde_json::from_str(text)
                    .map(PropertyValue::StringList)
                    .map_err(|err| format!("expected JSON string list: {err}"))
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        PropertyValue::StringList(value)
    }
}

// =============================================================================
// Nodes
// =============================================================================

/// IR node. Identity and type are fixed at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct IrNode {
    id: NodeId,
    node_type: IrNodeType,
    properties: BTreeMap<String, PropertyValue>,
    pub source_location: SourceLocation,
    pub x: f64,
    pub y: f64,
}

impl IrNode {
    pub(crate) fn new(id: NodeId, node_type: IrNodeType) -> Self {
        Self {
            id,
            node_type,
            properties: BTreeMap::new(),
            source_location: SourceLocation::default(),
            x: 0.0,
            y: 0.0,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node_type(&self) -> IrNodeType {
        self.node_type
    }

    pub fn properties(&self) -> &BTreeMap<String, PropertyValue> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn remove_property(&mut self, name: &str) -> Option<PropertyValue> {
        self.properties.remove(name)
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    // Strict accessors: `None` when absent or stored under another variant.

    pub fn try_string(&self, name: &str) -> Option<&str> {
        match self.properties.get(name) {
            Some(PropertyValue::String(text)) => Some(text),
            _ => None,
        }
    }

    pub fn try_bool(&self, name: &str) -> Option<bool> {
        match self.properties.get(name) {
            Some(PropertyValue::Bool(flag)) => Some(*flag),
            _ => None,
        }
    }

    pub fn try_int(&self, name: &str) -> Option<i64> {
        match self.properties.get(name) {
            Some(PropertyValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn try_float(&self, name: &str) -> Option<f64> {
        match self.properties.get(name) {
            Some(PropertyValue::Float(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn try_string_list(&self, name: &str) -> Option<&[String]> {
        match self.properties.get(name) {
            Some(PropertyValue::StringList(items)) => Some(items),
            _ => None,
        }
    }

    // Defaulting accessors.

    pub fn get_string(&self, name: &str) -> &str {
        self.try_string(name).unwrap_or_default()
    }

    pub fn get_bool(&self, name: &str) -> bool {
        self.try_bool(name).unwrap_or_default()
    }

    pub fn get_int(&self, name: &str) -> i64 {
        self.try_int(name).unwrap_or_default()
    }

    pub fn get_float(&self, name: &str) -> f64 {
        self.try_float(name).unwrap_or_default()
    }

    pub fn get_string_list(&self, name: &str) -> &[String] {
        self.try_string_list(name).unwrap_or_default()
    }
}
