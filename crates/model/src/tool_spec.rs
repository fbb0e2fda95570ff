use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde_json::{Map, Value, json};

/// The description used when a tool doesn't provide one.
pub const FALLBACK_DESCRIPTION: &str = "No description provided.";

/// Describes a tool that can be used by the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ToolSpec {
    /// Name of the tool, unique within a registry.
    pub name: String,
    /// Description of the tool.
    pub description: String,
    /// Parameters definition of the tool.
    ///
    /// For most model providers, the parameters should typically be
    /// defined by a [JSON schema](https://json-schema.org/) of an object.
    pub parameters: Value,
}

impl ToolSpec {
    /// Starts building a spec with the given tool name.
    #[inline]
    pub fn builder<S: Into<String>>(name: S) -> ToolSpecBuilder {
        ToolSpecBuilder::new(name)
    }

    /// Renders this spec as a function tool definition:
    /// `{type: "function", name, description, parameters}`.
    pub fn to_function_value(&self) -> Value {
        json!({
            "type": "function",
            "name": self.name,
            "description": self.description,
            "parameters": self.parameters,
        })
    }
}

/// Builds a [`ToolSpec`] declaratively, one parameter at a time.
///
/// The resulting parameters schema is always an object schema with
/// `additionalProperties: false`, which is what the strict function
/// calling modes of most providers expect.
#[derive(Clone, Debug)]
pub struct ToolSpecBuilder {
    name: String,
    description: Option<String>,
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl ToolSpecBuilder {
    /// Creates a builder for a tool with the given name.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            description: None,
            properties: Map::new(),
            required: vec![],
        }
    }

    /// Sets the tool description.
    #[inline]
    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a required parameter.
    #[inline]
    pub fn param<T: JsonType + ?Sized>(
        self,
        name: &str,
        description: &str,
    ) -> Self {
        self.add_param(name, T::TYPE, description, true)
    }

    /// Adds an optional parameter.
    #[inline]
    pub fn optional_param<T: JsonType + ?Sized>(
        self,
        name: &str,
        description: &str,
    ) -> Self {
        self.add_param(name, T::TYPE, description, false)
    }

    fn add_param(
        mut self,
        name: &str,
        ty: &'static str,
        description: &str,
        required: bool,
    ) -> Self {
        let description = if description.is_empty() {
            format!("{name} parameter")
        } else {
            description.to_owned()
        };
        self.properties.insert(
            name.to_owned(),
            json!({ "type": ty, "description": description }),
        );
        self.required.retain(|n| n != name);
        if required {
            self.required.push(name.to_owned());
        }
        self
    }

    /// Finishes the spec.
    pub fn build(self) -> ToolSpec {
        let description = self
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_DESCRIPTION.to_owned());
        ToolSpec {
            name: self.name,
            description,
            parameters: json!({
                "type": "object",
                "properties": self.properties,
                "required": self.required,
                "additionalProperties": false,
            }),
        }
    }
}

/// Maps a Rust type to the JSON schema primitive advertised for it.
///
/// Integers and floats are both advertised as `number`, as models don't
/// reliably tell them apart anyway.
pub trait JsonType {
    /// The JSON schema type name.
    const TYPE: &'static str;
}

macro_rules! impl_json_type {
    ($ty_name:literal => $($ty:ty),+ $(,)?) => {
        $(
            impl JsonType for $ty {
                const TYPE: &'static str = $ty_name;
            }
        )+
    };
}

impl_json_type!(
    "number" => i8, i16, i32, i64, i128, isize,
    u8, u16, u32, u64, u128, usize, f32, f64
);
impl_json_type!("string" => String, str, char, Value);
impl_json_type!("boolean" => bool);

impl<T: JsonType + ?Sized> JsonType for &T {
    const TYPE: &'static str = T::TYPE;
}

impl<T: JsonType> JsonType for Option<T> {
    const TYPE: &'static str = T::TYPE;
}

impl<T> JsonType for Vec<T> {
    const TYPE: &'static str = "array";
}

impl<T> JsonType for [T] {
    const TYPE: &'static str = "array";
}

impl<T, S> JsonType for HashSet<T, S> {
    const TYPE: &'static str = "array";
}

impl<T> JsonType for BTreeSet<T> {
    const TYPE: &'static str = "array";
}

impl<K, V, S> JsonType for HashMap<K, V, S> {
    const TYPE: &'static str = "object";
}

impl<K, V> JsonType for BTreeMap<K, V> {
    const TYPE: &'static str = "object";
}

impl JsonType for Map<String, Value> {
    const TYPE: &'static str = "object";
}
