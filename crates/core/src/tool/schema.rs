use chatkit_model::{FALLBACK_DESCRIPTION, ToolSpec};
use schemars::JsonSchema;
use serde_json::{Map, Value, json};

/// Derives a tool spec from the JSON schema of an input type.
///
/// The derived schema is flattened into the simple shape models handle
/// best: each property gets one primitive type (`number` for both
/// integers and floats, `string` for anything that doesn't map cleanly)
/// and a description. Properties without a default value are required.
///
/// The doc comment of the input type becomes the tool description.
///
/// ```ignore
/// /// Adds two numbers.
/// #[derive(Deserialize, JsonSchema)]
/// struct AddInput {
///     /// The left operand.
///     a: f64,
///     #[serde(default)]
///     b: f64,
/// }
///
/// let spec = derive_spec::<AddInput>("add");
/// ```
pub fn derive_spec<I: JsonSchema>(name: impl Into<String>) -> ToolSpec {
    let schema = schemars::schema_for!(I).to_value();

    let description = schema
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_DESCRIPTION)
        .to_owned();

    let mut properties = Map::new();
    if let Some(props) = schema.get("properties").and_then(Value::as_object) {
        for (prop_name, prop) in props {
            let prop_desc = prop
                .get("description")
                .and_then(Value::as_str)
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| format!("{prop_name} parameter"));
            let prop_type = primitive_type(prop);
            properties.insert(
                prop_name.clone(),
                json!({ "type": prop_type, "description": prop_desc }),
            );
        }
    }

    let required = schema
        .get("required")
        .cloned()
        .unwrap_or_else(|| Value::Array(vec![]));

    ToolSpec {
        name: name.into(),
        description,
        parameters: json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        }),
    }
}

fn primitive_type(prop: &Value) -> &'static str {
    let ty = match prop.get("type") {
        Some(Value::String(ty)) => Some(ty.as_str()),
        // Nullable types are spelled as `["string", "null"]`.
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|ty| *ty != "null"),
        _ => None,
    };
    match ty {
        Some("integer" | "number") => "number",
        Some("string") => "string",
        Some("boolean") => "boolean",
        Some("array") => "array",
        Some("object") => "object",
        Some(_) => "string",
        None if prop.get("$ref").is_some() => "object",
        None if prop.get("properties").is_some() => "object",
        None if prop.get("items").is_some() => "array",
        None => "string",
    }
}
