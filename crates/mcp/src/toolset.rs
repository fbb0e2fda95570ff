use std::sync::Arc;

use chatkit_core::tool::{
    AnyTool, Error as ToolError, Tool, ToolResult, Toolset,
};
use chatkit_model::FALLBACK_DESCRIPTION;
use serde_json::{Map, Value, json};

use crate::Error;
use crate::client::{McpClient, McpToolInfo};

/// The tools of an MCP server, registered through `register_all` of a
/// [`ToolRegistry`](chatkit_core::tool::ToolRegistry).
///
/// Calls are forwarded to the server. A call the server flags as an
/// error fails with the text it returned.
pub struct McpTools {
    client: Arc<McpClient>,
    infos: Vec<McpToolInfo>,
}

impl McpTools {
    /// Initializes the client and fetches the server's tool list.
    pub async fn load(client: Arc<McpClient>) -> Result<Self, Error> {
        client.initialize().await?;
        let infos = client.list_tools().await?;
        Ok(Self { client, infos })
    }

    /// Returns the tools as advertised by the server.
    #[inline]
    pub fn infos(&self) -> &[McpToolInfo] {
        &self.infos
    }
}

impl Toolset for McpTools {
    fn tools(self: Arc<Self>) -> Vec<AnyTool> {
        self.infos
            .iter()
            .map(|info| {
                AnyTool::new(McpTool::new(Arc::clone(&self.client), info))
            })
            .collect()
    }
}

struct McpTool {
    client: Arc<McpClient>,
    name: String,
    description: String,
    parameters: Value,
}

impl McpTool {
    fn new(client: Arc<McpClient>, info: &McpToolInfo) -> Self {
        let description = info
            .description
            .as_deref()
            .map(str::trim)
            .filter(|desc| !desc.is_empty())
            .unwrap_or(FALLBACK_DESCRIPTION);
        Self {
            client,
            name: info.name.clone(),
            description: description.to_owned(),
            parameters: object_parameters(&info.input_schema),
        }
    }
}

/// Reshapes an input schema into a closed object schema.
fn object_parameters(schema: &Value) -> Value {
    let properties = schema
        .get("properties")
        .filter(|props| props.is_object())
        .cloned()
        .unwrap_or_else(|| json!({}));
    let required = schema
        .get("required")
        .filter(|required| required.is_array())
        .cloned()
        .unwrap_or_else(|| json!([]));
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

impl Tool for McpTool {
    type Input = Map<String, Value>;
    type Output = Value;

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameters
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: Map<String, Value>,
    ) -> impl Future<Output = ToolResult<Value>> + Send + 'static {
        let client = Arc::clone(&self.client);
        let name = self.name.clone();
        async move {
            let result = client
                .call_tool(&name, Value::Object(input))
                .await
                .map_err(|err| {
                    ToolError::execution_error().with_reason(err.to_string())
                })?;
            if result.is_error {
                let reason = result.text();
                return Err(ToolError::execution_error().with_reason(reason));
            }
            Ok(result.into_output())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_parameters() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "title": "FetchArgs",
            "properties": { "url": { "type": "string", "format": "uri" } },
            "required": ["url"],
        });
        assert_eq!(
            object_parameters(&schema),
            json!({
                "type": "object",
                "properties": { "url": { "type": "string", "format": "uri" } },
                "required": ["url"],
                "additionalProperties": false,
            })
        );

        assert_eq!(
            object_parameters(&Value::Null),
            json!({
                "type": "object",
                "properties": {},
                "required": [],
                "additionalProperties": false,
            })
        );
    }
}
