use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::Error;
use crate::transport::McpTransport;

/// The protocol revision announced during the handshake.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// A tool advertised by an MCP server.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Value,
}

/// The result of a `tools/call` request.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<Value>,
    #[serde(default)]
    pub structured_content: Option<Value>,
    #[serde(default)]
    pub is_error: bool,
}

impl CallToolResult {
    /// Joins the text blocks of the content.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|block| block["type"] == "text")
            .filter_map(|block| block["text"].as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns the structured content if any, then the text, then the
    /// raw content blocks.
    pub fn into_output(self) -> Value {
        if let Some(structured) = self.structured_content {
            return structured;
        }
        let text = self.text();
        if !text.is_empty() {
            return Value::String(text);
        }
        Value::Array(self.content)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListToolsResult {
    tools: Vec<McpToolInfo>,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// A JSON-RPC client for one MCP server.
///
/// Requests are serialized: each one waits for its response before the
/// next is sent.
pub struct McpClient {
    transport: Mutex<Box<dyn McpTransport>>,
    next_id: AtomicU64,
}

impl McpClient {
    /// Creates a client over a connected transport.
    pub fn new<T: McpTransport>(transport: T) -> Self {
        Self {
            transport: Mutex::new(Box::new(transport)),
            next_id: AtomicU64::new(1),
        }
    }

    /// Performs the handshake, returning the server's `initialize` result.
    pub async fn initialize(&self) -> Result<Value, Error> {
        let result = self
            .request(
                "initialize",
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": "chatkit",
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                }),
            )
            .await?;
        self.notify("notifications/initialized").await?;
        Ok(result)
    }

    /// Lists every tool of the server, following pagination.
    pub async fn list_tools(&self) -> Result<Vec<McpToolInfo>, Error> {
        let mut tools = vec![];
        let mut cursor: Option<String> = None;
        loop {
            let params = match &cursor {
                Some(cursor) => json!({ "cursor": cursor }),
                None => json!({}),
            };
            let page: ListToolsResult =
                self.request_as("tools/list", params).await?;
            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }
        debug!("server has {} tools", tools.len());
        Ok(tools)
    }

    /// Calls a tool. `arguments` should be a JSON object.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<CallToolResult, Error> {
        self.request_as(
            "tools/call",
            json!({ "name": name, "arguments": arguments }),
        )
        .await
    }

    /// Stops the underlying transport.
    pub async fn shutdown(&self) {
        self.transport.lock().await.stop().await;
    }

    async fn request_as<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<R, Error> {
        let result = self.request(method, params).await?;
        serde_json::from_value(result).map_err(|err| {
            Error::UnexpectedResponse {
                method: method.to_owned(),
                reason: err.to_string(),
            }
        })
    }

    async fn request(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Value, Error> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut transport = self.transport.lock().await;
        trace!("sending `{method}` request #{id}");
        transport
            .send(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            }))
            .await?;

        loop {
            let mut message = transport.receive().await?;
            // Notifications and server-initiated requests carry a method.
            if message.get("method").is_some()
                || message["id"].as_u64() != Some(id)
            {
                trace!("skipping unrelated message: {message}");
                continue;
            }

            if let Some(err) = message.get("error") {
                let code = err["code"].as_i64().unwrap_or_default();
                let message = err["message"].as_str().unwrap_or_default();
                warn!("`{method}` failed with {code}: {message}");
                return Err(Error::Rpc {
                    code,
                    message: message.to_owned(),
                });
            }
            return match message.get_mut("result") {
                Some(result) => Ok(result.take()),
                None => Err(Error::UnexpectedResponse {
                    method: method.to_owned(),
                    reason: "missing `result`".to_owned(),
                }),
            };
        }
    }

    async fn notify(&self, method: &str) -> Result<(), Error> {
        let mut transport = self.transport.lock().await;
        transport
            .send(&json!({ "jsonrpc": "2.0", "method": method }))
            .await
    }
}
