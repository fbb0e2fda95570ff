use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chatkit_core::tool::ToolRegistry;
use chatkit_mcp::{Error, McpClient, McpTools, McpTransport, PROTOCOL_VERSION};
use chatkit_model::{ApiKind, FALLBACK_DESCRIPTION, ToolCallRequest};
use serde_json::{Value, json};

/// An in-process MCP server answering every request right away.
#[derive(Default)]
struct FakeServer {
    sent: Arc<Mutex<Vec<Value>>>,
    stopped: Arc<AtomicBool>,
    pending: VecDeque<Value>,
}

impl FakeServer {
    fn reply(message: &Value) -> Value {
        let id = &message["id"];
        match Self::handle(&message["method"], &message["params"]) {
            Ok(result) => {
                json!({ "jsonrpc": "2.0", "id": id, "result": result })
            }
            Err(error) => {
                json!({ "jsonrpc": "2.0", "id": id, "error": error })
            }
        }
    }

    fn handle(method: &Value, params: &Value) -> Result<Value, Value> {
        match method.as_str() {
            Some("initialize") => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": { "name": "fake", "version": "1.0.0" },
            })),
            Some("tools/list") if params.get("cursor").is_none() => {
                Ok(json!({
                    "tools": [{
                        "name": "add",
                        "description": "Adds two numbers.",
                        "inputSchema": {
                            "title": "AddArgs",
                            "type": "object",
                            "properties": {
                                "a": { "type": "number" },
                                "b": { "type": "number" },
                            },
                            "required": ["a", "b"],
                        },
                    }],
                    "nextCursor": "page-2",
                }))
            }
            Some("tools/list") => Ok(json!({
                "tools": [
                    { "name": "_reset", "inputSchema": { "type": "object" } },
                    {
                        "name": "shout",
                        "inputSchema": {
                            "type": "object",
                            "properties": { "text": { "type": "string" } },
                        },
                    },
                ],
            })),
            Some("tools/call") => Self::call(params),
            _ => Err(json!({ "code": -32601, "message": "Method not found" })),
        }
    }

    fn call(params: &Value) -> Result<Value, Value> {
        let args = &params["arguments"];
        match params["name"].as_str() {
            Some("add") => {
                let a = args["a"].as_f64().unwrap();
                let sum = a + args["b"].as_f64().unwrap();
                Ok(json!({
                    "content": [{ "type": "text", "text": sum.to_string() }],
                    "structuredContent": { "sum": sum },
                }))
            }
            Some("shout") => match args["text"].as_str() {
                Some(text) if !text.is_empty() => {
                    let text = text.to_uppercase();
                    Ok(json!({ "content": [{ "type": "text", "text": text }] }))
                }
                _ => Ok(json!({
                    "content": [{ "type": "text", "text": "nothing to shout" }],
                    "isError": true,
                })),
            },
            Some(name) => Err(json!({
                "code": -32602,
                "message": format!("Unknown tool: {name}"),
            })),
            None => Err(json!({ "code": -32602, "message": "Missing name" })),
        }
    }
}

#[async_trait]
impl McpTransport for FakeServer {
    async fn send(&mut self, message: &Value) -> Result<(), Error> {
        self.sent.lock().unwrap().push(message.clone());
        if message.get("id").is_none() {
            return Ok(());
        }
        // Log notifications interleave with responses.
        self.pending.push_back(json!({
            "jsonrpc": "2.0",
            "method": "notifications/message",
            "params": { "level": "info", "data": "working" },
        }));
        self.pending.push_back(Self::reply(message));
        Ok(())
    }

    async fn receive(&mut self) -> Result<Value, Error> {
        self.pending.pop_front().ok_or(Error::NoResponse)
    }

    async fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

fn call(name: &str, arguments: &str) -> ToolCallRequest {
    ToolCallRequest {
        call_id: format!("call_{name}"),
        name: name.to_owned(),
        arguments: arguments.to_owned(),
    }
}

#[tokio::test]
async fn test_handshake_and_listing() {
    let server = FakeServer::default();
    let sent = Arc::clone(&server.sent);
    let client = Arc::new(McpClient::new(server));

    let tools = McpTools::load(client).await.unwrap();
    let names: Vec<_> =
        tools.infos().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["add", "_reset", "shout"]);

    let sent = sent.lock().unwrap();
    let methods: Vec<_> =
        sent.iter().map(|m| m["method"].as_str().unwrap()).collect();
    assert_eq!(
        methods,
        [
            "initialize",
            "notifications/initialized",
            "tools/list",
            "tools/list",
        ]
    );
    assert_eq!(sent[0]["params"]["protocolVersion"], PROTOCOL_VERSION);
    assert_eq!(sent[0]["jsonrpc"], "2.0");
    assert!(sent[1].get("id").is_none());
    assert_eq!(sent[3]["params"]["cursor"], "page-2");
}

#[tokio::test]
async fn test_registered_tools() {
    let client = Arc::new(McpClient::new(FakeServer::default()));
    let tools = McpTools::load(client).await.unwrap();

    let mut registry = ToolRegistry::new(ApiKind::ChatCompletions);
    registry.register_all(Arc::new(tools));
    let names: Vec<_> =
        registry.specs().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["add", "shout"]);

    let listed = registry.list_for_api();
    let add = &listed[0]["function"];
    assert_eq!(add["description"], "Adds two numbers.");
    assert_eq!(
        add["parameters"],
        json!({
            "type": "object",
            "properties": {
                "a": { "type": "number" },
                "b": { "type": "number" },
            },
            "required": ["a", "b"],
            "additionalProperties": false,
        })
    );
    assert_eq!(listed[1]["function"]["description"], FALLBACK_DESCRIPTION);

    let result = registry.invoke(&call("add", r#"{"a":1,"b":2}"#)).await;
    assert_eq!(result.unwrap().output, json!({ "sum": 3.0 }));

    let result = registry.invoke(&call("shout", r#"{"text":"hi"}"#)).await;
    assert_eq!(result.unwrap().output, json!("HI"));

    let err = registry
        .invoke(&call("shout", r#"{"text":""}"#))
        .await
        .unwrap_err();
    let chatkit_core::Error::ToolExecution { name, source } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(name, "shout");
    assert_eq!(source.reason(), "nothing to shout");
}

#[tokio::test]
async fn test_rpc_error_and_shutdown() {
    let server = FakeServer::default();
    let stopped = Arc::clone(&server.stopped);
    let client = McpClient::new(server);

    let err = client.call_tool("missing", json!({})).await.unwrap_err();
    let Error::Rpc { code, message } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(*code, -32602);
    assert_eq!(message, "Unknown tool: missing");

    client.shutdown().await;
    assert!(stopped.load(Ordering::SeqCst));
}
