//! Translation between the internal conversation representation and the
//! wire shapes of each provider API.
//!
//! Every operation here is pure. Supporting a new provider shape only
//! requires a new [`ApiAdapter`] implementation.

use std::sync::Arc;

use chatkit_model::{
    ApiKind, AssistantMessage, Message, OutputItem, ProviderResponse,
    ToolCallRequest, ToolSpec,
};
use serde_json::{Value, json};

/// Translates between messages and one provider's wire format.
pub trait ApiAdapter: Send + Sync + 'static {
    /// Returns the API kind this adapter speaks.
    fn kind(&self) -> ApiKind;

    /// Renders tool specs as the `tools` payload of a request.
    fn format_tools_for_api(&self, specs: &[ToolSpec]) -> Vec<Value>;

    /// Returns the tool calls requested in a response, in provider order.
    ///
    /// Returns an empty list when there are none. This never fails.
    fn parse_tool_calls(&self, resp: &ProviderResponse) -> Vec<ToolCallRequest>;

    /// Renders the output of a tool call as a request input item.
    fn format_tool_response(&self, call_id: &str, output: &Value) -> Value;

    /// Extracts the assistant message of a response, with the requested
    /// tool calls embedded.
    fn extract_assistant_message(&self, resp: &ProviderResponse) -> Message;

    /// Renders one conversation message as request input items.
    fn format_message(&self, msg: &Message) -> Vec<Value>;
}

/// Returns the adapter for the given API kind.
pub fn adapter_for(kind: ApiKind) -> Arc<dyn ApiAdapter> {
    match kind {
        ApiKind::Responses => Arc::new(ResponsesAdapter),
        ApiKind::ChatCompletions => Arc::new(ChatCompletionsAdapter),
    }
}

/// Renders a tool output the way it is embedded in wire payloads.
fn output_to_string(output: &Value) -> String {
    serde_json::to_string_pretty(output).unwrap_or_else(|_| output.to_string())
}

/// Adapter for "responses"-style APIs.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResponsesAdapter;

impl ApiAdapter for ResponsesAdapter {
    #[inline]
    fn kind(&self) -> ApiKind {
        ApiKind::Responses
    }

    fn format_tools_for_api(&self, specs: &[ToolSpec]) -> Vec<Value> {
        specs.iter().map(ToolSpec::to_function_value).collect()
    }

    fn parse_tool_calls(
        &self,
        resp: &ProviderResponse,
    ) -> Vec<ToolCallRequest> {
        let ProviderResponse::Responses(output) = resp else {
            warn!("expected a responses-style output, got {}", resp.api_kind());
            return vec![];
        };
        output
            .output
            .iter()
            .filter_map(|item| match item {
                OutputItem::FunctionCall {
                    call_id,
                    name,
                    arguments,
                    ..
                } => Some(ToolCallRequest {
                    call_id: call_id.clone(),
                    name: name.clone(),
                    arguments: arguments.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    fn format_tool_response(&self, call_id: &str, output: &Value) -> Value {
        json!({
            "type": "function_call_output",
            "call_id": call_id,
            "output": output_to_string(output),
        })
    }

    fn extract_assistant_message(&self, resp: &ProviderResponse) -> Message {
        // Message items without text blocks are skipped.
        let content = match resp {
            ProviderResponse::Responses(output) => {
                output.output.iter().find_map(|item| match item {
                    OutputItem::Message { content, .. } => {
                        content.first().and_then(|block| block.text.clone())
                    }
                    _ => None,
                })
            }
            _ => None,
        };

        Message::Assistant(AssistantMessage {
            content,
            tool_calls: self.parse_tool_calls(resp),
        })
    }

    fn format_message(&self, msg: &Message) -> Vec<Value> {
        match msg {
            Message::Developer(text) => {
                vec![json!({ "role": "developer", "content": text })]
            }
            Message::User(text) => {
                vec![json!({ "role": "user", "content": text })]
            }
            Message::Assistant(msg) => {
                let mut items = Vec::with_capacity(msg.tool_calls.len() + 1);
                if let Some(content) = &msg.content {
                    items.push(
                        json!({ "role": "assistant", "content": content }),
                    );
                }
                items.extend(msg.tool_calls.iter().map(|call| {
                    json!({
                        "type": "function_call",
                        "call_id": call.call_id,
                        "name": call.name,
                        "arguments": call.arguments,
                    })
                }));
                items
            }
            Message::ToolResult(result) => {
                vec![self.format_tool_response(&result.call_id, &result.output)]
            }
        }
    }
}

/// Adapter for "chat completions"-style APIs.
///
/// Developer instructions are sent as `system` messages, which every
/// compatible endpoint understands.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChatCompletionsAdapter;

impl ApiAdapter for ChatCompletionsAdapter {
    #[inline]
    fn kind(&self) -> ApiKind {
        ApiKind::ChatCompletions
    }

    fn format_tools_for_api(&self, specs: &[ToolSpec]) -> Vec<Value> {
        specs
            .iter()
            .map(|spec| {
                json!({
                    "type": "function",
                    "function": {
                        "name": spec.name,
                        "description": spec.description,
                        "parameters": spec.parameters,
                    },
                })
            })
            .collect()
    }

    fn parse_tool_calls(
        &self,
        resp: &ProviderResponse,
    ) -> Vec<ToolCallRequest> {
        let ProviderResponse::ChatCompletion(completion) = resp else {
            warn!("expected a chat completion, got {}", resp.api_kind());
            return vec![];
        };
        let Some(tool_calls) = completion
            .choices
            .first()
            .and_then(|choice| choice.message.tool_calls.as_ref())
        else {
            return vec![];
        };
        tool_calls
            .iter()
            .map(|call| ToolCallRequest {
                call_id: call.id.clone(),
                name: call.function.name.clone(),
                arguments: call.function.arguments.clone(),
            })
            .collect()
    }

    fn format_tool_response(&self, call_id: &str, output: &Value) -> Value {
        json!({
            "role": "tool",
            "tool_call_id": call_id,
            "content": output_to_string(output),
        })
    }

    fn extract_assistant_message(&self, resp: &ProviderResponse) -> Message {
        let content = match resp {
            ProviderResponse::ChatCompletion(completion) => completion
                .choices
                .first()
                .and_then(|choice| choice.message.content.clone()),
            _ => None,
        };
        Message::Assistant(AssistantMessage {
            content,
            tool_calls: self.parse_tool_calls(resp),
        })
    }

    fn format_message(&self, msg: &Message) -> Vec<Value> {
        match msg {
            Message::Developer(text) => {
                vec![json!({ "role": "system", "content": text })]
            }
            Message::User(text) => {
                vec![json!({ "role": "user", "content": text })]
            }
            Message::Assistant(msg) => {
                let mut item = json!({
                    "role": "assistant",
                    "content": msg.content,
                });
                if !msg.tool_calls.is_empty() {
                    item["tool_calls"] = msg
                        .tool_calls
                        .iter()
                        .map(|call| {
                            json!({
                                "id": call.call_id,
                                "type": "function",
                                "function": {
                                    "name": call.name,
                                    "arguments": call.arguments,
                                },
                            })
                        })
                        .collect();
                }
                vec![item]
            }
            Message::ToolResult(result) => {
                vec![self.format_tool_response(&result.call_id, &result.output)]
            }
        }
    }
}
