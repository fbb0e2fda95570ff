use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::ApiKind;

/// A provider response, decoded into the shape of the API it came from.
///
/// Transports produce this value right after receiving the body. Adapters
/// consume it to get the assistant message and tool call requests out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderResponse {
    /// A response from a "responses"-style API.
    Responses(ResponsesOutput),
    /// A response from a "chat completions"-style API.
    ChatCompletion(ChatCompletion),
}

impl ProviderResponse {
    /// Returns the API kind this response was decoded as.
    #[inline]
    pub fn api_kind(&self) -> ApiKind {
        match self {
            ProviderResponse::Responses(_) => ApiKind::Responses,
            ProviderResponse::ChatCompletion(_) => ApiKind::ChatCompletions,
        }
    }

    /// Returns the token usage reported by the provider, if any.
    #[inline]
    pub fn usage(&self) -> Option<Usage> {
        match self {
            ProviderResponse::Responses(resp) => resp.usage,
            ProviderResponse::ChatCompletion(resp) => resp.usage,
        }
    }
}

// ------------------------
// "Responses"-style shapes
// ------------------------

/// The body of a "responses"-style API response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsesOutput {
    /// The response identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The flat list of output items.
    #[serde(default)]
    pub output: Vec<OutputItem>,
    /// Token usage of this response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// An item in the `output` list of a "responses"-style API response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    /// A message produced by the model.
    Message {
        /// The item identifier.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// The content blocks of the message.
        #[serde(default)]
        content: Vec<ContentBlock>,
    },
    /// A function call requested by the model.
    FunctionCall {
        /// The item identifier.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// The identifier correlating the call with its output.
        call_id: String,
        /// The name of the function to call.
        name: String,
        /// The JSON-encoded arguments.
        #[serde(default)]
        arguments: String,
    },
    /// Items the agent doesn't care about (reasoning, web search, ...).
    #[serde(other)]
    Other,
}

/// A content block of an [`OutputItem::Message`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// The block type, e.g. `output_text` or `refusal`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// The text of the block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    /// Creates an `output_text` block.
    #[inline]
    pub fn output_text<S: Into<String>>(text: S) -> Self {
        Self {
            kind: Some("output_text".to_owned()),
            text: Some(text.into()),
        }
    }
}

// -------------------------------
// "Chat completions"-style shapes
// -------------------------------

/// The body of a "chat completions"-style API response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletion {
    /// The completion identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The completion choices.
    pub choices: Vec<Choice>,
    /// Token usage of this completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// A choice of a [`ChatCompletion`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// The assistant message of this choice.
    pub message: ChoiceMessage,
    /// Why the model stopped, e.g. `stop` or `tool_calls`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// The message of a [`Choice`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceMessage {
    /// The text reply.
    #[serde(default)]
    pub content: Option<String>,
    /// Tool calls requested by the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ChatToolCall>>,
}

/// A tool call in a [`ChoiceMessage`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatToolCall {
    /// The identifier correlating the call with its result.
    pub id: String,
    /// The tool type, usually `function`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// The function to call.
    pub function: FunctionCall,
}

/// The function of a [`ChatToolCall`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// The name of the function.
    pub name: String,
    /// The JSON-encoded arguments.
    #[serde(default)]
    pub arguments: String,
}

// -----
// Usage
// -----

/// Token usage reported by the provider.
///
/// Both naming schemes are accepted: `input_tokens`/`output_tokens` of
/// the "responses" APIs and `prompt_tokens`/`completion_tokens` of the
/// "chat completions" APIs.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct Usage {
    /// Tokens consumed by the input.
    #[serde(default, alias = "prompt_tokens")]
    pub input_tokens: u64,
    /// Tokens produced by the model.
    #[serde(default, alias = "completion_tokens")]
    pub output_tokens: u64,
}

impl Usage {
    /// Returns the total number of tokens.
    #[inline]
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

impl AddAssign for Usage {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.input_tokens += rhs.input_tokens;
        self.output_tokens += rhs.output_tokens;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_responses_output() {
        let body = json!({
            "id": "resp_1",
            "output": [
                { "type": "reasoning", "id": "rs_1", "summary": [] },
                {
                    "type": "function_call",
                    "id": "fc_1",
                    "call_id": "call_1",
                    "name": "get_weather",
                    "arguments": "{\"city\":\"Paris\"}"
                },
                {
                    "type": "message",
                    "id": "msg_1",
                    "role": "assistant",
                    "content": [
                        {
                            "type": "output_text",
                            "text": "Sunny.",
                            "annotations": []
                        }
                    ]
                }
            ],
            "usage": {
                "input_tokens": 12,
                "output_tokens": 3,
                "total_tokens": 15
            }
        });
        let resp: ResponsesOutput = serde_json::from_value(body).unwrap();
        assert_eq!(resp.output.len(), 3);
        assert_eq!(resp.output[0], OutputItem::Other);
        assert!(matches!(
            &resp.output[1],
            OutputItem::FunctionCall { name, .. } if name == "get_weather"
        ));
        assert_eq!(
            resp.output[2],
            OutputItem::Message {
                id: Some("msg_1".to_owned()),
                content: vec![ContentBlock::output_text("Sunny.")],
            }
        );
        let usage = resp.usage.unwrap();
        assert_eq!(usage.total_tokens(), 15);
    }

    #[test]
    fn test_decode_chat_completion() {
        let body = json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "add", "arguments": "{\"a\":1}" }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {
                "prompt_tokens": 20,
                "completion_tokens": 5,
                "total_tokens": 25
            }
        });
        let resp: ChatCompletion = serde_json::from_value(body).unwrap();
        let message = &resp.choices[0].message;
        assert_eq!(message.content, None);
        let tool_calls = message.tool_calls.as_ref().unwrap();
        assert_eq!(tool_calls[0].function.name, "add");
        assert_eq!(
            resp.usage,
            Some(Usage {
                input_tokens: 20,
                output_tokens: 5
            })
        );

        let resp = ProviderResponse::ChatCompletion(resp);
        assert_eq!(resp.api_kind(), ApiKind::ChatCompletions);
    }

    #[test]
    fn test_null_tool_calls() {
        let body = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Hi",
                    "tool_calls": null
                }
            }]
        });
        let resp: ChatCompletion = serde_json::from_value(body).unwrap();
        assert_eq!(resp.choices[0].message.tool_calls, None);
    }

    #[test]
    fn test_accumulate_usage() {
        let mut usage = Usage::default();
        usage += Usage {
            input_tokens: 3,
            output_tokens: 4,
        };
        usage += Usage {
            input_tokens: 1,
            output_tokens: 2,
        };
        assert_eq!(usage.input_tokens, 4);
        assert_eq!(usage.output_tokens, 6);
        assert_eq!(usage.total_tokens(), 10);
    }
}
