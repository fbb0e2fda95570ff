use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The role of a [`Message`] in the conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Instructions from the developer (a.k.a. system prompt).
    Developer,
    /// Input from the user.
    User,
    /// Output from the model.
    Assistant,
    /// The output of a tool call.
    ToolResult,
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Developer => "developer",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::ToolResult => "tool-result",
        })
    }
}

/// A complete message in the conversation history.
///
/// The history is append-only and its order is significant: it is sent
/// back to the model as-is on every round trip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// The developer instructions.
    Developer(String),
    /// A user input text.
    User(String),
    /// A reply from the model.
    Assistant(AssistantMessage),
    /// A tool call result.
    ToolResult(ToolResult),
}

impl Message {
    /// Returns the role of this message.
    #[inline]
    pub fn role(&self) -> Role {
        match self {
            Message::Developer(_) => Role::Developer,
            Message::User(_) => Role::User,
            Message::Assistant(_) => Role::Assistant,
            Message::ToolResult(_) => Role::ToolResult,
        }
    }

    /// Returns the text content of this message, if there is any.
    ///
    /// Tool results have structured content and always return `None`.
    #[inline]
    pub fn content(&self) -> Option<&str> {
        match self {
            Message::Developer(text) | Message::User(text) => Some(text),
            Message::Assistant(msg) => msg.content.as_deref(),
            Message::ToolResult(_) => None,
        }
    }
}

/// A message produced by the model.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssistantMessage {
    /// The text reply. `None` when the model only requested tool calls.
    pub content: Option<String>,
    /// Tool calls requested in this turn, in the order the provider
    /// returned them.
    pub tool_calls: Vec<ToolCallRequest>,
}

impl AssistantMessage {
    /// Creates a text-only assistant message.
    #[inline]
    pub fn text<S: Into<String>>(content: S) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: vec![],
        }
    }
}

/// Describes a tool call request from the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// The identifier correlating this request with its result.
    pub call_id: String,
    /// The name of the tool to call.
    pub name: String,
    /// The raw argument payload, as sent by the provider.
    ///
    /// This is usually a JSON object encoded as a string, but nothing is
    /// guaranteed until the tool registry parses it.
    pub arguments: String,
}

/// The result of calling a tool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolResult {
    /// The identifier of the originating [`ToolCallRequest`].
    pub call_id: String,
    /// The value returned by the tool.
    pub output: Value,
}
