use chatkit_model::{ToolCallRequest, Usage};
use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message")]
    Message(String),
    #[serde(rename = "tool_call")]
    ToolCall(ToolCallRequest),
}

/// The preset response for one request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// Token usage to report with this response.
    #[serde(default)]
    pub usage: Option<Usage>,
    /// If set, the request will fail in the first `failures` attempts.
    /// `Some(0)` means the request will fail infinitely.
    #[serde(default)]
    pub failures: Option<u64>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            ..Default::default()
        }
    }

    /// Creates a `PresetResponse` with a single text message.
    #[inline]
    pub fn message<S: Into<String>>(text: S) -> Self {
        Self::with_events([PresetEvent::Message(text.into())])
    }

    /// Creates a `PresetResponse` with a single tool call and no text.
    #[inline]
    pub fn tool_call(call_id: &str, name: &str, arguments: &str) -> Self {
        Self::with_events([PresetEvent::ToolCall(ToolCallRequest {
            call_id: call_id.to_owned(),
            name: name.to_owned(),
            arguments: arguments.to_owned(),
        })])
    }

    /// Sets the token usage reported with this response.
    #[inline]
    pub fn with_usage(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.usage = Some(Usage {
            input_tokens,
            output_tokens,
        });
        self
    }

    /// Sets failure times before a successful response. `0` means the
    /// response will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let response = PresetResponse::with_events([
            PresetEvent::Message("I have left a message for you.".to_string()),
            PresetEvent::ToolCall(ToolCallRequest {
                call_id: "1".to_string(),
                name: "write_file".to_string(),
                arguments: r#"{"filename":"message.txt"}"#.to_string(),
            }),
        ])
        .with_usage(10, 2);

        let serialized = serde_json::to_string(&response).unwrap();
        let deserialized: PresetResponse =
            serde_json::from_str(&serialized).unwrap();

        assert_eq!(response, deserialized);
    }
}
