//! A local scripted transport for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chatkit_model::{
    ApiKind, ChatCompletion, ChatToolCall, Choice, ChoiceMessage,
    ContentBlock, ErrorKind, FunctionCall, OutputItem, ProviderResponse,
    ResponsesOutput, Transport, TransportError, TransportRequest,
};
use tokio::time::sleep;

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl StdError for Error {}

impl TransportError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    fn body(&self) -> Option<&str> {
        Some(self.message)
    }
}

#[derive(Default)]
struct Script {
    responses: Vec<PresetResponse>,
    next_idx: usize,
    failed_attempts: u64,
    requests: Vec<TransportRequest>,
}

/// A local fake transport for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// model should respond to each request. Responses are consumed in order,
/// one per request, and rendered in the shape of the configured
/// [`ApiKind`]. If there are no enough responses in the script, an error
/// will be returned.
///
/// Clones share the same script, so a test can keep a clone around to
/// inspect the requests the agent has sent.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone)]
pub struct ScriptedTransport {
    api_kind: ApiKind,
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    #[inline]
    pub fn new(api_kind: ApiKind) -> Self {
        Self {
            api_kind,
            script: Default::default(),
            delay: None,
        }
    }

    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        self.script().responses.push(preset);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns all requests received so far.
    #[inline]
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.script().requests.clone()
    }

    /// Returns how many requests have been received so far.
    #[inline]
    pub fn request_count(&self) -> usize {
        self.script().requests.len()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        // A panicking test may poison the lock, the script is still usable.
        self.script.lock().unwrap_or_else(|err| err.into_inner())
    }

    fn next_response(
        &self,
        req: &TransportRequest,
    ) -> Result<ProviderResponse, Error> {
        let mut script = self.script();
        script.requests.push(req.clone());

        let step_idx = script.next_idx;
        let Some(preset) = script.responses.get(step_idx).cloned() else {
            return Err(Error {
                message: "no enough responses",
                kind: ErrorKind::Other,
            });
        };

        if let Some(failures) = preset.failures {
            if failures == 0 || script.failed_attempts < failures {
                script.failed_attempts += 1;
                return Err(Error {
                    message: "preset failure",
                    kind: ErrorKind::RateLimitExceeded,
                });
            }
        }

        script.next_idx += 1;
        script.failed_attempts = 0;
        Ok(render_response(self.api_kind, step_idx, &preset))
    }
}

impl Transport for ScriptedTransport {
    type Error = crate::Error;

    #[inline]
    fn api_kind(&self) -> ApiKind {
        self.api_kind
    }

    fn send(
        &self,
        req: &TransportRequest,
    ) -> impl Future<Output = Result<ProviderResponse, Self::Error>> + Send + 'static
    {
        let result = self.next_response(req);
        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                sleep(delay).await;
            }
            result
        }
    }
}

fn render_response(
    api_kind: ApiKind,
    step_idx: usize,
    preset: &PresetResponse,
) -> ProviderResponse {
    match api_kind {
        ApiKind::Responses => {
            let output = preset
                .events
                .iter()
                .enumerate()
                .map(|(idx, event)| match event {
                    PresetEvent::Message(text) => OutputItem::Message {
                        id: Some(format!("msg_{step_idx}_{idx}")),
                        content: vec![ContentBlock::output_text(text)],
                    },
                    PresetEvent::ToolCall(req) => OutputItem::FunctionCall {
                        id: Some(format!("fc_{step_idx}_{idx}")),
                        call_id: req.call_id.clone(),
                        name: req.name.clone(),
                        arguments: req.arguments.clone(),
                    },
                })
                .collect();
            ProviderResponse::Responses(ResponsesOutput {
                id: Some(format!("resp_{step_idx}")),
                output,
                usage: preset.usage,
            })
        }
        ApiKind::ChatCompletions => {
            let mut content: Option<String> = None;
            let mut tool_calls = vec![];
            for event in &preset.events {
                match event {
                    PresetEvent::Message(text) => {
                        content.get_or_insert_default().push_str(text);
                    }
                    PresetEvent::ToolCall(req) => tool_calls.push(ChatToolCall {
                        id: req.call_id.clone(),
                        kind: Some("function".to_owned()),
                        function: FunctionCall {
                            name: req.name.clone(),
                            arguments: req.arguments.clone(),
                        },
                    }),
                }
            }
            let finish_reason = if tool_calls.is_empty() {
                "stop"
            } else {
                "tool_calls"
            };
            ProviderResponse::ChatCompletion(ChatCompletion {
                id: Some(format!("chatcmpl-{step_idx}")),
                choices: vec![Choice {
                    message: ChoiceMessage {
                        content,
                        tool_calls: (!tool_calls.is_empty())
                            .then_some(tool_calls),
                    },
                    finish_reason: Some(finish_reason.to_owned()),
                }],
                usage: preset.usage,
            })
        }
    }
}
