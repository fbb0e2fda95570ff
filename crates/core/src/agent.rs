mod builder;
mod state;

use std::sync::Arc;

use chatkit_model::{Message, Usage};

use crate::Error;
use crate::conversation::Conversation;
use crate::display::{DisplaySink, InputSource};
use crate::tool::ToolRegistry;
use crate::transport_client::TransportClient;
pub use builder::AgentBuilder;
pub use state::AgentStage;

/// The notice shown when the user ends the chat.
pub const CLOSING_NOTICE: &str = "Chat ended.";

/// An agent instance, which maintains a conversation, a transport and a
/// tool registry.
///
/// The agent runs one logical thread of control: input reading, model
/// requests and tool calls happen one at a time, and `&mut self` keeps the
/// conversation exclusively owned by the running loop.
pub struct Agent {
    client: TransportClient,
    registry: Arc<ToolRegistry>,
    developer_prompt: Option<String>,
    conversation: Conversation,
    stage: AgentStage,
    max_round_trips: Option<usize>,
    parallel_tool_calls: bool,
}

/// What happened during one user turn.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Messages appended to the conversation during this turn, starting
    /// with the user message.
    pub new_messages: Vec<Message>,
    /// How many requests were sent to the model.
    pub round_trips: usize,
    /// Token usage accumulated over all round trips.
    pub usage: Usage,
}

impl TurnOutcome {
    /// Returns the final text reply of this turn, if there is one.
    pub fn reply(&self) -> Option<&str> {
        self.new_messages
            .iter()
            .rev()
            .find(|msg| matches!(msg, Message::Assistant(_)))
            .and_then(Message::content)
    }
}

impl Agent {
    /// Runs the chat loop until the user says `stop` or the input is
    /// exhausted.
    ///
    /// The conversation starts over from the developer instructions. When
    /// an error occurs, it's shown on the sink before being returned, and
    /// the conversation is left as it was for inspection.
    pub async fn run<I, D>(
        &mut self,
        input: &mut I,
        sink: &D,
    ) -> Result<(), Error>
    where
        I: InputSource + ?Sized,
        D: DisplaySink + ?Sized,
    {
        self.conversation = Conversation::new(self.developer_prompt.as_deref());
        self.stage = AgentStage::AwaitingUserInput;

        loop {
            let line = match input.read_line().await {
                Ok(line) => line,
                Err(err) => return Err(self.fail(err.into(), sink)),
            };
            let Some(line) = line.filter(|line| !is_stop_sentinel(line)) else {
                debug!("chat ended by the user");
                sink.show(CLOSING_NOTICE);
                self.stage = AgentStage::Stopped;
                return Ok(());
            };
            self.turn(line, sink).await?;
        }
    }

    /// Runs a single user turn against the current conversation.
    ///
    /// The model is called repeatedly until it replies without requesting
    /// any tools.
    pub async fn turn<D>(
        &mut self,
        input: impl Into<String>,
        sink: &D,
    ) -> Result<TurnOutcome, Error>
    where
        D: DisplaySink + ?Sized,
    {
        let start = self.conversation.len();
        match self.run_turn(input.into(), sink).await {
            Ok((round_trips, usage)) => Ok(TurnOutcome {
                new_messages: self.conversation[start..].to_vec(),
                round_trips,
                usage,
            }),
            Err(err) => Err(self.fail(err, sink)),
        }
    }

    /// Returns the conversation so far.
    #[inline]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Returns the current stage.
    #[inline]
    pub fn stage(&self) -> AgentStage {
        self.stage
    }

    /// Returns the tool registry of this agent.
    #[inline]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    fn fail<D: DisplaySink + ?Sized>(&mut self, err: Error, sink: &D) -> Error {
        error!("agent stopped: {err}");
        sink.show_error(&err);
        self.stage = AgentStage::Stopped;
        err
    }
}

fn is_stop_sentinel(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("stop")
}
