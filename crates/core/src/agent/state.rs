use chatkit_model::{
    Message, ToolCallRequest, ToolResult, TransportRequest, Usage,
};
use futures_util::future::join_all;

use super::Agent;
use crate::Error;
use crate::display::DisplaySink;

/// The stage an [`Agent`] is in.
///
/// ```text
/// AwaitingUserInput -> RequestingCompletion -> DispatchingTools
///         ^                   |    ^                  |
///         +-------------------+    +------------------+
/// ```
///
/// `Stopped` is terminal for the current run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AgentStage {
    /// Waiting for the next user input.
    #[default]
    AwaitingUserInput,
    /// Waiting for the model to reply.
    RequestingCompletion,
    /// Running the tools the model requested.
    DispatchingTools,
    /// The run has ended, either by the user or by an error.
    Stopped,
}

impl Agent {
    /// Drives one turn, returning the round trip count and usage.
    pub(super) async fn run_turn<D>(
        &mut self,
        input: String,
        sink: &D,
    ) -> Result<(usize, Usage), Error>
    where
        D: DisplaySink + ?Sized,
    {
        self.conversation.push(Message::User(input));

        let mut round_trips = 0;
        let mut usage = Usage::default();
        loop {
            let exceeded = self
                .max_round_trips
                .filter(|limit| round_trips >= *limit);
            if let Some(limit) = exceeded {
                warn!("still requesting tools after {limit} round trips");
                return Err(Error::RoundTripLimitExceeded { limit });
            }

            self.stage = AgentStage::RequestingCompletion;
            let req = self.build_request();
            let resp = self.client.send(req).await.map_err(Error::Transport)?;
            round_trips += 1;
            if let Some(resp_usage) = resp.usage() {
                usage += resp_usage;
            }

            let msg = self.registry.adapter().extract_assistant_message(&resp);
            let calls = self.registry.parse_calls(&resp);
            if let Some(text) = msg.content().filter(|text| !text.is_empty()) {
                sink.show_assistant_reply(text);
            }
            self.conversation.push(msg);

            if calls.is_empty() {
                trace!("turn finished after {round_trips} round trips");
                self.stage = AgentStage::AwaitingUserInput;
                return Ok((round_trips, usage));
            }

            self.stage = AgentStage::DispatchingTools;
            debug!("dispatching {} tool calls", calls.len());
            self.dispatch_tools(&calls, sink).await?;
        }
    }

    async fn dispatch_tools<D>(
        &mut self,
        calls: &[ToolCallRequest],
        sink: &D,
    ) -> Result<(), Error>
    where
        D: DisplaySink + ?Sized,
    {
        if self.parallel_tool_calls && calls.len() > 1 {
            let registry = &self.registry;
            let results =
                join_all(calls.iter().map(|call| registry.invoke(call))).await;
            // Results are recorded in the order the model requested them.
            for (call, result) in calls.iter().zip(results) {
                self.record_tool_result(call, result?, sink);
            }
        } else {
            for call in calls {
                let result = self.registry.invoke(call).await?;
                self.record_tool_result(call, result, sink);
            }
        }
        Ok(())
    }

    fn record_tool_result<D>(
        &mut self,
        call: &ToolCallRequest,
        result: ToolResult,
        sink: &D,
    ) where
        D: DisplaySink + ?Sized,
    {
        self.conversation.push(Message::ToolResult(result.clone()));
        sink.show_tool_call(&call.name, &call.arguments, &result);
    }

    fn build_request(&self) -> TransportRequest {
        let adapter = self.registry.adapter();
        TransportRequest {
            input: self
                .conversation
                .iter()
                .flat_map(|msg| adapter.format_message(msg))
                .collect(),
            tools: self.registry.list_for_api(),
        }
    }
}
