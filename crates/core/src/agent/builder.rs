use std::num::NonZeroUsize;
use std::sync::Arc;

use chatkit_model::Transport;

use super::{Agent, AgentStage};
use crate::Error;
use crate::conversation::Conversation;
use crate::tool::{AnyTool, Tool, ToolRegistry};
use crate::transport_client::TransportClient;

/// [`Agent`] builder.
pub struct AgentBuilder {
    client: TransportClient,
    registry: Option<Arc<ToolRegistry>>,
    tools: Vec<AnyTool>,
    developer_prompt: Option<String>,
    max_round_trips: Option<usize>,
    parallel_tool_calls: bool,
}

impl AgentBuilder {
    /// Creates a new builder with the specified transport.
    #[inline]
    pub fn with_transport<T: Transport + 'static>(transport: T) -> Self {
        Self {
            client: TransportClient::new(transport),
            registry: None,
            tools: vec![],
            developer_prompt: None,
            max_round_trips: None,
            parallel_tool_calls: false,
        }
    }

    /// Uses a prepared tool registry, which may be shared with other
    /// agents.
    ///
    /// Without one, the agent gets an empty registry for the API kind of
    /// the transport.
    #[inline]
    pub fn with_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.push(AnyTool::new(tool));
        self
    }

    /// Registers a type-erased tool.
    #[inline]
    pub fn with_any_tool(mut self, tool: AnyTool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Sets the developer instructions the conversation is seeded with.
    #[inline]
    pub fn with_developer_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.developer_prompt = Some(prompt.into());
        self
    }

    /// Limits how many requests a single user turn may send. A turn always
    /// gets to send at least one.
    ///
    /// Unbounded by default.
    #[inline]
    pub fn with_max_round_trips(mut self, limit: NonZeroUsize) -> Self {
        self.max_round_trips = Some(limit.get());
        self
    }

    /// Runs the tool calls of one assistant message concurrently.
    ///
    /// Results are still recorded in the order the model requested them.
    /// Disabled by default.
    #[inline]
    pub fn with_parallel_tool_calls(mut self, enabled: bool) -> Self {
        self.parallel_tool_calls = enabled;
        self
    }

    /// Builds the agent.
    ///
    /// Fails with [`Error::AdapterMismatch`] if the registry and the
    /// transport speak different APIs.
    pub fn build(self) -> Result<Agent, Error> {
        let Self {
            client,
            registry,
            tools,
            developer_prompt,
            max_round_trips,
            parallel_tool_calls,
        } = self;

        let mut registry = registry
            .unwrap_or_else(|| Arc::new(ToolRegistry::new(client.api_kind())));
        if !tools.is_empty() {
            // Copies the registry if it's shared with others.
            let registry = Arc::make_mut(&mut registry);
            for tool in tools {
                registry.register_any(tool);
            }
        }

        let adapter = registry.adapter().kind();
        let transport = client.api_kind();
        if adapter != transport {
            return Err(Error::AdapterMismatch { adapter, transport });
        }

        let conversation = Conversation::new(developer_prompt.as_deref());
        Ok(Agent {
            client,
            registry,
            developer_prompt,
            conversation,
            stage: AgentStage::AwaitingUserInput,
            max_round_trips,
            parallel_tool_calls,
        })
    }
}
