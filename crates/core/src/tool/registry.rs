use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::sync::Arc;

use chatkit_model::{
    ApiKind, ProviderResponse, ToolCallRequest, ToolResult, ToolSpec,
};
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::Instrument;

use super::object::{InvokeError, ToolObject};
use super::{AnyTool, Tool, Toolset};
use crate::Error;
use crate::adapter::{ApiAdapter, adapter_for};

/// Owns the tools available to the model, keyed by name.
///
/// Tools are registered during setup. After that the registry is only
/// read, so it can be shared by several agents through an [`Arc`].
///
/// Registering a name twice silently replaces the previous tool, keeping
/// its position in the advertised list.
#[derive(Clone)]
pub struct ToolRegistry {
    adapter: Arc<dyn ApiAdapter>,
    specs: Vec<ToolSpec>,
    callables: HashMap<String, Arc<dyn ToolObject>>,
}

impl ToolRegistry {
    /// Creates an empty registry speaking the given API kind.
    #[inline]
    pub fn new(kind: ApiKind) -> Self {
        Self::with_adapter(adapter_for(kind))
    }

    /// Creates an empty registry from an API kind selector, i.e.
    /// `"responses"` or `"chat.completions"`.
    pub fn for_api(selector: &str) -> Result<Self, Error> {
        let kind: ApiKind = selector.parse()?;
        Ok(Self::new(kind))
    }

    /// Creates an empty registry with a custom adapter.
    pub fn with_adapter(adapter: Arc<dyn ApiAdapter>) -> Self {
        Self {
            adapter,
            specs: vec![],
            callables: HashMap::new(),
        }
    }

    /// Returns the adapter of this registry.
    #[inline]
    pub fn adapter(&self) -> &Arc<dyn ApiAdapter> {
        &self.adapter
    }

    /// Returns the registered specs, in registration order.
    #[inline]
    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    /// Returns the number of registered tools.
    #[inline]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns `true` if no tool is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Returns whether a tool with the given name is registered.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.callables.contains_key(name)
    }

    /// Registers a [`Tool`] implementation.
    #[inline]
    pub fn add_tool<T: Tool>(&mut self, tool: T) {
        self.register_any(AnyTool::new(tool));
    }

    /// Registers a function with an explicit spec. The tool is named after
    /// the spec.
    pub fn register<I, O, E, F>(&mut self, spec: ToolSpec, f: F)
    where
        I: DeserializeOwned + Send + 'static,
        O: Serialize + 'static,
        E: Display + 'static,
        F: Fn(I) -> Result<O, E> + Send + Sync + 'static,
    {
        self.register_any(AnyTool::from_fn(spec, f));
    }

    /// Registers a function whose spec is derived from its input type.
    ///
    /// See [`derive_spec`](super::derive_spec) for the derivation rules.
    pub fn register_derived<I, O, E, F>(
        &mut self,
        name: impl Into<String>,
        f: F,
    ) where
        I: DeserializeOwned + JsonSchema + Send + 'static,
        O: Serialize + 'static,
        E: Display + 'static,
        F: Fn(I) -> Result<O, E> + Send + Sync + 'static,
    {
        self.register_any(AnyTool::derived(name, f));
    }

    /// Registers a type-erased tool.
    pub fn register_any(&mut self, tool: AnyTool) {
        let AnyTool { spec, object } = tool;
        let name = spec.name.clone();
        if let Some(existing) = self.specs.iter_mut().find(|s| s.name == name) {
            debug!("replacing tool `{name}`");
            *existing = spec;
        } else {
            trace!("registering tool `{name}`");
            self.specs.push(spec);
        }
        self.callables.insert(name, object);
    }

    /// Registers every public tool of a toolset.
    ///
    /// Tools whose name starts with `_` are skipped.
    pub fn register_all<S: Toolset>(&mut self, toolset: Arc<S>) {
        for tool in toolset.tools() {
            if tool.name().starts_with('_') {
                trace!("skipping private tool `{}`", tool.name());
                continue;
            }
            self.register_any(tool);
        }
    }

    /// Returns the `tools` payload for the adapter's API, in registration
    /// order.
    #[inline]
    pub fn list_for_api(&self) -> Vec<Value> {
        self.adapter.format_tools_for_api(&self.specs)
    }

    /// Returns the tool calls requested in a response.
    #[inline]
    pub fn parse_calls(&self, resp: &ProviderResponse) -> Vec<ToolCallRequest> {
        self.adapter.parse_tool_calls(resp)
    }

    /// Invokes the tool requested by `req`.
    ///
    /// The arguments must be a JSON object that deserializes into the
    /// tool input. Failures are never swallowed: each one is returned as
    /// the matching [`Error`] variant carrying the tool name.
    pub async fn invoke(
        &self,
        req: &ToolCallRequest,
    ) -> Result<ToolResult, Error> {
        let name = &req.name;
        let arguments = parse_arguments(&req.arguments).map_err(|reason| {
            warn!("malformed arguments for tool `{name}`: {reason}");
            Error::MalformedArguments {
                name: name.clone(),
                reason,
            }
        })?;

        let Some(object) = self.callables.get(name) else {
            warn!("model requested an unknown tool `{name}`");
            return Err(Error::UnknownTool { name: name.clone() });
        };

        let span =
            debug_span!("tool call", tool = %name, call_id = %req.call_id);
        let result = object.execute(arguments).instrument(span).await;
        match result {
            Ok(output) => {
                trace!("tool `{name}` returned: {output}");
                Ok(ToolResult {
                    call_id: req.call_id.clone(),
                    output,
                })
            }
            Err(InvokeError::MalformedArguments(reason)) => {
                warn!("malformed arguments for tool `{name}`: {reason}");
                Err(Error::MalformedArguments {
                    name: name.clone(),
                    reason,
                })
            }
            Err(InvokeError::Failed(source)) => {
                warn!("tool `{name}` failed: {source}");
                Err(Error::ToolExecution {
                    name: name.clone(),
                    source,
                })
            }
        }
    }
}

fn parse_arguments(raw: &str) -> Result<Value, String> {
    // Some models send an empty string for parameterless calls.
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err("arguments must be a JSON object".to_owned()),
        Err(err) => Err(format!("{err}")),
    }
}

impl Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("kind", &self.adapter.kind())
            .field("specs", &self.specs)
            .finish_non_exhaustive()
    }
}
