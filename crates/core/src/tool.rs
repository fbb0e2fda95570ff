//! Tool call supports.

mod error;
mod object;
mod registry;
mod schema;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use chatkit_model::{JsonType, ToolSpec, ToolSpecBuilder};
pub use error::{Error, ErrorKind};
pub use object::AnyTool;
pub use registry::ToolRegistry;
pub use schema::derive_spec;

/// The result of a tool call.
pub type ToolResult<T> = Result<T, Error>;

/// A tool that can be called by the model.
///
/// Implementations of this trait should be stateless, and may not maintain any
/// internal state.
///
/// The tool can be context-aware, meaning it can access additional information
/// about the current execution context, such as the working directory or the
/// current user. To do this, make the context an immutable state of the tool,
/// which can be set during initialization, and copy it when executing.
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    type Input: DeserializeOwned;

    /// The type of output that the tool produces.
    type Output: Serialize;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the tool.
    fn parameter_schema(&self) -> &Value;

    /// Executes the tool with the given input.
    ///
    /// This method must return a future that is fully independent of `self`.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult<Self::Output>> + Send + 'static;
}

/// A group of tools sharing one instance, registered all at once with
/// [`ToolRegistry::register_all`].
///
/// Tools whose name starts with an underscore are treated as private
/// helpers and are not registered.
pub trait Toolset: Send + Sync + 'static {
    /// Returns all tools of this set, bound to the shared instance.
    fn tools(self: Arc<Self>) -> Vec<AnyTool>;
}
