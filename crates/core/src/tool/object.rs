use std::fmt::{self, Debug, Display};
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use chatkit_model::ToolSpec;
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::Instrument;

use super::{Error, Tool, derive_spec};

pub(crate) enum InvokeError {
    MalformedArguments(String),
    Failed(Error),
}

type InvokeFuture =
    Pin<Box<dyn Future<Output = Result<Value, InvokeError>> + Send>>;

pub(crate) trait ToolObject: Send + Sync + 'static {
    fn execute(&self, arguments: Value) -> InvokeFuture;
}

struct ToolObjectImpl<T: Tool>(T);

impl<T: Tool> ToolObject for ToolObjectImpl<T> {
    fn execute(&self, arguments: Value) -> InvokeFuture {
        let input: T::Input = match serde_json::from_value(arguments) {
            Ok(input) => input,
            Err(err) => {
                let reason = format!("{err}");
                return Box::pin(std::future::ready(Err(
                    InvokeError::MalformedArguments(reason),
                )));
            }
        };
        let fut = self.0.execute(input);
        Box::pin(
            async move {
                let output = fut.await.map_err(InvokeError::Failed)?;
                serialize_output(output)
            }
            .instrument(debug_span!("tool execute")),
        )
    }
}

struct FnToolObject<F, I> {
    f: Arc<F>,
    _input: PhantomData<fn(I)>,
}

impl<I, O, E, F> ToolObject for FnToolObject<F, I>
where
    I: DeserializeOwned + Send + 'static,
    O: Serialize + 'static,
    E: Display + 'static,
    F: Fn(I) -> Result<O, E> + Send + Sync + 'static,
{
    fn execute(&self, arguments: Value) -> InvokeFuture {
        let input: I = match serde_json::from_value(arguments) {
            Ok(input) => input,
            Err(err) => {
                let reason = format!("{err}");
                return Box::pin(std::future::ready(Err(
                    InvokeError::MalformedArguments(reason),
                )));
            }
        };
        let f = Arc::clone(&self.f);
        Box::pin(async move {
            let output = f(input).map_err(|err| {
                InvokeError::Failed(
                    Error::execution_error().with_reason(err.to_string()),
                )
            })?;
            serialize_output(output)
        })
    }
}

fn serialize_output<O: Serialize>(output: O) -> Result<Value, InvokeError> {
    serde_json::to_value(output).map_err(|err| {
        InvokeError::Failed(
            Error::execution_error()
                .with_reason(format!("cannot serialize the output: {err}")),
        )
    })
}

/// A type-erased tool together with the spec advertised for it.
#[derive(Clone)]
pub struct AnyTool {
    pub(crate) spec: ToolSpec,
    pub(crate) object: Arc<dyn ToolObject>,
}

impl AnyTool {
    /// Wraps a [`Tool`] implementation.
    pub fn new<T: Tool>(tool: T) -> Self {
        let spec = ToolSpec {
            name: tool.name().to_owned(),
            description: tool.description().trim().to_owned(),
            parameters: tool.parameter_schema().clone(),
        };
        Self {
            spec,
            object: Arc::new(ToolObjectImpl(tool)),
        }
    }

    /// Wraps a plain function with an explicit spec.
    ///
    /// The function receives the call arguments deserialized as `I`, and
    /// its output is serialized back to JSON. Errors are reported to the
    /// model side as execution errors carrying the error message.
    pub fn from_fn<I, O, E, F>(spec: ToolSpec, f: F) -> Self
    where
        I: DeserializeOwned + Send + 'static,
        O: Serialize + 'static,
        E: Display + 'static,
        F: Fn(I) -> Result<O, E> + Send + Sync + 'static,
    {
        Self {
            spec,
            object: Arc::new(FnToolObject {
                f: Arc::new(f),
                _input: PhantomData,
            }),
        }
    }

    /// Wraps a plain function, deriving its spec from the input type.
    ///
    /// See [`derive_spec`] for how the schema is derived.
    pub fn derived<I, O, E, F>(name: impl Into<String>, f: F) -> Self
    where
        I: DeserializeOwned + JsonSchema + Send + 'static,
        O: Serialize + 'static,
        E: Display + 'static,
        F: Fn(I) -> Result<O, E> + Send + Sync + 'static,
    {
        Self::from_fn(derive_spec::<I>(name), f)
    }

    /// Returns the spec of this tool.
    #[inline]
    pub fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    /// Returns the name of this tool.
    #[inline]
    pub fn name(&self) -> &str {
        &self.spec.name
    }
}

impl Debug for AnyTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyTool")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}
