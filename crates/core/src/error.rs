use chatkit_model::{ApiKind, TransportError, UnsupportedApiKind};

use crate::tool::Error as ToolError;

/// Errors that end the current agent run.
///
/// None of them is recovered from inside the loop. The conversation is
/// left in its last-appended state, and the caller decides whether to
/// start over.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The model requested a tool that is not registered.
    #[error("unknown tool `{name}`")]
    UnknownTool {
        /// The requested tool name.
        name: String,
    },

    /// The argument payload of a tool call is not valid for the tool.
    #[error("malformed arguments for tool `{name}`: {reason}")]
    MalformedArguments {
        /// The requested tool name.
        name: String,
        /// What is wrong with the arguments.
        reason: String,
    },

    /// The tool itself failed.
    #[error("tool `{name}` failed: {source}")]
    ToolExecution {
        /// The requested tool name.
        name: String,
        /// The error returned by the tool.
        #[source]
        source: ToolError,
    },

    /// The transport failed to get a response from the provider.
    #[error("transport error: {0}")]
    Transport(Box<dyn TransportError>),

    /// The API kind selector is unknown.
    #[error(
        "unsupported API kind `{0}`, use `responses` or `chat.completions`"
    )]
    UnsupportedAdapterKind(String),

    /// The adapter and the transport speak different APIs.
    #[error("adapter speaks `{adapter}` but transport speaks `{transport}`")]
    AdapterMismatch {
        /// The API kind of the adapter.
        adapter: ApiKind,
        /// The API kind of the transport.
        transport: ApiKind,
    },

    /// The model kept requesting tools beyond the configured bound.
    #[error("exceeded {limit} round trips in a single turn")]
    RoundTripLimitExceeded {
        /// The configured bound.
        limit: usize,
    },

    /// Reading user input failed.
    #[error("failed to read user input: {0}")]
    Input(#[from] std::io::Error),
}

impl Error {
    /// Returns the name of the tool involved in this error, if any.
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Error::UnknownTool { name }
            | Error::MalformedArguments { name, .. }
            | Error::ToolExecution { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl From<UnsupportedApiKind> for Error {
    #[inline]
    fn from(err: UnsupportedApiKind) -> Self {
        Error::UnsupportedAdapterKind(err.0)
    }
}
