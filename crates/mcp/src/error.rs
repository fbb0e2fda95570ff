use std::io;

/// Errors raised while talking to an MCP server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("server not started")]
    NotStarted,

    #[error("server process has terminated")]
    Exited,

    #[error("no response from server")]
    NoResponse,

    #[error("cannot spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("communication error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid JSON from server: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("server returned error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("unexpected response to `{method}`: {reason}")]
    UnexpectedResponse { method: String, reason: String },
}
