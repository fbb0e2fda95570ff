//! Tools served by [MCP] servers.
//!
//! [`StdioTransport`] runs a server as a subprocess and exchanges one
//! JSON-RPC message per line with it. [`McpClient`] speaks the protocol
//! over any [`McpTransport`], and [`McpTools`] exposes the server's tools
//! as a [`Toolset`](chatkit_core::tool::Toolset).
//!
//! ```ignore
//! let mut transport =
//!     StdioTransport::new("uvx", vec!["mcp-server-time".into()]);
//! transport.start()?;
//! let client = Arc::new(McpClient::new(transport));
//! let tools = McpTools::load(Arc::clone(&client)).await?;
//! registry.register_all(Arc::new(tools));
//! ```
//!
//! [MCP]: https://modelcontextprotocol.io

#[macro_use]
extern crate tracing;

mod client;
mod error;
mod toolset;
mod transport;

pub use client::{CallToolResult, McpClient, McpToolInfo, PROTOCOL_VERSION};
pub use error::Error;
pub use toolset::McpTools;
pub use transport::{DEFAULT_STOP_TIMEOUT, McpTransport, StdioTransport};
