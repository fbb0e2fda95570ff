//! Shared vocabulary between the agent loop and the LLM transports.
//!
//! This crate establishes the types that both sides of a conversation
//! agree on: the messages kept in the history, the tool call requests
//! the model emits, the tool specs advertised to the model and the typed
//! representation of the two supported provider response shapes.
//!
//! Types in this crate don't define any agent behavior, instead they are
//! the constraints that transports and adapters should adhere to. Raw
//! provider payloads are decoded into [`ProviderResponse`] at the
//! transport boundary, so that nothing downstream needs to sniff JSON
//! shapes.

#![deny(missing_docs)]

mod api;
mod error;
mod message;
mod response;
mod tool_spec;
mod transport;

pub use api::*;
pub use error::*;
pub use message::*;
pub use response::*;
pub use tool_spec::*;
pub use transport::*;
