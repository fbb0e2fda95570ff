//! Core logic including the agent loop, API adapters and tool dispatch.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod adapter;
mod agent;
pub mod conversation;
pub mod display;
mod error;
pub mod tool;
mod transport_client;

pub use agent::{Agent, AgentBuilder, AgentStage, CLOSING_NOTICE, TurnOutcome};
pub use error::Error;
