//! A terminal chat agent that assembles the built-in tools and the
//! OpenAI-compatible transports.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library to bring its input source, display sink and tools
//! into your own host apps.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

pub mod terminal;
pub mod tools;

/// Re-exports of [`chatkit_core`] crate.
pub mod core {
    pub use chatkit_core::*;
}
