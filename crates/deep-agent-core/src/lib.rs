//! Shared foundation for the deep agent backend.
//!
//! Holds the chat message types exchanged with API clients, the raw
//! lifecycle events produced by the execution engine, configuration
//! loading, and the common error type.

pub mod config;
pub mod engine;
pub mod error;
pub mod types;

pub use engine::{ExecutionEngine, RunEvent, RunEventStream};
pub use error::{DeepAgentError, Result};
