//! Infrastructure layer: the in-memory storage collaborator and engine
//! configuration.

pub mod config;
pub mod storage;

pub use config::{ConfigError, EngineConfig};
pub use storage::{InMemoryStorage, InMemoryTable};
