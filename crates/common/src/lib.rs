//! Shared types, config, cache, and error definitions for earthguard.

pub mod cache;
pub mod config;
pub mod error;
pub mod geo;
pub mod types;

pub use cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use config::EngineConfig;
pub use error::{body_excerpt, Error};
pub use types::*;

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
