//! Configuration management for the snapshot metrics services.
//!
//! Provides environment detection, configuration loading from YAML files
//! layered with environment variables, and the configuration types shared
//! between the tracker, the publisher and the binaries.

mod environment;
mod load;
pub mod shared;

pub use environment::*;
pub use load::*;
