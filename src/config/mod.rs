//! Configuration Management
//!
//! Hierarchical resolution, lowest priority first:
//! 1. Built-in defaults
//! 2. Global config (~/.config/supportflow/config.toml)
//! 3. Project config (.supportflow/config.toml)
//! 4. Environment variables (SUPPORTFLOW_*)

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
