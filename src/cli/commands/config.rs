//! Config Command
//!
//! Usage:
//!   supportflow config show [-f json]
//!   supportflow config path
//!   supportflow config init [--force]

use crate::cli::ui::Output;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show the merged effective configuration (secrets masked)
pub fn show(format: &str) -> Result<()> {
    ConfigLoader::show_config(format == "json")
}

pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Initialize `.supportflow/config.toml`
pub fn init(force: bool) -> Result<()> {
    let path = ConfigLoader::init_project(force)?;
    Output::new().success("Initialized project configuration");
    println!("  Config: {}", path.display());
    Ok(())
}
