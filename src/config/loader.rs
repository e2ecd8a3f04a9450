//! Configuration Loader (Figment-based)
//!
//! Merges, lowest priority first:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/supportflow/config.toml)
//! 3. Project config (.supportflow/config.toml)
//! 4. Environment variables (SUPPORTFLOW_* prefix, `__` between sections)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{Result, SupportError};

const APP_DIR: &str = "supportflow";
const PROJECT_DIR: &str = ".supportflow";
const ENV_PREFIX: &str = "SUPPORTFLOW_";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with the full resolution chain:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        Self::extract(figment.merge(Self::env_provider()))
    }

    /// Load configuration from a specific file only (plus defaults)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        Self::extract(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::file(path)),
        )
    }

    /// `SUPPORTFLOW_GATEWAY__TIMEOUT_SECS` -> `gateway.timeout_secs`
    fn env_provider() -> Env {
        Env::prefixed(ENV_PREFIX).split("__").lowercase(true)
    }

    fn extract(figment: Figment) -> Result<Config> {
        let config: Config = figment
            .extract()
            .map_err(|e| SupportError::Config(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Global config directory (~/.config/supportflow/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join(APP_DIR))
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn project_dir() -> PathBuf {
        PathBuf::from(PROJECT_DIR)
    }

    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Print the config file locations and whether they exist
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Render the effective configuration with secrets masked
    pub fn render_config(config: &Config, as_json: bool) -> Result<String> {
        let shown = config.redacted();
        if as_json {
            Ok(serde_json::to_string_pretty(&shown)?)
        } else {
            toml::to_string_pretty(&shown).map_err(|e| SupportError::Config(e.to_string()))
        }
    }

    /// Print the effective configuration
    pub fn show_config(as_json: bool) -> Result<()> {
        let config = Self::load()?;
        println!("{}", Self::render_config(&config, as_json)?);
        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Create `.supportflow/config.toml` in the current directory
    pub fn init_project(force: bool) -> Result<PathBuf> {
        Self::init_project_in(Path::new("."), force)
    }

    fn init_project_in(root: &Path, force: bool) -> Result<PathBuf> {
        let project_dir = root.join(PROJECT_DIR);
        fs::create_dir_all(&project_dir)?;

        let config_path = project_dir.join("config.toml");
        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_project_config())?;
            info!("Created project config: {}", config_path.display());
        } else {
            info!("Project config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Default project config content (TOML)
    fn default_project_config() -> String {
        r#"# SupportFlow Project Configuration
# Secrets may also come from SHOPIFY_ACCESS_TOKEN / FRESHDESK_API_KEY or
# SUPPORTFLOW_COMMERCE__ACCESS_TOKEN / SUPPORTFLOW_TICKETING__API_KEY.

version = "1.0"

[commerce]
# shop_domain = "your-store.myshopify.com"
api_version = "2024-01"

[ticketing]
# domain = "your-company.freshdesk.com"

[gateway]
timeout_secs = 15
max_retries = 3
min_retry_delay_ms = 500

[orchestrator]
recent_orders_limit = 5
product_results_limit = 10
"#
        .to_string()
    }
}
