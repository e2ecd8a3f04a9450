//! Providers Command
//!
//! Probe the configured providers and print their availability.

use crate::cli::ui::Output;
use crate::config::ConfigLoader;
use crate::integrations::{ProviderRegistry, create_providers};
use crate::types::Result;

pub async fn run(format: &str) -> Result<()> {
    let config = ConfigLoader::load()?;
    let (commerce, ticketing) = create_providers(&config)?;
    let registry = ProviderRegistry::probe(commerce, ticketing).await;
    let statuses = registry.statuses();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    let out = Output::new();
    out.header("Providers");
    for status in &statuses {
        out.provider(status);
    }
    if statuses.iter().any(|s| !s.available) {
        out.warning(
            "Unavailable providers are skipped; product searches use the demo catalog \
             and escalations get local reference numbers.",
        );
    }
    Ok(())
}
