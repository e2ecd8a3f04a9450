use console::style;

use crate::integrations::ProviderStatus;
use crate::synthesis::{AffordanceKind, SmartResponse};

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// Assistant reply with its affordances and any product cards
    pub fn reply(&self, response: &SmartResponse) {
        println!("{} {}", style("assistant›").cyan().bold(), response.text);

        if let Some(cards) = response
            .metadata
            .extra
            .get("products")
            .and_then(|p| p.as_array())
        {
            for card in cards {
                let title = card["title"].as_str().unwrap_or("(untitled)");
                let price = card["variants"][0]["price"].as_str().unwrap_or("-");
                println!("    {} {}  {}", style("•").dim(), style(title).bold(), price);
                if let Some(url) = card["url"].as_str() {
                    println!("      {}", style(url).dim().underlined());
                }
            }
        }

        if !response.actions.is_empty() {
            let labels: Vec<String> = response
                .actions
                .iter()
                .map(|a| match (&a.kind, &a.value) {
                    (AffordanceKind::TrackOrder, Some(value)) => format!("[{}: {}]", a.label, value),
                    _ => format!("[{}]", a.label),
                })
                .collect();
            println!("    {}", style(labels.join(" ")).yellow());
        }

        println!(
            "    {}",
            style(format!(
                "source={} confidence={:.1}",
                response.metadata.source, response.metadata.confidence
            ))
            .dim()
        );
    }

    pub fn provider(&self, status: &ProviderStatus) {
        let marker = if status.available {
            style("●").green()
        } else {
            style("○").red()
        };
        let state = if status.available {
            "available"
        } else {
            "unavailable"
        };
        println!("  {} {:<10} {:<12} {}", marker, status.kind, status.name, state);
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
