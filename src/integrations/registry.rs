//! Provider availability registry
//!
//! Providers are probed once and the result is kept as an immutable snapshot.
//! A fresh snapshot replaces the old one only through [`ProviderRegistry::refresh`].

use std::fmt;

use serde::Serialize;
use tracing::info;

use super::{SharedCommerce, SharedTicketing};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Commerce,
    Ticketing,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commerce => write!(f, "commerce"),
            Self::Ticketing => write!(f, "ticketing"),
        }
    }
}

/// One row of the availability report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub kind: ProviderKind,
    pub available: bool,
}

#[derive(Clone)]
pub struct ProviderRegistry {
    commerce: SharedCommerce,
    ticketing: SharedTicketing,
    commerce_available: bool,
    ticketing_available: bool,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("commerce", &self.commerce.name())
            .field("commerce_available", &self.commerce_available)
            .field("ticketing", &self.ticketing.name())
            .field("ticketing_available", &self.ticketing_available)
            .finish()
    }
}

impl ProviderRegistry {
    /// Probe both providers concurrently and snapshot the result
    pub async fn probe(commerce: SharedCommerce, ticketing: SharedTicketing) -> Self {
        let (commerce_available, ticketing_available) =
            tokio::join!(commerce.is_connected(), ticketing.is_connected());

        info!(
            commerce = commerce.name(),
            commerce_available,
            ticketing = ticketing.name(),
            ticketing_available,
            "Provider availability probed"
        );

        Self {
            commerce,
            ticketing,
            commerce_available,
            ticketing_available,
        }
    }

    /// Registry with every provider gated off, without probing
    pub fn offline(commerce: SharedCommerce, ticketing: SharedTicketing) -> Self {
        Self {
            commerce,
            ticketing,
            commerce_available: false,
            ticketing_available: false,
        }
    }

    /// Re-probe the same providers
    pub async fn refresh(&self) -> Self {
        Self::probe(self.commerce.clone(), self.ticketing.clone()).await
    }

    /// Commerce provider, only when its gate is open
    pub fn commerce(&self) -> Option<&SharedCommerce> {
        self.commerce_available.then_some(&self.commerce)
    }

    /// Ticketing provider, only when its gate is open
    pub fn ticketing(&self) -> Option<&SharedTicketing> {
        self.ticketing_available.then_some(&self.ticketing)
    }

    pub fn statuses(&self) -> Vec<ProviderStatus> {
        vec![
            ProviderStatus {
                name: self.commerce.name().to_string(),
                kind: ProviderKind::Commerce,
                available: self.commerce_available,
            },
            ProviderStatus {
                name: self.ticketing.name().to_string(),
                kind: ProviderKind::Ticketing,
                available: self.ticketing_available,
            },
        ]
    }
}
