//! Reply types handed back to the chat surface.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// UI affordance offered alongside a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffordanceKind {
    Escalate,
    CheckEmail,
    Login,
    TrackOrder,
    TryAgain,
    QuickReply,
    LiveChat,
    Callback,
}

impl fmt::Display for AffordanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Escalate => "escalate",
            Self::CheckEmail => "check_email",
            Self::Login => "login",
            Self::TrackOrder => "track_order",
            Self::TryAgain => "try_again",
            Self::QuickReply => "quick_reply",
            Self::LiveChat => "live_chat",
            Self::Callback => "callback",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedAction {
    pub kind: AffordanceKind,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl SuggestedAction {
    pub fn new(kind: AffordanceKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Where the facts in a reply came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    /// Canned copy, no provider data
    #[default]
    Template,
    /// Live provider data
    Live,
    /// Built-in demo catalog
    Demo,
    /// Locally generated ticket number
    Placeholder,
    /// Pipeline failure reply
    Fallback,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Template => "template",
            Self::Live => "live",
            Self::Demo => "demo",
            Self::Placeholder => "placeholder",
            Self::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub source: ResponseSource,
    /// Analyzer confidence for the message this reply answers
    pub confidence: f64,
    /// Integration slots whose data shaped the reply
    pub integrations_used: BTreeSet<String>,
    /// Structured payloads such as product cards or the order summary
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Final reply for one inbound message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SmartResponse {
    pub text: String,
    pub actions: Vec<SuggestedAction>,
    pub metadata: ResponseMetadata,
}

impl SmartResponse {
    pub fn new(text: impl Into<String>, source: ResponseSource) -> Self {
        Self {
            text: text.into(),
            actions: Vec::new(),
            metadata: ResponseMetadata {
                source,
                ..Default::default()
            },
        }
    }

    pub fn action(mut self, action: SuggestedAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn used(mut self, integration: &str) -> Self {
        self.metadata.integrations_used.insert(integration.to_string());
        self
    }

    pub fn extra(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.extra.insert(key.to_string(), value);
        self
    }

    pub fn has_action(&self, kind: AffordanceKind) -> bool {
        self.actions.iter().any(|a| a.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_parts() {
        let response = SmartResponse::new("hello", ResponseSource::Live)
            .action(SuggestedAction::new(AffordanceKind::Escalate, "Talk to a person"))
            .used("commerce")
            .used("commerce");
        assert!(response.has_action(AffordanceKind::Escalate));
        assert_eq!(response.metadata.integrations_used.len(), 1);
    }

    #[test]
    fn test_serialized_shape() {
        let response = SmartResponse::new("hi", ResponseSource::Template).action(
            SuggestedAction::new(AffordanceKind::TrackOrder, "Track").with_value("https://t"),
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["actions"][0]["kind"], "track_order");
        assert_eq!(json["metadata"]["source"], "template");
        assert_eq!(json["metadata"]["integrationsUsed"], serde_json::json!([]));
        assert!(json["metadata"].get("extra").is_none());
    }
}
