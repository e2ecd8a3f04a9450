//! Freshdesk Ticketing Provider
//!
//! Contacts and tickets via the Freshdesk REST API v2. Escalations are
//! tickets tagged for the live-agent queue, carrying the chat transcript.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::models::{
    EscalationReceipt, NewCustomer, NewTicket, TicketReceipt, TicketingCustomer,
};
use super::retry::{CallPolicy, call_with_policy, retry_after_hint};
use super::TicketingProvider;
use crate::analyzer::Priority;
use crate::config::TicketingConfig;
use crate::types::{ChatTurn, ConversationId, ErrorClassifier, Result, SupportError};

const PROVIDER_NAME: &str = "freshdesk";

/// Freshdesk ticket status "Open"
const STATUS_OPEN: u8 = 2;

const ESCALATION_TAG: &str = "chat-escalation";

pub struct FreshdeskClient {
    /// `https://{domain}/api/v2`, absent when no domain is configured
    api_base: Option<String>,
    api_key: Option<SecretString>,
    client: reqwest::Client,
    policy: CallPolicy,
}

impl std::fmt::Debug for FreshdeskClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreshdeskClient")
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("policy", &self.policy)
            .finish()
    }
}

#[derive(Serialize)]
struct TicketRequest<'a> {
    subject: &'a str,
    description: &'a str,
    requester_id: u64,
    priority: u8,
    status: u8,
    tags: Vec<String>,
}

#[derive(Deserialize)]
struct TicketResponse {
    id: u64,
}

/// Freshdesk priority scale: 1 low, 2 medium, 3 high, 4 urgent
fn freshdesk_priority(priority: Priority) -> u8 {
    match priority {
        Priority::Medium => 2,
        Priority::High => 3,
        Priority::Urgent => 4,
    }
}

impl FreshdeskClient {
    pub fn new(config: &TicketingConfig, policy: CallPolicy) -> Result<Self> {
        let api_base = match (&config.api_base, &config.domain) {
            (Some(base), _) => Some(base.trim_end_matches('/').to_string()),
            (None, Some(domain)) => {
                let origin = if domain.contains("://") {
                    domain.clone()
                } else {
                    format!("https://{}", domain)
                };
                let url = url::Url::parse(&origin).map_err(|e| {
                    SupportError::Config(format!("Invalid Freshdesk domain '{}': {}", domain, e))
                })?;
                Some(format!("{}api/v2", url))
            }
            (None, None) => None,
        };

        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("FRESHDESK_API_KEY").ok())
            .filter(|k| !k.is_empty())
            .map(SecretString::from);

        let client = reqwest::Client::builder()
            .timeout(policy.timeout)
            .build()
            .map_err(|e| SupportError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_base,
            api_key,
            client,
            policy,
        })
    }

    fn credentials(&self) -> Result<(&str, &SecretString)> {
        match (&self.api_base, &self.api_key) {
            (Some(base), Some(key)) => Ok((base.as_str(), key)),
            _ => Err(SupportError::NotConnected(PROVIDER_NAME.to_string())),
        }
    }

    async fn send<T, B>(
        &self,
        method: reqwest::Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        operation: &str,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        let (base, key) = self.credentials()?;
        let url = format!("{}/{}", base, path);
        let url = url.as_str();
        let client = &self.client;

        call_with_policy(&self.policy, operation, move || {
            let method = method.clone();
            async move {
                debug!(url = %url, %method, "Freshdesk request");
                let mut request = client
                    .request(method, url)
                    .basic_auth(key.expose_secret(), Some("X"))
                    .query(query);
                if let Some(body) = body {
                    request = request.json(body);
                }
                let response = request
                    .send()
                    .await
                    .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER_NAME))?;

                let status = response.status();
                if !status.is_success() {
                    let retry_after = (status == StatusCode::TOO_MANY_REQUESTS)
                        .then(|| retry_after_hint(response.headers()))
                        .flatten();
                    let body = response.text().await.unwrap_or_default();
                    let mut err = ErrorClassifier::classify_http_status(
                        status.as_u16(),
                        &format!("Freshdesk API error ({}): {}", status, body),
                        PROVIDER_NAME,
                    );
                    if let Some(delay) = retry_after {
                        err = err.retry_after(delay);
                    }
                    return Err(err.into());
                }

                response
                    .json::<T>()
                    .await
                    .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER_NAME).into())
            }
        })
        .await
    }

    async fn open_ticket(&self, request: &TicketRequest<'_>, operation: &str) -> Result<u64> {
        let response: TicketResponse = self
            .send(reqwest::Method::POST, "tickets", &[], Some(request), operation)
            .await?;
        Ok(response.id)
    }
}

/// Plain-text transcript appended to escalation tickets
fn format_transcript(history: &[ChatTurn]) -> String {
    history
        .iter()
        .map(|turn| {
            format!(
                "[{}] {}: {}",
                turn.timestamp.format("%Y-%m-%d %H:%M:%S"),
                turn.role,
                turn.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl TicketingProvider for FreshdeskClient {
    async fn find_customer(&self, email: &str) -> Result<Option<TicketingCustomer>> {
        let contacts: Vec<TicketingCustomer> = self
            .send::<_, ()>(
                reqwest::Method::GET,
                "contacts",
                &[("email", email.to_string())],
                None,
                "find contact",
            )
            .await?;
        Ok(contacts.into_iter().next())
    }

    async fn create_customer(&self, customer: &NewCustomer) -> Result<TicketingCustomer> {
        self.send(
            reqwest::Method::POST,
            "contacts",
            &[],
            Some(customer),
            "create contact",
        )
        .await
    }

    async fn escalate_to_human(
        &self,
        conversation_id: &ConversationId,
        customer_id: u64,
        reason: &str,
        history: &[ChatTurn],
    ) -> Result<EscalationReceipt> {
        let subject = format!("Chat escalation: {}", reason);
        let mut description = format!(
            "Conversation {} was escalated to a human agent.\nReason: {}",
            conversation_id, reason
        );
        if !history.is_empty() {
            description.push_str("\n\nTranscript:\n");
            description.push_str(&format_transcript(history));
        }

        let request = TicketRequest {
            subject: &subject,
            description: &description,
            requester_id: customer_id,
            priority: freshdesk_priority(Priority::High),
            status: STATUS_OPEN,
            tags: vec![
                ESCALATION_TAG.to_string(),
                format!("conversation-{}", conversation_id),
            ],
        };
        let id = self.open_ticket(&request, "escalate").await?;

        Ok(EscalationReceipt {
            ticket_id: id.to_string(),
            escalated_at: Utc::now(),
        })
    }

    async fn create_ticket(&self, ticket: &NewTicket) -> Result<TicketReceipt> {
        let mut tags = vec!["chat".to_string()];
        if let Some(conversation_id) = &ticket.conversation_id {
            tags.push(format!("conversation-{}", conversation_id));
        }
        let request = TicketRequest {
            subject: &ticket.subject,
            description: &ticket.description,
            requester_id: ticket.customer_id,
            priority: freshdesk_priority(ticket.priority),
            status: STATUS_OPEN,
            tags,
        };
        let id = self.open_ticket(&request, "create ticket").await?;
        Ok(TicketReceipt { id: id.to_string() })
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn is_connected(&self) -> bool {
        if self.credentials().is_err() {
            debug!("Freshdesk credentials not configured");
            return false;
        }
        match self
            .send::<serde_json::Value, ()>(
                reqwest::Method::GET,
                "agents/me",
                &[],
                None,
                "agent probe",
            )
            .await
        {
            Ok(_) => {
                info!("Freshdesk is available");
                true
            }
            Err(e) => {
                warn!(error = %e, "Freshdesk probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_client(server: &mockito::Server) -> FreshdeskClient {
        let config = TicketingConfig {
            domain: None,
            api_base: Some(format!("{}/api/v2", server.url())),
            api_key: Some("fd_key".to_string()),
        };
        FreshdeskClient::new(&config, CallPolicy::default()).unwrap()
    }

    #[test]
    fn test_api_base_from_domain() {
        let config = TicketingConfig {
            domain: Some("acme.freshdesk.com".to_string()),
            api_base: None,
            api_key: None,
        };
        let client = FreshdeskClient::new(&config, CallPolicy::default()).unwrap();
        assert_eq!(
            client.api_base.as_deref(),
            Some("https://acme.freshdesk.com/api/v2")
        );
    }

    #[test]
    fn test_priority_mapping() {
        assert_eq!(freshdesk_priority(Priority::Medium), 2);
        assert_eq!(freshdesk_priority(Priority::High), 3);
        assert_eq!(freshdesk_priority(Priority::Urgent), 4);
    }

    #[test]
    fn test_transcript_format() {
        let history = vec![ChatTurn::user("where is my order"), ChatTurn::assistant("checking")];
        let transcript = format_transcript(&history);
        assert!(transcript.contains("user: where is my order"));
        assert!(transcript.contains("assistant: checking"));
    }

    #[tokio::test]
    async fn test_find_customer() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v2/contacts")
            .match_query(mockito::Matcher::UrlEncoded(
                "email".into(),
                "ana@example.com".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":31,"name":"Ana","email":"ana@example.com"}]"#)
            .create_async()
            .await;

        let customer = mock_client(&server)
            .find_customer("ana@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(customer.id, 31);
    }

    #[tokio::test]
    async fn test_escalation_creates_tagged_ticket() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/tickets")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "requester_id": 31,
                "priority": 3,
                "status": 2,
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":4242}"#)
            .create_async()
            .await;

        let receipt = mock_client(&server)
            .escalate_to_human(
                &ConversationId::new("conv-1"),
                31,
                "customer_request",
                &[ChatTurn::user("I need a human")],
            )
            .await
            .unwrap();
        assert_eq!(receipt.ticket_id, "4242");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_throttled_response_carries_retry_after() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v2/contacts")
            .match_query(mockito::Matcher::Any)
            .with_status(429)
            .with_header("Retry-After", "4")
            .create_async()
            .await;

        let config = TicketingConfig {
            domain: None,
            api_base: Some(format!("{}/api/v2", server.url())),
            api_key: Some("fd_key".to_string()),
        };
        let policy = CallPolicy {
            max_retries: 0,
            ..CallPolicy::default()
        };
        let err = FreshdeskClient::new(&config, policy)
            .unwrap()
            .find_customer("ana@example.com")
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(std::time::Duration::from_secs(4)));
    }

    #[tokio::test]
    async fn test_unconfigured_is_not_connected() {
        let config = TicketingConfig::default();
        let client = FreshdeskClient::new(&config, CallPolicy::default()).unwrap();
        if std::env::var("FRESHDESK_API_KEY").is_err() {
            assert!(!client.is_connected().await);
        }
    }
}
