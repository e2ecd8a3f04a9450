//! Integration Orchestrator
//!
//! Runs a [`ResponsePlan`] against the gated providers and drives the whole
//! per-message pipeline:
//!
//! ```text
//! message → analyze → plan → execute (↔ providers) → synthesize → reply
//! ```
//!
//! ## Failure policy
//!
//! - Actions run sequentially; a failed or panicking action is logged and leaves
//!   its slot empty
//! - Product searches fall back to the demo catalog, order lookups never do;
//!   a failed lookup of one order number is skipped like a miss
//! - Ticketing failures produce a local placeholder ticket number
//! - A panic outside plan execution becomes the escalation fallback reply

mod context;

pub use context::{
    COMMERCE_KEY, CommerceResult, CustomerContext, DataSource, IntegrationResults,
    ProcessedMessage, TICKETING_KEY, TicketingResult,
};

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use tracing::{debug, error, info, instrument, warn};

use crate::analyzer::{Analysis, MessageAnalyzer, Priority, Sentiment};
use crate::config::{Config, OrchestratorConfig};
use crate::constants::{orchestrator as orch_constants, planning as planning_constants};
use crate::integrations::{
    DemoCatalog, NewCustomer, NewTicket, Order, ProviderRegistry, SharedCommerce, SharedTicketing,
    TicketingCustomer, create_providers,
};
use crate::planner::{Action, EscalationReason, ResponsePlan, ResponsePlanner};
use crate::synthesis::{ResponseSynthesizer, placeholder_ticket_id};
use crate::types::{Result, SupportError};

const ESCALATION_CATEGORY: &str = "escalation";

/// What a single executed action contributes to its result slot
enum ActionOutput {
    Commerce(Option<CommerceResult>),
    Ticketing(Option<TicketingResult>),
}

pub struct IntegrationOrchestrator {
    registry: Arc<ProviderRegistry>,
    analyzer: MessageAnalyzer,
    demo: DemoCatalog,
    settings: OrchestratorConfig,
}

impl IntegrationOrchestrator {
    pub fn new(registry: ProviderRegistry, settings: OrchestratorConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            analyzer: MessageAnalyzer::new(),
            demo: DemoCatalog,
            settings,
        }
    }

    /// Build the configured providers and probe them once
    pub async fn from_config(config: &Config) -> Result<Self> {
        let (commerce, ticketing) = create_providers(config)?;
        let registry = ProviderRegistry::probe(commerce, ticketing).await;
        Ok(Self::new(registry, config.orchestrator.clone()))
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Re-probe providers and swap in the new availability snapshot
    pub async fn reinit(&mut self) {
        let refreshed = self.registry.refresh().await;
        self.registry = Arc::new(refreshed);
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    /// Analyze, plan, execute and synthesize one inbound message.
    ///
    /// Never fails: a panic outside the per-action isolation yields the escalation
    /// fallback reply, with the caller's context returned as it came in plus
    /// the exchanged turn.
    #[instrument(skip(self, message, context), fields(conversation = %context.conversation_id))]
    pub async fn process_message(
        &self,
        message: &str,
        context: CustomerContext,
    ) -> ProcessedMessage {
        let original = context.clone();

        match AssertUnwindSafe(self.run_pipeline(message, context))
            .catch_unwind()
            .await
        {
            Ok(processed) => processed,
            Err(panic) => {
                error!(panic = %panic_message(panic.as_ref()), "Message pipeline panicked");
                Self::trouble(message, original)
            }
        }
    }

    async fn run_pipeline(&self, message: &str, mut context: CustomerContext) -> ProcessedMessage {
        let analysis = self.analyzer.analyze(message, context.email.as_deref());
        let plan = ResponsePlanner::plan(&analysis, message);
        debug!(
            intents = ?analysis.intents,
            response_type = %plan.response_type,
            actions = plan.actions.len(),
            "Message planned"
        );

        context.record_user(message);
        let integration_results = self.execute(&plan, &mut context).await;

        let mut response = ResponseSynthesizer::synthesize(&plan, &integration_results, message);
        response.metadata.confidence = analysis.confidence;
        context.record_assistant(&response.text);

        ProcessedMessage {
            response,
            analysis,
            integration_results,
            customer_context: context,
        }
    }

    fn trouble(message: &str, mut context: CustomerContext) -> ProcessedMessage {
        let response = ResponseSynthesizer::trouble();
        context.record_user(message);
        context.record_assistant(&response.text);
        ProcessedMessage {
            response,
            analysis: Analysis::default(),
            integration_results: IntegrationResults::default(),
            customer_context: context,
        }
    }

    // =========================================================================
    // Plan Execution
    // =========================================================================

    /// Execute every action in order, then merge the results into `context`.
    /// Failures, panics included, are isolated per action.
    #[instrument(skip(self, plan, context), fields(actions = plan.actions.len()))]
    pub async fn execute(
        &self,
        plan: &ResponsePlan,
        context: &mut CustomerContext,
    ) -> IntegrationResults {
        let mut results = IntegrationResults::default();

        for action in &plan.actions {
            match isolate(self.run_action(action, context)).await {
                Ok(output) => {
                    match output {
                        ActionOutput::Commerce(Some(commerce)) => results.merge_commerce(commerce),
                        ActionOutput::Ticketing(Some(ticket)) => results.ticketing = Some(ticket),
                        ActionOutput::Commerce(None) | ActionOutput::Ticketing(None) => {}
                    }
                    info!(action = action.kind(), "Action executed");
                }
                Err(e) => warn!(action = action.kind(), error = %e, "Action failed, continuing"),
            }
        }

        if let Err(e) = context.enrich(&results) {
            warn!(error = %e, "Failed to merge integration results into context");
        }
        results
    }

    async fn run_action(&self, action: &Action, context: &CustomerContext) -> Result<ActionOutput> {
        match action {
            Action::OrderLookup {
                email,
                order_numbers,
            } => {
                let email = email.as_deref().or(context.email.as_deref());
                let found = self.lookup_orders(email, order_numbers).await?;
                Ok(ActionOutput::Commerce(found))
            }
            Action::ProductSearch { query } => Ok(ActionOutput::Commerce(Some(
                self.search_products(query).await,
            ))),
            Action::Escalation {
                priority,
                sentiment,
                reason,
            } => Ok(ActionOutput::Ticketing(
                self.escalate(context, *priority, *sentiment, *reason).await,
            )),
            Action::TicketCreation { category, priority } => Ok(ActionOutput::Ticketing(
                self.open_ticket(context, category, *priority).await,
            )),
        }
    }

    /// Look up explicit order numbers, falling back to the customer's recent
    /// orders. A failed call is skipped like a miss; the action only fails
    /// when no commerce call succeeded at all.
    async fn lookup_orders(
        &self,
        email: Option<&str>,
        order_numbers: &[String],
    ) -> Result<Option<CommerceResult>> {
        let Some(commerce) = self.registry.commerce() else {
            debug!("Commerce provider gated off, skipping order lookup");
            return Ok(None);
        };

        let mut orders = Vec::new();
        let mut reached = false;
        let mut last_error = None;

        for number in order_numbers {
            match commerce.find_order_by_number(number).await {
                Ok(found) => {
                    reached = true;
                    match found {
                        Some(order) => orders.push(order),
                        None => debug!(order = %number, "Order not found"),
                    }
                }
                Err(e) => {
                    warn!(order = %number, error = %e, "Order lookup failed, skipping");
                    last_error = Some(e);
                }
            }
        }

        if orders.is_empty()
            && let Some(email) = email
        {
            match self.recent_orders(commerce, email).await {
                Ok(recent) => {
                    reached = true;
                    orders = recent;
                }
                Err(e) => {
                    warn!(error = %e, "Recent orders lookup failed");
                    last_error = Some(e);
                }
            }
        }

        if !reached && let Some(e) = last_error {
            return Err(e);
        }

        Ok(Some(CommerceResult {
            orders,
            products: Vec::new(),
            source: DataSource::Live,
        }))
    }

    async fn recent_orders(&self, commerce: &SharedCommerce, email: &str) -> Result<Vec<Order>> {
        match commerce.find_customer_by_email(email).await? {
            Some(customer) => {
                commerce
                    .get_customer_orders(customer.id, self.settings.recent_orders_limit)
                    .await
            }
            None => {
                debug!("No commerce customer for email");
                Ok(Vec::new())
            }
        }
    }

    async fn search_products(&self, query: &str) -> CommerceResult {
        let limit = self.settings.product_results_limit;

        if let Some(commerce) = self.registry.commerce() {
            let call = if query == planning_constants::GENERAL_QUERY {
                commerce.get_products(limit)
            } else {
                commerce.search_products(query)
            };
            match isolate(call).await {
                Ok(mut products) => {
                    products.truncate(limit);
                    return CommerceResult {
                        orders: Vec::new(),
                        products,
                        source: DataSource::Live,
                    };
                }
                Err(e) => warn!(query, error = %e, "Product search failed, using demo catalog"),
            }
        } else {
            debug!(query, "Commerce provider gated off, using demo catalog");
        }

        CommerceResult {
            orders: Vec::new(),
            products: self.demo.search(query, limit),
            source: DataSource::Demo,
        }
    }

    // =========================================================================
    // Ticketing
    // =========================================================================

    async fn escalate(
        &self,
        context: &CustomerContext,
        priority: Priority,
        sentiment: Sentiment,
        reason: EscalationReason,
    ) -> Option<TicketingResult> {
        let Some(ticketing) = self.registry.ticketing() else {
            debug!("Ticketing provider gated off, skipping escalation");
            return None;
        };

        let description = match reason {
            EscalationReason::CustomerRequest => "Customer asked to speak with a human agent",
            EscalationReason::SentimentAnalysis => "Negative sentiment detected in chat",
        };
        let reason_text = format!(
            "{} (priority: {}, sentiment: {})",
            description, priority, sentiment
        );

        let attempt = async {
            let customer = self.resolve_customer(ticketing, context).await?;
            ticketing
                .escalate_to_human(
                    &context.conversation_id,
                    customer.id,
                    &reason_text,
                    &context.chat_history,
                )
                .await
        };

        let result = match attempt.await {
            Ok(receipt) => TicketingResult {
                ticket_id: receipt.ticket_id,
                escalated_at: receipt.escalated_at,
                placeholder: false,
                category: ESCALATION_CATEGORY.to_string(),
            },
            Err(e) => {
                warn!(error = %e, "Escalation failed, issuing placeholder ticket");
                Self::placeholder(
                    orch_constants::ESCALATION_PLACEHOLDER_PREFIX,
                    ESCALATION_CATEGORY,
                )
            }
        };
        Some(result)
    }

    async fn open_ticket(
        &self,
        context: &CustomerContext,
        category: &str,
        priority: Priority,
    ) -> Option<TicketingResult> {
        let Some(ticketing) = self.registry.ticketing() else {
            debug!("Ticketing provider gated off, skipping ticket creation");
            return None;
        };

        let attempt = async {
            let customer = self.resolve_customer(ticketing, context).await?;
            let ticket = NewTicket {
                customer_id: customer.id,
                conversation_id: Some(context.conversation_id.clone()),
                subject: format!("{} inquiry from chat", capitalize(category)),
                description: format!(
                    "Customer message:\n{}\n\nCategory: {}\nPriority: {}",
                    context.last_user_message().unwrap_or("(no message)"),
                    category,
                    priority
                ),
                priority,
            };
            ticketing.create_ticket(&ticket).await
        };

        let result = match attempt.await {
            Ok(receipt) => TicketingResult {
                ticket_id: receipt.id,
                escalated_at: Utc::now(),
                placeholder: false,
                category: category.to_string(),
            },
            Err(e) => {
                warn!(category, error = %e, "Ticket creation failed, issuing placeholder ticket");
                Self::placeholder(orch_constants::TICKET_PLACEHOLDER_PREFIX, category)
            }
        };
        Some(result)
    }

    /// Find the ticketing customer by email, creating one when the lookup
    /// misses or fails
    async fn resolve_customer(
        &self,
        ticketing: &SharedTicketing,
        context: &CustomerContext,
    ) -> Result<TicketingCustomer> {
        let email = context.email.as_deref().ok_or_else(|| {
            SupportError::Pipeline("customer email required to open a ticket".to_string())
        })?;

        match ticketing.find_customer(email).await {
            Ok(Some(customer)) => return Ok(customer),
            Ok(None) => debug!("Ticketing customer not found, creating"),
            Err(e) => debug!(error = %e, "Ticketing customer lookup failed, creating"),
        }

        ticketing
            .create_customer(&NewCustomer {
                name: context.display_name(),
                email: email.to_string(),
            })
            .await
    }

    fn placeholder(prefix: &str, category: &str) -> TicketingResult {
        TicketingResult {
            ticket_id: placeholder_ticket_id(prefix),
            escalated_at: Utc::now(),
            placeholder: true,
            category: category.to_string(),
        }
    }
}

/// Await `future`, turning a panic inside it into a `Pipeline` error
async fn isolate<T>(future: impl Future<Output = Result<T>>) -> Result<T> {
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            Err(SupportError::Pipeline(format!(
                "panicked: {}",
                panic_message(panic.as_ref())
            )))
        })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::{
        CommerceProvider, Customer, EscalationReceipt, Order, Product, SharedCommerce,
        TicketReceipt, TicketingProvider,
    };
    use crate::synthesis::{AffordanceKind, ResponseSource};
    use crate::types::{ChatTurn, ConversationId, ErrorCategory, ProviderError};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn outage() -> SupportError {
        ProviderError::new(ErrorCategory::Unavailable, "503").into()
    }

    // -------------------------------------------------------------------------
    // Mock providers
    // -------------------------------------------------------------------------

    #[derive(Default)]
    struct MockCommerce {
        connected: AtomicBool,
        orders: Vec<Order>,
        customers: Vec<Customer>,
        products: Vec<Product>,
        fail: bool,
        fail_numbers: Vec<&'static str>,
        panic_on_search: bool,
        panic_on_lookup: bool,
        last_limit: AtomicUsize,
    }

    #[async_trait]
    impl CommerceProvider for MockCommerce {
        async fn find_order_by_number(&self, number: &str) -> Result<Option<Order>> {
            if self.panic_on_lookup {
                panic!("order index corrupted");
            }
            if self.fail || self.fail_numbers.iter().any(|n| *n == number) {
                return Err(outage());
            }
            Ok(self.orders.iter().find(|o| o.name == format!("#{}", number)).cloned())
        }

        async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
            if self.fail {
                return Err(outage());
            }
            Ok(self
                .customers
                .iter()
                .find(|c| c.email.as_deref() == Some(email))
                .cloned())
        }

        async fn get_customer_orders(&self, customer_id: u64, limit: usize) -> Result<Vec<Order>> {
            self.last_limit.store(limit, Ordering::SeqCst);
            Ok(self
                .orders
                .iter()
                .filter(|o| o.id / 100 == customer_id)
                .take(limit)
                .cloned()
                .collect())
        }

        async fn search_products(&self, query: &str) -> Result<Vec<Product>> {
            if self.panic_on_search {
                panic!("catalog index corrupted");
            }
            if self.fail {
                return Err(outage());
            }
            Ok(self
                .products
                .iter()
                .filter(|p| p.matches_query(query))
                .cloned()
                .collect())
        }

        async fn get_products(&self, limit: usize) -> Result<Vec<Product>> {
            Ok(self.products.iter().take(limit).cloned().collect())
        }

        fn name(&self) -> &str {
            "mock-commerce"
        }

        async fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct MockTicketing {
        connected: bool,
        known: Vec<TicketingCustomer>,
        fail_lookup: bool,
        fail_escalation: bool,
        created: Mutex<Vec<NewCustomer>>,
        history_seen: AtomicUsize,
        tickets: Mutex<Vec<NewTicket>>,
    }

    #[async_trait]
    impl TicketingProvider for MockTicketing {
        async fn find_customer(&self, email: &str) -> Result<Option<TicketingCustomer>> {
            if self.fail_lookup {
                return Err(outage());
            }
            Ok(self
                .known
                .iter()
                .find(|c| c.email.as_deref() == Some(email))
                .cloned())
        }

        async fn create_customer(&self, customer: &NewCustomer) -> Result<TicketingCustomer> {
            self.created.lock().unwrap().push(customer.clone());
            Ok(TicketingCustomer {
                id: 900,
                name: Some(customer.name.clone()),
                email: Some(customer.email.clone()),
            })
        }

        async fn escalate_to_human(
            &self,
            _conversation_id: &ConversationId,
            customer_id: u64,
            _reason: &str,
            history: &[ChatTurn],
        ) -> Result<EscalationReceipt> {
            if self.fail_escalation {
                return Err(outage());
            }
            self.history_seen.store(history.len(), Ordering::SeqCst);
            Ok(EscalationReceipt {
                ticket_id: format!("FD-{}", customer_id),
                escalated_at: Utc::now(),
            })
        }

        async fn create_ticket(&self, ticket: &NewTicket) -> Result<TicketReceipt> {
            if self.fail_escalation {
                return Err(outage());
            }
            self.tickets.lock().unwrap().push(ticket.clone());
            Ok(TicketReceipt {
                id: "T-1".to_string(),
            })
        }

        fn name(&self) -> &str {
            "mock-ticketing"
        }

        async fn is_connected(&self) -> bool {
            self.connected
        }
    }

    fn live_commerce(mock: MockCommerce) -> Arc<MockCommerce> {
        mock.connected.store(true, Ordering::SeqCst);
        Arc::new(mock)
    }

    async fn orchestrator(
        commerce: Arc<MockCommerce>,
        ticketing: MockTicketing,
    ) -> (IntegrationOrchestrator, Arc<MockTicketing>) {
        let ticketing = Arc::new(ticketing);
        let registry = ProviderRegistry::probe(commerce, ticketing.clone()).await;
        (
            IntegrationOrchestrator::new(registry, OrchestratorConfig::default()),
            ticketing,
        )
    }

    fn order(id: u64, name: &str) -> Order {
        Order {
            id,
            name: name.to_string(),
            financial_status: Some("paid".to_string()),
            total_price: "20.00".to_string(),
            ..Default::default()
        }
    }

    fn plan(actions: Vec<Action>) -> ResponsePlan {
        ResponsePlan {
            actions,
            ..Default::default()
        }
    }

    fn lookup(email: Option<&str>, numbers: &[&str]) -> Action {
        Action::OrderLookup {
            email: email.map(str::to_string),
            order_numbers: numbers.iter().map(|n| n.to_string()).collect(),
        }
    }

    fn escalation() -> Action {
        Action::Escalation {
            priority: Priority::High,
            sentiment: Sentiment::Negative,
            reason: EscalationReason::CustomerRequest,
        }
    }

    fn customer_context() -> CustomerContext {
        CustomerContext::new(ConversationId::new("conv-42")).with_email("ana@example.com")
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_gated_commerce_serves_demo_products() {
        let (orch, _) = orchestrator(Arc::new(MockCommerce::default()), MockTicketing::default()).await;
        let plan = plan(vec![Action::ProductSearch {
            query: "headphones".to_string(),
        }]);

        let results = orch.execute(&plan, &mut customer_context()).await;
        let commerce = results.commerce.unwrap();
        assert_eq!(commerce.source, DataSource::Demo);
        assert!(!commerce.products.is_empty());
    }

    #[tokio::test]
    async fn test_failed_search_falls_back_to_demo() {
        let commerce = live_commerce(MockCommerce {
            fail: true,
            ..Default::default()
        });
        let (orch, _) = orchestrator(commerce, MockTicketing::default()).await;
        let plan = plan(vec![Action::ProductSearch {
            query: "speaker".to_string(),
        }]);

        let results = orch.execute(&plan, &mut customer_context()).await;
        assert_eq!(results.commerce.unwrap().source, DataSource::Demo);
    }

    #[tokio::test]
    async fn test_live_search_results() {
        let commerce = live_commerce(MockCommerce {
            products: vec![Product {
                id: 1,
                title: "Live Speaker".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        });
        let (orch, _) = orchestrator(commerce, MockTicketing::default()).await;
        let plan = plan(vec![Action::ProductSearch {
            query: "speaker".to_string(),
        }]);

        let commerce = orch
            .execute(&plan, &mut customer_context())
            .await
            .commerce
            .unwrap();
        assert_eq!(commerce.source, DataSource::Live);
        assert_eq!(commerce.products[0].title, "Live Speaker");
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_gated_commerce_never_fakes_orders() {
        let (orch, _) = orchestrator(Arc::new(MockCommerce::default()), MockTicketing::default()).await;
        let results = orch
            .execute(&plan(vec![lookup(None, &["45678"])]), &mut customer_context())
            .await;
        assert!(results.commerce.is_none());
    }

    #[tokio::test]
    async fn test_explicit_order_numbers() {
        let commerce = live_commerce(MockCommerce {
            orders: vec![order(101, "#45678"), order(102, "#45679")],
            ..Default::default()
        });
        let (orch, _) = orchestrator(commerce, MockTicketing::default()).await;

        let results = orch
            .execute(
                &plan(vec![lookup(None, &["45678", "99999"])]),
                &mut customer_context(),
            )
            .await;
        let orders = results.commerce.unwrap().orders;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].name, "#45678");
    }

    #[tokio::test]
    async fn test_failed_number_lookup_keeps_found_orders() {
        let commerce = live_commerce(MockCommerce {
            orders: vec![order(101, "#45678")],
            fail_numbers: vec!["11111"],
            ..Default::default()
        });
        let (orch, _) = orchestrator(commerce, MockTicketing::default()).await;

        let results = orch
            .execute(
                &plan(vec![lookup(None, &["45678", "11111"])]),
                &mut customer_context(),
            )
            .await;
        let orders = results.commerce.unwrap().orders;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].name, "#45678");
    }

    #[tokio::test]
    async fn test_failed_number_lookup_still_tries_email() {
        let commerce = live_commerce(MockCommerce {
            orders: vec![order(101, "#1")],
            customers: vec![Customer {
                id: 1,
                email: Some("ana@example.com".to_string()),
                ..Default::default()
            }],
            fail_numbers: vec!["11111"],
            ..Default::default()
        });
        let (orch, _) = orchestrator(commerce, MockTicketing::default()).await;

        let results = orch
            .execute(
                &plan(vec![lookup(Some("ana@example.com"), &["11111"])]),
                &mut customer_context(),
            )
            .await;
        assert_eq!(results.commerce.unwrap().orders[0].name, "#1");
    }

    #[tokio::test]
    async fn test_falls_back_to_recent_orders_by_email() {
        let commerce = live_commerce(MockCommerce {
            orders: vec![order(101, "#1"), order(102, "#2")],
            customers: vec![Customer {
                id: 1,
                email: Some("ana@example.com".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        });
        let (orch, _) = orchestrator(commerce.clone(), MockTicketing::default()).await;

        let results = orch
            .execute(
                &plan(vec![lookup(Some("ana@example.com"), &["55555"])]),
                &mut customer_context(),
            )
            .await;
        assert_eq!(results.commerce.unwrap().orders.len(), 2);
        assert_eq!(
            commerce.last_limit.load(Ordering::SeqCst),
            orch_constants::RECENT_ORDERS_LIMIT
        );
    }

    #[tokio::test]
    async fn test_unknown_customer_yields_empty_orders() {
        let commerce = live_commerce(MockCommerce::default());
        let (orch, _) = orchestrator(commerce, MockTicketing::default()).await;

        let results = orch
            .execute(
                &plan(vec![lookup(Some("nobody@example.com"), &[])]),
                &mut customer_context(),
            )
            .await;
        assert!(results.commerce.unwrap().orders.is_empty());
    }

    #[tokio::test]
    async fn test_failed_action_does_not_stop_plan() {
        let commerce = live_commerce(MockCommerce {
            fail: true,
            ..Default::default()
        });
        let ticketing = MockTicketing {
            connected: true,
            ..Default::default()
        };
        let (orch, _) = orchestrator(commerce, ticketing).await;

        let results = orch
            .execute(
                &plan(vec![lookup(None, &["45678"]), escalation()]),
                &mut customer_context(),
            )
            .await;
        assert!(results.commerce.is_none());
        assert_eq!(results.ticketing.unwrap().ticket_id, "FD-900");
    }

    // -------------------------------------------------------------------------
    // Ticketing
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_escalation_uses_known_customer_and_history() {
        let ticketing = MockTicketing {
            connected: true,
            known: vec![TicketingCustomer {
                id: 31,
                name: Some("Ana".to_string()),
                email: Some("ana@example.com".to_string()),
            }],
            ..Default::default()
        };
        let (orch, ticketing) = orchestrator(Arc::new(MockCommerce::default()), ticketing).await;
        let mut context = customer_context();
        context.record_user("I need a human");

        let ticket = orch
            .execute(&plan(vec![escalation()]), &mut context)
            .await
            .ticketing
            .unwrap();
        assert_eq!(ticket.ticket_id, "FD-31");
        assert!(!ticket.placeholder);
        assert_eq!(ticketing.history_seen.load(Ordering::SeqCst), 1);
        assert!(ticketing.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failure_creates_customer() {
        let ticketing = MockTicketing {
            connected: true,
            fail_lookup: true,
            ..Default::default()
        };
        let (orch, ticketing) = orchestrator(Arc::new(MockCommerce::default()), ticketing).await;

        let ticket = orch
            .execute(&plan(vec![escalation()]), &mut customer_context())
            .await
            .ticketing
            .unwrap();
        assert_eq!(ticket.ticket_id, "FD-900");
        let created = ticketing.created.lock().unwrap();
        assert_eq!(created[0].email, "ana@example.com");
        assert_eq!(created[0].name, "ana");
    }

    #[tokio::test]
    async fn test_ticketing_failure_issues_placeholder() {
        let ticketing = MockTicketing {
            connected: true,
            fail_escalation: true,
            ..Default::default()
        };
        let (orch, _) = orchestrator(Arc::new(MockCommerce::default()), ticketing).await;

        let ticket = orch
            .execute(&plan(vec![escalation()]), &mut customer_context())
            .await
            .ticketing
            .unwrap();
        assert!(ticket.placeholder);
        assert!(ticket.ticket_id.starts_with("ESC-"));
    }

    #[tokio::test]
    async fn test_billing_ticket_fields() {
        let ticketing = MockTicketing {
            connected: true,
            ..Default::default()
        };
        let (orch, ticketing) = orchestrator(Arc::new(MockCommerce::default()), ticketing).await;
        let mut context = customer_context();
        context.record_user("I was charged twice");

        let ticket = orch
            .execute(
                &plan(vec![Action::TicketCreation {
                    category: "billing".to_string(),
                    priority: Priority::Medium,
                }]),
                &mut context,
            )
            .await
            .ticketing
            .unwrap();
        assert_eq!(ticket.ticket_id, "T-1");
        assert_eq!(ticket.category, "billing");

        let tickets = ticketing.tickets.lock().unwrap();
        assert_eq!(tickets[0].subject, "Billing inquiry from chat");
        assert!(tickets[0].description.contains("I was charged twice"));
        assert_eq!(tickets[0].conversation_id, Some(ConversationId::new("conv-42")));
    }

    #[tokio::test]
    async fn test_gated_ticketing_leaves_slot_empty() {
        let (orch, _) = orchestrator(Arc::new(MockCommerce::default()), MockTicketing::default()).await;
        let results = orch
            .execute(&plan(vec![escalation()]), &mut customer_context())
            .await;
        assert!(results.ticketing.is_none());
    }

    // -------------------------------------------------------------------------
    // Pipeline
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_process_message_escalation_end_to_end() {
        let ticketing = MockTicketing {
            connected: true,
            ..Default::default()
        };
        let (orch, ticketing) = orchestrator(Arc::new(MockCommerce::default()), ticketing).await;

        let processed = orch
            .process_message(
                "I'm frustrated, I need to speak to a human agent",
                customer_context(),
            )
            .await;

        assert!(processed.analysis.requires_escalation);
        assert!(processed.response.text.contains("FD-900"));
        assert!(processed.response.has_action(AffordanceKind::LiveChat));
        assert!(processed.customer_context.integrations.contains_key(TICKETING_KEY));
        assert_eq!(processed.customer_context.chat_history.len(), 2);
        // the current message is part of the escalation transcript
        assert_eq!(ticketing.history_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_process_message_order_without_commerce() {
        let (orch, _) = orchestrator(Arc::new(MockCommerce::default()), MockTicketing::default()).await;
        let processed = orch
            .process_message("Where is my order #45678", CustomerContext::default())
            .await;

        assert!(processed.integration_results.is_empty());
        assert!(processed.response.text.contains("#45678"));
        assert!((processed.response.metadata.confidence - 0.2).abs() < 1e-9);
        assert!(processed.customer_context.integrations.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_search_falls_back_to_demo() {
        let commerce = live_commerce(MockCommerce {
            panic_on_search: true,
            ..Default::default()
        });
        let (orch, _) = orchestrator(commerce, MockTicketing::default()).await;

        let processed = orch
            .process_message("looking for wireless headphones", customer_context())
            .await;

        assert_eq!(processed.response.metadata.source, ResponseSource::Demo);
        assert!(processed.response.metadata.extra.contains_key("products"));
        assert_eq!(
            processed.integration_results.commerce.unwrap().source,
            DataSource::Demo
        );
    }

    #[tokio::test]
    async fn test_panicking_action_does_not_stop_plan() {
        let commerce = live_commerce(MockCommerce {
            panic_on_lookup: true,
            ..Default::default()
        });
        let ticketing = MockTicketing {
            connected: true,
            ..Default::default()
        };
        let (orch, _) = orchestrator(commerce, ticketing).await;

        let results = orch
            .execute(
                &plan(vec![lookup(None, &["45678"]), escalation()]),
                &mut customer_context(),
            )
            .await;
        assert!(results.commerce.is_none());
        assert_eq!(results.ticketing.unwrap().ticket_id, "FD-900");
    }

    #[test]
    fn test_trouble_response_keeps_context() {
        let processed = IntegrationOrchestrator::trouble("hello?", customer_context());

        assert_eq!(processed.response.metadata.source, ResponseSource::Fallback);
        assert!(processed.response.text.starts_with("I'm having trouble"));
        assert!(processed.response.has_action(AffordanceKind::Escalate));
        assert!(processed.integration_results.is_empty());
        assert_eq!(processed.customer_context.conversation_id.as_str(), "conv-42");
        assert_eq!(processed.customer_context.chat_history.len(), 2);
    }

    #[tokio::test]
    async fn test_throttled_shopify_search_serves_demo_products() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/admin/api/2024-01/shop.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"shop":{"name":"Demo"}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/admin/api/2024-01/products.json")
            .match_query(mockito::Matcher::Any)
            .with_status(429)
            .with_header("Retry-After", "-1")
            .create_async()
            .await;

        let config = crate::config::CommerceConfig {
            api_base: Some(format!("{}/admin/api/2024-01", server.url())),
            access_token: Some("shpat_test".to_string()),
            ..Default::default()
        };
        let policy = crate::integrations::CallPolicy {
            max_retries: 1,
            min_delay: std::time::Duration::from_millis(1),
            max_delay: std::time::Duration::from_millis(5),
            ..Default::default()
        };
        let shopify: SharedCommerce =
            Arc::new(crate::integrations::ShopifyClient::new(&config, policy).unwrap());
        let registry =
            ProviderRegistry::probe(shopify, Arc::new(MockTicketing::default())).await;
        assert!(registry.commerce().is_some());
        let orch = IntegrationOrchestrator::new(registry, OrchestratorConfig::default());

        let processed = orch
            .process_message("looking for wireless headphones", customer_context())
            .await;

        assert_eq!(processed.response.metadata.source, ResponseSource::Demo);
        assert!(processed.response.metadata.extra.contains_key("products"));
    }

    #[tokio::test]
    async fn test_reinit_refreshes_gates() {
        let commerce = Arc::new(MockCommerce::default());
        let shared: SharedCommerce = commerce.clone();
        let registry = ProviderRegistry::probe(shared, Arc::new(MockTicketing::default())).await;
        let mut orch = IntegrationOrchestrator::new(registry, OrchestratorConfig::default());
        assert!(orch.registry().commerce().is_none());

        commerce.connected.store(true, Ordering::SeqCst);
        assert!(orch.registry().commerce().is_none());

        orch.reinit().await;
        assert!(orch.registry().commerce().is_some());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("billing"), "Billing");
        assert_eq!(capitalize(""), "");
    }
}
