//! Pattern Library
//!
//! Static intent and sentiment rules used by the message analyzer.
//!
//! ## Design Principles
//! - Each intent category is an ordered `(tag, patterns)` pair
//! - A category matches on its first hitting pattern (short-circuit `any()`),
//!   so a category never contributes more than once to confidence
//! - Sentiment sets are counted in full: every matching pattern adds one

use regex::Regex;
use std::sync::LazyLock;

use super::types::Intent;

/// Order numbers: `#` optional, then a hyphenated pair of 4+ char alphanumeric
/// tokens or a run of 4+ digits. The hyphenated form is tried first so that
/// `ABCD-1234` is not cut down to `1234`.
static ORDER_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#?([A-Za-z0-9]{4,}-[A-Za-z0-9]{4,}|\d{4,})")
        .expect("order number pattern is a valid regex")
});

/// Process-wide compiled pattern library
pub static PATTERN_LIBRARY: LazyLock<PatternLibrary> = LazyLock::new(PatternLibrary::builtin);

const ORDER_TRACKING: &[&str] = &[
    r"(?i)\b(where|track|tracking|status)\b.*\border",
    r"(?i)\border\b.*\b(status|tracking|arrive|arrived|shipped|delivered)\b",
    r"(?i)\btrack(ing)?\s+(my|an?|the)?\s*(order|package|parcel|shipment)",
    r"(?i)\b(shipping|shipment|delivery|package|parcel)\b",
    r"(?i)\border\s*(number|no\.?|#)",
    r"(?i)\bwhen will (it|my|the)\b.*\b(arrive|ship|come)",
];

const PRODUCT_SEARCH: &[&str] = &[
    r"(?i)\blooking for\b",
    r"(?i)\b(recommend|recommendation|suggest)",
    r"(?i)\b(headphone|speaker|earphone|earbud|bluetooth|wireless|cable)s?\b",
    r"(?i)\bdo you (have|sell|carry)\b",
    r"(?i)\b(in stock|available in)\b",
    r"(?i)\b(buy|purchase|shop for)\b",
    r"(?i)\bproducts?\b",
];

const SUPPORT_ESCALATION: &[&str] = &[
    r"(?i)\b(speak|talk|chat)\s+(to|with)\s+(a|an|the|some)?\s*(human|person|agent|someone|manager|representative|supervisor)",
    r"(?i)\b(human|real person|live agent|customer service|representative|supervisor|manager)\b",
    r"(?i)\bescalat",
    r"(?i)\bcall me\b",
];

const BILLING_INQUIRY: &[&str] = &[
    r"(?i)\b(charge|charged|charges|overcharged|double[- ]charged)\b",
    r"(?i)\b(bill|billed|billing)\b",
    r"(?i)\brefund",
    r"(?i)\b(payment|invoice|receipt)s?\b",
    r"(?i)\bsubscription",
    r"(?i)\b(credit|debit) card\b",
];

const NEGATIVE: &[&str] = &[
    r"(?i)\bfrustrat",
    r"(?i)\b(angry|annoyed|upset|furious)\b",
    r"(?i)\b(terrible|awful|horrible|worst)\b",
    r"(?i)\bdisappoint",
    r"(?i)\b(unacceptable|ridiculous|useless)\b",
    r"(?i)\bhate\b",
    r"(?i)\bbroken\b",
    r"(?i)\bnever (arrived|received|came)\b",
];

const URGENT: &[&str] = &[
    r"(?i)\burgent",
    r"(?i)\basap\b",
    r"(?i)\bimmediately\b",
    r"(?i)\bemergency\b",
    r"(?i)\bright now\b",
    r"(?i)\bcritical\b",
];

const POSITIVE: &[&str] = &[
    r"(?i)\bthank(s| you)?\b",
    r"(?i)\b(great|awesome|amazing|excellent|perfect)\b",
    r"(?i)\blove\b",
    r"(?i)\bhappy\b",
    r"(?i)\bappreciate",
];

/// One intent category: a tag plus its ordered patterns
pub struct IntentPatterns {
    pub intent: Intent,
    patterns: Vec<Regex>,
}

impl IntentPatterns {
    fn new(intent: Intent, sources: &[&str]) -> Self {
        Self {
            intent,
            patterns: compile(sources),
        }
    }

    /// True on the first matching pattern; remaining patterns are not tested
    pub fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Keyword sets scored independently during sentiment analysis
pub struct SentimentPatterns {
    pub negative: Vec<Regex>,
    pub urgent: Vec<Regex>,
    pub positive: Vec<Regex>,
}

/// Per-set match counts for one message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentimentCounts {
    pub negative: usize,
    pub urgent: usize,
    pub positive: usize,
}

impl SentimentPatterns {
    pub fn score(&self, text: &str) -> SentimentCounts {
        SentimentCounts {
            negative: count_matches(&self.negative, text),
            urgent: count_matches(&self.urgent, text),
            positive: count_matches(&self.positive, text),
        }
    }
}

/// Complete rule set consumed by the analyzer
pub struct PatternLibrary {
    /// Categories in evaluation order
    pub intents: Vec<IntentPatterns>,
    pub sentiment: SentimentPatterns,
}

impl PatternLibrary {
    /// Built-in English rule set
    pub fn builtin() -> Self {
        Self {
            intents: vec![
                IntentPatterns::new(Intent::OrderTracking, ORDER_TRACKING),
                IntentPatterns::new(Intent::ProductSearch, PRODUCT_SEARCH),
                IntentPatterns::new(Intent::SupportEscalation, SUPPORT_ESCALATION),
                IntentPatterns::new(Intent::BillingInquiry, BILLING_INQUIRY),
            ],
            sentiment: SentimentPatterns {
                negative: compile(NEGATIVE),
                urgent: compile(URGENT),
                positive: compile(POSITIVE),
            },
        }
    }

    /// Extract order numbers in order of appearance, leading `#` stripped
    pub fn extract_order_numbers(&self, text: &str) -> Vec<String> {
        ORDER_NUMBER
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

fn compile(sources: &[&str]) -> Vec<Regex> {
    sources
        .iter()
        .map(|p| Regex::new(p).expect("built-in pattern is a valid regex"))
        .collect()
}

fn count_matches(patterns: &[Regex], text: &str) -> usize {
    patterns.iter().filter(|p| p.is_match(text)).count()
}
