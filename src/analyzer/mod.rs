//! Message Analyzer Module
//!
//! Rule-based understanding of inbound chat messages:
//! - Pattern library (intent and sentiment rules)
//! - Entity extraction (order numbers)
//! - Sentiment, priority and escalation scoring

pub mod message;
pub mod patterns;
pub mod types;

pub use message::MessageAnalyzer;
pub use patterns::{PATTERN_LIBRARY, PatternLibrary, SentimentCounts};
pub use types::{Analysis, Entities, Intent, Priority, Sentiment};
