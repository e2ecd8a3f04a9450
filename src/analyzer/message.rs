//! Message Analyzer
//!
//! Turns one raw chat message into an [`Analysis`]. Total: every input,
//! including the empty string, yields a valid analysis.

use tracing::debug;

use super::patterns::{PATTERN_LIBRARY, PatternLibrary};
use super::types::{Analysis, Entities, Intent, Priority, Sentiment};
use crate::constants::analysis as analysis_constants;

/// Rule-based analyzer backed by a [`PatternLibrary`]
pub struct MessageAnalyzer {
    library: &'static PatternLibrary,
}

impl Default for MessageAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageAnalyzer {
    pub fn new() -> Self {
        Self {
            library: &PATTERN_LIBRARY,
        }
    }

    /// Analyze one message. `email` is attached as an entity verbatim.
    pub fn analyze(&self, text: &str, email: Option<&str>) -> Analysis {
        let mut analysis = Analysis {
            entities: Entities {
                order_numbers: self.library.extract_order_numbers(text),
                email: email.map(str::to_string),
                products: Vec::new(),
            },
            ..Default::default()
        };

        let mut confidence = 0.0;
        for category in &self.library.intents {
            if category.matches(text) {
                analysis.intents.push(category.intent);
                confidence += analysis_constants::INTENT_CONFIDENCE_STEP;
            }
        }

        let counts = self.library.sentiment.score(text);
        if counts.negative > 0 || counts.urgent > 0 {
            analysis.sentiment = Sentiment::Negative;
            analysis.priority = if counts.urgent > 0 {
                Priority::Urgent
            } else {
                Priority::High
            };
            analysis.requires_escalation = counts.negative
                >= analysis_constants::NEGATIVE_ESCALATION_THRESHOLD
                || counts.urgent > 0;
        } else if counts.positive > 0 {
            analysis.sentiment = Sentiment::Positive;
        }

        // Override only raises: urgent stays urgent, true stays true.
        let negative_with_intent =
            analysis.sentiment == Sentiment::Negative && !analysis.intents.is_empty();
        if analysis.has_intent(Intent::SupportEscalation) || negative_with_intent {
            analysis.requires_escalation = true;
            analysis.priority = analysis.priority.max(Priority::High);
        }

        analysis.confidence = f64::min(confidence, analysis_constants::MAX_CONFIDENCE);

        debug!(
            intents = ?analysis.intents,
            sentiment = %analysis.sentiment,
            priority = %analysis.priority,
            escalate = analysis.requires_escalation,
            confidence = analysis.confidence,
            "Message analyzed"
        );

        analysis
    }
}
