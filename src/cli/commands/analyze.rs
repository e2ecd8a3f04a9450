//! Analyze Command
//!
//! Show how a single message is classified and planned, without calling
//! any provider.

use serde_json::json;

use crate::analyzer::MessageAnalyzer;
use crate::cli::ui::Output;
use crate::planner::ResponsePlanner;
use crate::types::Result;

pub fn run(text: &str, email: Option<&str>, format: &str) -> Result<()> {
    let analysis = MessageAnalyzer::new().analyze(text, email);
    let plan = ResponsePlanner::plan(&analysis, text);

    if format == "json" {
        let output = json!({
            "message": text,
            "analysis": analysis,
            "plan": plan,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let out = Output::new();
    out.section("Analysis");
    let intents: Vec<&str> = analysis.intents.iter().map(|i| i.as_str()).collect();
    println!(
        "  Intents:     {}",
        if intents.is_empty() {
            "(none)".to_string()
        } else {
            intents.join(", ")
        }
    );
    if !analysis.entities.order_numbers.is_empty() {
        println!("  Orders:      {}", analysis.entities.order_numbers.join(", "));
    }
    println!("  Sentiment:   {}", analysis.sentiment);
    println!("  Priority:    {}", analysis.priority);
    println!("  Escalate:    {}", analysis.requires_escalation);
    println!("  Confidence:  {:.1}", analysis.confidence);

    out.section("Plan");
    println!("  Response:    {}", plan.response_type);
    if plan.actions.is_empty() {
        out.info("No provider actions");
    }
    for (i, action) in plan.actions.iter().enumerate() {
        println!("  {}. {}", i + 1, serde_json::to_string(action)?);
    }

    Ok(())
}
