//! Chat Command
//!
//! One-shot (`--message`) or interactive conversation with the pipeline.
//! The customer context is carried across turns exactly as a chat surface
//! would persist it.
//!
//! REPL commands: `/quit`, `/reset`, `/reload`, `/providers`, `/context`

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::cli::ui::Output;
use crate::config::ConfigLoader;
use crate::orchestrator::{CustomerContext, IntegrationOrchestrator};
use crate::types::{ConversationId, Result};

pub struct ChatOptions {
    pub email: Option<String>,
    pub name: Option<String>,
    pub message: Option<String>,
    pub format: String,
}

impl ChatOptions {
    fn new_context(&self) -> CustomerContext {
        let mut context = CustomerContext::new(ConversationId::generate());
        context.email = self.email.clone();
        context.name = self.name.clone();
        context
    }
}

pub async fn run(options: ChatOptions) -> Result<()> {
    let config = ConfigLoader::load()?;
    let mut orchestrator = IntegrationOrchestrator::from_config(&config).await?;
    let out = Output::new();

    if let Some(message) = &options.message {
        let processed = orchestrator
            .process_message(message, options.new_context())
            .await;
        if options.format == "json" {
            println!("{}", serde_json::to_string_pretty(&processed)?);
        } else {
            out.reply(&processed.response);
        }
        return Ok(());
    }

    out.header("SupportFlow chat");
    out.info("Type a message, or /quit to leave. /reset starts a new conversation.");

    let mut context = options.new_context();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"you\xE2\x80\xBA ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" | "/exit" => break,
            "/reset" => {
                context = options.new_context();
                out.success(&format!("New conversation {}", context.conversation_id));
            }
            "/reload" => {
                orchestrator.reinit().await;
                out.success("Providers re-probed");
                for status in orchestrator.registry().statuses() {
                    out.provider(&status);
                }
            }
            "/providers" => {
                for status in orchestrator.registry().statuses() {
                    out.provider(&status);
                }
            }
            "/context" => println!("{}", serde_json::to_string_pretty(&context)?),
            _ if input.starts_with('/') => out.error(&format!("Unknown command: {}", input)),
            _ => {
                let processed = orchestrator.process_message(input, context).await;
                out.reply(&processed.response);
                context = processed.customer_context;
            }
        }
    }

    Ok(())
}
