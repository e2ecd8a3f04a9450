use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use supportflow::cli::commands;

#[derive(Parser)]
#[command(name = "supportflow")]
#[command(
    version,
    about = "Customer-support message understanding and integration orchestration"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the support pipeline (interactive unless --message is given)
    Chat {
        #[arg(long, env = "SUPPORTFLOW_CUSTOMER_EMAIL", help = "Customer email")]
        email: Option<String>,
        #[arg(long, help = "Customer name")]
        name: Option<String>,
        #[arg(long, short, help = "Send a single message and exit")]
        message: Option<String>,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format for --message: text, json"
        )]
        format: String,
    },

    /// Show how a message is analyzed and planned (no provider calls)
    Analyze {
        #[arg(help = "Message text")]
        text: String,
        #[arg(long, help = "Customer email")]
        email: Option<String>,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Probe the configured providers
    Providers {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Create .supportflow/config.toml
    Init {
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mSupportFlow encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Chat {
            email,
            name,
            message,
            format,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::chat::run(commands::chat::ChatOptions {
                email,
                name,
                message,
                format,
            }))?;
        }
        Commands::Analyze {
            text,
            email,
            format,
        } => {
            commands::analyze::run(&text, email.as_deref(), &format)?;
        }
        Commands::Providers { format } => {
            let rt = Runtime::new()?;
            rt.block_on(commands::providers::run(&format))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => commands::config::show(&format)?,
            ConfigAction::Path => commands::config::path()?,
            ConfigAction::Init { force } => commands::config::init(force)?,
        },
    }

    Ok(())
}
