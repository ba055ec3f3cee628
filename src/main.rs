//! Gemini Search Tool
//!
//! Serves the `gemini_search` tool to an agent host over HTTP, or runs a
//! single search from the command line.

use anyhow::Result;
use clap::Parser;
use gemini_search_tool::{
    config::{Environment, Settings},
    server::App,
    GeminiSearchTool,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Gemini Search Tool
///
/// Web search for conversational agents, backed by Gemini with Google Search
/// grounding and multi-key rotation.
#[derive(Parser, Debug)]
#[command(name = "gemini-search-tool")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on (overrides PORT env var)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to (overrides HOST env var)
    #[arg(long)]
    host: Option<String>,

    /// Log level: trace, debug, info, warn, error (overrides LOG_LEVEL env var)
    #[arg(long)]
    log_level: Option<String>,

    /// Environment: dev, staging, prod (overrides ENVIRONMENT env var)
    #[arg(short, long)]
    env: Option<Environment>,

    /// Run a single search, print the result and exit
    #[arg(short, long)]
    query: Option<String>,
}

impl Args {
    /// Apply command-line overrides and re-validate the result
    fn apply_overrides(&self, settings: &mut Settings) -> Result<()> {
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(log_level) = &self.log_level {
            settings.log_level = log_level.clone();
        }
        if let Some(env) = self.env {
            settings.environment = env;
        }

        settings.validate()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (before logging, so we can use log_level)
    let mut settings = Settings::load()?;
    args.apply_overrides(&mut settings)?;

    init_tracing(&settings.log_level);

    if let Some(query) = &args.query {
        let tool = GeminiSearchTool::from_config(&settings.gemini);
        println!("{}", tool.invoke(query).await);
        return Ok(());
    }

    tracing::info!(
        app_name = %settings.app_name,
        version = %settings.app_version,
        environment = %settings.environment,
        host = %settings.host,
        port = %settings.port,
        key_count = settings.gemini.api_keys.len(),
        strategy = %settings.gemini.strategy,
        "Starting application"
    );

    let app = App::new(settings);
    app.run_with_graceful_shutdown().await?;

    tracing::info!("Application shutdown complete");

    Ok(())
}

/// Initialize tracing subscriber with the specified log level
///
/// Logs go to stderr so one-shot query output on stdout stays clean.
fn init_tracing(log_level: &str) {
    // Build filter from RUST_LOG env var or use provided log level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let console_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry().with(console_layer).init();
}
