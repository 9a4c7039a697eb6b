use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use deep_agent_core::config::Config;
use deep_agent_engine::DeepAgentEngine;
use deep_agent_server::AppState;

#[derive(Parser)]
#[command(
    name = "deep-agent",
    about = "Deep agent chat API with typed event streaming",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Port to listen on (default: 8000)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (default: 0.0.0.0)
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from("deep-agent.json"));
    let config = Arc::new(Config::load(&config_path)?);

    match cli.command {
        Commands::Serve { port, bind } => {
            let port = port.unwrap_or_else(|| config.port());
            let bind = bind.unwrap_or_else(|| config.bind_addr());

            let engine = Arc::new(DeepAgentEngine::new(Arc::clone(&config))?);
            let state = Arc::new(AppState::new(config, engine));

            deep_agent_server::start_server(state, &bind, port).await?;
        }
    }

    Ok(())
}
