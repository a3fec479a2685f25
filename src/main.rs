//! chatpipe - Main Entry Point
//!
//! Wires configuration, the generation backend, the pipeline, and the web
//! boundary together. All factory logic lives here, separated from the
//! business logic.

use chatpipe::config::PipelineConfig;
use chatpipe::llm::provider::LlmProvider;
use chatpipe::llm::providers::{
    AnthropicConfig, AnthropicProvider, OllamaConfig, OllamaProvider,
};
use chatpipe::observability::init_default_logging;
use chatpipe::pipeline::{GenerationSettings, Pipeline};
use chatpipe::server::{ChatServer, MemoryConversationStore};
use chatpipe::{PipelineError, PipelineResult};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

/// Keyword-routed conversational pipeline
#[derive(Parser)]
#[command(name = "chatpipe")]
#[command(about = "Keyword-routed conversational pipeline with pluggable LLM backends")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP chat API
    Serve,
    /// Run a single query through the pipeline and print the report
    Query {
        /// The query text
        text: String,
    },
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!("Starting chatpipe v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Query { text } => query(config, &text).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }

    info!("Shutdown complete");
}

fn load_configuration(config_path: &Option<PathBuf>) -> PipelineResult<PipelineConfig> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(PipelineConfig::load_from_file(path)?)
        }
        None => {
            let default_paths = ["chatpipe.toml", "config/chatpipe.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(PipelineConfig::load_from_file(&path)?);
                }
            }

            Err(PipelineError::server(
                "No configuration file found. Provide one with -c/--config or create chatpipe.toml",
            ))
        }
    }
}

/// Provider factory: builds the generation backend from configuration
fn create_provider(config: &PipelineConfig) -> PipelineResult<Arc<dyn LlmProvider>> {
    let timeout = Duration::from_secs(config.llm.timeout_secs);

    match config.llm.provider.as_str() {
        "ollama" => {
            let mut ollama_config = OllamaConfig {
                timeout,
                ..Default::default()
            };
            if let Some(base_url) = &config.llm.base_url {
                ollama_config.base_url = base_url.clone();
            }
            Ok(Arc::new(OllamaProvider::new(ollama_config)?))
        }
        "anthropic" => {
            let api_key = config.get_llm_api_key()?;
            let mut anthropic_config = AnthropicConfig {
                api_key,
                timeout,
                ..Default::default()
            };
            if let Some(base_url) = &config.llm.base_url {
                anthropic_config.base_url = base_url.clone();
            }
            Ok(Arc::new(AnthropicProvider::new(anthropic_config)?))
        }
        provider => Err(PipelineError::server(format!(
            "Unsupported LLM provider: {provider}"
        ))),
    }
}

fn build_pipeline(config: &PipelineConfig) -> PipelineResult<Pipeline> {
    let provider = create_provider(config)?;
    let settings = GenerationSettings::from(&config.llm);
    Ok(Pipeline::new(provider, settings))
}

async fn serve(config: PipelineConfig) -> PipelineResult<()> {
    info!(
        "Service starting with ID: {} ({})",
        config.pipeline.id, config.llm.provider
    );

    let pipeline = Arc::new(build_pipeline(&config)?);
    let store = Arc::new(MemoryConversationStore::new());
    let server = ChatServer::new(pipeline, store);

    let bind = config.server.bind.clone();
    let port = config.server.port;

    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .map_err(|e| PipelineError::server(format!("Failed to install SIGINT handler: {e}")))?;
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .map_err(|e| PipelineError::server(format!("Failed to install SIGTERM handler: {e}")))?;

    tokio::select! {
        result = server.start(&bind, port) => result,
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully");
            Ok(())
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully");
            Ok(())
        }
    }
}

async fn query(config: PipelineConfig, text: &str) -> PipelineResult<()> {
    let pipeline = build_pipeline(&config)?;
    let record = pipeline.run(text).await;
    println!("{}", record.result.unwrap_or_default());
    Ok(())
}

fn handle_config_command(config: PipelineConfig, show: bool) -> PipelineResult<()> {
    if show {
        println!(
            "{}",
            toml::to_string_pretty(&config)
                .map_err(|e| PipelineError::server(format!("Failed to render config: {e}")))?
        );
    }

    info!("Configuration validation complete");
    Ok(())
}
