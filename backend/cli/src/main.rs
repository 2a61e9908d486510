//! `stackforge` binary: config load, logging init, service wiring, serve.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use stackforge_config::StackForgeConfig;
use stackforge_core::CompletionOptions;
use stackforge_engine::{
    prompt, CompletionPipeline, EditEngine, GenerationConfig, Generator, TokenThrottle,
};
use stackforge_gateway::AppState;
use stackforge_session::{MemoryBundleStore, SessionStore};

#[derive(Parser)]
#[command(name = "stackforge", version, about = "LLM-driven project generation service")]
struct Cli {
    /// Config file path (default: ~/.stackforge/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP gateway (the default)
    Serve,
    /// Print the resolved configuration and exit
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .unwrap_or_else(stackforge_config::config_file_path);
    let config = stackforge_config::load_config(&config_path).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Config => print_config(config),
    }
}

async fn serve(config: StackForgeConfig) -> Result<()> {
    stackforge_logging::init_logger(&config.logging.dir, &config.logging.level);
    info!(provider = ?config.provider.kind, "starting stackforge");

    let backend = stackforge_provider::build_backend(&config.provider)?;
    let throttle = Arc::new(TokenThrottle::new(config.throttle.tokens_per_minute));
    let pipeline = Arc::new(
        CompletionPipeline::new(backend, throttle)
            .with_max_continuations(config.generation.max_continuations),
    );

    let options = CompletionOptions {
        temperature: config.generation.temperature,
        max_tokens: config.generation.max_tokens,
        top_p: config.generation.top_p,
        frequency_penalty: config.generation.frequency_penalty,
        presence_penalty: config.generation.presence_penalty,
    };
    let bundles = Arc::new(MemoryBundleStore::new());

    let state = Arc::new(AppState {
        sessions: SessionStore::new(prompt::SYSTEM_PERSONA),
        generator: Generator::new(
            pipeline.clone(),
            bundles.clone(),
            GenerationConfig {
                options: options.clone(),
                min_input_len: config.generation.min_input_len,
                plan: prompt::full_stack_plan(),
            },
        ),
        editor: EditEngine::new(pipeline, bundles, options),
    });

    spawn_session_sweeper(state.clone(), &config);

    let addr: SocketAddr = format!("{}:{}", config.gateway.host, config.gateway.port)
        .parse()
        .context("invalid gateway host/port")?;
    stackforge_gateway::serve(addr, state).await
}

/// Periodically evict sessions idle past the configured timeout; the
/// session map would otherwise grow for the life of the process.
fn spawn_session_sweeper(state: Arc<AppState>, config: &StackForgeConfig) {
    let idle = chrono::Duration::seconds(config.session.idle_timeout_secs as i64);
    let interval = Duration::from_secs(config.session.sweep_interval_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            state.sessions.evict_idle(idle).await;
        }
    });
}

fn print_config(mut config: StackForgeConfig) -> Result<()> {
    if config.provider.api_key.is_some() {
        config.provider.api_key = Some("<redacted>".to_string());
    }
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}
