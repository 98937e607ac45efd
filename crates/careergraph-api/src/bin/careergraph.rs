use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use careergraph_api::{AppState, Server};
use careergraph_core::{QuizInput, Settings};

#[derive(Parser)]
#[command(
    name = "careergraph",
    version,
    author,
    about = "CareerGraph - multi-path educational roadmap generation",
    long_about = "CareerGraph generates cheapest/fastest/prestige educational \
roadmaps from a student quiz, degrading to deterministic local data when \
external sources are unavailable."
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    verbose: bool,

    #[arg(long, global = true, help = "Configuration file path")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Start the HTTP API server")]
    Serve {
        #[arg(long, help = "Host address to bind")]
        host: Option<String>,

        #[arg(short, long, help = "Port to listen on")]
        port: Option<u16>,
    },

    #[command(about = "Generate a roadmap from a quiz file and print it as JSON")]
    Plan {
        #[arg(help = "Path to a quiz JSON file")]
        input: PathBuf,

        #[arg(long, help = "Pretty-print the roadmap JSON")]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "careergraph=debug,tower_http=debug"
    } else {
        "careergraph=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            let server = Server::new(settings)?;
            server.run().await?;
        }
        Commands::Plan { input, pretty } => {
            let raw = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read quiz file {}", input.display()))?;
            let quiz: QuizInput =
                serde_json::from_str(&raw).context("Quiz file is not valid quiz JSON")?;

            let state = AppState::new(settings)?;
            let roadmap = state.orchestrator.generate_roadmap(&quiz).await?;

            let rendered = if pretty {
                serde_json::to_string_pretty(&roadmap)?
            } else {
                serde_json::to_string(&roadmap)?
            };
            println!("{}", rendered);
        }
    }

    Ok(())
}
