use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use facesearch::connector::api::{Container, ContainerConfig, Router};
use facesearch::connector::http::{self, ServerConfig};
use facesearch::Commands;

#[derive(Parser)]
#[command(name = "facesearch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(short, long, global = true, env = "FACESEARCH_DATA_DIR", default_value = "~/.facesearch")]
    data_dir: String,

    /// Where uploaded images are kept (default: <data-dir>/uploads)
    #[arg(long, global = true, env = "FACESEARCH_UPLOAD_DIR")]
    upload_dir: Option<String>,

    /// Embedding generator executable
    #[arg(long, global = true, env = "FACESEARCH_GENERATOR", default_value = "python3")]
    generator: String,

    /// Argument passed to the generator before the image path (repeatable)
    #[arg(
        long = "generator-arg",
        global = true,
        env = "FACESEARCH_GENERATOR_ARGS",
        value_delimiter = ',',
        default_value = "scripts/arcface_embedding.py"
    )]
    generator_args: Vec<String>,

    /// Seconds before a generator run is abandoned
    #[arg(long, global = true, env = "FACESEARCH_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Embedding dimensionality
    #[arg(long, global = true, env = "FACESEARCH_DIMENSIONS", default_value_t = 512)]
    dimensions: usize,

    /// Cosine distance below which a stored photo counts as a match
    #[arg(long, global = true, env = "FACESEARCH_MAX_DISTANCE", default_value_t = 0.5)]
    max_distance: f32,

    /// Maximum number of matches returned
    #[arg(long, global = true, env = "FACESEARCH_LIMIT", default_value_t = 10)]
    limit: usize,

    #[arg(long, global = true)]
    memory_storage: bool,

    #[arg(long, global = true)]
    mock_embeddings: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let data_dir = expand_tilde(&cli.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let config = ContainerConfig {
        data_dir,
        upload_dir: cli.upload_dir.as_deref().map(expand_tilde),
        generator: cli.generator,
        generator_args: cli.generator_args,
        timeout_secs: cli.timeout_secs,
        dimensions: cli.dimensions,
        max_distance: cli.max_distance,
        limit: cli.limit,
        memory_storage: cli.memory_storage,
        mock_embeddings: cli.mock_embeddings,
    };
    let container = Container::new(config)?;

    match cli.command {
        Commands::Serve { addr, body_limit } => {
            http::serve(Arc::new(container), ServerConfig { addr, body_limit }).await?;
        }
        command => {
            let router = Router::new(&container);
            let output = router.route(command).await?;
            println!("{}", output);
        }
    }

    Ok(())
}

fn expand_tilde(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            if path == "~" {
                return home.to_string_lossy().to_string();
            }
            return path.replacen("~", &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
