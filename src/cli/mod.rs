use std::net::SocketAddr;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server with /upload, /search and /health
    Serve {
        #[arg(long, env = "FACESEARCH_ADDR", default_value = "127.0.0.1:8080")]
        addr: SocketAddr,

        /// Maximum request body size in bytes
        #[arg(long, env = "FACESEARCH_BODY_LIMIT", default_value_t = 10 * 1024 * 1024)]
        body_limit: usize,
    },

    /// Embed an image already on disk and store it
    Ingest { path: String },

    /// Find stored photos whose faces resemble the one in an image
    Search {
        path: String,

        /// Override the configured distance cutoff
        #[arg(long)]
        max_distance: Option<f32>,

        /// Override the configured result cap
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    Stats,
}
