use clap::{Parser, Subcommand};
use std::sync::Arc;

use gce_results::api;
use gce_results::client;
use gce_results::config::CONFIG;
use gce_results::models::{LevelCode, SearchType};
use gce_results::remote::RemoteDataService;

#[derive(Parser)]
#[command(name = "gce-results", about = "GCE results lookup service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server: search API, metadata API and the static site
    Serve {
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
    /// Browse results in the terminal against a running server
    Browse {
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        server: String,
        /// Search by student name, center number or school name
        #[arg(long = "type", value_enum)]
        search_type: Option<SearchType>,
        /// The name or number to search for
        #[arg(long)]
        value: Option<String>,
        #[arg(long, value_enum, ignore_case = true)]
        level: Option<LevelCode>,
        #[arg(long)]
        year: Option<i32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber (handles both tracing and log crate)
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { port } => {
            let remote = Arc::new(RemoteDataService::from_config()?);
            let app = api::create_router(remote, &CONFIG.static_dir);

            let addr = format!("0.0.0.0:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on {}", addr);
            axum::serve(listener, app).await?;
        }
        Command::Browse {
            server,
            search_type,
            value,
            level,
            year,
        } => {
            client::run(server, search_type, value, level, year).await?;
        }
    }

    Ok(())
}
