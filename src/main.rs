mod cache;
mod config;
mod itunes;
mod lyrics;
mod model;
mod server;
mod ytm;

use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "cadence", version, about = "Music aggregation API: search, lyrics, streams")]
struct Cli {
    /// Override the listen port.
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Search tracks and print to stdout (headless).
    Search { query: String },
    /// Print the recommendation feed to stdout (headless).
    Home,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load();
    if let Some(port) = cli.port {
        cfg.port = port;
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => server::run(cfg).await?,
        Command::Search { query } => {
            let ytm = ytm::YtmClient::new().context("build ytm client")?;
            print_tracks(&ytm.search(&query, 20).await);
        }
        Command::Home => {
            let ytm = ytm::YtmClient::new().context("build ytm client")?;
            print_tracks(&ytm.recommendations(20).await);
        }
    }

    Ok(())
}

fn print_tracks(tracks: &[model::Track]) {
    for (i, t) in tracks.iter().enumerate() {
        println!("{:02}. {} - {}  (id={})", i + 1, t.title, t.artist, t.id);
    }
}
