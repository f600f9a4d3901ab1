// src/main.rs — TalkArt entry point

use clap::Parser;

use talkart::cli::{Cli, Commands};
use talkart::infra::config::Config;
use talkart::infra::logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Respects RUST_LOG
    logger::init_logging(&cli.log_level);

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Falls back to defaults if no config.toml
    let config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            talkart::cli::serve::run_serve(config, host, port).await
        }
        Some(Commands::Play) => talkart::cli::play::run_play(&config).await,
        Some(Commands::Gallery { action }) => {
            talkart::cli::gallery::run_gallery(&config, action).await
        }
        Some(Commands::Sessions { action }) => {
            talkart::cli::sessions::run_sessions(&config, action).await
        }
        Some(Commands::Status) | None => talkart::cli::status::show_status(&config).await,
    }
}
