//! tunedl - Download and tag music from a Subsonic library

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tunedl::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "tunedl=debug,reqwest=debug"
    } else {
        "tunedl=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Auth {
            url,
            username,
            password,
            force,
        } => {
            cli::commands::auth(url, username, password, force).await?;
        }
        Commands::Library { json, podcasts } => {
            cli::commands::library(json, podcasts).await?;
        }
        Commands::Download(args) => {
            cli::commands::download(args).await?;
        }
        Commands::Config {
            output_dir,
            default_genre,
            podcasts,
            page_size,
        } => {
            cli::commands::config(output_dir, default_genre, podcasts, page_size)?;
        }
        #[cfg(feature = "playback")]
        Commands::Play { target, seek } => {
            cli::commands::play(target, seek).await?;
        }
        Commands::Completion { shell } => {
            cli::commands::completion(shell);
        }
    }

    Ok(())
}
