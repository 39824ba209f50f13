//! CLI module for tunedl

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub mod auth;
pub mod commands;

pub use auth::AuthManager;

#[derive(Parser, Debug)]
#[command(name = "tunedl", about = "Download and tag music from a Subsonic library")]
#[command(version, author)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Configure Subsonic server credentials
    Auth {
        /// Subsonic server URL
        #[arg(long, env = "SUBSONIC_URL")]
        url: Option<String>,

        /// Username
        #[arg(short, long, env = "SUBSONIC_USER")]
        username: Option<String>,

        /// Password
        #[arg(short, long, env = "SUBSONIC_PASS")]
        password: Option<String>,

        /// Force re-authentication (ignore stored credentials)
        #[arg(long)]
        force: bool,
    },

    /// Show the library as an artist/album/track tree
    Library {
        /// Print one JSON track payload per line instead
        #[arg(long)]
        json: bool,

        /// Include podcast episodes
        #[arg(long)]
        podcasts: bool,
    },

    /// Download and tag a selection of the library
    Download(DownloadArgs),

    /// Show or update configuration
    Config {
        /// Default download directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Genre written when a track has none
        #[arg(long)]
        default_genre: Option<String>,

        /// Include podcast episodes by default
        #[arg(long, value_name = "BOOL")]
        podcasts: Option<bool>,

        /// Songs requested per library page
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Play a track id, stream URL or local file
    #[cfg(feature = "playback")]
    Play {
        /// Track identifier, URL or path
        #[arg(value_name = "URL_OR_TRACK_ID")]
        target: String,

        /// Start position in seconds
        #[arg(long, value_name = "SECS")]
        seek: Option<u64>,
    },

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

/// Selection and destination for `download`
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Base directory (defaults to the configured output directory)
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Select artists by name
    #[arg(long = "artist", value_name = "NAME")]
    pub artists: Vec<String>,

    /// Select albums by name
    #[arg(long = "album", value_name = "NAME")]
    pub albums: Vec<String>,

    /// Select tracks by identifier
    #[arg(long = "track", value_name = "ID")]
    pub tracks: Vec<String>,

    /// Select the whole library
    #[arg(long)]
    pub all: bool,

    /// Pick artists, albums and tracks from a list
    #[arg(short, long)]
    pub interactive: bool,

    /// Download the tracks from a file of JSON payloads instead of the library
    #[arg(long, value_name = "FILE", conflicts_with_all = ["artists", "albums", "tracks", "all", "interactive"])]
    pub payload: Option<PathBuf>,

    /// Include podcast episodes
    #[arg(long)]
    pub podcasts: bool,

    /// Show what would be downloaded without downloading
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_download() {
        let cli = Cli::parse_from([
            "tunedl", "download", "/music", "--artist", "A", "--artist", "B", "--track", "t1", "--dry-run",
        ]);
        match cli.command {
            Commands::Download(args) => {
                assert_eq!(args.dir, Some(PathBuf::from("/music")));
                assert_eq!(args.artists, ["A", "B"]);
                assert_eq!(args.tracks, ["t1"]);
                assert!(args.dry_run);
                assert!(!args.all);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_payload_conflicts_with_selection() {
        let result = Cli::try_parse_from(["tunedl", "download", "--payload", "p.json", "--all"]);
        assert!(result.is_err());
    }
}
