//! CLI command handlers

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::generate;
use colored::Colorize;
use dialoguer::MultiSelect;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{AuthManager, DownloadArgs};
use crate::config::AppConfig;
use crate::download::{ensure_dir, BatchDownloader, BatchEvent, BatchSummary, DirState, Fetcher, TrackDownloader};
use crate::library::{count_steps, plan, LibraryTree, Node, NodeId, Step, TrackRecord};
use crate::service::{AccountService, SubsonicClient};
use crate::utils::format_filename;

const PROGRESS_TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Handle the `auth` command
pub async fn auth(
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    force: bool,
) -> Result<()> {
    println!("{}", "Configuring Subsonic credentials...".cyan());

    let creds = AuthManager::authenticate(url, username, password, force).await?;

    println!();
    println!("{}", "Authentication successful!".green().bold());
    println!("  Server: {}", creds.url);
    println!("  User: {}", creds.username);
    println!();
    println!("Credentials stored securely in system keyring.");

    Ok(())
}

/// Handle the `library` command
pub async fn library(json: bool, podcasts: bool) -> Result<()> {
    let config = AppConfig::load()?;
    let (_, tracks) = fetch_library(&config, podcasts).await?;

    if json {
        for track in LibraryTree::build(tracks).tracks() {
            println!("{}", track.to_payload()?);
        }
        return Ok(());
    }

    let tree = LibraryTree::build(tracks);
    if tree.is_empty() {
        println!("{}", "The library is empty.".yellow());
        return Ok(());
    }

    for (depth, id) in tree.walk() {
        let indent = "  ".repeat(depth);
        match tree.node(id) {
            Some(node @ Node::Artist { .. }) => println!("{}{}", indent, node.label().green().bold()),
            Some(node @ Node::Album { .. }) => println!("{}{}", indent, node.label().cyan()),
            Some(Node::Track(track)) => println!(
                "{}{} {}",
                indent,
                track.title(),
                format!("[{}]", track.any_id().unwrap_or("no id")).dimmed()
            ),
            None => {}
        }
    }

    Ok(())
}

/// Handle the `download` command
pub async fn download(args: DownloadArgs) -> Result<()> {
    let config = AppConfig::load()?;
    let base = args
        .dir
        .clone()
        .or_else(|| config.output_dir.clone())
        .context("No download directory given and no output_dir configured")?;

    let (client, steps) = match &args.payload {
        Some(file) => {
            let contents = tokio::fs::read_to_string(file)
                .await
                .with_context(|| format!("Failed to read payload file {}", file.display()))?;
            let records = read_payloads(&contents)?;
            let creds = AuthManager::require()?;
            (creds.client(config.page_size)?, payload_plan(records, &base))
        }
        None => {
            let (client, tracks) = fetch_library(&config, args.podcasts).await?;
            let tree = LibraryTree::build(tracks);

            let selection = if args.interactive {
                pick_interactively(&tree)?
            } else {
                named_selection(&tree, &args)
            };

            if selection.is_empty() {
                println!("{}", "Nothing selected.".yellow());
                println!(
                    "Use {} or {} to choose what to download.",
                    "--artist/--album/--track/--all".cyan(),
                    "--interactive".cyan()
                );
                return Ok(());
            }

            debug!("Selection covers {} steps", count_steps(&tree, &selection));
            (client, plan(&tree, &selection, &base))
        }
    };

    if args.dry_run {
        print_plan(&steps);
        return Ok(());
    }

    prepare_base(&base).await?;

    let downloader = TrackDownloader::new(Arc::new(client), Fetcher::new()?, config.tags.clone());
    let batch = Arc::new(BatchDownloader::new(downloader));

    let cancel = CancellationToken::new();
    let ctrl_c = cancel_on_ctrl_c(cancel.clone());

    let (tx, rx) = mpsc::channel(64);
    let handle = batch.spawn(steps, tx, cancel);
    show_progress(rx).await;
    ctrl_c.abort();

    let summary = match handle.await.context("Download task failed")? {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Download aborted: {:#}", e);
            return Err(e);
        }
    };

    println!();
    if summary.cancelled {
        println!("{}", "Download cancelled.".yellow().bold());
    } else {
        println!("{}", "Download complete!".green().bold());
    }
    println!("  Directories created: {}", summary.directories_created);
    println!("  Tracks written: {}", summary.tracks_written);
    if summary.tracks_skipped > 0 {
        println!("  Tracks skipped: {}", summary.tracks_skipped.to_string().yellow());
    }
    println!("  Total size: {:.1} MB", summary.bytes_written as f64 / 1_048_576.0);

    Ok(())
}

/// Handle the `config` command
pub fn config(
    output_dir: Option<PathBuf>,
    default_genre: Option<String>,
    podcasts: Option<bool>,
    page_size: Option<u32>,
) -> Result<()> {
    let mut config = AppConfig::load()?;
    let changed = output_dir.is_some() || default_genre.is_some() || podcasts.is_some() || page_size.is_some();

    if let Some(dir) = output_dir {
        config.output_dir = Some(dir);
    }
    if let Some(genre) = default_genre {
        config.tags.genre = genre;
    }
    if let Some(podcasts) = podcasts {
        config.include_podcasts = podcasts;
    }
    if let Some(page_size) = page_size {
        config.page_size = page_size.max(1);
    }

    if changed {
        config.save()?;
        println!("{}", "Configuration saved.".green());
    }

    println!("{} {}", "Config file:".bold(), AppConfig::config_path()?.display());
    println!(
        "  Output directory: {}",
        config
            .output_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "(not set)".to_string())
    );
    println!("  Include podcasts: {}", config.include_podcasts);
    println!("  Page size: {}", config.page_size);
    println!("  Default genre: {}", config.tags.genre);
    println!("  Default track number: {}", config.tags.track_number);
    println!("  Default disc number: {}", config.tags.disc_number);

    Ok(())
}

/// Handle the `play` command
#[cfg(feature = "playback")]
pub async fn play(target: String, seek: Option<u64>) -> Result<()> {
    let url = if target.contains("://") || Path::new(&target).exists() {
        target
    } else {
        let config = AppConfig::load()?;
        let client = AuthManager::require()?.client(config.page_size)?;
        client.stream_url(&target).await?
    };

    let cancel = CancellationToken::new();
    let ctrl_c = cancel_on_ctrl_c(cancel.clone());
    let result = tokio::task::spawn_blocking(move || play_blocking(&url, seek, &cancel))
        .await
        .context("Playback task failed")?;
    ctrl_c.abort();
    result
}

#[cfg(feature = "playback")]
fn play_blocking(url: &str, seek: Option<u64>, cancel: &CancellationToken) -> Result<()> {
    use crate::player::{DefaultPlayer, Player, RodioEngine};
    use std::time::Duration;

    let mut player = DefaultPlayer::new(RodioEngine::new()?);
    player.load_url(url);
    if !player.play() {
        anyhow::bail!("Could not start playback");
    }

    if let Some(secs) = seek {
        if !player.set_position(Duration::from_secs(secs)) {
            warn!("Could not seek to {}s", secs);
        }
    }

    let bar = progress_bar(player.duration().as_secs());
    bar.set_message("seconds");
    while player.is_playing() && !cancel.is_cancelled() {
        bar.set_position(player.position().as_secs());
        std::thread::sleep(Duration::from_millis(250));
    }

    player.stop();
    bar.finish_and_clear();
    Ok(())
}

/// Handle the `completion` command
pub fn completion(shell: clap_complete::Shell) {
    let mut cmd = super::Cli::command();
    generate(shell, &mut cmd, "tunedl", &mut io::stdout());
}

/// Log in with stored credentials and list songs (and episodes, if wanted)
async fn fetch_library(config: &AppConfig, podcasts: bool) -> Result<(SubsonicClient, Vec<TrackRecord>)> {
    let client = AuthManager::require()?.client(config.page_size)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message("Loading library...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let mut tracks = client.list_songs().await?;
    if podcasts || config.include_podcasts {
        spinner.set_message("Loading podcasts...");
        tracks.extend(client.list_podcast_episodes().await?);
    }

    spinner.finish_and_clear();
    debug!("Library has {} tracks", tracks.len());
    Ok((client, tracks))
}

/// Nodes picked by `--all`, `--artist`, `--album` and `--track`
fn named_selection(tree: &LibraryTree, args: &DownloadArgs) -> Vec<NodeId> {
    if args.all {
        return tree.roots().to_vec();
    }

    let mut selection = Vec::new();
    let lookups = args
        .artists
        .iter()
        .map(|name| (name, tree.find_artists(name)))
        .chain(args.albums.iter().map(|name| (name, tree.find_albums(name))))
        .chain(args.tracks.iter().map(|id| (id, tree.find_tracks(id))));

    for (name, found) in lookups {
        if found.is_empty() {
            warn!("Nothing in the library matches '{}'", name);
        }
        selection.extend(found);
    }
    selection
}

fn pick_interactively(tree: &LibraryTree) -> Result<Vec<NodeId>> {
    let entries = tree.walk();
    let items: Vec<String> = entries
        .iter()
        .map(|&(depth, id)| {
            let label = tree.node(id).map(Node::label).unwrap_or_default();
            format!("{}{}", "  ".repeat(depth), label)
        })
        .collect();

    let chosen = MultiSelect::new()
        .with_prompt("Select what to download (space to toggle, enter to confirm)")
        .items(&items)
        .interact()
        .context("Failed to read selection")?;

    Ok(chosen.into_iter().map(|index| entries[index].1).collect())
}

/// Create the download directory itself
///
/// Plans only create directories below the base, and bare tracks are
/// written straight into it.
async fn prepare_base(base: &Path) -> Result<()> {
    let state = ensure_dir(base)
        .await
        .with_context(|| format!("Failed to create download directory {}", base.display()))?;
    if state == DirState::Created {
        debug!("Created download directory {}", base.display());
    }
    Ok(())
}

/// Parse one track payload per non-empty line
fn read_payloads(contents: &str) -> Result<Vec<TrackRecord>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            TrackRecord::from_payload(line.trim())
                .with_context(|| format!("Invalid track payload on line {}", index + 1))
        })
        .collect()
}

/// Payload tracks go straight into the base directory
fn payload_plan(records: Vec<TrackRecord>, base: &Path) -> Vec<Step> {
    records
        .into_iter()
        .map(|record| Step::Track {
            record,
            dir: base.to_path_buf(),
        })
        .collect()
}

fn print_plan(steps: &[Step]) {
    println!("{}", format!("[DRY RUN] Would run {} steps:", steps.len()).yellow());
    for step in steps {
        match step {
            Step::Directory { path, .. } => println!("  Directory: {}", path.display()),
            Step::Track { record, dir } => println!(
                "  Track: {} -> {}",
                record.title(),
                dir.join(format_filename(record)).display()
            ),
        }
    }
}

fn progress_bar(len: u64) -> ProgressBar {
    if !console::user_attended() {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(PROGRESS_TEMPLATE)
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

/// Drive a progress bar from batch events until the batch ends
async fn show_progress(mut rx: mpsc::Receiver<BatchEvent>) -> Option<BatchSummary> {
    let mut bar = ProgressBar::hidden();

    while let Some(event) = rx.recv().await {
        match event {
            BatchEvent::Started { total_steps } => bar = progress_bar(total_steps),
            BatchEvent::Retrieving { label } => bar.set_message(format!("Retrieving {}", label)),
            BatchEvent::DirectoryReady { path, state } => {
                if state == DirState::Existing {
                    bar.suspend(|| println!("  {} {}", "exists".dimmed(), path.display()));
                }
            }
            BatchEvent::TrackWritten { title, .. } => bar.set_message(title),
            BatchEvent::TrackSkipped { title, reason } => {
                bar.suspend(|| println!("  {} {}: {}", "skipped".yellow(), title, reason));
            }
            BatchEvent::StepCompleted { completed, .. } => bar.set_position(completed),
            BatchEvent::Finished(summary) | BatchEvent::Cancelled(summary) => {
                bar.finish_and_clear();
                return Some(summary);
            }
        }
    }

    bar.finish_and_clear();
    None
}

fn cancel_on_ctrl_c(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current step");
            token.cancel();
        }
    })
}
