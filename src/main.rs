mod app;
mod config;
mod error;
mod input;
mod lyrics;
mod player;
mod publish;
mod storage;
mod sync;
mod tui;

use anyhow::Context;
use app::events::Event;
use clap::{Parser, Subcommand};
use config::{BackendKind, Config};
use player::{AnyBackend, ClockBackend, MpvHandle};
use publish::{AnyCatalog, Artifact, Catalog, HttpCatalog};
use std::path::PathBuf;
use storage::{LocalCatalog, SongStatus, StoredSong};
use tokio::sync::mpsc;

#[derive(Debug, Parser)]
#[command(name = "singsync", version, about = "Tap-to-sync karaoke lyric studio")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sync lyrics to a song by tapping along (interactive).
    Sync {
        /// Audio file path or URL.
        #[arg(long)]
        audio: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        artist: String,
        /// Plain lyrics file. Looked up on LRCLIB when omitted.
        #[arg(long)]
        lyrics: Option<PathBuf>,
        /// Cover image path or URL.
        #[arg(long)]
        cover: Option<String>,
        /// Override `sync.backend` from the config.
        #[arg(long, value_enum)]
        backend: Option<BackendKind>,
    },
    /// Publish an already timed LRC file, skipping the tap pass.
    Import {
        file: PathBuf,
        #[arg(long)]
        audio: String,
        /// Defaults to the file's [ti:] tag.
        #[arg(long)]
        title: Option<String>,
        /// Defaults to the file's [ar:] tag.
        #[arg(long)]
        artist: Option<String>,
        #[arg(long)]
        cover: Option<String>,
    },
    /// Write a catalog song as LRC.
    Export {
        id: String,
        /// Write here instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Show how a lyrics file splits into lines and singers.
    Segment {
        file: PathBuf,
        /// Also print each line as written, marker included.
        #[arg(long)]
        raw: bool,
    },
    /// List approved songs in the local catalog.
    Songs {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// List songs waiting for review.
    Pending {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Approve a pending song.
    Approve { id: String },
    /// Reject a pending song.
    Reject { id: String },
    /// Print a catalog song as JSON.
    Show { id: String },

    /// Audio output device management (mpv).
    Audio {
        #[command(subcommand)]
        cmd: AudioCommand,
    },
}

#[derive(Debug, Subcommand)]
enum AudioCommand {
    /// List mpv audio devices.
    List,
    /// Set mpv audio device (name as shown in list).
    Set { device: String },
    /// Clear mpv audio device override.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    let interactive = matches!(cli.command, Command::Sync { .. });
    init_tracing(&cfg, interactive)?;

    match cli.command {
        Command::Sync {
            audio,
            title,
            artist,
            lyrics,
            cover,
            backend,
        } => {
            let raw = match lyrics {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("read {}", path.display()))?,
                None => {
                    let client = lyrics::LrclibClient::new(&cfg.lyrics.lrclib_base_url)?;
                    lyrics::fetch_plain_lyrics(&client, &title, &artist)
                        .await?
                        .with_context(|| {
                            format!("no lyrics found for {title} - {artist}; pass --lyrics")
                        })?
                }
            };
            let queue = lyrics::segment(&raw);
            if queue.is_empty() {
                anyhow::bail!("lyrics contain no lines to sync");
            }

            let (tx, rx) = mpsc::channel::<Event>(256);
            let kind = backend.unwrap_or(cfg.sync.backend);
            let backend = make_backend(&cfg, kind, tx.clone()).await?;

            let info = sync::SongInfo {
                title: title.clone(),
                artist,
                audio,
                cover,
            };
            let session = sync::SyncSession::start(info, queue, backend)
                .await
                .context("start sync session")?;

            let catalog = make_catalog(&cfg)?;
            tracing::info!(catalog = %catalog.describe(), "sync screen starting");

            let published = {
                let mut terminal = tui::TerminalGuard::enter().context("init terminal")?;
                let mut app = app::App::new(session, catalog);
                app.run(terminal.terminal_mut(), tx, rx).await?
            };
            match published {
                Some(id) => println!("Published \"{title}\" as {id} (pending review)."),
                None => println!("Sync discarded."),
            }
        }
        Command::Import {
            file,
            audio,
            title,
            artist,
            cover,
        } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("read {}", file.display()))?;
            let parsed = lyrics::parser::parse_lrc(&content);
            if parsed.lines.is_empty() {
                anyhow::bail!("{} has no timed lines", file.display());
            }
            if parsed.untimed > 0 {
                tracing::warn!(skipped = parsed.untimed, "lines without a timestamp were skipped");
            }
            let artifact = Artifact {
                title: title
                    .or(parsed.title)
                    .context("no title: pass --title or add a [ti:] tag")?,
                artist: artist
                    .or(parsed.artist)
                    .context("no artist: pass --artist or add an [ar:] tag")?,
                audio,
                cover,
                lyrics: parsed.lines,
            };
            let lines = artifact.lyrics.len();
            let catalog = make_catalog(&cfg)?;
            let id = catalog
                .submit(artifact)
                .await
                .with_context(|| format!("publish to {}", catalog.describe()))?;
            println!("Imported {lines} lines as {id} (pending review).");
        }
        Command::Export { id, output } => {
            let song = get_song(&cfg, &id)?;
            let lrc = lyrics::parser::to_lrc(&song.title, &song.artist, &song.lyrics);
            match output {
                Some(path) => {
                    std::fs::write(&path, lrc)
                        .with_context(|| format!("write {}", path.display()))?;
                    println!("Wrote {} lines to {}.", song.lyrics.len(), path.display());
                }
                None => print!("{lrc}"),
            }
        }
        Command::Segment { file, raw } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("read {}", file.display()))?;
            for (i, line) in lyrics::segment(&content).iter().enumerate() {
                println!("{:>3}  {:<4} {}", i + 1, line.singer().label(), line.text());
                if raw {
                    println!("           {}", line.raw());
                }
            }
        }
        Command::Songs { limit } => {
            let songs = local_catalog(&cfg).open()?.list_songs(SongStatus::Approved, limit)?;
            print_songs(&songs);
        }
        Command::Pending { limit } => {
            let songs = local_catalog(&cfg)
                .open()?
                .list_songs(SongStatus::PendingReview, limit)?;
            print_songs(&songs);
        }
        Command::Approve { id } => review(&cfg, &id, SongStatus::Approved)?,
        Command::Reject { id } => review(&cfg, &id, SongStatus::Rejected)?,
        Command::Show { id } => {
            let song = get_song(&cfg, &id)?;
            println!("{}", serde_json::to_string_pretty(&song)?);
        }
        Command::Audio { cmd } => match cmd {
            AudioCommand::List => {
                let out = tokio::process::Command::new("mpv")
                    .args(["--audio-device=help", "--no-video", "--idle=no"])
                    .output()
                    .await
                    .context("run mpv --audio-device=help")?;
                // mpv prints help to stdout.
                print!("{}", String::from_utf8_lossy(&out.stdout));
                eprint!("{}", String::from_utf8_lossy(&out.stderr));
            }
            AudioCommand::Set { device } => {
                let mut cfg = cfg;
                cfg.player.audio_device = Some(device);
                config::save(&cfg, cli.config.as_deref()).context("save config")?;
                println!("Updated audio device in config.");
            }
            AudioCommand::Clear => {
                let mut cfg = cfg;
                cfg.player.audio_device = None;
                config::save(&cfg, cli.config.as_deref()).context("save config")?;
                println!("Cleared audio device override.");
            }
        },
    }

    Ok(())
}

/// The sync screen owns the terminal, so its logs go to a file.
fn init_tracing(cfg: &Config, interactive: bool) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt().with_target(false).with_level(true);
    if interactive {
        let path = cfg.log_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open {}", path.display()))?;
        builder
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
    Ok(())
}

async fn make_backend(
    cfg: &Config,
    kind: BackendKind,
    tx: mpsc::Sender<Event>,
) -> anyhow::Result<AnyBackend> {
    match kind {
        BackendKind::Mpv => {
            let mpv_log = cfg.paths.data_dir.join("mpv.log");
            let handle = MpvHandle::spawn(
                tx,
                cfg.player.audio_device.as_deref(),
                cfg.player.volume,
                Some(&mpv_log),
            )
            .await
            .context("start mpv (try --backend clock)")?;
            Ok(AnyBackend::Mpv(handle))
        }
        BackendKind::Clock => {
            let tick = std::time::Duration::from_millis(cfg.sync.tick_ms);
            Ok(AnyBackend::Clock(ClockBackend::new(tx, tick)))
        }
    }
}

fn make_catalog(cfg: &Config) -> anyhow::Result<AnyCatalog> {
    match cfg.catalog.endpoint.as_deref() {
        Some(endpoint) => Ok(AnyCatalog::Remote(HttpCatalog::new(
            endpoint,
            cfg.catalog.token.clone(),
        )?)),
        None => Ok(AnyCatalog::Local(local_catalog(cfg))),
    }
}

fn local_catalog(cfg: &Config) -> LocalCatalog {
    LocalCatalog::new(&cfg.paths.data_dir)
}

fn get_song(cfg: &Config, id: &str) -> anyhow::Result<StoredSong> {
    local_catalog(cfg)
        .open()?
        .get_song(id)?
        .with_context(|| format!("no song {id}"))
}

fn review(cfg: &Config, id: &str, status: SongStatus) -> anyhow::Result<()> {
    let db = local_catalog(cfg).open()?;
    if !db.review(id, status, storage::now_unix())? {
        anyhow::bail!("no pending song {id}");
    }
    tracing::info!(%id, status = status.as_str(), "song reviewed");
    println!("{id}: {}", status.as_str());
    Ok(())
}

fn print_songs(songs: &[StoredSong]) {
    if songs.is_empty() {
        println!("No songs.");
        return;
    }
    for s in songs {
        println!(
            "{}  {} - {}  ({} lines)",
            s.id,
            s.title,
            s.artist,
            s.lyrics.len()
        );
    }
}
