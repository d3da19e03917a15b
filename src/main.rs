//! Captured Mail Viewer - Entry Point

use clap::Parser;
use cmv::controller::{Controller, ControllerEvent};
use cmv::loader::EmlLoader;
use cmv::notifications::{LogSink, NotificationSink, NullSink};
use cmv::render::ArtifactStore;
use cmv::repo::SpoolRepository;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;
use tracing::info;

/// Captured Mail Viewer - headless controller for a locally captured
/// email stream
#[derive(Parser, Debug)]
#[command(name = "cmv")]
#[command(version)]
#[command(about = "Watches a local mail spool and serves a live, selectable message list")]
pub struct Args {
    /// Spool directory to watch (defaults to the configured directory)
    pub spool: Option<PathBuf>,

    /// Scratch directory for rendered HTML artifacts
    #[arg(long)]
    pub scratch: Option<PathBuf>,

    /// Disable new-message notifications
    #[arg(long)]
    pub no_notifications: bool,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn main() -> Result<(), cmv::model::AppError> {
    let args = Args::parse();

    // Load configuration with full precedence chain:
    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = cmv::config::load_config_with_precedence(args.config.clone())?;
        let merged = cmv::config::merge_config(config_file);
        let with_env = cmv::config::apply_env_overrides(merged);

        let notifications_override = if args.no_notifications {
            Some(false)
        } else {
            None
        };
        cmv::config::apply_cli_overrides(
            with_env,
            args.spool.clone(),
            args.scratch.clone(),
            notifications_override,
        )
    };

    cmv::logging::init(&config.log_file_path)?;

    info!(config = ?config, "Configuration loaded and resolved");

    let (tx, rx) = mpsc::channel::<ControllerEvent>();

    let repo = SpoolRepository::new(&config.spool_dir)?;

    // Repository changes and load completions re-marshal onto the
    // controller queue; the watcher must stay alive for the program's
    // lifetime.
    let repo_tx = tx.clone();
    let _watcher = repo.watch(
        Duration::from_millis(config.watch_debounce_ms),
        move |event| {
            let _ = repo_tx.send(ControllerEvent::Repo(event));
        },
    )?;

    let loader_tx = tx.clone();
    let loader = EmlLoader::new(move |finished| {
        let _ = loader_tx.send(ControllerEvent::LoadFinished(finished));
    });

    let artifacts = ArtifactStore::new(&config.scratch_dir);

    let sink: Box<dyn NotificationSink> = if config.notifications {
        Box::new(LogSink)
    } else {
        Box::new(NullSink)
    };

    let mut controller = Controller::new(repo, loader, artifacts, sink)?;
    controller.run(rx);

    Ok(())
}
