/// Cadence - headless music player
use anyhow::Context;
use cadence_core::Library;
use cadence_daemon::{
    config::DaemonConfig,
    console::{Console, Signals},
    error::DaemonError,
    library::IndexLibrary,
    platform::{ConfiguredRoute, LogPresenter, LogScrobbler, ProcessWakeLock, SignalSource},
    player::RodioPlayer,
    watcher::LibraryObserver,
};
use cadence_playback::{
    command_channel, random::RANDOM_BATCH_SIZE, Controller, PlaybackEvent, PlaybackService,
    Platform, RandomPool, Session, SourceKind, Timeline,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Cadence headless music player", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Library index file, overriding the configuration
    #[arg(short, long, global = true, env = "CADENCE_LIBRARY")]
    library: Option<PathBuf>,

    /// Queue state file, overriding the configuration
    #[arg(short, long, global = true)]
    state: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "cadence_daemon=info,cadence_playback=info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start playback and read commands from stdin (default)
    Run,
    /// List the tracks in the library index
    Tracks,
    /// Print the effective configuration as TOML
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = DaemonConfig::load(cli.config.as_deref())?;
    if let Some(library) = cli.library {
        config.library.index = library;
    }
    if let Some(state) = cli.state {
        config.state.file = state;
    }
    config.validate()?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config),
        Commands::Tracks => list_tracks(&config),
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn list_tracks(config: &DaemonConfig) -> anyhow::Result<()> {
    let library = IndexLibrary::open(&config.library.index)?;
    for id in library.track_ids()? {
        if let Some(track) = library.lookup(id)? {
            println!(
                "{:>6}  {}  {}  {}",
                track.id,
                track.artist.as_deref().unwrap_or("-"),
                track.album.as_deref().unwrap_or("-"),
                track.title.as_deref().unwrap_or("-"),
            );
        }
    }
    Ok(())
}

fn run(config: DaemonConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Cadence");
    tracing::info!("Library: {}", config.library.index.display());
    tracing::info!("Queue state: {}", config.state.file.display());

    let library = Arc::new(IndexLibrary::open(&config.library.index)?);
    let mut timeline = Timeline::new(library.clone()).with_state_file(&config.state.file);
    if config.library.random_fill {
        timeline = timeline.with_random_fill(RandomPool::new(RANDOM_BATCH_SIZE));
    }

    let (commands, inbox) = command_channel();

    // Dropping the stream silences every sink, so it lives until shutdown
    let mut stream = rodio::OutputStreamBuilder::open_default_stream()
        .map_err(|e| DaemonError::Audio(e.to_string()))?;
    stream.log_on_drop(false);
    let player = RodioPlayer::new(stream.mixer().clone(), commands.clone());
    tracing::info!("Audio output opened");

    let session = Session::new(
        Box::new(player),
        Box::<ProcessWakeLock>::default(),
        Box::new(LogPresenter::new()),
    );

    let route = ConfiguredRoute::new(config.audio.assume_headset, config.audio.external_output);
    let (route_source, route_signal) = SignalSource::new(SourceKind::Route);
    let (call_source, call_signal) = SignalSource::new(SourceKind::Call);
    let (button_source, button_signal) = SignalSource::new(SourceKind::MediaButton);
    let observer = LibraryObserver::new(
        Arc::clone(&library),
        config.library.watch,
        Duration::from_millis(config.library.watch_debounce_ms),
    );
    let library_signal = observer.signal();

    let platform = Platform::new(Box::new(route.clone()))
        .with_scrobbler(Box::new(LogScrobbler))
        .with_source(Box::new(route_source))
        .with_source(Box::new(call_source))
        .with_source(Box::new(button_source))
        .with_source(Box::new(observer));

    let controller = Controller::new(
        config.playback.clone(),
        Box::new(timeline),
        library.clone(),
        session,
        platform,
        commands,
        Instant::now(),
    );
    let service = PlaybackService::spawn(controller, inbox)?;
    let handle = service.handle();

    let events = handle.subscribe();
    let event_log = thread::Builder::new()
        .name("playback-events".to_string())
        .spawn(move || {
            for event in events {
                match event {
                    PlaybackEvent::Initialized => tracing::info!("Ready"),
                    PlaybackEvent::StateChanged {
                        state, position, ..
                    } => tracing::debug!(%state, position, "State changed"),
                    PlaybackEvent::TrackReplaced { offset, .. } => {
                        tracing::debug!(offset, "Track replaced");
                    }
                }
            }
        })
        .context("Failed to spawn event log thread")?;

    let signals = Signals {
        route,
        route_signal,
        call: call_signal,
        media_button: button_signal,
        library: library_signal,
    };
    let console = Console::new(handle, signals, library);
    println!("Type `help` for commands");
    let result = console.run(std::io::stdin().lock());
    // The event log ends once the last bus handle is gone
    drop(console);

    tracing::info!("Shutting down");
    service.shutdown()?;
    if event_log.join().is_err() {
        tracing::warn!("Event log thread panicked");
    }
    drop(stream);

    result
}
