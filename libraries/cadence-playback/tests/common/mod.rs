//! Shared fixtures for controller tests
//!
//! Every platform capability is a recording mock whose log is shared with the
//! test through an `Arc<Mutex<_>>`, so assertions can inspect what the
//! controller did after handing ownership of the mock over.

#![allow(dead_code)]

use cadence_core::{AlbumId, ArtistId, MemoryLibrary, Track, TrackId};
use cadence_playback::{
    command_channel, CommandReceiver, CommandSender, Command, Controller, EventSource,
    Notification, OutputRoute, Platform, PlaybackConfig, PlaybackError, PlaybackEvent,
    PlaybackState, Player, Presenter, Queue, Scrobbler, Session, SourceKind, Timeline, Toast,
    WakeLock,
};
use crossbeam_channel::Receiver;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

pub type Shared<T> = Arc<Mutex<T>>;

fn shared<T: Default>() -> Shared<T> {
    Arc::new(Mutex::new(T::default()))
}

// ===== Library Fixture =====

pub fn track_path(id: i64) -> PathBuf {
    PathBuf::from(format!("/music/{id}.flac"))
}

fn track(id: i64, album: i64, number: u32) -> Track {
    Track::new(TrackId::new(id), track_path(id))
        .with_title(format!("Track {id}"))
        .with_album(AlbumId::new(album), format!("Album {album}"))
        .with_artist(ArtistId::new(1), "Artist")
        .with_track_number(number)
}

/// Album 1: tracks 1, 2, 3. Album 2: tracks 4, 5. Album 3: track 6.
pub fn fixture_tracks() -> Vec<Track> {
    vec![
        track(1, 1, 1),
        track(2, 1, 2),
        track(3, 1, 3),
        track(4, 2, 1),
        track(5, 2, 2),
        track(6, 3, 1),
    ]
}

pub fn id(raw: i64) -> TrackId {
    TrackId::new(raw)
}

// ===== Mock Player =====

#[derive(Debug, Default)]
pub struct PlayerLog {
    pub sources: Vec<PathBuf>,
    pub failing: HashSet<PathBuf>,
    pub playing: bool,
    pub prepared: bool,
    pub volume: Option<f32>,
    pub volumes: Vec<f32>,
    pub starts: usize,
    pub pauses: usize,
    pub stops: usize,
    pub resets: usize,
    pub releases: usize,
    pub seeks: Vec<Duration>,
    pub position: Duration,
    pub duration: Option<Duration>,
}

pub struct MockPlayer {
    log: Shared<PlayerLog>,
}

impl Player for MockPlayer {
    fn reset(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.resets += 1;
        log.prepared = false;
        log.playing = false;
    }

    fn set_source(&mut self, path: &Path) -> cadence_playback::Result<()> {
        let mut log = self.log.lock().unwrap();
        log.sources.push(path.to_path_buf());
        if log.failing.contains(path) {
            return Err(PlaybackError::source(path, "unsupported format"));
        }
        Ok(())
    }

    fn prepare(&mut self) -> cadence_playback::Result<()> {
        let mut log = self.log.lock().unwrap();
        log.prepared = true;
        log.position = Duration::ZERO;
        log.duration = Some(Duration::from_secs(200));
        Ok(())
    }

    fn start(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.starts += 1;
        log.playing = true;
    }

    fn pause(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.pauses += 1;
        log.playing = false;
    }

    fn stop(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.stops += 1;
        log.playing = false;
        log.prepared = false;
    }

    fn seek_to(&mut self, position: Duration) -> cadence_playback::Result<()> {
        let mut log = self.log.lock().unwrap();
        log.seeks.push(position);
        log.position = position;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        let mut log = self.log.lock().unwrap();
        log.volume = Some(volume);
        log.volumes.push(volume);
    }

    fn position(&self) -> Duration {
        self.log.lock().unwrap().position
    }

    fn duration(&self) -> Option<Duration> {
        self.log.lock().unwrap().duration
    }

    fn release(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.releases += 1;
        log.playing = false;
        log.prepared = false;
    }
}

// ===== Mock Presenter =====

#[derive(Debug, Default)]
pub struct PresenterLog {
    pub foreground: bool,
    pub foreground_starts: usize,
    pub notifications: Vec<Notification>,
    pub visible: Option<Notification>,
    pub toasts: Vec<Toast>,
    pub ui_launches: usize,
}

pub struct MockPresenter {
    log: Shared<PresenterLog>,
}

impl Presenter for MockPresenter {
    fn start_foreground(&mut self, notification: Option<&Notification>) {
        let mut log = self.log.lock().unwrap();
        log.foreground = true;
        log.foreground_starts += 1;
        if let Some(notification) = notification {
            log.visible = Some(notification.clone());
        }
    }

    fn stop_foreground(&mut self, remove_notification: bool) {
        let mut log = self.log.lock().unwrap();
        log.foreground = false;
        if remove_notification {
            log.visible = None;
        }
    }

    fn notify(&mut self, notification: &Notification) {
        let mut log = self.log.lock().unwrap();
        log.notifications.push(notification.clone());
        log.visible = Some(notification.clone());
    }

    fn toast(&mut self, toast: Toast) {
        self.log.lock().unwrap().toasts.push(toast);
    }

    fn launch_ui(&mut self) {
        self.log.lock().unwrap().ui_launches += 1;
    }
}

// ===== Mock Wake Lock =====

#[derive(Debug, Default)]
pub struct WakeLog {
    pub held: bool,
    pub acquisitions: usize,
}

pub struct MockWakeLock {
    log: Shared<WakeLog>,
}

impl WakeLock for MockWakeLock {
    fn acquire(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.held = true;
        log.acquisitions += 1;
    }

    fn release(&mut self) {
        self.log.lock().unwrap().held = false;
    }

    fn is_held(&self) -> bool {
        self.log.lock().unwrap().held
    }
}

// ===== Mock Route =====

#[derive(Debug, Default)]
pub struct RouteLog {
    pub plugged: bool,
    pub speaker_on: bool,
}

pub struct MockRoute {
    log: Shared<RouteLog>,
}

impl OutputRoute for MockRoute {
    fn is_plugged(&self) -> bool {
        self.log.lock().unwrap().plugged
    }

    fn is_speaker_on(&self) -> bool {
        self.log.lock().unwrap().speaker_on
    }
}

// ===== Mock Scrobbler =====

#[derive(Debug, Default)]
pub struct ScrobbleLog {
    pub submissions: Vec<(bool, Option<TrackId>)>,
}

pub struct MockScrobbler {
    log: Shared<ScrobbleLog>,
}

impl Scrobbler for MockScrobbler {
    fn submit(&mut self, playing: bool, track: Option<&Track>) {
        self.log
            .lock()
            .unwrap()
            .submissions
            .push((playing, track.map(|t| t.id)));
    }
}

// ===== Mock Event Sources =====

#[derive(Debug, Default)]
pub struct SourceLog {
    pub attached: HashSet<SourceKind>,
    pub attaches: HashMap<SourceKind, usize>,
    pub detaches: HashMap<SourceKind, usize>,
    pub failing: HashSet<SourceKind>,
    pub senders: HashMap<SourceKind, CommandSender>,
}

impl SourceLog {
    pub fn is_attached(&self, kind: SourceKind) -> bool {
        self.attached.contains(&kind)
    }

    pub fn attach_count(&self, kind: SourceKind) -> usize {
        self.attaches.get(&kind).copied().unwrap_or(0)
    }
}

pub struct MockSource {
    kind: SourceKind,
    log: Shared<SourceLog>,
}

impl EventSource for MockSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn attach(&mut self, commands: CommandSender) -> cadence_playback::Result<()> {
        let mut log = self.log.lock().unwrap();
        *log.attaches.entry(self.kind).or_default() += 1;
        if log.failing.contains(&self.kind) {
            return Err(PlaybackError::registration(
                format!("{:?}", self.kind),
                "permission denied",
            ));
        }
        log.attached.insert(self.kind);
        log.senders.insert(self.kind, commands);
        Ok(())
    }

    fn detach(&mut self) -> cadence_playback::Result<()> {
        let mut log = self.log.lock().unwrap();
        *log.detaches.entry(self.kind).or_default() += 1;
        log.attached.remove(&self.kind);
        log.senders.remove(&self.kind);
        Ok(())
    }
}

// ===== Harness =====

/// Builder for a controller wired to recording mocks
pub struct HarnessBuilder {
    config: PlaybackConfig,
    tracks: Vec<Track>,
    queue: Option<Box<dyn FnOnce(Arc<MemoryLibrary>) -> Box<dyn Queue>>>,
    failing: Vec<i64>,
    plugged: bool,
    speaker_on: bool,
    scrobbler: bool,
    failing_sources: Vec<SourceKind>,
    create_delay: Duration,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            config: PlaybackConfig::default(),
            tracks: fixture_tracks(),
            queue: None,
            failing: Vec::new(),
            plugged: false,
            speaker_on: false,
            scrobbler: false,
            failing_sources: Vec::new(),
            create_delay: Duration::ZERO,
        }
    }

    pub fn config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }

    pub fn tracks(mut self, tracks: Vec<Track>) -> Self {
        self.tracks = tracks;
        self
    }

    pub fn queue(mut self, make: impl FnOnce(Arc<MemoryLibrary>) -> Box<dyn Queue> + 'static) -> Self {
        self.queue = Some(Box::new(make));
        self
    }

    pub fn failing(mut self, ids: &[i64]) -> Self {
        self.failing.extend_from_slice(ids);
        self
    }

    pub fn plugged(mut self, plugged: bool) -> Self {
        self.plugged = plugged;
        self
    }

    pub fn speaker_on(mut self, on: bool) -> Self {
        self.speaker_on = on;
        self
    }

    pub fn scrobbler(mut self) -> Self {
        self.scrobbler = true;
        self
    }

    pub fn failing_source(mut self, kind: SourceKind) -> Self {
        self.failing_sources.push(kind);
        self
    }

    /// Delay the deferred create so commands can arrive before it
    pub fn create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    /// Build without running any deferred work
    pub fn build(self) -> Harness {
        let library = Arc::new(MemoryLibrary::new(self.tracks));
        let queue = match self.queue {
            Some(make) => make(Arc::clone(&library)),
            None => Box::new(Timeline::new(library.clone())),
        };

        let player = shared::<PlayerLog>();
        player.lock().unwrap().failing = self.failing.iter().map(|&i| track_path(i)).collect();
        let presenter = shared::<PresenterLog>();
        let wake = shared::<WakeLog>();
        let route = shared::<RouteLog>();
        {
            let mut route = route.lock().unwrap();
            route.plugged = self.plugged;
            route.speaker_on = self.speaker_on;
        }
        let scrobbles = shared::<ScrobbleLog>();
        let sources = shared::<SourceLog>();
        sources.lock().unwrap().failing = self.failing_sources.into_iter().collect();

        let session = Session::new(
            Box::new(MockPlayer {
                log: Arc::clone(&player),
            }),
            Box::new(MockWakeLock {
                log: Arc::clone(&wake),
            }),
            Box::new(MockPresenter {
                log: Arc::clone(&presenter),
            }),
        );

        let mut platform = Platform::new(Box::new(MockRoute {
            log: Arc::clone(&route),
        }));
        for kind in [
            SourceKind::Route,
            SourceKind::Call,
            SourceKind::MediaButton,
            SourceKind::Library,
        ] {
            platform = platform.with_source(Box::new(MockSource {
                kind,
                log: Arc::clone(&sources),
            }));
        }
        if self.scrobbler {
            platform = platform.with_scrobbler(Box::new(MockScrobbler {
                log: Arc::clone(&scrobbles),
            }));
        }

        let (commands, inbox) = command_channel();
        let start = Instant::now();
        let controller = Controller::new(
            self.config,
            queue,
            library.clone(),
            session,
            platform,
            commands,
            start + self.create_delay,
        );
        let events = controller.events().subscribe();

        Harness {
            controller,
            inbox,
            events,
            library,
            player,
            presenter,
            wake,
            route,
            scrobbles,
            sources,
            start,
            now: start,
        }
    }

    /// Build and run the deferred create
    pub fn start(self) -> Harness {
        let mut harness = self.build();
        let now = harness.now + harness.controller_create_offset();
        harness.advance_to(now);
        harness
    }
}

pub struct Harness {
    pub controller: Controller,
    pub inbox: CommandReceiver,
    pub events: Receiver<PlaybackEvent>,
    pub library: Arc<MemoryLibrary>,
    pub player: Shared<PlayerLog>,
    pub presenter: Shared<PresenterLog>,
    pub wake: Shared<WakeLog>,
    pub route: Shared<RouteLog>,
    pub scrobbles: Shared<ScrobbleLog>,
    pub sources: Shared<SourceLog>,
    pub start: Instant,
    pub now: Instant,
}

impl Harness {
    fn controller_create_offset(&mut self) -> Duration {
        self.controller
            .next_deadline()
            .map_or(Duration::ZERO, |at| at.saturating_duration_since(self.now))
    }

    /// Process a command at the current time
    pub fn send(&mut self, command: Command) {
        self.controller.handle(command, self.now);
    }

    /// Let `by` pass, running every timer due in between
    pub fn advance(&mut self, by: Duration) {
        let now = self.now + by;
        self.advance_to(now);
    }

    pub fn advance_to(&mut self, now: Instant) {
        self.now = now;
        self.controller.run_due(now);
    }

    pub fn advance_ms(&mut self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn state(&self) -> PlaybackState {
        self.controller.state()
    }

    pub fn is_playing(&self) -> bool {
        self.state().is_playing()
    }

    pub fn current(&self) -> Option<TrackId> {
        self.controller
            .snapshot()
            .read()
            .unwrap()
            .track
            .as_ref()
            .map(|t| t.id)
    }

    pub fn drain_events(&self) -> Vec<PlaybackEvent> {
        self.events.try_iter().collect()
    }

    pub fn state_changes(&self) -> Vec<PlaybackEvent> {
        self.drain_events()
            .into_iter()
            .filter(|e| matches!(e, PlaybackEvent::StateChanged { .. }))
            .collect()
    }

    pub fn player(&self) -> MutexGuard<'_, PlayerLog> {
        self.player.lock().unwrap()
    }

    pub fn presenter(&self) -> MutexGuard<'_, PresenterLog> {
        self.presenter.lock().unwrap()
    }

    pub fn sources(&self) -> MutexGuard<'_, SourceLog> {
        self.sources.lock().unwrap()
    }

    /// Source ids passed to the player, oldest first
    pub fn loaded(&self) -> Vec<PathBuf> {
        self.player().sources.clone()
    }

    pub fn player_volume(&self) -> Option<f32> {
        self.player().volume
    }

    /// Play album `album` and discard the events it produced
    pub fn play_album(&mut self, album: i64) {
        self.send(Command::PlayItems {
            kind: cadence_core::ItemKind::Album,
            id: album,
        });
        self.drain_events();
    }
}
