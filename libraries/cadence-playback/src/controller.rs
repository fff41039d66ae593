//! Playback controller
//!
//! The controller is a single-threaded command processor. It owns the
//! authoritative [`PlaybackState`], drives the [`Queue`] and [`Session`],
//! runs the timers and fans out change notifications.
//!
//! ## Commit point
//!
//! Every state change goes through `update_state`, which:
//! 1. canonicalizes the requested flags against the invariants
//! 2. broadcasts if the flags or the current track changed
//! 3. runs side effects once per flag edge
//!
//! ## Time
//!
//! Entry points take the current [`Instant`]. Deferred tasks run with the
//! clock set to their scheduled fire time, so follow-up timers keep their
//! cadence no matter how late the caller polls.

use cadence_core::{ItemKind, Library, Track, TrackId};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::command::{CallState, Command, CommandSender};
use crate::config::{ConfigChange, NotificationMode, PlaybackConfig};
use crate::events::{EventBus, PlaybackEvent};
use crate::platform::{EventSource, Notification, OutputRoute, Platform, Scrobbler, SourceKind, Toast};
use crate::queue::{ChooseMode, Queue, QueueRestore};
use crate::scheduler::{DebounceKey, Scheduler, TimerKind, DEBOUNCE_WINDOW, FADE_TICK, SAVE_DELAY};
use crate::session::{PlayerProbe, Session};
use crate::state::{PlaybackState, Snapshot};
use crate::volume::{Volume, FADE_STEPS};

/// Snapshot shared with reader threads
pub type SharedSnapshot = Arc<RwLock<Snapshot>>;

/// Work deferred through the scheduler
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Deferred {
    Create,
    PostCreate,
    Go { delta: i32, autoplay: bool },
    IdleTimeout,
    FadeTick(u8),
    Maintenance,
    SaveState,
}

const PLAYING: PlaybackState = PlaybackState::PLAYING;
const NO_MEDIA: PlaybackState = PlaybackState::NO_MEDIA;
const SHUFFLE: PlaybackState = PlaybackState::SHUFFLE;
const REPEAT: PlaybackState = PlaybackState::REPEAT;

/// The background playback controller
pub struct Controller {
    config: PlaybackConfig,
    state: PlaybackState,
    queue: Box<dyn Queue>,
    library: Arc<dyn Library>,
    session: Session,
    route: Box<dyn OutputRoute>,
    scrobbler: Option<Box<dyn Scrobbler>>,
    sources: Vec<Box<dyn EventSource>>,
    attached: HashSet<SourceKind>,
    commands: CommandSender,
    scheduler: Scheduler<Deferred>,
    events: EventBus,
    snapshot: SharedSnapshot,
    volume: Volume,
    clock: Instant,
    last_broadcast: Option<TrackId>,
    force_notify: bool,
    plugged: bool,
    playing_before_call: bool,
    pending_go: Option<(i32, bool)>,
    initialized: bool,
    shut_down: bool,
}

impl Controller {
    /// Build a controller. Nothing is acquired until the deferred create runs
    /// on the first [`Controller::run_due`] at or after `now`.
    pub fn new(
        config: PlaybackConfig,
        queue: Box<dyn Queue>,
        library: Arc<dyn Library>,
        session: Session,
        platform: Platform,
        commands: CommandSender,
        now: Instant,
    ) -> Self {
        let Platform {
            route,
            scrobbler,
            sources,
        } = platform;

        let mut scheduler = Scheduler::new();
        scheduler.schedule(TimerKind::Create, now, Deferred::Create);

        let state = NO_MEDIA;
        let snapshot = Arc::new(RwLock::new(Snapshot {
            state,
            ..Snapshot::default()
        }));

        Self {
            volume: Volume::new(config.volume()),
            plugged: route.is_plugged(),
            config,
            state,
            queue,
            library,
            session,
            route,
            scrobbler,
            sources,
            attached: HashSet::new(),
            commands,
            scheduler,
            events: EventBus::new(),
            snapshot,
            clock: now,
            last_broadcast: None,
            force_notify: false,
            playing_before_call: false,
            pending_go: None,
            initialized: false,
            shut_down: false,
        }
    }

    // ===== Accessors =====

    /// Committed flags
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Shared snapshot for reader threads
    pub fn snapshot(&self) -> SharedSnapshot {
        Arc::clone(&self.snapshot)
    }

    /// Event fan-out
    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    /// Position/duration reader
    pub fn probe(&self) -> PlayerProbe {
        self.session.probe()
    }

    /// Sender that posts into this controller's queue
    pub fn command_sender(&self) -> CommandSender {
        self.commands.clone()
    }

    /// Current preferences
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Volume applied to the player right now
    pub fn current_volume(&self) -> f32 {
        self.volume.current()
    }

    /// Whether a track command is waiting for initialization
    pub fn has_pending_go(&self) -> bool {
        self.pending_go.is_some()
    }

    /// Whether create has run
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether shutdown has run; no further commands are processed
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Whether a timer of `kind` is pending
    pub fn is_timer_pending(&self, kind: TimerKind) -> bool {
        self.scheduler.is_pending(kind)
    }

    /// Fire time of the earliest pending timer
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    // ===== Command processing =====

    /// Run every deferred task due at or before `now`, in fire-time order
    pub fn run_due(&mut self, now: Instant) {
        while !self.shut_down {
            let Some((at, kind, task)) = self.scheduler.pop_due(now) else {
                break;
            };
            self.clock = at;
            debug!(?kind, "timer fired");
            self.run_deferred(task);
        }
        self.clock = now;
    }

    /// Process one command to completion
    pub fn handle(&mut self, command: Command, now: Instant) {
        self.run_due(now);
        if self.shut_down {
            debug!(?command, "ignoring command after shutdown");
            return;
        }
        self.clock = now;

        match command {
            Command::TogglePlayback => self.advance(0, false),
            Command::TogglePlaybackDelayed => self.debounce(DebounceKey::Toggle, 0),
            Command::Next => {
                if self.initialized {
                    let upcoming = self.queue.get(1);
                    self.events.emit(&PlaybackEvent::TrackReplaced {
                        offset: 0,
                        track: upcoming,
                    });
                }
                self.advance(1, false);
            }
            Command::NextDelayed => self.debounce(DebounceKey::Next, 1),
            Command::NextAutoplay => self.advance(1, true),
            Command::Previous => self.advance(-1, false),
            Command::PreviousAutoplay => self.advance(-1, true),
            Command::PlayItems { kind, id } => self.play_items(kind, id),
            Command::EnqueueItems { kind, id } => self.enqueue_items(kind, id),
            Command::FinishEnqueueing => self.queue.finish_enqueueing(),
            Command::Remove(id) => self.remove_current_or_queued(id),
            Command::SetFlag(flag) => self.set_flag(flag),
            Command::ClearFlag(flag) => self.clear_flag(flag),
            Command::ToggleFlag(flag) => self.toggle_flag(flag),
            Command::SeekToProgress(per_mille) => {
                if let Err(e) = self.session.seek_to_progress(per_mille) {
                    warn!(per_mille, error = %e, "seek failed");
                }
            }
            Command::RouteChanged { plugged } => self.route_changed(plugged),
            Command::CallStateChanged(call) => self.call_state_changed(call),
            Command::LibraryChanged => self.library_changed(),
            Command::TrackCompleted => self.track_completed(),
            Command::DecoderError { what, extra } => self.decoder_error(what, extra),
            Command::UpdateConfig(change) => self.update_config(change),
            Command::Shutdown => self.shutdown(),
        }
    }

    fn run_deferred(&mut self, task: Deferred) {
        match task {
            Deferred::Create => self.create(),
            Deferred::PostCreate => self.post_create(),
            Deferred::Go { delta, autoplay } => self.advance(delta, autoplay),
            Deferred::IdleTimeout => {
                if self.state.is_playing() {
                    info!("idle timeout reached, fading out");
                    self.scheduler
                        .schedule(TimerKind::FadeOut, self.clock, Deferred::FadeTick(FADE_STEPS));
                }
            }
            Deferred::FadeTick(progress) => self.fade_tick(progress),
            Deferred::Maintenance => {
                // Prefetch so a random fill or lookup happens ahead of the skip
                let _ = self.queue.get(1);
                self.queue.purge();
                self.save_state(self.session.position());
            }
            Deferred::SaveState => self.save_state(self.session.position()),
        }
    }

    // ===== Public contract =====

    /// Request `flag` to be set
    pub fn set_flag(&mut self, flag: PlaybackState) {
        self.update_state(self.state | flag);
    }

    /// Request `flag` to be cleared
    pub fn clear_flag(&mut self, flag: PlaybackState) {
        self.update_state(self.state.without(flag));
    }

    /// Request the opposite of `flag`'s current value
    pub fn toggle_flag(&mut self, flag: PlaybackState) {
        if self.state.contains(flag) {
            self.clear_flag(flag);
        } else {
            self.set_flag(flag);
        }
    }

    /// Move the cursor by `delta` and load the track there.
    ///
    /// `delta == 0` toggles playback instead of reloading, or forces playback
    /// on when `autoplay` is set.
    pub fn advance(&mut self, delta: i32, autoplay: bool) {
        if !self.initialized {
            self.session.presenter().toast(Toast::Starting);
            self.pending_go = Some((delta, autoplay));
            return;
        }

        if delta == 0 {
            if autoplay {
                self.set_flag(PLAYING);
            } else {
                self.toggle_flag(PLAYING);
            }
            return;
        }

        self.load_track(delta, autoplay, true);
    }

    /// Remove `id` from the queue, reloading if it was the current track
    pub fn remove_current_or_queued(&mut self, id: TrackId) {
        if self.queue.remove(id) {
            debug!(track_id = %id, "removed current track");
            self.load_track(0, false, false);
        } else {
            let track = self.queue.get(0);
            self.publish_snapshot(track);
        }
    }

    // ===== Lifecycle =====

    fn create(&mut self) {
        self.session.create();

        let restore = self.queue.load_state().unwrap_or_else(|e| {
            warn!(error = %e, "failed to restore queue state");
            QueueRestore::default()
        });
        // Flags come from the queue itself, so no toggle side effects
        self.state.set(SHUFFLE, restore.shuffle);
        self.state.set(REPEAT, restore.repeat);

        self.session.set_volume(self.volume.current());
        self.initialized = true;

        self.load_track(0, false, false);
        if !restore.position.is_zero() && self.session.is_prepared() {
            if let Err(e) = self.session.seek(restore.position) {
                warn!(position_ms = restore.position.as_millis() as u64, error = %e, "pending seek failed");
            }
        }

        info!(state = %self.state, "playback controller initialized");
        self.events.emit(&PlaybackEvent::Initialized);
        self.scheduler
            .schedule(TimerKind::PostCreate, self.clock, Deferred::PostCreate);

        if let Some((delta, autoplay)) = self.pending_go.take() {
            debug!(delta, autoplay, "replaying command issued before initialization");
            self.advance(delta, autoplay);
        }
    }

    fn post_create(&mut self) {
        self.attach_source(SourceKind::Route);
        self.attach_source(SourceKind::Call);
        if self.config.media_buttons {
            self.attach_source(SourceKind::MediaButton);
        }
    }

    fn shutdown(&mut self) {
        info!("shutting down playback controller");
        if self.initialized {
            self.save_state(self.session.position());
        }
        self.clear_flag(PLAYING);
        self.scheduler.clear();
        self.pending_go = None;
        self.session.release();

        for kind in [
            SourceKind::Route,
            SourceKind::Call,
            SourceKind::MediaButton,
            SourceKind::Library,
        ] {
            self.detach_source(kind);
        }

        self.shut_down = true;
        self.publish_snapshot(None);
    }

    // ===== Track loading =====

    fn load_track(&mut self, delta: i32, autoplay: bool, user_action: bool) {
        let mut requested = self.state;
        if autoplay {
            requested.insert(PLAYING);
        }
        self.load_track_with(delta, requested, user_action, true);
    }

    fn load_track_with(
        &mut self,
        delta: i32,
        requested: PlaybackState,
        user_action: bool,
        may_retry: bool,
    ) {
        if !self.session.is_created() {
            return;
        }

        self.session.stop();

        let Some(track) = self.queue.shift_current(delta) else {
            debug!(delta, "queue exhausted");
            self.update_state(requested | NO_MEDIA);
            return;
        };

        let requested = requested.without(NO_MEDIA);
        match self.session.load(&track) {
            Ok(()) => {
                if self.state.is_playing() && requested.is_playing() {
                    self.session.start();
                }
                self.force_notify = true;
                self.update_state(requested);
            }
            Err(e) => {
                warn!(track_id = %track.id, error = %e, "failed to load track");
                if may_retry {
                    self.recover_from_load_failure(&track, requested, user_action);
                    return;
                }
                // Nothing is prepared, so nothing could ever complete
                self.update_state(requested | NO_MEDIA);
            }
        }

        if user_action {
            self.user_action_triggered();
        }
        self.scheduler.schedule(
            TimerKind::Maintenance,
            self.clock + SAVE_DELAY,
            Deferred::Maintenance,
        );
    }

    /// One retry on the following track, never on the item that just failed
    fn recover_from_load_failure(
        &mut self,
        failed: &Track,
        requested: PlaybackState,
        user_action: bool,
    ) {
        match self.queue.get(1) {
            Some(mut next) if !next.same_track(failed) => {
                match next.query(self.library.as_ref(), true) {
                    Ok(true) => {
                        info!(failed = %failed.id, next = %next.id, "retrying with following track");
                        self.load_track_with(1, requested, user_action, false);
                    }
                    Ok(false) => {
                        debug!("following track vanished from library");
                        self.update_state(requested | NO_MEDIA);
                    }
                    Err(e) => {
                        warn!(error = %e, "lookup of following track failed");
                        self.update_state(requested | NO_MEDIA);
                    }
                }
            }
            _ => self.update_state(requested | NO_MEDIA),
        }
    }

    fn track_completed(&mut self) {
        debug!("track completed");
        self.session.acquire_wake_lock();
        self.load_track(1, true, false);
        self.session.release_wake_lock();
    }

    fn decoder_error(&mut self, what: i32, extra: i32) {
        let track_id = self.queue.get(0).map_or(TrackId::NONE, |t| t.id);
        error!(%track_id, what, extra, "decoder error");
        self.session.reset();

        let next = self.queue.get(1);
        let playable = match next {
            Some(mut next) => match next.query(self.library.as_ref(), true) {
                Ok(found) => found,
                Err(e) => {
                    warn!(error = %e, "lookup of following track failed");
                    false
                }
            },
            None => false,
        };

        if playable {
            self.track_completed();
        } else {
            self.set_flag(NO_MEDIA);
        }
    }

    fn play_items(&mut self, kind: ItemKind, id: i64) {
        match self.queue.choose_items(ChooseMode::Play, kind, id) {
            Ok(chosen) => match chosen.first_offset {
                Some(offset) => self.load_track(offset, true, true),
                None => debug!(%kind, id, "no items to play"),
            },
            Err(e) => warn!(%kind, id, error = %e, "failed to choose items"),
        }
    }

    fn enqueue_items(&mut self, kind: ItemKind, id: i64) {
        match self.queue.choose_items(ChooseMode::Enqueue, kind, id) {
            Ok(chosen) => {
                self.scheduler
                    .schedule(TimerKind::SaveState, self.clock + SAVE_DELAY, Deferred::SaveState);
                if chosen.added > 0 && self.state.contains(NO_MEDIA) {
                    self.load_track(0, false, false);
                } else {
                    let track = self.queue.get(0);
                    self.publish_snapshot(track);
                }
            }
            Err(e) => warn!(%kind, id, error = %e, "failed to enqueue items"),
        }
    }

    fn save_state(&mut self, position: Duration) {
        if let Err(e) = self.queue.save_state(position) {
            warn!(error = %e, "failed to save queue state");
        }
    }

    // ===== Commit point =====

    fn update_state(&mut self, requested: PlaybackState) {
        let mut state = PlaybackState::from_bits_truncate(requested.bits());
        if state.contains(NO_MEDIA) || (self.config.headset_only && self.is_speaker_on()) {
            state.remove(PLAYING);
        }

        let track = self.queue.get(0);
        if track.is_none() {
            state.remove(PLAYING);
            state.remove(REPEAT);
        }

        let old = self.state;
        self.state = state;

        let track_id = track.as_ref().map(|t| t.id);
        if state != old || track_id != self.last_broadcast || self.force_notify {
            self.force_notify = false;
            self.last_broadcast = track_id;
            self.broadcast_change(state, track.as_ref());
        }
        self.publish_snapshot(track);

        let changed = old.changed(state);

        if changed.contains(SHUFFLE) {
            let on = state.contains(SHUFFLE);
            self.queue.set_shuffle(on);
            self.session
                .presenter()
                .toast(if on { Toast::ShuffleOn } else { Toast::ShuffleOff });
        }
        if changed.contains(REPEAT) {
            let on = state.contains(REPEAT);
            self.queue.set_repeat(on);
            self.session
                .presenter()
                .toast(if on { Toast::RepeatOn } else { Toast::RepeatOff });
        }

        if state.contains(NO_MEDIA) {
            self.attach_source(SourceKind::Library);
        } else {
            self.detach_source(SourceKind::Library);
        }

        if changed.contains(PLAYING) {
            // Any other play/pause during a call forfeits the resume
            self.playing_before_call = false;
            if state.is_playing() {
                if self.config.notification_mode != NotificationMode::Never {
                    self.session.start_foreground();
                }
                self.session.start();
            } else {
                self.session.stop_foreground();
                self.session.pause();
            }
        }

        if changed.intersects(PlaybackState::USER_MASK) {
            self.user_action_triggered();
        }
    }

    fn broadcast_change(&mut self, state: PlaybackState, track: Option<&Track>) {
        debug!(%state, track_id = ?track.map(|t| t.id), "state changed");
        self.events.emit(&PlaybackEvent::StateChanged {
            state,
            track: track.cloned(),
            position: self.queue.position(),
        });

        if self.config.scrobble {
            if let Some(scrobbler) = self.scrobbler.as_mut() {
                scrobbler.submit(state.is_playing(), track);
            }
        }

        self.update_notification(track);
    }

    fn update_notification(&mut self, track: Option<&Track>) {
        let playing = self.state.is_playing();
        let show = match self.config.notification_mode {
            NotificationMode::Always => true,
            NotificationMode::WhenPlaying => playing,
            NotificationMode::Never => false,
        };

        match track {
            Some(track) if show => self.session.notify(Notification {
                track: track.clone(),
                playing,
            }),
            _ => self.session.cancel_notification(),
        }
    }

    fn publish_snapshot(&self, track: Option<Track>) {
        let mut snapshot = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *snapshot = Snapshot {
            state: self.state,
            track,
            position: self.queue.position(),
            initialized: self.initialized && !self.shut_down,
        };
    }

    // ===== Idle timeout and fade =====

    fn user_action_triggered(&mut self) {
        self.scheduler.cancel(TimerKind::FadeOut);
        self.scheduler.cancel(TimerKind::IdleTimeout);

        if let Some(delay) = self.config.idle_timeout() {
            self.scheduler
                .schedule(TimerKind::IdleTimeout, self.clock + delay, Deferred::IdleTimeout);
        }

        if self.volume.is_faded() {
            let volume = self.volume.restore();
            self.session.set_volume(volume);
        }
    }

    fn fade_tick(&mut self, progress: u8) {
        let progress = progress.saturating_sub(1);
        if progress == 0 {
            info!("fade out finished, pausing");
            self.clear_flag(PLAYING);
            let volume = self.volume.restore();
            self.session.set_volume(volume);
        } else {
            let volume = self.volume.fade_to(progress);
            self.session.set_volume(volume);
            self.scheduler.schedule(
                TimerKind::FadeOut,
                self.clock + FADE_TICK,
                Deferred::FadeTick(progress),
            );
        }
    }

    fn debounce(&mut self, key: DebounceKey, delta: i32) {
        let kind = TimerKind::Debounce(key);
        if self.scheduler.cancel(kind) {
            debug!(?key, "repeated within debounce window, launching UI");
            self.session.presenter().launch_ui();
        } else {
            self.scheduler.schedule(
                kind,
                self.clock + DEBOUNCE_WINDOW,
                Deferred::Go {
                    delta,
                    autoplay: false,
                },
            );
        }
    }

    // ===== Interruptions =====

    fn is_speaker_on(&self) -> bool {
        !self.plugged && self.route.is_speaker_on()
    }

    fn route_changed(&mut self, plugged: bool) {
        let was_plugged = self.plugged;
        self.plugged = plugged;
        debug!(plugged, was_plugged, "output route changed");

        let unplugged = was_plugged && !plugged;
        if (unplugged && self.config.headset_pause)
            || (self.config.headset_only && self.is_speaker_on())
        {
            self.clear_flag(PLAYING);
        }
    }

    fn call_state_changed(&mut self, call: CallState) {
        debug!(?call, "call state changed");
        match call {
            CallState::Ringing | CallState::OffHook => {
                if !self.playing_before_call && self.state.is_playing() {
                    self.clear_flag(PLAYING);
                    self.playing_before_call = true;
                }
            }
            CallState::Idle => {
                if self.playing_before_call {
                    self.playing_before_call = false;
                    self.set_flag(PLAYING);
                }
            }
        }
    }

    fn library_changed(&mut self) {
        self.queue.library_changed();
        if self.state.contains(NO_MEDIA) {
            info!("library changed while idle, reloading");
            self.load_track(0, false, false);
        }
    }

    fn update_config(&mut self, change: ConfigChange) {
        debug!(?change, "preference changed");
        self.config.apply(&change);

        match change {
            ConfigChange::HeadsetOnly(true) => {
                if self.is_speaker_on() {
                    self.clear_flag(PLAYING);
                }
            }
            ConfigChange::NotificationMode(_) => {
                let track = self.queue.get(0);
                self.update_notification(track.as_ref());
            }
            ConfigChange::UserVolume(_) => {
                let volume = self.volume.set_user(self.config.volume());
                self.session.set_volume(volume);
            }
            ConfigChange::MediaButtons(on) => {
                self.detach_source(SourceKind::MediaButton);
                if on && self.initialized {
                    self.attach_source(SourceKind::MediaButton);
                }
            }
            ConfigChange::IdleTimeout { .. } => self.user_action_triggered(),
            ConfigChange::HeadsetOnly(false)
            | ConfigChange::HeadsetPause(_)
            | ConfigChange::Scrobble(_) => {}
        }
    }

    // ===== Event sources =====

    fn attach_source(&mut self, kind: SourceKind) {
        if !self.attached.insert(kind) {
            return;
        }
        for source in self.sources.iter_mut().filter(|s| s.kind() == kind) {
            match source.attach(self.commands.clone()) {
                Ok(()) => debug!(?kind, "attached event source"),
                Err(e) => debug!(?kind, error = %e, "event source registration failed"),
            }
        }
    }

    fn detach_source(&mut self, kind: SourceKind) {
        if !self.attached.remove(&kind) {
            return;
        }
        for source in self.sources.iter_mut().filter(|s| s.kind() == kind) {
            match source.detach() {
                Ok(()) => debug!(?kind, "detached event source"),
                Err(e) => debug!(?kind, error = %e, "event source detach failed"),
            }
        }
    }
}
