//! Line-oriented console
//!
//! Reads one request per line from stdin. Playback requests go straight to
//! the controller; plug, call and button lines fire the matching signal
//! source, so they are ignored while that source is detached.

use cadence_core::{ItemKind, TrackId};
use cadence_playback::{
    CallState, Command, ConfigChange, DebounceKey, NotificationMode, PlaybackHandle,
    PlaybackState,
};
use std::io::BufRead;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::library::IndexLibrary;
use crate::platform::{ConfiguredRoute, Signal};
use crate::watcher::rescan;

/// Parsed console request
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleAction {
    /// Post straight to the controller
    Command(Command),
    /// Headset plugged or unplugged
    Plug(bool),
    /// Telephony state change
    Call(CallState),
    /// Hardware media button press
    Button(DebounceKey),
    /// Reload the library index
    Rescan,
    /// Print the current snapshot
    Status,
    /// Shut down
    Quit,
}

pub const HELP: &str = "\
commands:
  toggle | t              play/pause
  next | n, prev | p      skip (next-play, prev-play also start playback)
  play <kind> <id>        replace the queue (kind: artist, album, track)
  enqueue <kind> <id>     append after the last enqueued item
  done                    finish enqueueing
  remove <id>             drop a track from the queue
  shuffle, repeat         toggle queue modes
  seek <permille>         seek to a proportion of the track
  volume <0..1>           set the user volume
  notify <never|playing|always>
  idle <seconds>          idle shutoff, 0 disables
  headset-only|headset-pause|scrobble|buttons <on|off>
  plug, unplug            simulate a headset
  call <ring|offhook|idle>
  button [next]           simulate a media button
  rescan                  reload the library index
  status, quit";

/// Parse a console line
///
/// # Returns
/// * `Ok(None)` - Blank line
/// * `Err(msg)` - Unknown command or bad argument
pub fn parse_line(line: &str) -> Result<Option<ConsoleAction>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command =
        |c: Command| -> Result<Option<ConsoleAction>, String> { Ok(Some(ConsoleAction::Command(c))) };

    match (verb, args.as_slice()) {
        ("toggle" | "t", []) => command(Command::TogglePlayback),
        ("next" | "n", []) => command(Command::Next),
        ("prev" | "p", []) => command(Command::Previous),
        ("next-play", []) => command(Command::NextAutoplay),
        ("prev-play", []) => command(Command::PreviousAutoplay),
        ("play", [kind, id]) => {
            let (kind, id) = parse_item(kind, id)?;
            command(Command::PlayItems { kind, id })
        }
        ("enqueue", [kind, id]) => {
            let (kind, id) = parse_item(kind, id)?;
            command(Command::EnqueueItems { kind, id })
        }
        ("done", []) => command(Command::FinishEnqueueing),
        ("remove", [id]) => command(Command::Remove(TrackId::new(parse_number(id)?))),
        ("shuffle", []) => command(Command::ToggleFlag(PlaybackState::SHUFFLE)),
        ("repeat", []) => command(Command::ToggleFlag(PlaybackState::REPEAT)),
        ("seek", [permille]) => {
            let permille: u32 = permille
                .parse()
                .map_err(|_| format!("invalid position: {permille}"))?;
            if permille > 1000 {
                return Err(format!("position must be 0..=1000, got {permille}"));
            }
            command(Command::SeekToProgress(permille))
        }
        ("volume", [volume]) => {
            let volume: f32 = volume
                .parse()
                .map_err(|_| format!("invalid volume: {volume}"))?;
            if !(0.0..=1.0).contains(&volume) {
                return Err(format!("volume must be 0..1, got {volume}"));
            }
            command(Command::UpdateConfig(ConfigChange::UserVolume(volume)))
        }
        ("notify", [mode]) => {
            let mode = match *mode {
                "never" => NotificationMode::Never,
                "playing" => NotificationMode::WhenPlaying,
                "always" => NotificationMode::Always,
                other => return Err(format!("unknown notification mode: {other}")),
            };
            command(Command::UpdateConfig(ConfigChange::NotificationMode(mode)))
        }
        ("idle", [seconds]) => {
            let seconds: u64 = seconds
                .parse()
                .map_err(|_| format!("invalid seconds: {seconds}"))?;
            command(Command::UpdateConfig(ConfigChange::IdleTimeout {
                enabled: seconds > 0,
                seconds,
            }))
        }
        ("headset-only", [on]) => command(Command::UpdateConfig(ConfigChange::HeadsetOnly(
            parse_switch(on)?,
        ))),
        ("headset-pause", [on]) => command(Command::UpdateConfig(ConfigChange::HeadsetPause(
            parse_switch(on)?,
        ))),
        ("scrobble", [on]) => command(Command::UpdateConfig(ConfigChange::Scrobble(
            parse_switch(on)?,
        ))),
        ("buttons", [on]) => command(Command::UpdateConfig(ConfigChange::MediaButtons(
            parse_switch(on)?,
        ))),
        ("plug", []) => Ok(Some(ConsoleAction::Plug(true))),
        ("unplug", []) => Ok(Some(ConsoleAction::Plug(false))),
        ("call", [state]) => {
            let state = match *state {
                "ring" | "ringing" => CallState::Ringing,
                "offhook" => CallState::OffHook,
                "idle" => CallState::Idle,
                other => return Err(format!("unknown call state: {other}")),
            };
            Ok(Some(ConsoleAction::Call(state)))
        }
        ("button", []) => Ok(Some(ConsoleAction::Button(DebounceKey::Toggle))),
        ("button", ["next"]) => Ok(Some(ConsoleAction::Button(DebounceKey::Next))),
        ("rescan", []) => Ok(Some(ConsoleAction::Rescan)),
        ("status", []) => Ok(Some(ConsoleAction::Status)),
        ("quit" | "exit", []) => Ok(Some(ConsoleAction::Quit)),
        (verb, _) => Err(format!("unrecognized command: {verb} (try `help`)")),
    }
}

fn parse_item(kind: &str, id: &str) -> Result<(ItemKind, i64), String> {
    let kind = ItemKind::parse(kind).ok_or_else(|| format!("unknown item kind: {kind}"))?;
    Ok((kind, parse_number(id)?))
}

fn parse_number(id: &str) -> Result<i64, String> {
    id.parse().map_err(|_| format!("invalid id: {id}"))
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match value {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => Err(format!("expected on or off, got {other}")),
    }
}

/// Signals fired by console requests
#[derive(Debug, Clone)]
pub struct Signals {
    pub route: ConfiguredRoute,
    pub route_signal: Signal,
    pub call: Signal,
    pub media_button: Signal,
    pub library: Signal,
}

/// Console driving a running controller
pub struct Console {
    handle: PlaybackHandle,
    signals: Signals,
    library: Arc<IndexLibrary>,
}

impl Console {
    pub fn new(handle: PlaybackHandle, signals: Signals, library: Arc<IndexLibrary>) -> Self {
        Self {
            handle,
            signals,
            library,
        }
    }

    /// Read requests until `quit` or end of input
    pub fn run(&self, input: impl BufRead) -> anyhow::Result<()> {
        for line in input.lines() {
            let line = line?;
            if line.trim() == "help" {
                println!("{HELP}");
                continue;
            }
            match parse_line(&line) {
                Ok(Some(ConsoleAction::Quit)) => break,
                Ok(Some(action)) => self.apply(action)?,
                Ok(None) => {}
                Err(msg) => eprintln!("{msg}"),
            }
        }
        info!("Console closed");
        Ok(())
    }

    /// Carry out a single request
    pub fn apply(&self, action: ConsoleAction) -> anyhow::Result<()> {
        match action {
            ConsoleAction::Command(command) => self.handle.send(command)?,
            ConsoleAction::Plug(plugged) => {
                self.signals.route.set_plugged(plugged);
                self.fire(&self.signals.route_signal, Command::RouteChanged { plugged }, "route");
            }
            ConsoleAction::Call(state) => {
                self.fire(&self.signals.call, Command::CallStateChanged(state), "call");
            }
            ConsoleAction::Button(key) => {
                let command = match key {
                    DebounceKey::Toggle => Command::TogglePlaybackDelayed,
                    DebounceKey::Next => Command::NextDelayed,
                };
                self.fire(&self.signals.media_button, command, "media button");
            }
            ConsoleAction::Rescan => match rescan(&self.library, &self.signals.library) {
                Ok(true) => println!("library reloaded: {} tracks", self.library.len()),
                Ok(false) => println!("library unchanged"),
                Err(e) => eprintln!("rescan failed: {e}"),
            },
            ConsoleAction::Status => self.print_status(),
            ConsoleAction::Quit => {}
        }
        Ok(())
    }

    fn fire(&self, signal: &Signal, command: Command, name: &str) {
        if !signal.post(command) {
            warn!("The {} listener is not attached", name);
        }
    }

    fn print_status(&self) {
        let snapshot = self.handle.snapshot();
        let position = self.handle.position();
        let duration = self.handle.duration();
        debug!(?snapshot, "Status requested");

        let track = snapshot.track.as_ref().map_or_else(
            || "nothing".to_string(),
            |t| t.title.clone().unwrap_or_else(|| format!("track {}", t.id)),
        );
        let timing = match duration {
            Some(d) => format!("{:.0}s / {:.0}s", position.as_secs_f32(), d.as_secs_f32()),
            None => format!("{:.0}s", position.as_secs_f32()),
        };
        println!(
            "[{}] {} ({}) at queue position {}",
            snapshot.state, track, timing, snapshot.position
        );
    }
}
