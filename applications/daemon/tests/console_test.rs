//! Console request parsing

use cadence_core::{ItemKind, TrackId};
use cadence_daemon::console::{parse_line, ConsoleAction};
use cadence_playback::{
    CallState, Command, ConfigChange, DebounceKey, NotificationMode, PlaybackState,
};

fn parsed(line: &str) -> ConsoleAction {
    parse_line(line)
        .unwrap_or_else(|e| panic!("{line:?} failed: {e}"))
        .unwrap_or_else(|| panic!("{line:?} parsed to nothing"))
}

fn command(line: &str) -> Command {
    match parsed(line) {
        ConsoleAction::Command(command) => command,
        other => panic!("{line:?} is not a controller command: {other:?}"),
    }
}

// ===== Transport =====

#[test]
fn transport_commands() {
    assert_eq!(command("toggle"), Command::TogglePlayback);
    assert_eq!(command("t"), Command::TogglePlayback);
    assert_eq!(command("n"), Command::Next);
    assert_eq!(command("prev"), Command::Previous);
    assert_eq!(command("next-play"), Command::NextAutoplay);
    assert_eq!(command("prev-play"), Command::PreviousAutoplay);
    assert_eq!(command("  seek   500 "), Command::SeekToProgress(500));
}

#[test]
fn blank_lines_are_ignored() {
    assert_eq!(parse_line(""), Ok(None));
    assert_eq!(parse_line("   \t"), Ok(None));
}

// ===== Queue =====

#[test]
fn queue_commands() {
    assert_eq!(
        command("play album 12"),
        Command::PlayItems {
            kind: ItemKind::Album,
            id: 12
        }
    );
    assert_eq!(
        command("enqueue artist 3"),
        Command::EnqueueItems {
            kind: ItemKind::Artist,
            id: 3
        }
    );
    assert_eq!(command("done"), Command::FinishEnqueueing);
    assert_eq!(command("remove 42"), Command::Remove(TrackId::new(42)));
    assert_eq!(
        command("shuffle"),
        Command::ToggleFlag(PlaybackState::SHUFFLE)
    );
    assert_eq!(command("repeat"), Command::ToggleFlag(PlaybackState::REPEAT));
}

#[test]
fn bad_items_are_rejected() {
    assert!(parse_line("play playlist 1").is_err());
    assert!(parse_line("play album x").is_err());
    assert!(parse_line("play album").is_err());
    assert!(parse_line("remove").is_err());
}

// ===== Preferences =====

#[test]
fn preference_commands() {
    assert_eq!(
        command("volume 0.25"),
        Command::UpdateConfig(ConfigChange::UserVolume(0.25))
    );
    assert_eq!(
        command("notify always"),
        Command::UpdateConfig(ConfigChange::NotificationMode(NotificationMode::Always))
    );
    assert_eq!(
        command("idle 600"),
        Command::UpdateConfig(ConfigChange::IdleTimeout {
            enabled: true,
            seconds: 600
        })
    );
    assert_eq!(
        command("idle 0"),
        Command::UpdateConfig(ConfigChange::IdleTimeout {
            enabled: false,
            seconds: 0
        })
    );
    assert_eq!(
        command("headset-only on"),
        Command::UpdateConfig(ConfigChange::HeadsetOnly(true))
    );
    assert_eq!(
        command("buttons off"),
        Command::UpdateConfig(ConfigChange::MediaButtons(false))
    );
}

#[test]
fn out_of_range_values_are_rejected() {
    assert!(parse_line("volume 2").is_err());
    assert!(parse_line("seek 1001").is_err());
    assert!(parse_line("scrobble maybe").is_err());
    assert!(parse_line("notify sometimes").is_err());
}

// ===== Signals =====

#[test]
fn signal_actions() {
    assert_eq!(parsed("plug"), ConsoleAction::Plug(true));
    assert_eq!(parsed("unplug"), ConsoleAction::Plug(false));
    assert_eq!(parsed("call ring"), ConsoleAction::Call(CallState::Ringing));
    assert_eq!(parsed("call offhook"), ConsoleAction::Call(CallState::OffHook));
    assert_eq!(parsed("call idle"), ConsoleAction::Call(CallState::Idle));
    assert_eq!(parsed("button"), ConsoleAction::Button(DebounceKey::Toggle));
    assert_eq!(parsed("button next"), ConsoleAction::Button(DebounceKey::Next));
    assert_eq!(parsed("rescan"), ConsoleAction::Rescan);
    assert_eq!(parsed("status"), ConsoleAction::Status);
    assert_eq!(parsed("quit"), ConsoleAction::Quit);
    assert_eq!(parsed("exit"), ConsoleAction::Quit);
}

#[test]
fn unknown_verbs_are_rejected() {
    let err = parse_line("rewind").unwrap_err();
    assert!(err.contains("rewind"));
    assert!(parse_line("toggle now").is_err());
}
