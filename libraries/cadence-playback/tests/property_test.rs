//! Property-based tests for the playback controller
//!
//! Uses proptest to run random command sequences and checks the state
//! invariants after every step.

mod common;

use cadence_core::{ItemKind, TrackId};
use cadence_playback::{
    CallState, Command, ConfigChange, PlaybackConfig, PlaybackState, SourceKind,
};
use common::{Harness, HarnessBuilder};
use proptest::prelude::*;
use std::time::Duration;

// ===== Helpers =====

#[derive(Debug, Clone)]
enum Step {
    Send(Command),
    Wait(u64),
}

fn arbitrary_flag() -> impl Strategy<Value = PlaybackState> {
    prop_oneof![
        Just(PlaybackState::PLAYING),
        Just(PlaybackState::NO_MEDIA),
        Just(PlaybackState::SHUFFLE),
        Just(PlaybackState::REPEAT),
        (0u8..=255).prop_map(PlaybackState::from_bits_truncate),
    ]
}

fn arbitrary_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::TogglePlayback),
        Just(Command::TogglePlaybackDelayed),
        Just(Command::Next),
        Just(Command::NextDelayed),
        Just(Command::NextAutoplay),
        Just(Command::Previous),
        Just(Command::PreviousAutoplay),
        (1i64..=4).prop_map(|id| Command::PlayItems {
            kind: ItemKind::Album,
            id,
        }),
        (1i64..=7).prop_map(|id| Command::EnqueueItems {
            kind: ItemKind::Track,
            id,
        }),
        Just(Command::FinishEnqueueing),
        (1i64..=7).prop_map(|id| Command::Remove(TrackId::new(id))),
        arbitrary_flag().prop_map(Command::SetFlag),
        arbitrary_flag().prop_map(Command::ClearFlag),
        arbitrary_flag().prop_map(Command::ToggleFlag),
        any::<bool>().prop_map(|plugged| Command::RouteChanged { plugged }),
        prop_oneof![
            Just(CallState::Idle),
            Just(CallState::Ringing),
            Just(CallState::OffHook)
        ]
        .prop_map(Command::CallStateChanged),
        Just(Command::LibraryChanged),
        Just(Command::TrackCompleted),
        Just(Command::DecoderError { what: 1, extra: 0 }),
        any::<bool>().prop_map(|on| Command::UpdateConfig(ConfigChange::HeadsetOnly(on))),
        (0u32..=1000).prop_map(Command::SeekToProgress),
    ]
}

fn arbitrary_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => arbitrary_command().prop_map(Step::Send),
        1 => (0u64..6000).prop_map(Step::Wait),
    ]
}

fn check_invariants(h: &Harness) -> Result<(), TestCaseError> {
    let state = h.state();
    let snapshot = h.controller.snapshot().read().unwrap().clone();

    prop_assert_eq!(state, PlaybackState::from_bits_truncate(state.bits()));
    prop_assert_eq!(snapshot.state, state);

    if state.contains(PlaybackState::NO_MEDIA) {
        prop_assert!(!state.is_playing(), "playing without media: {}", state);
    }
    if snapshot.track.is_none() {
        prop_assert!(!state.is_playing(), "playing without a track: {}", state);
        prop_assert!(!state.contains(PlaybackState::REPEAT));
    }
    if h.player().playing {
        prop_assert!(state.is_playing(), "player audible while {}", state);
    }

    prop_assert_eq!(
        h.sources().is_attached(SourceKind::Library),
        state.contains(PlaybackState::NO_MEDIA)
    );
    prop_assert!(h.controller.current_volume() <= 1.0);
    prop_assert!(h.controller.current_volume() >= 0.01 || h.controller.current_volume() == 0.0);
    Ok(())
}

// ===== Property Tests =====

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: state invariants hold after every command and timer
    #[test]
    fn invariants_hold_for_any_sequence(
        steps in prop::collection::vec(arbitrary_step(), 1..60),
        failing in prop::collection::vec(1i64..=6, 0..3),
        headset_only in any::<bool>(),
        speaker_on in any::<bool>(),
        idle in any::<bool>(),
    ) {
        let config = PlaybackConfig {
            headset_only,
            idle_timeout_enabled: idle,
            idle_timeout_seconds: 2,
            ..PlaybackConfig::default()
        };
        let mut h = HarnessBuilder::new()
            .config(config)
            .failing(&failing)
            .speaker_on(speaker_on)
            .start();
        check_invariants(&h)?;

        for step in steps {
            match step {
                Step::Send(command) => h.send(command),
                Step::Wait(ms) => h.advance(Duration::from_millis(ms)),
            }
            check_invariants(&h)?;
        }

        h.send(Command::Shutdown);
        prop_assert!(!h.is_playing());
        prop_assert!(h.sources().attached.is_empty());
        prop_assert_eq!(h.player().releases, 1);
    }

    /// Property: every state change carries the committed flags
    #[test]
    fn broadcasts_match_committed_state(
        steps in prop::collection::vec(arbitrary_command(), 1..30),
    ) {
        let mut h = HarnessBuilder::new().start();
        h.drain_events();

        for command in steps {
            h.send(command);
            let changes = h.state_changes();
            if let Some(cadence_playback::PlaybackEvent::StateChanged { state, .. }) = changes.last() {
                prop_assert_eq!(*state, h.state());
            }
        }
    }

    /// Property: two presses inside the window launch the UI once and never
    /// toggle playback
    #[test]
    fn paired_presses_never_toggle(pairs in 1usize..5, gap in 0u64..399) {
        let mut h = HarnessBuilder::new().start();
        h.play_album(1);

        for _ in 0..pairs {
            h.send(Command::TogglePlaybackDelayed);
            h.advance(Duration::from_millis(gap));
            h.send(Command::TogglePlaybackDelayed);
            h.advance(Duration::from_millis(500));
        }

        prop_assert!(h.is_playing());
        prop_assert_eq!(h.presenter().ui_launches, pairs);
    }
}
