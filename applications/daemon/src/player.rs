//! Rodio-backed player
//!
//! Each prepared track gets its own [`Sink`] on the shared output mixer. A
//! monitor thread watches the sink and posts `TrackCompleted` when it drains.
//! Every stop, reset or new prepare bumps a generation counter so a stale
//! monitor exits quietly.
//!
//! This player never posts `DecoderError`. Open and probe failures surface
//! synchronously from `set_source`, and the controller retries those on the
//! following track. rodio ends a source that fails mid-stream, so the sink
//! simply drains and the failure arrives as `TrackCompleted`.

use cadence_playback::{Command, CommandSender, PlaybackError, Player};
use rodio::mixer::Mixer;
use rodio::{Decoder, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, warn};

type FileDecoder = Decoder<BufReader<File>>;

/// How often the monitor checks whether the sink drained
const MONITOR_INTERVAL: Duration = Duration::from_millis(200);

pub struct RodioPlayer {
    mixer: Mixer,
    commands: CommandSender,
    sink: Option<Arc<Sink>>,
    pending: Option<FileDecoder>,
    duration: Option<Duration>,
    volume: f32,
    generation: Arc<AtomicU64>,
    released: bool,
}

impl RodioPlayer {
    /// Player on `mixer`, posting completion into `commands`
    pub fn new(mixer: Mixer, commands: CommandSender) -> Self {
        Self {
            mixer,
            commands,
            sink: None,
            pending: None,
            duration: None,
            volume: 1.0,
            generation: Arc::new(AtomicU64::new(0)),
            released: false,
        }
    }

    fn drop_sink(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn spawn_monitor(&self, sink: Arc<Sink>) {
        let generation = Arc::clone(&self.generation);
        let mine = generation.load(Ordering::SeqCst);
        let commands = self.commands.clone();

        let spawned = thread::Builder::new()
            .name("playback-monitor".to_string())
            .spawn(move || loop {
                thread::sleep(MONITOR_INTERVAL);
                if generation.load(Ordering::SeqCst) != mine {
                    return;
                }
                if sink.empty() {
                    debug!("Track drained");
                    if commands.send(Command::TrackCompleted).is_err() {
                        debug!("Controller gone before track completion");
                    }
                    return;
                }
            });

        if let Err(e) = spawned {
            error!("Failed to spawn playback monitor: {}", e);
        }
    }
}

impl Player for RodioPlayer {
    fn reset(&mut self) {
        self.drop_sink();
        self.pending = None;
        self.duration = None;
    }

    fn set_source(&mut self, path: &Path) -> cadence_playback::Result<()> {
        if self.released {
            return Err(PlaybackError::Released);
        }

        let file = File::open(path).map_err(|e| PlaybackError::source(path, e.to_string()))?;
        let decoder =
            Decoder::new(BufReader::new(file)).map_err(|e| PlaybackError::source(path, e.to_string()))?;

        self.duration = decoder.total_duration();
        self.pending = Some(decoder);
        Ok(())
    }

    fn prepare(&mut self) -> cadence_playback::Result<()> {
        if self.released {
            return Err(PlaybackError::Released);
        }
        let decoder = self
            .pending
            .take()
            .ok_or_else(|| PlaybackError::prepare("no source set"))?;

        self.drop_sink();
        let sink = Arc::new(Sink::connect_new(&self.mixer));
        sink.pause();
        sink.set_volume(self.volume);
        sink.append(decoder);

        self.spawn_monitor(Arc::clone(&sink));
        self.sink = Some(sink);
        Ok(())
    }

    fn start(&mut self) {
        match &self.sink {
            Some(sink) => sink.play(),
            None => warn!("Start without a prepared track"),
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn stop(&mut self) {
        self.drop_sink();
    }

    fn seek_to(&mut self, position: Duration) -> cadence_playback::Result<()> {
        let sink = self
            .sink
            .as_ref()
            .ok_or_else(|| PlaybackError::Seek("no track prepared".to_string()))?;
        sink.try_seek(position)
            .map_err(|e| PlaybackError::Seek(e.to_string()))
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    fn position(&self) -> Duration {
        self.sink.as_ref().map_or(Duration::ZERO, |sink| sink.get_pos())
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn release(&mut self) {
        self.reset();
        self.released = true;
    }
}

impl Drop for RodioPlayer {
    fn drop(&mut self) {
        self.drop_sink();
    }
}
