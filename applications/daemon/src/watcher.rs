//! Library index watcher
//!
//! Attached by the controller only while there is nothing to play. Watches
//! the directory holding the index (editors often replace the file rather
//! than write it in place) and posts `LibraryChanged` after a reload.
//!
//! # Platform Support
//!
//! - Windows: `ReadDirectoryChangesW`
//! - macOS: `FSEvents`
//! - Linux: `inotify`

use cadence_playback::{Command, CommandSender, EventSource, PlaybackError, SourceKind};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::library::IndexLibrary;
use crate::platform::{Signal, SignalSource};

/// Reload the index and tell the controller if anything changed
///
/// # Returns
/// * `Ok(true)` - The index changed and the controller was told, if listening
/// * `Ok(false)` - The index is unchanged
pub fn rescan(library: &IndexLibrary, signal: &Signal) -> Result<bool> {
    if !library.refresh()? {
        return Ok(false);
    }
    if !signal.post(Command::LibraryChanged) {
        debug!("Library changed while the controller is not listening");
    }
    Ok(true)
}

/// [`EventSource`] of kind [`SourceKind::Library`]
pub struct LibraryObserver {
    library: Arc<IndexLibrary>,
    source: SignalSource,
    signal: Signal,
    watch: bool,
    debounce: Duration,
    debouncer: Option<Debouncer<RecommendedWatcher, RecommendedCache>>,
}

impl LibraryObserver {
    /// Observer over `library`; with `watch` off it only reacts to [`rescan`]
    pub fn new(library: Arc<IndexLibrary>, watch: bool, debounce: Duration) -> Self {
        let (source, signal) = SignalSource::new(SourceKind::Library);
        Self {
            library,
            source,
            signal,
            watch,
            debounce,
            debouncer: None,
        }
    }

    /// Firing end, for manual rescans
    pub fn signal(&self) -> Signal {
        self.signal.clone()
    }

    pub fn is_watching(&self) -> bool {
        self.debouncer.is_some()
    }

    fn start_watching(&mut self) -> cadence_playback::Result<()> {
        let index = self.library.path().to_path_buf();
        let directory = match index.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };
        if !directory.exists() {
            warn!("Cannot watch non-existent path: {}", directory.display());
            return Ok(());
        }

        let file_name = index.file_name().map(|n| n.to_os_string());
        let library = Arc::clone(&self.library);
        let signal = self.signal.clone();

        let mut debouncer = new_debouncer(
            self.debounce,
            None,
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    let touches_index = events.iter().any(|event| {
                        event
                            .event
                            .paths
                            .iter()
                            .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name)
                    });
                    if touches_index {
                        if let Err(e) = rescan(&library, &signal) {
                            error!("Failed to reload library index: {}", e);
                        }
                    }
                }
                Err(errors) => {
                    for error in errors {
                        error!("Watcher error: {:?}", error);
                    }
                }
            },
        )
        .map_err(|e| {
            PlaybackError::registration("library observer", format!("Failed to create debouncer: {e}"))
        })?;

        debouncer
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|e| {
                PlaybackError::registration("library observer", format!("Failed to watch path: {e}"))
            })?;

        info!("Started watching: {}", directory.display());
        self.debouncer = Some(debouncer);
        Ok(())
    }
}

impl EventSource for LibraryObserver {
    fn kind(&self) -> SourceKind {
        SourceKind::Library
    }

    fn attach(&mut self, commands: CommandSender) -> cadence_playback::Result<()> {
        self.source.attach(commands)?;
        if self.watch && self.debouncer.is_none() {
            if let Err(e) = self.start_watching() {
                self.source.detach()?;
                return Err(e);
            }
        }
        Ok(())
    }

    fn detach(&mut self) -> cadence_playback::Result<()> {
        if self.debouncer.take().is_some() {
            info!("Stopped watching library index");
        }
        self.source.detach()
    }
}
