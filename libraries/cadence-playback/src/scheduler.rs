//! Keyed timer queue
//!
//! Deferred work is kept in a min-heap ordered by fire time, with a sequence
//! number breaking ties so entries posted earlier run first. Each timer kind
//! has at most one live entry: scheduling a kind again replaces the pending
//! entry, and replaced heap nodes are skipped when they surface.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

/// Delay before a debounced command runs
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(400);

/// Interval between fade-out ticks
pub const FADE_TICK: Duration = Duration::from_millis(50);

/// Delay after a load or enqueue before queue state is persisted
pub const SAVE_DELAY: Duration = Duration::from_secs(5);

/// Commands that are debounced, each with its own window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebounceKey {
    /// Delayed play/pause toggle
    Toggle,
    /// Delayed skip to next
    Next,
}

/// Named timer slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Initial resource acquisition
    Create,
    /// Attaching event sources after initialization
    PostCreate,
    /// Idle shutoff
    IdleTimeout,
    /// Next fade-out tick
    FadeOut,
    /// Debounce window of a delayed command
    Debounce(DebounceKey),
    /// Prefetch, prune and persist after a load
    Maintenance,
    /// Persist after an enqueue
    SaveState,
}

#[derive(Debug)]
struct Slot {
    at: Instant,
    seq: u64,
    kind: TimerKind,
}

// Ordered by (fire time, sequence); sequence numbers are unique.
impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for Slot {}

impl PartialOrd for Slot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Slot {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.at, self.seq).cmp(&(other.at, other.seq))
    }
}

/// Min-heap of deferred tasks, one per [`TimerKind`]
#[derive(Debug)]
pub struct Scheduler<T> {
    heap: BinaryHeap<Reverse<Slot>>,
    pending: HashMap<TimerKind, (u64, T)>,
    next_seq: u64,
}

impl<T> Scheduler<T> {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            pending: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Schedule `task` to run at `at`, replacing any pending task of `kind`
    pub fn schedule(&mut self, kind: TimerKind, at: Instant, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert(kind, (seq, task));
        self.heap.push(Reverse(Slot { at, seq, kind }));
    }

    /// Cancel the pending task of `kind`. Returns whether one was pending.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.pending.remove(&kind).is_some()
    }

    /// Whether a task of `kind` is pending
    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.pending.contains_key(&kind)
    }

    /// Fire time of the earliest live task
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.discard_stale();
        self.heap.peek().map(|Reverse(slot)| slot.at)
    }

    /// Remove and return the earliest task due at or before `now`, with its
    /// scheduled fire time.
    pub fn pop_due(&mut self, now: Instant) -> Option<(Instant, TimerKind, T)> {
        self.discard_stale();
        let due = matches!(self.heap.peek(), Some(Reverse(slot)) if slot.at <= now);
        if !due {
            return None;
        }
        let Reverse(slot) = self.heap.pop()?;
        let (_, task) = self.pending.remove(&slot.kind)?;
        Some((slot.at, slot.kind, task))
    }

    /// Drop every pending task
    pub fn clear(&mut self) {
        self.heap.clear();
        self.pending.clear();
    }

    /// Number of live tasks
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn discard_stale(&mut self) {
        while let Some(Reverse(slot)) = self.heap.peek() {
            let live = self
                .pending
                .get(&slot.kind)
                .is_some_and(|(seq, _)| *seq == slot.seq);
            if live {
                break;
            }
            self.heap.pop();
        }
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
