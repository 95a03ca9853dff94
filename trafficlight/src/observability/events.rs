//! Structured event stream for `trafficlight`.
//!
//! Discrete, typed events emitted while a light runs. Events are serialized
//! as newline-delimited JSON (JSONL) with a monotonically increasing
//! sequence number.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use trafficlight_core::LightPhase;

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted during a run.
///
/// Each variant is tagged with `"type"` when serialized to JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// The cycling thread has been started.
    LightStarted {
        /// When the light started.
        timestamp: DateTime<Utc>,
        /// Light name.
        light: String,
        /// Waiting strategy (`"polling"` or `"sleep"`).
        mode: String,
        /// Lower cycle bound in milliseconds.
        min_cycle_ms: u64,
        /// Upper cycle bound in milliseconds.
        max_cycle_ms: u64,
    },

    /// The light flipped.
    PhaseChanged {
        /// When the flip happened.
        timestamp: DateTime<Utc>,
        /// Light name.
        light: String,
        /// Phase entered.
        phase: LightPhase,
        /// Length of the cycle that just ended, in milliseconds.
        cycle_ms: u64,
        /// 1-based flip counter.
        transition: u64,
    },

    /// An observer received a green from the queue.
    GreenObserved {
        /// When the green was received.
        timestamp: DateTime<Utc>,
        /// Light name.
        light: String,
        /// Number of greens received so far, including this one.
        count: u64,
    },

    /// The light has been shut down.
    LightStopped {
        /// When the light stopped.
        timestamp: DateTime<Utc>,
        /// Light name.
        light: String,
        /// Human-readable stop reason.
        reason: String,
        /// Total flips over the run.
        transitions: u64,
    },
}

// ---------------------------------------------------------------------------
// Envelope (adds sequence number via serde flatten)
// ---------------------------------------------------------------------------

/// Wraps an [`Event`] with a monotonically increasing sequence number.
#[derive(Debug, Serialize)]
struct EventEnvelope {
    /// Zero-based, monotonically increasing sequence counter.
    sequence: u64,
    /// The wrapped event (flattened into the same JSON object).
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// The sequence number is assigned under the writer lock, so lines appear in
/// the file in sequence order even when the cycling thread and the observer
/// emit concurrently. Serialization or I/O failures are dropped; a broken
/// event sink must not stop the light.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

// Box<dyn Write> is not Debug, so this one is written by hand.
impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that writes to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Creates an emitter that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or opened.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let Ok(mut w) = self.writer.lock() else {
            return;
        };
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };
        if let Ok(line) = serde_json::to_string(&envelope) {
            let _ = writeln!(w, "{line}");
            let _ = w.flush();
        }
    }

    /// Returns the number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
