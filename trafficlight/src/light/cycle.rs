//! Phase cycling loop
//!
//! The body of the background thread: draw a random cycle length, wait it
//! out, flip the phase, push the new phase into the queue, repeat until the
//! stop signal is raised.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};
use trafficlight_core::config::{CycleMode, LightConfig, duration_ms};
use trafficlight_core::{LightPhase, MessageQueue};

use super::state::{PhaseCell, StopSignal};
use crate::observability::metrics;

/// Floor for the polling quantum; a zero interval would spin.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// A single phase flip, as reported to a [`PhaseObserver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    /// Phase the light switched to
    pub phase: LightPhase,
    /// Length of the cycle that just ended
    pub cycle: Duration,
    /// 1-based flip counter
    pub transition: u64,
}

/// Callback invoked on the cycling thread after every flip.
///
/// Runs after the new phase is visible through `current_phase` and queued,
/// so it must not block for long.
pub type PhaseObserver = Arc<dyn Fn(&PhaseChange) + Send + Sync>;

// ============================================================================
// Cycle Timer
// ============================================================================

/// Draws cycle lengths uniformly from `[min_cycle, max_cycle]` in whole
/// milliseconds.
#[derive(Debug)]
pub struct CycleTimer {
    rng: StdRng,
    min_ms: u64,
    max_ms: u64,
}

impl CycleTimer {
    /// Creates a timer for `config`'s bounds.
    ///
    /// Uses `config.seed` when present, otherwise seeds from the thread RNG.
    /// Reversed bounds are swapped rather than rejected.
    #[must_use]
    pub fn new(config: &LightConfig) -> Self {
        let (a, b) = config.cycle_bounds_ms();
        let (min_ms, max_ms) = if a <= b { (a, b) } else { (b, a) };
        let rng = config
            .seed
            .map_or_else(|| StdRng::from_rng(&mut rand::rng()), StdRng::seed_from_u64);
        Self {
            rng,
            min_ms,
            max_ms,
        }
    }

    /// Draws the next cycle length.
    pub fn next_cycle(&mut self) -> Duration {
        Duration::from_millis(self.rng.random_range(self.min_ms..=self.max_ms))
    }

    /// Returns the inclusive bounds in use.
    #[must_use]
    pub const fn bounds(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.min_ms),
            Duration::from_millis(self.max_ms),
        )
    }
}

// ============================================================================
// Cycle Loop
// ============================================================================

/// State owned by the cycling thread.
pub(crate) struct CycleLoop {
    pub(crate) name: String,
    pub(crate) mode: CycleMode,
    pub(crate) poll_interval: Duration,
    pub(crate) timer: CycleTimer,
    pub(crate) phase: Arc<PhaseCell>,
    pub(crate) queue: Arc<MessageQueue<LightPhase>>,
    pub(crate) stop: Arc<StopSignal>,
    pub(crate) observer: Option<PhaseObserver>,
}

impl CycleLoop {
    /// Runs until the stop signal is raised.
    pub(crate) fn run(mut self) {
        let (min, max) = self.timer.bounds();
        info!(
            light = %self.name,
            mode = %self.mode,
            min_cycle_ms = duration_ms(min),
            max_cycle_ms = duration_ms(max),
            "cycling started"
        );

        match self.mode {
            CycleMode::Polling => self.run_polling(),
            CycleMode::Sleep => self.run_sleeping(),
        }

        info!(
            light = %self.name,
            transitions = self.phase.transitions(),
            "cycling stopped"
        );
    }

    /// Wakes every `poll_interval` and flips once the elapsed time since the
    /// last flip reaches the current cycle length.
    fn run_polling(&mut self) {
        let poll = self.poll_interval.max(MIN_POLL_INTERVAL);
        let mut cycle = self.timer.next_cycle();
        let mut last_flip = Instant::now();
        trace!(light = %self.name, cycle_ms = duration_ms(cycle), "first cycle drawn");

        while !self.stop.wait_timeout(poll) {
            let now = Instant::now();
            if now.duration_since(last_flip) >= cycle {
                self.flip(cycle);
                last_flip = now;
                cycle = self.timer.next_cycle();
            }
        }
    }

    /// Waits out each cycle in a single timed wait.
    fn run_sleeping(&mut self) {
        loop {
            let cycle = self.timer.next_cycle();
            if self.stop.wait_timeout(cycle) {
                return;
            }
            self.flip(cycle);
        }
    }

    /// Publishes the next phase: atomic store first, then the queue, so a
    /// receiver that sees a value in the queue also sees it in the cell.
    fn flip(&self, cycle: Duration) {
        let phase = self.phase.toggle();
        self.queue.send(phase);
        let transition = self.phase.transitions();

        debug!(
            light = %self.name,
            %phase,
            cycle_ms = duration_ms(cycle),
            transition,
            "phase changed"
        );
        metrics::record_phase_transition(phase, cycle);
        metrics::set_current_phase(phase);

        if let Some(observer) = &self.observer {
            observer(&PhaseChange {
                phase,
                cycle,
                transition,
            });
        }
    }
}
