//! Shared light state
//!
//! Lock-free phase storage read by observers and written by the cycling
//! thread, plus the stop signal the cycling thread waits on.

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

use trafficlight_core::LightPhase;

/// Atomic phase cell.
///
/// Stores the phase as `LightPhase::as_u8` in an `AtomicU8`, so
/// [`load`](Self::load) never observes a torn or unsynchronized value.
/// Also counts flips.
pub struct PhaseCell {
    /// Current phase encoding (0 = red, 1 = green)
    phase: AtomicU8,
    /// Number of flips since creation
    transitions: AtomicU64,
}

impl PhaseCell {
    /// Creates a cell holding `initial`.
    #[must_use]
    pub const fn new(initial: LightPhase) -> Self {
        Self {
            phase: AtomicU8::new(initial.as_u8()),
            transitions: AtomicU64::new(0),
        }
    }

    /// Returns the current phase.
    #[must_use]
    pub fn load(&self) -> LightPhase {
        LightPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Flips the phase and returns the new value.
    ///
    /// The flip is a single `fetch_xor`, so concurrent flips can never
    /// produce two identical consecutive phases.
    pub fn toggle(&self) -> LightPhase {
        let previous = self.phase.fetch_xor(1, Ordering::AcqRel);
        self.transitions.fetch_add(1, Ordering::Relaxed);
        LightPhase::from_u8(previous).toggled()
    }

    /// Returns the number of flips so far.
    #[must_use]
    pub fn transitions(&self) -> u64 {
        self.transitions.load(Ordering::Relaxed)
    }
}

impl Default for PhaseCell {
    fn default() -> Self {
        Self::new(LightPhase::Red)
    }
}

impl std::fmt::Debug for PhaseCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseCell")
            .field("phase", &self.load())
            .field("transitions", &self.transitions())
            .finish()
    }
}

/// One-shot cancellation signal with a timed wait.
///
/// The cycling thread sleeps through [`wait_timeout`](Self::wait_timeout)
/// instead of `thread::sleep`, so [`stop`](Self::stop) interrupts it
/// immediately in both polling and sleep modes.
#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: Mutex<bool>,
    changed: Condvar,
}

impl StopSignal {
    /// Creates an unsignalled stop flag.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stopped: Mutex::new(false),
            changed: Condvar::new(),
        }
    }

    /// Raises the flag and wakes every waiter. Idempotent.
    pub fn stop(&self) {
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.changed.notify_all();
    }

    /// Returns `true` once [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits up to `timeout` for the flag.
    ///
    /// Returns `true` if the flag is raised, `false` if the full timeout
    /// elapsed. Spurious wakeups are absorbed by `wait_timeout_while`.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.stopped.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .changed
            .wait_timeout_while(guard, timeout, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_new_cell() {
        let cell = PhaseCell::default();
        assert_eq!(cell.load(), LightPhase::Red);
        assert_eq!(cell.transitions(), 0);
    }

    #[test]
    fn test_toggle_alternates_and_counts() {
        let cell = PhaseCell::new(LightPhase::Red);
        assert_eq!(cell.toggle(), LightPhase::Green);
        assert_eq!(cell.load(), LightPhase::Green);
        assert_eq!(cell.toggle(), LightPhase::Red);
        assert_eq!(cell.load(), LightPhase::Red);
        assert_eq!(cell.transitions(), 2);
    }

    #[test]
    fn test_concurrent_toggles_are_not_lost() {
        let cell = Arc::new(PhaseCell::new(LightPhase::Red));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = Arc::clone(&cell);
                thread::spawn(move || {
                    for _ in 0..125 {
                        c.toggle();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        // 1000 flips is even, so the light is back to red
        assert_eq!(cell.transitions(), 1000);
        assert_eq!(cell.load(), LightPhase::Red);
    }

    #[test]
    fn test_stop_signal_times_out_when_not_stopped() {
        let signal = StopSignal::new();
        let start = Instant::now();
        assert!(!signal.wait_timeout(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
        assert!(!signal.is_stopped());
    }

    #[test]
    fn test_stop_wakes_waiter_early() {
        let signal = Arc::new(StopSignal::new());
        let waiter = {
            let s = Arc::clone(&signal);
            thread::spawn(move || {
                let start = Instant::now();
                let stopped = s.wait_timeout(Duration::from_secs(30));
                (stopped, start.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(20));
        signal.stop();
        let (stopped, waited) = waiter.join().unwrap();
        assert!(stopped);
        assert!(waited < Duration::from_secs(5));
    }

    #[test]
    fn test_stop_is_sticky() {
        let signal = StopSignal::new();
        signal.stop();
        signal.stop();
        assert!(signal.is_stopped());
        assert!(signal.wait_timeout(Duration::from_secs(30)));
    }
}
