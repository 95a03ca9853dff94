//! Traffic light actor
//!
//! [`TrafficLight`] owns a phase cell, a `MessageQueue<LightPhase>` and a
//! background thread that flips the phase on a randomized interval. Every
//! flip is stored atomically and pushed into the queue; observers either
//! read the latest phase or block on the queue until a green arrives.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};
use trafficlight_core::config::LightConfig;
use trafficlight_core::{LightPhase, MessageQueue};

use super::cycle::{CycleLoop, CycleTimer, PhaseObserver};
use super::state::{PhaseCell, StopSignal};
use crate::error::LightError;

/// A traffic light cycling between red and green on its own thread.
///
/// Lifecycle: created red and idle, [`start`](Self::start) spawns the
/// cycling thread once, [`shutdown`](Self::shutdown) (or drop) stops and
/// joins it.
///
/// # Consumers
///
/// Every flip is queued once and handed to exactly one receiver. With a
/// single observer calling [`wait_for_green`](Self::wait_for_green) this
/// fast-forwards through stale reds to the next green. With several
/// observers each flip goes to whichever observer receives first, so one
/// observer can swallow a green another was waiting for. Observers that each
/// need every green should use [`with_observer`](Self::with_observer) or
/// one light per observer.
pub struct TrafficLight {
    /// Configuration the light was built with
    config: LightConfig,
    /// Current phase, written only by the cycling thread
    phase: Arc<PhaseCell>,
    /// Phase changes in flip order
    queue: Arc<MessageQueue<LightPhase>>,
    /// Raised by `shutdown`
    stop: Arc<StopSignal>,
    /// Set by the first `start`; never cleared
    started: AtomicBool,
    /// Cycling thread handle, taken by `shutdown`
    worker: Mutex<Option<JoinHandle<()>>>,
    /// Optional per-flip callback
    observer: Option<PhaseObserver>,
}

impl TrafficLight {
    /// Creates an idle red light with default timing (4–6 s cycles, 1 ms
    /// polling).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LightConfig::default())
    }

    /// Creates an idle red light with the given timing.
    #[must_use]
    pub fn with_config(config: LightConfig) -> Self {
        Self {
            config,
            phase: Arc::new(PhaseCell::new(LightPhase::Red)),
            queue: Arc::new(MessageQueue::new()),
            stop: Arc::new(StopSignal::new()),
            started: AtomicBool::new(false),
            worker: Mutex::new(None),
            observer: None,
        }
    }

    /// Installs a callback run on the cycling thread after every flip.
    ///
    /// Unlike the queue, the callback sees every flip regardless of how many
    /// threads are waiting on the light.
    #[must_use]
    pub fn with_observer(mut self, observer: PhaseObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Returns the light's configuration.
    #[must_use]
    pub const fn config(&self) -> &LightConfig {
        &self.config
    }

    /// Returns the light's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.config.display_name()
    }

    /// Returns the phase at the moment of the call. Never blocks.
    #[must_use]
    pub fn current_phase(&self) -> LightPhase {
        self.phase.load()
    }

    /// Returns the number of flips so far.
    #[must_use]
    pub fn transitions(&self) -> u64 {
        self.phase.transitions()
    }

    /// Returns the number of queued phase changes no one has received yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` while the cycling thread is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::Acquire) && !self.stop.is_stopped()
    }

    /// Spawns the cycling thread.
    ///
    /// A light runs at most once: calling `start` again, even after
    /// [`shutdown`](Self::shutdown), is an error rather than a second loop.
    ///
    /// # Errors
    ///
    /// Returns [`LightError::AlreadyStarted`] on a repeated call, or
    /// [`LightError::Spawn`] if the name cannot be used as a thread name or
    /// the OS refuses to create the thread.
    pub fn start(&self) -> Result<(), LightError> {
        if self.started.swap(true, Ordering::AcqRel) {
            warn!(light = %self.name(), "start called on a light that is already started");
            return Err(LightError::AlreadyStarted(self.name().to_string()));
        }

        let thread_name = format!("trafficlight-{}", self.name());
        if thread_name.contains('\0') {
            self.started.store(false, Ordering::Release);
            return Err(LightError::Spawn(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "light name contains a NUL byte",
            )));
        }

        let cycle = CycleLoop {
            name: self.name().to_string(),
            mode: self.config.mode,
            poll_interval: self.config.poll_interval,
            timer: CycleTimer::new(&self.config),
            phase: Arc::clone(&self.phase),
            queue: Arc::clone(&self.queue),
            stop: Arc::clone(&self.stop),
            observer: self.observer.clone(),
        };

        let handle = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || cycle.run())
            .map_err(|e| {
                self.started.store(false, Ordering::Release);
                LightError::Spawn(e)
            })?;

        *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        debug!(light = %self.name(), "cycling thread spawned");
        Ok(())
    }

    /// Stops the cycling thread and waits for it to exit. Idempotent, and a
    /// no-op on a light that was never started.
    ///
    /// Threads blocked in [`wait_for_green`](Self::wait_for_green) are not
    /// woken; use the timeout variants if they must observe shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`LightError::ThreadPanicked`] if the cycling thread panicked.
    pub fn shutdown(&self) -> Result<(), LightError> {
        self.stop.stop();
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            handle.join().map_err(|_| LightError::ThreadPanicked)?;
            info!(
                light = %self.name(),
                transitions = self.transitions(),
                "light shut down"
            );
        }
        Ok(())
    }

    /// Blocks until a green phase is received from the queue.
    ///
    /// Queued reds are consumed and discarded. Returns immediately if a green
    /// is already queued, even if the light has since turned red again.
    pub fn wait_for_green(&self) {
        loop {
            let phase = self.queue.receive();
            if phase.is_green() {
                return;
            }
            trace!(light = %self.name(), "discarding red while waiting for green");
        }
    }

    /// Like [`wait_for_green`](Self::wait_for_green) with an overall deadline.
    ///
    /// # Errors
    ///
    /// Returns [`LightError::Timeout`] if no green is received within
    /// `timeout`. Reds received before the deadline are still consumed.
    pub fn wait_for_green_timeout(&self, timeout: Duration) -> Result<(), LightError> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait_for_green();
            return Ok(());
        };

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.queue.receive_timeout(remaining) {
                Some(LightPhase::Green) => return Ok(()),
                Some(LightPhase::Red) => {
                    trace!(light = %self.name(), "discarding red while waiting for green");
                }
                None => return Err(LightError::Timeout { waited: timeout }),
            }
        }
    }

    /// Blocks until the next queued phase change and returns it unfiltered.
    pub fn next_phase(&self) -> LightPhase {
        self.queue.receive()
    }

    /// Like [`next_phase`](Self::next_phase), giving up after `timeout`.
    pub fn next_phase_timeout(&self, timeout: Duration) -> Option<LightPhase> {
        self.queue.receive_timeout(timeout)
    }
}

impl Default for TrafficLight {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TrafficLight {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(light = %self.name(), error = %e, "error while dropping light");
        }
    }
}

impl std::fmt::Debug for TrafficLight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrafficLight")
            .field("name", &self.name())
            .field("phase", &self.current_phase())
            .field("transitions", &self.transitions())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::cycle::PhaseChange;
    use std::sync::atomic::AtomicU64;
    use trafficlight_core::config::CycleMode;

    fn fast_config() -> LightConfig {
        LightConfig::default()
            .with_name("fast")
            .with_cycle(Duration::from_millis(20), Duration::from_millis(40))
    }

    #[test]
    fn test_new_light_is_red_and_idle() {
        let light = TrafficLight::new();
        assert_eq!(light.current_phase(), LightPhase::Red);
        assert_eq!(light.transitions(), 0);
        assert_eq!(light.pending(), 0);
        assert!(!light.is_running());
        assert_eq!(light.name(), "light");
    }

    #[test]
    fn test_double_start_is_rejected() {
        let light = TrafficLight::with_config(fast_config());
        light.start().unwrap();
        assert!(light.is_running());

        let err = light.start().unwrap_err();
        assert!(matches!(err, LightError::AlreadyStarted(ref name) if name == "fast"));
        light.shutdown().unwrap();
    }

    #[test]
    fn test_start_after_shutdown_is_rejected() {
        let light = TrafficLight::with_config(fast_config());
        light.start().unwrap();
        light.shutdown().unwrap();
        assert!(!light.is_running());
        assert!(matches!(light.start(), Err(LightError::AlreadyStarted(_))));
    }

    #[test]
    fn test_nul_in_name_fails_start_without_consuming_it() {
        let light = TrafficLight::with_config(LightConfig::default().with_name("a\0b"));
        let err = light.start().unwrap_err();
        match err {
            LightError::Spawn(e) => assert_eq!(e.kind(), std::io::ErrorKind::InvalidInput),
            other => panic!("expected Spawn, got {other:?}"),
        }
        assert!(!light.is_running());
        // A failed start does not count as the one allowed start
        assert!(matches!(light.start(), Err(LightError::Spawn(_))));
        light.shutdown().unwrap();
    }

    #[test]
    fn test_shutdown_without_start_is_noop() {
        let light = TrafficLight::new();
        light.shutdown().unwrap();
        light.shutdown().unwrap();
    }

    #[test]
    fn test_wait_for_green_then_current_phase_is_green() {
        let light = TrafficLight::with_config(fast_config());
        light.start().unwrap();
        light.wait_for_green();
        assert_eq!(light.current_phase(), LightPhase::Green);
        light.shutdown().unwrap();
    }

    #[test]
    fn test_wait_for_green_skips_queued_reds() {
        let light = TrafficLight::with_config(fast_config().with_mode(CycleMode::Sleep));
        light.start().unwrap();

        // Let several flips queue up, then wait: the call must return on a
        // queued green without blocking for a fresh one.
        while light.transitions() < 4 {
            std::thread::sleep(Duration::from_millis(5));
        }
        light.shutdown().unwrap();
        let queued = light.pending();
        assert!(queued >= 4);

        light.wait_for_green();
        assert_eq!(light.pending(), queued - 1, "first queued change is green");
        light.wait_for_green_timeout(Duration::from_millis(10)).unwrap();
        assert_eq!(light.pending(), queued - 3, "red skipped, green consumed");
    }

    #[test]
    fn test_wait_for_green_timeout_on_idle_light() {
        let light = TrafficLight::new();
        let err = light
            .wait_for_green_timeout(Duration::from_millis(30))
            .unwrap_err();
        assert!(matches!(err, LightError::Timeout { waited } if waited == Duration::from_millis(30)));
    }

    #[test]
    fn test_next_phase_strictly_alternates() {
        let light = TrafficLight::with_config(fast_config());
        light.start().unwrap();

        let mut expected = LightPhase::Green;
        for _ in 0..6 {
            let phase = light
                .next_phase_timeout(Duration::from_secs(2))
                .expect("light stalled");
            assert_eq!(phase, expected);
            expected = expected.toggled();
        }
        light.shutdown().unwrap();
    }

    #[test]
    fn test_shutdown_is_prompt_in_both_modes() {
        for mode in [CycleMode::Polling, CycleMode::Sleep] {
            // Default 4–6 s cycles: shutdown must not wait a cycle out
            let light = TrafficLight::with_config(LightConfig::default().with_mode(mode));
            light.start().unwrap();
            std::thread::sleep(Duration::from_millis(20));

            let start = Instant::now();
            light.shutdown().unwrap();
            assert!(
                start.elapsed() < Duration::from_millis(500),
                "{mode} shutdown took {:?}",
                start.elapsed()
            );
        }
    }

    #[test]
    fn test_drop_joins_thread() {
        let flips = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&flips);
        let light = TrafficLight::with_config(fast_config()).with_observer(Arc::new(
            move |_: &PhaseChange| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        ));
        light.start().unwrap();
        light.wait_for_green();
        drop(light);

        // The thread is joined, so the count can no longer move
        let after_drop = flips.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(flips.load(Ordering::SeqCst), after_drop);
        assert!(after_drop >= 1);
    }

    #[test]
    fn test_debug_output() {
        let light = TrafficLight::with_config(fast_config());
        let debug = format!("{light:?}");
        assert!(debug.contains("TrafficLight"));
        assert!(debug.contains("fast"));
        assert!(debug.contains("Red"));
    }
}
