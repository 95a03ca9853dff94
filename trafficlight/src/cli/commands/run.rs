//! `trafficlight run`
//!
//! Starts one light, observes greens on a blocking worker, and stops on the
//! first of: the requested number of greens, the requested duration, or
//! Ctrl+C.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::cli::args::RunArgs;
use crate::config::{ConfigLoader, LightConfig, LoadResult, apply_env_overrides, read_file};
use crate::error::{ConfigError, LightError, TrafficLightError};
use crate::light::{PhaseChange, PhaseObserver, TrafficLight};
use crate::observability::metrics::{init_metrics, record_green_observed};
use crate::observability::{Event, EventEmitter};
use trafficlight_core::config::duration_ms;

/// How long the observer blocks before rechecking the stop flag.
const OBSERVE_SLICE: Duration = Duration::from_millis(250);

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    GreensReached,
    DurationElapsed,
    Interrupted,
}

impl StopReason {
    const fn as_str(self) -> &'static str {
        match self {
            Self::GreensReached => "greens reached",
            Self::DurationElapsed => "duration elapsed",
            Self::Interrupted => "interrupted",
        }
    }
}

/// Run a light until a stop condition is met.
///
/// # Errors
///
/// Returns a configuration error if the resolved configuration is invalid,
/// an I/O error if the event file or metrics listener cannot be opened, and
/// a light error if the cycling thread fails to start or panics.
pub async fn run(args: &RunArgs, quiet: bool) -> Result<(), TrafficLightError> {
    let LoadResult { config, .. } = resolve_config(args, |key| std::env::var(key).ok())?;

    if let Some(port) = args.metrics_port {
        init_metrics(Some(port))?;
        info!(port, "metrics listener started");
    }

    let events_to_stdout = args.events_file.as_deref().is_some_and(|p| p.as_os_str() == "-");
    let events = match args.events_file.as_deref() {
        None => None,
        Some(_) if events_to_stdout => Some(Arc::new(EventEmitter::stdout())),
        Some(path) => Some(Arc::new(EventEmitter::from_file(path)?)),
    };

    let name = config.display_name().to_string();
    let (min_cycle_ms, max_cycle_ms) = config.cycle_bounds_ms();
    let mode = config.mode;

    let mut light = TrafficLight::with_config(config);
    if let Some(emitter) = &events {
        light = light.with_observer(phase_events(Arc::clone(emitter), name.clone()));
    }
    let light = Arc::new(light);

    // Emitted before the thread exists so it precedes every PhaseChanged
    if let Some(emitter) = &events {
        emitter.emit(Event::LightStarted {
            timestamp: Utc::now(),
            light: name.clone(),
            mode: mode.to_string(),
            min_cycle_ms,
            max_cycle_ms,
        });
    }

    light.start()?;
    info!(light = %name, %mode, min_cycle_ms, max_cycle_ms, "light started");

    let stop = Arc::new(AtomicBool::new(false));
    let mut observer = tokio::task::spawn_blocking({
        let light = Arc::clone(&light);
        let stop = Arc::clone(&stop);
        let events = events.clone();
        let target = args.greens;
        move || observe_greens(&light, &stop, target, events.as_deref())
    });

    let deadline = async {
        match args.duration {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending().await,
        }
    };

    let (reason, finished) = tokio::select! {
        joined = &mut observer => (StopReason::GreensReached, Some(joined)),
        () = deadline => (StopReason::DurationElapsed, None),
        Ok(()) = tokio::signal::ctrl_c() => (StopReason::Interrupted, None),
    };
    debug!(reason = reason.as_str(), "stopping run");

    stop.store(true, Ordering::Release);
    let joined = match finished {
        Some(joined) => joined,
        None => observer.await,
    };
    let greens = joined.map_err(|_| LightError::ThreadPanicked)?;

    let shutdown = tokio::task::spawn_blocking({
        let light = Arc::clone(&light);
        move || light.shutdown()
    });
    shutdown.await.map_err(|_| LightError::ThreadPanicked)??;

    let transitions = light.transitions();
    if let Some(emitter) = &events {
        emitter.emit(Event::LightStopped {
            timestamp: Utc::now(),
            light: name.clone(),
            reason: reason.as_str().to_string(),
            transitions,
        });
    }

    if !quiet && !events_to_stdout {
        println!(
            "{name}: {greens} green(s) observed over {transitions} transition(s) ({})",
            reason.as_str()
        );
    }
    Ok(())
}

/// Resolves the light configuration: file, then environment, then flags.
fn resolve_config<F>(args: &RunArgs, env: F) -> Result<LoadResult, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let (source, mut config) = match &args.config {
        Some(path) => (path.display().to_string(), read_file(path)?),
        None => ("<defaults>".to_string(), LightConfig::default()),
    };
    apply_env_overrides(&mut config, env)?;
    apply_cli_overrides(&mut config, args);
    ConfigLoader::new().finish(&source, config)
}

fn apply_cli_overrides(config: &mut LightConfig, args: &RunArgs) {
    if let Some(name) = &args.name {
        config.name = Some(name.clone());
    }
    if let Some(min) = args.min_cycle {
        config.min_cycle = min;
    }
    if let Some(max) = args.max_cycle {
        config.max_cycle = max;
    }
    if let Some(poll) = args.poll_interval {
        config.poll_interval = poll;
    }
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
}

/// Emits a `PhaseChanged` event for every flip.
fn phase_events(emitter: Arc<EventEmitter>, light: String) -> PhaseObserver {
    Arc::new(move |change: &PhaseChange| {
        emitter.emit(Event::PhaseChanged {
            timestamp: Utc::now(),
            light: light.clone(),
            phase: change.phase,
            cycle_ms: duration_ms(change.cycle),
            transition: change.transition,
        });
    })
}

/// Counts greens until `target` is reached or `stop` is raised.
fn observe_greens(
    light: &TrafficLight,
    stop: &AtomicBool,
    target: Option<u64>,
    events: Option<&EventEmitter>,
) -> u64 {
    let mut count = 0;
    while !stop.load(Ordering::Acquire) {
        if light.wait_for_green_timeout(OBSERVE_SLICE).is_err() {
            continue;
        }
        count += 1;
        record_green_observed();
        info!(light = %light.name(), count, "green observed");
        if let Some(emitter) = events {
            emitter.emit(Event::GreenObserved {
                timestamp: Utc::now(),
                light: light.name().to_string(),
                count,
            });
        }
        if target.is_some_and(|t| count >= t) {
            break;
        }
    }
    count
}
