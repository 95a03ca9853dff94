//! Metrics collection for `trafficlight`.
//!
//! Prometheus-compatible metrics through the `metrics` facade. The record
//! functions are safe to call before (or without) [`init_metrics`]; the
//! macros no-op when no recorder is installed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use trafficlight_core::LightPhase;

use crate::error::TrafficLightError;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without an
/// HTTP endpoint.
///
/// The HTTP listener is spawned on the ambient Tokio runtime, so call this
/// from inside one when `port` is set.
///
/// # Errors
///
/// Returns `TrafficLightError::Io` if the recorder or HTTP listener cannot
/// be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), TrafficLightError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    let installed = port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    );
    if let Err(e) = installed {
        // Nothing was installed, so a later call may try again
        METRICS_INITIALIZED.store(false, Ordering::SeqCst);
        return Err(TrafficLightError::Io(std::io::Error::other(e.to_string())));
    }

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!(
        "trafficlight_phase_transitions_total",
        "Total number of phase flips, labelled by the phase entered"
    );
    describe_gauge!(
        "trafficlight_current_phase",
        "Current phase (0 = red, 1 = green)"
    );
    describe_histogram!(
        "trafficlight_cycle_duration_ms",
        "Length of each completed cycle in milliseconds"
    );
    describe_counter!(
        "trafficlight_greens_observed_total",
        "Green phases received by observers"
    );
}

/// Records a phase flip and the length of the cycle that ended with it.
pub fn record_phase_transition(entered: LightPhase, cycle: Duration) {
    counter!("trafficlight_phase_transitions_total", "phase" => entered.as_str()).increment(1);
    histogram!("trafficlight_cycle_duration_ms").record(cycle.as_secs_f64() * 1000.0);
}

/// Sets the current phase gauge.
pub fn set_current_phase(phase: LightPhase) {
    gauge!("trafficlight_current_phase").set(f64::from(phase.as_u8()));
}

/// Records a green received by an observer.
pub fn record_green_observed() {
    counter!("trafficlight_greens_observed_total").increment(1);
}
