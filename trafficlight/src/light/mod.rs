//! Traffic light actor
//!
//! A light is a two-phase state machine (red ⇄ green) driven by its own
//! thread and observed through a blocking queue.
//!
//! # Architecture
//!
//! - [`TrafficLight`]: Lifecycle (`start`/`shutdown`) and the observer API
//! - [`cycle`]: Randomized cycle timer and the background loop
//! - [`state`]: Atomic phase cell and the stop signal

pub mod actor;
pub mod cycle;
pub mod state;

pub use actor::TrafficLight;
pub use cycle::{CycleTimer, PhaseChange, PhaseObserver};
pub use state::{PhaseCell, StopSignal};
pub use trafficlight_core::LightPhase;
