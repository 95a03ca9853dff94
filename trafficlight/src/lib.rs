//! `trafficlight` - a traffic light phase actor
//!
//! A light flips between red and green on its own thread at randomized
//! intervals and hands every flip to observers through a blocking FIFO
//! queue (`trafficlight_core::MessageQueue`).

pub mod cli;
pub mod config;
pub mod error;
pub mod light;
pub mod observability;

pub use error::{LightError, TrafficLightError};
pub use light::{LightPhase, TrafficLight};
