//! `trafficlight` core: the message queue, phase and configuration types
//!
//! This crate holds the pieces that carry no runtime policy: the generic
//! blocking [`queue::MessageQueue`], the [`phase::LightPhase`] value type,
//! and the serde schema for light configuration files. The `trafficlight`
//! crate builds the cycling actor, CLI and observability on top of it.

pub mod config;
pub mod error;
pub mod phase;
pub mod queue;

pub use phase::LightPhase;
pub use queue::MessageQueue;
