//! Configuration schema for traffic lights.

pub mod schema;

pub use schema::*;
