//! Tidecast core library
//!
//! Answers "what is the water level right now (or over a date range) at a
//! given coastal station", sourcing raw predictions from NOAA, normalizing
//! them across fixed-offset station time zones, caching whole local days,
//! and interpolating the values the provider does not give directly.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod http;
pub mod service;
pub mod station;

pub use config::Config;
pub use service::{TideError, TideService};
