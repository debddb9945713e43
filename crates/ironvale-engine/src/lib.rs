//! # Ironvale Engine
//!
//! Headless driver for the Ironvale simulation core.
//!
//! This crate ties the gameplay systems into a runnable program:
//! - Harness configuration (`ironvale.toml`)
//! - Fixed timestep pacing
//! - Scripted arena run with an autopilot player and a JSON run summary

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod harness;
pub mod timing;

pub use config::{SimConfig, CONFIG_FILE};
pub use harness::{run, RunSummary};
