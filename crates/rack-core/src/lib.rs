//! # rack-core
//!
//! Core types for the Rack warehouse engine.
//!
//! A warehouse is a fixed grid of shelves addressed by column and height.
//! Every shelf holds a bounded stack of boxes, newest at the front. Tasks
//! (pick, move, store, check, reserve) are raised against boxes and walk a
//! forward-only lifecycle.
//!
//! ## Core Paradigm
//!
//! - A position is (column, height, stack slot) and is only ever a snapshot
//! - Capacity is enforced per shelf, never truncated
//! - Box task flags are derived from open tasks, never set directly
//! - Every state change leaves an audit movement behind

pub mod config;
mod error;
mod types;

pub use config::{RackConfig, StatsConfig, TaskEstimates};
pub use error::{RackError, Result};
pub use types::*;
