//! # rack-engine
//!
//! Slot allocation and task lifecycle engine for Rack.
//!
//! This crate provides:
//! - A bounded shelf grid with first-fit and explicit placement
//! - Task lifecycle management coupled to box task flags
//! - An append-only movement log
//! - Box search, statistics and occupancy queries
//! - Serializable commands and a shared handle for concurrent callers

mod command;
mod depot;
mod grid;
mod movement;
mod query;
mod shared;
mod store;
mod tasks;

pub use command::{DepotCommand, DepotQuery, Outcome, Request};
pub use depot::Depot;
pub use grid::Grid;
pub use movement::MovementLog;
pub use query::{
    category_breakdown, compute_stats, filter_boxes, BoxFilter, CategoryShare, Stats, ALL,
};
pub use shared::SharedDepot;
pub use store::{Occupancy, OccupancyLevel, WarehouseStore};
pub use tasks::TaskEngine;
