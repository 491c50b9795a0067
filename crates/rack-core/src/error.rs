//! Unified error types for Rack

use thiserror::Error;

use crate::types::{Shelf, TaskStatus};

/// Unified error type for all Rack operations
#[derive(Error, Debug)]
pub enum RackError {
    // Lookup errors
    #[error("Box not found: {0}")]
    BoxNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    // Placement errors
    #[error("Warehouse full: no shelf has a free slot")]
    WarehouseFull,

    #[error("Destination shelf {0} is full")]
    DestinationFull(Shelf),

    #[error("Shelf {0} is full")]
    ShelfFull(Shelf),

    #[error("Shelf {0} is outside the warehouse")]
    OutOfBounds(Shelf),

    #[error("Box already stored: {0}")]
    DuplicateBox(String),

    // Box validation errors
    #[error("Invalid box: {0}")]
    InvalidBox(String),

    #[error("Expiry of {0} days is out of range")]
    InvalidExpiry(i64),

    // Task errors
    #[error("Task already exists: {0}")]
    DuplicateTask(String),

    #[error("Box position unknown: {0}")]
    BoxPositionUnknown(String),

    #[error("Invalid transition for task {task_id}: {from} -> {to}")]
    InvalidTransition {
        task_id: String,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RackError {
    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            Self::BoxNotFound(_) | Self::TaskNotFound(_) => "not_found",
            Self::WarehouseFull => "warehouse_full",
            Self::DestinationFull(_) => "destination_full",
            Self::ShelfFull(_) => "shelf_full",
            Self::OutOfBounds(_) => "out_of_bounds",
            Self::DuplicateBox(_) => "duplicate_box",
            Self::InvalidBox(_) => "invalid_box",
            Self::InvalidExpiry(_) => "invalid_expiry",
            Self::DuplicateTask(_) => "duplicate_task",
            Self::BoxPositionUnknown(_) => "box_position_unknown",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::InvalidFilter(_) => "invalid_filter",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
        }
    }
}

/// Result type alias using RackError
pub type Result<T> = std::result::Result<T, RackError>;
