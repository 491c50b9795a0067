//! Configuration management for Rack
//!
//! Warehouse geometry, task estimates and stats windows, loaded from
//! `.rack/config.toml` under a root directory. Every field has a default, so
//! a partial file (or none at all) is valid.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::types::{Geometry, TaskKind};
use crate::{RackError, Result};

/// Repository-level Rack configuration
///
/// Loaded from `.rack/config.toml` in the root directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RackConfig {
    /// Operator stamped on boxes, tasks and movements until changed
    #[serde(default = "default_operator")]
    pub default_operator: String,

    /// Warehouse dimensions
    #[serde(default)]
    pub geometry: Geometry,

    /// Task estimate table
    #[serde(default)]
    pub tasks: TaskEstimates,

    /// Statistics settings
    #[serde(default)]
    pub stats: StatsConfig,
}

/// Estimated minutes per task kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEstimates {
    #[serde(default = "default_pick_minutes")]
    pub pick: u32,
    #[serde(default = "default_move_minutes")]
    pub r#move: u32,
    /// Store, check and reserve
    #[serde(default = "default_other_minutes")]
    pub other: u32,
}

/// Statistics settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Boxes expiring within this many days count as "expiring soon"
    #[serde(default = "default_expiring_window_days")]
    pub expiring_window_days: i64,
}

// Default value providers
fn default_operator() -> String {
    "operator".to_string()
}

fn default_pick_minutes() -> u32 {
    TaskKind::Pick.default_estimate_minutes()
}

fn default_move_minutes() -> u32 {
    TaskKind::Move.default_estimate_minutes()
}

fn default_other_minutes() -> u32 {
    TaskKind::Check.default_estimate_minutes()
}

fn default_expiring_window_days() -> i64 {
    7
}

impl RackConfig {
    /// Load configuration from `.rack/config.toml` or use defaults
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let config_path = root.join(".rack/config.toml");

        let config = if config_path.exists() {
            debug!("Loading config from {}", config_path.display());
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)
                .map_err(|e| RackError::Config(format!("Failed to parse config file: {}", e)))?
        } else {
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Write default configuration to `.rack/config.toml`
    pub fn write_default(root: &Path) -> Result<()> {
        let config_dir = root.join(".rack");
        std::fs::create_dir_all(&config_dir)?;

        let config_path = config_dir.join("config.toml");
        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| RackError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.geometry.validate()?;
        let days = self.stats.expiring_window_days;
        if days < 0 {
            return Err(RackError::Config(format!(
                "expiring_window_days must not be negative: {}",
                days
            )));
        }
        if Duration::try_days(days).is_none() {
            return Err(RackError::Config(format!(
                "expiring_window_days is out of range: {}",
                days
            )));
        }
        Ok(())
    }
}

impl TaskEstimates {
    pub fn minutes_for(&self, kind: TaskKind) -> u32 {
        match kind {
            TaskKind::Pick => self.pick,
            TaskKind::Move => self.r#move,
            TaskKind::Store | TaskKind::Check | TaskKind::Reserve => self.other,
        }
    }
}

impl StatsConfig {
    /// Window as a duration, saturating for values `validate` would reject
    pub fn expiring_window(&self) -> Duration {
        Duration::try_days(self.expiring_window_days).unwrap_or(Duration::MAX)
    }
}

impl Default for RackConfig {
    fn default() -> Self {
        Self {
            default_operator: default_operator(),
            geometry: Geometry::default(),
            tasks: TaskEstimates::default(),
            stats: StatsConfig::default(),
        }
    }
}

impl Default for TaskEstimates {
    fn default() -> Self {
        Self {
            pick: default_pick_minutes(),
            r#move: default_move_minutes(),
            other: default_other_minutes(),
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            expiring_window_days: default_expiring_window_days(),
        }
    }
}
