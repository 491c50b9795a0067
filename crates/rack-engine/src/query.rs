//! Query and statistics engine
//!
//! Pure functions over the current store and task state. Nothing is cached;
//! every call recomputes from live data.

use chrono::{DateTime, Duration, Utc};
use rack_core::{BoxStatus, Category, Priority, RackError, Result, StorageBox, TaskStatus};
use serde::{Deserialize, Deserializer, Serialize};

use crate::store::WarehouseStore;
use crate::tasks::TaskEngine;

/// Filter value meaning "do not filter on this field"
pub const ALL: &str = "all";

/// Box search criteria, AND-combined
///
/// `None` on a categorical field means "all". When deserialized, a missing
/// field, `null` and `"all"` all read as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxFilter {
    /// Case-insensitive substring of reference, work order or client
    pub search: String,
    #[serde(deserialize_with = "deserialize_choice")]
    pub status: Option<BoxStatus>,
    #[serde(deserialize_with = "deserialize_choice")]
    pub priority: Option<Priority>,
    #[serde(deserialize_with = "deserialize_choice")]
    pub category: Option<Category>,
}

impl BoxFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a filter from presentation strings, where `"all"` disables a field
    pub fn parse(search: &str, status: &str, priority: &str, category: &str) -> Result<Self> {
        Ok(Self {
            search: search.to_string(),
            status: parse_choice(status)?,
            priority: parse_choice(priority)?,
            category: parse_choice(category)?,
        })
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_status(mut self, status: BoxStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    fn matches(&self, storage_box: &StorageBox, needle: &str) -> bool {
        (needle.is_empty() || storage_box.matches_search(needle))
            && self.status.map_or(true, |s| storage_box.status == s)
            && self.priority.map_or(true, |p| storage_box.priority == p)
            && self.category.map_or(true, |c| storage_box.category == c)
    }
}

fn parse_choice<T>(value: &str) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = String>,
{
    if value.is_empty() || value.eq_ignore_ascii_case(ALL) {
        return Ok(None);
    }
    value.parse::<T>().map(Some).map_err(RackError::InvalidFilter)
}

fn deserialize_choice<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr<Err = String>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(value) => parse_choice(&value).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Aggregate warehouse statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_boxes: usize,
    pub available_boxes: usize,
    pub reserved_boxes: usize,
    pub damaged_boxes: usize,
    pub in_transit_boxes: usize,
    pub error_boxes: usize,
    /// Expiring within the window, including already expired
    pub expiring_boxes: usize,
    pub pending_tasks: usize,
    pub in_progress_tasks: usize,
    /// Percentage of total capacity in use, rounded
    pub capacity_usage: u32,
    /// Shelves at capacity
    pub full_positions: usize,
}

impl Stats {
    pub fn count_for(&self, status: BoxStatus) -> usize {
        match status {
            BoxStatus::Available => self.available_boxes,
            BoxStatus::Reserved => self.reserved_boxes,
            BoxStatus::Damaged => self.damaged_boxes,
            BoxStatus::InTransit => self.in_transit_boxes,
            BoxStatus::Error => self.error_boxes,
        }
    }
}

/// Share of stored boxes in one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: Category,
    pub count: usize,
    /// Rounded percentage of all stored boxes; 0 for an empty warehouse
    pub percentage: u32,
}

/// Boxes matching `filter`, in scan order
pub fn filter_boxes(store: &WarehouseStore, filter: &BoxFilter) -> Vec<StorageBox> {
    let needle = filter.search.to_lowercase();
    store
        .boxes()
        .filter(|b| filter.matches(b, &needle))
        .cloned()
        .collect()
}

pub fn compute_stats(
    store: &WarehouseStore,
    tasks: &TaskEngine,
    now: DateTime<Utc>,
    expiring_window: Duration,
) -> Stats {
    let mut stats = Stats::default();

    for storage_box in store.boxes() {
        stats.total_boxes += 1;
        match storage_box.status {
            BoxStatus::Available => stats.available_boxes += 1,
            BoxStatus::Reserved => stats.reserved_boxes += 1,
            BoxStatus::Damaged => stats.damaged_boxes += 1,
            BoxStatus::InTransit => stats.in_transit_boxes += 1,
            BoxStatus::Error => stats.error_boxes += 1,
        }
        if storage_box.is_expiring_within(now, expiring_window) {
            stats.expiring_boxes += 1;
        }
    }

    stats.pending_tasks = tasks.count_by_status(TaskStatus::Pending);
    stats.in_progress_tasks = tasks.count_by_status(TaskStatus::InProgress);
    stats.capacity_usage = percentage(stats.total_boxes, store.geometry().capacity());
    stats.full_positions = store.full_shelves();
    stats
}

/// Count and share of every category, in declaration order
pub fn category_breakdown(store: &WarehouseStore) -> Vec<CategoryShare> {
    let total = store.len();
    Category::ALL
        .iter()
        .map(|&category| {
            let count = store.boxes().filter(|b| b.category == category).count();
            CategoryShare {
                category,
                count,
                percentage: percentage(count, total),
            }
        })
        .collect()
}

fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}
