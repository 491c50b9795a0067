//! Core type definitions for Rack

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{RackError, Result};

/// Default number of warehouse columns
pub const COLUMNS: usize = 20;
/// Default number of shelf levels per column
pub const HEIGHTS: usize = 5;
/// Default stack capacity of a single shelf
pub const MAX_BOXES_PER_HEIGHT: usize = 5;

/// Box identifier (e.g. `BOX-1A2B3C4D5E6F`)
pub type BoxId = String;

/// Task identifier (e.g. `TASK-1A2B3C4D5E6F`)
pub type TaskId = String;

/// Generate a prefixed identifier with a random uppercase hex suffix
pub fn generate_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..12].to_uppercase();
    format!("{}-{}", prefix, suffix)
}

/// Box and task priority
///
/// Ordered so that `High > Medium > Low`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Self::Low, Self::Medium, Self::High];
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// Physical condition / availability of a stored box
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxStatus {
    #[default]
    Available,
    Reserved,
    Damaged,
    InTransit,
    Error,
}

impl BoxStatus {
    pub const ALL: [BoxStatus; 5] = [
        Self::Available,
        Self::Reserved,
        Self::Damaged,
        Self::InTransit,
        Self::Error,
    ];
}

impl std::fmt::Display for BoxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Reserved => write!(f, "reserved"),
            Self::Damaged => write!(f, "damaged"),
            Self::InTransit => write!(f, "in_transit"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for BoxStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(Self::Available),
            "reserved" => Ok(Self::Reserved),
            "damaged" => Ok(Self::Damaged),
            "in_transit" | "intransit" | "in-transit" => Ok(Self::InTransit),
            "error" => Ok(Self::Error),
            _ => Err(format!("Invalid box status: {}", s)),
        }
    }
}

/// Goods category of a box
///
/// `Other` is the catch-all for anything without a dedicated category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Electronics,
    Clothing,
    Food,
    Books,
    Tools,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Self::Electronics,
        Self::Clothing,
        Self::Food,
        Self::Books,
        Self::Tools,
        Self::Other,
    ];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Electronics => write!(f, "electronics"),
            Self::Clothing => write!(f, "clothing"),
            Self::Food => write!(f, "food"),
            Self::Books => write!(f, "books"),
            Self::Tools => write!(f, "tools"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "electronics" => Ok(Self::Electronics),
            "clothing" => Ok(Self::Clothing),
            "food" => Ok(Self::Food),
            "books" => Ok(Self::Books),
            "tools" => Ok(Self::Tools),
            "other" => Ok(Self::Other),
            _ => Err(format!("Invalid category: {}", s)),
        }
    }
}

/// Kind of work a task represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Move,
    Pick,
    Store,
    Check,
    Reserve,
}

impl TaskKind {
    /// Built-in estimate in minutes (pick=10, move=15, others=20)
    pub fn default_estimate_minutes(self) -> u32 {
        match self {
            Self::Pick => 10,
            Self::Move => 15,
            Self::Store | Self::Check | Self::Reserve => 20,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Move => write!(f, "move"),
            Self::Pick => write!(f, "pick"),
            Self::Store => write!(f, "store"),
            Self::Check => write!(f, "check"),
            Self::Reserve => write!(f, "reserve"),
        }
    }
}

impl std::str::FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "move" => Ok(Self::Move),
            "pick" => Ok(Self::Pick),
            "store" => Ok(Self::Store),
            "check" => Ok(Self::Check),
            "reserve" => Ok(Self::Reserve),
            _ => Err(format!("Invalid task kind: {}", s)),
        }
    }
}

/// Task lifecycle status: `pending -> in_progress -> completed`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Open tasks keep their box flagged
    pub fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" | "inprogress" | "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Invalid task status: {}", s)),
        }
    }
}

/// Kind of audited movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Add,
    Remove,
    Move,
    Reserve,
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Remove => write!(f, "remove"),
            Self::Move => write!(f, "move"),
            Self::Reserve => write!(f, "reserve"),
        }
    }
}

/// A shelf: one (column, height) cell of the grid, holding a stack of boxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Shelf {
    pub column: usize,
    pub height: usize,
}

impl Shelf {
    pub fn new(column: usize, height: usize) -> Self {
        Self { column, height }
    }
}

impl std::fmt::Display for Shelf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "C{}-H{}", self.column, self.height)
    }
}

/// Full address of a stored box
///
/// Always a point-in-time snapshot; re-query after any mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub column: usize,
    pub height: usize,
    /// Index within the shelf's stack (0 = front, newest)
    pub stack_slot: usize,
}

impl Position {
    pub fn new(column: usize, height: usize, stack_slot: usize) -> Self {
        Self {
            column,
            height,
            stack_slot,
        }
    }

    pub fn shelf(&self) -> Shelf {
        Shelf::new(self.column, self.height)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "C{}-H{}-S{}", self.column, self.height, self.stack_slot)
    }
}

/// Warehouse dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    pub columns: usize,
    pub heights: usize,
    pub max_boxes_per_height: usize,
}

impl Geometry {
    pub fn new(columns: usize, heights: usize, max_boxes_per_height: usize) -> Self {
        Self {
            columns,
            heights,
            max_boxes_per_height,
        }
    }

    /// Total number of boxes the warehouse can hold
    pub fn capacity(&self) -> usize {
        self.columns * self.heights * self.max_boxes_per_height
    }

    /// Number of boxes one column can hold across all its heights
    pub fn column_capacity(&self) -> usize {
        self.heights * self.max_boxes_per_height
    }

    pub fn shelf_count(&self) -> usize {
        self.columns * self.heights
    }

    pub fn contains(&self, shelf: Shelf) -> bool {
        shelf.column < self.columns && shelf.height < self.heights
    }

    /// All shelves in scan order: columns ascending, then heights ascending
    pub fn shelves(&self) -> impl Iterator<Item = Shelf> {
        let heights = self.heights;
        (0..self.columns)
            .flat_map(move |column| (0..heights).map(move |height| Shelf::new(column, height)))
    }

    /// Reject geometries that cannot hold a single box
    pub fn validate(&self) -> Result<()> {
        if self.columns == 0 || self.heights == 0 || self.max_boxes_per_height == 0 {
            return Err(RackError::Config(format!(
                "Geometry dimensions must be non-zero: {}x{}x{}",
                self.columns, self.heights, self.max_boxes_per_height
            )));
        }
        Ok(())
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(COLUMNS, HEIGHTS, MAX_BOXES_PER_HEIGHT)
    }
}

/// A stored unit
///
/// Named `StorageBox` so it never shadows `std::boxed::Box`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageBox {
    pub id: BoxId,
    pub reference: String,
    /// Work order (OT) code
    pub work_order: String,
    pub entry_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    pub priority: Priority,
    pub status: BoxStatus,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Derived by the engine: true while at least one open task targets this box
    #[serde(default)]
    pub has_task: bool,
}

impl StorageBox {
    pub fn new(reference: impl Into<String>, work_order: impl Into<String>) -> Self {
        Self {
            id: generate_id("BOX"),
            reference: reference.into(),
            work_order: work_order.into(),
            entry_date: Utc::now(),
            expiry_date: None,
            weight: None,
            priority: Priority::default(),
            status: BoxStatus::default(),
            operator: String::new(),
            client: None,
            category: Category::default(),
            notes: None,
            has_task: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: BoxStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = operator.into();
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_entry_date(mut self, entry_date: DateTime<Utc>) -> Self {
        self.entry_date = entry_date;
        self
    }

    pub fn with_expiry(mut self, expiry_date: DateTime<Utc>) -> Self {
        self.expiry_date = Some(expiry_date);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// True when the box has an expiry date less than `window` away from `now`.
    /// Already expired boxes count as expiring.
    pub fn is_expiring_within(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.expiry_date
            .map(|expiry| expiry - now < window)
            .unwrap_or(false)
    }

    /// Case-insensitive substring match on reference, work order and client.
    /// `needle` must already be lowercase.
    pub fn matches_search(&self, needle: &str) -> bool {
        self.reference.to_lowercase().contains(needle)
            || self.work_order.to_lowercase().contains(needle)
            || self
                .client
                .as_deref()
                .map(|c| c.to_lowercase().contains(needle))
                .unwrap_or(false)
    }
}

/// Caller-side description of a box to add
///
/// Turned into a [`StorageBox`] by the depot, which stamps the operator and
/// entry date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxDraft {
    /// Explicit id; generated when absent
    pub id: Option<BoxId>,
    pub reference: String,
    pub work_order: String,
    pub priority: Priority,
    pub status: BoxStatus,
    pub category: Category,
    pub client: Option<String>,
    pub weight: Option<f64>,
    pub notes: Option<String>,
    /// Expiry as days from entry
    pub expiry_days: Option<i64>,
}

impl BoxDraft {
    pub fn new(reference: impl Into<String>, work_order: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            work_order: work_order.into(),
            ..Self::default()
        }
    }

    /// Validate the draft and build the box
    ///
    /// Reference and work order must be non-blank, and the expiry must land
    /// on a representable date.
    pub fn into_box(self, operator: &str, now: DateTime<Utc>) -> Result<StorageBox> {
        if self.reference.trim().is_empty() {
            return Err(RackError::InvalidBox("reference is blank".to_string()));
        }
        if self.work_order.trim().is_empty() {
            return Err(RackError::InvalidBox("work order is blank".to_string()));
        }
        let expiry_date = match self.expiry_days {
            Some(days) => Some(
                Duration::try_days(days)
                    .and_then(|d| now.checked_add_signed(d))
                    .ok_or(RackError::InvalidExpiry(days))?,
            ),
            None => None,
        };

        let mut storage_box = StorageBox::new(self.reference, self.work_order)
            .with_priority(self.priority)
            .with_status(self.status)
            .with_category(self.category)
            .with_operator(operator)
            .with_entry_date(now);
        if let Some(id) = self.id {
            storage_box.id = id;
        }
        storage_box.client = self.client.filter(|c| !c.trim().is_empty());
        storage_box.weight = self.weight;
        storage_box.notes = self.notes.filter(|n| !n.trim().is_empty());
        storage_box.expiry_date = expiry_date;
        Ok(storage_box)
    }
}

/// A unit of work against a box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub kind: TaskKind,
    /// Absent for free-standing tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_id: Option<BoxId>,
    /// Shelf of the box when the task was created (never updated)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_position: Option<Shelf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_position: Option<Shelf>,
    pub priority: Priority,
    pub assigned_to: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Minutes
    pub estimated_minutes: u32,
}

impl Task {
    pub fn new(kind: TaskKind, priority: Priority, assigned_to: impl Into<String>) -> Self {
        Self {
            id: generate_id("TASK"),
            kind,
            box_id: None,
            from_position: None,
            to_position: None,
            priority,
            assigned_to: assigned_to.into(),
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
            notes: None,
            estimated_minutes: kind.default_estimate_minutes(),
        }
    }

    pub fn with_box(mut self, box_id: impl Into<String>) -> Self {
        self.box_id = Some(box_id.into());
        self
    }

    pub fn with_from(mut self, shelf: Shelf) -> Self {
        self.from_position = Some(shelf);
        self
    }

    pub fn with_to(mut self, shelf: Shelf) -> Self {
        self.to_position = Some(shelf);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_estimate(mut self, minutes: u32) -> Self {
        self.estimated_minutes = minutes;
        self
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// `pending -> in_progress`
    pub fn start(&mut self) -> Result<()> {
        if self.status != TaskStatus::Pending {
            return Err(self.invalid_transition(TaskStatus::InProgress));
        }
        self.status = TaskStatus::InProgress;
        Ok(())
    }

    /// `pending | in_progress -> completed`, stamping `completed_at` once
    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<()> {
        if self.status == TaskStatus::Completed {
            return Err(self.invalid_transition(TaskStatus::Completed));
        }
        self.status = TaskStatus::Completed;
        self.completed_at = Some(at);
        Ok(())
    }

    fn invalid_transition(&self, to: TaskStatus) -> RackError {
        RackError::InvalidTransition {
            task_id: self.id.clone(),
            from: self.status,
            to,
        }
    }
}

/// Request to create a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Explicit id; generated when absent
    #[serde(default)]
    pub id: Option<TaskId>,
    pub kind: TaskKind,
    #[serde(default)]
    pub box_id: Option<BoxId>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub to_position: Option<Shelf>,
    /// Overrides the priority copied from the box
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Overrides the depot's current operator
    #[serde(default)]
    pub assigned_to: Option<String>,
    /// Overrides the per-kind estimate
    #[serde(default)]
    pub estimated_minutes: Option<u32>,
}

impl TaskDraft {
    pub fn for_box(box_id: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            box_id: Some(box_id.into()),
            ..Self::free_standing(kind)
        }
    }

    pub fn free_standing(kind: TaskKind) -> Self {
        Self {
            id: None,
            kind,
            box_id: None,
            notes: None,
            to_position: None,
            priority: None,
            assigned_to: None,
            estimated_minutes: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_destination(mut self, shelf: Shelf) -> Self {
        self.to_position = Some(shelf);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assigned_to = Some(assignee.into());
        self
    }

    pub fn with_estimate(mut self, minutes: u32) -> Self {
        self.estimated_minutes = Some(minutes);
        self
    }
}

/// Immutable audit record of a state-changing operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub kind: MovementKind,
    /// The box as it was when the movement happened
    pub box_snapshot: StorageBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_position: Option<Shelf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_position: Option<Shelf>,
    pub timestamp: DateTime<Utc>,
    pub operator: String,
}

impl Movement {
    pub fn new(kind: MovementKind, box_snapshot: StorageBox, operator: impl Into<String>) -> Self {
        Self {
            kind,
            box_snapshot,
            from_position: None,
            to_position: None,
            timestamp: Utc::now(),
            operator: operator.into(),
        }
    }

    pub fn with_from(mut self, shelf: Shelf) -> Self {
        self.from_position = Some(shelf);
        self
    }

    pub fn with_to(mut self, shelf: Shelf) -> Self {
        self.to_position = Some(shelf);
        self
    }
}
