//! Depot: the owned warehouse engine
//!
//! Composes the warehouse store, task engine and movement log behind the
//! command and query surface used by presentation layers. Every command runs
//! synchronously and either applies fully or returns an error with all state
//! left unchanged.

use chrono::{DateTime, Utc};
use rack_core::{
    BoxDraft, Geometry, Movement, MovementKind, Position, RackConfig, RackError, Result,
    Shelf, StatsConfig, StorageBox, Task, TaskDraft, TaskKind, TaskStatus,
};
use tracing::{debug, info, warn};

use crate::movement::MovementLog;
use crate::query::{self, BoxFilter, CategoryShare, Stats};
use crate::store::{Occupancy, WarehouseStore};
use crate::tasks::TaskEngine;

#[derive(Debug, Clone)]
pub struct Depot {
    store: WarehouseStore,
    tasks: TaskEngine,
    log: MovementLog,
    operator: String,
    stats_config: StatsConfig,
}

impl Depot {
    pub fn new(config: &RackConfig) -> Self {
        Self {
            store: WarehouseStore::new(config.geometry),
            tasks: TaskEngine::new(config.tasks.clone()),
            log: MovementLog::new(),
            operator: config.default_operator.clone(),
            stats_config: config.stats.clone(),
        }
    }

    /// Default configuration with custom dimensions
    pub fn with_geometry(geometry: Geometry) -> Self {
        Self::new(&RackConfig {
            geometry,
            ..RackConfig::default()
        })
    }

    pub fn geometry(&self) -> Geometry {
        self.store.geometry()
    }

    /// Operator stamped on new boxes, tasks and movements
    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn set_operator(&mut self, operator: impl Into<String>) {
        self.operator = operator.into();
        debug!("Current operator is now {}", self.operator);
    }

    pub fn store(&self) -> &WarehouseStore {
        &self.store
    }

    pub fn task_engine(&self) -> &TaskEngine {
        &self.tasks
    }

    // ===== Commands =====

    /// Build a box from a draft (stamping operator and entry date) and place it first-fit
    pub fn add_box(&mut self, draft: BoxDraft) -> Result<(StorageBox, Position)> {
        let storage_box = draft
            .into_box(&self.operator, Utc::now())
            .map_err(|e| rejected("add_box", e))?;
        let id = storage_box.id.clone();
        let position = self.place_box(storage_box)?;
        self.stored(id, position)
    }

    /// Like [`Depot::add_box`], onto an explicit shelf
    pub fn add_box_at(&mut self, draft: BoxDraft, shelf: Shelf) -> Result<(StorageBox, Position)> {
        let storage_box = draft
            .into_box(&self.operator, Utc::now())
            .map_err(|e| rejected("add_box_at", e))?;
        let id = storage_box.id.clone();
        let position = self.place_box_at(storage_box, shelf)?;
        self.stored(id, position)
    }

    /// First-fit placement
    pub fn place_box(&mut self, storage_box: StorageBox) -> Result<Position> {
        let id = storage_box.id.clone();
        let position = self
            .store
            .place(storage_box)
            .map_err(|e| rejected("place_box", e))?;
        self.after_placement(&id, position);
        Ok(position)
    }

    /// Placement on an explicit shelf
    pub fn place_box_at(&mut self, storage_box: StorageBox, shelf: Shelf) -> Result<Position> {
        let id = storage_box.id.clone();
        let position = self
            .store
            .place_at(storage_box, shelf)
            .map_err(|e| rejected("place_box_at", e))?;
        self.after_placement(&id, position);
        Ok(position)
    }

    /// Remove a box from the warehouse
    ///
    /// Open tasks referencing the box are left as they are; they can still be
    /// started and completed.
    pub fn remove_box(&mut self, box_id: &str) -> Result<StorageBox> {
        let (removed, from) = self
            .store
            .remove(box_id)
            .map_err(|e| rejected("remove_box", e))?;

        let open = self.tasks.open_tasks_for(box_id);
        if open > 0 {
            warn!("Removed box {} still has {} open task(s)", box_id, open);
        }

        self.log.record(
            Movement::new(MovementKind::Remove, removed.clone(), &self.operator)
                .with_from(from.shelf()),
        );
        info!("Removed box {} from {}", box_id, from);
        Ok(removed)
    }

    /// Atomically move a box to the front of the stack at (column, height)
    pub fn move_box(&mut self, box_id: &str, column: usize, height: usize) -> Result<Position> {
        let destination = Shelf::new(column, height);
        let (from, to) = self
            .store
            .move_box(box_id, destination)
            .map_err(|e| rejected("move_box", e))?;

        if let Some(moved) = self.store.get_box(box_id) {
            self.log.record(
                Movement::new(MovementKind::Move, moved.clone(), &self.operator)
                    .with_from(from.shelf())
                    .with_to(to.shelf()),
            );
        }
        info!("Moved box {} from {} to {}", box_id, from, to);
        Ok(to)
    }

    /// Create a task against a stored box
    pub fn create_task(
        &mut self,
        box_id: &str,
        kind: TaskKind,
        notes: Option<String>,
    ) -> Result<Task> {
        let mut draft = TaskDraft::for_box(box_id, kind);
        draft.notes = notes;
        self.create_task_from(draft)
    }

    /// Create a task from a full draft (box or free-standing)
    pub fn create_task_from(&mut self, draft: TaskDraft) -> Result<Task> {
        let task = self
            .tasks
            .create(&mut self.store, draft, &self.operator)
            .map_err(|e| rejected("create_task", e))?;

        if task.kind == TaskKind::Reserve {
            self.record_reservation(&task);
        }
        info!(
            "Created {} task {} for {}",
            task.kind,
            task.id,
            task.box_id.as_deref().unwrap_or("no box")
        );
        Ok(task)
    }

    pub fn start_task(&mut self, task_id: &str) -> Result<Task> {
        let task = self
            .tasks
            .start(task_id)
            .map_err(|e| rejected("start_task", e))?;
        info!("Started task {}", task.id);
        Ok(task)
    }

    pub fn complete_task(&mut self, task_id: &str) -> Result<Task> {
        self.complete_task_at(task_id, Utc::now())
    }

    /// Complete a task with an explicit completion time
    pub fn complete_task_at(&mut self, task_id: &str, now: DateTime<Utc>) -> Result<Task> {
        let task = self
            .tasks
            .complete(&mut self.store, task_id, now)
            .map_err(|e| rejected("complete_task", e))?;
        info!("Completed task {}", task.id);
        Ok(task)
    }

    // ===== Queries =====

    pub fn find_position(&self, box_id: &str) -> Option<Position> {
        self.store.find_position(box_id)
    }

    pub fn get_box(&self, box_id: &str) -> Option<&StorageBox> {
        self.store.get_box(box_id)
    }

    /// Scanner lookup: exact reference or work order
    pub fn find_by_code(&self, code: &str) -> Option<&StorageBox> {
        self.store.find_by_code(code)
    }

    pub fn filter_boxes(&self, filter: &BoxFilter) -> Vec<StorageBox> {
        query::filter_boxes(&self.store, filter)
    }

    pub fn compute_stats(&self) -> Stats {
        self.stats_at(Utc::now())
    }

    pub fn stats_at(&self, now: DateTime<Utc>) -> Stats {
        query::compute_stats(
            &self.store,
            &self.tasks,
            now,
            self.stats_config.expiring_window(),
        )
    }

    pub fn category_breakdown(&self) -> Vec<CategoryShare> {
        query::category_breakdown(&self.store)
    }

    pub fn list_tasks_by_status(&self, status: TaskStatus) -> Vec<Task> {
        self.tasks.list_by_status(status)
    }

    pub fn get_task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.get(task_id)
    }

    pub fn tasks_for_box(&self, box_id: &str) -> Vec<Task> {
        self.tasks.for_box(box_id).cloned().collect()
    }

    pub fn shelf_occupancy(&self, shelf: Shelf) -> Result<Occupancy> {
        self.store.shelf_occupancy(shelf)
    }

    pub fn column_occupancy(&self, column: usize) -> Result<Occupancy> {
        self.store.column_occupancy(column)
    }

    pub fn movements(&self) -> &MovementLog {
        &self.log
    }

    fn stored(&self, id: String, position: Position) -> Result<(StorageBox, Position)> {
        let stored = self
            .store
            .get_box(&id)
            .cloned()
            .ok_or(RackError::BoxNotFound(id))?;
        Ok((stored, position))
    }

    fn after_placement(&mut self, box_id: &str, position: Position) {
        // A box re-placed under a known id picks its open tasks back up
        self.tasks.sync_flag(&mut self.store, box_id);

        if let Some(placed) = self.store.get_box(box_id) {
            self.log.record(
                Movement::new(MovementKind::Add, placed.clone(), &self.operator)
                    .with_to(position.shelf()),
            );
        }
        info!("Placed box {} at {}", box_id, position);
    }

    fn record_reservation(&mut self, task: &Task) {
        let Some(box_id) = task.box_id.as_deref() else {
            return;
        };
        if let Some(reserved) = self.store.get_box(box_id) {
            let mut movement =
                Movement::new(MovementKind::Reserve, reserved.clone(), &self.operator);
            if let Some(shelf) = task.from_position {
                movement = movement.with_from(shelf);
            }
            self.log.record(movement);
        }
    }
}

impl Default for Depot {
    fn default() -> Self {
        Self::new(&RackConfig::default())
    }
}

fn rejected(operation: &str, err: RackError) -> RackError {
    warn!("{} rejected: {}", operation, err);
    err
}
