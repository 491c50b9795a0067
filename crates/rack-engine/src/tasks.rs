//! Task engine: task lifecycle and the box task flags coupled to it
//!
//! A box's `has_task` flag is never set on its own. After every task write
//! the flag is recomputed from the open tasks that reference the box, so a
//! box with several concurrent tasks stays flagged until the last one closes.

use chrono::{DateTime, Utc};
use rack_core::{
    Priority, RackError, Result, Task, TaskDraft, TaskEstimates, TaskStatus,
};
use tracing::debug;

use crate::store::WarehouseStore;

#[derive(Debug, Clone, Default)]
pub struct TaskEngine {
    // Newest first
    tasks: Vec<Task>,
    estimates: TaskEstimates,
}

impl TaskEngine {
    pub fn new(estimates: TaskEstimates) -> Self {
        Self {
            tasks: Vec::new(),
            estimates,
        }
    }

    /// Create a task from a draft
    ///
    /// Box tasks need the box to be locatable in the store; its shelf is
    /// snapshotted into `from_position` and its priority copied unless the
    /// draft overrides it. Free-standing drafts need no position.
    pub fn create(
        &mut self,
        store: &mut WarehouseStore,
        draft: TaskDraft,
        operator: &str,
    ) -> Result<Task> {
        if let Some(id) = draft.id.as_deref() {
            if self.get(id).is_some() {
                return Err(RackError::DuplicateTask(id.to_string()));
            }
        }
        let assignee = draft.assigned_to.as_deref().unwrap_or(operator);

        let mut task = match draft.box_id.as_deref() {
            Some(box_id) => {
                let (position, box_priority) = store
                    .find_position(box_id)
                    .zip(store.get_box(box_id).map(|b| b.priority))
                    .ok_or_else(|| RackError::BoxPositionUnknown(box_id.to_string()))?;

                Task::new(draft.kind, draft.priority.unwrap_or(box_priority), assignee)
                    .with_box(box_id)
                    .with_from(position.shelf())
            }
            None => Task::new(draft.kind, draft.priority.unwrap_or(Priority::Medium), assignee),
        };

        if let Some(id) = draft.id {
            task.id = id;
        }
        task.estimated_minutes = draft
            .estimated_minutes
            .unwrap_or_else(|| self.estimates.minutes_for(draft.kind));
        task.to_position = draft.to_position;
        task.notes = draft.notes;

        self.tasks.insert(0, task.clone());
        if let Some(box_id) = task.box_id.as_deref() {
            self.sync_flag(store, box_id);
        }

        debug!("Created {} task {}", task.kind, task.id);
        Ok(task)
    }

    /// `pending -> in_progress`
    pub fn start(&mut self, task_id: &str) -> Result<Task> {
        let task = self.get_mut(task_id)?;
        task.start()?;
        Ok(task.clone())
    }

    /// `pending | in_progress -> completed`, then recompute the box flag
    pub fn complete(
        &mut self,
        store: &mut WarehouseStore,
        task_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Task> {
        let task = self.get_mut(task_id)?;
        task.complete(now)?;
        let task = task.clone();

        if let Some(box_id) = task.box_id.as_deref() {
            self.sync_flag(store, box_id);
        }
        Ok(task)
    }

    /// Recompute `has_task` for one box from the open tasks referencing it.
    /// A box no longer in the store is skipped.
    pub fn sync_flag(&self, store: &mut WarehouseStore, box_id: &str) {
        let open = self.has_open_task(box_id);
        if let Some(storage_box) = store.get_box_mut(box_id) {
            storage_box.has_task = open;
        }
    }

    /// Recompute `has_task` for every stored box
    pub fn sync_all_flags(&self, store: &mut WarehouseStore) {
        for storage_box in store.boxes_mut() {
            storage_box.has_task = self.has_open_task(&storage_box.id);
        }
    }

    pub fn has_open_task(&self, box_id: &str) -> bool {
        self.open_tasks_for(box_id) > 0
    }

    pub fn open_tasks_for(&self, box_id: &str) -> usize {
        self.for_box(box_id).filter(|t| t.is_open()).count()
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// All tasks, newest first
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn for_box<'a>(&'a self, box_id: &'a str) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks
            .iter()
            .filter(move |t| t.box_id.as_deref() == Some(box_id))
    }

    /// Tasks with `status`, newest first.
    ///
    /// The pending listing is the work queue, so it is additionally ordered by
    /// priority (high first). The sort is stable: equal priorities keep
    /// their listing order.
    pub fn list_by_status(&self, status: TaskStatus) -> Vec<Task> {
        let mut listed: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| t.status == status)
            .cloned()
            .collect();
        if status == TaskStatus::Pending {
            listed.sort_by(|a, b| b.priority.cmp(&a.priority));
        }
        listed
    }

    pub fn count_by_status(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn get_mut(&mut self, task_id: &str) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| RackError::TaskNotFound(task_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rack_core::{Geometry, Shelf, StorageBox, TaskKind};

    fn setup() -> (WarehouseStore, TaskEngine) {
        let mut store = WarehouseStore::new(Geometry::default());
        store
            .place(StorageBox::new("REF-1", "OT-1").with_id("b1").with_priority(Priority::High))
            .unwrap();
        store
            .place(StorageBox::new("REF-2", "OT-2").with_id("b2").with_priority(Priority::Low))
            .unwrap();
        (store, TaskEngine::new(TaskEstimates::default()))
    }

    #[test]
    fn test_create_snapshots_box() {
        let (mut store, mut engine) = setup();
        let task = engine
            .create(&mut store, TaskDraft::for_box("b1", TaskKind::Pick), "Ana")
            .unwrap();

        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.from_position, Some(Shelf::new(0, 0)));
        assert_eq!(task.estimated_minutes, 10);
        assert_eq!(task.assigned_to, "Ana");
        assert!(store.get_box("b1").unwrap().has_task);
        assert!(!store.get_box("b2").unwrap().has_task);
    }

    #[test]
    fn test_create_for_unknown_box() {
        let (mut store, mut engine) = setup();
        let err = engine
            .create(&mut store, TaskDraft::for_box("nope", TaskKind::Check), "Ana")
            .unwrap_err();
        assert!(matches!(err, RackError::BoxPositionUnknown(id) if id == "nope"));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_draft_overrides() {
        let (mut store, mut engine) = setup();
        let draft = TaskDraft::for_box("b2", TaskKind::Move)
            .with_destination(Shelf::new(5, 1))
            .with_priority(Priority::High)
            .with_assignee("Carlos")
            .with_estimate(45)
            .with_notes("urgent relocation");
        let task = engine.create(&mut store, draft, "Ana").unwrap();

        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.to_position, Some(Shelf::new(5, 1)));
        assert_eq!(task.assigned_to, "Carlos");
        assert_eq!(task.estimated_minutes, 45);
        assert_eq!(task.notes.as_deref(), Some("urgent relocation"));
    }

    #[test]
    fn test_explicit_task_id() {
        let (mut store, mut engine) = setup();
        let draft = TaskDraft::for_box("b1", TaskKind::Pick).with_id("TASK-001");
        let task = engine.create(&mut store, draft.clone(), "Ana").unwrap();
        assert_eq!(task.id, "TASK-001");

        let err = engine.create(&mut store, draft, "Ana").unwrap_err();
        assert!(matches!(err, RackError::DuplicateTask(_)));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_free_standing_task() {
        let (mut store, mut engine) = setup();
        let task = engine
            .create(&mut store, TaskDraft::free_standing(TaskKind::Store), "Ana")
            .unwrap();
        assert!(task.box_id.is_none());
        assert!(task.from_position.is_none());
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.estimated_minutes, 20);

        let done = engine.complete(&mut store, &task.id, Utc::now()).unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
    }

    #[test]
    fn test_flag_survives_until_last_open_task() {
        let (mut store, mut engine) = setup();
        let first = engine
            .create(&mut store, TaskDraft::for_box("b1", TaskKind::Pick), "Ana")
            .unwrap();
        let second = engine
            .create(&mut store, TaskDraft::for_box("b1", TaskKind::Check), "Ana")
            .unwrap();
        assert_eq!(engine.open_tasks_for("b1"), 2);

        engine.complete(&mut store, &first.id, Utc::now()).unwrap();
        assert!(store.get_box("b1").unwrap().has_task);

        engine.start(&second.id).unwrap();
        assert!(store.get_box("b1").unwrap().has_task);

        engine.complete(&mut store, &second.id, Utc::now()).unwrap();
        assert!(!store.get_box("b1").unwrap().has_task);
    }

    #[test]
    fn test_transitions() {
        let (mut store, mut engine) = setup();
        let task = engine
            .create(&mut store, TaskDraft::for_box("b2", TaskKind::Check), "Ana")
            .unwrap();

        let started = engine.start(&task.id).unwrap();
        assert_eq!(started.status, TaskStatus::InProgress);
        assert!(matches!(
            engine.start(&task.id),
            Err(RackError::InvalidTransition { .. })
        ));

        let done = engine.complete(&mut store, &task.id, Utc::now()).unwrap();
        let stamped = done.completed_at;
        assert!(stamped.is_some());
        assert!(engine.complete(&mut store, &task.id, Utc::now()).is_err());
        assert_eq!(engine.get(&task.id).unwrap().completed_at, stamped);

        assert!(matches!(
            engine.start("TASK-missing"),
            Err(RackError::TaskNotFound(_))
        ));
    }

    #[test]
    fn test_pending_listing_is_stable_by_priority() {
        let (mut store, mut engine) = setup();
        let low = engine
            .create(&mut store, TaskDraft::for_box("b2", TaskKind::Pick), "Ana")
            .unwrap();
        let high_a = engine
            .create(&mut store, TaskDraft::for_box("b1", TaskKind::Pick), "Ana")
            .unwrap();
        let medium = engine
            .create(
                &mut store,
                TaskDraft::free_standing(TaskKind::Store),
                "Ana",
            )
            .unwrap();
        let high_b = engine
            .create(&mut store, TaskDraft::for_box("b1", TaskKind::Check), "Ana")
            .unwrap();

        // Listing order is newest first: high_b, medium, high_a, low
        let ids: Vec<String> = engine
            .list_by_status(TaskStatus::Pending)
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![high_b.id, high_a.id, medium.id, low.id]);
    }

    #[test]
    fn test_sync_all_flags() {
        let (mut store, mut engine) = setup();
        engine
            .create(&mut store, TaskDraft::for_box("b2", TaskKind::Pick), "Ana")
            .unwrap();

        let (mut removed, _) = store.remove("b2").unwrap();
        removed.has_task = false;
        store.place(removed).unwrap();
        assert!(!store.get_box("b2").unwrap().has_task);

        engine.sync_all_flags(&mut store);
        assert!(store.get_box("b2").unwrap().has_task);
    }
}
