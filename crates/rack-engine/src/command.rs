//! Serializable requests against a depot
//!
//! Commands mutate and need exclusive access; queries only read. Both are
//! plain data so they can be replayed from a script or sent over a channel.

use rack_core::{
    BoxDraft, BoxId, Movement, Position, Result, Shelf, StorageBox, Task, TaskDraft, TaskId,
    TaskStatus,
};
use serde::{Deserialize, Serialize};

use crate::depot::Depot;
use crate::query::{BoxFilter, CategoryShare, Stats};
use crate::store::Occupancy;

/// Default number of movements returned by [`DepotQuery::Movements`]
const DEFAULT_MOVEMENT_LIMIT: usize = 20;

/// A state-changing operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DepotCommand {
    /// Add a box first-fit, or onto `shelf` when given
    AddBox {
        draft: BoxDraft,
        #[serde(default)]
        shelf: Option<Shelf>,
    },
    RemoveBox {
        box_id: BoxId,
    },
    MoveBox {
        box_id: BoxId,
        column: usize,
        height: usize,
    },
    CreateTask {
        draft: TaskDraft,
    },
    StartTask {
        task_id: TaskId,
    },
    CompleteTask {
        task_id: TaskId,
    },
    SetOperator {
        operator: String,
    },
}

/// A read-only operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "query", rename_all = "snake_case")]
pub enum DepotQuery {
    FindPosition {
        box_id: BoxId,
    },
    /// Scanner lookup by reference or work order
    FindByCode {
        code: String,
    },
    FilterBoxes {
        #[serde(default)]
        filter: BoxFilter,
    },
    Stats,
    CategoryBreakdown,
    ListTasks {
        status: TaskStatus,
    },
    ColumnOccupancy {
        column: usize,
    },
    /// Most recent movements, newest first
    Movements {
        #[serde(default)]
        limit: Option<usize>,
    },
}

/// One step of a script: either a command or a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Request {
    Command(DepotCommand),
    Query(DepotQuery),
}

impl From<DepotCommand> for Request {
    fn from(command: DepotCommand) -> Self {
        Self::Command(command)
    }
}

impl From<DepotQuery> for Request {
    fn from(query: DepotQuery) -> Self {
        Self::Query(query)
    }
}

/// Result payload of a command or query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Placed {
        #[serde(rename = "box")]
        storage_box: StorageBox,
        position: Position,
    },
    Removed {
        #[serde(rename = "box")]
        storage_box: StorageBox,
    },
    Moved {
        box_id: BoxId,
        position: Position,
    },
    Task {
        task: Task,
    },
    OperatorSet {
        operator: String,
    },
    Position {
        box_id: BoxId,
        position: Option<Position>,
    },
    Found {
        #[serde(rename = "box")]
        storage_box: Option<StorageBox>,
    },
    Boxes {
        boxes: Vec<StorageBox>,
    },
    Stats {
        stats: Stats,
    },
    Categories {
        categories: Vec<CategoryShare>,
    },
    Tasks {
        tasks: Vec<Task>,
    },
    Occupancy {
        column: usize,
        occupancy: Occupancy,
    },
    Movements {
        movements: Vec<Movement>,
    },
}

impl DepotCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddBox { .. } => "add_box",
            Self::RemoveBox { .. } => "remove_box",
            Self::MoveBox { .. } => "move_box",
            Self::CreateTask { .. } => "create_task",
            Self::StartTask { .. } => "start_task",
            Self::CompleteTask { .. } => "complete_task",
            Self::SetOperator { .. } => "set_operator",
        }
    }

    pub fn apply(self, depot: &mut Depot) -> Result<Outcome> {
        match self {
            Self::AddBox { draft, shelf: None } => {
                let (storage_box, position) = depot.add_box(draft)?;
                Ok(Outcome::Placed {
                    storage_box,
                    position,
                })
            }
            Self::AddBox {
                draft,
                shelf: Some(shelf),
            } => {
                let (storage_box, position) = depot.add_box_at(draft, shelf)?;
                Ok(Outcome::Placed {
                    storage_box,
                    position,
                })
            }
            Self::RemoveBox { box_id } => Ok(Outcome::Removed {
                storage_box: depot.remove_box(&box_id)?,
            }),
            Self::MoveBox {
                box_id,
                column,
                height,
            } => {
                let position = depot.move_box(&box_id, column, height)?;
                Ok(Outcome::Moved { box_id, position })
            }
            Self::CreateTask { draft } => Ok(Outcome::Task {
                task: depot.create_task_from(draft)?,
            }),
            Self::StartTask { task_id } => Ok(Outcome::Task {
                task: depot.start_task(&task_id)?,
            }),
            Self::CompleteTask { task_id } => Ok(Outcome::Task {
                task: depot.complete_task(&task_id)?,
            }),
            Self::SetOperator { operator } => {
                depot.set_operator(operator.clone());
                Ok(Outcome::OperatorSet { operator })
            }
        }
    }
}

impl DepotQuery {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FindPosition { .. } => "find_position",
            Self::FindByCode { .. } => "find_by_code",
            Self::FilterBoxes { .. } => "filter_boxes",
            Self::Stats => "stats",
            Self::CategoryBreakdown => "category_breakdown",
            Self::ListTasks { .. } => "list_tasks",
            Self::ColumnOccupancy { .. } => "column_occupancy",
            Self::Movements { .. } => "movements",
        }
    }

    pub fn evaluate(&self, depot: &Depot) -> Result<Outcome> {
        let outcome = match self {
            Self::FindPosition { box_id } => Outcome::Position {
                box_id: box_id.clone(),
                position: depot.find_position(box_id),
            },
            Self::FindByCode { code } => Outcome::Found {
                storage_box: depot.find_by_code(code).cloned(),
            },
            Self::FilterBoxes { filter } => Outcome::Boxes {
                boxes: depot.filter_boxes(filter),
            },
            Self::Stats => Outcome::Stats {
                stats: depot.compute_stats(),
            },
            Self::CategoryBreakdown => Outcome::Categories {
                categories: depot.category_breakdown(),
            },
            Self::ListTasks { status } => Outcome::Tasks {
                tasks: depot.list_tasks_by_status(*status),
            },
            Self::ColumnOccupancy { column } => Outcome::Occupancy {
                column: *column,
                occupancy: depot.column_occupancy(*column)?,
            },
            Self::Movements { limit } => Outcome::Movements {
                movements: depot
                    .movements()
                    .recent(limit.unwrap_or(DEFAULT_MOVEMENT_LIMIT))
                    .into_iter()
                    .cloned()
                    .collect(),
            },
        };
        Ok(outcome)
    }
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Command(command) => command.name(),
            Self::Query(query) => query.name(),
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Command(_))
    }

    /// Apply against an exclusively held depot
    pub fn apply(self, depot: &mut Depot) -> Result<Outcome> {
        match self {
            Self::Command(command) => command.apply(depot),
            Self::Query(query) => query.evaluate(depot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rack_core::{RackError, TaskKind};

    #[test]
    fn test_parse_script_steps() {
        let script = r#"[
            {"op": "add_box", "draft": {
                "id": "BOX-001", "reference": "REF-2024-001",
                "work_order": "OT-15847", "priority": "high"
            }},
            {"op": "create_task", "draft": {"id": "TASK-001", "kind": "pick", "box_id": "BOX-001"}},
            {"query": "find_position", "box_id": "BOX-001"},
            {"query": "stats"},
            {"query": "list_tasks", "status": "pending"}
        ]"#;
        let steps: Vec<Request> = serde_json::from_str(script).unwrap();
        assert_eq!(steps.len(), 5);
        assert!(steps[0].is_mutation());
        assert_eq!(steps[1].name(), "create_task");
        assert_eq!(
            steps[2],
            Request::Query(DepotQuery::FindPosition {
                box_id: "BOX-001".to_string()
            })
        );
        assert_eq!(steps[3], Request::Query(DepotQuery::Stats));
        assert!(!steps[4].is_mutation());
    }

    #[test]
    fn test_apply_steps() {
        let mut depot = Depot::default();
        let placed = Request::from(DepotCommand::AddBox {
            draft: BoxDraft {
                id: Some("BOX-001".to_string()),
                ..BoxDraft::new("REF-2024-001", "OT-15847")
            },
            shelf: Some(Shelf::new(5, 1)),
        })
        .apply(&mut depot)
        .unwrap();
        match placed {
            Outcome::Placed { position, .. } => assert_eq!(position, Position::new(5, 1, 0)),
            other => panic!("unexpected outcome: {:?}", other),
        }

        let task = DepotCommand::CreateTask {
            draft: TaskDraft::for_box("BOX-001", TaskKind::Pick),
        }
        .apply(&mut depot)
        .unwrap();
        assert!(matches!(task, Outcome::Task { ref task } if task.kind == TaskKind::Pick));

        let found = DepotQuery::FindByCode {
            code: "OT-15847".to_string(),
        }
        .evaluate(&depot)
        .unwrap();
        match found {
            Outcome::Found { storage_box } => assert!(storage_box.unwrap().has_task),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_errors_pass_through() {
        let mut depot = Depot::default();
        let err = DepotCommand::StartTask {
            task_id: "TASK-missing".to_string(),
        }
        .apply(&mut depot)
        .unwrap_err();
        assert!(matches!(err, RackError::TaskNotFound(_)));

        let err = DepotQuery::ColumnOccupancy { column: 99 }
            .evaluate(&depot)
            .unwrap_err();
        assert!(matches!(err, RackError::OutOfBounds(_)));
    }

    #[test]
    fn test_rejected_script_step_leaves_depot_usable() {
        let mut depot = Depot::default();
        let steps: Vec<Request> = serde_json::from_str(
            r#"[
                {"op": "add_box", "draft": {
                    "reference": "R", "work_order": "O",
                    "expiry_days": 9223372036854775807
                }},
                {"op": "add_box", "draft": {"reference": " ", "work_order": "O"}},
                {"op": "add_box", "draft": {"reference": "R", "work_order": "O", "expiry_days": 3}}
            ]"#,
        )
        .unwrap();

        let results: Vec<_> = steps.into_iter().map(|step| step.apply(&mut depot)).collect();
        assert!(matches!(results[0], Err(RackError::InvalidExpiry(_))));
        assert!(matches!(results[1], Err(RackError::InvalidBox(_))));
        assert!(results[2].is_ok());
        assert_eq!(depot.store().len(), 1);
        assert_eq!(depot.movements().len(), 1);
    }

    #[test]
    fn test_outcome_serializes_box_field() {
        let outcome = Outcome::Removed {
            storage_box: StorageBox::new("REF-1", "OT-1").with_id("BOX-1"),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["kind"], "removed");
        assert_eq!(json["box"]["id"], "BOX-1");
    }
}
