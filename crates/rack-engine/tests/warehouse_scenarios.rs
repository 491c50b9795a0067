//! End-to-end warehouse scenarios
//!
//! Exercises the depot the way a front desk would:
//! - Seeding a sample inventory
//! - Filling the warehouse to capacity
//! - Task lifecycles and their box flags
//! - Search, statistics and rejected moves

use std::collections::HashSet;

use chrono::{Duration, TimeZone, Utc};
use rack_core::{
    BoxDraft, BoxStatus, Category, Geometry, MovementKind, Position, Priority, RackError, Shelf,
    StorageBox, TaskDraft, TaskKind, TaskStatus,
};
use rack_engine::{BoxFilter, Depot, OccupancyLevel};

/// Helper to build one sample box
fn sample_box(n: usize, priority: Priority, status: BoxStatus, category: Category) -> StorageBox {
    StorageBox::new(format!("REF-2024-{:03}", n), format!("OT-{}", 15846 + n))
        .with_id(format!("BOX-{:03}", n))
        .with_client(format!("CLI-{:03}", n))
        .with_priority(priority)
        .with_status(status)
        .with_category(category)
}

/// Helper to seed a depot with the six sample boxes
fn seeded_depot() -> Depot {
    let mut depot = Depot::default();
    let seed = [
        (1, Priority::High, BoxStatus::Available, Category::Electronics, (0, 0)),
        (2, Priority::Medium, BoxStatus::Reserved, Category::Clothing, (1, 0)),
        (3, Priority::Medium, BoxStatus::Available, Category::Food, (2, 0)),
        (4, Priority::Low, BoxStatus::Error, Category::Tools, (3, 1)),
        (5, Priority::Low, BoxStatus::Damaged, Category::Books, (4, 1)),
        (6, Priority::High, BoxStatus::InTransit, Category::Electronics, (5, 1)),
    ];
    for (n, priority, status, category, (column, height)) in seed {
        depot
            .place_box_at(
                sample_box(n, priority, status, category),
                Shelf::new(column, height),
            )
            .expect("Failed to seed box");
    }
    depot
}

/// Positions must be unique, stacks bounded, and every flag must match open tasks
fn assert_invariants(depot: &Depot) {
    let geometry = depot.geometry();
    let mut seen = HashSet::new();

    for (shelf, stack) in depot.store().grid().shelves() {
        assert!(
            stack.len() <= geometry.max_boxes_per_height,
            "shelf {} over capacity",
            shelf
        );
    }

    for storage_box in depot.store().boxes() {
        let position = depot
            .find_position(&storage_box.id)
            .expect("stored box has a position");
        assert!(
            seen.insert((position.column, position.height, position.stack_slot)),
            "duplicate position {}",
            position
        );
        assert_eq!(
            storage_box.has_task,
            depot.task_engine().has_open_task(&storage_box.id),
            "flag mismatch for {}",
            storage_box.id
        );
    }
}

#[test]
fn test_seeded_inventory() {
    let depot = seeded_depot();
    assert_eq!(depot.store().len(), 6);
    assert_eq!(depot.find_position("BOX-003"), Some(Position::new(2, 0, 0)));
    assert_eq!(depot.find_position("BOX-006"), Some(Position::new(5, 1, 0)));

    let stats = depot.compute_stats();
    assert_eq!(stats.total_boxes, 6);
    assert_eq!(stats.available_boxes, 2);
    assert_eq!(stats.reserved_boxes, 1);
    assert_eq!(stats.damaged_boxes, 1);
    assert_eq!(stats.in_transit_boxes, 1);
    assert_eq!(stats.error_boxes, 1);
    // 6 / 500 = 1.2%
    assert_eq!(stats.capacity_usage, 1);
    assert_eq!(stats.full_positions, 0);
    assert_invariants(&depot);
}

#[test]
fn test_fill_warehouse_to_capacity() {
    let mut depot = Depot::default();
    let capacity = depot.geometry().capacity();
    assert_eq!(capacity, 500);

    for i in 0..capacity {
        let draft = BoxDraft::new(format!("REF-{}", i), format!("OT-{}", i));
        depot.add_box(draft).expect("Failed to place box");
    }

    let stats = depot.compute_stats();
    assert_eq!(stats.total_boxes, 500);
    assert_eq!(stats.capacity_usage, 100);
    assert_eq!(stats.full_positions, 100);

    let err = depot
        .add_box(BoxDraft::new("REF-overflow", "OT-overflow"))
        .unwrap_err();
    assert!(matches!(err, RackError::WarehouseFull));
    assert_eq!(depot.store().len(), 500);

    for column in 0..depot.geometry().columns {
        let occupancy = depot.column_occupancy(column).unwrap();
        assert_eq!(occupancy.level(), OccupancyLevel::Full);
    }
    assert_invariants(&depot);
}

#[test]
fn test_first_fit_fills_column_bottom_up() {
    let mut depot = Depot::default();
    let mut positions = Vec::new();
    for i in 0..7 {
        let (_, position) = depot
            .add_box(BoxDraft::new(format!("REF-{}", i), format!("OT-{}", i)))
            .unwrap();
        positions.push(position);
    }

    // Five land on (0,0), each pushed to the front; then (0,1) starts
    assert!(positions[..5].iter().all(|p| p.shelf() == Shelf::new(0, 0)));
    assert_eq!(positions[5], Position::new(0, 1, 0));
    assert_eq!(positions[6], Position::new(0, 1, 0));

    // The first box was pushed back by the four after it
    let first = depot.store().boxes().find(|b| b.reference == "REF-0").unwrap();
    assert_eq!(depot.find_position(&first.id), Some(Position::new(0, 0, 4)));
}

#[test]
fn test_pick_task_scenario() {
    let mut depot = seeded_depot();
    depot.set_operator("Juan Pérez");

    let task = depot
        .create_task(
            "BOX-001",
            TaskKind::Pick,
            Some("Client waiting at reception".to_string()),
        )
        .unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.from_position, Some(Shelf::new(0, 0)));
    assert_eq!(task.assigned_to, "Juan Pérez");
    assert_eq!(task.estimated_minutes, 10);
    assert!(depot.get_box("BOX-001").unwrap().has_task);

    depot.start_task(&task.id).unwrap();
    assert_eq!(depot.list_tasks_by_status(TaskStatus::InProgress).len(), 1);
    assert_eq!(depot.compute_stats().in_progress_tasks, 1);

    let done = depot.complete_task(&task.id).unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    assert!(done.completed_at.is_some());
    assert!(!depot.get_box("BOX-001").unwrap().has_task);
    assert_invariants(&depot);
}

#[test]
fn test_search_by_reference() {
    let depot = seeded_depot();

    let hits = depot.filter_boxes(&BoxFilter::new().with_search("REF-2024-001"));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "BOX-001");

    let filter = BoxFilter::parse("", "all", "all", "electronics").unwrap();
    let electronics = depot.filter_boxes(&filter);
    let ids: Vec<&str> = electronics.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["BOX-001", "BOX-006"]);

    assert_eq!(depot.find_by_code("OT-15849").unwrap().id, "BOX-003");
    assert!(depot.find_by_code("OT-99999").is_none());
}

#[test]
fn test_move_into_full_shelf_is_rejected() {
    let mut depot = seeded_depot();
    for n in 7..11 {
        depot
            .place_box_at(
                sample_box(n, Priority::Medium, BoxStatus::Available, Category::Other),
                Shelf::new(5, 1),
            )
            .unwrap();
    }
    assert!(depot.shelf_occupancy(Shelf::new(5, 1)).unwrap().is_full());
    let movements_before = depot.movements().len();

    let err = depot.move_box("BOX-003", 5, 1).unwrap_err();
    assert!(matches!(err, RackError::DestinationFull(shelf) if shelf == Shelf::new(5, 1)));
    assert_eq!(depot.find_position("BOX-003"), Some(Position::new(2, 0, 0)));
    assert_eq!(depot.movements().len(), movements_before);

    let err = depot
        .place_box_at(
            sample_box(11, Priority::Low, BoxStatus::Available, Category::Other),
            Shelf::new(5, 1),
        )
        .unwrap_err();
    assert!(matches!(err, RackError::ShelfFull(_)));
    assert_invariants(&depot);
}

#[test]
fn test_move_task_scenario() {
    let mut depot = seeded_depot();
    let draft = TaskDraft::for_box("BOX-003", TaskKind::Move).with_destination(Shelf::new(6, 1));
    let task = depot.create_task_from(draft).unwrap();
    assert_eq!(task.estimated_minutes, 15);
    assert_eq!(task.from_position, Some(Shelf::new(2, 0)));

    depot.start_task(&task.id).unwrap();
    depot.move_box("BOX-003", 6, 1).unwrap();
    // The flag follows the box across shelves
    assert!(depot.get_box("BOX-003").unwrap().has_task);

    depot.complete_task(&task.id).unwrap();
    assert!(!depot.get_box("BOX-003").unwrap().has_task);
    assert_eq!(depot.find_position("BOX-003"), Some(Position::new(6, 1, 0)));

    let history: Vec<MovementKind> = depot
        .movements()
        .for_box("BOX-003")
        .map(|m| m.kind)
        .collect();
    assert_eq!(history, vec![MovementKind::Add, MovementKind::Move]);
}

#[test]
fn test_mixed_operations_keep_invariants() {
    let mut depot = Depot::with_geometry(Geometry::new(3, 2, 2));
    let mut ids = Vec::new();
    for i in 0..10 {
        let (stored, _) = depot
            .add_box(BoxDraft::new(format!("REF-{}", i), format!("OT-{}", i)))
            .unwrap();
        ids.push(stored.id);
    }
    assert_invariants(&depot);

    let pick = depot.create_task(&ids[0], TaskKind::Pick, None).unwrap();
    let check = depot.create_task(&ids[0], TaskKind::Check, None).unwrap();
    depot.create_task(&ids[4], TaskKind::Reserve, None).unwrap();
    assert_invariants(&depot);

    depot.remove_box(&ids[1]).unwrap();
    depot.move_box(&ids[0], 0, 0).unwrap();
    depot.move_box(&ids[9], 2, 1).unwrap();
    assert_invariants(&depot);

    depot.complete_task(&pick.id).unwrap();
    assert!(depot.get_box(&ids[0]).unwrap().has_task);
    depot.complete_task(&check.id).unwrap();
    assert!(!depot.get_box(&ids[0]).unwrap().has_task);

    // 9 stored of 12; three more than fits
    depot.add_box(BoxDraft::new("REF-late-1", "OT-late-1")).unwrap();
    depot.add_box(BoxDraft::new("REF-late-2", "OT-late-2")).unwrap();
    depot.add_box(BoxDraft::new("REF-late-3", "OT-late-3")).unwrap();
    assert!(matches!(
        depot.add_box(BoxDraft::new("REF-over", "OT-over")),
        Err(RackError::WarehouseFull)
    ));
    assert_eq!(depot.store().len(), depot.geometry().capacity());
    assert_invariants(&depot);
}

#[test]
fn test_expiring_boxes() {
    let now = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
    let mut depot = Depot::default();
    depot
        .place_box(StorageBox::new("REF-A", "OT-A").with_expiry(now + Duration::days(3)))
        .unwrap();
    depot
        .place_box(StorageBox::new("REF-B", "OT-B").with_expiry(now - Duration::days(1)))
        .unwrap();
    depot
        .place_box(StorageBox::new("REF-C", "OT-C").with_expiry(now + Duration::days(60)))
        .unwrap();
    depot.place_box(StorageBox::new("REF-D", "OT-D")).unwrap();

    assert_eq!(depot.stats_at(now).expiring_boxes, 2);
}

#[test]
fn test_pending_queue_orders_by_priority() {
    let mut depot = seeded_depot();
    let low = depot.create_task("BOX-004", TaskKind::Check, None).unwrap();
    let high = depot.create_task("BOX-006", TaskKind::Pick, None).unwrap();
    let medium = depot.create_task("BOX-002", TaskKind::Check, None).unwrap();

    let queue: Vec<String> = depot
        .list_tasks_by_status(TaskStatus::Pending)
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(queue, vec![high.id, medium.id, low.id]);
}
