//! Warehouse store: capacity-checked placement, removal and moves
//!
//! Placement is first-fit: shelves are scanned columns ascending, heights
//! ascending, and the box goes to the front of the first stack with a free
//! slot. No balancing is attempted. Every operation either applies fully or
//! leaves the grid untouched.

use rack_core::{Geometry, Position, RackError, Result, Shelf, StorageBox};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grid::Grid;

/// Fill band of a shelf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyLevel {
    /// At capacity
    Full,
    /// More than 70% occupied
    Busy,
    Open,
}

/// Occupancy of a single shelf or a whole column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupancy {
    pub occupied: usize,
    pub capacity: usize,
}

impl Occupancy {
    pub fn free(&self) -> usize {
        self.capacity.saturating_sub(self.occupied)
    }

    pub fn is_full(&self) -> bool {
        self.occupied >= self.capacity
    }

    pub fn level(&self) -> OccupancyLevel {
        if self.is_full() {
            OccupancyLevel::Full
        } else if self.occupied * 10 > self.capacity * 7 {
            OccupancyLevel::Busy
        } else {
            OccupancyLevel::Open
        }
    }
}

#[derive(Debug, Clone)]
pub struct WarehouseStore {
    grid: Grid,
}

impl WarehouseStore {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            grid: Grid::new(geometry),
        }
    }

    pub fn geometry(&self) -> Geometry {
        self.grid.geometry()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn find_position(&self, box_id: &str) -> Option<Position> {
        self.grid.find(box_id)
    }

    pub fn get_box(&self, box_id: &str) -> Option<&StorageBox> {
        self.grid.get(box_id)
    }

    pub(crate) fn get_box_mut(&mut self, box_id: &str) -> Option<&mut StorageBox> {
        self.grid.get_mut(box_id)
    }

    /// Exact match on reference or work order (scanner lookup)
    pub fn find_by_code(&self, code: &str) -> Option<&StorageBox> {
        self.grid
            .boxes()
            .find(|b| b.reference == code || b.work_order == code)
    }

    pub fn boxes(&self) -> impl Iterator<Item = &StorageBox> + '_ {
        self.grid.boxes()
    }

    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// First-fit placement
    pub fn place(&mut self, storage_box: StorageBox) -> Result<Position> {
        self.ensure_not_stored(&storage_box.id)?;

        let max = self.geometry().max_boxes_per_height;
        let shelf = self
            .grid
            .shelves()
            .find(|(_, stack)| stack.len() < max)
            .map(|(shelf, _)| shelf)
            .ok_or(RackError::WarehouseFull)?;

        debug!("First fit for {} is {}", storage_box.id, shelf);
        Ok(self.insert_front(shelf, storage_box))
    }

    /// Place on a specific shelf
    pub fn place_at(&mut self, storage_box: StorageBox, shelf: Shelf) -> Result<Position> {
        self.ensure_in_bounds(shelf)?;
        self.ensure_not_stored(&storage_box.id)?;
        if self.shelf_occupancy(shelf)?.is_full() {
            return Err(RackError::ShelfFull(shelf));
        }
        Ok(self.insert_front(shelf, storage_box))
    }

    /// Remove a box, keeping the relative order of the rest of its stack
    pub fn remove(&mut self, box_id: &str) -> Result<(StorageBox, Position)> {
        let position = self
            .find_position(box_id)
            .ok_or_else(|| RackError::BoxNotFound(box_id.to_string()))?;
        let stack = self
            .grid
            .stack_mut(position.shelf())
            .ok_or_else(|| RackError::BoxNotFound(box_id.to_string()))?;
        let removed = stack.remove(position.stack_slot);
        Ok((removed, position))
    }

    /// Move a box to the front of another shelf's stack
    ///
    /// Validation happens before anything is touched, so a failed move leaves
    /// the box exactly where it was. Returns the old and new positions.
    pub fn move_box(&mut self, box_id: &str, destination: Shelf) -> Result<(Position, Position)> {
        let from = self
            .find_position(box_id)
            .ok_or_else(|| RackError::BoxNotFound(box_id.to_string()))?;
        self.ensure_in_bounds(destination)?;

        // Moving within the same shelf frees the box's own slot first
        if from.shelf() != destination && self.shelf_occupancy(destination)?.is_full() {
            return Err(RackError::DestinationFull(destination));
        }

        let (storage_box, _) = self.remove(box_id)?;
        let to = self.insert_front(destination, storage_box);
        Ok((from, to))
    }

    pub fn shelf_occupancy(&self, shelf: Shelf) -> Result<Occupancy> {
        let stack = self.grid.stack(shelf).ok_or(RackError::OutOfBounds(shelf))?;
        Ok(Occupancy {
            occupied: stack.len(),
            capacity: self.geometry().max_boxes_per_height,
        })
    }

    /// Occupancy summed over all heights of a column
    pub fn column_occupancy(&self, column: usize) -> Result<Occupancy> {
        let geometry = self.geometry();
        if column >= geometry.columns {
            return Err(RackError::OutOfBounds(Shelf::new(column, 0)));
        }
        let occupied = (0..geometry.heights)
            .filter_map(|height| self.grid.stack(Shelf::new(column, height)))
            .map(<[StorageBox]>::len)
            .sum();
        Ok(Occupancy {
            occupied,
            capacity: geometry.column_capacity(),
        })
    }

    /// Number of shelves at capacity
    pub fn full_shelves(&self) -> usize {
        let max = self.geometry().max_boxes_per_height;
        self.grid
            .shelves()
            .filter(|(_, stack)| stack.len() >= max)
            .count()
    }

    pub(crate) fn boxes_mut(&mut self) -> impl Iterator<Item = &mut StorageBox> + '_ {
        self.grid.boxes_mut()
    }

    fn insert_front(&mut self, shelf: Shelf, storage_box: StorageBox) -> Position {
        // Callers check bounds and capacity first
        if let Some(stack) = self.grid.stack_mut(shelf) {
            stack.insert(0, storage_box);
        }
        Position::new(shelf.column, shelf.height, 0)
    }

    fn ensure_in_bounds(&self, shelf: Shelf) -> Result<()> {
        if self.geometry().contains(shelf) {
            Ok(())
        } else {
            Err(RackError::OutOfBounds(shelf))
        }
    }

    fn ensure_not_stored(&self, box_id: &str) -> Result<()> {
        if self.find_position(box_id).is_some() {
            return Err(RackError::DuplicateBox(box_id.to_string()));
        }
        Ok(())
    }
}
