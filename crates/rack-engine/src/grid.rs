//! Position index: the column x height x stack-slot grid of boxes
//!
//! The grid owns every stored box. Lookups are linear scans in a fixed order
//! (columns ascending, heights ascending, then stack order), which keeps
//! results deterministic and is cheap at warehouse scale.

use rack_core::{Geometry, Position, Shelf, StorageBox};

#[derive(Debug, Clone)]
pub struct Grid {
    geometry: Geometry,
    // stacks[column][height], front (index 0) is the newest box
    stacks: Vec<Vec<Vec<StorageBox>>>,
}

impl Grid {
    pub fn new(geometry: Geometry) -> Self {
        let stacks = (0..geometry.columns)
            .map(|_| (0..geometry.heights).map(|_| Vec::new()).collect())
            .collect();
        Self { geometry, stacks }
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// The stack on a shelf, or `None` when the shelf is outside the grid
    pub fn stack(&self, shelf: Shelf) -> Option<&[StorageBox]> {
        self.stacks
            .get(shelf.column)
            .and_then(|column| column.get(shelf.height))
            .map(Vec::as_slice)
    }

    pub(crate) fn stack_mut(&mut self, shelf: Shelf) -> Option<&mut Vec<StorageBox>> {
        self.stacks
            .get_mut(shelf.column)
            .and_then(|column| column.get_mut(shelf.height))
    }

    /// Box stored at an exact position
    pub fn at(&self, position: Position) -> Option<&StorageBox> {
        self.stack(position.shelf())
            .and_then(|stack| stack.get(position.stack_slot))
    }

    /// Reverse lookup: first position holding `box_id` in scan order
    pub fn find(&self, box_id: &str) -> Option<Position> {
        self.shelves().find_map(|(shelf, stack)| {
            stack
                .iter()
                .position(|b| b.id == box_id)
                .map(|slot| Position::new(shelf.column, shelf.height, slot))
        })
    }

    pub fn get(&self, box_id: &str) -> Option<&StorageBox> {
        self.find(box_id).and_then(|position| self.at(position))
    }

    pub(crate) fn get_mut(&mut self, box_id: &str) -> Option<&mut StorageBox> {
        let position = self.find(box_id)?;
        self.stack_mut(position.shelf())
            .and_then(|stack| stack.get_mut(position.stack_slot))
    }

    /// Every shelf with its stack, in scan order
    pub fn shelves(&self) -> impl Iterator<Item = (Shelf, &[StorageBox])> + '_ {
        self.geometry.shelves().map(move |shelf| {
            let stack = &self.stacks[shelf.column][shelf.height];
            (shelf, stack.as_slice())
        })
    }

    /// Every stored box, in scan order
    pub fn boxes(&self) -> impl Iterator<Item = &StorageBox> + '_ {
        self.stacks.iter().flatten().flatten()
    }

    pub(crate) fn boxes_mut(&mut self) -> impl Iterator<Item = &mut StorageBox> + '_ {
        self.stacks.iter_mut().flatten().flatten()
    }

    pub fn len(&self) -> usize {
        self.stacks.iter().flatten().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
