//! Toroidal single-occupancy grid and neighbourhood queries.

use crate::agent::AgentId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A cell coordinate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Neighbourhood shape
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// Cells within Manhattan distance `radius`
    VonNeumann,
    /// Cells within Chebyshev distance `radius`
    Moore,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("cell {pos:?} is outside the {width}x{height} grid")]
    OutOfBounds {
        pos: Position,
        width: usize,
        height: usize,
    },
    #[error("cell {pos:?} is already occupied by agent {occupant}")]
    Occupied { pos: Position, occupant: AgentId },
}

/// Torus-wrapped grid holding at most one agent per cell
#[derive(Clone, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    /// cells[y * width + x]
    cells: Vec<Option<AgentId>>,
}

impl Grid {
    /// Create an empty grid
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, pos: Position) -> Option<usize> {
        (pos.x < self.width && pos.y < self.height).then(|| pos.y * self.width + pos.x)
    }

    fn checked_index(&self, pos: Position) -> Result<usize, GridError> {
        self.index(pos).ok_or(GridError::OutOfBounds {
            pos,
            width: self.width,
            height: self.height,
        })
    }

    /// Agent occupying a cell, if any
    #[inline]
    pub fn get(&self, pos: Position) -> Option<AgentId> {
        self.index(pos).and_then(|i| self.cells[i])
    }

    /// Check whether a cell is empty. Out-of-bounds cells are never empty.
    #[inline]
    pub fn is_empty(&self, pos: Position) -> bool {
        self.index(pos).is_some_and(|i| self.cells[i].is_none())
    }

    /// Place an agent on an empty cell
    pub fn place(&mut self, id: AgentId, pos: Position) -> Result<(), GridError> {
        let idx = self.checked_index(pos)?;
        if let Some(occupant) = self.cells[idx] {
            return Err(GridError::Occupied { pos, occupant });
        }
        self.cells[idx] = Some(id);
        Ok(())
    }

    /// Clear a cell, returning its former occupant
    pub fn remove(&mut self, pos: Position) -> Option<AgentId> {
        let idx = self.index(pos)?;
        self.cells[idx].take()
    }

    /// Move an agent between cells.
    ///
    /// Callers only move into cells they have just observed to be empty, so
    /// a violation is a programming error and trips a debug assertion.
    pub fn move_agent(&mut self, id: AgentId, from: Position, to: Position) {
        debug_assert_eq!(self.get(from), Some(id), "agent {id} is not at {from:?}");
        debug_assert!(self.is_empty(to), "move of agent {id} into occupied {to:?}");
        if let Some(i) = self.index(from) {
            self.cells[i] = None;
        }
        if let Some(i) = self.index(to) {
            self.cells[i] = Some(id);
        }
    }

    /// All cells within `radius` of `center`, wrapped around the torus,
    /// excluding the centre and without duplicates.
    pub fn neighborhood(&self, center: Position, radius: usize, shape: Shape) -> Vec<Position> {
        let r = radius as isize;
        let mut cells = Vec::new();

        for dx in -r..=r {
            for dy in -r..=r {
                if shape == Shape::VonNeumann && dx.abs() + dy.abs() > r {
                    continue;
                }
                if dx == 0 && dy == 0 {
                    continue;
                }
                let pos = self.wrap(center, dx, dy);
                if pos != center && !cells.contains(&pos) {
                    cells.push(pos);
                }
            }
        }

        cells
    }

    #[inline]
    fn wrap(&self, pos: Position, dx: isize, dy: isize) -> Position {
        let x = (pos.x as isize + dx).rem_euclid(self.width as isize) as usize;
        let y = (pos.y as isize + dy).rem_euclid(self.height as isize) as usize;
        Position::new(x, y)
    }

    /// Every cell, column by column (x outer, y inner)
    pub fn coords(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.width).flat_map(move |x| (0..self.height).map(move |y| Position::new(x, y)))
    }

    /// Number of occupied cells
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_and_get() {
        let mut grid = Grid::new(10, 8);
        grid.place(3, Position::new(2, 5)).unwrap();

        assert_eq!(grid.get(Position::new(2, 5)), Some(3));
        assert!(!grid.is_empty(Position::new(2, 5)));
        assert!(grid.is_empty(Position::new(5, 2)));
        assert_eq!(grid.occupied(), 1);
    }

    #[test]
    fn test_place_rejects_occupied_and_out_of_bounds() {
        let mut grid = Grid::new(4, 4);
        grid.place(0, Position::new(1, 1)).unwrap();

        assert_eq!(
            grid.place(1, Position::new(1, 1)),
            Err(GridError::Occupied { pos: Position::new(1, 1), occupant: 0 })
        );
        assert!(matches!(
            grid.place(1, Position::new(4, 0)),
            Err(GridError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_von_neumann_wraps() {
        let grid = Grid::new(5, 5);
        let cells = grid.neighborhood(Position::new(0, 0), 1, Shape::VonNeumann);

        assert_eq!(cells.len(), 4);
        assert!(cells.contains(&Position::new(4, 0)));
        assert!(cells.contains(&Position::new(1, 0)));
        assert!(cells.contains(&Position::new(0, 4)));
        assert!(cells.contains(&Position::new(0, 1)));
    }

    #[test]
    fn test_moore_radius() {
        let grid = Grid::new(9, 9);
        assert_eq!(grid.neighborhood(Position::new(4, 4), 1, Shape::Moore).len(), 8);
        assert_eq!(grid.neighborhood(Position::new(4, 4), 2, Shape::VonNeumann).len(), 12);
    }

    #[test]
    fn test_small_torus_deduplicates() {
        // In a 3x1 ring every cell neighbours the other two exactly once.
        let grid = Grid::new(3, 1);
        let cells = grid.neighborhood(Position::new(0, 0), 1, Shape::VonNeumann);
        assert_eq!(cells.len(), 2);
        assert!(cells.contains(&Position::new(1, 0)));
        assert!(cells.contains(&Position::new(2, 0)));
    }

    #[test]
    fn test_move_agent() {
        let mut grid = Grid::new(5, 5);
        grid.place(7, Position::new(1, 1)).unwrap();
        grid.move_agent(7, Position::new(1, 1), Position::new(1, 2));

        assert!(grid.is_empty(Position::new(1, 1)));
        assert_eq!(grid.get(Position::new(1, 2)), Some(7));
    }

    #[test]
    fn test_coords_column_major() {
        let grid = Grid::new(2, 3);
        let coords: Vec<_> = grid.coords().collect();
        assert_eq!(coords.len(), 6);
        assert_eq!(coords[0], Position::new(0, 0));
        assert_eq!(coords[1], Position::new(0, 1));
        assert_eq!(coords[3], Position::new(1, 0));
    }
}
