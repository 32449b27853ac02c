use crate::math::Cell;
use std::collections::HashSet;

/// default grid side, in cells
pub const DEFAULT_GRID_SIZE: i32 = 10;

/// a 3 cells wall and 2 pillars
pub const DEFAULT_OBSTACLES: [Cell; 5] = [
    Cell::new(3, 3),
    Cell::new(4, 3),
    Cell::new(5, 3),
    Cell::new(7, 6),
    Cell::new(2, 8),
];

/// Square grid with a fixed set of blocked cells.
///
/// There are no setters: once built, a grid only answers queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    size: i32,
    obstacles: HashSet<Cell>,
}

impl Default for Grid {
    /// defaults to the 10x10 map
    fn default() -> Self {
        Grid::new(DEFAULT_GRID_SIZE, DEFAULT_OBSTACLES)
    }
}

impl Grid {
    pub fn new(size: i32, obstacles: impl IntoIterator<Item = Cell>) -> Self {
        Self {
            size,
            obstacles: obstacles.into_iter().collect(),
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn is_blocked(&self, cell: Cell) -> bool {
        self.obstacles.contains(&cell)
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        (0..self.size).contains(&cell.x) && (0..self.size).contains(&cell.y)
    }

    /// obstacles sorted by (x, y), for stable output
    pub fn obstacles(&self) -> Vec<Cell> {
        let mut obstacles: Vec<Cell> = self.obstacles.iter().copied().collect();
        obstacles.sort();
        obstacles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_blocks_the_wall_and_pillars() {
        let grid = Grid::default();
        assert_eq!(grid.size(), 10);
        for obstacle in DEFAULT_OBSTACLES {
            assert!(grid.is_blocked(obstacle), "{obstacle} should be blocked");
        }
        assert!(!grid.is_blocked(Cell::new(4, 2)));
        assert!(!grid.is_blocked(Cell::new(0, 1)));
    }

    #[test]
    fn bounds_are_half_open() {
        let grid = Grid::default();
        assert!(grid.in_bounds(Cell::new(0, 0)));
        assert!(grid.in_bounds(Cell::new(9, 9)));
        assert!(!grid.in_bounds(Cell::new(-1, 4)));
        assert!(!grid.in_bounds(Cell::new(4, 10)));
        assert!(!grid.in_bounds(Cell::new(10, 0)));
    }

    #[test]
    fn custom_grid() {
        let grid = Grid::new(4, [Cell::new(1, 1)]);
        assert!(grid.is_blocked(Cell::new(1, 1)));
        assert!(!grid.in_bounds(Cell::new(4, 3)));
        assert_eq!(grid.obstacles(), vec![Cell::new(1, 1)]);
    }
}
