//! Arena layouts: a grid of blocked and open cells plus named points.
use glam::Vec2;

pub const BLOCKED: char = '#';
pub const OPEN: char = '.';

/// Static arena geometry.
///
/// Row 0 is the bottom of the arena; cell `(col, row)` covers the square
/// from `(col, row) * cell_size` to `(col + 1, row + 1) * cell_size`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArenaLayout {
    pub name: String,
    pub cell_size: f32,
    pub rows: Vec<String>,
    pub spawn_points: Vec<(f32, f32)>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub player_starts: Vec<(f32, f32)>,
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("layout has no rows")]
    Empty,

    #[error("row {row} has width {found}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unexpected cell '{cell}' at ({col}, {row})")]
    UnknownCell { cell: char, col: usize, row: usize },

    #[error("cell size must be positive, got {0}")]
    InvalidCellSize(f32),

    #[error("point ({x}, {y}) is outside the arena or blocked")]
    UnreachablePoint { x: f32, y: f32 },
}

impl ArenaLayout {
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, |row| row.chars().count())
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// World-space size of the arena.
    pub fn extent(&self) -> Vec2 {
        Vec2::new(self.width() as f32, self.height() as f32) * self.cell_size
    }

    /// Out-of-bounds cells count as blocked.
    pub fn is_blocked(&self, col: usize, row: usize) -> bool {
        self.rows
            .get(row)
            .and_then(|cells| cells.chars().nth(col))
            .is_none_or(|cell| cell == BLOCKED)
    }

    pub fn blocked_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .chars()
                .enumerate()
                .filter(|&(_, cell)| cell == BLOCKED)
                .map(move |(col, _)| (col, row))
        })
    }

    pub fn cell_center(&self, col: usize, row: usize) -> Vec2 {
        (Vec2::new(col as f32, row as f32) + Vec2::splat(0.5)) * self.cell_size
    }

    /// Cell containing `point`, if it lies inside the arena.
    pub fn cell_at(&self, point: Vec2) -> Option<(usize, usize)> {
        if !point.is_finite() || point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let col = (point.x / self.cell_size) as usize;
        let row = (point.y / self.cell_size) as usize;
        (col < self.width() && row < self.height()).then_some((col, row))
    }

    pub fn spawn_points(&self) -> Vec<Vec2> {
        self.spawn_points.iter().map(|&(x, y)| Vec2::new(x, y)).collect()
    }

    pub fn player_starts(&self) -> Vec<Vec2> {
        self.player_starts.iter().map(|&(x, y)| Vec2::new(x, y)).collect()
    }

    /// Checks the grid shape and that every named point stands on open
    /// ground.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.rows.is_empty() {
            return Err(LayoutError::Empty);
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(LayoutError::InvalidCellSize(self.cell_size));
        }

        let expected = self.width();
        for (row, cells) in self.rows.iter().enumerate() {
            let found = cells.chars().count();
            if found != expected {
                return Err(LayoutError::RaggedRow {
                    row,
                    expected,
                    found,
                });
            }
            if let Some((col, cell)) = cells
                .chars()
                .enumerate()
                .find(|&(_, cell)| cell != BLOCKED && cell != OPEN)
            {
                return Err(LayoutError::UnknownCell { cell, col, row });
            }
        }

        for &(x, y) in self.spawn_points.iter().chain(&self.player_starts) {
            let open = self
                .cell_at(Vec2::new(x, y))
                .is_some_and(|(col, row)| !self.is_blocked(col, row));
            if !open {
                return Err(LayoutError::UnreachablePoint { x, y });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(rows: &[&str]) -> ArenaLayout {
        ArenaLayout {
            name: "test".into(),
            cell_size: 2.0,
            rows: rows.iter().map(|row| row.to_string()).collect(),
            spawn_points: vec![(3.0, 3.0)],
            player_starts: Vec::new(),
        }
    }

    #[test]
    fn blocked_cells_and_bounds() {
        let arena = layout(&["####", "#..#", "####"]);

        assert_eq!(arena.width(), 4);
        assert_eq!(arena.height(), 3);
        assert!(!arena.is_blocked(1, 1));
        assert!(arena.is_blocked(0, 1));
        assert!(arena.is_blocked(9, 9));
        assert_eq!(arena.blocked_cells().count(), 10);
        assert_eq!(arena.cell_center(1, 1), Vec2::new(3.0, 3.0));
        assert_eq!(arena.cell_at(Vec2::new(3.0, 3.0)), Some((1, 1)));
        arena.validate().unwrap();
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let arena = layout(&["####", "#..", "####"]);

        assert!(matches!(
            arena.validate(),
            Err(LayoutError::RaggedRow { row: 1, .. })
        ));
    }

    #[test]
    fn spawn_point_inside_a_wall_is_rejected() {
        let mut arena = layout(&["####", "#..#", "####"]);
        arena.spawn_points = vec![(1.0, 1.0)];

        assert!(matches!(
            arena.validate(),
            Err(LayoutError::UnreachablePoint { .. })
        ));
    }
}
