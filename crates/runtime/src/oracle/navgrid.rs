//! Walkability over an arena layout.
use glam::Vec2;

use arena_content::ArenaLayout;
use arena_core::NavigationOracle;

/// How many cells around the query the nearest-node search looks.
const SEARCH_RADIUS_CELLS: i64 = 6;

pub struct NavGrid {
    layout: ArenaLayout,
}

impl NavGrid {
    pub fn new(layout: ArenaLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ArenaLayout {
        &self.layout
    }

    pub fn is_walkable(&self, point: Vec2) -> bool {
        self.layout
            .cell_at(point)
            .is_some_and(|(col, row)| !self.layout.is_blocked(col, row))
    }

    /// Whether every point on the segment stands on open ground.
    ///
    /// Sampled at a quarter cell, which is fine enough that a segment cannot
    /// cut the corner of a blocked cell unnoticed by more than that.
    pub fn segment_clear(&self, from: Vec2, to: Vec2) -> bool {
        let step = self.layout.cell_size * 0.25;
        let samples = (from.distance(to) / step).ceil().max(1.0) as usize;
        (0..=samples).all(|i| self.is_walkable(from.lerp(to, i as f32 / samples as f32)))
    }
}

impl NavigationOracle for NavGrid {
    fn nearest_walkable_node(&self, point: Vec2) -> Option<Vec2> {
        if !point.is_finite() {
            return None;
        }
        if self.is_walkable(point) {
            return Some(point);
        }

        let width = self.layout.width() as i64;
        let height = self.layout.height() as i64;
        let cell = self.layout.cell_size;
        let col = ((point.x / cell).floor() as i64).clamp(0, width - 1);
        let row = ((point.y / cell).floor() as i64).clamp(0, height - 1);

        let mut best: Option<(f32, Vec2)> = None;
        for dr in -SEARCH_RADIUS_CELLS..=SEARCH_RADIUS_CELLS {
            for dc in -SEARCH_RADIUS_CELLS..=SEARCH_RADIUS_CELLS {
                let (c, r) = (col + dc, row + dr);
                if c < 0 || r < 0 || c >= width || r >= height {
                    continue;
                }
                let (c, r) = (c as usize, r as usize);
                if self.layout.is_blocked(c, r) {
                    continue;
                }
                let center = self.layout.cell_center(c, r);
                let distance = center.distance_squared(point);
                if best.is_none_or(|(d, _)| distance < d) {
                    best = Some((distance, center));
                }
            }
        }
        best.map(|(_, center)| center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walled() -> ArenaLayout {
        ArenaLayout {
            name: "walled".into(),
            cell_size: 1.0,
            rows: vec![
                "#####".into(),
                "#...#".into(),
                "#.#.#".into(),
                "#...#".into(),
                "#####".into(),
            ],
            spawn_points: vec![(1.5, 1.5)],
            player_starts: vec![],
        }
    }

    #[test]
    fn open_points_are_returned_as_is() {
        let grid = NavGrid::new(walled());
        let point = Vec2::new(1.2, 3.7);
        assert_eq!(grid.nearest_walkable_node(point), Some(point));
    }

    #[test]
    fn blocked_points_snap_to_the_closest_open_cell() {
        let grid = NavGrid::new(walled());
        assert_eq!(
            grid.nearest_walkable_node(Vec2::new(2.5, 2.4)),
            Some(Vec2::new(2.5, 1.5))
        );
        assert_eq!(
            grid.nearest_walkable_node(Vec2::new(-3.0, 1.5)),
            Some(Vec2::new(1.5, 1.5))
        );
    }

    #[test]
    fn a_grid_without_open_cells_has_no_nodes() {
        let grid = NavGrid::new(ArenaLayout {
            rows: vec!["###".into(), "###".into()],
            ..walled()
        });
        assert_eq!(grid.nearest_walkable_node(Vec2::new(1.0, 1.0)), None);
    }

    #[test]
    fn segments_through_walls_are_not_clear() {
        let grid = NavGrid::new(walled());
        assert!(grid.segment_clear(Vec2::new(1.5, 1.5), Vec2::new(3.5, 1.5)));
        assert!(!grid.segment_clear(Vec2::new(1.5, 2.5), Vec2::new(3.5, 2.5)));
    }
}
