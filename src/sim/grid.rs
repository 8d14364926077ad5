//! Spawn grid geometry
//!
//! The spawn volume is a box `size` wide/high/long placed in front of the
//! ball, split into cells of `cell_size`. Cells are addressed by integer
//! `(x, y, z)`; `z` grows away from the thrower. The grid is centred on the
//! anchor (plus offset) along X and Y and starts there along Z.

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::FALLBACK_CELL_COUNT;

/// Spawn volume tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Width (X), height (Y) and length (Z) of the spawn volume
    pub size: Vec3,
    pub cell_size: Vec3,
    /// Offset of the volume from the anchor (the ball's rest position)
    pub offset: Vec3,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: Vec3::new(5.0, 3.0, 10.0),
            cell_size: Vec3::new(1.0, 1.0, 2.0),
            offset: Vec3::new(0.0, 1.0, 4.0),
        }
    }
}

/// Resolved grid: cell counts plus the world position of cell (0, 0, 0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnGrid {
    counts: IVec3,
    cell_size: Vec3,
    start: Vec3,
}

fn axis_count(size: f32, cell: f32) -> i32 {
    if cell > 0.0 {
        (size / cell).round() as i32
    } else {
        FALLBACK_CELL_COUNT
    }
}

impl SpawnGrid {
    pub fn new(config: &GridConfig, anchor: Vec3) -> Self {
        let counts = IVec3::new(
            axis_count(config.size.x, config.cell_size.x),
            axis_count(config.size.y, config.cell_size.y),
            axis_count(config.size.z, config.cell_size.z),
        );
        let half = counts.as_vec3() * Vec3::new(0.5, 0.5, 0.0);
        let start = anchor + config.offset + config.cell_size / 2.0 - config.cell_size * half;

        Self {
            counts,
            cell_size: config.cell_size,
            start,
        }
    }

    #[inline]
    pub fn counts(&self) -> IVec3 {
        self.counts
    }

    pub fn cell_size(&self) -> Vec3 {
        self.cell_size
    }

    pub fn total_cells(&self) -> usize {
        self.counts.max(IVec3::ZERO).element_product() as usize
    }

    pub fn contains(&self, cell: IVec3) -> bool {
        cell.cmpge(IVec3::ZERO).all() && cell.cmplt(self.counts).all()
    }

    /// World-space centre of a cell
    pub fn cell_position(&self, cell: IVec3) -> Vec3 {
        self.start + self.cell_size * cell.as_vec3()
    }

    /// Every cell index, X-major
    pub fn cells(&self) -> impl Iterator<Item = IVec3> + '_ {
        let n = self.counts.max(IVec3::ZERO);
        (0..n.x).flat_map(move |x| {
            (0..n.y).flat_map(move |y| (0..n.z).map(move |z| IVec3::new(x, y, z)))
        })
    }

    /// World-space `(min, max)` corners of the whole volume
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let min = self.start - self.cell_size / 2.0;
        (min, min + self.cell_size * self.counts.as_vec3())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_counts_round_and_fall_back() {
        let grid = SpawnGrid::new(
            &GridConfig {
                size: Vec3::new(5.0, 4.4, 10.0),
                cell_size: Vec3::new(1.0, 1.0, 0.0),
                offset: Vec3::ZERO,
            },
            Vec3::ZERO,
        );
        assert_eq!(grid.counts(), IVec3::new(5, 4, FALLBACK_CELL_COUNT));
        assert_eq!(grid.total_cells(), 5 * 4 * 5);
        assert_eq!(grid.cells().count(), grid.total_cells());
    }

    #[test]
    fn test_odd_grid_centres_middle_cell_on_anchor() {
        let anchor = Vec3::new(1.0, 2.0, 3.0);
        let config = GridConfig {
            size: Vec3::new(3.0, 3.0, 4.0),
            cell_size: Vec3::new(1.0, 1.0, 2.0),
            offset: Vec3::new(0.0, 0.0, 5.0),
        };
        let grid = SpawnGrid::new(&config, anchor);
        assert_eq!(grid.cell_size(), config.cell_size);

        let middle = grid.cell_position(IVec3::new(1, 1, 0));
        assert!((middle.x - anchor.x).abs() < 1e-6);
        assert!((middle.y - anchor.y).abs() < 1e-6);
        // Half a cell into the volume along Z
        assert!((middle.z - (anchor.z + 5.0 + 1.0)).abs() < 1e-6);

        let next = grid.cell_position(IVec3::new(1, 1, 1));
        assert!((next.z - middle.z - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_contains_and_bounds() {
        let grid = SpawnGrid::new(&GridConfig::default(), Vec3::ZERO);
        let counts = grid.counts();
        assert!(grid.contains(IVec3::ZERO));
        assert!(grid.contains(counts - IVec3::ONE));
        assert!(!grid.contains(counts));
        assert!(!grid.contains(IVec3::new(-1, 0, 0)));

        let (min, max) = grid.bounds();
        for cell in grid.cells() {
            let p = grid.cell_position(cell);
            assert!(p.cmpgt(min).all() && p.cmplt(max).all());
        }
    }
}
