// Uniform spatial grid used by the broad phase to propose candidate pairs.

use std::collections::HashSet;

use tracing::debug;

use super::broadphase::ProxyKey;
use crate::collision::AABB;
use crate::math::vec2::Vec2;

/// Upper bound on the number of cells a grid allocates.
pub const MAX_CELLS: usize = 1 << 20;

#[derive(Debug, Default, Clone)]
struct GridCell {
    proxies: Vec<ProxyKey>,
}

/// A uniform spatial grid for accelerating collision detection.
#[derive(Debug)]
pub struct SpatialGrid {
    bounds: AABB,          // The overall area covered by the grid
    inv_cell_size: f64,    // 1.0 / cell_size, cached for performance
    num_cols: usize,
    num_rows: usize,
    cells: Vec<GridCell>,  // Flattened 1D vector representing the 2D grid

    // Reused across queries; a proxy spanning several cells reports each pair once.
    seen_pairs: HashSet<(ProxyKey, ProxyKey)>,
}

impl SpatialGrid {
    /// Creates a grid covering `bounds` with square cells of `cell_size`.
    ///
    /// Returns `None` for a non-positive or non-finite cell size and for bounds that
    /// are not finite or are inverted. Cells are enlarged as needed so the grid never
    /// holds more than `MAX_CELLS` of them.
    pub fn new(bounds: AABB, cell_size: f64) -> Option<Self> {
        let finite = [bounds.min.x, bounds.min.y, bounds.max.x, bounds.max.y, cell_size]
            .iter()
            .all(|v| v.is_finite());
        if !finite || cell_size <= 0.0 || bounds.max.x < bounds.min.x || bounds.max.y < bounds.min.y {
            return None;
        }
        let grid_width = bounds.max.x - bounds.min.x;
        let grid_height = bounds.max.y - bounds.min.y;

        // At least one cell in each direction
        let dims = |size: f64| {
            (
                (grid_width / size).ceil().max(1.0),
                (grid_height / size).ceil().max(1.0),
            )
        };
        let mut cell_size = cell_size;
        let (mut cols, mut rows) = dims(cell_size);
        while cols * rows > MAX_CELLS as f64 {
            cell_size *= 2.0;
            (cols, rows) = dims(cell_size);
        }
        let (num_cols, num_rows) = (cols as usize, rows as usize);

        debug!(?bounds, cell_size, num_cols, num_rows, "creating spatial grid");

        Some(SpatialGrid {
            bounds,
            inv_cell_size: 1.0 / cell_size,
            num_cols,
            num_rows,
            cells: vec![GridCell::default(); num_cols * num_rows],
            seen_pairs: HashSet::new(),
        })
    }

    /// Converts world coordinates to grid cell indices (col, row). May lie outside the grid.
    #[inline]
    fn get_cell_indices(&self, point: Vec2) -> (isize, isize) {
        let local_x = point.x - self.bounds.min.x;
        let local_y = point.y - self.bounds.min.y;
        let col = (local_x * self.inv_cell_size).floor() as isize;
        let row = (local_y * self.inv_cell_size).floor() as isize;
        (col, row)
    }

    /// Range of cells overlapped by an AABB, clamped into the grid.
    ///
    /// Anything beyond the bounds lands in the border cells, so two out-of-bounds
    /// proxies that overlap still share a cell.
    fn get_cell_range(&self, aabb: &AABB) -> (usize, usize, usize, usize) {
        let (min_col, min_row) = self.get_cell_indices(aabb.min);
        let (max_col, max_row) = self.get_cell_indices(aabb.max);
        let clamp_col = |c: isize| c.clamp(0, self.num_cols as isize - 1) as usize;
        let clamp_row = |r: isize| r.clamp(0, self.num_rows as isize - 1) as usize;
        (clamp_col(min_col), clamp_row(min_row), clamp_col(max_col), clamp_row(max_row))
    }

    /// Clears all proxies from the grid cells.
    pub fn clear(&mut self) {
        for cell in self.cells.iter_mut() {
            cell.proxies.clear();
        }
    }

    /// Inserts a proxy into every cell its AABB touches.
    pub fn insert(&mut self, proxy: ProxyKey, aabb: &AABB) {
        let (min_col, min_row, max_col, max_row) = self.get_cell_range(aabb);
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                self.cells[col + row * self.num_cols].proxies.push(proxy);
            }
        }
    }

    /// Every pair of proxies sharing at least one cell, each reported once in
    /// ascending key order.
    pub fn query_potential_pairs(&mut self) -> Vec<(ProxyKey, ProxyKey)> {
        let mut potential_pairs = Vec::new();
        self.seen_pairs.clear();

        for cell in &self.cells {
            let proxies = &cell.proxies;
            for i in 0..proxies.len() {
                for j in (i + 1)..proxies.len() {
                    let (a, b) = if proxies[i] < proxies[j] {
                        (proxies[i], proxies[j])
                    } else {
                        (proxies[j], proxies[i])
                    };
                    if self.seen_pairs.insert((a, b)) {
                        potential_pairs.push((a, b));
                    }
                }
            }
        }
        potential_pairs
    }
}
