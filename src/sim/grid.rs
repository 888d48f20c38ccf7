//! Destructible grid of rectangular cells
//!
//! Cells are laid out row-major, top row first, left to right. A destroyed
//! cell keeps its slot: its corners move to `SENTINEL`, far outside the
//! world, so the cell count and the index pattern never change. Only the
//! geometry and the destroyed set do.
//!
//! The grid is pure data. Every regeneration bumps `revision`; the renderer
//! compares revisions to decide when its mesh needs re-uploading.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use super::aabb::Aabb;
use crate::consts::{SENTINEL, WORLD_HALF_EXTENTS};

/// Indices of one cell's two triangles, relative to its first corner
pub const CELL_INDEX_PATTERN: [u32; 6] = [0, 1, 3, 3, 1, 2];

/// One grid cell: corners in top-left, bottom-left, bottom-right,
/// top-right order
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Cell {
    pub corners: [Vec2; 4],
}

impl Cell {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        let h = size / 2.0;
        Self {
            corners: [
                Vec2::new(center.x - h.x, center.y + h.y),
                Vec2::new(center.x - h.x, center.y - h.y),
                Vec2::new(center.x + h.x, center.y - h.y),
                Vec2::new(center.x + h.x, center.y + h.y),
            ],
        }
    }

    /// Collapsed, off-world geometry for a destroyed cell
    pub fn sentinel() -> Self {
        Self {
            corners: [SENTINEL; 4],
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.corners.iter().all(|&c| c == SENTINEL)
    }

    pub fn bounds(&self) -> Aabb {
        let [top_left, _, bottom_right, _] = self.corners;
        Aabb::new(
            Vec2::new(top_left.x, bottom_right.y),
            Vec2::new(bottom_right.x, top_left.y),
        )
    }

    /// Strict overlap between this cell and a `size` box at `position`
    /// grown by `bias`
    pub fn hit(&self, position: Vec2, size: Vec2, bias: f32) -> bool {
        Aabb::from_center(position, size)
            .expand(bias)
            .overlaps(&self.bounds())
    }
}

/// Placement of the grid in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    /// Center of the top-left cell
    pub origin: Vec2,
    pub cell_size: Vec2,
    pub margin: f32,
    pub columns: usize,
    pub rows: usize,
}

impl GridLayout {
    /// Fill the world's width with `columns` cells three times wider than
    /// tall, starting in the top-left corner
    pub fn fitted(columns: usize, rows: usize, margin: f32) -> Self {
        let world = WORLD_HALF_EXTENTS * 2.0;
        let width = world.x / columns.max(1) as f32 - margin * 1.1;
        let height = width / 3.0;
        Self {
            origin: Vec2::new(
                -WORLD_HALF_EXTENTS.x + margin + width / 2.0,
                WORLD_HALF_EXTENTS.y - margin - height / 2.0,
            ),
            cell_size: Vec2::new(width, height),
            margin,
            columns,
            rows,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.columns * self.rows
    }

    pub fn index_count(&self) -> usize {
        self.cell_count() * CELL_INDEX_PATTERN.len()
    }
}

#[derive(Debug, Clone)]
pub struct BoxGrid {
    layout: GridLayout,
    cells: Vec<Cell>,
    indices: Vec<u32>,
    destroyed: Vec<usize>,
    revision: u64,
}

impl BoxGrid {
    pub fn new(layout: GridLayout) -> Self {
        let mut grid = Self {
            layout,
            cells: Vec::with_capacity(layout.cell_count()),
            indices: Vec::with_capacity(layout.index_count()),
            destroyed: Vec::new(),
            revision: 0,
        };
        grid.regenerate();
        grid
    }

    /// Rebuild every cell's geometry and the index list from the layout and
    /// the destroyed set
    pub fn regenerate(&mut self) {
        let GridLayout {
            origin,
            cell_size,
            margin,
            columns,
            rows,
        } = self.layout;

        self.cells.clear();
        let mut index = 0;
        let mut y = origin.y;
        for _ in 0..rows {
            let mut x = origin.x;
            for _ in 0..columns {
                let cell = if self.destroyed.contains(&index) {
                    Cell::sentinel()
                } else {
                    Cell::new(Vec2::new(x, y), cell_size)
                };
                self.cells.push(cell);
                x += margin + cell_size.x;
                index += 1;
            }
            y -= margin + cell_size.y;
        }

        self.indices = generate_indices(self.cells.len());
        self.revision += 1;
    }

    /// Mark cell `index` destroyed and regenerate
    ///
    /// Out-of-range indices are ignored. Destroying an already destroyed cell
    /// changes nothing.
    pub fn destroy_box(&mut self, index: usize) {
        if index >= self.cells.len() {
            log::warn!("destroy_box({index}) out of range ({} cells)", self.cells.len());
            return;
        }
        if self.destroyed.contains(&index) {
            return;
        }

        self.destroyed.push(index);
        self.regenerate();
        log::debug!(
            "cell {index} destroyed, {} of {} left",
            self.alive_count(),
            self.cells.len()
        );
    }

    /// Whether cell `index` overlaps a `size` box at `position` grown by `bias`
    pub fn hit(&self, index: usize, position: Vec2, size: Vec2, bias: f32) -> bool {
        self.cells
            .get(index)
            .is_some_and(|cell| cell.hit(position, size, bias))
    }

    /// Lowest-index cell the box overlaps
    pub fn first_hit(&self, position: Vec2, size: Vec2, bias: f32) -> Option<usize> {
        self.cells
            .iter()
            .position(|cell| cell.hit(position, size, bias))
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Destroyed cell indices in destruction order
    pub fn destroyed(&self) -> &[usize] {
        &self.destroyed
    }

    pub fn is_destroyed(&self, index: usize) -> bool {
        self.destroyed.contains(&index)
    }

    pub fn alive_count(&self) -> usize {
        self.cells.len() - self.destroyed.len()
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Bumped by every regeneration
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Six indices per cell, advancing by four corners per cell
pub fn generate_indices(cell_count: usize) -> Vec<u32> {
    (0..cell_count as u32)
        .flat_map(|cell| CELL_INDEX_PATTERN.map(|i| cell * 4 + i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn layout(columns: usize, rows: usize) -> GridLayout {
        GridLayout::fitted(columns, rows, 0.01)
    }

    #[test]
    fn test_destroy_one_of_ten_by_seven() {
        let mut grid = BoxGrid::new(layout(10, 7));
        grid.destroy_box(5);

        assert_eq!(grid.cells().len(), 70);
        assert!(grid.cells()[5].is_sentinel());
        assert_eq!(grid.cells()[5].corners, [Vec2::new(-100.0, -100.0); 4]);
        assert!(!grid.cells()[4].is_sentinel());
        assert_eq!(grid.indices().len(), 420);
    }

    #[test]
    fn test_layout_is_row_major_top_down() {
        let l = GridLayout {
            origin: Vec2::new(-1.0, 1.0),
            cell_size: Vec2::new(0.3, 0.1),
            margin: 0.02,
            columns: 3,
            rows: 2,
        };
        let grid = BoxGrid::new(l);
        let center = |i: usize| grid.cells()[i].bounds().center();

        assert!((center(0) - Vec2::new(-1.0, 1.0)).length() < 1e-5);
        assert!((center(1) - Vec2::new(-0.68, 1.0)).length() < 1e-5);
        assert!((center(2) - Vec2::new(-0.36, 1.0)).length() < 1e-5);
        // Second row restarts at the origin column, one row lower
        assert!((center(3) - Vec2::new(-1.0, 0.88)).length() < 1e-5);
    }

    #[test]
    fn test_corner_order() {
        let cell = Cell::new(Vec2::ZERO, Vec2::new(2.0, 1.0));
        assert_eq!(
            cell.corners,
            [
                Vec2::new(-1.0, 0.5),
                Vec2::new(-1.0, -0.5),
                Vec2::new(1.0, -0.5),
                Vec2::new(1.0, 0.5),
            ]
        );
    }

    #[test]
    fn test_index_pattern() {
        assert_eq!(generate_indices(2), vec![0, 1, 3, 3, 1, 2, 4, 5, 7, 7, 5, 6]);
    }

    #[test]
    fn test_fitted_layout_spans_world_width() {
        let l = layout(10, 9);
        assert!((l.cell_size.x - (0.4 - 0.011)).abs() < 1e-6);
        assert!((l.cell_size.y - l.cell_size.x / 3.0).abs() < 1e-6);

        let grid = BoxGrid::new(l);
        let first = grid.cells()[0].bounds();
        let last = grid.cells()[9].bounds();
        assert!((first.min.x - (-2.0 + 0.01)).abs() < 1e-5);
        assert!((first.max.y - (1.5 - 0.01)).abs() < 1e-5);
        assert!(last.max.x < 2.0);
    }

    #[test]
    fn test_first_hit_picks_lowest_index() {
        let grid = BoxGrid::new(layout(10, 9));
        let a = grid.cells()[3].bounds();
        let b = grid.cells()[4].bounds();
        // Straddle the gap between cells 3 and 4
        let between = Vec2::new((a.max.x + b.min.x) / 2.0, a.center().y);

        assert!(grid.hit(3, between, Vec2::splat(0.1), 0.01));
        assert!(grid.hit(4, between, Vec2::splat(0.1), 0.01));
        assert_eq!(grid.first_hit(between, Vec2::splat(0.1), 0.01), Some(3));
    }

    #[test]
    fn test_duplicate_destroy_is_ignored() {
        let mut grid = BoxGrid::new(layout(4, 2));
        grid.destroy_box(1);
        let revision = grid.revision();
        grid.destroy_box(1);

        assert_eq!(grid.destroyed(), &[1]);
        assert_eq!(grid.revision(), revision);
        assert_eq!(grid.alive_count(), 7);
    }

    #[test]
    fn test_out_of_range_destroy_is_ignored() {
        let mut grid = BoxGrid::new(layout(4, 2));
        let revision = grid.revision();
        grid.destroy_box(8);

        assert!(grid.destroyed().is_empty());
        assert_eq!(grid.revision(), revision);
        assert!(!grid.hit(8, Vec2::ZERO, Vec2::ONE, 0.0));
    }

    #[test]
    fn test_cell_bytes_are_four_corners() {
        let grid = BoxGrid::new(layout(2, 1));
        let bytes: &[u8] = bytemuck::cast_slice(grid.cells());
        assert_eq!(bytes.len(), 2 * 4 * 2 * std::mem::size_of::<f32>());
    }

    proptest! {
        #[test]
        fn prop_cell_and_index_counts_are_stable(
            columns in 1usize..16,
            rows in 1usize..12,
            destroy in proptest::collection::vec(0usize..256, 0..40),
        ) {
            let mut grid = BoxGrid::new(layout(columns, rows));
            for index in destroy {
                grid.destroy_box(index);
                prop_assert_eq!(grid.cells().len(), columns * rows);
                prop_assert_eq!(grid.indices().len(), columns * rows * 6);
            }
            let expected = generate_indices(columns * rows);
            prop_assert_eq!(grid.indices(), expected.as_slice());
        }

        #[test]
        fn prop_destroyed_cells_are_never_hit(
            columns in 1usize..16,
            rows in 1usize..12,
            pick in 0usize..1000,
            x in -2.0f32..2.0,
            y in -1.5f32..1.5,
            w in 0.0f32..0.5,
            h in 0.0f32..0.5,
            bias in 0.0f32..0.1,
        ) {
            let mut grid = BoxGrid::new(layout(columns, rows));
            let index = pick % (columns * rows);
            grid.destroy_box(index);

            let size = Vec2::new(w, h);
            // Query box fully inside the world
            let half = size / 2.0;
            let position = Vec2::new(
                x.clamp(-2.0 + half.x, 2.0 - half.x),
                y.clamp(-1.5 + half.y, 1.5 - half.y),
            );
            prop_assert!(!grid.hit(index, position, size, bias));
            prop_assert_ne!(grid.first_hit(position, size, bias), Some(index));
        }
    }
}
