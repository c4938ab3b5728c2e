/*
 * Spatial Grid Module
 *
 * Uniform grid over the inflated viewport used to find molecule pairs that
 * may be closer than the connection distance. With a cell size at least as
 * large as that distance, any qualifying pair sits in the same or an
 * adjacent cell, so only a 3x3 block has to be scanned per molecule.
 *
 * Positions outside the grid are clamped into the border cells; clamping
 * never pushes two nearby points more than one cell apart.
 */

use nannou::prelude::*;

use crate::molecule::WRAP_MARGIN;
use crate::params::Viewport;

pub struct SpatialGrid {
    pub cell_size: f32,
    viewport: Viewport,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32, viewport: Viewport) -> Self {
        let cell_size = cell_size.max(1.0);
        let span = |extent: f32| ((extent + 2.0 * WRAP_MARGIN) / cell_size).ceil().max(1.0) as usize;
        let cols = span(viewport.width_f32());
        let rows = span(viewport.height_f32());

        let mut cells = Vec::with_capacity(cols * rows);
        for _ in 0..(cols * rows) {
            cells.push(Vec::new());
        }

        Self {
            cell_size,
            viewport,
            cols,
            rows,
            cells,
        }
    }

    // Whether this grid can be reused for the given layout
    pub fn fits(&self, cell_size: f32, viewport: Viewport) -> bool {
        self.viewport == viewport && (self.cell_size - cell_size.max(1.0)).abs() < f32::EPSILON
    }

    #[inline]
    fn cell_coords(&self, position: Point2) -> (usize, usize) {
        let gx = ((position.x + WRAP_MARGIN) / self.cell_size).floor();
        let gy = ((position.y + WRAP_MARGIN) / self.cell_size).floor();
        (
            gx.clamp(0.0, (self.cols - 1) as f32) as usize,
            gy.clamp(0.0, (self.rows - 1) as f32) as usize,
        )
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    #[inline]
    pub fn insert(&mut self, index: usize, position: Point2) {
        let (x, y) = self.cell_coords(position);
        self.cells[y * self.cols + x].push(index);
    }

    // Indices in the cell containing `position` and its eight neighbours
    pub fn nearby_indices(&self, position: Point2, out: &mut Vec<usize>) {
        out.clear();
        let (cx, cy) = self.cell_coords(position);

        let y_start = cy.saturating_sub(1);
        let y_end = (cy + 1).min(self.rows - 1);
        let x_start = cx.saturating_sub(1);
        let x_end = (cx + 1).min(self.cols - 1);

        for y in y_start..=y_end {
            let row = y * self.cols;
            for x in x_start..=x_end {
                out.extend_from_slice(&self.cells[row + x]);
            }
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }
}
