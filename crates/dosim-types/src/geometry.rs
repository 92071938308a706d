// ─────────────────────────────────────────────────────────────────────
// Dosim Array Core — Detector Geometry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Mapping between flat diode indices and 2-D detector grid positions.
//!
//! The electronics report diodes as a flat, 1-based ordered sequence;
//! physically they sit on every other row and every other column of a
//! sparse grid. Both directions of the mapping are precomputed once and
//! shared read-only by every consumer.

use ndarray::Array2;

use crate::config::DetectorConfig;
use crate::constants::{DIODE_COUNT, GRID_COLS, GRID_ROWS};
use crate::error::{DosimError, DosimResult};

/// (row, col) on the detector grid.
pub type GridPosition = (usize, usize);

/// Immutable diode-index ↔ grid-position bijection.
#[derive(Debug, Clone)]
pub struct DetectorGeometry {
    rows: usize,
    cols: usize,
    /// Grid of 1-based diode numbers; 0 marks a cell with no diode.
    index_grid: Array2<u32>,
    /// Diode number d sits at `positions[d - 1]`.
    positions: Vec<GridPosition>,
}

impl DetectorGeometry {
    /// Build the mapping for a `rows` × `cols` grid carrying `diode_count`
    /// diodes.
    ///
    /// Scan order is load-bearing: diodes are numbered starting at the
    /// bottom grid row, stepping upward two rows at a time, and within
    /// each row left to right two columns at a time. A wrong order
    /// scrambles the detector map without ever producing a shape error.
    pub fn new(rows: usize, cols: usize, diode_count: usize) -> DosimResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(DosimError::ConfigError(
                "geometry grid dimensions must be >= 1".to_string(),
            ));
        }
        let capacity = rows.div_ceil(2) * cols.div_ceil(2);
        if diode_count == 0 || diode_count > capacity {
            return Err(DosimError::ConfigError(format!(
                "diode_count {diode_count} outside 1..={capacity} for a {rows}x{cols} grid"
            )));
        }

        let mut index_grid = Array2::zeros((rows, cols));
        let mut positions = Vec::with_capacity(diode_count);
        let mut number = 1u32;
        'scan: for row in (0..rows).rev().step_by(2) {
            for col in (0..cols).step_by(2) {
                index_grid[[row, col]] = number;
                positions.push((row, col));
                if positions.len() == diode_count {
                    break 'scan;
                }
                number += 1;
            }
        }

        Ok(DetectorGeometry {
            rows,
            cols,
            index_grid,
            positions,
        })
    }

    /// The standard 41 × 131 array with 1,386 diodes.
    ///
    /// The standard dimensions fill the grid exactly to capacity
    /// (21 × 66 usable cells = 1,386 diodes), so construction cannot
    /// fail and the `expect` never fires.
    pub fn standard() -> Self {
        Self::new(GRID_ROWS, GRID_COLS, DIODE_COUNT).expect("standard geometry is valid")
    }

    /// Build from a detector configuration.
    pub fn from_config(config: &DetectorConfig) -> DosimResult<Self> {
        Self::new(config.grid_rows, config.grid_cols, config.diode_count)
    }

    /// Grid position of a 1-based diode number; `None` outside
    /// `1..=diode_count`.
    pub fn position_for(&self, diode: usize) -> Option<GridPosition> {
        self.positions.get(diode.checked_sub(1)?).copied()
    }

    /// Diode number at a grid position; `None` for empty cells and
    /// positions off the grid.
    pub fn diode_index_for(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        match self.index_grid[[row, col]] {
            0 => None,
            d => Some(d as usize),
        }
    }

    /// Full grid of diode numbers (0 = empty cell).
    pub fn index_grid(&self) -> &Array2<u32> {
        &self.index_grid
    }

    /// All diode positions in diode-number order (diode d at index d-1).
    pub fn positions(&self) -> &[GridPosition] {
        &self.positions
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn diode_count(&self) -> usize {
        self.positions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_dimensions() {
        let geo = DetectorGeometry::standard();
        assert_eq!(geo.rows(), 41);
        assert_eq!(geo.cols(), 131);
        assert_eq!(geo.diode_count(), 1386);
        assert_eq!(geo.index_grid().shape(), &[41, 131]);
    }

    #[test]
    fn test_standard_scan_order() {
        let geo = DetectorGeometry::standard();
        // Numbering starts at the bottom-left cell.
        assert_eq!(geo.diode_index_for(40, 0), Some(1));
        assert_eq!(geo.diode_index_for(40, 2), Some(2));
        assert_eq!(geo.diode_index_for(40, 130), Some(66));
        // Next row up continues the sequence.
        assert_eq!(geo.diode_index_for(38, 0), Some(67));
        // Last diode lands top-right.
        assert_eq!(geo.diode_index_for(0, 130), Some(1386));
        assert_eq!(geo.position_for(1386), Some((0, 130)));
    }

    #[test]
    fn test_odd_rows_and_cols_are_empty() {
        let geo = DetectorGeometry::standard();
        for col in 0..131 {
            assert_eq!(geo.diode_index_for(39, col), None);
        }
        for row in (0..41).step_by(2) {
            assert_eq!(geo.diode_index_for(row, 1), None);
        }
    }

    #[test]
    fn test_standard_bijection_exhaustive() {
        let geo = DetectorGeometry::standard();
        let mut seen = 0usize;
        for d in 1..=1386 {
            let (row, col) = geo.position_for(d).unwrap();
            assert_eq!(geo.diode_index_for(row, col), Some(d));
            seen += 1;
        }
        assert_eq!(seen, 1386);
        let nonzero = geo.index_grid().iter().filter(|&&v| v != 0).count();
        assert_eq!(nonzero, 1386);
    }

    #[test]
    fn test_small_geometry_fill() {
        let geo = DetectorGeometry::new(5, 5, 9).unwrap();
        assert_eq!(geo.position_for(1), Some((4, 0)));
        assert_eq!(geo.position_for(3), Some((4, 4)));
        assert_eq!(geo.position_for(4), Some((2, 0)));
        assert_eq!(geo.position_for(9), Some((0, 4)));
    }

    #[test]
    fn test_partial_fill_stops_at_diode_count() {
        let geo = DetectorGeometry::new(5, 5, 7).unwrap();
        assert_eq!(geo.diode_count(), 7);
        assert_eq!(geo.position_for(7), Some((0, 0)));
        assert_eq!(geo.diode_index_for(0, 2), None);
        assert_eq!(geo.diode_index_for(0, 4), None);
        assert_eq!(geo.position_for(8), None);
    }

    #[test]
    fn test_capacity_overflow_rejected() {
        let err = DetectorGeometry::new(3, 3, 5).unwrap_err();
        match err {
            DosimError::ConfigError(msg) => assert!(msg.contains("diode_count")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_lookups() {
        let geo = DetectorGeometry::standard();
        assert_eq!(geo.position_for(0), None);
        assert_eq!(geo.position_for(1387), None);
        assert_eq!(geo.diode_index_for(41, 0), None);
        assert_eq!(geo.diode_index_for(0, 131), None);
    }
}
