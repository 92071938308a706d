// ─────────────────────────────────────────────────────────────────────
// Dosim Array Core — Detector Tables
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Typed representation of the named 2-D tables found in measurement
//! result files.
//!
//! A raw table arrives as rows of strings: column-title rows on top,
//! position-label columns on the left, metadata rows at the bottom, and
//! the numeric payload in between. The borders are layout configuration
//! (`TableLayout`), never hard-coded offsets, and every numeric operation
//! works on `values` only.

use ndarray::Array2;

use crate::config::TableLayout;
use crate::error::{DosimError, DosimResult};

/// One named table split into typed regions.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorTable {
    pub name: String,
    /// Column-title rows, kept verbatim.
    pub header: Vec<Vec<String>>,
    /// Leading label cells of each payload row, kept verbatim.
    pub row_labels: Vec<Vec<String>>,
    /// Numeric payload (grid_rows × grid_cols for detector-sized tables).
    pub values: Array2<f64>,
    /// Trailing metadata rows, kept verbatim.
    pub trailer: Vec<Vec<String>>,
    layout: TableLayout,
}

impl DetectorTable {
    /// Split a raw cell grid into typed regions.
    ///
    /// Header and trailer rows may be ragged; payload rows must be wide
    /// enough for the labels plus a uniform numeric region, and every
    /// numeric cell must parse as a finite float.
    pub fn from_cells(
        name: &str,
        cells: &[Vec<String>],
        layout: &TableLayout,
    ) -> DosimResult<Self> {
        let border_rows = layout.header_rows + layout.trailer_rows;
        if cells.len() <= border_rows {
            return Err(DosimError::ShapeMismatch {
                what: "table rows",
                expected: border_rows + 1,
                got: cells.len(),
            });
        }
        let n_rows = cells.len() - border_rows;
        let first_payload = &cells[layout.header_rows];
        if first_payload.len() <= layout.label_cols {
            return Err(DosimError::ShapeMismatch {
                what: "table payload row width",
                expected: layout.label_cols + 1,
                got: first_payload.len(),
            });
        }
        let n_cols = first_payload.len() - layout.label_cols;

        let header: Vec<Vec<String>> = cells[..layout.header_rows].to_vec();
        let trailer: Vec<Vec<String>> = cells[layout.header_rows + n_rows..].to_vec();

        let mut row_labels = Vec::with_capacity(n_rows);
        let mut values = Array2::zeros((n_rows, n_cols));
        for (i, row) in cells[layout.header_rows..layout.header_rows + n_rows]
            .iter()
            .enumerate()
        {
            if row.len() != layout.label_cols + n_cols {
                return Err(DosimError::ShapeMismatch {
                    what: "table payload row width",
                    expected: layout.label_cols + n_cols,
                    got: row.len(),
                });
            }
            row_labels.push(row[..layout.label_cols].to_vec());
            for (j, cell) in row[layout.label_cols..].iter().enumerate() {
                let parsed = cell.trim().parse::<f64>();
                match parsed {
                    Ok(v) if v.is_finite() => values[[i, j]] = v,
                    _ => {
                        return Err(DosimError::MalformedTable {
                            table: name.to_string(),
                            row: layout.header_rows + i,
                            col: layout.label_cols + j,
                        })
                    }
                }
            }
        }

        Ok(DetectorTable {
            name: name.to_string(),
            header,
            row_labels,
            values,
            trailer,
            layout: *layout,
        })
    }

    /// Shape of the numeric payload.
    pub fn numeric_shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Replace the numeric payload, leaving every border cell untouched.
    pub fn insert_values(&mut self, payload: &Array2<f64>) -> DosimResult<()> {
        let (rows, cols) = self.values.dim();
        if payload.nrows() != rows {
            return Err(DosimError::ShapeMismatch {
                what: "inserted payload rows",
                expected: rows,
                got: payload.nrows(),
            });
        }
        if payload.ncols() != cols {
            return Err(DosimError::ShapeMismatch {
                what: "inserted payload cols",
                expected: cols,
                got: payload.ncols(),
            });
        }
        self.values.assign(payload);
        Ok(())
    }

    /// New table carrying this table's borders around a different
    /// payload, shape-checked against the existing numeric region.
    pub fn with_payload(&self, name: &str, values: Array2<f64>) -> DosimResult<Self> {
        let (rows, cols) = self.values.dim();
        if values.nrows() != rows {
            return Err(DosimError::ShapeMismatch {
                what: "payload rows",
                expected: rows,
                got: values.nrows(),
            });
        }
        if values.ncols() != cols {
            return Err(DosimError::ShapeMismatch {
                what: "payload cols",
                expected: cols,
                got: values.ncols(),
            });
        }
        Ok(DetectorTable {
            name: name.to_string(),
            header: self.header.clone(),
            row_labels: self.row_labels.clone(),
            values,
            trailer: self.trailer.clone(),
            layout: self.layout,
        })
    }

    /// Reassemble the raw cell grid for a writer, formatting numeric
    /// cells with `precision` decimal places.
    pub fn to_cells(&self, precision: usize) -> Vec<Vec<String>> {
        let mut cells = Vec::with_capacity(
            self.header.len() + self.row_labels.len() + self.trailer.len(),
        );
        cells.extend(self.header.iter().cloned());
        for (labels, row) in self.row_labels.iter().zip(self.values.rows()) {
            let mut out = Vec::with_capacity(labels.len() + row.len());
            out.extend(labels.iter().cloned());
            out.extend(row.iter().map(|v| format!("{v:.precision$}")));
            cells.push(out);
        }
        cells.extend(self.trailer.iter().cloned());
        cells
    }

    /// Layout the table was split with.
    pub fn layout(&self) -> TableLayout {
        self.layout
    }
}
