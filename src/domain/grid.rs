//! Grid geometry and location-label decoding.
//!
//! Locations are discrete cells on a fixed rectangular grid. A cell label is
//! a row letter followed by a two-digit column number, e.g. `"A11"` for the
//! top-left cell of the default 9x9 layout (`A11`..`I19`): row is the letter
//! offset from `'A'`, column is the numeric suffix offset from the grid's
//! minimum column index.

use serde::{Deserialize, Serialize};

use crate::LocateError;

/// A discrete cell on the location grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    /// Row index, 0-based from the top ('A' = 0).
    pub row: i32,
    /// Column index, 0-based from the grid's minimum column number.
    pub col: i32,
}

impl GridCell {
    /// Create a cell at the given row and column.
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

/// Dimensions and labeling scheme of the location grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of rows (labeled 'A', 'B', ...).
    pub rows: i32,
    /// Number of columns.
    pub cols: i32,
    /// Numeric label of the first column (e.g. 11 for an `A11`-origin grid).
    pub min_col: i32,
}

impl GridSpec {
    /// Grid with `rows` x `cols` cells whose first column is numbered
    /// `min_col`.
    pub fn new(rows: i32, cols: i32, min_col: i32) -> Self {
        Self {
            rows,
            cols,
            min_col,
        }
    }

    /// Whether `cell` lies inside the grid bounds.
    pub fn contains(&self, cell: GridCell) -> bool {
        (0..self.rows).contains(&cell.row) && (0..self.cols).contains(&cell.col)
    }

    /// Decode a label such as `"C13"` into a [`GridCell`].
    ///
    /// Decoding is total over well-formed labels (one ASCII letter followed
    /// by a decimal column number); anything else fails with
    /// [`LocateError::Decode`]. Bounds are *not* checked here: a
    /// well-formed label for a cell outside this grid still decodes, and is
    /// rejected by callers that require an in-bounds cell.
    pub fn decode(&self, label: &str) -> crate::Result<GridCell> {
        let mut chars = label.chars();

        let row_char = chars.next().ok_or_else(|| LocateError::Decode {
            label: label.to_string(),
            reason: "label is empty".to_string(),
        })?;

        if !row_char.is_ascii_alphabetic() {
            return Err(LocateError::Decode {
                label: label.to_string(),
                reason: format!("row marker {row_char:?} is not a letter"),
            });
        }

        let row = (row_char.to_ascii_uppercase() as i32) - ('A' as i32);

        let col_part = chars.as_str();
        let col_number: i32 = col_part.parse().map_err(|_| LocateError::Decode {
            label: label.to_string(),
            reason: format!("column suffix {col_part:?} is not a number"),
        })?;

        Ok(GridCell::new(row, col_number - self.min_col))
    }

    /// Encode a cell back into its label, e.g. `(2, 2)` -> `"C13"`.
    pub fn encode(&self, cell: GridCell) -> String {
        let row_char = (b'A' + cell.row as u8) as char;
        format!("{row_char}{:02}", cell.col + self.min_col)
    }

    /// Snap continuous grid coordinates to the nearest in-bounds cell.
    pub fn snap(&self, row: f64, col: f64) -> GridCell {
        let row = (row.round() as i32).clamp(0, self.rows - 1);
        let col = (col.round() as i32).clamp(0, self.cols - 1);
        GridCell::new(row, col)
    }

    /// Reject cells outside the grid with [`LocateError::InvalidLocation`].
    pub fn validate(&self, cell: GridCell, label: &str) -> crate::Result<GridCell> {
        if self.contains(cell) {
            Ok(cell)
        } else {
            Err(LocateError::InvalidLocation {
                label: label.to_string(),
                rows: self.rows,
                cols: self.cols,
            })
        }
    }
}

impl Default for GridSpec {
    /// The original survey layout: 9 rows `A`..`I`, 9 columns `11`..`19`.
    fn default() -> Self {
        Self::new(9, 9, 11)
    }
}
