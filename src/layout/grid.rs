//! # Panel Grid Arithmetic
//!
//! Pure pagination and placement math for the storyboard grid:
//! - Page count for a panel list
//! - Rows a partial page actually needs
//! - Row-major cell placement with pixel origins

use serde::Serialize;

/// Resolved placement of one panel on its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellPlacement {
    /// Index of the panel within its page (0-based).
    pub slot: usize,
    /// Row (0-based).
    pub row: u32,
    /// Column (0-based).
    pub col: u32,
    /// Left edge of the image, in pixels.
    pub x: u32,
    /// Top edge of the image, in pixels.
    pub y: u32,
}

/// Number of pages needed for `total` panels at `per_page` panels each.
pub fn page_count(total: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}

/// Rows occupied by `count` panels laid out `cols` wide.
pub fn rows_needed(count: usize, cols: u32) -> u32 {
    if cols == 0 {
        return 0;
    }
    count.div_ceil(cols as usize) as u32
}

/// Place `count` panels left-to-right, top-to-bottom.
///
/// `cell_width` is the horizontal pitch and `row_height` the vertical pitch
/// (image plus caption band).
pub fn place_cells(count: usize, cols: u32, cell_width: u32, row_height: u32) -> Vec<CellPlacement> {
    if cols == 0 {
        return vec![];
    }
    (0..count)
        .map(|slot| {
            let row = (slot / cols as usize) as u32;
            let col = (slot % cols as usize) as u32;
            CellPlacement {
                slot,
                row,
                col,
                x: column_x_offset(col, cell_width),
                y: row_y_offset(row, row_height),
            }
        })
        .collect()
}

/// Compute the x-offset for a column.
pub fn column_x_offset(col: u32, cell_width: u32) -> u32 {
    col * cell_width
}

/// Compute the y-offset for a row.
pub fn row_y_offset(row: u32, row_height: u32) -> u32 {
    row * row_height
}
