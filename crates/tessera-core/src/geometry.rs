#![forbid(unsafe_code)]

//! Grid and pixel geometry shared by the editor and runtime canvases.
//!
//! A lesson canvas is a grid of square cells separated by a fixed gap. A
//! [`GridPosition`] names a block of cells; [`GridMetrics::to_pixels`] maps it
//! to the [`PixelRect`] a renderer draws:
//!
//! ```text
//! x      = col * (cell_size + gap)
//! width  = col_span * cell_size + (col_span - 1) * gap
//! ```
//!
//! and symmetrically for `y`/`height`. [`GridMetrics::to_grid`] is the inverse
//! for rects produced by `to_pixels` and snaps arbitrary rects to the nearest
//! cell block otherwise.

use serde::{Deserialize, Serialize};

/// Default spacing in pixels between adjacent grid cells.
pub const DEFAULT_GRID_GAP: u32 = 8;

/// A pointer or tile origin in canvas pixels (origin at top-left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - origin`.
    #[inline]
    #[must_use]
    pub const fn delta_from(self, origin: Self) -> (i32, i32) {
        (
            self.x.saturating_sub(origin.x),
            self.y.saturating_sub(origin.y),
        )
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    #[inline]
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A rectangle in canvas pixels, used for rendering and hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelRect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rect from a tile's stored origin and size.
    #[inline]
    #[must_use]
    pub const fn from_parts(origin: PixelPoint, size: PixelSize) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    #[inline]
    #[must_use]
    pub const fn origin(&self) -> PixelPoint {
        PixelPoint::new(self.x, self.y)
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> PixelSize {
        PixelSize::new(self.width, self.height)
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the point lies inside the rect (right/bottom edges exclusive).
    #[must_use]
    pub fn contains(&self, point: PixelPoint) -> bool {
        let (px, py) = (i64::from(point.x), i64::from(point.y));
        px >= i64::from(self.x) && px < self.right() && py >= i64::from(self.y) && py < self.bottom()
    }

    /// Whether two rects share any area.
    #[must_use]
    pub fn intersects(&self, other: &PixelRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && i64::from(self.x) < other.right()
            && i64::from(other.x) < self.right()
            && i64::from(self.y) < other.bottom()
            && i64::from(other.y) < self.bottom()
    }

    /// Shift the rect by a pixel delta.
    #[must_use]
    pub const fn translate(self, dx: i32, dy: i32) -> Self {
        Self::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.width,
            self.height,
        )
    }
}

/// Placement of a tile on the snap grid.
///
/// `col`/`row` are zero-based; spans count cells and are always >= 1 for a
/// valid tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridPosition {
    pub col: u32,
    pub row: u32,
    pub col_span: u32,
    pub row_span: u32,
}

impl Default for GridPosition {
    fn default() -> Self {
        Self::cell(0, 0)
    }
}

impl GridPosition {
    #[inline]
    #[must_use]
    pub const fn new(col: u32, row: u32, col_span: u32, row_span: u32) -> Self {
        Self {
            col,
            row,
            col_span,
            row_span,
        }
    }

    /// A single cell.
    #[inline]
    #[must_use]
    pub const fn cell(col: u32, row: u32) -> Self {
        Self::new(col, row, 1, 1)
    }

    /// Column one past the last covered column.
    #[inline]
    #[must_use]
    pub const fn end_col(&self) -> u32 {
        self.col.saturating_add(self.col_span)
    }

    /// Row one past the last covered row.
    #[inline]
    #[must_use]
    pub const fn end_row(&self) -> u32 {
        self.row.saturating_add(self.row_span)
    }

    #[must_use]
    pub const fn contains_cell(&self, col: u32, row: u32) -> bool {
        col >= self.col && col < self.end_col() && row >= self.row && row < self.end_row()
    }

    #[must_use]
    pub const fn overlaps(&self, other: &GridPosition) -> bool {
        self.col < other.end_col()
            && other.col < self.end_col()
            && self.row < other.end_row()
            && other.row < self.end_row()
    }

    /// Whether the block lies entirely inside a `columns x rows` grid.
    #[must_use]
    pub const fn fits_within(&self, columns: u32, rows: u32) -> bool {
        self.col_span >= 1
            && self.row_span >= 1
            && self.end_col() <= columns
            && self.end_row() <= rows
    }

    /// Clamp spans to `1..=limit` and shift the origin so the block fits.
    #[must_use]
    pub fn clamp_to(self, columns: u32, rows: u32) -> Self {
        let (col, col_span) = clamp_axis(self.col, self.col_span, columns);
        let (row, row_span) = clamp_axis(self.row, self.row_span, rows);
        Self::new(col, row, col_span, row_span)
    }
}

fn clamp_axis(start: u32, span: u32, limit: u32) -> (u32, u32) {
    let limit = limit.max(1);
    let span = span.clamp(1, limit);
    (start.min(limit - span), span)
}

/// Cell size, gap and extent of a canvas grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridMetrics {
    pub cell_size: u32,
    pub gap: u32,
    pub columns: u32,
    pub rows: u32,
}

impl GridMetrics {
    #[must_use]
    pub const fn new(cell_size: u32, gap: u32, columns: u32, rows: u32) -> Self {
        Self {
            cell_size,
            gap,
            columns,
            rows,
        }
    }

    /// Distance in pixels between the origins of adjacent cells.
    #[inline]
    #[must_use]
    pub const fn pitch(&self) -> u32 {
        self.cell_size.saturating_add(self.gap)
    }

    /// Pixel rect of a grid block.
    #[must_use]
    pub fn to_pixels(&self, grid: GridPosition) -> PixelRect {
        PixelRect::new(
            self.offset(grid.col),
            self.offset(grid.row),
            self.span_extent(grid.col_span),
            self.span_extent(grid.row_span),
        )
    }

    /// Nearest grid block for a pixel rect, clamped to the canvas.
    ///
    /// Exact inverse of [`to_pixels`](Self::to_pixels) for blocks that fit
    /// within the grid.
    #[must_use]
    pub fn to_grid(&self, rect: PixelRect) -> GridPosition {
        let pitch = i64::from(self.pitch());
        if pitch == 0 {
            return GridPosition::default();
        }
        let gap = i64::from(self.gap);
        let col = round_div(i64::from(rect.x), pitch);
        let row = round_div(i64::from(rect.y), pitch);
        let col_span = round_div(i64::from(rect.width) + gap, pitch);
        let row_span = round_div(i64::from(rect.height) + gap, pitch);
        GridPosition::new(
            saturating_u32(col),
            saturating_u32(row),
            saturating_u32(col_span),
            saturating_u32(row_span),
        )
        .clamp_to(self.columns, self.rows)
    }

    /// Snap an arbitrary rect to the canonical rect of its nearest grid block.
    #[must_use]
    pub fn snap(&self, rect: PixelRect) -> (GridPosition, PixelRect) {
        let grid = self.to_grid(rect);
        (grid, self.to_pixels(grid))
    }

    /// Cell under a pointer. The gap after a cell belongs to that cell.
    #[must_use]
    pub fn cell_at(&self, point: PixelPoint) -> Option<(u32, u32)> {
        let pitch = i64::from(self.pitch());
        if pitch == 0 || point.x < 0 || point.y < 0 {
            return None;
        }
        let col = i64::from(point.x) / pitch;
        let row = i64::from(point.y) / pitch;
        if col >= i64::from(self.columns) || row >= i64::from(self.rows) {
            return None;
        }
        Some((saturating_u32(col), saturating_u32(row)))
    }

    /// Pixel size of the whole canvas.
    #[must_use]
    pub fn canvas_size(&self) -> PixelSize {
        PixelSize::new(self.span_extent(self.columns), self.span_extent(self.rows))
    }

    fn offset(&self, index: u32) -> i32 {
        let value = u64::from(index) * u64::from(self.pitch());
        i32::try_from(value).unwrap_or(i32::MAX)
    }

    /// Pixel length covered by `span` cells including the gaps between them.
    #[must_use]
    pub fn span_extent(&self, span: u32) -> u32 {
        let cells = u64::from(span) * u64::from(self.cell_size);
        let gaps = u64::from(span.saturating_sub(1)) * u64::from(self.gap);
        u32::try_from(cells + gaps).unwrap_or(u32::MAX)
    }
}

fn round_div(value: i64, divisor: i64) -> i64 {
    (value + divisor / 2).div_euclid(divisor)
}

fn saturating_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
