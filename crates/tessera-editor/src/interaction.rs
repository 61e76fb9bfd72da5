#![forbid(unsafe_code)]

//! Pixel geometry of live drag and resize gestures.
//!
//! Everything here is pure: callers feed the rect captured when the gesture
//! started plus the current pointer and get back the rect to preview. The
//! final grid placement comes from [`snap_rect`].

use tessera_core::{GridMetrics, GridPosition, Lesson, PixelPoint, PixelRect, PixelSize, Tile};

use crate::state::{Interaction, ResizeHandle};

/// Bounds a gesture may not leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionLimits {
    pub canvas: PixelSize,
    /// Smallest rect a resize may produce.
    pub min_size: PixelSize,
}

impl InteractionLimits {
    #[must_use]
    pub const fn new(canvas: PixelSize, min_size: PixelSize) -> Self {
        Self { canvas, min_size }
    }

    /// Limits for a grid canvas with a minimum span per axis.
    #[must_use]
    pub fn for_grid(metrics: &GridMetrics, min_col_span: u32, min_row_span: u32) -> Self {
        Self {
            canvas: metrics.canvas_size(),
            min_size: PixelSize::new(
                metrics.span_extent(min_col_span.max(1)),
                metrics.span_extent(min_row_span.max(1)),
            ),
        }
    }
}

/// Whether the pointer has travelled far enough for a press to become a drag.
#[must_use]
pub fn exceeds_drag_threshold(origin: PixelPoint, pointer: PixelPoint, threshold: u32) -> bool {
    let dx = i64::from(pointer.x) - i64::from(origin.x);
    let dy = i64::from(pointer.y) - i64::from(origin.y);
    let threshold = i64::from(threshold);
    dx * dx + dy * dy >= threshold * threshold
}

/// Translate `start` by the pointer delta, kept inside the canvas.
#[must_use]
pub fn drag_rect(
    start: PixelRect,
    pointer_origin: PixelPoint,
    pointer: PixelPoint,
    limits: &InteractionLimits,
) -> PixelRect {
    let (dx, dy) = pointer.delta_from(pointer_origin);
    let moved = start.translate(dx, dy);
    PixelRect::new(
        clamp_origin(moved.x, moved.width, limits.canvas.width),
        clamp_origin(moved.y, moved.height, limits.canvas.height),
        moved.width,
        moved.height,
    )
}

/// Move the edges `handle` controls by `(dx, dy)`.
///
/// Opposite edges stay fixed. The result never shrinks below
/// `limits.min_size` and never crosses the canvas bounds.
#[must_use]
pub fn resize_rect(
    start: PixelRect,
    handle: ResizeHandle,
    (dx, dy): (i32, i32),
    limits: &InteractionLimits,
) -> PixelRect {
    let (left, right) = resize_axis(
        i64::from(start.x),
        start.right(),
        i64::from(dx),
        handle.moves_left(),
        handle.moves_right(),
        i64::from(limits.min_size.width),
        i64::from(limits.canvas.width),
    );
    let (top, bottom) = resize_axis(
        i64::from(start.y),
        start.bottom(),
        i64::from(dy),
        handle.moves_top(),
        handle.moves_bottom(),
        i64::from(limits.min_size.height),
        i64::from(limits.canvas.height),
    );
    PixelRect::new(
        to_i32(left),
        to_i32(top),
        to_u32(right - left),
        to_u32(bottom - top),
    )
}

fn resize_axis(
    low: i64,
    high: i64,
    delta: i64,
    moves_low: bool,
    moves_high: bool,
    min_len: i64,
    extent: i64,
) -> (i64, i64) {
    let min_len = min_len.min(extent.max(0));
    let mut low = low.clamp(0, extent);
    let mut high = high.clamp(low, extent);
    if moves_low {
        low = (low + delta).clamp(0, (high - min_len).max(0));
    }
    if moves_high {
        high = (high + delta).clamp((low + min_len).min(extent), extent);
    }
    (low, high)
}

fn clamp_origin(origin: i32, length: u32, extent: u32) -> i32 {
    let max = i64::from(extent).saturating_sub(i64::from(length)).max(0);
    to_i32(i64::from(origin).clamp(0, max))
}

fn to_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

fn to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Snap a free-form rect to its nearest grid block and canonical pixels.
#[must_use]
pub fn snap_rect(metrics: &GridMetrics, rect: PixelRect) -> (GridPosition, PixelRect) {
    metrics.snap(rect)
}

/// Rect to draw for a frame gesture at the current pointer.
///
/// With `snap` set the preview jumps between grid blocks; otherwise it
/// follows the pointer. Returns `None` for image pans and idle state.
#[must_use]
pub fn preview_rect(
    interaction: &Interaction,
    pointer: PixelPoint,
    limits: &InteractionLimits,
    snap: Option<&GridMetrics>,
) -> Option<PixelRect> {
    let rect = match interaction {
        Interaction::Drag {
            pointer_origin,
            start_rect,
            ..
        } => drag_rect(*start_rect, *pointer_origin, pointer, limits),
        Interaction::Resize {
            handle,
            pointer_origin,
            start_rect,
            ..
        } => resize_rect(*start_rect, *handle, pointer.delta_from(*pointer_origin), limits),
        Interaction::ImageDrag { .. } | Interaction::None => return None,
    };
    Some(snap.map_or(rect, |metrics| metrics.snap(rect).1))
}

/// Image pan offset for an image drag at the current pointer.
#[must_use]
pub fn image_offset(interaction: &Interaction, pointer: PixelPoint) -> Option<PixelPoint> {
    match interaction {
        Interaction::ImageDrag {
            pointer_origin,
            start_offset,
            ..
        } => {
            let (dx, dy) = pointer.delta_from(*pointer_origin);
            Some(PixelPoint::new(
                start_offset.x.saturating_add(dx),
                start_offset.y.saturating_add(dy),
            ))
        }
        _ => None,
    }
}

/// Resize handle under `pointer`, if it is within `tolerance` pixels of an
/// edge of `rect`. Corners win over edges.
#[must_use]
pub fn handle_at(rect: PixelRect, pointer: PixelPoint, tolerance: u32) -> Option<ResizeHandle> {
    if rect.is_empty() {
        return None;
    }
    let tolerance = i64::from(tolerance);
    let left = i64::from(rect.x);
    let right = rect.right() - 1;
    let top = i64::from(rect.y);
    let bottom = rect.bottom() - 1;
    let px = i64::from(pointer.x);
    let py = i64::from(pointer.y);

    if px < left - tolerance
        || px > right + tolerance
        || py < top - tolerance
        || py > bottom + tolerance
    {
        return None;
    }

    let near_left = (px - left).abs() <= tolerance;
    let near_right = (px - right).abs() <= tolerance;
    let near_top = (py - top).abs() <= tolerance;
    let near_bottom = (py - bottom).abs() <= tolerance;

    match (near_left, near_right, near_top, near_bottom) {
        (true, false, true, false) => Some(ResizeHandle::Nw),
        (false, true, true, false) => Some(ResizeHandle::Ne),
        (true, false, false, true) => Some(ResizeHandle::Sw),
        (false, true, false, true) => Some(ResizeHandle::Se),
        (true, false, false, false) => Some(ResizeHandle::W),
        (false, true, false, false) => Some(ResizeHandle::E),
        (false, false, true, false) => Some(ResizeHandle::N),
        (false, false, false, true) => Some(ResizeHandle::S),
        _ => None,
    }
}

/// Topmost tile on `page` under `pointer`.
///
/// Higher z-index wins; among equal z-index the tile later in the lesson
/// list is on top.
#[must_use]
pub fn hit_test(lesson: &Lesson, page: u32, pointer: PixelPoint) -> Option<&Tile> {
    lesson
        .tiles_on_page(page)
        .into_iter()
        .rev()
        .find(|tile| tile.rect().contains(pointer))
}
