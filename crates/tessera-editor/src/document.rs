#![forbid(unsafe_code)]

//! Lesson document under edit.
//!
//! [`LessonDocument`] owns the [`Lesson`] an author is working on. Every
//! mutating operation builds the next lesson, validates it, and only then
//! swaps it in and records an undo snapshot, so a failed operation leaves
//! the document untouched and every reachable lesson passes
//! [`Lesson::validate`].
//!
//! Pixel geometry is always derived from grid positions: moves, resizes and
//! committed gestures end on a grid block even when live previews were
//! unsnapped.

use std::fmt;
use std::sync::Arc;

use tessera_core::{
    CanvasSettings, EditorPolicyConfig, GridPosition, Lesson, LessonId, LessonValidationError,
    PixelPoint, PixelRect, TesseraConfig, Tile, TileContent, TileId, TileType, Timestamp,
};

use crate::history::SnapshotHistory;
use crate::interaction::{
    InteractionLimits, exceeds_drag_threshold, handle_at, image_offset, preview_rect,
};
use crate::state::{Interaction, ResizeHandle};

/// Partial update of a tile. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TilePatch {
    pub grid_position: Option<GridPosition>,
    pub page: Option<u32>,
    pub z_index: Option<i32>,
    /// Must be the same variant as the tile's current content.
    pub content: Option<TileContent>,
}

impl TilePatch {
    #[must_use]
    pub fn content(content: TileContent) -> Self {
        Self {
            content: Some(content),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn grid_position(grid_position: GridPosition) -> Self {
        Self {
            grid_position: Some(grid_position),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grid_position.is_none()
            && self.page.is_none()
            && self.z_index.is_none()
            && self.content.is_none()
    }
}

/// Editable lesson with undo history and dirty tracking.
#[derive(Debug)]
pub struct LessonDocument {
    lesson: Lesson,
    history: SnapshotHistory<Lesson>,
    policy: EditorPolicyConfig,
    /// Snapshot written by the last save; `None` until the first one.
    saved: Option<Arc<Lesson>>,
}

impl LessonDocument {
    /// Open an existing lesson for editing.
    pub fn open(lesson: Lesson, policy: EditorPolicyConfig) -> Result<Self, DocumentError> {
        lesson.validate()?;
        let history = SnapshotHistory::new(lesson.clone(), policy.history_depth);
        let saved = history.current().cloned();
        Ok(Self {
            history,
            lesson,
            policy,
            saved,
        })
    }

    /// Start an empty single-page lesson using the configured grid.
    pub fn create(id: LessonId, config: &TesseraConfig) -> Result<Self, DocumentError> {
        Self::open(
            Lesson::new(id, config.grid.to_canvas_settings()),
            config.editor.clone(),
        )
    }

    #[must_use]
    pub const fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    #[must_use]
    pub fn into_lesson(self) -> Lesson {
        self.lesson
    }

    #[must_use]
    pub const fn policy(&self) -> &EditorPolicyConfig {
        &self.policy
    }

    #[must_use]
    pub fn tile(&self, id: &TileId) -> Option<&Tile> {
        self.lesson.tile(id)
    }

    /// Whether the lesson differs from the last [`mark_saved`](Self::mark_saved)
    /// snapshot. Undoing or redoing back to that snapshot makes it clean again.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        match (&self.saved, self.history.current()) {
            (Some(saved), Some(current)) => !Arc::ptr_eq(saved, current),
            _ => true,
        }
    }

    pub fn mark_saved(&mut self) {
        self.saved = self.history.current().cloned();
    }

    /// Gesture bounds for this lesson's grid and the minimum tile span.
    #[must_use]
    pub fn interaction_limits(&self) -> InteractionLimits {
        InteractionLimits::for_grid(
            &self.lesson.metrics(),
            self.policy.min_col_span,
            self.policy.min_row_span,
        )
    }

    // ====================================================================
    // Tiles
    // ====================================================================

    /// Add a tile with default content for `tile_type` on top of `page`.
    pub fn add_tile(
        &mut self,
        tile_type: TileType,
        grid_position: GridPosition,
        page: u32,
    ) -> Result<TileId, DocumentError> {
        self.check_page(page)?;
        self.check_block(grid_position)?;
        let mut next = self.lesson.clone();
        let id = next_tile_id(&next);
        let mut tile = Tile::placed(
            id.clone(),
            TileContent::default_for(tile_type),
            grid_position,
            page,
            &next.metrics(),
            Timestamp::now(),
        );
        tile.z_index = next.max_z_on_page(page).map_or(0, |z| z.saturating_add(1));
        next.tiles.push(tile);
        self.commit(next)?;
        tracing::debug!(
            message = "document.add_tile",
            tile_id = %id,
            tile_type = %tile_type,
            page,
        );
        Ok(id)
    }

    /// Add a tile of the default span in the first free slot of `page`.
    pub fn add_tile_in_free_slot(
        &mut self,
        tile_type: TileType,
        page: u32,
    ) -> Result<TileId, DocumentError> {
        self.check_page(page)?;
        let grid_position = self
            .first_free_slot(
                page,
                self.policy.default_col_span,
                self.policy.default_row_span,
            )
            .ok_or(DocumentError::NoFreeSlot { page })?;
        self.add_tile(tile_type, grid_position, page)
    }

    /// Apply a partial update, bumping the tile's version and edit time.
    pub fn update_tile(&mut self, id: &TileId, patch: TilePatch) -> Result<(), DocumentError> {
        if patch.is_empty() {
            self.require_tile(id)?;
            return Ok(());
        }
        if let Some(page) = patch.page {
            self.check_page(page)?;
        }
        if let Some(grid_position) = patch.grid_position {
            self.check_block(grid_position)?;
        }
        let mut next = self.lesson.clone();
        let metrics = next.metrics();
        let tile = find_tile_mut(&mut next, id)?;
        if let Some(content) = patch.content {
            if content.tile_type() != tile.tile_type() {
                return Err(DocumentError::PatchTypeMismatch {
                    tile_id: id.clone(),
                    expected: tile.tile_type(),
                    found: content.tile_type(),
                });
            }
            tile.content = content;
        }
        if let Some(grid_position) = patch.grid_position {
            tile.set_grid_position(grid_position, &metrics);
        }
        if let Some(page) = patch.page {
            tile.page = page;
        }
        if let Some(z_index) = patch.z_index {
            tile.z_index = z_index;
        }
        tile.touch(Timestamp::now());
        self.commit(next)?;
        tracing::debug!(message = "document.update_tile", tile_id = %id);
        Ok(())
    }

    /// Remove a tile and return it.
    pub fn delete_tile(&mut self, id: &TileId) -> Result<Tile, DocumentError> {
        let mut next = self.lesson.clone();
        let index = next
            .tiles
            .iter()
            .position(|tile| &tile.id == id)
            .ok_or_else(|| DocumentError::TileNotFound {
                tile_id: id.clone(),
            })?;
        let removed = next.tiles.remove(index);
        self.commit(next)?;
        tracing::debug!(message = "document.delete_tile", tile_id = %id);
        Ok(removed)
    }

    /// Copy a tile onto the first free block of the same span on its page.
    ///
    /// Falls back to the original block when the page is full. The copy is
    /// placed on top with a fresh id and version.
    pub fn duplicate_tile(&mut self, id: &TileId) -> Result<TileId, DocumentError> {
        let source = self.require_tile(id)?.clone();
        let grid_position = self
            .first_free_slot(
                source.page,
                source.grid_position.col_span,
                source.grid_position.row_span,
            )
            .unwrap_or(source.grid_position);
        let mut next = self.lesson.clone();
        let new_id = next_tile_id(&next);
        let mut copy = Tile::placed(
            new_id.clone(),
            source.content,
            grid_position,
            source.page,
            &next.metrics(),
            Timestamp::now(),
        );
        copy.z_index = next
            .max_z_on_page(source.page)
            .map_or(0, |z| z.saturating_add(1));
        next.tiles.push(copy);
        self.commit(next)?;
        tracing::debug!(
            message = "document.duplicate_tile",
            tile_id = %id,
            copy_id = %new_id,
        );
        Ok(new_id)
    }

    /// Raise a tile above every other tile on its page.
    pub fn bring_to_front(&mut self, id: &TileId) -> Result<(), DocumentError> {
        let tile = self.require_tile(id)?;
        let others_max = self
            .lesson
            .tiles
            .iter()
            .filter(|t| t.page == tile.page && &t.id != id)
            .map(|t| t.z_index)
            .max();
        match others_max {
            Some(max) if tile.z_index <= max => self.set_z_index(id, max.saturating_add(1)),
            _ => Ok(()),
        }
    }

    /// Lower a tile beneath every other tile on its page.
    pub fn send_to_back(&mut self, id: &TileId) -> Result<(), DocumentError> {
        let tile = self.require_tile(id)?;
        let others_min = self
            .lesson
            .tiles
            .iter()
            .filter(|t| t.page == tile.page && &t.id != id)
            .map(|t| t.z_index)
            .min();
        match others_min {
            Some(min) if tile.z_index >= min => self.set_z_index(id, min.saturating_sub(1)),
            _ => Ok(()),
        }
    }

    fn set_z_index(&mut self, id: &TileId, z_index: i32) -> Result<(), DocumentError> {
        self.update_tile(
            id,
            TilePatch {
                z_index: Some(z_index),
                ..TilePatch::default()
            },
        )
    }

    /// Move a tile so its top-left cell is `(col, row)`, keeping its span.
    pub fn move_tile(&mut self, id: &TileId, col: u32, row: u32) -> Result<(), DocumentError> {
        let current = self.require_tile(id)?.grid_position;
        let target = GridPosition::new(col, row, current.col_span, current.row_span);
        if target == current {
            return Ok(());
        }
        self.update_tile(id, TilePatch::grid_position(target))
    }

    /// Change a tile's span, keeping its top-left cell.
    pub fn resize_tile(
        &mut self,
        id: &TileId,
        col_span: u32,
        row_span: u32,
    ) -> Result<(), DocumentError> {
        let current = self.require_tile(id)?.grid_position;
        let target = GridPosition::new(current.col, current.row, col_span, row_span);
        if target == current {
            return Ok(());
        }
        self.update_tile(id, TilePatch::grid_position(target))
    }

    /// First block of the given span on `page` that overlaps no tile.
    ///
    /// Scans rows top to bottom, columns left to right.
    #[must_use]
    pub fn first_free_slot(&self, page: u32, col_span: u32, row_span: u32) -> Option<GridPosition> {
        let settings = self.lesson.canvas_settings;
        let (col_span, row_span) = (col_span.max(1), row_span.max(1));
        if col_span > settings.grid_columns || row_span > settings.grid_rows {
            return None;
        }
        let occupied: Vec<GridPosition> = self
            .lesson
            .tiles
            .iter()
            .filter(|tile| tile.page == page)
            .map(|tile| tile.grid_position)
            .collect();
        (0..=settings.grid_rows - row_span)
            .flat_map(|row| (0..=settings.grid_columns - col_span).map(move |col| (col, row)))
            .map(|(col, row)| GridPosition::new(col, row, col_span, row_span))
            .find(|candidate| !occupied.iter().any(|taken| taken.overlaps(candidate)))
    }

    // ====================================================================
    // Pages and canvas
    // ====================================================================

    /// Append an empty page and return its index.
    pub fn add_page(&mut self) -> Result<u32, DocumentError> {
        let mut next = self.lesson.clone();
        let page = next.total_pages;
        next.total_pages = next.total_pages.saturating_add(1);
        self.commit(next)?;
        tracing::debug!(message = "document.add_page", page);
        Ok(page)
    }

    /// Delete a page with its tiles; later pages shift down by one.
    ///
    /// Returns the removed tiles.
    pub fn delete_page(&mut self, page: u32) -> Result<Vec<Tile>, DocumentError> {
        self.check_page(page)?;
        if self.lesson.total_pages == 1 {
            return Err(DocumentError::LastPage);
        }
        let mut next = self.lesson.clone();
        let (removed, kept): (Vec<Tile>, Vec<Tile>) =
            next.tiles.into_iter().partition(|tile| tile.page == page);
        next.tiles = kept;
        for tile in &mut next.tiles {
            if tile.page > page {
                tile.page -= 1;
            }
        }
        next.total_pages -= 1;
        self.commit(next)?;
        tracing::debug!(
            message = "document.delete_page",
            page,
            removed_tiles = removed.len(),
        );
        Ok(removed)
    }

    /// Replace the canvas grid, pulling tiles inside it and recomputing pixels.
    pub fn set_canvas_settings(&mut self, settings: CanvasSettings) -> Result<(), DocumentError> {
        let mut next = self.lesson.clone();
        next.canvas_settings = settings;
        let metrics = next.metrics();
        let now = Timestamp::now();
        for tile in &mut next.tiles {
            let clamped = tile
                .grid_position
                .clamp_to(settings.grid_columns, settings.grid_rows);
            if clamped != tile.grid_position || !tile.is_consistent_with(&metrics) {
                tile.set_grid_position(clamped, &metrics);
                tile.touch(now);
            }
        }
        self.commit(next)?;
        tracing::debug!(
            message = "document.set_canvas_settings",
            columns = settings.grid_columns,
            rows = settings.grid_rows,
            cell_size = settings.cell_size,
        );
        Ok(())
    }

    // ====================================================================
    // Gestures
    // ====================================================================

    /// Rect to draw for a live frame gesture.
    ///
    /// Jumps between grid blocks when the lesson has `snap_to_grid` set and
    /// follows the pointer otherwise. `None` for image pans and idle state.
    #[must_use]
    pub fn preview(&self, interaction: &Interaction, pointer: PixelPoint) -> Option<PixelRect> {
        let metrics = self.lesson.metrics();
        let snap = self.lesson.canvas_settings.snap_to_grid.then_some(&metrics);
        preview_rect(interaction, pointer, &self.interaction_limits(), snap)
    }

    /// Resize handle of a tile under `pointer`, within the configured
    /// handle tolerance.
    #[must_use]
    pub fn handle_at(&self, tile_id: &TileId, pointer: PixelPoint) -> Option<ResizeHandle> {
        let tile = self.lesson.tile(tile_id)?;
        handle_at(tile.rect(), pointer, self.policy.handle_tolerance)
    }

    /// Apply a finished gesture released at `pointer`.
    ///
    /// Drags and resizes land on the nearest grid block whatever
    /// `snap_to_grid` says, since tile pixels always follow the grid; image
    /// drags store the new pan offset. A release closer to the press than
    /// the configured drag threshold is a click and changes nothing.
    /// Returns `false` when nothing changed.
    pub fn commit_interaction(
        &mut self,
        interaction: &Interaction,
        pointer: PixelPoint,
    ) -> Result<bool, DocumentError> {
        let (Some(tile_id), Some(origin)) = (interaction.tile_id(), interaction.pointer_origin())
        else {
            return Ok(false);
        };
        let tile = self.require_tile(tile_id)?;
        if !exceeds_drag_threshold(origin, pointer, self.policy.drag_threshold) {
            tracing::debug!(
                message = "document.commit_interaction",
                tile_id = %tile_id,
                below_threshold = true,
            );
            return Ok(false);
        }

        if let Some(offset) = image_offset(interaction, pointer) {
            let TileContent::Image(image) = &tile.content else {
                return Err(DocumentError::PatchTypeMismatch {
                    tile_id: tile_id.clone(),
                    expected: TileType::Image,
                    found: tile.tile_type(),
                });
            };
            if (image.offset_x, image.offset_y) == (offset.x, offset.y) {
                return Ok(false);
            }
            let mut image = image.clone();
            image.offset_x = offset.x;
            image.offset_y = offset.y;
            self.update_tile(tile_id, TilePatch::content(TileContent::Image(image)))?;
            return Ok(true);
        }

        let limits = self.interaction_limits();
        let Some(rect) = preview_rect(interaction, pointer, &limits, None) else {
            return Ok(false);
        };
        let metrics = self.lesson.metrics();
        let snapped = metrics.to_grid(rect);
        let grid_position = GridPosition::new(
            snapped.col,
            snapped.row,
            snapped.col_span.max(self.policy.min_col_span),
            snapped.row_span.max(self.policy.min_row_span),
        )
        .clamp_to(metrics.columns, metrics.rows);
        if grid_position == tile.grid_position {
            return Ok(false);
        }
        self.update_tile(tile_id, TilePatch::grid_position(grid_position))?;
        tracing::debug!(
            message = "document.commit_interaction",
            tile_id = %tile_id,
            col = grid_position.col,
            row = grid_position.row,
            col_span = grid_position.col_span,
            row_span = grid_position.row_span,
        );
        Ok(true)
    }

    // ====================================================================
    // History
    // ====================================================================

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restore the lesson before the last edit. Returns `false` if none.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.lesson = Lesson::clone(&snapshot);
        tracing::debug!(message = "document.undo", redo_depth = self.history.redo_depth());
        true
    }

    /// Re-apply the last undone edit. Returns `false` if none.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.lesson = Lesson::clone(&snapshot);
        tracing::debug!(message = "document.redo", undo_depth = self.history.undo_depth());
        true
    }

    // ====================================================================
    // Internals
    // ====================================================================

    fn commit(&mut self, next: Lesson) -> Result<(), DocumentError> {
        if let Err(err) = next.validate() {
            tracing::warn!(message = "document.rejected", error = %err);
            return Err(err.into());
        }
        self.history.push(next.clone());
        self.lesson = next;
        Ok(())
    }

    fn require_tile(&self, id: &TileId) -> Result<&Tile, DocumentError> {
        self.lesson
            .tile(id)
            .ok_or_else(|| DocumentError::TileNotFound {
                tile_id: id.clone(),
            })
    }

    fn check_page(&self, page: u32) -> Result<(), DocumentError> {
        if page >= self.lesson.total_pages {
            return Err(DocumentError::PageOutOfRange {
                page,
                total_pages: self.lesson.total_pages,
            });
        }
        Ok(())
    }

    fn check_block(&self, grid_position: GridPosition) -> Result<(), DocumentError> {
        let settings = self.lesson.canvas_settings;
        if !grid_position.fits_within(settings.grid_columns, settings.grid_rows) {
            return Err(DocumentError::OutsideGrid { grid_position });
        }
        if grid_position.col_span < self.policy.min_col_span
            || grid_position.row_span < self.policy.min_row_span
        {
            return Err(DocumentError::SpanBelowMinimum {
                grid_position,
                min_col_span: self.policy.min_col_span,
                min_row_span: self.policy.min_row_span,
            });
        }
        Ok(())
    }
}

fn find_tile_mut<'a>(lesson: &'a mut Lesson, id: &TileId) -> Result<&'a mut Tile, DocumentError> {
    lesson
        .tile_mut(id)
        .ok_or_else(|| DocumentError::TileNotFound {
            tile_id: id.clone(),
        })
}

/// Smallest `tile-N` id not already used in the lesson.
fn next_tile_id(lesson: &Lesson) -> TileId {
    let mut n = lesson.tiles.len() + 1;
    loop {
        let candidate = TileId::new(format!("tile-{n}"));
        if lesson.tile(&candidate).is_none() {
            return candidate;
        }
        n += 1;
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors from document editing operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    TileNotFound {
        tile_id: TileId,
    },
    PageOutOfRange {
        page: u32,
        total_pages: u32,
    },
    OutsideGrid {
        grid_position: GridPosition,
    },
    SpanBelowMinimum {
        grid_position: GridPosition,
        min_col_span: u32,
        min_row_span: u32,
    },
    /// A lesson keeps at least one page.
    LastPage,
    /// Content or gesture does not match the tile's variant.
    PatchTypeMismatch {
        tile_id: TileId,
        expected: TileType,
        found: TileType,
    },
    NoFreeSlot {
        page: u32,
    },
    /// The edited lesson failed validation.
    Validation(LessonValidationError),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TileNotFound { tile_id } => write!(f, "tile {tile_id} not found"),
            Self::PageOutOfRange { page, total_pages } => {
                write!(f, "page {page} out of range (lesson has {total_pages})")
            }
            Self::OutsideGrid { grid_position } => write!(
                f,
                "block at col {} row {} span {}x{} does not fit the grid",
                grid_position.col,
                grid_position.row,
                grid_position.col_span,
                grid_position.row_span
            ),
            Self::SpanBelowMinimum {
                grid_position,
                min_col_span,
                min_row_span,
            } => write!(
                f,
                "span {}x{} is below the minimum {min_col_span}x{min_row_span}",
                grid_position.col_span, grid_position.row_span
            ),
            Self::LastPage => write!(f, "cannot delete the only page"),
            Self::PatchTypeMismatch {
                tile_id,
                expected,
                found,
            } => write!(f, "tile {tile_id} is {expected}, got {found}"),
            Self::NoFreeSlot { page } => write!(f, "no free slot on page {page}"),
            Self::Validation(err) => write!(f, "edit rejected: {err}"),
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LessonValidationError> for DocumentError {
    fn from(err: LessonValidationError) -> Self {
        Self::Validation(err)
    }
}
