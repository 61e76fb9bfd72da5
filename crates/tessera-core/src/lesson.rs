#![forbid(unsafe_code)]

//! Persisted lesson schema v1 with validation and migration scaffolding.
//!
//! A [`Lesson`] is the unit exchanged with the content service: an ordered
//! list of tiles spread over `total_pages` pages of a shared grid canvas.
//!
//! # Schema Versioning Policy
//!
//! - **Additive fields** may be carried in `extensions` without a version bump.
//! - **Breaking changes** require incrementing [`LESSON_SCHEMA_VERSION`] and
//!   adding a migration path to [`migrate_lesson`].
//! - Documents without `schema_version` are read as the current version.
//!
//! # Usage
//!
//! ```
//! use tessera_core::lesson::{CanvasSettings, Lesson, LessonId};
//!
//! let lesson = Lesson::new(LessonId::new("intro"), CanvasSettings::default());
//! assert!(lesson.validate().is_ok());
//!
//! let json = lesson.to_json_string().unwrap();
//! let loaded = Lesson::from_json_str(&json).unwrap();
//! assert_eq!(loaded, lesson);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geometry::{DEFAULT_GRID_GAP, GridMetrics, GridPosition, PixelRect};
use crate::tile::{Tile, TileId, TileValidationError};

/// Current lesson schema version.
pub const LESSON_SCHEMA_VERSION: u16 = 1;

/// Stable lesson identifier assigned by the content service.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonId(String);

impl LessonId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Grid layout shared by every page of a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSettings {
    pub grid_columns: u32,
    pub grid_rows: u32,
    /// Edge length of one square cell in pixels.
    pub cell_size: u32,
    /// Spacing between cells in pixels.
    #[serde(default = "default_gap")]
    pub gap: u32,
    /// Whether finished drags and resizes snap to whole cells.
    #[serde(default = "default_snap")]
    pub snap_to_grid: bool,
}

fn default_gap() -> u32 {
    DEFAULT_GRID_GAP
}

fn default_snap() -> bool {
    true
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            grid_columns: 12,
            grid_rows: 8,
            cell_size: 80,
            gap: DEFAULT_GRID_GAP,
            snap_to_grid: true,
        }
    }
}

impl CanvasSettings {
    #[must_use]
    pub const fn metrics(&self) -> GridMetrics {
        GridMetrics::new(self.cell_size, self.gap, self.grid_columns, self.grid_rows)
    }
}

/// Lesson content: tiles on a paged grid canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(default = "default_lesson_version")]
    pub schema_version: u16,
    pub id: LessonId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Tiles in authoring order.
    #[serde(default)]
    pub tiles: Vec<Tile>,
    #[serde(default)]
    pub canvas_settings: CanvasSettings,
    #[serde(default = "default_total_pages")]
    pub total_pages: u32,
    /// Forward-compatible extension bag.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, Value>,
}

fn default_lesson_version() -> u16 {
    LESSON_SCHEMA_VERSION
}

fn default_total_pages() -> u32 {
    1
}

impl Lesson {
    /// An empty single-page lesson.
    #[must_use]
    pub fn new(id: LessonId, canvas_settings: CanvasSettings) -> Self {
        Self {
            schema_version: LESSON_SCHEMA_VERSION,
            id,
            title: None,
            tiles: Vec::new(),
            canvas_settings,
            total_pages: 1,
            extensions: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub const fn metrics(&self) -> GridMetrics {
        self.canvas_settings.metrics()
    }

    #[must_use]
    pub fn tile(&self, id: &TileId) -> Option<&Tile> {
        self.tiles.iter().find(|tile| &tile.id == id)
    }

    #[must_use]
    pub fn tile_mut(&mut self, id: &TileId) -> Option<&mut Tile> {
        self.tiles.iter_mut().find(|tile| &tile.id == id)
    }

    /// Tiles on one page in paint order (ascending z-index, ties keep list order).
    #[must_use]
    pub fn tiles_on_page(&self, page: u32) -> Vec<&Tile> {
        let mut tiles: Vec<&Tile> = self.tiles.iter().filter(|t| t.page == page).collect();
        tiles.sort_by_key(|tile| tile.z_index);
        tiles
    }

    /// Highest z-index on a page, if the page has tiles.
    #[must_use]
    pub fn max_z_on_page(&self, page: u32) -> Option<i32> {
        self.tiles
            .iter()
            .filter(|t| t.page == page)
            .map(|t| t.z_index)
            .max()
    }

    /// Validate the lesson against schema and structural invariants.
    pub fn validate(&self) -> Result<(), LessonValidationError> {
        if self.schema_version != LESSON_SCHEMA_VERSION {
            return Err(LessonValidationError::UnsupportedVersion {
                found: self.schema_version,
                expected: LESSON_SCHEMA_VERSION,
            });
        }
        if self.total_pages == 0 {
            return Err(LessonValidationError::NoPages);
        }
        let settings = self.canvas_settings;
        if settings.grid_columns == 0 || settings.grid_rows == 0 || settings.cell_size == 0 {
            return Err(LessonValidationError::EmptyGrid {
                columns: settings.grid_columns,
                rows: settings.grid_rows,
                cell_size: settings.cell_size,
            });
        }

        let metrics = self.metrics();
        let mut seen = BTreeSet::new();
        for tile in &self.tiles {
            if !seen.insert(&tile.id) {
                return Err(LessonValidationError::DuplicateTileId {
                    tile_id: tile.id.clone(),
                });
            }
            tile.validate()?;
            if tile.page >= self.total_pages {
                return Err(LessonValidationError::PageOutOfRange {
                    tile_id: tile.id.clone(),
                    page: tile.page,
                    total_pages: self.total_pages,
                });
            }
            if !tile
                .grid_position
                .fits_within(settings.grid_columns, settings.grid_rows)
            {
                return Err(LessonValidationError::OutsideGrid {
                    tile_id: tile.id.clone(),
                    grid_position: tile.grid_position,
                });
            }
            let expected = metrics.to_pixels(tile.grid_position);
            if expected != tile.rect() {
                return Err(LessonValidationError::PixelMismatch {
                    tile_id: tile.id.clone(),
                    expected,
                    found: tile.rect(),
                });
            }
        }
        Ok(())
    }

    /// Recompute every tile's pixel rect from its grid position.
    ///
    /// Returns the number of tiles whose geometry changed.
    pub fn resync_pixels(&mut self) -> usize {
        let metrics = self.metrics();
        let mut changed = 0;
        for tile in &mut self.tiles {
            if !tile.is_consistent_with(&metrics) {
                tile.set_grid_position(tile.grid_position, &metrics);
                changed += 1;
            }
        }
        changed
    }

    /// Parse, migrate and validate a lesson from its JSON wire form.
    pub fn from_json_str(json: &str) -> Result<Self, LessonLoadError> {
        let lesson: Lesson = serde_json::from_str(json).map_err(LessonLoadError::Json)?;
        let migrated = migrate_lesson(lesson).map_err(LessonLoadError::Migration)?;
        migrated
            .lesson
            .validate()
            .map_err(LessonLoadError::Validation)?;
        Ok(migrated.lesson)
    }

    /// Encode to the JSON wire form.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =========================================================================
// Validation errors
// =========================================================================

/// Errors from lesson validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonValidationError {
    /// Schema version is not supported.
    UnsupportedVersion { found: u16, expected: u16 },
    /// `total_pages` is zero.
    NoPages,
    /// Grid has no columns, rows or cell size.
    EmptyGrid {
        columns: u32,
        rows: u32,
        cell_size: u32,
    },
    DuplicateTileId { tile_id: TileId },
    PageOutOfRange {
        tile_id: TileId,
        page: u32,
        total_pages: u32,
    },
    OutsideGrid {
        tile_id: TileId,
        grid_position: GridPosition,
    },
    /// Stored pixel rect disagrees with the grid position.
    PixelMismatch {
        tile_id: TileId,
        expected: PixelRect,
        found: PixelRect,
    },
    Tile(TileValidationError),
}

impl fmt::Display for LessonValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, expected } => write!(
                f,
                "unsupported lesson schema version {found} (expected {expected})"
            ),
            Self::NoPages => write!(f, "lesson must have at least one page"),
            Self::EmptyGrid {
                columns,
                rows,
                cell_size,
            } => write!(
                f,
                "canvas grid must be non-empty (columns={columns}, rows={rows}, cell_size={cell_size})"
            ),
            Self::DuplicateTileId { tile_id } => write!(f, "duplicate tile id {tile_id}"),
            Self::PageOutOfRange {
                tile_id,
                page,
                total_pages,
            } => write!(
                f,
                "tile {tile_id} is on page {page} but the lesson has {total_pages} page(s)"
            ),
            Self::OutsideGrid {
                tile_id,
                grid_position,
            } => write!(
                f,
                "tile {tile_id} at col {} row {} span {}x{} lies outside the grid",
                grid_position.col,
                grid_position.row,
                grid_position.col_span,
                grid_position.row_span
            ),
            Self::PixelMismatch {
                tile_id,
                expected,
                found,
            } => write!(
                f,
                "tile {tile_id} pixel rect {found:?} does not match its grid position {expected:?}"
            ),
            Self::Tile(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for LessonValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::Tile(err) = self {
            return Some(err);
        }
        None
    }
}

impl From<TileValidationError> for LessonValidationError {
    fn from(err: TileValidationError) -> Self {
        Self::Tile(err)
    }
}

/// Errors from [`Lesson::from_json_str`].
#[derive(Debug)]
pub enum LessonLoadError {
    Json(serde_json::Error),
    Migration(LessonMigrationError),
    Validation(LessonValidationError),
}

impl fmt::Display for LessonLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(e) => write!(f, "lesson JSON parse error: {e}"),
            Self::Migration(e) => write!(f, "lesson migration failed: {e}"),
            Self::Validation(e) => write!(f, "invalid lesson: {e}"),
        }
    }
}

impl std::error::Error for LessonLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            Self::Migration(e) => Some(e),
            Self::Validation(e) => Some(e),
        }
    }
}

// =========================================================================
// Migration scaffolding
// =========================================================================

/// Result of migrating a lesson to the current schema version.
#[derive(Debug, Clone)]
pub struct MigrationResult {
    pub lesson: Lesson,
    pub from_version: u16,
    pub to_version: u16,
    pub warnings: Vec<String>,
}

/// Errors from lesson migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonMigrationError {
    /// Version is newer than this build understands.
    UnsupportedVersion { version: u16 },
    /// No migration is implemented from the given version.
    NoMigrationPath { from: u16, to: u16 },
}

impl fmt::Display for LessonMigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { version } => {
                write!(f, "unsupported schema version {version} for migration")
            }
            Self::NoMigrationPath { from, to } => {
                write!(f, "no migration path from v{from} to v{to}")
            }
        }
    }
}

impl std::error::Error for LessonMigrationError {}

/// Migrate a lesson to [`LESSON_SCHEMA_VERSION`].
///
/// v1 is the current version, so this is an identity migration for v1 input.
pub fn migrate_lesson(lesson: Lesson) -> Result<MigrationResult, LessonMigrationError> {
    match lesson.schema_version {
        LESSON_SCHEMA_VERSION => Ok(MigrationResult {
            from_version: LESSON_SCHEMA_VERSION,
            to_version: LESSON_SCHEMA_VERSION,
            warnings: Vec::new(),
            lesson,
        }),
        v if v > LESSON_SCHEMA_VERSION => Err(LessonMigrationError::UnsupportedVersion { version: v }),
        v => Err(LessonMigrationError::NoMigrationPath {
            from: v,
            to: LESSON_SCHEMA_VERSION,
        }),
    }
}

#[must_use]
pub fn needs_migration(lesson: &Lesson) -> bool {
    lesson.schema_version != LESSON_SCHEMA_VERSION
}
