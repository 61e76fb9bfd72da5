#![forbid(unsafe_code)]

//! Core: lesson schema, tile variants, grid geometry and configuration.
//!
//! # Role in Tessera
//! `tessera-core` is the data layer shared by the editor and the playback
//! runtime. It owns the wire format of lessons and the single grid ↔ pixel
//! mapping both canvases draw with.
//!
//! # Primary responsibilities
//! - **Geometry**: [`GridMetrics`] converts grid blocks to pixel rects and back.
//! - **Tiles**: the [`Tile`] schema with its ten [`TileContent`] variants.
//! - **Lessons**: [`Lesson`] validation, JSON loading and schema migration.
//! - **Config**: [`TesseraConfig`] loaded from TOML or JSON.

pub mod config;
pub mod geometry;
pub mod lesson;
pub mod tile;

pub use config::{
    ConfigError, EditorPolicyConfig, GridPolicyConfig, RuntimePolicyConfig, TesseraConfig,
};
pub use geometry::{DEFAULT_GRID_GAP, GridMetrics, GridPosition, PixelPoint, PixelRect, PixelSize};
pub use lesson::{
    CanvasSettings, LESSON_SCHEMA_VERSION, Lesson, LessonId, LessonLoadError,
    LessonMigrationError, LessonValidationError, MigrationResult, migrate_lesson,
    needs_migration,
};
pub use tile::{
    Blank, BlankOption, BlanksContent, ImageContent, InteractiveContent, OpenContent, PairItem,
    PairingContent, ProgrammingContent, QuestionType, QuizAnswer, QuizContent, SequencingContent,
    SequencingItem, TextContent, Tile, TileContent, TileDecodeError, TileId, TileType,
    TileValidationError, Timestamp, VisualizationContent,
};
