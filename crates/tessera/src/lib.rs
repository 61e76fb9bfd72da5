#![forbid(unsafe_code)]

//! Tessera public facade crate.
//!
//! Tessera is the data and logic layer of a lesson tile canvas: instructors
//! place typed tiles on a paged grid in the editor, and students play the
//! same lesson back read-only or interactively. This crate re-exports the
//! common types from the internal crates, defines the [`LessonSource`] seam
//! to the content service, and offers a prelude for day-to-day usage.
//!
//! ```
//! use tessera::prelude::*;
//!
//! let mut doc = LessonDocument::create(LessonId::new("demo"), &TesseraConfig::default())?;
//! let quiz = doc.add_tile(TileType::Quiz, GridPosition::new(0, 0, 3, 2), 0)?;
//!
//! let json = tessera::save_lesson_json(doc.lesson())?;
//! let lesson = tessera::load_lesson_json(&json)?;
//!
//! let mut session = PlaybackSession::new(
//!     lesson,
//!     PlaybackMode::Interactive,
//!     RuntimePolicyConfig::default(),
//! )?;
//! let outcome = session.check(&quiz, &TileResponse::quiz([0]))?;
//! assert_eq!(outcome.evaluation, Evaluation::Success);
//! # Ok::<(), tessera::Error>(())
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

#[cfg(feature = "tracing-json")]
pub mod logging;

// --- Core re-exports -------------------------------------------------------

pub use tessera_core::{
    CanvasSettings, ConfigError, GridMetrics, GridPosition, Lesson, LessonId, LessonLoadError,
    LessonValidationError, PixelPoint, PixelRect, PixelSize, RuntimePolicyConfig, TesseraConfig,
    Tile, TileContent, TileId, TileType, Timestamp,
};

// --- Editor re-exports -----------------------------------------------------

pub use tessera_editor::{
    DocumentError, EditorAction, EditorMode, EditorState, EditorTransition, Interaction,
    LessonDocument, ResizeHandle, TilePatch, reduce,
};

// --- Runtime re-exports ----------------------------------------------------

pub use tessera_runtime::{
    CheckOutcome, Evaluation, EvaluationError, PlaybackMode, PlaybackSession, SessionError,
    SessionSummary, TileResponse, evaluate,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for Tessera callers.
#[derive(Debug)]
pub enum Error {
    /// Lesson JSON could not be parsed, migrated or validated.
    Load(LessonLoadError),
    /// Lesson could not be encoded.
    Encode(serde_json::Error),
    Config(ConfigError),
    Document(DocumentError),
    Session(SessionError),
    Evaluation(EvaluationError),
    /// The content service has no lesson with this id.
    LessonNotFound(LessonId),
    /// Stored content answers to a different id than the one requested.
    LessonIdMismatch { requested: LessonId, found: LessonId },
    /// I/O failure while reading lesson content.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "lesson encode error: {err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Document(err) => write!(f, "{err}"),
            Self::Session(err) => write!(f, "{err}"),
            Self::Evaluation(err) => write!(f, "{err}"),
            Self::LessonNotFound(id) => write!(f, "lesson {id} not found"),
            Self::LessonIdMismatch { requested, found } => {
                write!(f, "requested lesson {requested} but content is lesson {found}")
            }
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Document(err) => Some(err),
            Self::Session(err) => Some(err),
            Self::Evaluation(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::LessonNotFound(_) | Self::LessonIdMismatch { .. } => None,
        }
    }
}

impl From<LessonLoadError> for Error {
    fn from(err: LessonLoadError) -> Self {
        Self::Load(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<DocumentError> for Error {
    fn from(err: DocumentError) -> Self {
        Self::Document(err)
    }
}

impl From<SessionError> for Error {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

impl From<EvaluationError> for Error {
    fn from(err: EvaluationError) -> Self {
        Self::Evaluation(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Standard result type for Tessera APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Lesson loading -------------------------------------------------------

/// Parse, migrate and validate a lesson from its JSON wire form.
pub fn load_lesson_json(json: &str) -> Result<Lesson> {
    let lesson = Lesson::from_json_str(json)?;
    tracing::debug!(
        message = "lesson.load",
        lesson_id = %lesson.id,
        tiles = lesson.tiles.len(),
        total_pages = lesson.total_pages,
    );
    Ok(lesson)
}

/// Encode a lesson to its JSON wire form.
pub fn save_lesson_json(lesson: &Lesson) -> Result<String> {
    lesson.to_json_string().map_err(Error::Encode)
}

/// Where lesson content comes from.
///
/// Implemented by whatever talks to the content service; lessons it returns
/// are expected to have passed [`load_lesson_json`] or equivalent checks.
pub trait LessonSource {
    fn lesson_content(&self, id: &LessonId) -> Result<Lesson>;
}

/// Lessons held in memory, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLessonSource {
    lessons: BTreeMap<LessonId, Lesson>,
}

impl InMemoryLessonSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a lesson after validating it.
    pub fn insert(&mut self, lesson: Lesson) -> Result<()> {
        lesson
            .validate()
            .map_err(|err| Error::Load(LessonLoadError::Validation(err)))?;
        self.lessons.insert(lesson.id.clone(), lesson);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }
}

impl LessonSource for InMemoryLessonSource {
    fn lesson_content(&self, id: &LessonId) -> Result<Lesson> {
        self.lessons
            .get(id)
            .cloned()
            .ok_or_else(|| Error::LessonNotFound(id.clone()))
    }
}

/// Lessons stored as `<id>.json` files in one directory.
#[derive(Debug, Clone)]
pub struct DirectoryLessonSource {
    root: PathBuf,
}

impl DirectoryLessonSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &LessonId) -> Option<PathBuf> {
        let name = id.as_str();
        let safe = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));
        safe.then(|| self.root.join(format!("{name}.json")))
    }
}

impl LessonSource for DirectoryLessonSource {
    fn lesson_content(&self, id: &LessonId) -> Result<Lesson> {
        let Some(path) = self.path_for(id) else {
            return Err(Error::LessonNotFound(id.clone()));
        };
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::LessonNotFound(id.clone()));
            }
            Err(err) => return Err(err.into()),
        };
        let lesson = load_lesson_json(&json)?;
        if &lesson.id != id {
            tracing::warn!(
                message = "lesson.id_mismatch",
                requested = %id,
                found = %lesson.id,
                path = %path.display(),
            );
            return Err(Error::LessonIdMismatch {
                requested: id.clone(),
                found: lesson.id,
            });
        }
        Ok(lesson)
    }
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        CheckOutcome, EditorAction, EditorMode, EditorState, Error, Evaluation, GridPosition,
        Lesson, LessonDocument, LessonId, LessonSource, PixelPoint, PixelRect, PlaybackMode,
        PlaybackSession, Result, RuntimePolicyConfig, TesseraConfig, Tile, TileContent, TileId,
        TilePatch, TileResponse, TileType,
    };

    pub use crate::{core, editor, runtime};
}

pub use tessera_core as core;
pub use tessera_editor as editor;
pub use tessera_runtime as runtime;
