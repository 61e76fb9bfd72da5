#![forbid(unsafe_code)]

//! Student playback of a lesson.
//!
//! A [`PlaybackSession`] walks a validated lesson page by page. In
//! [`PlaybackMode::Interactive`] students check answers on evaluable tiles;
//! each scored check counts as an attempt and, when
//! [`RuntimePolicyConfig::max_attempts`] is set, a tile locks once its
//! attempts run out without a correct answer. [`PlaybackMode::ReadOnly`]
//! renders the same layout and rejects every check.
//!
//! Progress lives only in the session; nothing is persisted.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tessera_core::{Lesson, LessonValidationError, PixelRect, RuntimePolicyConfig, Tile, TileId};

use crate::evaluate::{Evaluation, EvaluationError, TileResponse, evaluate_with};

/// Whether students can interact with evaluable tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    ReadOnly,
    #[default]
    Interactive,
}

/// Per-tile check history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TileProgress {
    /// Scored checks so far.
    pub attempts: u32,
    pub last: Evaluation,
    /// Set by the first successful check; never cleared except by reset.
    pub solved: bool,
    pub locked: bool,
}

/// What a check produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub evaluation: Evaluation,
    pub attempts: u32,
    /// `None` when attempts are unlimited.
    pub attempts_remaining: Option<u32>,
    pub locked: bool,
}

/// A tile positioned for drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedTile<'a> {
    pub tile: &'a Tile,
    pub rect: PixelRect,
    pub progress: Option<&'a TileProgress>,
}

/// Aggregate progress over the evaluable tiles of a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    pub evaluable_tiles: usize,
    pub attempted: usize,
    pub solved: usize,
    pub locked: usize,
}

impl SessionSummary {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.solved == self.evaluable_tiles
    }
}

/// One student's pass through a lesson.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    lesson: Lesson,
    mode: PlaybackMode,
    policy: RuntimePolicyConfig,
    current_page: u32,
    progress: BTreeMap<TileId, TileProgress>,
}

impl PlaybackSession {
    /// Start on the first page. The lesson must validate.
    pub fn new(
        lesson: Lesson,
        mode: PlaybackMode,
        policy: RuntimePolicyConfig,
    ) -> Result<Self, SessionError> {
        lesson.validate()?;
        tracing::debug!(
            message = "session.start",
            lesson_id = %lesson.id,
            mode = ?mode,
            total_pages = lesson.total_pages,
        );
        Ok(Self {
            lesson,
            mode,
            policy,
            current_page: 0,
            progress: BTreeMap::new(),
        })
    }

    #[must_use]
    pub const fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    #[must_use]
    pub const fn mode(&self) -> PlaybackMode {
        self.mode
    }

    #[must_use]
    pub const fn current_page(&self) -> u32 {
        self.current_page
    }

    #[must_use]
    pub const fn total_pages(&self) -> u32 {
        self.lesson.total_pages
    }

    // ====================================================================
    // Navigation
    // ====================================================================

    /// Advance one page. Returns `false` on the last page.
    pub fn next_page(&mut self) -> bool {
        if self.current_page + 1 >= self.lesson.total_pages {
            return false;
        }
        self.current_page += 1;
        tracing::debug!(message = "session.page", page = self.current_page);
        true
    }

    /// Go back one page. Returns `false` on the first page.
    pub fn previous_page(&mut self) -> bool {
        if self.current_page == 0 {
            return false;
        }
        self.current_page -= 1;
        tracing::debug!(message = "session.page", page = self.current_page);
        true
    }

    pub fn go_to_page(&mut self, page: u32) -> Result<(), SessionError> {
        self.check_page(page)?;
        self.current_page = page;
        tracing::debug!(message = "session.page", page);
        Ok(())
    }

    // ====================================================================
    // Layout
    // ====================================================================

    /// Tiles of `page` in paint order with their pixel rects.
    pub fn page_layout(&self, page: u32) -> Result<Vec<RenderedTile<'_>>, SessionError> {
        self.check_page(page)?;
        let metrics = self.lesson.metrics();
        Ok(self
            .lesson
            .tiles_on_page(page)
            .into_iter()
            .map(|tile| RenderedTile {
                tile,
                rect: metrics.to_pixels(tile.grid_position),
                progress: self.progress.get(&tile.id),
            })
            .collect())
    }

    #[must_use]
    pub fn current_layout(&self) -> Vec<RenderedTile<'_>> {
        self.page_layout(self.current_page).unwrap_or_default()
    }

    // ====================================================================
    // Checking
    // ====================================================================

    /// Score a response for a tile and record the attempt.
    ///
    /// Idle evaluations (nothing submitted yet) are returned without
    /// consuming an attempt.
    pub fn check(
        &mut self,
        tile_id: &TileId,
        response: &TileResponse,
    ) -> Result<CheckOutcome, SessionError> {
        if self.mode == PlaybackMode::ReadOnly {
            return Err(SessionError::ReadOnly);
        }
        let tile = self
            .lesson
            .tile(tile_id)
            .ok_or_else(|| SessionError::TileNotFound {
                tile_id: tile_id.clone(),
            })?;
        let current = self.progress.get(tile_id).copied().unwrap_or_default();
        if current.locked {
            return Err(SessionError::Locked {
                tile_id: tile_id.clone(),
                attempts: current.attempts,
            });
        }

        let evaluation = evaluate_with(&tile.content, response, &self.policy)?;
        let mut progress = current;
        if !evaluation.is_idle() {
            progress.attempts = progress.attempts.saturating_add(1);
            progress.last = evaluation;
            progress.solved |= evaluation.is_success();
            progress.locked = !progress.solved
                && self
                    .policy
                    .max_attempts
                    .is_some_and(|max| progress.attempts >= max);
            self.progress.insert(tile_id.clone(), progress);
        }

        let outcome = CheckOutcome {
            evaluation,
            attempts: progress.attempts,
            attempts_remaining: self
                .policy
                .max_attempts
                .map(|max| max.saturating_sub(progress.attempts)),
            locked: progress.locked,
        };
        tracing::debug!(
            message = "session.check",
            tile_id = %tile_id,
            evaluation = ?evaluation,
            attempts = progress.attempts,
            locked = progress.locked,
        );
        if progress.locked {
            tracing::warn!(message = "session.locked", tile_id = %tile_id, attempts = progress.attempts);
        }
        Ok(outcome)
    }

    #[must_use]
    pub fn progress(&self, tile_id: &TileId) -> Option<&TileProgress> {
        self.progress.get(tile_id)
    }

    /// Forget attempts and results for one tile.
    pub fn reset_tile(&mut self, tile_id: &TileId) -> Result<(), SessionError> {
        if self.lesson.tile(tile_id).is_none() {
            return Err(SessionError::TileNotFound {
                tile_id: tile_id.clone(),
            });
        }
        self.progress.remove(tile_id);
        tracing::debug!(message = "session.reset_tile", tile_id = %tile_id);
        Ok(())
    }

    /// Forget all progress and return to the first page.
    pub fn reset(&mut self) {
        self.progress.clear();
        self.current_page = 0;
    }

    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        let mut summary = SessionSummary::default();
        for tile in &self.lesson.tiles {
            if !tile.tile_type().is_evaluable() {
                continue;
            }
            summary.evaluable_tiles += 1;
            if let Some(progress) = self.progress.get(&tile.id) {
                summary.attempted += usize::from(progress.attempts > 0);
                summary.solved += usize::from(progress.solved);
                summary.locked += usize::from(progress.locked);
            }
        }
        summary
    }

    fn check_page(&self, page: u32) -> Result<(), SessionError> {
        if page >= self.lesson.total_pages {
            return Err(SessionError::PageOutOfRange {
                page,
                total_pages: self.lesson.total_pages,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Checks are disabled in read-only playback.
    ReadOnly,
    TileNotFound {
        tile_id: TileId,
    },
    PageOutOfRange {
        page: u32,
        total_pages: u32,
    },
    /// The tile used up its attempts without a correct answer.
    Locked {
        tile_id: TileId,
        attempts: u32,
    },
    Evaluation(EvaluationError),
    InvalidLesson(LessonValidationError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "session is read-only"),
            Self::TileNotFound { tile_id } => write!(f, "tile {tile_id} not found"),
            Self::PageOutOfRange { page, total_pages } => {
                write!(f, "page {page} out of range (lesson has {total_pages})")
            }
            Self::Locked { tile_id, attempts } => {
                write!(f, "tile {tile_id} is locked after {attempts} attempts")
            }
            Self::Evaluation(err) => write!(f, "cannot evaluate: {err}"),
            Self::InvalidLesson(err) => write!(f, "invalid lesson: {err}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Evaluation(err) => Some(err),
            Self::InvalidLesson(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EvaluationError> for SessionError {
    fn from(err: EvaluationError) -> Self {
        Self::Evaluation(err)
    }
}

impl From<LessonValidationError> for SessionError {
    fn from(err: LessonValidationError) -> Self {
        Self::InvalidLesson(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{
        CanvasSettings, GridPosition, LessonId, OpenContent, QuizAnswer, QuizContent,
        TileContent, Timestamp,
    };

    fn lesson() -> Lesson {
        let settings = CanvasSettings::default();
        let metrics = settings.metrics();
        let now = Timestamp::from_millis(10);
        let mut lesson = Lesson::new(LessonId::new("l1"), settings);
        lesson.total_pages = 2;
        let quiz = Tile::placed(
            TileId::new("quiz"),
            TileContent::Quiz(QuizContent {
                question: "1 + 1?".into(),
                answers: vec![QuizAnswer::new("2", true), QuizAnswer::new("3", false)],
                ..QuizContent::default()
            }),
            GridPosition::new(0, 0, 4, 2),
            0,
            &metrics,
            now,
        );
        let mut text = Tile::placed(
            TileId::new("intro"),
            TileContent::default_for(tessera_core::TileType::Text),
            GridPosition::new(0, 2, 4, 1),
            0,
            &metrics,
            now,
        );
        text.z_index = -1;
        let open = Tile::placed(
            TileId::new("open"),
            TileContent::Open(OpenContent {
                question: "Say hi".into(),
                expected_answer: Some("hi".into()),
                case_sensitive: false,
            }),
            GridPosition::new(1, 1, 2, 2),
            1,
            &metrics,
            now,
        );
        lesson.tiles = vec![quiz, text, open];
        lesson
    }

    fn session(max_attempts: Option<u32>) -> PlaybackSession {
        let policy = RuntimePolicyConfig {
            max_attempts,
            ..RuntimePolicyConfig::default()
        };
        PlaybackSession::new(lesson(), PlaybackMode::Interactive, policy).unwrap()
    }

    #[test]
    fn navigation_stays_in_range() {
        let mut s = session(None);
        assert_eq!(s.current_page(), 0);
        assert!(!s.previous_page());
        assert!(s.next_page());
        assert!(!s.next_page());
        assert_eq!(s.current_page(), 1);
        assert!(s.previous_page());
        assert_eq!(
            s.go_to_page(2),
            Err(SessionError::PageOutOfRange {
                page: 2,
                total_pages: 2
            })
        );
        s.go_to_page(1).unwrap();
        assert_eq!(s.current_page(), 1);
    }

    #[test]
    fn layout_is_in_paint_order_with_shared_geometry() {
        let s = session(None);
        let layout = s.current_layout();
        let ids: Vec<&str> = layout.iter().map(|r| r.tile.id.as_str()).collect();
        assert_eq!(ids, vec!["intro", "quiz"]);
        let metrics = s.lesson().metrics();
        for rendered in &layout {
            assert_eq!(rendered.rect, metrics.to_pixels(rendered.tile.grid_position));
            assert_eq!(rendered.rect, rendered.tile.rect());
        }
        assert!(s.page_layout(5).is_err());
    }

    #[test]
    fn check_counts_scored_attempts() {
        let mut s = session(None);
        let quiz = TileId::new("quiz");
        let idle = s.check(&quiz, &TileResponse::quiz([])).unwrap();
        assert_eq!(idle.evaluation, Evaluation::Idle);
        assert_eq!(idle.attempts, 0);
        assert!(s.progress(&quiz).is_none());

        let wrong = s.check(&quiz, &TileResponse::quiz([1])).unwrap();
        assert_eq!(wrong.evaluation, Evaluation::Error);
        assert_eq!(wrong.attempts, 1);
        assert_eq!(wrong.attempts_remaining, None);

        let right = s.check(&quiz, &TileResponse::quiz([0])).unwrap();
        assert_eq!(right.evaluation, Evaluation::Success);
        assert_eq!(right.attempts, 2);
        assert!(s.progress(&quiz).unwrap().solved);
    }

    #[test]
    fn attempts_lock_the_tile() {
        let mut s = session(Some(2));
        let quiz = TileId::new("quiz");
        let first = s.check(&quiz, &TileResponse::quiz([1])).unwrap();
        assert_eq!(first.attempts_remaining, Some(1));
        assert!(!first.locked);
        let second = s.check(&quiz, &TileResponse::quiz([1])).unwrap();
        assert!(second.locked);
        assert_eq!(second.attempts_remaining, Some(0));
        assert_eq!(
            s.check(&quiz, &TileResponse::quiz([0])),
            Err(SessionError::Locked {
                tile_id: quiz.clone(),
                attempts: 2
            })
        );
        s.reset_tile(&quiz).unwrap();
        assert!(s.check(&quiz, &TileResponse::quiz([0])).unwrap().evaluation.is_success());
    }

    #[test]
    fn solving_on_last_attempt_does_not_lock() {
        let mut s = session(Some(1));
        let outcome = s
            .check(&TileId::new("open"), &TileResponse::open(" HI "))
            .unwrap();
        assert!(outcome.evaluation.is_success());
        assert!(!outcome.locked);
    }

    #[test]
    fn read_only_rejects_checks() {
        let mut s =
            PlaybackSession::new(lesson(), PlaybackMode::ReadOnly, RuntimePolicyConfig::default())
                .unwrap();
        assert_eq!(
            s.check(&TileId::new("quiz"), &TileResponse::quiz([0])),
            Err(SessionError::ReadOnly)
        );
        assert_eq!(s.current_layout().len(), 2);
    }

    #[test]
    fn check_errors_are_typed() {
        let mut s = session(None);
        assert!(matches!(
            s.check(&TileId::new("nope"), &TileResponse::quiz([0])),
            Err(SessionError::TileNotFound { .. })
        ));
        assert!(matches!(
            s.check(&TileId::new("intro"), &TileResponse::open("x")),
            Err(SessionError::Evaluation(EvaluationError::NotEvaluable { .. }))
        ));
        assert!(matches!(
            s.check(&TileId::new("quiz"), &TileResponse::quiz([7])),
            Err(SessionError::Evaluation(
                EvaluationError::AnswerOutOfRange { .. }
            ))
        ));
        assert!(s.progress(&TileId::new("quiz")).is_none());
    }

    #[test]
    fn summary_counts_evaluable_tiles() {
        let mut s = session(Some(1));
        assert_eq!(
            s.summary(),
            SessionSummary {
                evaluable_tiles: 2,
                ..SessionSummary::default()
            }
        );
        s.check(&TileId::new("quiz"), &TileResponse::quiz([1]))
            .unwrap();
        s.check(&TileId::new("open"), &TileResponse::open("hi"))
            .unwrap();
        let summary = s.summary();
        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.solved, 1);
        assert_eq!(summary.locked, 1);
        assert!(!summary.is_complete());

        s.reset();
        assert_eq!(s.summary().attempted, 0);
        assert_eq!(s.current_page(), 0);
    }

    #[test]
    fn invalid_lesson_is_rejected() {
        let mut broken = lesson();
        broken.total_pages = 1;
        assert!(matches!(
            PlaybackSession::new(broken, PlaybackMode::Interactive, RuntimePolicyConfig::default()),
            Err(SessionError::InvalidLesson(
                LessonValidationError::PageOutOfRange { .. }
            ))
        ));
    }
}
