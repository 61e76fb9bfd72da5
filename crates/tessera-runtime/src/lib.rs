#![forbid(unsafe_code)]

//! Runtime: answer evaluators and student playback sessions.
//!
//! # Role in Tessera
//! `tessera-runtime` is the student side. It lays lesson pages out with the
//! same grid geometry the editor uses and scores responses on quiz, blanks,
//! pairing, sequencing and open tiles.
//!
//! # Example
//! ```
//! use tessera_core::{QuestionType, QuizAnswer, QuizContent, TileContent};
//! use tessera_runtime::{Evaluation, TileResponse, evaluate};
//!
//! let quiz = TileContent::Quiz(QuizContent {
//!     question: "Even numbers?".into(),
//!     question_type: QuestionType::Multiple,
//!     answers: vec![
//!         QuizAnswer::new("2", true),
//!         QuizAnswer::new("3", false),
//!         QuizAnswer::new("4", true),
//!     ],
//!     explanation: None,
//! });
//! assert_eq!(evaluate(&quiz, &TileResponse::quiz([0, 2])), Ok(Evaluation::Success));
//! assert_eq!(evaluate(&quiz, &TileResponse::quiz([])), Ok(Evaluation::Idle));
//! ```

pub mod evaluate;
pub mod session;

pub use evaluate::{
    Evaluation, EvaluationError, TileResponse, evaluate, evaluate_blanks, evaluate_open,
    evaluate_pairing, evaluate_quiz, evaluate_sequencing, evaluate_with,
};
pub use session::{
    CheckOutcome, PlaybackMode, PlaybackSession, RenderedTile, SessionError, SessionSummary,
    TileProgress,
};
