#![forbid(unsafe_code)]

//! Scoring of student responses against authored answers.
//!
//! Every evaluator is a pure function of the tile content and the response.
//! A response that is not finished yet (nothing selected, a blank left
//! empty) scores [`Evaluation::Idle`]; a response that cannot belong to the
//! tile at all (unknown ids, out-of-range answers) is an
//! [`EvaluationError`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tessera_core::{
    BlanksContent, OpenContent, PairingContent, QuizContent, RuntimePolicyConfig,
    SequencingContent, TileContent, TileType,
};

/// Result of scoring one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Evaluation {
    /// Nothing to score yet.
    #[default]
    Idle,
    Success,
    Error,
}

impl Evaluation {
    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    const fn from_match(matches: bool) -> Self {
        if matches { Self::Success } else { Self::Error }
    }
}

/// A student's interaction with one evaluable tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TileResponse {
    /// Indices of the chosen answers.
    Quiz { selected: BTreeSet<usize> },
    /// Blank id to placed option id.
    Blanks { placements: BTreeMap<String, String> },
    /// Left pair id to the pair id whose right side was chosen.
    Pairing { matches: BTreeMap<String, String> },
    /// Item ids in the submitted order.
    Sequencing { order: Vec<String> },
    Open { answer: String },
}

impl TileResponse {
    /// Tile type this response answers.
    #[must_use]
    pub const fn tile_type(&self) -> TileType {
        match self {
            Self::Quiz { .. } => TileType::Quiz,
            Self::Blanks { .. } => TileType::Blanks,
            Self::Pairing { .. } => TileType::Pairing,
            Self::Sequencing { .. } => TileType::Sequencing,
            Self::Open { .. } => TileType::Open,
        }
    }

    /// Quiz response from answer indices.
    #[must_use]
    pub fn quiz(selected: impl IntoIterator<Item = usize>) -> Self {
        Self::Quiz {
            selected: selected.into_iter().collect(),
        }
    }

    /// Blanks response from `(blank_id, option_id)` pairs.
    #[must_use]
    pub fn blanks<'a>(placements: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self::Blanks {
            placements: owned_map(placements),
        }
    }

    /// Pairing response from `(left_pair_id, chosen_pair_id)` pairs.
    #[must_use]
    pub fn pairing<'a>(matches: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self::Pairing {
            matches: owned_map(matches),
        }
    }

    #[must_use]
    pub fn sequencing<'a>(order: impl IntoIterator<Item = &'a str>) -> Self {
        Self::Sequencing {
            order: order.into_iter().map(str::to_string).collect(),
        }
    }

    #[must_use]
    pub fn open(answer: impl Into<String>) -> Self {
        Self::Open {
            answer: answer.into(),
        }
    }
}

fn owned_map<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Score `response` against `content` with default runtime policy.
pub fn evaluate(content: &TileContent, response: &TileResponse) -> Result<Evaluation, EvaluationError> {
    evaluate_with(content, response, &RuntimePolicyConfig::default())
}

/// Score `response` against `content`.
pub fn evaluate_with(
    content: &TileContent,
    response: &TileResponse,
    policy: &RuntimePolicyConfig,
) -> Result<Evaluation, EvaluationError> {
    match (content, response) {
        (TileContent::Quiz(quiz), TileResponse::Quiz { selected }) => evaluate_quiz(quiz, selected),
        (TileContent::Blanks(blanks), TileResponse::Blanks { placements }) => {
            evaluate_blanks(blanks, placements)
        }
        (TileContent::Pairing(pairing), TileResponse::Pairing { matches }) => {
            evaluate_pairing(pairing, matches)
        }
        (TileContent::Sequencing(sequencing), TileResponse::Sequencing { order }) => {
            evaluate_sequencing(sequencing, order)
        }
        (TileContent::Open(open), TileResponse::Open { answer }) => {
            Ok(evaluate_open(open, answer, policy.trim_open_answers))
        }
        (content, response) if content.tile_type().is_evaluable() => {
            Err(EvaluationError::ResponseMismatch {
                expected: content.tile_type(),
                found: response.tile_type(),
            })
        }
        (content, _) => Err(EvaluationError::NotEvaluable {
            tile_type: content.tile_type(),
        }),
    }
}

/// Exact set match of selected indices against the answers flagged correct.
pub fn evaluate_quiz(
    quiz: &QuizContent,
    selected: &BTreeSet<usize>,
) -> Result<Evaluation, EvaluationError> {
    if let Some(&index) = selected.iter().find(|&&i| i >= quiz.answers.len()) {
        return Err(EvaluationError::AnswerOutOfRange {
            index,
            answers: quiz.answers.len(),
        });
    }
    if selected.is_empty() {
        return Ok(Evaluation::Idle);
    }
    Ok(Evaluation::from_match(*selected == quiz.correct_indices()))
}

/// Every blank must hold its `correct_option_id`.
pub fn evaluate_blanks(
    blanks: &BlanksContent,
    placements: &BTreeMap<String, String>,
) -> Result<Evaluation, EvaluationError> {
    let option_ids: BTreeSet<&str> = blanks.options.iter().map(|o| o.id.as_str()).collect();
    for (blank_id, option_id) in placements {
        if !blanks.blanks.iter().any(|b| &b.id == blank_id) {
            return Err(EvaluationError::UnknownBlank {
                blank_id: blank_id.clone(),
            });
        }
        if !option_ids.contains(option_id.as_str()) {
            return Err(EvaluationError::UnknownOption {
                option_id: option_id.clone(),
            });
        }
    }
    if blanks.blanks.is_empty() || blanks.blanks.iter().any(|b| !placements.contains_key(&b.id)) {
        return Ok(Evaluation::Idle);
    }
    let all_correct = blanks
        .blanks
        .iter()
        .all(|b| placements.get(&b.id) == Some(&b.correct_option_id));
    Ok(Evaluation::from_match(all_correct))
}

/// Every left side must be matched with its own pair's right side.
pub fn evaluate_pairing(
    pairing: &PairingContent,
    matches: &BTreeMap<String, String>,
) -> Result<Evaluation, EvaluationError> {
    let pair_ids: BTreeSet<&str> = pairing.pairs.iter().map(|p| p.id.as_str()).collect();
    for (left, right) in matches {
        for id in [left, right] {
            if !pair_ids.contains(id.as_str()) {
                return Err(EvaluationError::UnknownPair { pair_id: id.clone() });
            }
        }
    }
    if pair_ids.is_empty() || pair_ids.iter().any(|id| !matches.contains_key(*id)) {
        return Ok(Evaluation::Idle);
    }
    Ok(Evaluation::from_match(
        matches.iter().all(|(left, right)| left == right),
    ))
}

/// Submitted order must equal items sorted by `correct_position`.
pub fn evaluate_sequencing(
    sequencing: &SequencingContent,
    order: &[String],
) -> Result<Evaluation, EvaluationError> {
    let mut seen = BTreeSet::new();
    for item_id in order {
        if !sequencing.items.iter().any(|item| &item.id == item_id) {
            return Err(EvaluationError::UnknownItem {
                item_id: item_id.clone(),
            });
        }
        if !seen.insert(item_id.as_str()) {
            return Err(EvaluationError::DuplicateItem {
                item_id: item_id.clone(),
            });
        }
    }
    if order.is_empty() || order.len() < sequencing.items.len() {
        return Ok(Evaluation::Idle);
    }
    let expected = sequencing.correct_order();
    Ok(Evaluation::from_match(
        order.iter().map(String::as_str).eq(expected),
    ))
}

/// Free-text answer against the optional expected answer.
///
/// Without an expected answer any non-blank answer succeeds.
#[must_use]
pub fn evaluate_open(open: &OpenContent, answer: &str, trim: bool) -> Evaluation {
    let answer = if trim { answer.trim() } else { answer };
    if answer.trim().is_empty() {
        return Evaluation::Idle;
    }
    let Some(expected) = open.expected_answer.as_deref() else {
        return Evaluation::Success;
    };
    let expected = if trim { expected.trim() } else { expected };
    let matches = if open.case_sensitive {
        answer == expected
    } else {
        answer.to_lowercase() == expected.to_lowercase()
    };
    Evaluation::from_match(matches)
}

// ============================================================================
// Errors
// ============================================================================

/// A response that cannot be scored against the tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// The tile has no evaluator (text, image, ...).
    NotEvaluable { tile_type: TileType },
    ResponseMismatch { expected: TileType, found: TileType },
    AnswerOutOfRange { index: usize, answers: usize },
    UnknownBlank { blank_id: String },
    UnknownOption { option_id: String },
    UnknownPair { pair_id: String },
    UnknownItem { item_id: String },
    DuplicateItem { item_id: String },
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotEvaluable { tile_type } => write!(f, "{tile_type} tiles are not evaluated"),
            Self::ResponseMismatch { expected, found } => {
                write!(f, "expected a {expected} response, got {found}")
            }
            Self::AnswerOutOfRange { index, answers } => {
                write!(f, "answer {index} out of range ({answers} answers)")
            }
            Self::UnknownBlank { blank_id } => write!(f, "unknown blank {blank_id:?}"),
            Self::UnknownOption { option_id } => write!(f, "unknown option {option_id:?}"),
            Self::UnknownPair { pair_id } => write!(f, "unknown pair {pair_id:?}"),
            Self::UnknownItem { item_id } => write!(f, "unknown sequencing item {item_id:?}"),
            Self::DuplicateItem { item_id } => {
                write!(f, "sequencing item {item_id:?} submitted twice")
            }
        }
    }
}

impl std::error::Error for EvaluationError {}
