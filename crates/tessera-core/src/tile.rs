#![forbid(unsafe_code)]

//! Tile schema: the positioned content units of a lesson canvas.
//!
//! A [`Tile`] carries common placement fields plus a [`TileContent`] variant.
//! On the wire a tile is a flat JSON object discriminated by `"type"`:
//!
//! ```json
//! {
//!   "id": "tile-1",
//!   "type": "quiz",
//!   "position": { "x": 0, "y": 0 },
//!   "size": { "width": 88, "height": 40 },
//!   "gridPosition": { "col": 0, "row": 0, "colSpan": 2, "rowSpan": 1 },
//!   "page": 0,
//!   "z_index": 1,
//!   "created_at": 1700000000000,
//!   "updated_at": 1700000000000,
//!   "version": 1,
//!   "content": { "question": "2 + 2?", "questionType": "single", "answers": [] }
//! }
//! ```
//!
//! Decoding checks that `content` matches the declared `type`; structural
//! rules (spans, answer keys, id uniqueness) live in [`Tile::validate`].

use std::collections::BTreeSet;
use std::fmt;

use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::geometry::{GridMetrics, GridPosition, PixelPoint, PixelRect, PixelSize};

// =========================================================================
// Identifiers and timestamps
// =========================================================================

/// Stable tile identifier, unique within a lesson.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(String);

impl TileId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TileId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Milliseconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Current wall-clock time. Clocks before the epoch read as zero.
    #[must_use]
    pub fn now() -> Self {
        let millis = web_time::SystemTime::now()
            .duration_since(web_time::UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Self(millis)
    }
}

// =========================================================================
// Tile types
// =========================================================================

/// Discriminant of a tile's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileType {
    Text,
    Image,
    Interactive,
    Visualization,
    Quiz,
    Programming,
    Sequencing,
    Blanks,
    Open,
    Pairing,
}

impl TileType {
    pub const ALL: [TileType; 10] = [
        TileType::Text,
        TileType::Image,
        TileType::Interactive,
        TileType::Visualization,
        TileType::Quiz,
        TileType::Programming,
        TileType::Sequencing,
        TileType::Blanks,
        TileType::Open,
        TileType::Pairing,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Interactive => "interactive",
            Self::Visualization => "visualization",
            Self::Quiz => "quiz",
            Self::Programming => "programming",
            Self::Sequencing => "sequencing",
            Self::Blanks => "blanks",
            Self::Open => "open",
            Self::Pairing => "pairing",
        }
    }

    /// Whether students submit an answer that can be checked.
    #[must_use]
    pub const fn is_evaluable(self) -> bool {
        matches!(
            self,
            Self::Quiz | Self::Sequencing | Self::Blanks | Self::Open | Self::Pairing
        )
    }
}

impl fmt::Display for TileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =========================================================================
// Variant content
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    #[serde(default)]
    pub text: String,
    /// Serialized rich-text document, when the editor produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_text: Option<String>,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default = "default_text_color")]
    pub text_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default)]
    pub show_border: bool,
}

fn default_font_size() -> u32 {
    16
}

fn default_text_color() -> String {
    "#000000".to_string()
}

impl Default for TextContent {
    fn default() -> Self {
        Self {
            text: String::new(),
            rich_text: None,
            font_size: default_font_size(),
            text_color: default_text_color(),
            background_color: None,
            show_border: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Pan of the image inside the tile frame, in pixels.
    #[serde(default)]
    pub offset_x: i32,
    #[serde(default)]
    pub offset_y: i32,
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl Default for ImageContent {
    fn default() -> Self {
        Self {
            url: String::new(),
            alt: String::new(),
            caption: None,
            offset_x: 0,
            offset_y: 0,
            scale: default_scale(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveContent {
    #[serde(default)]
    pub interactive_type: String,
    #[serde(default)]
    pub config: Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationContent {
    #[serde(default)]
    pub visualization_type: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub config: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    #[default]
    Single,
    Multiple,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswer {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl QuizAnswer {
    #[must_use]
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            text: text.into(),
            is_correct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizContent {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub question_type: QuestionType,
    #[serde(default)]
    pub answers: Vec<QuizAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuizContent {
    /// Indices of answers flagged correct.
    #[must_use]
    pub fn correct_indices(&self) -> BTreeSet<usize> {
        self.answers
            .iter()
            .enumerate()
            .filter(|(_, answer)| answer.is_correct)
            .map(|(index, _)| index)
            .collect()
    }
}

impl Default for QuizContent {
    fn default() -> Self {
        Self {
            question: String::new(),
            question_type: QuestionType::Single,
            answers: vec![
                QuizAnswer::new("Answer 1", true),
                QuizAnswer::new("Answer 2", false),
            ],
            explanation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgrammingContent {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub starting_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencingItem {
    pub id: String,
    #[serde(default)]
    pub text: String,
    pub correct_position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencingContent {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub items: Vec<SequencingItem>,
}

impl SequencingContent {
    /// Item ids in their authored correct order.
    #[must_use]
    pub fn correct_order(&self) -> Vec<&str> {
        let mut items: Vec<&SequencingItem> = self.items.iter().collect();
        items.sort_by_key(|item| item.correct_position);
        items.into_iter().map(|item| item.id.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blank {
    pub id: String,
    /// Character offset of the gap inside `text_with_blanks`.
    #[serde(default)]
    pub position: u32,
    pub correct_option_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlankOption {
    pub id: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlanksContent {
    #[serde(default)]
    pub text_with_blanks: String,
    #[serde(default)]
    pub blanks: Vec<Blank>,
    #[serde(default)]
    pub options: Vec<BlankOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenContent {
    #[serde(default)]
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_answer: Option<String>,
    #[serde(default)]
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairItem {
    pub id: String,
    #[serde(default)]
    pub left: String,
    #[serde(default)]
    pub right: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingContent {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub pairs: Vec<PairItem>,
}

/// Variant payload of a tile.
#[derive(Debug, Clone, PartialEq)]
pub enum TileContent {
    Text(TextContent),
    Image(ImageContent),
    Interactive(InteractiveContent),
    Visualization(VisualizationContent),
    Quiz(QuizContent),
    Programming(ProgrammingContent),
    Sequencing(SequencingContent),
    Blanks(BlanksContent),
    Open(OpenContent),
    Pairing(PairingContent),
}

impl TileContent {
    /// Starting content for a freshly placed tile.
    #[must_use]
    pub fn default_for(tile_type: TileType) -> Self {
        match tile_type {
            TileType::Text => Self::Text(TextContent::default()),
            TileType::Image => Self::Image(ImageContent::default()),
            TileType::Interactive => Self::Interactive(InteractiveContent::default()),
            TileType::Visualization => Self::Visualization(VisualizationContent::default()),
            TileType::Quiz => Self::Quiz(QuizContent::default()),
            TileType::Programming => Self::Programming(ProgrammingContent::default()),
            TileType::Sequencing => Self::Sequencing(SequencingContent::default()),
            TileType::Blanks => Self::Blanks(BlanksContent::default()),
            TileType::Open => Self::Open(OpenContent::default()),
            TileType::Pairing => Self::Pairing(PairingContent::default()),
        }
    }

    #[must_use]
    pub const fn tile_type(&self) -> TileType {
        match self {
            Self::Text(_) => TileType::Text,
            Self::Image(_) => TileType::Image,
            Self::Interactive(_) => TileType::Interactive,
            Self::Visualization(_) => TileType::Visualization,
            Self::Quiz(_) => TileType::Quiz,
            Self::Programming(_) => TileType::Programming,
            Self::Sequencing(_) => TileType::Sequencing,
            Self::Blanks(_) => TileType::Blanks,
            Self::Open(_) => TileType::Open,
            Self::Pairing(_) => TileType::Pairing,
        }
    }

    /// Decode the `content` object of a tile declared as `tile_type`.
    pub fn from_value(tile_type: TileType, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match tile_type {
            TileType::Text => Self::Text(serde_json::from_value(value)?),
            TileType::Image => Self::Image(serde_json::from_value(value)?),
            TileType::Interactive => Self::Interactive(serde_json::from_value(value)?),
            TileType::Visualization => Self::Visualization(serde_json::from_value(value)?),
            TileType::Quiz => Self::Quiz(serde_json::from_value(value)?),
            TileType::Programming => Self::Programming(serde_json::from_value(value)?),
            TileType::Sequencing => Self::Sequencing(serde_json::from_value(value)?),
            TileType::Blanks => Self::Blanks(serde_json::from_value(value)?),
            TileType::Open => Self::Open(serde_json::from_value(value)?),
            TileType::Pairing => Self::Pairing(serde_json::from_value(value)?),
        })
    }

    /// Encode as the `content` object of the wire form.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Text(c) => serde_json::to_value(c),
            Self::Image(c) => serde_json::to_value(c),
            Self::Interactive(c) => serde_json::to_value(c),
            Self::Visualization(c) => serde_json::to_value(c),
            Self::Quiz(c) => serde_json::to_value(c),
            Self::Programming(c) => serde_json::to_value(c),
            Self::Sequencing(c) => serde_json::to_value(c),
            Self::Blanks(c) => serde_json::to_value(c),
            Self::Open(c) => serde_json::to_value(c),
            Self::Pairing(c) => serde_json::to_value(c),
        }
    }

    /// Check variant-specific authoring rules.
    pub fn validate(&self, tile_id: &TileId) -> Result<(), TileValidationError> {
        match self {
            Self::Quiz(quiz) => validate_quiz(tile_id, quiz),
            Self::Blanks(blanks) => validate_blanks(tile_id, blanks),
            Self::Pairing(pairing) => {
                first_duplicate(pairing.pairs.iter().map(|pair| pair.id.as_str())).map_or(
                    Ok(()),
                    |pair_id| {
                        Err(TileValidationError::DuplicatePairId {
                            tile_id: tile_id.clone(),
                            pair_id,
                        })
                    },
                )
            }
            Self::Sequencing(sequencing) => validate_sequencing(tile_id, sequencing),
            Self::Image(image) => validate_image(tile_id, image),
            Self::Text(_)
            | Self::Interactive(_)
            | Self::Visualization(_)
            | Self::Programming(_)
            | Self::Open(_) => Ok(()),
        }
    }
}

fn validate_quiz(tile_id: &TileId, quiz: &QuizContent) -> Result<(), TileValidationError> {
    if quiz.answers.is_empty() {
        return Err(TileValidationError::QuizWithoutAnswers {
            tile_id: tile_id.clone(),
        });
    }
    let correct = quiz.answers.iter().filter(|a| a.is_correct).count();
    if correct == 0 {
        return Err(TileValidationError::QuizWithoutCorrectAnswer {
            tile_id: tile_id.clone(),
        });
    }
    if quiz.question_type == QuestionType::Single && correct != 1 {
        return Err(TileValidationError::SingleChoiceCorrectCount {
            tile_id: tile_id.clone(),
            count: correct,
        });
    }
    Ok(())
}

fn validate_image(tile_id: &TileId, image: &ImageContent) -> Result<(), TileValidationError> {
    // JSON has no encoding for NaN or infinity.
    if !image.scale.is_finite() || image.scale <= 0.0 {
        return Err(TileValidationError::InvalidImageScale {
            tile_id: tile_id.clone(),
        });
    }
    Ok(())
}

fn validate_blanks(tile_id: &TileId, blanks: &BlanksContent) -> Result<(), TileValidationError> {
    if let Some(blank_id) = first_duplicate(blanks.blanks.iter().map(|b| b.id.as_str())) {
        return Err(TileValidationError::DuplicateBlankId {
            tile_id: tile_id.clone(),
            blank_id,
        });
    }
    if let Some(option_id) = first_duplicate(blanks.options.iter().map(|o| o.id.as_str())) {
        return Err(TileValidationError::DuplicateOptionId {
            tile_id: tile_id.clone(),
            option_id,
        });
    }
    let option_ids: BTreeSet<&str> = blanks.options.iter().map(|o| o.id.as_str()).collect();
    for blank in &blanks.blanks {
        if !option_ids.contains(blank.correct_option_id.as_str()) {
            return Err(TileValidationError::UnknownCorrectOption {
                tile_id: tile_id.clone(),
                blank_id: blank.id.clone(),
                option_id: blank.correct_option_id.clone(),
            });
        }
    }
    Ok(())
}

fn validate_sequencing(
    tile_id: &TileId,
    sequencing: &SequencingContent,
) -> Result<(), TileValidationError> {
    if let Some(item_id) = first_duplicate(sequencing.items.iter().map(|i| i.id.as_str())) {
        return Err(TileValidationError::DuplicateSequencingItem {
            tile_id: tile_id.clone(),
            item_id,
        });
    }
    let positions: BTreeSet<u32> = sequencing
        .items
        .iter()
        .map(|item| item.correct_position)
        .collect();
    let expected = u32::try_from(sequencing.items.len()).unwrap_or(u32::MAX);
    let is_permutation =
        positions.len() == sequencing.items.len() && positions.iter().all(|p| *p < expected);
    if !is_permutation {
        return Err(TileValidationError::InvalidSequencePositions {
            tile_id: tile_id.clone(),
        });
    }
    Ok(())
}

fn first_duplicate<'a>(ids: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Some(id.to_string());
        }
    }
    None
}

// =========================================================================
// Tile
// =========================================================================

/// A positioned content unit on a lesson page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "TileRecord")]
pub struct Tile {
    pub id: TileId,
    /// Pixel origin; kept equal to the grid position's pixel rect.
    pub position: PixelPoint,
    pub size: PixelSize,
    pub grid_position: GridPosition,
    /// Zero-based page index.
    pub page: u32,
    pub z_index: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Incremented on every edit, starting at 1.
    pub version: u32,
    pub content: TileContent,
}

impl Tile {
    /// Place new content on a grid block, deriving pixel geometry from `metrics`.
    #[must_use]
    pub fn placed(
        id: TileId,
        content: TileContent,
        grid_position: GridPosition,
        page: u32,
        metrics: &GridMetrics,
        now: Timestamp,
    ) -> Self {
        let rect = metrics.to_pixels(grid_position);
        Self {
            id,
            position: rect.origin(),
            size: rect.size(),
            grid_position,
            page,
            z_index: 0,
            created_at: now,
            updated_at: now,
            version: 1,
            content,
        }
    }

    #[must_use]
    pub const fn tile_type(&self) -> TileType {
        self.content.tile_type()
    }

    #[must_use]
    pub const fn rect(&self) -> PixelRect {
        PixelRect::from_parts(self.position, self.size)
    }

    /// Move to a grid block and recompute pixel geometry.
    pub fn set_grid_position(&mut self, grid_position: GridPosition, metrics: &GridMetrics) {
        let rect = metrics.to_pixels(grid_position);
        self.grid_position = grid_position;
        self.position = rect.origin();
        self.size = rect.size();
    }

    /// Whether the stored pixel rect matches the grid position under `metrics`.
    #[must_use]
    pub fn is_consistent_with(&self, metrics: &GridMetrics) -> bool {
        metrics.to_pixels(self.grid_position) == self.rect()
    }

    /// Record an edit at `now`.
    pub fn touch(&mut self, now: Timestamp) {
        self.version = self.version.saturating_add(1);
        self.updated_at = now.max(self.created_at);
    }

    /// Check placement fields and variant content.
    pub fn validate(&self) -> Result<(), TileValidationError> {
        if self.id.is_empty() {
            return Err(TileValidationError::EmptyId);
        }
        if self.size.is_empty() {
            return Err(TileValidationError::EmptySize {
                tile_id: self.id.clone(),
            });
        }
        if self.grid_position.col_span == 0 || self.grid_position.row_span == 0 {
            return Err(TileValidationError::ZeroSpan {
                tile_id: self.id.clone(),
            });
        }
        if self.version == 0 {
            return Err(TileValidationError::ZeroVersion {
                tile_id: self.id.clone(),
            });
        }
        if self.updated_at < self.created_at {
            return Err(TileValidationError::TimestampOrder {
                tile_id: self.id.clone(),
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        self.content.validate(&self.id)
    }
}

/// Flat wire form of a tile.
#[derive(Serialize, Deserialize)]
struct TileRecord {
    id: TileId,
    #[serde(rename = "type")]
    tile_type: TileType,
    #[serde(default)]
    position: PixelPoint,
    #[serde(default)]
    size: PixelSize,
    #[serde(rename = "gridPosition")]
    grid_position: GridPosition,
    #[serde(default)]
    page: u32,
    #[serde(default)]
    z_index: i32,
    #[serde(default)]
    created_at: Timestamp,
    #[serde(default)]
    updated_at: Timestamp,
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    content: Value,
}

fn default_version() -> u32 {
    1
}

impl TryFrom<TileRecord> for Tile {
    type Error = TileDecodeError;

    fn try_from(record: TileRecord) -> Result<Self, Self::Error> {
        let value = if record.content.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            record.content
        };
        let content =
            TileContent::from_value(record.tile_type, value).map_err(|err| TileDecodeError {
                tile_id: record.id.clone(),
                tile_type: record.tile_type,
                reason: err.to_string(),
            })?;
        Ok(Self {
            id: record.id,
            position: record.position,
            size: record.size,
            grid_position: record.grid_position,
            page: record.page,
            z_index: record.z_index,
            created_at: record.created_at,
            updated_at: record.updated_at,
            version: record.version,
            content,
        })
    }
}

impl Serialize for Tile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let TileContent::Image(image) = &self.content {
            validate_image(&self.id, image).map_err(S::Error::custom)?;
        }
        let content = self.content.to_value().map_err(S::Error::custom)?;
        TileRecord {
            id: self.id.clone(),
            tile_type: self.tile_type(),
            position: self.position,
            size: self.size,
            grid_position: self.grid_position,
            page: self.page,
            z_index: self.z_index,
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
            content,
        }
        .serialize(serializer)
    }
}

// =========================================================================
// Errors
// =========================================================================

/// A tile's `content` does not decode as its declared `type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileDecodeError {
    pub tile_id: TileId,
    pub tile_type: TileType,
    pub reason: String,
}

impl fmt::Display for TileDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tile {} has content that is not valid {} content: {}",
            self.tile_id, self.tile_type, self.reason
        )
    }
}

impl std::error::Error for TileDecodeError {}

/// Structural and authoring errors for a single tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileValidationError {
    EmptyId,
    EmptySize {
        tile_id: TileId,
    },
    ZeroSpan {
        tile_id: TileId,
    },
    ZeroVersion {
        tile_id: TileId,
    },
    TimestampOrder {
        tile_id: TileId,
        created_at: Timestamp,
        updated_at: Timestamp,
    },
    QuizWithoutAnswers {
        tile_id: TileId,
    },
    QuizWithoutCorrectAnswer {
        tile_id: TileId,
    },
    SingleChoiceCorrectCount {
        tile_id: TileId,
        count: usize,
    },
    DuplicateBlankId {
        tile_id: TileId,
        blank_id: String,
    },
    DuplicateOptionId {
        tile_id: TileId,
        option_id: String,
    },
    UnknownCorrectOption {
        tile_id: TileId,
        blank_id: String,
        option_id: String,
    },
    DuplicatePairId {
        tile_id: TileId,
        pair_id: String,
    },
    DuplicateSequencingItem {
        tile_id: TileId,
        item_id: String,
    },
    InvalidSequencePositions {
        tile_id: TileId,
    },
    /// Image scale must be a finite number above zero.
    InvalidImageScale {
        tile_id: TileId,
    },
}

impl fmt::Display for TileValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "tile id must not be empty"),
            Self::EmptySize { tile_id } => write!(f, "tile {tile_id} has zero width or height"),
            Self::ZeroSpan { tile_id } => {
                write!(f, "tile {tile_id} grid spans must be >= 1")
            }
            Self::ZeroVersion { tile_id } => write!(f, "tile {tile_id} version must be >= 1"),
            Self::TimestampOrder {
                tile_id,
                created_at,
                updated_at,
            } => write!(
                f,
                "tile {tile_id} updated_at {} precedes created_at {}",
                updated_at.as_millis(),
                created_at.as_millis()
            ),
            Self::QuizWithoutAnswers { tile_id } => write!(f, "quiz {tile_id} has no answers"),
            Self::QuizWithoutCorrectAnswer { tile_id } => {
                write!(f, "quiz {tile_id} has no answer marked correct")
            }
            Self::SingleChoiceCorrectCount { tile_id, count } => write!(
                f,
                "single-choice quiz {tile_id} must have exactly one correct answer (got {count})"
            ),
            Self::DuplicateBlankId { tile_id, blank_id } => {
                write!(f, "blanks tile {tile_id} repeats blank id {blank_id:?}")
            }
            Self::DuplicateOptionId { tile_id, option_id } => {
                write!(f, "blanks tile {tile_id} repeats option id {option_id:?}")
            }
            Self::UnknownCorrectOption {
                tile_id,
                blank_id,
                option_id,
            } => write!(
                f,
                "blank {blank_id:?} in tile {tile_id} expects unknown option {option_id:?}"
            ),
            Self::DuplicatePairId { tile_id, pair_id } => {
                write!(f, "pairing tile {tile_id} repeats pair id {pair_id:?}")
            }
            Self::DuplicateSequencingItem { tile_id, item_id } => {
                write!(f, "sequencing tile {tile_id} repeats item id {item_id:?}")
            }
            Self::InvalidSequencePositions { tile_id } => write!(
                f,
                "sequencing tile {tile_id} correct positions are not a permutation of 0..n"
            ),
            Self::InvalidImageScale { tile_id } => {
                write!(f, "image tile {tile_id} scale must be finite and positive")
            }
        }
    }
}

impl std::error::Error for TileValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metrics() -> GridMetrics {
        GridMetrics::new(40, 8, 12, 8)
    }

    fn quiz_tile(content: QuizContent) -> Tile {
        Tile::placed(
            TileId::new("quiz-1"),
            TileContent::Quiz(content),
            GridPosition::new(0, 0, 2, 2),
            0,
            &metrics(),
            Timestamp::from_millis(10),
        )
    }

    #[test]
    fn placed_tile_is_consistent() {
        let tile = quiz_tile(QuizContent::default());
        assert!(tile.is_consistent_with(&metrics()));
        assert_eq!(tile.rect(), PixelRect::new(0, 0, 88, 88));
        assert_eq!(tile.version, 1);
        assert!(tile.validate().is_ok());
    }

    #[test]
    fn every_default_content_validates() {
        for tile_type in TileType::ALL {
            let tile = Tile::placed(
                TileId::new(format!("{tile_type}-1")),
                TileContent::default_for(tile_type),
                GridPosition::cell(0, 0),
                0,
                &metrics(),
                Timestamp::from_millis(1),
            );
            assert_eq!(tile.tile_type(), tile_type);
            assert!(tile.validate().is_ok(), "{tile_type} default invalid");
        }
    }

    #[test]
    fn decode_wire_tile() {
        let value = json!({
            "id": "t1",
            "type": "blanks",
            "position": { "x": 48, "y": 0 },
            "size": { "width": 40, "height": 40 },
            "gridPosition": { "col": 1, "row": 0, "colSpan": 1, "rowSpan": 1 },
            "page": 2,
            "z_index": 3,
            "created_at": 5,
            "updated_at": 6,
            "version": 2,
            "content": {
                "textWithBlanks": "The sky is ___",
                "blanks": [{ "id": "b1", "position": 11, "correctOptionId": "o1" }],
                "options": [{ "id": "o1", "text": "blue" }, { "id": "o2", "text": "green" }]
            }
        });
        let tile: Tile = serde_json::from_value(value).unwrap();
        assert_eq!(tile.tile_type(), TileType::Blanks);
        assert_eq!(tile.page, 2);
        assert_eq!(tile.z_index, 3);
        let TileContent::Blanks(blanks) = &tile.content else {
            panic!("expected blanks content");
        };
        assert_eq!(blanks.blanks[0].correct_option_id, "o1");
        assert!(tile.validate().is_ok());
    }

    #[test]
    fn encode_uses_wire_names() {
        let tile = quiz_tile(QuizContent::default());
        let value = serde_json::to_value(&tile).unwrap();
        assert_eq!(value["type"], "quiz");
        assert_eq!(value["gridPosition"]["colSpan"], 2);
        assert_eq!(value["z_index"], 0);
        assert_eq!(value["content"]["questionType"], "single");
        assert_eq!(value["content"]["answers"][0]["isCorrect"], true);
    }

    #[test]
    fn content_mismatch_is_rejected() {
        let value = json!({
            "id": "t1",
            "type": "sequencing",
            "gridPosition": { "col": 0, "row": 0, "colSpan": 1, "rowSpan": 1 },
            "content": { "items": "not a list" }
        });
        let err = serde_json::from_value::<Tile>(value).unwrap_err();
        assert!(err.to_string().contains("not valid sequencing content"));
    }

    #[test]
    fn missing_content_uses_defaults() {
        let value = json!({
            "id": "t1",
            "type": "text",
            "gridPosition": { "col": 0, "row": 0, "colSpan": 1, "rowSpan": 1 }
        });
        let tile: Tile = serde_json::from_value(value).unwrap();
        assert_eq!(tile.content, TileContent::Text(TextContent::default()));
        assert_eq!(tile.version, 1);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let value = json!({
            "id": "t1",
            "type": "hologram",
            "gridPosition": { "col": 0, "row": 0, "colSpan": 1, "rowSpan": 1 }
        });
        assert!(serde_json::from_value::<Tile>(value).is_err());
    }

    #[test]
    fn single_choice_quiz_needs_one_correct() {
        let tile = quiz_tile(QuizContent {
            answers: vec![QuizAnswer::new("a", true), QuizAnswer::new("b", true)],
            ..QuizContent::default()
        });
        assert_eq!(
            tile.validate(),
            Err(TileValidationError::SingleChoiceCorrectCount {
                tile_id: TileId::new("quiz-1"),
                count: 2,
            })
        );

        let multiple = quiz_tile(QuizContent {
            question_type: QuestionType::Multiple,
            answers: vec![QuizAnswer::new("a", true), QuizAnswer::new("b", true)],
            ..QuizContent::default()
        });
        assert!(multiple.validate().is_ok());
    }

    #[test]
    fn quiz_without_correct_answer_is_invalid() {
        let tile = quiz_tile(QuizContent {
            answers: vec![QuizAnswer::new("a", false)],
            ..QuizContent::default()
        });
        assert!(matches!(
            tile.validate(),
            Err(TileValidationError::QuizWithoutCorrectAnswer { .. })
        ));
    }

    #[test]
    fn blanks_must_reference_known_options() {
        let content = BlanksContent {
            text_with_blanks: "x".into(),
            blanks: vec![Blank {
                id: "b1".into(),
                position: 0,
                correct_option_id: "missing".into(),
            }],
            options: vec![BlankOption {
                id: "o1".into(),
                text: "one".into(),
            }],
        };
        let err = TileContent::Blanks(content)
            .validate(&TileId::new("t"))
            .unwrap_err();
        assert!(matches!(err, TileValidationError::UnknownCorrectOption { .. }));
    }

    #[test]
    fn sequencing_positions_must_be_permutation() {
        let item = |id: &str, pos| SequencingItem {
            id: id.into(),
            text: String::new(),
            correct_position: pos,
        };
        let ok = SequencingContent {
            question: String::new(),
            items: vec![item("a", 1), item("b", 0)],
        };
        assert!(TileContent::Sequencing(ok.clone()).validate(&TileId::new("s")).is_ok());
        assert_eq!(ok.correct_order(), vec!["b", "a"]);

        let gap = SequencingContent {
            question: String::new(),
            items: vec![item("a", 0), item("b", 2)],
        };
        assert!(matches!(
            TileContent::Sequencing(gap).validate(&TileId::new("s")),
            Err(TileValidationError::InvalidSequencePositions { .. })
        ));
    }

    #[test]
    fn duplicate_pair_ids_are_invalid() {
        let pair = |id: &str| PairItem {
            id: id.into(),
            left: "l".into(),
            right: "r".into(),
        };
        let content = PairingContent {
            question: String::new(),
            pairs: vec![pair("p1"), pair("p1")],
        };
        assert_eq!(
            TileContent::Pairing(content).validate(&TileId::new("p")),
            Err(TileValidationError::DuplicatePairId {
                tile_id: TileId::new("p"),
                pair_id: "p1".into(),
            })
        );
    }

    #[test]
    fn touch_bumps_version_and_time() {
        let mut tile = quiz_tile(QuizContent::default());
        tile.touch(Timestamp::from_millis(50));
        assert_eq!(tile.version, 2);
        assert_eq!(tile.updated_at, Timestamp::from_millis(50));
        tile.touch(Timestamp::from_millis(1));
        assert_eq!(tile.updated_at, Timestamp::from_millis(10));
    }

    #[test]
    fn validation_error_display() {
        let err = TileValidationError::ZeroSpan {
            tile_id: TileId::new("t9"),
        };
        assert_eq!(err.to_string(), "tile t9 grid spans must be >= 1");
    }

    fn image_tile(scale: f64) -> Tile {
        Tile::placed(
            TileId::new("img"),
            TileContent::Image(ImageContent {
                scale,
                ..ImageContent::default()
            }),
            GridPosition::new(0, 0, 2, 2),
            0,
            &metrics(),
            Timestamp::from_millis(10),
        )
    }

    #[test]
    fn image_scale_must_be_finite_and_positive() {
        assert!(image_tile(1.5).validate().is_ok());
        for scale in [f64::NAN, f64::INFINITY, 0.0, -2.0] {
            assert_eq!(
                image_tile(scale).validate(),
                Err(TileValidationError::InvalidImageScale {
                    tile_id: TileId::new("img"),
                }),
                "scale {scale}"
            );
        }
    }

    #[test]
    fn non_finite_scale_fails_to_encode() {
        let err = serde_json::to_string(&image_tile(f64::NAN)).unwrap_err();
        assert!(err.to_string().contains("scale"), "{err}");

        let json = serde_json::to_string(&image_tile(0.5)).unwrap();
        let back: Tile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, image_tile(0.5));
    }
}
