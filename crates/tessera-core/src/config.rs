#![forbid(unsafe_code)]

//! Tunable defaults for the editor and playback runtime.
//!
//! Captures every knob as a single [`TesseraConfig`] that can be loaded from
//! TOML or JSON at startup. Missing sections and fields fall back to their
//! defaults, so partial files are fine.
//!
//! # Loading
//!
//! ```toml
//! # tessera.toml
//! [grid]
//! columns = 16
//! cell_size = 64
//!
//! [runtime]
//! max_attempts = 3
//! ```
//!
//! ```rust,ignore
//! let config = TesseraConfig::from_toml_file("tessera.toml")?.validated()?;
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geometry::DEFAULT_GRID_GAP;
use crate::lesson::CanvasSettings;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseraConfig {
    /// Canvas settings applied to newly created lessons.
    pub grid: GridPolicyConfig,
    /// Editor interaction parameters.
    pub editor: EditorPolicyConfig,
    /// Student playback parameters.
    pub runtime: RuntimePolicyConfig,
}

impl TesseraConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.grid.columns == 0 {
            errors.push("grid.columns must be > 0".into());
        }
        if self.grid.rows == 0 {
            errors.push("grid.rows must be > 0".into());
        }
        if self.grid.cell_size == 0 {
            errors.push("grid.cell_size must be > 0".into());
        }

        if self.editor.min_col_span == 0 || self.editor.min_row_span == 0 {
            errors.push("editor.min_col_span and editor.min_row_span must be > 0".into());
        }
        if self.editor.default_col_span < self.editor.min_col_span
            || self.editor.default_row_span < self.editor.min_row_span
        {
            errors.push(format!(
                "editor default span {}x{} is below the minimum {}x{}",
                self.editor.default_col_span,
                self.editor.default_row_span,
                self.editor.min_col_span,
                self.editor.min_row_span
            ));
        }
        if self.editor.default_col_span > self.grid.columns
            || self.editor.default_row_span > self.grid.rows
        {
            errors.push(format!(
                "editor default span {}x{} does not fit a {}x{} grid",
                self.editor.default_col_span,
                self.editor.default_row_span,
                self.grid.columns,
                self.grid.rows
            ));
        }
        if self.editor.history_depth == 0 {
            errors.push("editor.history_depth must be > 0".into());
        }

        if self.runtime.max_attempts == Some(0) {
            errors.push("runtime.max_attempts must be > 0 when set".into());
        }

        errors
    }

    /// Return `self` if [`validate`](Self::validate) finds nothing.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridPolicyConfig {
    pub columns: u32,
    pub rows: u32,
    pub cell_size: u32,
    pub gap: u32,
    pub snap_to_grid: bool,
}

impl Default for GridPolicyConfig {
    fn default() -> Self {
        let canvas = CanvasSettings::default();
        Self {
            columns: canvas.grid_columns,
            rows: canvas.grid_rows,
            cell_size: canvas.cell_size,
            gap: DEFAULT_GRID_GAP,
            snap_to_grid: canvas.snap_to_grid,
        }
    }
}

impl GridPolicyConfig {
    #[must_use]
    pub fn to_canvas_settings(&self) -> CanvasSettings {
        CanvasSettings {
            grid_columns: self.columns,
            grid_rows: self.rows,
            cell_size: self.cell_size,
            gap: self.gap,
            snap_to_grid: self.snap_to_grid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorPolicyConfig {
    /// Pointer travel in pixels before a press on a tile becomes a drag.
    pub drag_threshold: u32,
    /// Distance in pixels from a tile edge that still grabs a resize handle.
    pub handle_tolerance: u32,
    pub min_col_span: u32,
    pub min_row_span: u32,
    /// Span of newly added tiles.
    pub default_col_span: u32,
    pub default_row_span: u32,
    /// Undo snapshots retained.
    pub history_depth: usize,
}

impl Default for EditorPolicyConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 3,
            handle_tolerance: 6,
            min_col_span: 1,
            min_row_span: 1,
            default_col_span: 2,
            default_row_span: 2,
            history_depth: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimePolicyConfig {
    /// Checks allowed per tile before it locks; `None` is unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// Strip surrounding whitespace from open answers before comparing.
    pub trim_open_answers: bool,
}

impl Default for RuntimePolicyConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            trim_open_answers: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
