#![forbid(unsafe_code)]

//! Editor interaction state machine.
//!
//! The editor is single-selection: at most one tile is selected and at most
//! one drag, resize or image-pan interaction is live at a time.
//!
//! ```text
//! Idle -> Editing -> { TextEditing, ImageEditing, Dragging, Resizing }
//!   ^        ^                   |
//!   |        +--- StopEditing / EndInteraction (tile selected)
//!   +------------ EndInteraction (nothing selected) / ClearSelection
//! ```
//!
//! [`reduce`] is pure: it never mutates its input and returns the next state
//! together with an explicit no-op reason when an action does not apply.

use serde::{Deserialize, Serialize};
use tessera_core::{PixelPoint, PixelRect, PixelSize, TileId};

/// What the editor is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditorMode {
    #[default]
    Idle,
    Editing,
    TextEditing,
    ImageEditing,
    Dragging,
    Resizing,
}

impl EditorMode {
    /// Text or image content editing, during which the frame stays put.
    #[must_use]
    pub const fn is_content_editing(self) -> bool {
        matches!(self, Self::TextEditing | Self::ImageEditing)
    }
}

/// Grip a resize started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    Nw,
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::Nw,
        ResizeHandle::N,
        ResizeHandle::Ne,
        ResizeHandle::E,
        ResizeHandle::Se,
        ResizeHandle::S,
        ResizeHandle::Sw,
        ResizeHandle::W,
    ];

    #[must_use]
    pub const fn moves_left(self) -> bool {
        matches!(self, Self::Nw | Self::W | Self::Sw)
    }

    #[must_use]
    pub const fn moves_right(self) -> bool {
        matches!(self, Self::Ne | Self::E | Self::Se)
    }

    #[must_use]
    pub const fn moves_top(self) -> bool {
        matches!(self, Self::Nw | Self::N | Self::Ne)
    }

    #[must_use]
    pub const fn moves_bottom(self) -> bool {
        matches!(self, Self::Sw | Self::S | Self::Se)
    }
}

/// Payload of the live pointer interaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Interaction {
    #[default]
    None,
    Drag {
        tile_id: TileId,
        pointer_origin: PixelPoint,
        start_rect: PixelRect,
    },
    Resize {
        tile_id: TileId,
        handle: ResizeHandle,
        pointer_origin: PixelPoint,
        start_rect: PixelRect,
    },
    /// Panning an image inside its tile frame.
    ImageDrag {
        tile_id: TileId,
        pointer_origin: PixelPoint,
        start_offset: PixelPoint,
    },
}

impl Interaction {
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }

    #[must_use]
    pub fn tile_id(&self) -> Option<&TileId> {
        match self {
            Self::None => None,
            Self::Drag { tile_id, .. }
            | Self::Resize { tile_id, .. }
            | Self::ImageDrag { tile_id, .. } => Some(tile_id),
        }
    }

    /// Pointer position where the gesture started.
    #[must_use]
    pub const fn pointer_origin(&self) -> Option<PixelPoint> {
        match self {
            Self::None => None,
            Self::Drag { pointer_origin, .. }
            | Self::Resize { pointer_origin, .. }
            | Self::ImageDrag { pointer_origin, .. } => Some(*pointer_origin),
        }
    }
}

/// Snapshot of editor UI state.
///
/// Serialize-only: states are built through [`reduce`], never decoded, so
/// mode and interaction always agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    selected_tile_id: Option<TileId>,
    mode: EditorMode,
    interaction: Interaction,
    canvas_size: PixelSize,
    has_unsaved_changes: bool,
    show_grid: bool,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new(PixelSize::default())
    }
}

impl EditorState {
    /// Idle editor over a canvas of the given size, grid visible.
    #[must_use]
    pub const fn new(canvas_size: PixelSize) -> Self {
        Self {
            selected_tile_id: None,
            mode: EditorMode::Idle,
            interaction: Interaction::None,
            canvas_size,
            has_unsaved_changes: false,
            show_grid: true,
        }
    }

    #[must_use]
    pub fn selected_tile_id(&self) -> Option<&TileId> {
        self.selected_tile_id.as_ref()
    }

    #[must_use]
    pub const fn mode(&self) -> EditorMode {
        self.mode
    }

    #[must_use]
    pub const fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    #[must_use]
    pub const fn canvas_size(&self) -> PixelSize {
        self.canvas_size
    }

    #[must_use]
    pub const fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    #[must_use]
    pub const fn show_grid(&self) -> bool {
        self.show_grid
    }

    #[must_use]
    pub fn is_selected(&self, tile_id: &TileId) -> bool {
        self.selected_tile_id.as_ref() == Some(tile_id)
    }

    /// Reduce one action and return only the next state.
    #[must_use]
    pub fn apply(&self, action: &EditorAction) -> EditorState {
        reduce(self, action).state
    }

    fn settled_mode(&self) -> EditorMode {
        if self.selected_tile_id.is_some() {
            EditorMode::Editing
        } else {
            EditorMode::Idle
        }
    }
}

/// Discrete editor inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EditorAction {
    SelectTile {
        tile_id: TileId,
    },
    ClearSelection,
    StartTextEditing,
    StartImageEditing,
    StopEditing,
    StartDrag {
        tile_id: TileId,
        pointer: PixelPoint,
        tile_rect: PixelRect,
    },
    StartResize {
        tile_id: TileId,
        handle: ResizeHandle,
        pointer: PixelPoint,
        tile_rect: PixelRect,
    },
    StartImageDrag {
        pointer: PixelPoint,
        image_offset: PixelPoint,
    },
    EndInteraction,
    SetCanvasSize {
        size: PixelSize,
    },
    SetShowGrid {
        show: bool,
    },
    ToggleGrid,
    MarkDirty,
    MarkSaved,
    /// A tile was removed from the document.
    TileDeleted {
        tile_id: TileId,
    },
}

/// Why an action left the state unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorNoopReason {
    InteractionInProgress,
    NoActiveInteraction,
    NoSelection,
    AlreadySelected,
    ContentEditingActive,
    NotContentEditing,
    NotImageEditing,
    UnrelatedTile,
}

/// Whether the reducer changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReduceOutcome {
    Applied,
    Noop { reason: EditorNoopReason },
}

/// One reducer step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorTransition {
    pub from: EditorMode,
    pub to: EditorMode,
    pub outcome: ReduceOutcome,
    pub state: EditorState,
}

impl EditorTransition {
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self.outcome, ReduceOutcome::Noop { .. })
    }
}

/// Compute the state that follows `action`.
#[must_use]
pub fn reduce(state: &EditorState, action: &EditorAction) -> EditorTransition {
    let from = state.mode;
    let mut next = state.clone();
    let outcome = match step(&mut next, action) {
        Ok(()) => ReduceOutcome::Applied,
        Err(reason) => {
            next = state.clone();
            ReduceOutcome::Noop { reason }
        }
    };
    tracing::debug!(
        message = "editor.reduce",
        action = ?action,
        from = ?from,
        to = ?next.mode,
        outcome = ?outcome,
    );
    EditorTransition {
        from,
        to: next.mode,
        outcome,
        state: next,
    }
}

fn step(state: &mut EditorState, action: &EditorAction) -> Result<(), EditorNoopReason> {
    match action {
        EditorAction::SelectTile { tile_id } => {
            ensure_no_interaction(state)?;
            if state.is_selected(tile_id) {
                return Err(EditorNoopReason::AlreadySelected);
            }
            state.selected_tile_id = Some(tile_id.clone());
            state.mode = EditorMode::Editing;
        }
        EditorAction::ClearSelection => {
            ensure_no_interaction(state)?;
            if state.selected_tile_id.is_none() {
                return Err(EditorNoopReason::NoSelection);
            }
            state.selected_tile_id = None;
            state.mode = EditorMode::Idle;
        }
        EditorAction::StartTextEditing | EditorAction::StartImageEditing => {
            ensure_no_interaction(state)?;
            if state.selected_tile_id.is_none() {
                return Err(EditorNoopReason::NoSelection);
            }
            state.mode = if matches!(action, EditorAction::StartTextEditing) {
                EditorMode::TextEditing
            } else {
                EditorMode::ImageEditing
            };
        }
        EditorAction::StopEditing => {
            if !state.mode.is_content_editing() {
                return Err(EditorNoopReason::NotContentEditing);
            }
            state.interaction = Interaction::None;
            state.mode = state.settled_mode();
        }
        EditorAction::StartDrag {
            tile_id,
            pointer,
            tile_rect,
        } => {
            ensure_frame_interaction_allowed(state)?;
            state.interaction = Interaction::Drag {
                tile_id: tile_id.clone(),
                pointer_origin: *pointer,
                start_rect: *tile_rect,
            };
            state.mode = EditorMode::Dragging;
        }
        EditorAction::StartResize {
            tile_id,
            handle,
            pointer,
            tile_rect,
        } => {
            ensure_frame_interaction_allowed(state)?;
            state.interaction = Interaction::Resize {
                tile_id: tile_id.clone(),
                handle: *handle,
                pointer_origin: *pointer,
                start_rect: *tile_rect,
            };
            state.mode = EditorMode::Resizing;
        }
        EditorAction::StartImageDrag {
            pointer,
            image_offset,
        } => {
            ensure_no_interaction(state)?;
            if state.mode != EditorMode::ImageEditing {
                return Err(EditorNoopReason::NotImageEditing);
            }
            let tile_id = state
                .selected_tile_id
                .clone()
                .ok_or(EditorNoopReason::NoSelection)?;
            state.interaction = Interaction::ImageDrag {
                tile_id,
                pointer_origin: *pointer,
                start_offset: *image_offset,
            };
        }
        EditorAction::EndInteraction => {
            if !state.interaction.is_active() {
                return Err(EditorNoopReason::NoActiveInteraction);
            }
            let was_image_drag = matches!(state.interaction, Interaction::ImageDrag { .. });
            state.interaction = Interaction::None;
            state.mode = if was_image_drag {
                EditorMode::ImageEditing
            } else {
                state.settled_mode()
            };
        }
        EditorAction::SetCanvasSize { size } => state.canvas_size = *size,
        EditorAction::SetShowGrid { show } => state.show_grid = *show,
        EditorAction::ToggleGrid => state.show_grid = !state.show_grid,
        EditorAction::MarkDirty => state.has_unsaved_changes = true,
        EditorAction::MarkSaved => state.has_unsaved_changes = false,
        EditorAction::TileDeleted { tile_id } => {
            let interacting = state.interaction.tile_id() == Some(tile_id);
            let selected = state.is_selected(tile_id);
            if !interacting && !selected {
                return Err(EditorNoopReason::UnrelatedTile);
            }
            if interacting {
                state.interaction = Interaction::None;
            }
            if selected {
                state.selected_tile_id = None;
            }
            if !state.interaction.is_active() {
                state.mode = state.settled_mode();
            }
            state.has_unsaved_changes = true;
        }
    }
    Ok(())
}

fn ensure_no_interaction(state: &EditorState) -> Result<(), EditorNoopReason> {
    if state.interaction.is_active() {
        return Err(EditorNoopReason::InteractionInProgress);
    }
    Ok(())
}

fn ensure_frame_interaction_allowed(state: &EditorState) -> Result<(), EditorNoopReason> {
    ensure_no_interaction(state)?;
    if state.mode.is_content_editing() {
        return Err(EditorNoopReason::ContentEditingActive);
    }
    Ok(())
}
