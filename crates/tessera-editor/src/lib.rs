#![forbid(unsafe_code)]

//! Editor: selection and gesture state machine, drag/resize geometry, and the
//! editable lesson document.
//!
//! # Role in Tessera
//! `tessera-editor` is the authoring side. A UI feeds pointer and keyboard
//! intents through [`reduce`] to track what the author is doing, previews
//! gestures with the [`interaction`] helpers, and writes finished edits into
//! a [`LessonDocument`], which keeps the lesson valid and undoable.
//!
//! # Example
//! ```
//! use tessera_core::{GridPosition, LessonId, PixelPoint, TesseraConfig, TileType};
//! use tessera_editor::{EditorAction, EditorMode, EditorState, LessonDocument};
//!
//! let mut doc = LessonDocument::create(LessonId::new("intro"), &TesseraConfig::default())?;
//! let id = doc.add_tile(TileType::Quiz, GridPosition::new(0, 0, 3, 2), 0)?;
//!
//! let state = EditorState::default()
//!     .apply(&EditorAction::SelectTile { tile_id: id.clone() })
//!     .apply(&EditorAction::StartDrag {
//!         tile_id: id.clone(),
//!         pointer: PixelPoint::new(10, 10),
//!         tile_rect: doc.tile(&id).map(|t| t.rect()).unwrap_or_default(),
//!     });
//! assert_eq!(state.mode(), EditorMode::Dragging);
//!
//! doc.commit_interaction(state.interaction(), PixelPoint::new(100, 10))?;
//! let state = state.apply(&EditorAction::EndInteraction);
//! assert_eq!(state.mode(), EditorMode::Editing);
//! # Ok::<(), tessera_editor::DocumentError>(())
//! ```

pub mod document;
pub mod history;
pub mod interaction;
pub mod state;

pub use document::{DocumentError, LessonDocument, TilePatch};
pub use history::SnapshotHistory;
pub use interaction::{
    InteractionLimits, drag_rect, exceeds_drag_threshold, handle_at, hit_test, image_offset,
    preview_rect, resize_rect, snap_rect,
};
pub use state::{
    EditorAction, EditorMode, EditorNoopReason, EditorState, EditorTransition, Interaction,
    ReduceOutcome, ResizeHandle, reduce,
};
