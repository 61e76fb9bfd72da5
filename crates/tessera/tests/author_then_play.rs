//! An author builds a lesson in the editor, saves it, and a student plays it.

use std::fs;

use tessera::core::{OpenContent, QuizAnswer, QuizContent, QuestionType};
use tessera::prelude::*;
use tessera::{DirectoryLessonSource, EditorState, PixelSize, reduce, save_lesson_json};

#[test]
fn authored_lesson_plays_back() {
    let config = TesseraConfig::default();
    let mut doc = LessonDocument::create(LessonId::new("capitals"), &config).unwrap();
    let metrics = doc.lesson().canvas_settings.metrics();
    let mut editor = EditorState::new(PixelSize {
        width: 1200,
        height: 800,
    });

    let quiz = doc
        .add_tile(TileType::Quiz, GridPosition::new(0, 0, 4, 2), 0)
        .unwrap();
    doc.update_tile(
        &quiz,
        TilePatch::content(TileContent::Quiz(QuizContent {
            question: "Capitals on the Seine".into(),
            question_type: QuestionType::Multiple,
            answers: vec![
                QuizAnswer::new("Paris", true),
                QuizAnswer::new("Rouen", true),
                QuizAnswer::new("Lyon", false),
            ],
            explanation: None,
        })),
    )
    .unwrap();

    let page = doc.add_page().unwrap();
    let open = doc
        .add_tile(TileType::Open, GridPosition::new(2, 2, 4, 2), page)
        .unwrap();
    doc.update_tile(
        &open,
        TilePatch::content(TileContent::Open(OpenContent {
            question: "Capital of France?".into(),
            expected_answer: Some("Paris".into()),
            case_sensitive: false,
        })),
    )
    .unwrap();

    // Drag the quiz one cell right and one cell down.
    let rect = doc.tile(&quiz).unwrap().rect();
    let grab = PixelPoint::new(rect.x + 10, rect.y + 10);
    editor = editor.apply(&EditorAction::SelectTile {
        tile_id: quiz.clone(),
    });
    let dragging = reduce(
        &editor,
        &EditorAction::StartDrag {
            tile_id: quiz.clone(),
            pointer: grab,
            tile_rect: rect,
        },
    );
    assert_eq!(dragging.to, EditorMode::Dragging);
    editor = dragging.state;

    let pitch = i32::try_from(metrics.pitch()).unwrap();
    let release = PixelPoint::new(grab.x + pitch, grab.y + pitch);
    assert!(doc.commit_interaction(editor.interaction(), release).unwrap());
    editor = editor.apply(&EditorAction::EndInteraction);
    assert_eq!(editor.mode(), EditorMode::Editing);
    assert_eq!(
        doc.tile(&quiz).unwrap().grid_position,
        GridPosition::new(1, 1, 4, 2)
    );
    assert!(doc.is_dirty());

    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("capitals.json"),
        save_lesson_json(doc.lesson()).unwrap(),
    )
    .unwrap();
    doc.mark_saved();
    assert!(!doc.is_dirty());

    let lesson = DirectoryLessonSource::new(dir.path())
        .lesson_content(&LessonId::new("capitals"))
        .unwrap();
    assert_eq!(lesson.total_pages, 2);

    let read_only = PlaybackSession::new(
        lesson.clone(),
        PlaybackMode::ReadOnly,
        RuntimePolicyConfig::default(),
    )
    .unwrap();
    assert_eq!(read_only.current_layout().len(), 1);

    let mut session = PlaybackSession::new(
        lesson,
        PlaybackMode::Interactive,
        RuntimePolicyConfig {
            max_attempts: Some(2),
            ..RuntimePolicyConfig::default()
        },
    )
    .unwrap();

    let first = session.check(&quiz, &TileResponse::quiz([0])).unwrap();
    assert_eq!(first.evaluation, Evaluation::Error);
    assert_eq!(first.attempts_remaining, Some(1));
    let second = session.check(&quiz, &TileResponse::quiz([1, 0])).unwrap();
    assert_eq!(second.evaluation, Evaluation::Success);
    assert!(!second.locked);

    assert!(session.next_page());
    let layout = session.current_layout();
    assert_eq!(layout.len(), 1);
    assert_eq!(layout[0].tile.id, open);

    let answer = session
        .check(&open, &TileResponse::open("  paris "))
        .unwrap();
    assert!(answer.evaluation.is_success());
    assert!(session.summary().is_complete());
}

#[test]
fn top_level_error_wraps_each_layer() {
    let mut doc =
        LessonDocument::create(LessonId::new("errors"), &TesseraConfig::default()).unwrap();
    let document_err: Error = doc
        .add_tile(TileType::Text, GridPosition::new(0, 0, 1, 1), 5)
        .unwrap_err()
        .into();
    assert!(matches!(document_err, Error::Document(_)));

    let text = doc
        .add_tile(TileType::Text, GridPosition::new(0, 0, 2, 1), 0)
        .unwrap();
    let mut session = PlaybackSession::new(
        doc.into_lesson(),
        PlaybackMode::Interactive,
        RuntimePolicyConfig::default(),
    )
    .unwrap();
    let session_err: Error = session
        .check(&text, &TileResponse::open("hello"))
        .unwrap_err()
        .into();
    assert!(matches!(session_err, Error::Session(_)));
    assert!(std::error::Error::source(&session_err).is_some());
}
