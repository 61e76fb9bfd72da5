//! End-to-end decoding of a lesson document as the content service sends it.

use tessera_core::{
    Lesson, LessonLoadError, LessonValidationError, QuestionType, TileContent, TileId, TileType,
};

const LESSON_JSON: &str = r##"{
  "id": "lesson-42",
  "title": "Fractions",
  "total_pages": 2,
  "canvas_settings": { "grid_columns": 6, "grid_rows": 4, "cell_size": 40, "snap_to_grid": true },
  "tiles": [
    {
      "id": "intro",
      "type": "text",
      "position": { "x": 0, "y": 0 },
      "size": { "width": 280, "height": 40 },
      "gridPosition": { "col": 0, "row": 0, "colSpan": 6, "rowSpan": 1 },
      "page": 0,
      "z_index": 0,
      "created_at": 1000,
      "updated_at": 1000,
      "version": 1,
      "content": { "text": "Halves and quarters", "fontSize": 20, "textColor": "#222222" }
    },
    {
      "id": "q1",
      "type": "quiz",
      "position": { "x": 0, "y": 48 },
      "size": { "width": 184, "height": 88 },
      "gridPosition": { "col": 0, "row": 1, "colSpan": 4, "rowSpan": 2 },
      "page": 0,
      "z_index": 1,
      "created_at": 1000,
      "updated_at": 2000,
      "version": 3,
      "content": {
        "question": "Which equal one half?",
        "questionType": "multiple",
        "answers": [
          { "text": "2/4", "isCorrect": true },
          { "text": "1/3", "isCorrect": false },
          { "text": "3/6", "isCorrect": true }
        ]
      }
    },
    {
      "id": "pairs",
      "type": "pairing",
      "position": { "x": 48, "y": 0 },
      "size": { "width": 88, "height": 88 },
      "gridPosition": { "col": 1, "row": 0, "colSpan": 2, "rowSpan": 2 },
      "page": 1,
      "z_index": 0,
      "created_at": 1000,
      "updated_at": 1000,
      "version": 1,
      "content": {
        "question": "Match",
        "pairs": [ { "id": "p1", "left": "1/2", "right": "0.5" }, { "id": "p2", "left": "1/4", "right": "0.25" } ]
      }
    }
  ]
}"##;

#[test]
fn decodes_full_lesson() {
    let lesson = Lesson::from_json_str(LESSON_JSON).unwrap();
    assert_eq!(lesson.tiles.len(), 3);
    assert_eq!(lesson.canvas_settings.gap, 8);
    assert_eq!(lesson.title.as_deref(), Some("Fractions"));

    let quiz = lesson.tile(&TileId::new("q1")).unwrap();
    assert_eq!(quiz.tile_type(), TileType::Quiz);
    let TileContent::Quiz(content) = &quiz.content else {
        panic!("expected quiz");
    };
    assert_eq!(content.question_type, QuestionType::Multiple);
    assert_eq!(content.correct_indices().into_iter().collect::<Vec<_>>(), vec![0, 2]);

    let page_one: Vec<&str> = lesson.tiles_on_page(1).iter().map(|t| t.id.as_str()).collect();
    assert_eq!(page_one, vec!["pairs"]);
}

#[test]
fn reencoded_lesson_loads_identically() {
    let lesson = Lesson::from_json_str(LESSON_JSON).unwrap();
    let again = Lesson::from_json_str(&lesson.to_json_string().unwrap()).unwrap();
    assert_eq!(again, lesson);
}

#[test]
fn inconsistent_pixels_are_rejected() {
    let broken = LESSON_JSON.replace(r#""x": 48, "y": 0"#, r#""x": 50, "y": 0"#);
    let err = Lesson::from_json_str(&broken).unwrap_err();
    assert!(matches!(
        err,
        LessonLoadError::Validation(LessonValidationError::PixelMismatch { .. })
    ));
}
