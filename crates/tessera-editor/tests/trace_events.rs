//! Editor transitions and document edits emit structured debug events.

use std::sync::{Arc, Mutex};

use tessera_core::{GridPosition, LessonId, TesseraConfig, TileId, TileType};
use tessera_editor::{EditorAction, EditorState, LessonDocument, reduce};
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

#[derive(Default)]
struct Seen {
    messages: Vec<String>,
    outcomes: Vec<String>,
}

struct EventCapture {
    seen: Arc<Mutex<Seen>>,
}

impl<S> Layer<S> for EventCapture
where
    S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        struct Fields {
            message: Option<String>,
            outcome: Option<String>,
        }
        impl tracing::field::Visit for Fields {
            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                if field.name() == "message" {
                    self.message = Some(value.to_string());
                }
            }

            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                match field.name() {
                    "message" => {
                        self.message = Some(format!("{value:?}").trim_matches('"').to_string());
                    }
                    "outcome" => self.outcome = Some(format!("{value:?}")),
                    _ => {}
                }
            }
        }
        let mut fields = Fields {
            message: None,
            outcome: None,
        };
        event.record(&mut fields);
        let mut seen = self.seen.lock().expect("trace lock");
        if let Some(message) = fields.message {
            seen.messages.push(message);
        }
        if let Some(outcome) = fields.outcome {
            seen.outcomes.push(outcome);
        }
    }
}

fn capture() -> (Arc<Mutex<Seen>>, tracing::subscriber::DefaultGuard) {
    let seen = Arc::new(Mutex::new(Seen::default()));
    let subscriber = tracing_subscriber::registry().with(EventCapture {
        seen: Arc::clone(&seen),
    });
    (seen, tracing::subscriber::set_default(subscriber))
}

#[test]
fn reduce_emits_transition_event_with_outcome() {
    let (seen, _guard) = capture();

    let state = EditorState::default();
    let _ = reduce(
        &state,
        &EditorAction::SelectTile {
            tile_id: TileId::new("a"),
        },
    );
    let _ = reduce(&state, &EditorAction::EndInteraction);

    let seen = seen.lock().expect("trace lock");
    assert_eq!(
        seen.messages
            .iter()
            .filter(|m| m.as_str() == "editor.reduce")
            .count(),
        2
    );
    assert_eq!(seen.outcomes[0], "Applied");
    assert!(
        seen.outcomes[1].contains("NoActiveInteraction"),
        "{:?}",
        seen.outcomes
    );
}

#[test]
fn document_edits_emit_named_events() {
    let (seen, _guard) = capture();

    let mut doc = LessonDocument::create(LessonId::new("l"), &TesseraConfig::default()).unwrap();
    let id = doc
        .add_tile(TileType::Text, GridPosition::cell(0, 0), 0)
        .unwrap();
    doc.delete_tile(&id).unwrap();
    assert!(doc.undo());
    assert!(doc.add_tile(TileType::Text, GridPosition::cell(40, 0), 0).is_err());

    let seen = seen.lock().expect("trace lock");
    for expected in ["document.add_tile", "document.delete_tile", "document.undo"] {
        assert!(
            seen.messages.iter().any(|m| m == expected),
            "missing {expected}: {:?}",
            seen.messages
        );
    }
}
