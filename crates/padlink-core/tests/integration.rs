// Integration tests for the adapter.
//
// These exercise full workflows: local edits through a `RopeEditor`, operation
// exchange between two attached editors, and the translation properties.

use std::cell::RefCell;
use std::rc::Rc;

use padlink_config::{AdapterConfig, HexColor};
use padlink_core::cursor::Selection;
use padlink_core::{
    Adapter, AdapterCallbacks, AdapterEvent, Cursor, DocumentView, HostEditor, OperationSeq,
    Position, RangeEdit, RopeEditor, Snapshot,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use proptest::sample::Index;

fn pos(line: usize, column: usize) -> Position {
    Position::new(line, column)
}

fn attach(text: &str) -> Adapter<RopeEditor> {
    Adapter::attach(RopeEditor::from(text))
}

fn changes(adapter: &mut Adapter<RopeEditor>) -> Vec<(OperationSeq, OperationSeq)> {
    adapter
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            AdapterEvent::Change { operation, inverse } => Some((operation, inverse)),
            _ => None,
        })
        .collect()
}

/// Records every callback in order.
#[derive(Clone, Default)]
struct Recorder {
    log: Rc<RefCell<Vec<String>>>,
}

impl AdapterCallbacks for Recorder {
    fn on_change(&mut self, operation: &OperationSeq, _inverse: &OperationSeq) {
        self.log
            .borrow_mut()
            .push(format!("change {}->{}", operation.base_len(), operation.target_len()));
    }

    fn on_cursor_activity(&mut self) {
        self.log.borrow_mut().push("cursor".to_string());
    }

    fn on_focus(&mut self) {
        self.log.borrow_mut().push("focus".to_string());
    }

    fn on_blur(&mut self) {
        self.log.borrow_mut().push("blur".to_string());
    }
}

// ── Workflows ────────────────────────────────────────────────────────

#[test]
fn test_two_simultaneous_edits() {
    let mut adapter = attach("hello\nworld");
    adapter
        .editor_mut()
        .edit(vec![
            RangeEdit::delete(pos(2, 5), pos(2, 6)),
            RangeEdit::insert(pos(1, 1), "X"),
        ])
        .unwrap();

    let changes = changes(&mut adapter);
    assert_eq!(changes.len(), 1);
    let (operation, inverse) = &changes[0];
    assert_eq!(operation.apply("hello\nworld").unwrap(), "Xhello\nworl");
    assert_eq!(inverse.apply("Xhello\nworl").unwrap(), "hello\nworld");
    assert_eq!(adapter.get_value(), "Xhello\nworl");
}

#[test]
fn test_callbacks_receive_events_in_order() {
    let recorder = Recorder::default();
    let log = Rc::clone(&recorder.log);
    let mut adapter = attach("abc");
    adapter.register_callbacks(recorder);

    adapter.editor_mut().focus();
    adapter
        .editor_mut()
        .set_selection(Selection::caret(pos(1, 4)))
        .unwrap();
    adapter.editor_mut().type_text("d").unwrap();
    adapter.editor_mut().blur();
    assert!(log.borrow().is_empty(), "nothing is delivered before flush");

    adapter.flush().unwrap();
    assert_eq!(
        *log.borrow(),
        vec!["focus", "cursor", "change 3->4", "cursor", "cursor", "blur"]
    );
}

#[test]
fn test_cursor_round_trip() {
    let mut adapter = attach("hello\nworld");
    adapter.set_cursor(Cursor::new(8, 2)).unwrap();
    assert_eq!(
        adapter.editor().selection(),
        Selection::new(pos(1, 3), pos(2, 3))
    );
    assert_eq!(adapter.get_cursor().unwrap(), Cursor::new(8, 2));
    assert!(adapter.set_cursor(Cursor::caret(12)).is_err());
}

#[test]
fn test_undo_redo_are_routed() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut adapter = attach("abc");
    let undo_calls = Rc::clone(&calls);
    let redo_calls = Rc::clone(&calls);
    adapter.register_undo(move || undo_calls.borrow_mut().push("undo"));
    adapter.register_redo(move || redo_calls.borrow_mut().push("redo"));

    assert!(adapter.editor_mut().undo());
    assert!(adapter.editor_mut().redo());
    assert_eq!(*calls.borrow(), vec!["undo", "redo"]);
}

#[test]
fn test_attach_normalizes_line_endings() {
    let adapter = attach("a\r\nb");
    assert_eq!(adapter.get_value(), "a\nb");
    assert_eq!(adapter.snapshot().len_chars(), 3);

    let config = AdapterConfig {
        normalize_line_endings: false,
        ..AdapterConfig::default()
    };
    let adapter = Adapter::attach_with_config(RopeEditor::from("a\r\nb"), &config);
    assert_eq!(adapter.get_value(), "a\r\nb");
}

// ── Replay ───────────────────────────────────────────────────────────

#[test]
fn test_replay_never_reports_a_change() {
    let mut adapter = attach("hello\nworld");
    let mut remote = OperationSeq::default();
    remote.delete(6);
    remote.retain(3);
    remote.insert("L");
    remote.delete(1);
    remote.retain(1);
    adapter.apply_operation(&remote).unwrap();

    assert_eq!(adapter.get_value(), "worLd");
    assert!(changes(&mut adapter).is_empty());
    assert_eq!(adapter.suppressed_echoes(), 3);
    adapter.flush().unwrap();
}

#[test]
fn test_local_edit_after_replay_uses_fresh_snapshot() {
    let mut adapter = attach("abc");
    let mut remote = OperationSeq::default();
    remote.insert("__");
    remote.retain(3);
    adapter.apply_operation(&remote).unwrap();

    adapter
        .editor_mut()
        .edit(vec![RangeEdit::insert(pos(1, 6), "!")])
        .unwrap();
    let changes = changes(&mut adapter);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].0.apply("__abc").unwrap(), "__abc!");
}

#[test]
fn test_two_peers_converge() {
    let mut alice = attach("shared text");
    let mut bob = attach("shared text");

    alice
        .editor_mut()
        .edit(vec![RangeEdit::new(pos(1, 8), pos(1, 12), "notes")])
        .unwrap();
    for (operation, _) in changes(&mut alice) {
        bob.apply_operation(&operation).unwrap();
    }

    bob.editor_mut()
        .edit(vec![RangeEdit::insert(pos(1, 1), "our ")])
        .unwrap();
    for (operation, _) in changes(&mut bob) {
        alice.apply_operation(&operation).unwrap();
    }

    assert_eq!(alice.get_value(), "our shared notes");
    assert_eq!(alice.get_value(), bob.get_value());
    assert!(changes(&mut alice).is_empty());
}

#[test]
fn test_inverse_undoes_applied_change() {
    let mut adapter = attach("one\ntwo");
    adapter
        .editor_mut()
        .edit(vec![RangeEdit::delete(pos(1, 2), pos(2, 2))])
        .unwrap();
    let (_, inverse) = changes(&mut adapter).remove(0);

    adapter.apply_operation(&inverse).unwrap();
    assert_eq!(adapter.get_value(), "one\ntwo");
}

// ── Remote cursors ───────────────────────────────────────────────────

#[test]
fn test_remote_cursor_lifecycle() {
    let mut adapter = attach("hello\nworld");
    let color = HexColor::from_hex("#00AAFF").unwrap();

    let caret = adapter.set_other_cursor(Cursor::caret(7), color, "p1").unwrap();
    assert_eq!(adapter.editor().markers()["p1"].position, pos(2, 2));

    let range = adapter
        .set_other_cursor(Cursor::new(8, 2), color, "p1")
        .unwrap();
    assert!(adapter.editor().markers().is_empty());
    assert_eq!(adapter.editor().decorations().len(), 1);
    assert_eq!(
        adapter.editor().style_rules(),
        [".selection-00AAFF { background: rgb(0,170,255); background: rgba(0,170,255,0.4); }".to_string()]
    );

    // The first handle is stale now
    assert!(!caret.clear(&mut adapter));
    assert_eq!(adapter.editor().decorations().len(), 1);

    assert!(range.clear(&mut adapter));
    assert!(!range.clear(&mut adapter));
    assert!(adapter.editor().decorations().is_empty());
}

#[test]
fn test_reflow_resizes_markers_on_flush() {
    let mut adapter = attach("abc");
    adapter
        .set_other_cursor(Cursor::caret(1), HexColor::rgb(1, 2, 3), "p")
        .unwrap();
    adapter.editor_mut().set_line_height(30.0);
    assert!((adapter.editor().markers()["p"].height - 19.0).abs() < f32::EPSILON);

    adapter.flush().unwrap();
    assert!((adapter.editor().markers()["p"].height - 30.0).abs() < f32::EPSILON);
}

// ── Properties ───────────────────────────────────────────────────────

fn document() -> impl Strategy<Value = String> {
    "[abé\n]{0,24}"
}

/// Non-overlapping edits in prior offsets, reported bottom-to-top.
fn batch(doc: &str, picks: &[(Index, Index, String)]) -> Vec<RangeEdit> {
    let snapshot = Snapshot::from_text(doc);
    let len = snapshot.len_chars();
    let mut ranges: Vec<(usize, usize, &str)> = picks
        .iter()
        .map(|(a, b, text)| {
            let (a, b) = (a.index(len + 1), b.index(len + 1));
            (a.min(b), a.max(b), text.as_str())
        })
        .collect();
    ranges.sort_by_key(|&(start, end, _)| (start, end));

    let mut kept: Vec<(usize, usize, &str)> = Vec::new();
    for range in ranges {
        if kept.last().map_or(true, |last| last.1 <= range.0) {
            kept.push(range);
        }
    }
    kept.iter()
        .rev()
        .map(|&(start, end, text)| {
            RangeEdit::new(
                snapshot.position_of(start).unwrap(),
                snapshot.position_of(end).unwrap(),
                text,
            )
        })
        .collect()
}

proptest! {
    #[test]
    fn test_single_edit_round_trip(
        doc in document(),
        a in any::<Index>(),
        b in any::<Index>(),
        text in "[xé\n]{0,4}",
    ) {
        let edits = batch(&doc, &[(a, b, text)]);
        let mut adapter = attach(&doc);
        adapter.editor_mut().edit(edits).unwrap();
        let after = adapter.get_value();

        for (operation, inverse) in changes(&mut adapter) {
            prop_assert_eq!(operation.apply(&doc).unwrap(), after.clone());
            prop_assert_eq!(inverse.apply(&after).unwrap(), doc.clone());
        }
    }

    #[test]
    fn test_batch_lengths_match_documents(
        doc in document(),
        picks in prop::collection::vec((any::<Index>(), any::<Index>(), "[xyz]{0,3}"), 1..5),
    ) {
        let mut adapter = attach(&doc);
        adapter.editor_mut().edit(batch(&doc, &picks)).unwrap();
        let after = adapter.get_value();
        let changes = changes(&mut adapter);
        prop_assert_eq!(changes.len(), 1);
        for (operation, inverse) in changes {
            prop_assert_eq!(operation.base_len(), doc.chars().count());
            prop_assert_eq!(operation.target_len(), after.chars().count());
            prop_assert_eq!(inverse.base_len(), after.chars().count());
            prop_assert_eq!(inverse.target_len(), doc.chars().count());
            prop_assert_eq!(inverse.apply(&operation.apply(&doc).unwrap()).unwrap(), doc.clone());
        }
    }

    #[test]
    fn test_offsets_and_positions_are_inverse(doc in document(), at in any::<Index>()) {
        let snapshot = Snapshot::from_text(&doc);
        let offset = at.index(snapshot.len_chars() + 1);
        let position = snapshot.position_of(offset).unwrap();
        prop_assert_eq!(snapshot.offset_of(position).unwrap(), offset);
    }

    #[test]
    fn test_replayed_change_converges(
        doc in document(),
        picks in prop::collection::vec((any::<Index>(), any::<Index>(), "[xyz\n]{0,3}"), 1..4),
    ) {
        let mut local = attach(&doc);
        let mut peer = attach(&doc);
        local.editor_mut().edit(batch(&doc, &picks)).unwrap();
        for (operation, _) in changes(&mut local) {
            peer.apply_operation(&operation).unwrap();
        }
        prop_assert_eq!(peer.get_value(), local.get_value());
        prop_assert!(changes(&mut peer).is_empty());
    }
}
