/// Local selection and remote peer cursors, in offset coordinates.
use std::collections::{HashMap, HashSet};

use padlink_config::HexColor;

use crate::coords::{Position, Snapshot};
use crate::error::Result;
use crate::host::{DecorationId, DecorationSpec, HostEditor, MarkerSpec};

/// A native selection range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Where the selection started.
    pub anchor: Position,
    /// Where the caret is.
    pub head: Position,
}

impl Default for Selection {
    fn default() -> Self {
        Self::caret(Position::new(1, 1))
    }
}

impl Selection {
    pub fn new(anchor: Position, head: Position) -> Self {
        Self { anchor, head }
    }

    pub fn caret(at: Position) -> Self {
        Self::new(at, at)
    }

    /// Returns the start (min) position of the selection.
    pub fn start(&self) -> Position {
        std::cmp::min(self.anchor, self.head)
    }

    /// Returns the end (max) position of the selection.
    pub fn end(&self) -> Position {
        std::cmp::max(self.anchor, self.head)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }
}

/// A caret or selection in offset space, as exchanged with the OT layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Offset of the caret.
    pub position: usize,
    /// Offset of the other end of the selection; equal to `position` for a caret.
    pub selection_end: usize,
}

impl Cursor {
    pub fn new(position: usize, selection_end: usize) -> Self {
        Self {
            position,
            selection_end,
        }
    }

    pub fn caret(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn is_caret(&self) -> bool {
        self.position == self.selection_end
    }
}

/// Converts a native selection to offsets.
pub fn cursor_from_selection(snapshot: &Snapshot, selection: Selection) -> Result<Cursor> {
    Ok(Cursor::new(
        snapshot.offset_of(selection.head)?,
        snapshot.offset_of(selection.anchor)?,
    ))
}

/// Converts offsets to a native selection, caret at `cursor.position`.
pub fn selection_from_cursor(snapshot: &Snapshot, cursor: Cursor) -> Result<Selection> {
    Ok(Selection::new(
        snapshot.position_of(cursor.selection_end)?,
        snapshot.position_of(cursor.position)?,
    ))
}

/// How remote cursors are drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemoteCursorStyle {
    pub caret_width_px: u32,
    pub selection_alpha: f32,
}

/// Returned by [`RemoteCursors::show`]; clears exactly the artifact it created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCursorHandle {
    peer: String,
    generation: u64,
}

impl RemoteCursorHandle {
    pub fn peer(&self) -> &str {
        &self.peer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Artifact {
    Marker,
    Decoration(DecorationId),
}

#[derive(Debug, Clone, Copy)]
struct Placed {
    generation: u64,
    artifact: Artifact,
}

/// At most one visual artifact per peer.
#[derive(Debug, Default)]
pub struct RemoteCursors {
    peers: HashMap<String, Placed>,
    next_generation: u64,
    /// Selection classes whose style rule was already registered.
    styled: HashSet<String>,
}

impl RemoteCursors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a marker (caret) or a highlight (range) for `peer`, replacing
    /// whatever that peer had before.
    pub fn show<E: HostEditor + ?Sized>(
        &mut self,
        editor: &mut E,
        snapshot: &Snapshot,
        cursor: Cursor,
        color: HexColor,
        peer: &str,
        style: RemoteCursorStyle,
    ) -> Result<RemoteCursorHandle> {
        let head = snapshot.position_of(cursor.position)?;
        let other = snapshot.position_of(cursor.selection_end)?;
        self.clear_peer(editor, peer);

        let artifact = if cursor.is_caret() {
            let height = editor.line_height();
            editor.add_marker(MarkerSpec {
                peer: peer.to_string(),
                position: head,
                color,
                width_px: style.caret_width_px,
                height,
            });
            Artifact::Marker
        } else {
            let class = color.selection_class();
            if self.styled.insert(class.clone()) {
                // rgb fallback, then rgba
                editor.insert_style_rule(format!(
                    ".{class} {{ background: {}; background: {}; }}",
                    color.to_css_rgb(),
                    color.to_css_rgba(style.selection_alpha)
                ));
            }
            let id = editor.add_decoration(DecorationSpec {
                start: head.min(other),
                end: head.max(other),
                class_name: format!("other-client-selection {class}"),
            });
            Artifact::Decoration(id)
        };

        let generation = self.next_generation;
        self.next_generation += 1;
        self.peers.insert(
            peer.to_string(),
            Placed {
                generation,
                artifact,
            },
        );
        tracing::trace!(peer, ?artifact, "placed remote cursor");
        Ok(RemoteCursorHandle {
            peer: peer.to_string(),
            generation,
        })
    }

    /// Removes the artifact `handle` created. Stale or repeated clears are no-ops.
    pub fn clear<E: HostEditor + ?Sized>(
        &mut self,
        editor: &mut E,
        handle: &RemoteCursorHandle,
    ) -> bool {
        match self.peers.get(&handle.peer) {
            Some(placed) if placed.generation == handle.generation => {
                self.clear_peer(editor, &handle.peer)
            }
            _ => false,
        }
    }

    /// Removes whatever `peer` currently shows.
    pub fn clear_peer<E: HostEditor + ?Sized>(&mut self, editor: &mut E, peer: &str) -> bool {
        let Some(placed) = self.peers.remove(peer) else {
            return false;
        };
        match placed.artifact {
            Artifact::Marker => editor.remove_marker(peer),
            Artifact::Decoration(id) => editor.remove_decoration(id),
        }
    }

    /// Removes every peer's artifact.
    pub fn clear_all<E: HostEditor + ?Sized>(&mut self, editor: &mut E) {
        let peers: Vec<String> = self.peers.keys().cloned().collect();
        for peer in peers {
            self.clear_peer(editor, &peer);
        }
    }

    /// Resizes every live marker to the host's current line height.
    pub fn reflow<E: HostEditor + ?Sized>(&self, editor: &mut E) {
        let height = editor.line_height();
        for (peer, placed) in &self.peers {
            if placed.artifact == Artifact::Marker {
                editor.resize_marker(peer, height);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::RopeEditor;

    fn style() -> RemoteCursorStyle {
        RemoteCursorStyle {
            caret_width_px: 2,
            selection_alpha: 0.4,
        }
    }

    fn red() -> HexColor {
        HexColor::rgb(255, 0, 0)
    }

    #[test]
    fn test_selection_start_end() {
        let sel = Selection::new(Position::new(2, 3), Position::new(1, 5));
        assert_eq!(sel.start(), Position::new(1, 5));
        assert_eq!(sel.end(), Position::new(2, 3));
        assert!(!sel.is_empty());
        assert!(Selection::caret(Position::new(1, 1)).is_empty());
    }

    #[test]
    fn test_cursor_from_selection_uses_head_as_position() {
        let snap = Snapshot::from_text("hello\nworld");
        let sel = Selection::new(Position::new(1, 2), Position::new(2, 3));
        let cursor = cursor_from_selection(&snap, sel).unwrap();
        assert_eq!(cursor, Cursor::new(8, 1));
        assert_eq!(selection_from_cursor(&snap, cursor).unwrap(), sel);
    }

    #[test]
    fn test_cursor_conversion_rejects_out_of_range() {
        let snap = Snapshot::from_text("abc");
        assert!(selection_from_cursor(&snap, Cursor::caret(4)).is_err());
    }

    // ── Remote cursors ───────────────────────────────────────────────

    #[test]
    fn test_caret_places_marker() {
        let mut editor = RopeEditor::from("hello\nworld");
        let snap = Snapshot::from_lines(editor.buffer().lines());
        let mut remote = RemoteCursors::new();

        let handle = remote
            .show(&mut editor, &snap, Cursor::caret(7), red(), "peer-1", style())
            .unwrap();
        assert_eq!(handle.peer(), "peer-1");
        let marker = &editor.markers()["peer-1"];
        assert_eq!(marker.position, Position::new(2, 2));
        assert_eq!(marker.width_px, 2);
        assert!(editor.decorations().is_empty());
    }

    #[test]
    fn test_range_places_ordered_decoration_and_style_once() {
        let mut editor = RopeEditor::from("hello\nworld");
        let snap = Snapshot::from_lines(editor.buffer().lines());
        let mut remote = RemoteCursors::new();

        remote
            .show(&mut editor, &snap, Cursor::new(8, 1), red(), "a", style())
            .unwrap();
        remote
            .show(&mut editor, &snap, Cursor::new(0, 2), red(), "b", style())
            .unwrap();

        let decorations: Vec<_> = editor.decorations().values().cloned().collect();
        assert_eq!(decorations.len(), 2);
        assert!(decorations.iter().any(|d| d.start == Position::new(1, 2)
            && d.end == Position::new(2, 3)
            && d.class_name == "other-client-selection selection-FF0000"));
        assert_eq!(
            editor.style_rules(),
            &[".selection-FF0000 { background: rgb(255,0,0); background: rgba(255,0,0,0.4); }".to_string()]
        );
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut editor = RopeEditor::from("hello");
        let snap = Snapshot::from_lines(editor.buffer().lines());
        let mut remote = RemoteCursors::new();

        let handle = remote
            .show(&mut editor, &snap, Cursor::new(1, 3), red(), "p", style())
            .unwrap();
        assert!(remote.clear(&mut editor, &handle));
        assert!(editor.decorations().is_empty());
        assert!(!remote.clear(&mut editor, &handle));
        assert!(remote.is_empty());
    }

    #[test]
    fn test_new_update_replaces_previous_artifact() {
        let mut editor = RopeEditor::from("hello");
        let snap = Snapshot::from_lines(editor.buffer().lines());
        let mut remote = RemoteCursors::new();

        let old = remote
            .show(&mut editor, &snap, Cursor::new(0, 4), red(), "p", style())
            .unwrap();
        let new = remote
            .show(&mut editor, &snap, Cursor::caret(2), red(), "p", style())
            .unwrap();

        assert!(editor.decorations().is_empty());
        assert_eq!(editor.markers().len(), 1);
        // The stale handle must not remove the newer marker
        assert!(!remote.clear(&mut editor, &old));
        assert_eq!(editor.markers().len(), 1);
        assert!(remote.clear(&mut editor, &new));
        assert!(editor.markers().is_empty());
    }

    #[test]
    fn test_unknown_peer_clear_is_noop() {
        let mut editor = RopeEditor::from("hello");
        let mut remote = RemoteCursors::new();
        assert!(!remote.clear_peer(&mut editor, "nobody"));
    }

    #[test]
    fn test_out_of_range_cursor_places_nothing() {
        let mut editor = RopeEditor::from("abc");
        let snap = Snapshot::from_lines(editor.buffer().lines());
        let mut remote = RemoteCursors::new();
        assert!(remote
            .show(&mut editor, &snap, Cursor::caret(10), red(), "p", style())
            .is_err());
        assert!(editor.markers().is_empty());
        assert!(remote.is_empty());
    }

    #[test]
    fn test_reflow_resizes_markers() {
        let mut editor = RopeEditor::from("hello");
        let snap = Snapshot::from_lines(editor.buffer().lines());
        let mut remote = RemoteCursors::new();
        remote
            .show(&mut editor, &snap, Cursor::caret(0), red(), "p", style())
            .unwrap();

        editor.set_line_height(30.0);
        remote.reflow(&mut editor);
        assert!((editor.markers()["p"].height - 30.0).abs() < f32::EPSILON);
    }
}
