//! An in-process host editor backed by [`TextBuffer`].
//!
//! `RopeEditor` behaves like a widget host: edits are applied atomically and
//! bottom-to-top, listeners are called synchronously with the post-edit state,
//! and remote-cursor markers and decorations are kept as plain data.
use std::collections::BTreeMap;

use anyhow::{bail, Result};

use crate::buffer::TextBuffer;
use crate::coords::Position;
use crate::cursor::Selection;
use crate::edit::{ChangeBatch, EditOrigin, RangeEdit};
use crate::host::{
    CommandHandler, DecorationId, DecorationSpec, DocumentView, EditorEvent, HostEditor,
    Listener, MarkerSpec, SubscriptionId,
};

const DEFAULT_LINE_HEIGHT: f32 = 19.0;

/// The part of the editor listeners are allowed to see.
#[derive(Debug, Clone, Default)]
pub struct EditorState {
    buffer: TextBuffer,
    selection: Selection,
}

impl EditorState {
    fn char_index(&self, pos: Position) -> Result<usize> {
        self.buffer.position_to_char(pos)
    }

    fn position_at(&self, char_idx: usize) -> Result<Position> {
        self.buffer.char_to_position(char_idx)
    }
}

impl DocumentView for EditorState {
    fn lines(&self) -> Vec<String> {
        self.buffer.lines()
    }

    fn value(&self) -> String {
        self.buffer.to_string()
    }

    fn selection(&self) -> Selection {
        self.selection
    }
}

/// A rope-backed editor implementing [`HostEditor`].
pub struct RopeEditor {
    state: EditorState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
    markers: BTreeMap<String, MarkerSpec>,
    decorations: BTreeMap<DecorationId, DecorationSpec>,
    next_decoration: DecorationId,
    style_rules: Vec<String>,
    line_height: f32,
    focused: bool,
    undo_handler: Option<CommandHandler>,
    redo_handler: Option<CommandHandler>,
}

impl std::fmt::Debug for RopeEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RopeEditor")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .field("markers", &self.markers)
            .field("decorations", &self.decorations)
            .field("line_height", &self.line_height)
            .field("focused", &self.focused)
            .finish_non_exhaustive()
    }
}

impl Default for RopeEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for RopeEditor {
    fn from(text: &str) -> Self {
        let mut editor = Self::new();
        editor.state.buffer = TextBuffer::from(text);
        editor
    }
}

impl RopeEditor {
    /// Creates an empty editor with the caret at 1:1.
    pub fn new() -> Self {
        Self {
            state: EditorState::default(),
            listeners: Vec::new(),
            next_subscription: 0,
            markers: BTreeMap::new(),
            decorations: BTreeMap::new(),
            next_decoration: 0,
            style_rules: Vec::new(),
            line_height: DEFAULT_LINE_HEIGHT,
            focused: false,
            undo_handler: None,
            redo_handler: None,
        }
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.state.buffer
    }

    /// Applies a local (user) edit batch.
    pub fn edit(&mut self, edits: Vec<RangeEdit>) -> Result<()> {
        self.apply_edits(edits, EditOrigin::User)
    }

    /// Replaces the selection with `text` and puts the caret after it.
    pub fn type_text(&mut self, text: &str) -> Result<()> {
        let selection = self.state.selection;
        let start = self.state.char_index(selection.start())?;
        self.edit(vec![RangeEdit::new(
            selection.start(),
            selection.end(),
            text,
        )])?;
        let caret = self.state.position_at(start + text.chars().count())?;
        self.set_selection(Selection::caret(caret))
    }

    pub fn focus(&mut self) {
        self.focused = true;
        self.emit(EditorEvent::Focus);
    }

    pub fn blur(&mut self) {
        self.focused = false;
        self.emit(EditorEvent::Blur);
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Changes font metrics and announces a configuration change.
    pub fn set_line_height(&mut self, height: f32) {
        self.line_height = height;
        self.emit(EditorEvent::ConfigurationChanged);
    }

    /// Runs the registered undo handler. Returns false if there is none.
    pub fn undo(&mut self) -> bool {
        match self.undo_handler.as_mut() {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    /// Runs the registered redo handler. Returns false if there is none.
    pub fn redo(&mut self) -> bool {
        match self.redo_handler.as_mut() {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }

    pub fn markers(&self) -> &BTreeMap<String, MarkerSpec> {
        &self.markers
    }

    pub fn decorations(&self) -> &BTreeMap<DecorationId, DecorationSpec> {
        &self.decorations
    }

    pub fn style_rules(&self) -> &[String] {
        &self.style_rules
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn emit(&mut self, event: EditorEvent) {
        let Self {
            state, listeners, ..
        } = self;
        for (_, listener) in listeners.iter_mut() {
            listener(&event, &*state);
        }
    }
}

/// Where `offset` lands after the ascending, prior-coordinate `edits` are applied.
fn shift_offset(offset: usize, located: &[(usize, usize, usize)], edits: &[RangeEdit]) -> usize {
    let mut delta: isize = 0;
    for &(start, end, index) in located {
        let inserted = edits[index].text.chars().count() as isize;
        if offset >= end {
            delta += inserted - (end - start) as isize;
        } else if offset > start {
            // Inside a replaced range: land after the replacement
            return (start as isize + delta + inserted) as usize;
        } else {
            break;
        }
    }
    (offset as isize + delta) as usize
}

impl DocumentView for RopeEditor {
    fn lines(&self) -> Vec<String> {
        self.state.lines()
    }

    fn value(&self) -> String {
        self.state.value()
    }

    fn selection(&self) -> Selection {
        self.state.selection
    }
}

impl HostEditor for RopeEditor {
    fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    fn apply_edits(&mut self, edits: Vec<RangeEdit>, origin: EditOrigin) -> Result<()> {
        if edits.is_empty() {
            return Ok(());
        }

        let mut located = Vec::with_capacity(edits.len());
        for (index, edit) in edits.iter().enumerate() {
            let start = self.state.char_index(edit.start)?;
            let end = self.state.char_index(edit.end)?;
            if start > end {
                bail!("invalid range {}..{}", edit.start, edit.end);
            }
            located.push((start, end, index));
        }
        located.sort_unstable();
        for pair in located.windows(2) {
            if pair[0].1 > pair[1].0 {
                bail!(
                    "overlapping edits {}..{} and {}..{}",
                    pair[0].0,
                    pair[0].1,
                    pair[1].0,
                    pair[1].1
                );
            }
        }

        let old_selection = self.state.selection;
        let anchor = self.state.char_index(old_selection.anchor)?;
        let head = self.state.char_index(old_selection.head)?;

        // Bottom-to-top so every remaining range is still valid
        for &(start, end, index) in located.iter().rev() {
            self.state.buffer.replace(start, end, &edits[index].text)?;
        }

        let anchor = self
            .state
            .position_at(shift_offset(anchor, &located, &edits))?;
        let head = self.state.position_at(shift_offset(head, &located, &edits))?;
        self.state.selection = Selection::new(anchor, head);

        self.emit(EditorEvent::ContentChanged(ChangeBatch::new(edits, origin)));
        if self.state.selection != old_selection {
            self.emit(EditorEvent::SelectionChanged);
        }
        Ok(())
    }

    fn set_selection(&mut self, selection: Selection) -> Result<()> {
        self.state.char_index(selection.anchor)?;
        self.state.char_index(selection.head)?;
        self.state.selection = selection;
        self.emit(EditorEvent::SelectionChanged);
        Ok(())
    }

    fn normalize_line_endings(&mut self) {
        if self.state.buffer.normalize_line_endings() {
            self.state.selection = Selection::default();
        }
    }

    fn line_height(&self) -> f32 {
        self.line_height
    }

    fn add_marker(&mut self, marker: MarkerSpec) {
        self.markers.insert(marker.peer.clone(), marker);
    }

    fn remove_marker(&mut self, peer: &str) -> bool {
        self.markers.remove(peer).is_some()
    }

    fn resize_marker(&mut self, peer: &str, height: f32) {
        if let Some(marker) = self.markers.get_mut(peer) {
            marker.height = height;
        }
    }

    fn add_decoration(&mut self, decoration: DecorationSpec) -> DecorationId {
        let id = self.next_decoration;
        self.next_decoration += 1;
        self.decorations.insert(id, decoration);
        id
    }

    fn remove_decoration(&mut self, id: DecorationId) -> bool {
        self.decorations.remove(&id).is_some()
    }

    fn insert_style_rule(&mut self, css: String) {
        if !self.style_rules.contains(&css) {
            self.style_rules.push(css);
        }
    }

    fn set_undo_handler(&mut self, handler: Option<CommandHandler>) {
        self.undo_handler = handler;
    }

    fn set_redo_handler(&mut self, handler: Option<CommandHandler>) {
        self.redo_handler = handler;
    }
}
