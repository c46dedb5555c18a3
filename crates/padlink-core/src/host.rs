//! Interface to the host editor widget.
//!
//! The adapter never owns text itself. It reads the host through
//! [`DocumentView`], mutates it through [`HostEditor`], and learns about
//! changes through a [`Listener`] the host calls synchronously after each
//! mutation.
use padlink_config::HexColor;

use crate::coords::Position;
use crate::cursor::Selection;
use crate::edit::{ChangeBatch, EditOrigin, RangeEdit};

pub type SubscriptionId = u64;
pub type DecorationId = u64;

/// Receives every native notification together with a read-only view of the
/// host's state after the change.
pub type Listener = Box<dyn FnMut(&EditorEvent, &dyn DocumentView)>;

/// Undo/redo command routed to the collaboration controller.
pub type CommandHandler = Box<dyn FnMut()>;

/// Native notifications emitted by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    ContentChanged(ChangeBatch),
    SelectionChanged,
    Focus,
    Blur,
    /// Font or layout metrics changed.
    ConfigurationChanged,
}

/// Read access to the host's current state.
pub trait DocumentView {
    /// Line contents without separators.
    fn lines(&self) -> Vec<String>;

    /// Full text, lines joined with `\n`.
    fn value(&self) -> String;

    fn selection(&self) -> Selection;
}

/// A caret marker for a remote peer.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub peer: String,
    pub position: Position,
    pub color: HexColor,
    pub width_px: u32,
    /// Marker height, kept equal to the host's line height.
    pub height: f32,
}

/// A highlighted range for a remote peer's selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecorationSpec {
    pub start: Position,
    pub end: Position,
    pub class_name: String,
}

pub trait HostEditor: DocumentView {
    fn subscribe(&mut self, listener: Listener) -> SubscriptionId;

    /// Returns false if `id` was not subscribed.
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;

    /// Applies all `edits` atomically, then notifies listeners with one
    /// [`EditorEvent::ContentChanged`] carrying `origin`.
    fn apply_edits(&mut self, edits: Vec<RangeEdit>, origin: EditOrigin) -> anyhow::Result<()>;

    fn set_selection(&mut self, selection: Selection) -> anyhow::Result<()>;

    /// Switches the buffer to `\n` line endings.
    fn normalize_line_endings(&mut self) {}

    fn line_height(&self) -> f32;

    fn add_marker(&mut self, marker: MarkerSpec);

    fn remove_marker(&mut self, peer: &str) -> bool;

    fn resize_marker(&mut self, peer: &str, height: f32);

    fn add_decoration(&mut self, decoration: DecorationSpec) -> DecorationId;

    fn remove_decoration(&mut self, id: DecorationId) -> bool;

    /// Registers a CSS rule used by decorations. Hosts without styling ignore it.
    fn insert_style_rule(&mut self, _css: String) {}

    fn set_undo_handler(&mut self, _handler: Option<CommandHandler>) {}

    fn set_redo_handler(&mut self, _handler: Option<CommandHandler>) {}
}
