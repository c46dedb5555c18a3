/// Range edits as reported by the host editor.
use crate::coords::Position;

/// Replaces the half-open span `[start, end)` of the old buffer with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeEdit {
    pub start: Position,
    pub end: Position,
    pub text: String,
}

impl RangeEdit {
    pub fn new(start: Position, end: Position, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// A zero-width edit inserting `text` at `at`.
    pub fn insert(at: Position, text: impl Into<String>) -> Self {
        Self::new(at, at, text)
    }

    /// An edit removing `[start, end)`.
    pub fn delete(start: Position, end: Position) -> Self {
        Self::new(start, end, String::new())
    }

    pub fn is_deletion(&self) -> bool {
        self.text.is_empty()
    }
}

/// Identifies one replay; edits tagged with it are echoes of that replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplayToken(u64);

impl ReplayToken {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Who asked the host to mutate its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditOrigin {
    /// Typing, paste, or any other local change.
    #[default]
    User,
    /// An operation being replayed into the buffer.
    Replay(ReplayToken),
}

/// All edits delivered by one native change notification.
///
/// Every range is expressed in the coordinates of the document as it was
/// before the batch, as produced by one atomic multi-range edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    pub edits: Vec<RangeEdit>,
    pub origin: EditOrigin,
}

impl ChangeBatch {
    pub fn new(edits: Vec<RangeEdit>, origin: EditOrigin) -> Self {
        Self { edits, origin }
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}
