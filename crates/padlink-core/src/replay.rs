//! Replaying operations into the host buffer without re-capturing them.
use std::cell::Cell;
use std::rc::Rc;

use operational_transform::{Operation, OperationSeq};

use crate::coords::Snapshot;
use crate::edit::{EditOrigin, RangeEdit, ReplayToken};
use crate::error::{AdapterError, Result};
use crate::host::HostEditor;

/// How a content notification should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// No replay in progress: translate it.
    Capture,
    /// Caused by the replay currently holding the gate: ignore it.
    Echo,
    /// Arrived during a replay from some other source.
    Foreign,
}

/// Single-holder gate suppressing change capture while a replay runs.
#[derive(Debug, Default)]
pub struct Suppression {
    holder: Cell<Option<ReplayToken>>,
    issued: Cell<u64>,
    echoes: Cell<usize>,
    /// Foreign batches seen by the current holder.
    foreign: Cell<usize>,
}

impl Suppression {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Takes the gate for one replay. Released when the guard drops.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::ReentrantReplay`] if the gate is already held.
    pub fn acquire(self: &Rc<Self>) -> Result<SuppressionGuard> {
        if self.holder.get().is_some() {
            return Err(AdapterError::ReentrantReplay);
        }
        let token = ReplayToken::new(self.issued.get());
        self.issued.set(self.issued.get() + 1);
        self.holder.set(Some(token));
        self.foreign.set(0);
        Ok(SuppressionGuard {
            gate: Rc::clone(self),
            token,
        })
    }

    pub fn is_active(&self) -> bool {
        self.holder.get().is_some()
    }

    /// Classifies a content notification by its origin.
    pub fn admit(&self, origin: EditOrigin) -> Admission {
        match (self.holder.get(), origin) {
            (None, _) => Admission::Capture,
            (Some(held), EditOrigin::Replay(token)) if held == token => {
                self.echoes.set(self.echoes.get() + 1);
                Admission::Echo
            }
            (Some(_), _) => {
                self.foreign.set(self.foreign.get() + 1);
                Admission::Foreign
            }
        }
    }

    /// Number of replay echoes ignored so far.
    pub fn echoes(&self) -> usize {
        self.echoes.get()
    }
}

/// Proof of holding the [`Suppression`] gate.
#[derive(Debug)]
pub struct SuppressionGuard {
    gate: Rc<Suppression>,
    token: ReplayToken,
}

impl SuppressionGuard {
    pub fn token(&self) -> ReplayToken {
        self.token
    }

    /// Foreign content batches admitted while this guard was held.
    pub fn foreign(&self) -> usize {
        self.gate.foreign.get()
    }
}

impl Drop for SuppressionGuard {
    fn drop(&mut self) {
        self.gate.holder.set(None);
    }
}

/// Applies `operation` to the host as a sequence of primitive edits.
///
/// `expected_len` is the length of the document the operation was built
/// against. Positions are re-derived from the live buffer before every edit.
///
/// # Errors
///
/// Fails without touching the buffer if the operation's base length is not
/// `expected_len`. Returns [`AdapterError::ForeignMutation`] after the replay
/// if another source changed the buffer while it ran.
pub fn replay<E: HostEditor + ?Sized>(
    editor: &mut E,
    gate: &Rc<Suppression>,
    operation: &OperationSeq,
    expected_len: usize,
) -> Result<()> {
    if operation.base_len() != expected_len {
        return Err(AdapterError::length(
            "replayed operation base",
            expected_len,
            operation.base_len(),
        ));
    }

    let guard = gate.acquire()?;
    let origin = EditOrigin::Replay(guard.token());
    let mut index = 0usize;

    for op in operation.ops() {
        match op {
            Operation::Retain(n) => index += *n as usize,
            Operation::Insert(text) => {
                let at = Snapshot::from_lines(editor.lines()).position_of(index)?;
                tracing::trace!(index, %at, "replay insert");
                editor.apply_edits(vec![RangeEdit::insert(at, text.clone())], origin)?;
                index += text.chars().count();
            }
            Operation::Delete(n) => {
                let live = Snapshot::from_lines(editor.lines());
                let start = live.position_of(index)?;
                let end = live.position_of(index + *n as usize)?;
                tracing::trace!(index, len = *n, "replay delete");
                editor.apply_edits(vec![RangeEdit::delete(start, end)], origin)?;
            }
        }
    }

    let foreign = guard.foreign();
    drop(guard);
    if foreign > 0 {
        tracing::warn!(batches = foreign, "buffer changed by another source during replay");
        return Err(AdapterError::ForeignMutation { batches: foreign });
    }
    tracing::debug!(
        steps = operation.ops().len(),
        target_len = operation.target_len(),
        "replayed operation"
    );
    Ok(())
}
