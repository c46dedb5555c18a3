//! The adapter façade binding a [`HostEditor`] to OT operations.
//!
//! The host's listener translates content changes synchronously, against the
//! snapshot taken before them, and pushes what the consumer should see to an
//! outbox. [`Adapter::flush`] delivers the outbox in arrival order.
mod events;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use operational_transform::OperationSeq;
use padlink_config::{AdapterConfig, HexColor};

pub use events::{AdapterCallbacks, AdapterEvent};
use events::Pending;

use crate::coords::Snapshot;
use crate::cursor::{
    cursor_from_selection, selection_from_cursor, Cursor, RemoteCursorHandle, RemoteCursorStyle,
    RemoteCursors,
};
use crate::edit::ChangeBatch;
use crate::error::{AdapterError, Result};
use crate::host::{DocumentView, EditorEvent, HostEditor, SubscriptionId};
use crate::replay::{self, Admission, Suppression};
use crate::translate::{translate_batch, Translation};

/// State written by the host listener and read by the façade.
#[derive(Debug)]
struct Shared {
    snapshot: Rc<Snapshot>,
    outbox: VecDeque<Pending>,
    verify: bool,
}

impl Shared {
    fn on_event(&mut self, event: &EditorEvent, view: &dyn DocumentView, gate: &Suppression) {
        match event {
            EditorEvent::ContentChanged(batch) => match gate.admit(batch.origin) {
                Admission::Capture => self.capture(batch, view),
                Admission::Echo => tracing::trace!(edits = batch.edits.len(), "ignored replay echo"),
                Admission::Foreign => {
                    tracing::warn!(edits = batch.edits.len(), "content changed by another source during replay");
                }
            },
            EditorEvent::SelectionChanged => self.push(AdapterEvent::CursorActivity),
            EditorEvent::Focus => self.push(AdapterEvent::Focus),
            EditorEvent::Blur => {
                if view.selection().is_empty() {
                    self.push(AdapterEvent::Blur);
                }
            }
            EditorEvent::ConfigurationChanged => self.outbox.push_back(Pending::Reflow),
        }
    }

    fn push(&mut self, event: AdapterEvent) {
        self.outbox.push_back(Pending::Event(event));
    }

    fn capture(&mut self, batch: &ChangeBatch, view: &dyn DocumentView) {
        let current = view.value();
        let result = self.translate(batch, &current);
        self.snapshot = Rc::new(Snapshot::from_lines(view.lines()));
        match result {
            Ok(Some(Translation { operation, inverse })) => {
                self.push(AdapterEvent::Change { operation, inverse });
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "dropped change batch, snapshot resynced");
                self.outbox.push_back(Pending::Fault(err));
            }
        }
    }

    fn translate(&self, batch: &ChangeBatch, current: &str) -> Result<Option<Translation>> {
        let Some(translation) = translate_batch(&batch.edits, &self.snapshot, current)? else {
            return Ok(None);
        };
        if self.verify {
            let replayed = translation.operation.apply(&self.snapshot.text()).map_err(|_| {
                AdapterError::length(
                    "verifying operation",
                    self.snapshot.len_chars(),
                    translation.operation.base_len(),
                )
            })?;
            if replayed != current {
                return Err(AdapterError::SnapshotDivergence {
                    offset: first_difference(&replayed, current),
                });
            }
        }
        Ok(Some(translation))
    }
}

/// Char offset of the first position where `a` and `b` differ.
fn first_difference(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Connects one host editor to the collaboration controller.
pub struct Adapter<E: HostEditor> {
    editor: E,
    shared: Rc<RefCell<Shared>>,
    gate: Rc<Suppression>,
    remote: RemoteCursors,
    callbacks: Option<Box<dyn AdapterCallbacks>>,
    subscription: SubscriptionId,
    style: RemoteCursorStyle,
}

impl<E: HostEditor> std::fmt::Debug for Adapter<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("shared", &self.shared)
            .field("gate", &self.gate)
            .field("remote", &self.remote)
            .field("subscription", &self.subscription)
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}

impl<E: HostEditor> Adapter<E> {
    /// Attaches with [`AdapterConfig::default`].
    pub fn attach(editor: E) -> Self {
        Self::attach_with_config(editor, &AdapterConfig::default())
    }

    pub fn attach_with_config(mut editor: E, config: &AdapterConfig) -> Self {
        if config.normalize_line_endings {
            editor.normalize_line_endings();
        }

        let snapshot = Rc::new(Snapshot::from_lines(editor.lines()));
        tracing::debug!(
            lines = snapshot.line_count(),
            len = snapshot.len_chars(),
            "attaching adapter"
        );
        let shared = Rc::new(RefCell::new(Shared {
            snapshot,
            outbox: VecDeque::new(),
            verify: config.verify_snapshots,
        }));
        let gate = Suppression::new();

        let listener_shared = Rc::clone(&shared);
        let listener_gate = Rc::clone(&gate);
        let subscription = editor.subscribe(Box::new(move |event, view| {
            listener_shared
                .borrow_mut()
                .on_event(event, view, &listener_gate);
        }));

        Self {
            editor,
            shared,
            gate,
            remote: RemoteCursors::new(),
            callbacks: None,
            subscription,
            style: RemoteCursorStyle {
                caret_width_px: config.caret_width_px,
                selection_alpha: config.selection_alpha,
            },
        }
    }

    /// Unsubscribes, removes peer cursors and command handlers, and returns
    /// the editor.
    pub fn detach(self) -> E {
        let Self {
            mut editor,
            mut remote,
            subscription,
            ..
        } = self;
        if !editor.unsubscribe(subscription) {
            tracing::warn!(subscription, "adapter listener was already gone");
        }
        let peers = remote.len();
        remote.clear_all(&mut editor);
        editor.set_undo_handler(None);
        editor.set_redo_handler(None);
        tracing::debug!(peers, "adapter detached");
        editor
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    /// Direct access to the host. Changes made through it are captured like
    /// any user edit.
    pub fn editor_mut(&mut self) -> &mut E {
        &mut self.editor
    }

    /// The document as of the last translation or replay.
    pub fn snapshot(&self) -> Rc<Snapshot> {
        Rc::clone(&self.shared.borrow().snapshot)
    }

    pub fn get_value(&self) -> String {
        self.editor.value()
    }

    /// The local selection in offsets.
    pub fn get_cursor(&self) -> Result<Cursor> {
        let selection = self.editor.selection();
        cursor_from_selection(&self.snapshot(), selection)
    }

    pub fn set_cursor(&mut self, cursor: Cursor) -> Result<()> {
        let selection = selection_from_cursor(&self.snapshot(), cursor)?;
        self.editor.set_selection(selection)?;
        Ok(())
    }

    /// Shows `peer`'s caret or selection, replacing what it showed before.
    pub fn set_other_cursor(
        &mut self,
        cursor: Cursor,
        color: HexColor,
        peer: &str,
    ) -> Result<RemoteCursorHandle> {
        let snapshot = self.snapshot();
        self.remote
            .show(&mut self.editor, &snapshot, cursor, color, peer, self.style)
    }

    /// Returns false if `handle` is stale or was already cleared.
    pub fn clear_other_cursor(&mut self, handle: &RemoteCursorHandle) -> bool {
        self.remote.clear(&mut self.editor, handle)
    }

    /// Replays `operation` into the editor without reporting it as a change.
    ///
    /// # Errors
    ///
    /// `LengthMismatch` if the operation was not built against the current
    /// document, `ForeignMutation` if something else edited the buffer during
    /// the replay. The snapshot is refreshed from the editor in every case.
    pub fn apply_operation(&mut self, operation: &OperationSeq) -> Result<()> {
        let expected = self.shared.borrow().snapshot.len_chars();
        let result = replay::replay(&mut self.editor, &self.gate, operation, expected);
        let snapshot = Rc::new(Snapshot::from_lines(self.editor.lines()));
        self.shared.borrow_mut().snapshot = snapshot;
        result
    }

    /// The operation undoing `operation`, which must apply to the current
    /// document.
    pub fn invert_operation(&self, operation: &OperationSeq) -> Result<OperationSeq> {
        let value = self.editor.value();
        let len = value.chars().count();
        if operation.base_len() != len {
            return Err(AdapterError::length(
                "inverted operation base",
                len,
                operation.base_len(),
            ));
        }
        Ok(operation.invert(&value))
    }

    pub fn register_callbacks(&mut self, callbacks: impl AdapterCallbacks + 'static) {
        self.callbacks = Some(Box::new(callbacks));
    }

    /// Routes the editor's undo command to `handler`.
    pub fn register_undo(&mut self, handler: impl FnMut() + 'static) {
        self.editor.set_undo_handler(Some(Box::new(handler)));
    }

    /// Routes the editor's redo command to `handler`.
    pub fn register_redo(&mut self, handler: impl FnMut() + 'static) {
        self.editor.set_redo_handler(Some(Box::new(handler)));
    }

    /// Delivers queued events to the registered callbacks in arrival order
    /// and performs queued reflows.
    ///
    /// Delivery stops at the first fault. Events queued after that fault stay
    /// queued until the next call, so a consumer always learns about a dropped
    /// batch before it sees the changes that followed it.
    ///
    /// # Errors
    ///
    /// Returns the oldest fault recorded while handling host notifications.
    /// Later faults are returned by later calls, one per call.
    pub fn flush(&mut self) -> Result<()> {
        while let Some(pending) = self.next_pending() {
            match pending {
                Pending::Reflow => self.remote.reflow(&mut self.editor),
                Pending::Event(event) => match self.callbacks.as_mut() {
                    Some(callbacks) => event.dispatch(callbacks.as_mut()),
                    None => tracing::trace!(?event, "no callbacks registered"),
                },
                Pending::Fault(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Takes queued events without dispatching them. Reflows still run.
    ///
    /// Stops at the first fault and leaves it, and everything after it, for
    /// [`flush`](Self::flush).
    pub fn drain_events(&mut self) -> Vec<AdapterEvent> {
        let mut events = Vec::new();
        while let Some(pending) = self.next_pending() {
            match pending {
                Pending::Reflow => self.remote.reflow(&mut self.editor),
                Pending::Event(event) => events.push(event),
                fault @ Pending::Fault(_) => {
                    self.shared.borrow_mut().outbox.push_front(fault);
                    break;
                }
            }
        }
        events
    }

    /// Replay notifications ignored so far.
    pub fn suppressed_echoes(&self) -> usize {
        self.gate.echoes()
    }

    fn next_pending(&self) -> Option<Pending> {
        self.shared.borrow_mut().outbox.pop_front()
    }
}

impl RemoteCursorHandle {
    /// Removes the artifact this handle created. Same as
    /// [`Adapter::clear_other_cursor`].
    pub fn clear<E: HostEditor>(&self, adapter: &mut Adapter<E>) -> bool {
        adapter.clear_other_cursor(self)
    }
}
