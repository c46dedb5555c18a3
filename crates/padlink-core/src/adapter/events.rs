//! Consumer-facing notifications and the queue they wait in until `flush`.
use operational_transform::OperationSeq;

use crate::error::AdapterError;

/// What the adapter reports to the collaboration controller.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterEvent {
    /// A local batch was translated.
    Change {
        operation: OperationSeq,
        inverse: OperationSeq,
    },
    CursorActivity,
    Focus,
    Blur,
}

/// Receiver for [`AdapterEvent`]s. Every method defaults to a no-op.
pub trait AdapterCallbacks {
    fn on_change(&mut self, _operation: &OperationSeq, _inverse: &OperationSeq) {}

    fn on_cursor_activity(&mut self) {}

    fn on_focus(&mut self) {}

    fn on_blur(&mut self) {}
}

impl AdapterEvent {
    pub(crate) fn dispatch(&self, callbacks: &mut dyn AdapterCallbacks) {
        match self {
            Self::Change { operation, inverse } => callbacks.on_change(operation, inverse),
            Self::CursorActivity => callbacks.on_cursor_activity(),
            Self::Focus => callbacks.on_focus(),
            Self::Blur => callbacks.on_blur(),
        }
    }
}

/// An outbox entry.
#[derive(Debug)]
pub(crate) enum Pending {
    Event(AdapterEvent),
    /// Line metrics changed; peer markers need resizing.
    Reflow,
    /// A local batch that could not be translated.
    Fault(AdapterError),
}
