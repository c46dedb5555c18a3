//! Bridges a host editor's native change events and OT operations.
//!
//! Local edit batches become an operation plus its inverse, received
//! operations are replayed without being captured again, and carets and
//! selections map between line/column positions and char offsets.
pub mod adapter;
pub mod buffer;
pub mod coords;
pub mod cursor;
pub mod edit;
pub mod editor;
pub mod error;
pub mod host;
pub mod replay;
pub mod translate;

pub use adapter::{Adapter, AdapterCallbacks, AdapterEvent};
pub use coords::{offset_of, position_of, Position, Snapshot};
pub use cursor::{Cursor, RemoteCursorHandle, Selection};
pub use edit::{ChangeBatch, EditOrigin, RangeEdit};
pub use editor::RopeEditor;
pub use error::{AdapterError, Result};
pub use host::{DocumentView, EditorEvent, HostEditor};
pub use operational_transform::{Operation, OperationSeq};
pub use translate::{translate_batch, Translation};
