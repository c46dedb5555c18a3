//! Edit-batch translation: native range edits to an operation and its inverse.
//!
//! The host applies a batch bottom-to-top, so each edit's range stays valid in
//! the prior document. Walking the edits top-to-bottom and prepending each
//! single-edit operation to the accumulator keeps every range in prior
//! coordinates, and the inverse is built in the opposite order.
use operational_transform::OperationSeq;

use crate::coords::Snapshot;
use crate::edit::RangeEdit;
use crate::error::{AdapterError, Result};

/// The forward operation of a batch and the operation that undoes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    /// Transforms the prior document into the current one.
    pub operation: OperationSeq,
    /// Transforms the current document back into the prior one.
    pub inverse: OperationSeq,
}

/// An edit resolved to prior-snapshot offsets.
#[derive(Debug)]
struct LocatedEdit<'a> {
    start: usize,
    end: usize,
    /// Report order within the batch, used to break ties.
    index: usize,
    text: &'a str,
}

/// Translates one batch of edits.
///
/// `prior` is the snapshot taken before the batch was applied and `current`
/// the host's full text afterwards. Returns `None` for an empty batch.
///
/// # Errors
///
/// Fails on positions outside `prior`, on overlapping edits, and when the
/// composed operations disagree with the prior or current lengths.
pub fn translate_batch(
    edits: &[RangeEdit],
    prior: &Snapshot,
    current: &str,
) -> Result<Option<Translation>> {
    if edits.is_empty() {
        return Ok(None);
    }

    let mut located = locate(edits, prior)?;
    located.sort_by_key(|e| (e.start, e.end, e.index));
    for pair in located.windows(2) {
        if pair[0].end > pair[1].start {
            return Err(AdapterError::OverlappingEdits {
                first_start: pair[0].start,
                first_end: pair[0].end,
                second_start: pair[1].start,
                second_end: pair[1].end,
            });
        }
    }

    let prior_len = prior.len_chars();
    let current_len = current.chars().count();

    // Length of the document right after the edit being processed.
    let mut doc_len = current_len;
    let mut operation = identity(current_len);
    let mut inverse = identity(current_len);

    for edit in &located {
        let deleted = prior.slice(edit.start, edit.end)?;
        let deleted_len = edit.end - edit.start;
        let inserted_len = edit.text.chars().count();
        let head = edit.start + inserted_len;
        let rest = doc_len
            .checked_sub(head)
            .ok_or_else(|| AdapterError::length("trailing retain", head, doc_len))?;

        let mut forward = OperationSeq::default();
        forward.retain(edit.start as u64);
        forward.delete(deleted_len as u64);
        forward.insert(edit.text);
        forward.retain(rest as u64);

        let mut backward = OperationSeq::default();
        backward.retain(edit.start as u64);
        backward.delete(inserted_len as u64);
        backward.insert(&deleted);
        backward.retain(rest as u64);

        operation = forward.compose(&operation).map_err(|_| {
            AdapterError::length("composing operation", operation.base_len(), forward.target_len())
        })?;
        inverse = inverse.compose(&backward).map_err(|_| {
            AdapterError::length("composing inverse", inverse.target_len(), backward.base_len())
        })?;

        doc_len = doc_len + deleted_len - inserted_len;
        tracing::trace!(
            start = edit.start,
            deleted = deleted_len,
            inserted = inserted_len,
            "translated edit"
        );
    }

    check_len("operation base", prior_len, operation.base_len())?;
    check_len("operation target", current_len, operation.target_len())?;
    check_len("inverse base", current_len, inverse.base_len())?;
    check_len("inverse target", prior_len, inverse.target_len())?;

    tracing::debug!(
        edits = located.len(),
        prior_len,
        current_len,
        "translated change batch"
    );
    Ok(Some(Translation { operation, inverse }))
}

fn locate<'a>(edits: &'a [RangeEdit], prior: &Snapshot) -> Result<Vec<LocatedEdit<'a>>> {
    edits
        .iter()
        .enumerate()
        .map(|(index, edit)| {
            let start = prior.offset_of(edit.start)?;
            let end = prior.offset_of(edit.end)?;
            if start > end {
                return Err(AdapterError::InvalidRange { start, end });
            }
            Ok(LocatedEdit {
                start,
                end,
                index,
                text: &edit.text,
            })
        })
        .collect()
}

fn identity(len: usize) -> OperationSeq {
    let mut op = OperationSeq::default();
    op.retain(len as u64);
    op
}

fn check_len(context: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        tracing::warn!(context, expected, actual, "length invariant violated");
        return Err(AdapterError::length(context, expected, actual));
    }
    Ok(())
}
