/// Conversion between char offsets and 1-indexed line/column positions.
///
/// An offset counts the characters preceding a position when all lines are
/// joined with a single `\n`. Out-of-range input is an error, never clamped.
use std::cmp::Ordering;
use std::fmt;

use crate::error::{AdapterError, Result};

/// A position in the document. Both fields are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then(self.column.cmp(&other.column))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The document's line contents at a point in time.
///
/// Built once and never mutated; a newer state is a new snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    lines: Vec<String>,
    /// Offset of the first char of each line.
    line_starts: Vec<usize>,
    /// Length of each line in chars.
    line_lens: Vec<usize>,
    len: usize,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::from_lines(Vec::new())
    }
}

impl Snapshot {
    /// Builds a snapshot from lines without their separators.
    /// An empty list is treated as a single empty line.
    pub fn from_lines(mut lines: Vec<String>) -> Self {
        if lines.is_empty() {
            lines.push(String::new());
        }
        let mut line_starts = Vec::with_capacity(lines.len());
        let mut line_lens = Vec::with_capacity(lines.len());
        let mut offset = 0;
        for line in &lines {
            let len = line.chars().count();
            line_starts.push(offset);
            line_lens.push(len);
            offset += len + 1;
        }
        Self {
            lines,
            line_starts,
            line_lens,
            len: offset - 1,
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::from_lines(text.split('\n').map(str::to_owned).collect())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total length in chars, newlines included.
    pub fn len_chars(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The full text, lines joined with `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Offset of `pos`. Valid columns run from 1 to one past the line's last char.
    pub fn offset_of(&self, pos: Position) -> Result<usize> {
        let out_of_bounds = || AdapterError::PositionOutOfBounds {
            position: pos,
            lines: self.lines.len(),
        };
        if pos.line == 0 || pos.column == 0 || pos.line > self.lines.len() {
            return Err(out_of_bounds());
        }
        let idx = pos.line - 1;
        if pos.column - 1 > self.line_lens[idx] {
            return Err(out_of_bounds());
        }
        Ok(self.line_starts[idx] + pos.column - 1)
    }

    /// Position of `offset`. An offset on a line break maps to the end of that line.
    pub fn position_of(&self, offset: usize) -> Result<Position> {
        if offset > self.len {
            return Err(AdapterError::OffsetOutOfBounds {
                offset,
                len: self.len,
            });
        }
        // line_starts[0] == 0, so the partition point is at least 1
        let idx = self.line_starts.partition_point(|&start| start <= offset) - 1;
        Ok(Position::new(idx + 1, offset - self.line_starts[idx] + 1))
    }

    /// Text of the char range `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<String> {
        if start > end {
            return Err(AdapterError::InvalidRange { start, end });
        }
        let from = self.position_of(start)?;
        let to = self.position_of(end)?;
        let mut out = String::new();
        for line in from.line..=to.line {
            let idx = line - 1;
            let first = if line == from.line { from.column - 1 } else { 0 };
            let last = if line == to.line {
                to.column - 1
            } else {
                self.line_lens[idx]
            };
            out.extend(self.lines[idx].chars().skip(first).take(last - first));
            if line != to.line {
                out.push('\n');
            }
        }
        Ok(out)
    }
}

/// Offset of `pos` within `snapshot`.
pub fn offset_of(snapshot: &Snapshot, pos: Position) -> Result<usize> {
    snapshot.offset_of(pos)
}

/// Position of `offset` within `snapshot`.
pub fn position_of(snapshot: &Snapshot, offset: usize) -> Result<Position> {
    snapshot.position_of(offset)
}
