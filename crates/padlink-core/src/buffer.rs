//! Rope storage for [`RopeEditor`](crate::editor::RopeEditor).
//!
//! Ropey is built without its CR and Unicode line-break features, so `\n` is
//! the only line separator. This keeps line numbers in step with [`Snapshot`]
//! and the joined-with-`\n` offset space of operations.
//!
//! [`Snapshot`]: crate::coords::Snapshot
use std::fmt;

use anyhow::{bail, Result};
use ropey::Rope;

use crate::coords::Position;

/// Editable text addressed by char index or 1-indexed [`Position`].
#[derive(Debug, Clone)]
pub struct TextBuffer {
    rope: Rope,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self { rope: Rope::new() }
    }
}

impl From<&str> for TextBuffer {
    fn from(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }
}

impl fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Every line without its `\n`.
    pub fn lines(&self) -> Vec<String> {
        self.rope
            .lines()
            .map(|line| {
                let mut text = line.to_string();
                if text.ends_with('\n') {
                    text.pop();
                }
                text
            })
            .collect()
    }

    /// Char index of `pos`. Columns run from 1 to one past the last char.
    ///
    /// # Errors
    ///
    /// Fails for a zero line or column, a missing line, or a column past the
    /// end of its line.
    pub fn position_to_char(&self, pos: Position) -> Result<usize> {
        if pos.line == 0 || pos.column == 0 {
            bail!("position {pos} is not 1-indexed");
        }
        let line = pos.line - 1;
        self.check_line(line)?;
        let len = self.line_len(line);
        if pos.column - 1 > len {
            bail!("column {} past end of line {} ({len} chars)", pos.column, pos.line);
        }
        Ok(self.rope.line_to_char(line) + pos.column - 1)
    }

    /// Position of a char index. An index on a `\n` is the end of its line.
    ///
    /// # Errors
    ///
    /// Fails if `char_idx` is past the end of the buffer.
    pub fn char_to_position(&self, char_idx: usize) -> Result<Position> {
        if char_idx > self.rope.len_chars() {
            bail!(
                "char index {char_idx} out of bounds (buffer has {} chars)",
                self.rope.len_chars()
            );
        }
        let line = self.rope.char_to_line(char_idx);
        let column = char_idx - self.rope.line_to_char(line) + 1;
        Ok(Position::new(line + 1, column))
    }

    /// Replaces the chars `[start, end)` with `text`.
    ///
    /// # Errors
    ///
    /// Fails, leaving the buffer untouched, on a reversed or out-of-bounds range.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) -> Result<()> {
        if start > end {
            bail!("invalid range: start ({start}) > end ({end})");
        }
        if end > self.rope.len_chars() {
            bail!(
                "range end {end} out of bounds (buffer has {} chars)",
                self.rope.len_chars()
            );
        }
        self.rope.remove(start..end);
        self.rope.insert(start, text);
        Ok(())
    }

    /// Rewrites `\r\n` and lone `\r` as `\n`. Returns true if anything changed.
    pub fn normalize_line_endings(&mut self) -> bool {
        let text = self.to_string();
        if !text.contains('\r') {
            return false;
        }
        self.rope = Rope::from_str(&text.replace("\r\n", "\n").replace('\r', "\n"));
        true
    }

    fn check_line(&self, line_idx: usize) -> Result<()> {
        if line_idx >= self.rope.len_lines() {
            bail!(
                "line index {line_idx} out of bounds (buffer has {} lines)",
                self.rope.len_lines()
            );
        }
        Ok(())
    }

    fn line_len(&self, line_idx: usize) -> usize {
        let line = self.rope.line(line_idx);
        let len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }
}
