//! Text notation for operations and range edits on the command line.
//!
//! Operations are comma-separated steps: `r5` retains, `d3` deletes and
//! `i"HI"` inserts. Edits are `L:C-L:C=TEXT`, or `L:C=TEXT` for an insertion.
//! Quoted and edit text understand `\n`, `\t`, `\"` and `\\`.
use anyhow::{bail, Context, Result};
use operational_transform::{Operation, OperationSeq};
use padlink_core::{Position, RangeEdit};

/// Parses `r5,i"HI",d3`.
pub fn parse_operation(input: &str) -> Result<OperationSeq> {
    let mut op = OperationSeq::default();
    let mut chars = input.trim().chars().peekable();

    while let Some(kind) = chars.next() {
        match kind {
            'r' | 'd' => {
                let mut digits = String::new();
                while let Some(c) = chars.next_if(char::is_ascii_digit) {
                    digits.push(c);
                }
                let n: u64 = digits
                    .parse()
                    .with_context(|| format!("expected a count after '{kind}'"))?;
                if kind == 'r' {
                    op.retain(n);
                } else {
                    op.delete(n);
                }
            }
            'i' => {
                if chars.next() != Some('"') {
                    bail!("expected '\"' after 'i'");
                }
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => text.push(unescape(chars.next())?),
                        Some(c) => text.push(c),
                        None => bail!("unterminated insert text"),
                    }
                }
                op.insert(&text);
            }
            c => bail!("unknown step '{c}'"),
        }
        match chars.next() {
            None => break,
            Some(',') => {}
            Some(c) => bail!("expected ',' between steps, found '{c}'"),
        }
    }
    Ok(op)
}

/// Renders `op` in the notation [`parse_operation`] reads.
pub fn format_operation(op: &OperationSeq) -> String {
    op.ops()
        .iter()
        .map(|step| match step {
            Operation::Retain(n) => format!("r{n}"),
            Operation::Delete(n) => format!("d{n}"),
            Operation::Insert(text) => format!("i\"{}\"", escape(text)),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Parses `L:C-L:C=TEXT` or `L:C=TEXT`.
pub fn parse_edit(input: &str) -> Result<RangeEdit> {
    let (range, text) = input
        .split_once('=')
        .with_context(|| format!("edit '{input}' is missing '=TEXT'"))?;
    let text = unescape_all(text)?;
    match range.split_once('-') {
        Some((start, end)) => Ok(RangeEdit::new(
            parse_position(start)?,
            parse_position(end)?,
            text,
        )),
        None => Ok(RangeEdit::insert(parse_position(range)?, text)),
    }
}

fn parse_position(input: &str) -> Result<Position> {
    let (line, column) = input
        .trim()
        .split_once(':')
        .with_context(|| format!("position '{input}' is not LINE:COLUMN"))?;
    let line = line
        .parse()
        .with_context(|| format!("bad line in '{input}'"))?;
    let column = column
        .parse()
        .with_context(|| format!("bad column in '{input}'"))?;
    Ok(Position::new(line, column))
}

fn unescape(c: Option<char>) -> Result<char> {
    Ok(match c {
        Some('n') => '\n',
        Some('t') => '\t',
        Some('"') => '"',
        Some('\\') => '\\',
        Some(other) => bail!("unknown escape '\\{other}'"),
        None => bail!("dangling '\\'"),
    })
}

fn unescape_all(input: &str) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.push(unescape(chars.next())?);
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out
}
