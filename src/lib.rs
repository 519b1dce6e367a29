#![allow(clippy::module_inception)]

use std::fmt::Display;

pub mod api_map;
pub mod chain;
pub mod complex_type;
pub mod errors;
pub mod macros;
pub mod pin;
pub mod source_map;
pub mod tree;
pub mod type_checker;

extern crate regex;

/// A zero-indexed line/column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open source range. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Range { start, end }
    }

    pub fn from_to(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Range {
            start: Position::new(start_line, start_column),
            end: Position::new(end_line, end_column),
        }
    }

    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position < self.end
    }
}

/// A range inside a named file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub filename: String,
    pub range: Range,
}

impl Location {
    pub fn new(filename: impl Into<String>, range: Range) -> Self {
        Location {
            filename: filename.into(),
            range,
        }
    }

    pub fn contains(&self, filename: &str, position: Position) -> bool {
        self.filename == filename && self.range.contains(position)
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.filename, self.range.start)
    }
}

/// Converts a byte offset into `text` to a line/column position.
///
/// Offsets past the end of the text clamp to the final position.
pub fn position_at_offset(text: &str, offset: usize) -> Position {
    let mut line = 0;
    let mut column = 0;

    for (index, c) in text.char_indices() {
        if index >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
    }

    Position::new(line, column)
}
