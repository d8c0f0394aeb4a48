//! Source text positions and ranges.
//!
//! Offsets are UTF-8 byte offsets ([`TextSize`]); ranges are half-open
//! ([`TextRange`]). Line/column positions come in two flavours:
//!
//! - [`LineCol`] is the normalized, 0-based form used for all arithmetic.
//! - [`Position`] carries the caller's convention (0- or 1-based) and is
//!   normalized with [`Position::to_line_col`] before use.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

pub use text_size::TextRange;
pub use text_size::TextSize;

/// A line and column position in source text.
///
/// Both line and column are 0-indexed internally, but displayed as 1-indexed.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct LineCol {
    /// 0-indexed line number
    pub line: u32,
    /// 0-indexed column (in UTF-8 bytes, not characters)
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Create from 1-indexed line and column (as displayed to users).
    #[inline]
    pub const fn from_one_indexed(line: u32, col: u32) -> Self {
        Self {
            line: line.saturating_sub(1),
            col: col.saturating_sub(1),
        }
    }
}

impl fmt::Debug for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

/// Which numbering convention a [`Position`] was created with.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PositionOrigin {
    ZeroBased,
    OneBased,
}

/// A line/column position in the caller's numbering convention.
///
/// Editors speak 0-based positions, evaluation engines usually report
/// 1-based ones. Comparisons and conversions always go through the
/// normalized [`LineCol`].
#[derive(Copy, Clone, Debug)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub origin: PositionOrigin,
}

impl Position {
    pub const fn zero_based(line: u32, column: u32) -> Self {
        Self {
            line,
            column,
            origin: PositionOrigin::ZeroBased,
        }
    }

    pub const fn one_based(line: u32, column: u32) -> Self {
        Self {
            line,
            column,
            origin: PositionOrigin::OneBased,
        }
    }

    /// Normalize to a 0-based [`LineCol`].
    pub const fn to_line_col(self) -> LineCol {
        match self.origin {
            PositionOrigin::ZeroBased => LineCol::new(self.line, self.column),
            PositionOrigin::OneBased => LineCol::from_one_indexed(self.line, self.column),
        }
    }

    pub const fn to_zero_based(self) -> Self {
        let lc = self.to_line_col();
        Self::zero_based(lc.line, lc.col)
    }

    pub const fn to_one_based(self) -> Self {
        let lc = self.to_line_col();
        Self::one_based(lc.line + 1, lc.col + 1)
    }
}

impl From<LineCol> for Position {
    fn from(lc: LineCol) -> Self {
        Self::zero_based(lc.line, lc.col)
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.to_line_col() == other.to_line_col()
    }
}

impl Eq for Position {}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_line_col().cmp(&other.to_line_col())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_line_col().fmt(f)
    }
}

/// A half-open range of positions. `start <= end` always holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: impl Into<Position>, end: impl Into<Position>) -> Self {
        let (start, end) = (start.into(), end.into());
        if end < start {
            Self { start: end, end: start }
        } else {
            Self { start, end }
        }
    }

    pub fn empty(at: impl Into<Position>) -> Self {
        let at = at.into();
        Self { start: at, end: at }
    }

    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A position that does not address any character of the buffer.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PositionError {
    #[error("line {line} is out of range (document has {line_count} lines)")]
    LineOutOfRange { line: u32, line_count: u32 },
    #[error("column {col} is out of range for line {line} (max {max})")]
    ColumnOutOfRange { line: u32, col: u32, max: u32 },
}

/// Index for converting between byte offsets and line/column positions.
///
/// Built once per text version and never patched: a new text means a new
/// index. `\r\n`, `\n` and a lone `\r` each terminate exactly one line.
#[derive(Clone, Debug)]
pub struct LineIndex {
    /// Byte offset of the start of each line
    line_starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    /// Build a line index from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        let bytes = text.as_bytes();

        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                    line_starts.push(TextSize::from((i + 2) as u32));
                    i += 2;
                    continue;
                }
                b'\r' | b'\n' => line_starts.push(TextSize::from((i + 1) as u32)),
                _ => {}
            }
            i += 1;
        }

        Self {
            line_starts,
            len: TextSize::of(text),
        }
    }

    /// Number of lines; an empty text still has one (empty) line.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Length of the indexed text.
    pub fn len(&self) -> TextSize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == TextSize::from(0)
    }

    /// Clamp an offset into `0..=len`.
    pub fn clamp(&self, offset: TextSize) -> TextSize {
        offset.min(self.len)
    }

    /// Convert a byte offset to a line/column position.
    ///
    /// Offsets past the end of the text clamp to the last position.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let offset = self.clamp(offset);
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);

        let col = offset - self.line_starts[line];
        LineCol {
            line: line as u32,
            col: col.into(),
        }
    }

    /// Convert a byte offset to a 0-based [`Position`].
    pub fn position(&self, offset: TextSize) -> Position {
        self.line_col(offset).into()
    }

    /// Convert a line/column position to a byte offset.
    pub fn offset(&self, position: impl Into<Position>) -> Result<TextSize, PositionError> {
        let LineCol { line, col } = position.into().to_line_col();
        let line_count = self.line_starts.len() as u32;
        let Some(&start) = self.line_starts.get(line as usize) else {
            return Err(PositionError::LineOutOfRange { line, line_count });
        };

        // A column may address the line terminator, but never the next line.
        let max = match self.line_starts.get(line as usize + 1) {
            Some(&next) => u32::from(next - start) - 1,
            None => u32::from(self.len - start),
        };
        if col > max {
            return Err(PositionError::ColumnOutOfRange { line, col, max });
        }

        Ok(start + TextSize::from(col))
    }

    /// Convert a byte range to a position range.
    pub fn range(&self, range: TextRange) -> Range {
        Range::new(self.position(range.start()), self.position(range.end()))
    }

    /// Convert a position range to a byte range.
    pub fn text_range(&self, range: Range) -> Result<TextRange, PositionError> {
        let start = self.offset(range.start)?;
        let end = self.offset(range.end)?;
        Ok(TextRange::new(start.min(end), start.max(end)))
    }

    /// Move the start of `range` `count` bytes to the left, stopping at the
    /// start of the document.
    pub fn extend_range_left(&self, range: Range, count: u32) -> Range {
        let start = match self.offset(range.start) {
            Ok(offset) => offset,
            Err(_) => self.len,
        };
        let start = TextSize::from(u32::from(start).saturating_sub(count));
        Range::new(self.position(start), range.end)
    }
}
