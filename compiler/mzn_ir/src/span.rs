//! Source locations.
//!
//! A span records the file it came from (as an interned [`Name`]) plus the
//! one-based line and column of its first and last character. Diagnostics
//! print spans as `line.col`, which is also how shadowing warnings refer to
//! the earlier binding.

use std::fmt;

use crate::Name;

/// Source location span.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub file: Name,
    pub line: u32,
    pub col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    /// Span for generated code with no source position.
    pub const DUMMY: Span = Span {
        file: Name::EMPTY,
        line: 0,
        col: 0,
        end_line: 0,
        end_col: 0,
    };

    /// Create a span covering `line.col` to `end_line.end_col`.
    #[inline]
    pub const fn new(file: Name, line: u32, col: u32, end_line: u32, end_col: u32) -> Self {
        Span {
            file,
            line,
            col,
            end_line,
            end_col,
        }
    }

    /// A zero-width span at `line.col`.
    #[inline]
    pub const fn point(file: Name, line: u32, col: u32) -> Self {
        Span::new(file, line, col, line, col)
    }

    /// Whether this span was introduced by the compiler.
    #[inline]
    pub const fn is_dummy(&self) -> bool {
        self.line == 0
    }

    /// Smallest span containing both.
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        if self.is_dummy() {
            return other;
        }
        if other.is_dummy() {
            return self;
        }
        let (line, col) = (self.line, self.col).min((other.line, other.col));
        let (end_line, end_col) = (self.end_line, self.end_col).max((other.end_line, other.end_col));
        Span::new(self.file, line, col, end_line, end_col)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}-{}.{}",
            self.line, self.col, self.end_line, self.end_col
        )
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.line, self.col)
    }
}
