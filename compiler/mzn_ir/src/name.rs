//! Interned identifier.

use std::fmt;

/// Interned string handle.
///
/// Two names are equal exactly when their strings are equal, so identifier
/// comparison during scope lookup and overload resolution is an integer
/// compare. Resolve the text through [`StringInterner::lookup`](crate::StringInterner::lookup).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// Pre-interned empty string. Also used for anonymous declarations.
    pub const EMPTY: Name = Name(0);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Name(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}
