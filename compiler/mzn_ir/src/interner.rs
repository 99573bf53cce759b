//! String interner for identifiers and string literals.
//!
//! Strings are leaked once and handed out as `&'static str`, so a looked-up
//! name can be held across later mutations of the model.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::Name;

#[derive(Default)]
struct InternTable {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

/// Interner mapping strings to [`Name`]s.
///
/// Interning takes `&self`: the table sits behind a lock so callers holding
/// a mutable borrow of some other part of the model can still create names.
pub struct StringInterner {
    table: RwLock<InternTable>,
}

impl StringInterner {
    /// Create an interner with the empty string pre-interned as [`Name::EMPTY`].
    pub fn new() -> Self {
        let mut table = InternTable::default();
        table.map.insert("", 0);
        table.strings.push("");
        StringInterner {
            table: RwLock::new(table),
        }
    }

    /// Intern `s`, returning the existing name if it was seen before.
    ///
    /// # Panics
    /// Panics if more than `u32::MAX` distinct strings are interned.
    pub fn intern(&self, s: &str) -> Name {
        if let Some(&idx) = self.table.read().map.get(s) {
            return Name::from_raw(idx);
        }
        let mut table = self.table.write();
        if let Some(&idx) = table.map.get(s) {
            return Name::from_raw(idx);
        }
        let idx = u32::try_from(table.strings.len())
            .unwrap_or_else(|_| panic!("string interner exceeded u32::MAX entries"));
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        table.strings.push(leaked);
        table.map.insert(leaked, idx);
        Name::from_raw(idx)
    }

    /// Name for `s` if it was interned before, without inserting.
    pub fn get(&self, s: &str) -> Option<Name> {
        self.table.read().map.get(s).map(|&idx| Name::from_raw(idx))
    }

    /// Text of an interned name.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.table
            .read()
            .strings
            .get(name.index())
            .copied()
            .unwrap_or("")
    }

    /// Number of distinct strings, including the empty string.
    pub fn len(&self) -> usize {
        self.table.read().strings.len()
    }

    /// True when only the empty string is interned.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
