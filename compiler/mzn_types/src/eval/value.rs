//! Values of par expressions.

use std::fmt;

/// Result of evaluating a par expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Set(IntSet),
    Array(ArrayValue),
    /// `<>`
    Absent,
}

impl Value {
    /// Type name used in evaluation errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Set(_) => "set of int",
            Value::Array(_) => "array",
            Value::Absent => "<>",
        }
    }

    /// Render as `show` does. Strings are quoted.
    pub fn show(&self) -> String {
        match self {
            Value::Str(s) => format!("{s:?}"),
            v => v.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => f.write_str(s),
            Value::Set(s) => write!(f, "{s}"),
            Value::Array(a) => {
                f.write_str("[")?;
                for (i, v) in a.elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&v.show())?;
                }
                f.write_str("]")
            }
            Value::Absent => f.write_str("<>"),
        }
    }
}

/// Array value with its index sets. Elements are stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayValue {
    pub dims: Vec<(i64, i64)>,
    pub elems: Vec<Value>,
}

impl ArrayValue {
    /// One-dimensional array indexed from 1.
    pub fn from_vec(elems: Vec<Value>) -> Self {
        let n = i64::try_from(elems.len()).unwrap_or(i64::MAX);
        ArrayValue {
            dims: vec![(1, n)],
            elems,
        }
    }

    /// Row-major position of `index`, if inside every index set.
    pub fn offset(&self, index: &[i64]) -> Option<usize> {
        if index.len() != self.dims.len() {
            return None;
        }
        let mut offset = 0usize;
        for (&i, &(lo, hi)) in index.iter().zip(&self.dims) {
            if i < lo || i > hi {
                return None;
            }
            let width = usize::try_from(hi - lo + 1).ok()?;
            offset = offset * width + usize::try_from(i - lo).ok()?;
        }
        Some(offset)
    }
}

/// Finite set of integers as sorted, disjoint, non-adjacent ranges.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntSet {
    ranges: Vec<(i64, i64)>,
}

impl IntSet {
    pub fn empty() -> Self {
        IntSet::default()
    }

    /// `lo..hi`; empty if `hi < lo`.
    pub fn range(lo: i64, hi: i64) -> Self {
        Self::from_ranges(vec![(lo, hi)])
    }

    pub fn from_values(values: impl IntoIterator<Item = i64>) -> Self {
        Self::from_ranges(values.into_iter().map(|v| (v, v)).collect())
    }

    pub fn from_ranges(mut ranges: Vec<(i64, i64)>) -> Self {
        ranges.retain(|&(lo, hi)| lo <= hi);
        ranges.sort_unstable();
        let mut out: Vec<(i64, i64)> = Vec::with_capacity(ranges.len());
        for (lo, hi) in ranges {
            match out.last_mut() {
                Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
                _ => out.push((lo, hi)),
            }
        }
        IntSet { ranges: out }
    }

    pub fn ranges(&self) -> &[(i64, i64)] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn contains(&self, v: i64) -> bool {
        self.ranges.iter().any(|&(lo, hi)| lo <= v && v <= hi)
    }

    pub fn card(&self) -> i64 {
        self.ranges.iter().map(|&(lo, hi)| hi - lo + 1).sum()
    }

    pub fn min(&self) -> Option<i64> {
        self.ranges.first().map(|r| r.0)
    }

    pub fn max(&self) -> Option<i64> {
        self.ranges.last().map(|r| r.1)
    }

    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        self.ranges.iter().flat_map(|&(lo, hi)| lo..=hi)
    }

    pub fn union(&self, other: &IntSet) -> IntSet {
        let mut ranges = self.ranges.clone();
        ranges.extend_from_slice(&other.ranges);
        Self::from_ranges(ranges)
    }

    pub fn intersect(&self, other: &IntSet) -> IntSet {
        let mut out = Vec::new();
        for &(a, b) in &self.ranges {
            for &(c, d) in &other.ranges {
                let (lo, hi) = (a.max(c), b.min(d));
                if lo <= hi {
                    out.push((lo, hi));
                }
            }
        }
        Self::from_ranges(out)
    }

    pub fn diff(&self, other: &IntSet) -> IntSet {
        let mut out = self.ranges.clone();
        for &(c, d) in &other.ranges {
            out = out
                .into_iter()
                .flat_map(|(a, b)| {
                    if b < c || a > d {
                        return vec![(a, b)];
                    }
                    let mut parts = Vec::with_capacity(2);
                    if a < c {
                        parts.push((a, c - 1));
                    }
                    if b > d {
                        parts.push((d + 1, b));
                    }
                    parts
                })
                .collect();
        }
        Self::from_ranges(out)
    }

    pub fn symdiff(&self, other: &IntSet) -> IntSet {
        self.diff(other).union(&other.diff(self))
    }

    pub fn is_subset(&self, other: &IntSet) -> bool {
        self.diff(other).is_empty()
    }
}

impl fmt::Display for IntSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ranges.as_slice() {
            [] => f.write_str("{}"),
            [(lo, hi)] if lo != hi => write!(f, "{lo}..{hi}"),
            _ => {
                f.write_str("{")?;
                for (i, v) in self.values().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("}")
            }
        }
    }
}
