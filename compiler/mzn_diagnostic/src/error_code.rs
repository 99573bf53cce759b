use std::fmt;
use std::str::FromStr;

/// Error codes for type-checking diagnostics.
///
/// Format: `E####` for errors and `W####` for warnings. The first digit
/// indicates the phase:
/// - E2xxx: Type-checking errors
/// - E9xxx: Internal compiler errors
/// - W2xxx: Type-checking warnings
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub enum ErrorCode {
    // Type Errors (E2xxx)
    /// Undefined identifier
    E2001,
    /// Circular definition
    E2002,
    /// Duplicate definition
    E2003,
    /// Non-uniform set or array literal
    E2004,
    /// No coercion between two types
    E2005,
    /// Wrong number of indices or arguments
    E2006,
    /// Invalid type-inst
    E2007,
    /// No matching function or operator
    E2008,
    /// Ambiguous overloading
    E2009,
    /// Parameter without a value
    E2010,
    /// Expected an annotation
    E2011,
    /// Invalid objective type
    E2012,
    /// Enum constructor argument is not contiguous
    E2013,
    /// Type-inst mismatch in an item
    E2014,

    // Internal Errors (E9xxx)
    /// Internal compiler error
    E9001,

    // Warnings (W2xxx)
    /// Declaration shadows another declaration
    W2001,
    /// Call to a deprecated function
    W2002,
}

impl ErrorCode {
    /// Every code, in numeric order.
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::E2001,
        ErrorCode::E2002,
        ErrorCode::E2003,
        ErrorCode::E2004,
        ErrorCode::E2005,
        ErrorCode::E2006,
        ErrorCode::E2007,
        ErrorCode::E2008,
        ErrorCode::E2009,
        ErrorCode::E2010,
        ErrorCode::E2011,
        ErrorCode::E2012,
        ErrorCode::E2013,
        ErrorCode::E2014,
        ErrorCode::E9001,
        ErrorCode::W2001,
        ErrorCode::W2002,
    ];

    /// Get the code as a string (e.g., "E2001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2006 => "E2006",
            ErrorCode::E2007 => "E2007",
            ErrorCode::E2008 => "E2008",
            ErrorCode::E2009 => "E2009",
            ErrorCode::E2010 => "E2010",
            ErrorCode::E2011 => "E2011",
            ErrorCode::E2012 => "E2012",
            ErrorCode::E2013 => "E2013",
            ErrorCode::E2014 => "E2014",
            ErrorCode::E9001 => "E9001",
            ErrorCode::W2001 => "W2001",
            ErrorCode::W2002 => "W2002",
        }
    }

    /// Short description, as shown by `--explain`-style listings.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E2001 => "undefined identifier",
            ErrorCode::E2002 => "circular definition",
            ErrorCode::E2003 => "duplicate definition",
            ErrorCode::E2004 => "non-uniform literal",
            ErrorCode::E2005 => "invalid coercion",
            ErrorCode::E2006 => "arity mismatch",
            ErrorCode::E2007 => "invalid type-inst",
            ErrorCode::E2008 => "overload resolution failure",
            ErrorCode::E2009 => "ambiguous overloading",
            ErrorCode::E2010 => "missing parameter data",
            ErrorCode::E2011 => "annotation type mismatch",
            ErrorCode::E2012 => "objective type mismatch",
            ErrorCode::E2013 => "enum constructor argument not contiguous",
            ErrorCode::E2014 => "type-inst mismatch",
            ErrorCode::E9001 => "internal compiler error",
            ErrorCode::W2001 => "shadowed variable",
            ErrorCode::W2002 => "deprecated function",
        }
    }

    /// Check if this is a warning code (Wxxx range).
    pub fn is_warning(&self) -> bool {
        self.as_str().starts_with('W')
    }

    /// Check if this is an internal error (E9xxx range).
    pub fn is_internal(&self) -> bool {
        self.as_str().starts_with("E9")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownErrorCode(pub String);

impl fmt::Display for UnknownErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown error code `{}`", self.0)
    }
}

impl std::error::Error for UnknownErrorCode {}

impl FromStr for ErrorCode {
    type Err = UnknownErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == upper)
            .ok_or_else(|| UnknownErrorCode(s.to_owned()))
    }
}
