//! Type checker warnings.
//!
//! Warnings never abort a run and are collected separately from errors.

use mzn_diagnostic::{Diagnostic, ErrorCode};
use mzn_ir::Span;

/// A type checker warning.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TypeCheckWarning {
    pub span: Span,
    pub kind: TypeCheckWarningKind,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum TypeCheckWarningKind {
    /// A local binding hides one of the same name in an enclosing scope.
    Shadowing {
        name: String,
        /// Where the hidden binding was declared.
        previous: Span,
    },
    /// Call to a function annotated `mzn_deprecated`.
    DeprecatedCall {
        name: String,
        since: String,
    },
}

impl TypeCheckWarning {
    pub fn shadowing(span: Span, name: impl Into<String>, previous: Span) -> Self {
        TypeCheckWarning {
            span,
            kind: TypeCheckWarningKind::Shadowing {
                name: name.into(),
                previous,
            },
        }
    }

    pub fn deprecated_call(span: Span, name: impl Into<String>, since: impl Into<String>) -> Self {
        TypeCheckWarning {
            span,
            kind: TypeCheckWarningKind::DeprecatedCall {
                name: name.into(),
                since: since.into(),
            },
        }
    }

    pub fn code(&self) -> ErrorCode {
        match &self.kind {
            TypeCheckWarningKind::Shadowing { .. } => ErrorCode::W2001,
            TypeCheckWarningKind::DeprecatedCall { .. } => ErrorCode::W2002,
        }
    }

    pub fn message(&self) -> String {
        match &self.kind {
            TypeCheckWarningKind::Shadowing { name, previous } => {
                format!("variable `{name}` shadows variable with the same name in line {previous}")
            }
            TypeCheckWarningKind::DeprecatedCall { name, since } if since.is_empty() => {
                format!("`{name}` is deprecated")
            }
            TypeCheckWarningKind::DeprecatedCall { name, since } => {
                format!("`{name}` is deprecated since version {since}")
            }
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::warning(self.code())
            .with_message(self.message())
            .with_label(self.span, "");
        match &self.kind {
            TypeCheckWarningKind::Shadowing { previous, .. } if !previous.is_dummy() => {
                diag.with_secondary_label(*previous, "previous declaration")
            }
            _ => diag,
        }
    }
}
