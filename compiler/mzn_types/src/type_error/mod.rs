//! Type checking errors and warnings.
//!
//! Two propagation styles exist side by side:
//!
//! - **Fail-fast**: structural problems inside one expression (non-uniform
//!   literals, bad index arity, invalid type-insts, unresolvable calls) are
//!   returned as `Err(TypeCheckError)` and abort the whole run.
//! - **Accumulated**: item-level mismatches (bad initializer, constraint,
//!   objective or return type) are pushed into a list so one run reports as
//!   many independent problems as possible.
//!
//! [`TypecheckFailure`] is what the driver hands back in either case.

mod warning;

use mzn_diagnostic::{Diagnostic, ErrorCode, Suggestion};
use mzn_ir::Span;

pub use warning::{TypeCheckWarning, TypeCheckWarningKind};

/// What went wrong.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeErrorKind {
    UndefinedIdentifier,
    CircularDefinition,
    DuplicateDefinition,
    NonUniformLiteral,
    InvalidCoercion,
    ArityMismatch,
    InvalidTypeInst,
    OverloadResolution,
    AmbiguousOverload,
    MissingParameterData,
    AnnotationTypeMismatch,
    ObjectiveTypeMismatch,
    /// A generated enum contiguity assertion failed during evaluation.
    EnumContiguityViolation,
    /// Item-level mismatch between a declared and an inferred type-inst.
    TypeMismatch,
    InternalInvariant,
}

impl TypeErrorKind {
    pub fn code(self) -> ErrorCode {
        match self {
            TypeErrorKind::UndefinedIdentifier => ErrorCode::E2001,
            TypeErrorKind::CircularDefinition => ErrorCode::E2002,
            TypeErrorKind::DuplicateDefinition => ErrorCode::E2003,
            TypeErrorKind::NonUniformLiteral => ErrorCode::E2004,
            TypeErrorKind::InvalidCoercion => ErrorCode::E2005,
            TypeErrorKind::ArityMismatch => ErrorCode::E2006,
            TypeErrorKind::InvalidTypeInst => ErrorCode::E2007,
            TypeErrorKind::OverloadResolution => ErrorCode::E2008,
            TypeErrorKind::AmbiguousOverload => ErrorCode::E2009,
            TypeErrorKind::MissingParameterData => ErrorCode::E2010,
            TypeErrorKind::AnnotationTypeMismatch => ErrorCode::E2011,
            TypeErrorKind::ObjectiveTypeMismatch => ErrorCode::E2012,
            TypeErrorKind::EnumContiguityViolation => ErrorCode::E2013,
            TypeErrorKind::TypeMismatch => ErrorCode::E2014,
            TypeErrorKind::InternalInvariant => ErrorCode::E9001,
        }
    }
}

/// A type checking error: location, kind and rendered message.
///
/// Messages are rendered at construction time because they name types
/// through the enum registry, which is not available when reporting.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TypeCheckError {
    pub span: Span,
    pub kind: TypeErrorKind,
    pub message: String,
    /// Replacement names for a misspelled identifier.
    pub suggestions: Vec<String>,
}

impl TypeCheckError {
    pub fn new(kind: TypeErrorKind, span: Span, message: impl Into<String>) -> Self {
        TypeCheckError {
            span,
            kind,
            message: message.into(),
            suggestions: Vec::new(),
        }
    }

    /// Item-level type mismatch.
    pub fn mismatch(span: Span, message: impl Into<String>) -> Self {
        Self::new(TypeErrorKind::TypeMismatch, span, message)
    }

    pub fn invalid_type_inst(span: Span, message: impl Into<String>) -> Self {
        Self::new(TypeErrorKind::InvalidTypeInst, span, message)
    }

    pub fn non_uniform(span: Span, message: impl Into<String>) -> Self {
        Self::new(TypeErrorKind::NonUniformLiteral, span, message)
    }

    pub fn internal(span: Span, message: impl Into<String>) -> Self {
        Self::new(TypeErrorKind::InternalInvariant, span, message)
    }

    /// `undefined identifier `x'`, with a "did you mean" hint when a
    /// similar name is in scope.
    pub fn undefined(span: Span, name: &str, similar: Option<String>) -> Self {
        let mut message = format!("undefined identifier `{name}'");
        if let Some(similar) = &similar {
            message.push_str(&format!(", did you mean `{similar}'?"));
        }
        TypeCheckError {
            span,
            kind: TypeErrorKind::UndefinedIdentifier,
            message,
            suggestions: similar.into_iter().collect(),
        }
    }

    pub fn circular(span: Span, name: &str) -> Self {
        Self::new(
            TypeErrorKind::CircularDefinition,
            span,
            format!("circular definition of `{name}'"),
        )
    }

    pub fn duplicate(span: Span, name: &str) -> Self {
        Self::new(
            TypeErrorKind::DuplicateDefinition,
            span,
            format!("identifier `{name}' already defined"),
        )
    }

    /// Append text to the message (e.g. the solution-checker suffix).
    #[must_use]
    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.message.push_str(suffix);
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.kind.code()
    }

    /// Convert into a renderable diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.code())
            .with_message(self.message.clone())
            .with_label(self.span, self.code().description());
        for name in &self.suggestions {
            diag = diag.with_suggestion(Suggestion::did_you_mean(self.span, name.clone()));
        }
        diag
    }
}

/// Why a type checking run failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TypecheckFailure {
    /// A fail-fast error; nothing after it ran.
    #[error("{0}")]
    Fatal(#[from] TypeCheckError),
    /// Accumulated errors, in reporting order.
    #[error("{} type error(s)", .0.len())]
    Errors(Vec<TypeCheckError>),
}

impl TypecheckFailure {
    /// Every error carried by this failure.
    pub fn errors(&self) -> &[TypeCheckError] {
        match self {
            TypecheckFailure::Fatal(e) => std::slice::from_ref(e),
            TypecheckFailure::Errors(errors) => errors,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, TypecheckFailure::Fatal(_))
    }

    pub fn to_diagnostics(&self) -> Vec<Diagnostic> {
        self.errors().iter().map(TypeCheckError::to_diagnostic).collect()
    }
}

#[cfg(test)]
mod tests;
