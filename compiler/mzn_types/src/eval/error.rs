//! Evaluation errors.

use mzn_ir::Span;

use crate::{TypeCheckError, TypeErrorKind};

/// Why an expression could not be evaluated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// An identifier has no value (a parameter without data, or an enum
    /// declared without definition).
    Undefined,
    /// The expression is not par.
    NotPar,
    DivisionByZero,
    Overflow,
    IndexOutOfBounds,
    /// `assert(false, msg)`.
    AssertionFailed,
    /// A par constraint in a `let` evaluated to `false`.
    Failed,
    /// A construct or builtin the evaluator does not handle.
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub span: Span,
    pub message: String,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, span: Span, message: impl Into<String>) -> Self {
        EvalError {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Whether the failure only means "no value yet" rather than a fault in
    /// the model.
    pub fn is_undetermined(&self) -> bool {
        matches!(
            self.kind,
            EvalErrorKind::Undefined | EvalErrorKind::NotPar | EvalErrorKind::Unsupported
        )
    }
}

impl From<EvalError> for TypeCheckError {
    fn from(err: EvalError) -> Self {
        let kind = match err.kind {
            EvalErrorKind::AssertionFailed => TypeErrorKind::EnumContiguityViolation,
            EvalErrorKind::Undefined => TypeErrorKind::MissingParameterData,
            _ => TypeErrorKind::TypeMismatch,
        };
        TypeCheckError::new(kind, err.span, err.message)
    }
}
