//! Model items and function declarations.

use crate::{ExprId, FnId, Name, Span};

/// Function, predicate, test or annotation declaration.
///
/// Parameters are `VarDecl` expressions; the return type-inst is a
/// `TypeInst` expression (`var bool` for predicates, `ann` for annotations).
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: Name,
    pub params: Vec<ExprId>,
    pub ti: ExprId,
    pub body: Option<ExprId>,
    pub anns: Vec<ExprId>,
    pub span: Span,
    /// Declared in the standard library rather than the user's model.
    pub from_stdlib: bool,
    /// Hidden `ann` parameter receiving the call-site annotations.
    pub captured_anns: Option<ExprId>,
}

impl FunctionDecl {
    pub fn new(name: Name, params: Vec<ExprId>, ti: ExprId, body: Option<ExprId>) -> Self {
        FunctionDecl {
            name,
            params,
            ti,
            body,
            anns: Vec::new(),
            span: Span::DUMMY,
            from_stdlib: false,
            captured_anns: None,
        }
    }
}

/// Optimisation direction of a solve item.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SolveGoal {
    Satisfy,
    Minimize,
    Maximize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SolveItem {
    pub goal: SolveGoal,
    pub objective: Option<ExprId>,
    pub anns: Vec<ExprId>,
}

/// Top-level item.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub kind: ItemKind,
    pub span: Span,
    /// Marked for removal; skipped by every pass.
    pub removed: bool,
}

impl Item {
    pub fn new(kind: ItemKind, span: Span) -> Self {
        Item {
            kind,
            span,
            removed: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ItemKind {
    /// Top-level declaration (a `VarDecl` expression).
    VarDecl(ExprId),
    /// `name = expr;` for a declaration elsewhere in the model or data.
    Assign {
        name: Name,
        expr: ExprId,
        decl: Option<ExprId>,
    },
    Constraint(ExprId),
    Solve(SolveItem),
    Output {
        expr: ExprId,
        anns: Vec<ExprId>,
    },
    Function(FnId),
    /// An included file with its own items.
    Include {
        path: Name,
        items: Vec<Item>,
    },
}
