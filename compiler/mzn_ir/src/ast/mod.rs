//! Model AST.
//!
//! Expressions live in an [`ExprArena`](crate::ExprArena) and refer to each
//! other by [`ExprId`]. Declarations are expressions too
//! ([`ExprKind::VarDecl`]), so a resolved identifier simply stores the
//! `ExprId` of the declaration it binds to. Functions are kept in a separate
//! table indexed by [`FnId`].
//!
//! Every expression carries its [`Type`]. The parser leaves it unknown
//! (except on type-insts, where it holds the declared type-inst) and the
//! type checker fills it in.

mod items;
mod operators;

use std::fmt;

pub use items::{FunctionDecl, Item, ItemKind, SolveGoal, SolveItem};
pub use operators::{BinOpKind, UnOpKind};

use crate::{Name, Span, Type};

/// Index of an expression in the arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        ExprId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExprId({})", self.0)
    }
}

/// Index of a function declaration in [`Model::functions`](crate::Model).
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct FnId(u32);

impl FnId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        FnId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for FnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FnId({})", self.0)
    }
}

/// Integer value with infinities, as used in ranges like `-infinity..n`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntVal {
    NegInf,
    Int(i64),
    PosInf,
}

impl IntVal {
    pub const fn as_finite(self) -> Option<i64> {
        match self {
            IntVal::Int(v) => Some(v),
            _ => None,
        }
    }

    pub const fn is_finite(self) -> bool {
        matches!(self, IntVal::Int(_))
    }
}

impl fmt::Display for IntVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntVal::NegInf => f.write_str("-infinity"),
            IntVal::Int(v) => write!(f, "{v}"),
            IntVal::PosInf => f.write_str("infinity"),
        }
    }
}

/// Evaluated integer set attached to a set literal, as a list of closed ranges.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IntSetVal {
    pub ranges: Vec<(IntVal, IntVal)>,
}

impl IntSetVal {
    pub fn range(min: IntVal, max: IntVal) -> Self {
        IntSetVal {
            ranges: vec![(min, max)],
        }
    }

    /// `-infinity..infinity`, the value of an open slice `..`.
    pub fn unbounded() -> Self {
        IntSetVal::range(IntVal::NegInf, IntVal::PosInf)
    }

    pub fn min(&self) -> Option<IntVal> {
        self.ranges.first().map(|r| r.0)
    }

    pub fn max(&self) -> Option<IntVal> {
        self.ranges.last().map(|r| r.1)
    }

    pub fn is_unbounded(&self) -> bool {
        self.min() == Some(IntVal::NegInf) && self.max() == Some(IntVal::PosInf)
    }

    /// Single finite range `a..b`.
    pub fn single_finite_range(&self) -> Option<(i64, i64)> {
        match self.ranges.as_slice() {
            [(IntVal::Int(a), IntVal::Int(b))] => Some((*a, *b)),
            _ => None,
        }
    }
}

/// Declared or referenced name. An identifier created by the compiler has an
/// `idn` and an empty name; a declaration with neither is anonymous.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Symbol {
    pub name: Name,
    pub idn: Option<u32>,
}

impl Symbol {
    pub const fn named(name: Name) -> Self {
        Symbol { name, idn: None }
    }

    pub const fn introduced(idn: u32) -> Self {
        Symbol {
            name: Name::EMPTY,
            idn: Some(idn),
        }
    }

    pub const fn is_anonymous(&self) -> bool {
        self.name.is_empty() && self.idn.is_none()
    }
}

/// Identifier reference.
#[derive(Clone, Debug, PartialEq)]
pub struct Ident {
    pub sym: Symbol,
    /// Declaration this identifier resolves to, once ordered.
    pub decl: Option<ExprId>,
}

/// One `decls in source where cond` clause of a comprehension.
///
/// An assignment generator `x = e` has no source; `e` is stored in
/// `where_clause` and `decls` holds exactly one declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct Generator {
    pub decls: Vec<ExprId>,
    pub source: Option<ExprId>,
    pub where_clause: Option<ExprId>,
}

/// Variable declaration (top-level, parameter, let binding or generator).
#[derive(Clone, Debug, PartialEq)]
pub struct VarDecl {
    pub id: Symbol,
    /// The declared [`TypeInst`].
    pub ti: ExprId,
    pub init: Option<ExprId>,
    pub toplevel: bool,
    /// Created by the compiler rather than written by the user.
    pub introduced: bool,
    /// Position in dependency order, once assigned.
    pub topo_pos: Option<u32>,
}

/// Type-inst expression: `array[ranges] of <type> <domain>`.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeInst {
    /// One nested `TypeInst` per array dimension.
    pub ranges: Vec<ExprId>,
    pub domain: Option<ExprId>,
    /// Declares an enumerated type (`enum E = ...`).
    pub is_enum: bool,
}

/// Expression node.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    pub ty: Type,
    pub anns: Vec<ExprId>,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr {
            kind,
            span,
            ty: Type::unknown(),
            anns: Vec::new(),
        }
    }

    pub fn typed(kind: ExprKind, span: Span, ty: Type) -> Self {
        Expr {
            kind,
            span,
            ty,
            anns: Vec::new(),
        }
    }
}

/// Expression kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    IntLit(IntVal),
    FloatLit(f64),
    BoolLit(bool),
    StringLit(Name),
    /// `<>`
    Absent,
    /// `_`
    Anon,
    SetLit {
        elems: Vec<ExprId>,
        /// Pre-evaluated value, if the literal is a known integer range.
        isv: Option<IntSetVal>,
    },
    ArrayLit {
        elems: Vec<ExprId>,
        /// `(min, max)` index range per dimension.
        dims: Vec<(i64, i64)>,
        tuple: bool,
    },
    ArrayAccess {
        base: ExprId,
        indices: Vec<ExprId>,
    },
    Comprehension {
        /// Body; for `[(i,j): e | ...]` a tuple literal of indices then value.
        body: ExprId,
        generators: Vec<Generator>,
        set: bool,
    },
    Ite {
        branches: Vec<(ExprId, ExprId)>,
        else_branch: Option<ExprId>,
    },
    BinOp {
        op: BinOpKind,
        lhs: ExprId,
        rhs: ExprId,
        /// Resolved user-defined implementation, if any.
        decl: Option<FnId>,
    },
    UnOp {
        op: UnOpKind,
        operand: ExprId,
        decl: Option<FnId>,
    },
    Call {
        name: Name,
        args: Vec<ExprId>,
        decl: Option<FnId>,
    },
    Let {
        /// Declarations and constraints, in dependency order after ordering.
        bindings: Vec<ExprId>,
        body: ExprId,
    },
    VarDecl(VarDecl),
    TypeInst(TypeInst),
    /// Type-inst variable `$T`, or `$$E` when `is_enum`.
    TiId {
        name: Name,
        is_enum: bool,
    },
    Id(Ident),
}

impl ExprKind {
    pub fn as_var_decl(&self) -> Option<&VarDecl> {
        match self {
            ExprKind::VarDecl(vd) => Some(vd),
            _ => None,
        }
    }

    pub fn as_var_decl_mut(&mut self) -> Option<&mut VarDecl> {
        match self {
            ExprKind::VarDecl(vd) => Some(vd),
            _ => None,
        }
    }

    pub fn as_type_inst(&self) -> Option<&TypeInst> {
        match self {
            ExprKind::TypeInst(ti) => Some(ti),
            _ => None,
        }
    }

    pub fn as_type_inst_mut(&mut self) -> Option<&mut TypeInst> {
        match self {
            ExprKind::TypeInst(ti) => Some(ti),
            _ => None,
        }
    }

    pub fn as_ident(&self) -> Option<&Ident> {
        match self {
            ExprKind::Id(ident) => Some(ident),
            _ => None,
        }
    }

    /// Name of a call, if this is one.
    pub fn call_name(&self) -> Option<Name> {
        match self {
            ExprKind::Call { name, .. } => Some(*name),
            _ => None,
        }
    }

    pub fn is_anon(&self) -> bool {
        matches!(self, ExprKind::Anon)
    }
}

#[cfg(test)]
mod tests;
