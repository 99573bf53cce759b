//! Checking context shared by every pass.

use rustc_hash::FxHashMap;

use mzn_ir::ast::{ExprKind, Ident, Symbol};
use mzn_ir::{ExprId, Model, Name, Span, Type};

use crate::check::WellKnownNames;
use crate::{EnumRegistry, FunctionTable, TypeCheckWarning, TypecheckOptions};

/// A declaration a solution checker expects the checked model to provide.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckVar {
    pub name: String,
    /// Type as declared by the checker.
    pub ty: Type,
    pub span: Span,
}

/// Mutable tables consulted and extended by the passes of one run.
///
/// Created once per model; the enum registry and function table live as
/// long as the typed model is used, since later stages resolve against them.
#[derive(Debug)]
pub struct CheckEnv {
    pub enums: EnumRegistry,
    pub fns: FunctionTable,
    pub options: TypecheckOptions,
    pub warnings: Vec<TypeCheckWarning>,
    /// Declarations required by a solution checker.
    pub check_vars: Vec<CheckVar>,
    pub(crate) names: WellKnownNames,
    /// Builtin annotation atoms (`empty_annotation`, `output_only`, ...)
    /// by name, once registered.
    pub(crate) globals: FxHashMap<Name, ExprId>,
    next_idn: u32,
}

impl CheckEnv {
    pub fn new(model: &Model, options: TypecheckOptions) -> Self {
        CheckEnv {
            enums: EnumRegistry::new(),
            fns: FunctionTable::new(),
            options,
            warnings: Vec::new(),
            check_vars: Vec::new(),
            names: WellKnownNames::new(&model.interner),
            globals: FxHashMap::default(),
            next_idn: 0,
        }
    }

    /// Fresh compiler-introduced identifier.
    pub fn gen_symbol(&mut self) -> Symbol {
        let idn = self.next_idn;
        self.next_idn += 1;
        Symbol::introduced(idn)
    }

    /// Make sure introduced identifiers never collide with `idn`.
    pub fn min_id(&mut self, idn: u32) {
        self.next_idn = self.next_idn.max(idn.saturating_add(1));
    }

    /// Reference to the builtin annotation atom `name`.
    pub(crate) fn ann_ref(&self, model: &mut Model, name: Name, span: Span) -> ExprId {
        let ident = Ident {
            sym: Symbol::named(name),
            decl: self.globals.get(&name).copied(),
        };
        model
            .arena
            .alloc_typed(ExprKind::Id(ident), span, Type::ann())
    }

    /// `ty` with enum names, for messages.
    pub fn show(&self, model: &Model, ty: Type) -> String {
        self.enums.show(model, ty)
    }
}
