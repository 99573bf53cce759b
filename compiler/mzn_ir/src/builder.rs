//! Construction helpers.
//!
//! Used by front ends building a model, by the enum synthesizer and the
//! coercion engine when generating code, and by tests. All helpers allocate
//! with [`Span::DUMMY`]; use [`Model::at`] to attach a location.

use crate::ast::{
    BinOpKind, Expr, ExprKind, FunctionDecl, Generator, Ident, IntSetVal, IntVal, ItemKind,
    SolveGoal, SolveItem, Symbol, TypeInst, UnOpKind, VarDecl,
};
use crate::{ExprId, FnId, Model, Span, Type};

impl Model {
    fn mk(&mut self, kind: ExprKind) -> ExprId {
        self.arena.alloc(Expr::new(kind, Span::DUMMY))
    }

    fn mk_typed(&mut self, kind: ExprKind, ty: Type) -> ExprId {
        self.arena.alloc(Expr::typed(kind, Span::DUMMY, ty))
    }

    /// Set the location of an expression, returning it.
    pub fn at(&mut self, id: ExprId, span: Span) -> ExprId {
        self.arena.get_mut(id).span = span;
        id
    }

    /// Span in this model's file.
    pub fn span(&self, line: u32, col: u32) -> Span {
        Span::point(self.filename, line, col)
    }

    /// Attach an annotation, returning the annotated expression.
    pub fn annotate(&mut self, id: ExprId, ann: ExprId) -> ExprId {
        self.arena.get_mut(id).anns.push(ann);
        id
    }

    // Literals

    pub fn int(&mut self, v: i64) -> ExprId {
        self.mk_typed(ExprKind::IntLit(IntVal::Int(v)), Type::par_int())
    }

    pub fn int_val(&mut self, v: IntVal) -> ExprId {
        self.mk_typed(ExprKind::IntLit(v), Type::par_int())
    }

    pub fn float(&mut self, v: f64) -> ExprId {
        self.mk_typed(ExprKind::FloatLit(v), Type::par_float())
    }

    pub fn bool_lit(&mut self, v: bool) -> ExprId {
        self.mk_typed(ExprKind::BoolLit(v), Type::par_bool())
    }

    pub fn string(&mut self, s: &str) -> ExprId {
        let name = self.intern(s);
        self.mk_typed(ExprKind::StringLit(name), Type::par_string())
    }

    pub fn absent(&mut self) -> ExprId {
        self.mk_typed(ExprKind::Absent, Type::bot().with_opt(true))
    }

    pub fn anon(&mut self) -> ExprId {
        self.mk(ExprKind::Anon)
    }

    pub fn set_lit(&mut self, elems: Vec<ExprId>) -> ExprId {
        self.mk(ExprKind::SetLit { elems, isv: None })
    }

    /// Pre-evaluated range literal `lo..hi`.
    pub fn range_set(&mut self, lo: IntVal, hi: IntVal) -> ExprId {
        self.mk_typed(
            ExprKind::SetLit {
                elems: Vec::new(),
                isv: Some(IntSetVal::range(lo, hi)),
            },
            Type::par_set_int(),
        )
    }

    /// One-dimensional array literal indexed from 1.
    pub fn array_lit(&mut self, elems: Vec<ExprId>) -> ExprId {
        let n = i64::try_from(elems.len()).unwrap_or(i64::MAX);
        self.array_lit_dims(elems, vec![(1, n)])
    }

    pub fn array_lit_dims(&mut self, elems: Vec<ExprId>, dims: Vec<(i64, i64)>) -> ExprId {
        self.mk(ExprKind::ArrayLit {
            elems,
            dims,
            tuple: false,
        })
    }

    pub fn tuple_lit(&mut self, elems: Vec<ExprId>) -> ExprId {
        let n = i64::try_from(elems.len()).unwrap_or(i64::MAX);
        self.mk(ExprKind::ArrayLit {
            elems,
            dims: vec![(1, n)],
            tuple: true,
        })
    }

    // References and compound expressions

    /// Unresolved identifier.
    pub fn id(&mut self, name: &str) -> ExprId {
        let name = self.intern(name);
        self.mk(ExprKind::Id(Ident {
            sym: Symbol::named(name),
            decl: None,
        }))
    }

    /// Identifier already bound to `decl`, carrying its type.
    pub fn id_of(&mut self, decl: ExprId) -> ExprId {
        let sym = self.var_decl(decl).map(|vd| vd.id).unwrap_or_default();
        let ty = self.arena.ty(decl);
        self.mk_typed(
            ExprKind::Id(Ident {
                sym,
                decl: Some(decl),
            }),
            ty,
        )
    }

    pub fn binop(&mut self, op: BinOpKind, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.mk(ExprKind::BinOp {
            op,
            lhs,
            rhs,
            decl: None,
        })
    }

    pub fn unop(&mut self, op: UnOpKind, operand: ExprId) -> ExprId {
        self.mk(ExprKind::UnOp {
            op,
            operand,
            decl: None,
        })
    }

    pub fn call(&mut self, name: &str, args: Vec<ExprId>) -> ExprId {
        let name = self.intern(name);
        self.mk(ExprKind::Call {
            name,
            args,
            decl: None,
        })
    }

    pub fn access(&mut self, base: ExprId, indices: Vec<ExprId>) -> ExprId {
        self.mk(ExprKind::ArrayAccess { base, indices })
    }

    pub fn ite(&mut self, branches: Vec<(ExprId, ExprId)>, else_branch: Option<ExprId>) -> ExprId {
        self.mk(ExprKind::Ite {
            branches,
            else_branch,
        })
    }

    pub fn let_in(&mut self, bindings: Vec<ExprId>, body: ExprId) -> ExprId {
        self.mk(ExprKind::Let { bindings, body })
    }

    pub fn comprehension(&mut self, body: ExprId, generators: Vec<Generator>, set: bool) -> ExprId {
        self.mk(ExprKind::Comprehension {
            body,
            generators,
            set,
        })
    }

    /// Generator `names in source where cond`; declares one `int` per name.
    pub fn generator(
        &mut self,
        names: &[&str],
        source: ExprId,
        where_clause: Option<ExprId>,
    ) -> Generator {
        let decls = names
            .iter()
            .map(|n| {
                let ti = self.ti(Type::par_int());
                self.mk_var_decl(n, ti, None)
            })
            .collect();
        Generator {
            decls,
            source: Some(source),
            where_clause,
        }
    }

    // Type-insts

    /// Scalar type-inst `ty` with no domain.
    pub fn ti(&mut self, ty: Type) -> ExprId {
        self.type_inst_node(Vec::new(), ty, None, false)
    }

    /// Scalar type-inst with a domain, e.g. `var 1..3`; the base is inferred.
    pub fn ti_domain(&mut self, inst: crate::Inst, set: bool, domain: ExprId) -> ExprId {
        let ty = Type::unknown().with_inst(inst).with_set(set);
        self.type_inst_node(Vec::new(), ty, Some(domain), false)
    }

    /// Array type-inst `array[ranges] of ty`.
    pub fn ti_array(&mut self, ranges: Vec<ExprId>, ty: Type, domain: Option<ExprId>) -> ExprId {
        let dim = i8::try_from(ranges.len()).unwrap_or(i8::MAX);
        self.type_inst_node(ranges, ty.with_dim(dim), domain, false)
    }

    /// Index set `int`.
    pub fn ti_index_int(&mut self) -> ExprId {
        self.ti(Type::par_int())
    }

    /// Index set given by an expression, e.g. `1..3` or an enum name.
    pub fn ti_index(&mut self, domain: ExprId) -> ExprId {
        self.type_inst_node(Vec::new(), Type::unknown(), Some(domain), false)
    }

    /// Index set `_`, inferred from the initializer.
    pub fn ti_index_anon(&mut self) -> ExprId {
        let anon = self.anon();
        self.type_inst_node(Vec::new(), Type::unknown(), Some(anon), false)
    }

    /// Index set given by a type-inst variable, `$X`.
    pub fn ti_index_var(&mut self, name: &str) -> ExprId {
        let tiid = self.ti_id(name, false);
        self.type_inst_node(Vec::new(), Type::top(), Some(tiid), false)
    }

    /// Type-inst variable `$T` (or `$$E` if `is_enum`).
    pub fn ti_id(&mut self, name: &str, is_enum: bool) -> ExprId {
        let name = self.intern(name);
        self.mk(ExprKind::TiId { name, is_enum })
    }

    /// Type-inst of an enum declaration `enum E`.
    pub fn ti_enum(&mut self) -> ExprId {
        self.type_inst_node(Vec::new(), Type::par_set_int(), None, true)
    }

    pub fn type_inst_node(
        &mut self,
        ranges: Vec<ExprId>,
        ty: Type,
        domain: Option<ExprId>,
        is_enum: bool,
    ) -> ExprId {
        self.mk_typed(
            ExprKind::TypeInst(TypeInst {
                ranges,
                domain,
                is_enum,
            }),
            ty,
        )
    }

    // Declarations and items

    /// Local (non-top-level) declaration.
    pub fn mk_var_decl(&mut self, name: &str, ti: ExprId, init: Option<ExprId>) -> ExprId {
        let name = self.intern(name);
        self.decl_node(Symbol::named(name), ti, init, false)
    }

    pub fn decl_node(
        &mut self,
        id: Symbol,
        ti: ExprId,
        init: Option<ExprId>,
        toplevel: bool,
    ) -> ExprId {
        self.mk(ExprKind::VarDecl(VarDecl {
            id,
            ti,
            init,
            toplevel,
            introduced: false,
            topo_pos: None,
        }))
    }

    /// Add a top-level declaration item.
    pub fn add_var_decl(&mut self, name: &str, ti: ExprId, init: Option<ExprId>) -> ExprId {
        let name = self.intern(name);
        let vd = self.decl_node(Symbol::named(name), ti, init, true);
        let span = self.arena.span(vd);
        self.push_item(ItemKind::VarDecl(vd), span);
        vd
    }

    /// Add `enum name = init;` (or a stub without initializer).
    pub fn add_enum(&mut self, name: &str, init: Option<ExprId>) -> ExprId {
        let ti = self.ti_enum();
        self.add_var_decl(name, ti, init)
    }

    pub fn add_constraint(&mut self, e: ExprId) {
        let span = self.arena.span(e);
        self.push_item(ItemKind::Constraint(e), span);
    }

    pub fn add_assign(&mut self, name: &str, e: ExprId) {
        let name = self.intern(name);
        let span = self.arena.span(e);
        self.push_item(
            ItemKind::Assign {
                name,
                expr: e,
                decl: None,
            },
            span,
        );
    }

    pub fn add_solve(&mut self, goal: SolveGoal, objective: Option<ExprId>) {
        self.push_item(
            ItemKind::Solve(SolveItem {
                goal,
                objective,
                anns: Vec::new(),
            }),
            Span::DUMMY,
        );
    }

    pub fn add_output(&mut self, e: ExprId) {
        let span = self.arena.span(e);
        self.push_item(
            ItemKind::Output {
                expr: e,
                anns: Vec::new(),
            },
            span,
        );
    }

    /// Add a function item. Parameters are `(name, type-inst)` pairs.
    pub fn add_function(
        &mut self,
        name: &str,
        params: &[(&str, ExprId)],
        ti: ExprId,
        body: Option<ExprId>,
    ) -> FnId {
        let params = params
            .iter()
            .map(|(n, pti)| self.mk_var_decl(n, *pti, None))
            .collect();
        let name = self.intern(name);
        let fid = self.push_function(FunctionDecl::new(name, params, ti, body));
        self.push_item(ItemKind::Function(fid), Span::DUMMY);
        fid
    }
}
