//! Registration and ordering passes.
//!
//! Everything that must be known before any expression is typed: the
//! function table, the global scope (with synthesized enum support), the
//! lifted objective, assignment items, and the dependency order of all
//! declarations.

use rustc_hash::FxHashSet;

use mzn_ir::ast::{BinOpKind, ExprKind, FunctionDecl, Item, ItemKind, SolveGoal, SolveItem, Symbol};
use mzn_ir::{CopyMap, ExprId, FnId, Name, Span, Type};

use super::{ModelChecker, Shadow};
use crate::enum_gen::create_enum_mapper;
use crate::{TypeCheckError, TypeErrorKind};

/// `n` of an identifier spelled `X_INTRODUCED_<n>_`.
fn introduced_number(name: &str) -> Option<u32> {
    name.strip_prefix("X_INTRODUCED_")?
        .strip_suffix('_')?
        .parse()
        .ok()
}

impl ModelChecker<'_> {
    /// Move the model's items, and those of its includes, into the
    /// working list.
    pub(super) fn combine(&mut self) {
        let items = std::mem::take(&mut self.model.items);
        for item in items {
            match item.kind {
                ItemKind::Include { path, items } => self.flatten_include(path, items),
                _ => self.push_item(item, None),
            }
        }
    }

    fn flatten_include(&mut self, path: Name, items: Vec<Item>) {
        for item in items {
            match item.kind {
                ItemKind::Include { items: nested, .. } => self.flatten_include(path, nested),
                _ => self.push_item(item, Some(path)),
            }
        }
    }

    /// Register every function item, so calls can refer to functions
    /// declared further down.
    #[tracing::instrument(level = "debug", skip_all)]
    pub(super) fn register_functions(&mut self) -> Result<(), TypeCheckError> {
        let mut atoms = FxHashSet::default();
        let mut count = 0usize;
        for i in 0..self.items.len() {
            let ItemKind::Function(fid) = self.items[i].kind else {
                continue;
            };
            if self.items[i].removed {
                continue;
            }
            self.env.fns.register(self.model, fid, true)?;
            count += 1;
            self.shadow_annotated_params(fid, &mut atoms)?;
        }
        tracing::debug!(functions = count, "registered function signatures");
        Ok(())
    }

    /// For a parameter annotated `::annotated_expression`, generate the
    /// variant used as an annotation: an `ann` atom if it is the only
    /// parameter, otherwise a function without it. Either is tagged with
    /// `mzn_add_annotated_expression(i)`.
    fn shadow_annotated_params(
        &mut self,
        fid: FnId,
        atoms: &mut FxHashSet<Name>,
    ) -> Result<(), TypeCheckError> {
        let marker = self.env.names.annotated_expression;
        let f = self.model.fun(fid).clone();
        let tagged: Vec<usize> = f
            .params
            .iter()
            .enumerate()
            .filter(|&(_, &p)| {
                self.model.arena.get(p).anns.iter().any(|&a| {
                    matches!(self.model.arena.kind(a), ExprKind::Id(ident) if ident.sym.name == marker)
                })
            })
            .map(|(i, _)| i)
            .collect();

        for idx in tagged {
            let span = self.model.arena.span(f.params[idx]);
            if idx != 0 {
                self.errors.push(TypeCheckError::invalid_type_inst(
                    span,
                    "only the first argument can be annotated with annotated_expression",
                ));
                continue;
            }
            if f.params.len() == 1 {
                if atoms.insert(f.name) {
                    let ti = self.model.ti(Type::ann());
                    let atom = self.model.decl_node(Symbol::named(f.name), ti, None, true);
                    self.model.at(atom, f.span);
                    let tag = self.annotated_expression_tag(idx);
                    self.model.annotate(atom, tag);
                    self.push_item(Item::new(ItemKind::VarDecl(atom), f.span), None);
                    self.shadows.push(Shadow::Atom(atom));
                }
                continue;
            }

            let mut map = CopyMap::new();
            let mut params = Vec::with_capacity(f.params.len() - 1);
            for (i, &p) in f.params.iter().enumerate() {
                if i != idx {
                    params.push(self.model.copy_expr(&mut map, p));
                }
            }
            let ti = self.model.copy_expr(&mut map, f.ti);
            let mut decl = FunctionDecl::new(f.name, params, ti, None);
            decl.span = f.span;
            decl.from_stdlib = f.from_stdlib;
            decl.anns.push(self.annotated_expression_tag(idx));
            let shadow = self.model.push_function(decl);
            self.env.fns.register(self.model, shadow, true)?;
            self.push_item(Item::new(ItemKind::Function(shadow), f.span), None);
            self.shadows.push(Shadow::Function(shadow));
        }
        Ok(())
    }

    fn annotated_expression_tag(&mut self, idx: usize) -> ExprId {
        let idx = self.model.int(i64::try_from(idx).unwrap_or(0));
        self.model.call("mzn_add_annotated_expression", vec![idx])
    }

    /// Add every top-level declaration to the global scope, synthesize
    /// enum support, collect assignments and lift the objective.
    #[tracing::instrument(level = "debug", skip_all)]
    pub(super) fn register_decls(&mut self) -> Result<(), TypeCheckError> {
        let mut generated = Vec::new();
        let mut objective = None;
        let mut solve_seen = false;
        for i in 0..self.items.len() {
            if self.items[i].removed {
                continue;
            }
            let span = self.items[i].span;
            match self.items[i].kind.clone() {
                ItemKind::VarDecl(decl) => {
                    self.reserve_introduced(decl);
                    self.topo
                        .add(self.model, self.env, decl, Some(&mut generated))?;
                }
                ItemKind::Assign { .. } => self.assigns.push(i),
                ItemKind::Solve(si) => {
                    if solve_seen {
                        self.errors.push(TypeCheckError::new(
                            TypeErrorKind::DuplicateDefinition,
                            span,
                            "Only one solve item allowed",
                        ));
                        continue;
                    }
                    solve_seen = true;
                    objective = self.lift_objective(i, si)?;
                }
                _ => {}
            }
        }
        if let Some(decl) = objective {
            let span = self.model.arena.span(decl);
            self.push_item(Item::new(ItemKind::VarDecl(decl), span), None);
        }
        self.register_globals();
        self.splice_generated(generated)?;
        tracing::debug!(enums = self.env.enums.enum_count(), "registered declarations");
        Ok(())
    }

    /// Keep fresh identifiers clear of introduced ones already in the model.
    fn reserve_introduced(&mut self, decl: ExprId) {
        let Some(sym) = self.model.var_decl(decl).map(|vd| vd.id) else {
            return;
        };
        let idn = sym
            .idn
            .or_else(|| introduced_number(self.model.name_str(sym.name)));
        if let Some(idn) = idn {
            self.env.min_id(idn);
        }
    }

    /// Replace the objective of solve item `i` by a reference to a new
    /// top-level declaration holding it.
    fn lift_objective(&mut self, i: usize, si: SolveItem) -> Result<Option<ExprId>, TypeCheckError> {
        if self.env.options.is_flatzinc {
            return Ok(None);
        }
        let Some(obj) = si.objective else {
            return Ok(None);
        };
        let names = &self.env.names;
        let name = if self.env.options.is_checker {
            names.checker_objective
        } else {
            names.objective
        };
        let ctx = if si.goal == SolveGoal::Maximize {
            names.ctx_pos
        } else {
            names.ctx_neg
        };
        let span = self.model.arena.span(obj);
        let ti = self.model.ti(Type::unknown());
        let decl = self.model.decl_node(Symbol::named(name), ti, Some(obj), true);
        self.model.at(decl, span);
        let ctx = self.model.id(self.model.name_str(ctx));
        self.model.annotate(decl, ctx);
        self.topo.add(self.model, self.env, decl, None)?;

        let reference = self.model.id_of(decl);
        self.model.at(reference, span);
        self.items[i].kind = ItemKind::Solve(SolveItem {
            objective: Some(reference),
            ..si
        });
        Ok(Some(decl))
    }

    /// Remember the builtin annotation atoms the later passes attach.
    fn register_globals(&mut self) {
        let names = &self.env.names;
        let atoms = [
            names.output_only,
            names.mzn_was_undefined,
            names.rhs_from_assignment,
            names.mzn_check_var,
            names.annotated_expression,
            names.ctx_pos,
            names.ctx_neg,
            names.empty_annotation,
        ];
        for name in atoms {
            if let Some(decl) = self.topo.scopes.find(Symbol::named(name)) {
                self.env.globals.insert(name, decl);
            }
        }
    }

    /// Append items produced by enum synthesis, registering what they
    /// declare.
    fn splice_generated(&mut self, generated: Vec<Item>) -> Result<(), TypeCheckError> {
        for item in generated {
            match item.kind {
                ItemKind::VarDecl(decl) => {
                    self.push_item(item, None);
                    self.topo.add(self.model, self.env, decl, None)?;
                }
                ItemKind::Function(fid) => {
                    self.env.fns.register(self.model, fid, true)?;
                    self.push_item(item, None);
                }
                ItemKind::Assign { .. } => {
                    self.assigns.push(self.items.len());
                    self.push_item(item, None);
                }
                _ => self.push_item(item, None),
            }
        }
        Ok(())
    }

    /// Turn assignment items into initializers of their declarations.
    #[tracing::instrument(level = "debug", skip_all, fields(assigns = self.assigns.len()))]
    pub(super) fn apply_assignments(&mut self) -> Result<(), TypeCheckError> {
        let mut generated = Vec::new();
        for i in self.assigns.clone() {
            let ItemKind::Assign { name, expr, .. } = self.items[i].kind.clone() else {
                continue;
            };
            let span = self.items[i].span;
            self.items[i].removed = true;
            let decl = match self.topo.get(self.model, self.model.name_str(name), span) {
                Ok(decl) => decl,
                Err(err) if self.env.options.ignore_unknown_ids => {
                    tracing::debug!(%err, "skipping assignment to unknown identifier");
                    continue;
                }
                Err(err) => return Err(err),
            };
            if let ItemKind::Assign { decl: target, .. } = &mut self.items[i].kind {
                *target = Some(decl);
            }
            let Some(vd) = self.model.var_decl(decl).cloned() else {
                continue;
            };

            if vd.init.is_some() {
                if self.env.options.allow_multi_assignment {
                    let lhs = self.model.id_of(decl);
                    let eq = self.model.binop(BinOpKind::Eq, lhs, expr);
                    self.model.at(eq, span);
                    self.push_item(Item::new(ItemKind::Constraint(eq), span), None);
                } else {
                    self.errors.push(TypeCheckError::new(
                        TypeErrorKind::DuplicateDefinition,
                        span,
                        "multiple assignment to the same variable",
                    ));
                }
                continue;
            }

            if let Some(vd) = self.model.var_decl_mut(decl) {
                vd.init = Some(expr);
            }
            let ann = self
                .env
                .ann_ref(self.model, self.env.names.rhs_from_assignment, span);
            self.model.annotate(decl, ann);
            if self.model.type_inst(vd.ti).is_some_and(|t| t.is_enum) {
                let enum_id = self.model.arena.ty(decl).enum_id;
                create_enum_mapper(
                    self.model,
                    self.env,
                    enum_id,
                    decl,
                    &mut generated,
                    &mut self.topo.enum_book,
                )?;
            }
        }
        self.splice_generated(generated)
    }

    /// Give every string conversion referenced by enum constructors but
    /// never generated (the argument was a plain integer set) a body that
    /// shows the integer.
    pub(super) fn backfill_to_string(&mut self) -> Result<(), TypeCheckError> {
        let needed = self.topo.enum_book.need_to_string.clone();
        for name in needed {
            let fname = self.model.intern(&name);
            if self.env.fns.contains(fname) {
                continue;
            }
            let x_ti = self.model.ti(Type::par_int().with_opt(true));
            let x = self.model.mk_var_decl("x", x_ti, None);
            let b_ti = self.model.ti(Type::par_bool());
            let b = self.model.mk_var_decl("b", b_ti, None);
            let json_ti = self.model.ti(Type::par_bool());
            let json = self.model.mk_var_decl("json", json_ti, None);
            let x_ref = self.model.id_of(x);
            let body = self.model.call("show", vec![x_ref]);
            let ret = self.model.ti(Type::par_string());
            let fid = self.model.push_function(FunctionDecl::new(
                fname,
                vec![x, b, json],
                ret,
                Some(body),
            ));
            self.env.fns.register(self.model, fid, true)?;
            self.push_item(Item::new(ItemKind::Function(fid), Span::DUMMY), None);
            tracing::trace!(%name, "backfilled string conversion");
        }
        Ok(())
    }

    /// Bind identifiers and order all declarations.
    #[tracing::instrument(level = "debug", skip_all)]
    pub(super) fn order(&mut self) -> Result<(), TypeCheckError> {
        for i in 0..self.items.len() {
            if self.items[i].removed {
                continue;
            }
            match self.items[i].kind.clone() {
                ItemKind::VarDecl(e) | ItemKind::Constraint(e) => {
                    self.topo.run(self.model, self.env, e)?;
                }
                ItemKind::Solve(si) => {
                    for a in si.anns {
                        self.topo.run(self.model, self.env, a)?;
                    }
                    if let Some(obj) = si.objective {
                        self.topo.run(self.model, self.env, obj)?;
                    }
                }
                ItemKind::Output { expr, anns } => {
                    self.topo.run(self.model, self.env, expr)?;
                    for a in anns {
                        self.topo.run(self.model, self.env, a)?;
                    }
                }
                ItemKind::Function(fid) => self.order_function(fid)?,
                ItemKind::Assign { .. } | ItemKind::Include { .. } => {}
            }
        }
        let parts: Vec<ExprId> = self
            .topo
            .enum_book
            .part_args
            .iter()
            .map(|&(_, e)| e)
            .collect();
        for e in parts {
            self.topo.run(self.model, self.env, e)?;
        }
        tracing::debug!(decls = self.topo.decls.len(), "ordered declarations");
        Ok(())
    }

    fn order_function(&mut self, fid: FnId) -> Result<(), TypeCheckError> {
        let f = self.model.fun(fid).clone();
        self.topo.run(self.model, self.env, f.ti)?;
        for &p in f.params.iter().chain(f.captured_anns.iter()) {
            self.topo.run(self.model, self.env, p)?;
        }
        for &a in &f.anns {
            self.topo.run(self.model, self.env, a)?;
        }
        let Some(body) = f.body else {
            return Ok(());
        };
        self.topo.scopes.push_function();
        let result = self.order_body(&f, body);
        self.topo.scopes.pop();
        result
    }

    fn order_body(&mut self, f: &FunctionDecl, body: ExprId) -> Result<(), TypeCheckError> {
        for &p in f.params.iter().chain(f.captured_anns.iter()) {
            self.topo.scopes.add(self.model, p)?;
        }
        self.topo.run(self.model, self.env, body)
    }

    /// Included items first, then declarations in dependency order, then
    /// everything else in model order.
    pub(super) fn sort_items(&mut self) {
        let items = std::mem::take(&mut self.items);
        let origins = std::mem::take(&mut self.origins);
        let mut keyed: Vec<_> = items
            .into_iter()
            .zip(origins)
            .map(|(item, origin)| {
                let own = u8::from(origin.is_none());
                let key = match item.kind {
                    ItemKind::VarDecl(decl) => {
                        (own, 0u8, self.topo.position(decl).unwrap_or(u32::MAX))
                    }
                    _ => (own, 1, 0),
                };
                (key, item, origin)
            })
            .collect();
        keyed.sort_by_key(|(key, _, _)| *key);
        for (_, item, origin) in keyed {
            self.push_item(item, origin);
        }
        self.assigns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::introduced_number;

    #[test]
    fn test_introduced_number() {
        assert_eq!(introduced_number("X_INTRODUCED_12_"), Some(12));
        assert_eq!(introduced_number("X_INTRODUCED_12"), None);
        assert_eq!(introduced_number("x"), None);
    }
}
