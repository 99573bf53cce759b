//! Checks that need the fully typed model.

use mzn_ir::ast::{ExprKind, ItemKind};
use mzn_ir::{ExprId, Type};

use super::{ModelChecker, Shadow};
use crate::coerce::resolved_call;
use crate::eval::eval_par;
use crate::{TypeCheckError, TypeErrorKind};

const CHECKER_SUFFIX: &str = " (required by solution checker model)";

impl ModelChecker<'_> {
    /// Evaluate the contiguity assertions generated for enum constructors.
    /// Assertions over values not known yet are left for later stages.
    pub(super) fn check_enum_assertions(&mut self) {
        for &assertion in &self.topo.enum_book.assertions {
            match eval_par(self.model, assertion) {
                Ok(_) => {}
                Err(err) if err.is_undetermined() => {
                    tracing::trace!(%err, "enum assertion not decidable yet");
                }
                Err(err) => self.errors.push(TypeCheckError::from(err)),
            }
        }
    }

    /// Default undefined optional parameters to `<>`, report the other
    /// undefined parameters, and drop the enum marker from enum
    /// declarations.
    #[tracing::instrument(level = "debug", skip_all)]
    pub(super) fn finalize_decls(&mut self) {
        let decls = self.topo.decls.clone();
        for decl in decls {
            let Some(vd) = self.model.var_decl(decl).cloned() else {
                continue;
            };
            if !vd.toplevel {
                continue;
            }
            let ty = self.model.arena.ty(decl);
            if vd.init.is_none() && ty.is_par() && !ty.is_ann() {
                if ty.is_opt() && ty.dim == 0 {
                    let absent = self.model.absent();
                    if let Some(vd) = self.model.var_decl_mut(decl) {
                        vd.init = Some(absent);
                    }
                    let span = self.model.arena.span(decl);
                    let ann = self
                        .env
                        .ann_ref(self.model, self.env.names.mzn_was_undefined, span);
                    self.model.annotate(decl, ann);
                } else if !self.env.options.ignore_undefined_parameters {
                    self.errors.push(TypeCheckError::new(
                        TypeErrorKind::MissingParameterData,
                        self.model.arena.span(decl),
                        format!(
                            "symbol error: variable `{}' must be defined (did you forget to specify a data file?)",
                            self.model.symbol_str(vd.id)
                        ),
                    ));
                }
            }
            if let ExprKind::TypeInst(ti) = &mut self.model.arena.get_mut(vd.ti).kind {
                if ti.is_enum {
                    ti.is_enum = false;
                    let stripped = self.model.arena.ty(vd.ti).with_enum(0);
                    self.model.arena.set_ty(vd.ti, stripped);
                    self.model.arena.set_ty(decl, ty.with_enum(0));
                }
            }
        }
    }

    /// Declarations a solution checker requires must exist (unless they
    /// are variables) and be compatible with the checker's types.
    pub(super) fn check_solution_vars(&mut self) -> Result<(), TypeCheckError> {
        let check_vars = self.env.check_vars.clone();
        for cv in check_vars {
            let decl = match self.topo.get(self.model, &cv.name, cv.span) {
                Ok(decl) => decl,
                Err(_) if cv.ty.is_var() => continue,
                Err(err) => {
                    self.errors.push(err.with_suffix(CHECKER_SUFFIX));
                    continue;
                }
            };
            let span = self.model.arena.span(decl);
            let ann = self
                .env
                .ann_ref(self.model, self.env.names.mzn_check_var, span);
            self.model.annotate(decl, ann);

            let ty = self.model.arena.ty(decl);
            if ty.enum_id != 0 {
                let ann = self.check_enum_var_ann(ty, span)?;
                self.model.annotate(decl, ann);
            }
            if !cv.ty.is_subtype_of(&ty, false) {
                let message = format!(
                    "Solution checker requires `{}' to be of type `{}'",
                    cv.name,
                    self.env.show(self.model, cv.ty.to_var())
                );
                self.errors
                    .push(TypeCheckError::mismatch(cv.span, message).with_suffix(CHECKER_SUFFIX));
            }
        }
        Ok(())
    }

    /// `mzn_check_enum_var([E1, {}, E2])`: the enum of each index set and
    /// of the element, `{}` where there is none.
    fn check_enum_var_ann(&mut self, ty: Type, span: mzn_ir::Span) -> Result<ExprId, TypeCheckError> {
        let ids = if ty.dim == 0 {
            vec![ty.enum_id]
        } else {
            self.env.enums.array_components(ty)
        };
        let mut elems = Vec::with_capacity(ids.len());
        for id in ids {
            let elem = match self.env.enums.enum_decl(id) {
                Some(enum_decl) => self.model.id_of(enum_decl),
                None => self.model.set_lit(Vec::new()),
            };
            self.model.arena.set_ty(elem, Type::par_set_int());
            elems.push(elem);
        }
        let arr = self.model.array_lit(elems);
        self.model.arena.set_ty(arr, Type::par_set_int().with_dim(1));
        let name = self.env.names.mzn_check_enum_var;
        resolved_call(self.model, self.env, name, vec![arr], span, false)
    }

    /// FlatZinc keeps no annotated-expression variants.
    pub(super) fn remove_shadows(&mut self) {
        for item in &mut self.items {
            let shadow = match item.kind {
                ItemKind::VarDecl(decl) => Shadow::Atom(decl),
                ItemKind::Function(fid) => Shadow::Function(fid),
                _ => continue,
            };
            if self.shadows.contains(&shadow) {
                item.removed = true;
            }
        }
    }
}
