//! Model-level type checking driver.
//!
//! The `ModelChecker` runs every pass over one model, coordinating the
//! dependency orderer, the enum synthesizer, the function table and the
//! typer.
//!
//! # Architecture
//!
//! ```text
//! Registration
//!   - flatten includes into one working item list
//!   - register function signatures (and annotated-expression shadows)
//!   - add declarations to the orderer, synthesizing enums
//!   - lift the objective into `_objective`
//!   - apply assignment items, backfill `_toString_` functions
//!
//! Ordering
//!   - bind identifiers, order declarations, sort the items
//!
//! Typing
//!   Pass 1: declared types of declarations and function signatures
//!   - refresh the function table, check anonymous enum arguments
//!   Pass 2: initializers, constraints, solve, output, function bodies
//!
//! Finalization
//!   - enum contiguity assertions, output sections
//!   - par specialization, overload ambiguity
//!   - undefined parameters, solution-checker variables
//! ```
//!
//! Errors found while typing one item are collected and checking moves on
//! to the next item; a fail-fast error aborts the run. Either way the
//! working item list is written back to the model.

use mzn_ir::ast::{Item, ItemKind};
use mzn_ir::{ExprId, FnId, Model, Name};

use crate::{CheckEnv, TopoSorter, TypeCheckError, TypecheckFailure};

pub use api::{typecheck, typecheck_assignment};

mod api;
mod bodies;
mod finalize;
mod output;
mod par_specialize;
mod registration;
mod well_known;

pub(crate) use well_known::WellKnownNames;

/// Output items sharing one `mzn_output_section` name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputSection {
    pub name: String,
    /// Output expressions in model order.
    pub exprs: Vec<ExprId>,
}

/// Result of a successful run.
#[derive(Debug)]
pub struct TypecheckOutcome {
    sorter: TopoSorter,
    pub output_sections: Vec<OutputSection>,
}

impl TypecheckOutcome {
    /// Every declaration (top-level and local) in dependency order.
    pub fn decls(&self) -> &[ExprId] {
        &self.sorter.decls
    }

    pub fn sorter(&self) -> &TopoSorter {
        &self.sorter
    }
}

/// Item generated for a parameter annotated `::annotated_expression`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Shadow {
    Atom(ExprId),
    Function(FnId),
}

/// Working state of one run.
pub(crate) struct ModelChecker<'a> {
    model: &'a mut Model,
    env: &'a mut CheckEnv,
    topo: TopoSorter,
    /// Items of the model and its includes, in one list.
    items: Vec<Item>,
    /// Include each item came from; `None` for the model's own items.
    origins: Vec<Option<Name>>,
    /// Positions of assignment items, valid until the items are sorted.
    assigns: Vec<usize>,
    shadows: Vec<Shadow>,
    output_sections: Vec<OutputSection>,
    errors: Vec<TypeCheckError>,
}

impl<'a> ModelChecker<'a> {
    pub(crate) fn new(model: &'a mut Model, env: &'a mut CheckEnv) -> Self {
        ModelChecker {
            model,
            env,
            topo: TopoSorter::new(),
            items: Vec::new(),
            origins: Vec::new(),
            assigns: Vec::new(),
            shadows: Vec::new(),
            output_sections: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Run every pass. Accumulated errors stay in `self.errors`.
    fn run(&mut self) -> Result<(), TypeCheckError> {
        self.combine();
        self.register_functions()?;
        self.register_decls()?;
        self.apply_assignments()?;
        self.backfill_to_string()?;
        self.order()?;
        self.sort_items();

        self.declare_types()?;
        let fix_errors = self.env.fns.fix(self.model);
        self.errors.extend(fix_errors);
        self.check_enum_parts()?;
        self.check_items()?;

        if self.errors.is_empty() {
            self.check_enum_assertions();
        }
        if self.env.options.is_flatzinc {
            self.remove_shadows();
        } else if self.errors.is_empty() {
            self.collect_output_sections();
            self.specialize_par_functions()?;
        }
        let overloading = self.env.fns.check_overloading(self.model);
        self.errors.extend(overloading);
        self.finalize_decls();
        self.check_solution_vars()?;
        Ok(())
    }

    fn push_item(&mut self, item: Item, origin: Option<Name>) {
        self.items.push(item);
        self.origins.push(origin);
    }

    fn drain_warnings(&mut self) {
        let warnings = self.topo.scopes.take_warnings();
        self.env.warnings.extend(warnings);
    }

    /// Write the working items back to the model, dropping removed ones.
    /// FlatZinc keeps its includes as include items.
    fn write_back(&mut self) {
        let items = std::mem::take(&mut self.items);
        let origins = std::mem::take(&mut self.origins);
        let keep_includes = self.env.options.is_flatzinc;
        let mut includes: Vec<Item> = Vec::new();
        let mut own = Vec::with_capacity(items.len());
        for (item, origin) in items.into_iter().zip(origins) {
            if item.removed {
                continue;
            }
            match origin {
                Some(path) if keep_includes => {
                    let existing = includes.iter_mut().find(
                        |inc| matches!(&inc.kind, ItemKind::Include { path: p, .. } if *p == path),
                    );
                    match existing {
                        Some(Item {
                            kind: ItemKind::Include { items, .. },
                            ..
                        }) => items.push(item),
                        _ => includes.push(Item::new(
                            ItemKind::Include {
                                path,
                                items: vec![item],
                            },
                            mzn_ir::Span::DUMMY,
                        )),
                    }
                }
                _ => own.push(item),
            }
        }
        includes.extend(own);
        self.model.items = includes;
    }

    /// Hand the run's result back, writing the items to the model.
    fn finish(
        mut self,
        result: Result<(), TypeCheckError>,
    ) -> Result<TypecheckOutcome, TypecheckFailure> {
        self.drain_warnings();
        self.write_back();
        result?;
        if !self.errors.is_empty() {
            tracing::debug!(errors = self.errors.len(), "type checking failed");
            return Err(TypecheckFailure::Errors(self.errors));
        }
        Ok(TypecheckOutcome {
            sorter: self.topo,
            output_sections: self.output_sections,
        })
    }
}

#[cfg(test)]
mod integration_tests;
