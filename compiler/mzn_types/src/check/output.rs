//! Output sections.

use mzn_ir::ast::{ExprKind, ItemKind};
use mzn_ir::ExprId;

use super::{ModelChecker, OutputSection};
use crate::eval::eval_string;
use crate::TypeCheckError;

const DEFAULT_SECTION: &str = "default";

impl ModelChecker<'_> {
    /// Group output items by their `mzn_output_section` name and take them
    /// out of the model.
    #[tracing::instrument(level = "debug", skip_all)]
    pub(super) fn collect_output_sections(&mut self) {
        let marker = self.env.names.mzn_output_section;
        for i in 0..self.items.len() {
            if self.items[i].removed {
                continue;
            }
            let ItemKind::Output { expr, anns } = &self.items[i].kind else {
                continue;
            };
            let expr = *expr;
            let section_arg = anns.iter().find_map(|&a| match self.model.arena.kind(a) {
                ExprKind::Call { name, args, .. } if *name == marker && args.len() == 1 => {
                    Some(args[0])
                }
                _ => None,
            });
            let name = match section_arg {
                Some(arg) => match eval_string(self.model, arg) {
                    Ok(name) => name,
                    Err(err) => {
                        self.errors.push(TypeCheckError::from(err));
                        continue;
                    }
                },
                None => DEFAULT_SECTION.to_owned(),
            };
            self.add_to_section(name, expr);
            self.items[i].removed = true;
        }
        tracing::debug!(sections = self.output_sections.len(), "collected output sections");
    }

    fn add_to_section(&mut self, name: String, expr: ExprId) {
        match self.output_sections.iter_mut().find(|s| s.name == name) {
            Some(section) => section.exprs.push(expr),
            None => self.output_sections.push(OutputSection {
                name,
                exprs: vec![expr],
            }),
        }
    }
}
