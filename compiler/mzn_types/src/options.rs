//! Type checking configuration.

use mzn_ir::Model;

/// Switches that relax or alter the checking passes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypecheckOptions {
    /// Do not report undefined parameters in the final pass.
    pub ignore_undefined_parameters: bool,
    /// Turn a second assignment to a declaration into an equality constraint.
    pub allow_multi_assignment: bool,
    /// Drop annotations that fail to resolve and skip assignments to
    /// unknown names instead of failing.
    pub ignore_unknown_ids: bool,
    /// The input is FlatZinc: no include combination, objective lifting,
    /// par specialization or output sections.
    pub is_flatzinc: bool,
    /// The input is a solution-checker model.
    pub is_checker: bool,
}

impl TypecheckOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults for `model`; `is_checker` follows the file name.
    pub fn for_model(model: &Model) -> Self {
        let file = model.name_str(model.filename);
        TypecheckOptions {
            is_checker: file.ends_with(".mzc") || file.ends_with(".mzc.mzn"),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_ignore_undefined_parameters(mut self, on: bool) -> Self {
        self.ignore_undefined_parameters = on;
        self
    }

    #[must_use]
    pub fn with_allow_multi_assignment(mut self, on: bool) -> Self {
        self.allow_multi_assignment = on;
        self
    }

    #[must_use]
    pub fn with_ignore_unknown_ids(mut self, on: bool) -> Self {
        self.ignore_unknown_ids = on;
        self
    }

    #[must_use]
    pub fn with_flatzinc(mut self, on: bool) -> Self {
        self.is_flatzinc = on;
        self
    }

    #[must_use]
    pub fn with_checker(mut self, on: bool) -> Self {
        self.is_checker = on;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checker_detected_from_file_name() {
        assert!(TypecheckOptions::for_model(&Model::new("sol.mzc")).is_checker);
        assert!(TypecheckOptions::for_model(&Model::new("sol.mzc.mzn")).is_checker);
        assert!(!TypecheckOptions::for_model(&Model::new("model.mzn")).is_checker);
    }

    #[test]
    fn test_builder_methods() {
        let opts = TypecheckOptions::new()
            .with_allow_multi_assignment(true)
            .with_ignore_unknown_ids(true);
        assert!(opts.allow_multi_assignment);
        assert!(opts.ignore_unknown_ids);
        assert!(!opts.is_flatzinc);
    }
}
