//! Pre-interned builtin names.
//!
//! The checker recognises a fixed set of builtins by name: conversions it
//! inserts, calls it rewrites, and annotations it attaches. Interning them
//! once at startup turns every "is this `show`?" test into a `Name`
//! comparison.

use mzn_ir::{Name, StringInterner};

/// Names of the builtins the checker refers to directly.
#[derive(Debug)]
pub(crate) struct WellKnownNames {
    // Conversions
    pub bool2int: Name,
    pub bool2float: Name,
    pub int2float: Name,
    pub set2array: Name,
    pub array1d: Name,
    pub index_set: Name,

    // Output
    pub show: Name,
    pub show_dzn: Name,
    pub show_json: Name,
    pub format: Name,

    // Counting rewrite
    pub count: Name,
    pub sum: Name,

    // Enums
    pub to_enum: Name,
    pub enum_of: Name,
    pub enum_of_internal: Name,
    pub enum_from_constructors: Name,
    pub anon_enum: Name,
    pub anon_enum_set: Name,

    // Rewritten calls
    pub symmetry_breaking_constraint: Name,
    pub redundant_constraint: Name,
    pub implied_constraint: Name,
    pub mzn_symmetry_breaking_constraint: Name,
    pub mzn_redundant_constraint: Name,
    pub mzn_deprecate: Name,
    pub objective_deopt: Name,

    // Open interval markers
    pub open_upper: Name, // "'..<'"
    pub open_lower: Name, // "'<..'"
    pub open_both: Name,  // "'<..<'"

    // Annotations
    pub output_only: Name,
    pub mzn_was_undefined: Name,
    pub rhs_from_assignment: Name,
    pub mzn_check_var: Name,
    pub mzn_check_enum_var: Name,
    pub mzn_output_section: Name,
    pub mzn_deprecated: Name,
    pub mzn_add_annotated_expression: Name,
    pub annotated_expression: Name,
    pub ctx_pos: Name,
    pub ctx_neg: Name,
    pub empty_annotation: Name,

    // Lifted objectives
    pub objective: Name,
    pub checker_objective: Name,
}

impl WellKnownNames {
    pub fn new(interner: &StringInterner) -> Self {
        Self {
            bool2int: interner.intern("bool2int"),
            bool2float: interner.intern("bool2float"),
            int2float: interner.intern("int2float"),
            set2array: interner.intern("set2array"),
            array1d: interner.intern("array1d"),
            index_set: interner.intern("index_set"),
            show: interner.intern("show"),
            show_dzn: interner.intern("showDzn"),
            show_json: interner.intern("showJSON"),
            format: interner.intern("format"),
            count: interner.intern("count"),
            sum: interner.intern("sum"),
            to_enum: interner.intern("to_enum"),
            enum_of: interner.intern("enum_of"),
            enum_of_internal: interner.intern("enum_of_internal"),
            enum_from_constructors: interner.intern("enumFromConstructors"),
            anon_enum: interner.intern("anon_enum"),
            anon_enum_set: interner.intern("anon_enum_set"),
            symmetry_breaking_constraint: interner.intern("symmetry_breaking_constraint"),
            redundant_constraint: interner.intern("redundant_constraint"),
            implied_constraint: interner.intern("implied_constraint"),
            mzn_symmetry_breaking_constraint: interner.intern("mzn_symmetry_breaking_constraint"),
            mzn_redundant_constraint: interner.intern("mzn_redundant_constraint"),
            mzn_deprecate: interner.intern("mzn_deprecate"),
            objective_deopt: interner.intern("objective_deopt_"),
            open_upper: interner.intern("'..<'"),
            open_lower: interner.intern("'<..'"),
            open_both: interner.intern("'<..<'"),
            output_only: interner.intern("output_only"),
            mzn_was_undefined: interner.intern("mzn_was_undefined"),
            rhs_from_assignment: interner.intern("rhs_from_assignment"),
            mzn_check_var: interner.intern("mzn_check_var"),
            mzn_check_enum_var: interner.intern("mzn_check_enum_var"),
            mzn_output_section: interner.intern("mzn_output_section"),
            mzn_deprecated: interner.intern("mzn_deprecated"),
            mzn_add_annotated_expression: interner.intern("mzn_add_annotated_expression"),
            annotated_expression: interner.intern("annotated_expression"),
            ctx_pos: interner.intern("ctx_pos"),
            ctx_neg: interner.intern("ctx_neg"),
            empty_annotation: interner.intern("empty_annotation"),
            objective: interner.intern("_objective"),
            checker_objective: interner.intern("_checker_objective"),
        }
    }

    /// Whether `name` is one of the open interval markers (`..<`, `<..`, `<..<`).
    pub fn is_open_marker(&self, name: Name) -> bool {
        name == self.open_upper || name == self.open_lower || name == self.open_both
    }

    /// Whether `name` renders a value as text and may need an enum-aware rewrite.
    pub fn is_show_like(&self, name: Name) -> bool {
        name == self.show || name == self.show_dzn || name == self.show_json || name == self.format
    }
}
