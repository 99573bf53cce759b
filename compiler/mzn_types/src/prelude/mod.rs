//! Builtin prelude.
//!
//! The operators, conversions and library functions the checker itself
//! relies on, written in a compact signature notation (see [`parse`]) and
//! installed as an `include` item ahead of the user's items. They are
//! declarations only: nothing here has a body, and everything is marked
//! `from_stdlib`.
//!
//! Families that differ only in an operator name or an arity
//! (`index_set_<i>of<n>`, `slice_<n>d`, comparisons, counting builtins)
//! are generated rather than listed.

mod parse;

use mzn_ir::ast::{FunctionDecl, Item, ItemKind, Symbol};
use mzn_ir::{Model, Span};

use crate::TypeCheckError;

use parse::SigParser;

/// Include path under which the prelude is installed.
pub const PRELUDE_PATH: &str = "stdlib.mzn";

/// Highest arity of generated `index_set_<i>of<n>` and `slice_<n>d` builtins.
const MAX_ARRAY_DIM: usize = 6;

const SIGNATURES: &str = r"
int: '+'(int, int)
var int: '+'(var int, var int)
opt int: '+'(opt int, opt int)
var opt int: '+'(var opt int, var opt int)
float: '+'(float, float)
var float: '+'(var float, var float)
int: '-'(int, int)
var int: '-'(var int, var int)
opt int: '-'(opt int, opt int)
var opt int: '-'(var opt int, var opt int)
float: '-'(float, float)
var float: '-'(var float, var float)
int: '*'(int, int)
var int: '*'(var int, var int)
opt int: '*'(opt int, opt int)
var opt int: '*'(var opt int, var opt int)
float: '*'(float, float)
var float: '*'(var float, var float)
float: '/'(float, float)
var float: '/'(var float, var float)
int: 'div'(int, int)
var int: 'div'(var int, var int)
int: 'mod'(int, int)
var int: 'mod'(var int, var int)
int: '^'(int, int)
var int: '^'(var int, var int)
float: '^'(float, float)
var float: '^'(var float, var float)
int: '-'(int)
var int: '-'(var int)
float: '-'(float)
var float: '-'(var float)
int: '+'(int)
var int: '+'(var int)
float: '+'(float)
var float: '+'(var float)
bool: 'not'(bool)
var bool: 'not'(var bool)
bool: '='(array[$X] of $T, array[$X] of $T)
var bool: '='(array[$X] of any $T, array[$X] of any $T)
bool: '!='(array[$X] of $T, array[$X] of $T)
var bool: '!='(array[$X] of any $T, array[$X] of any $T)
set of $$E: '..'($$E, $$E)
set of float: '..'(float, float)
set of int: '..<'()
set of int: '<..'()
set of int: '<..<'()
set of $$E: '..<'(set of $$E)
set of $$E: '<..'(set of $$E)
set of $$E: '<..<'(set of $$E)
bool: 'in'(int, set of int)
var bool: 'in'(var int, var set of int)
var bool: 'in'(var opt int, set of int)
bool: 'in'(float, set of float)
bool: 'subset'(set of int, set of int)
var bool: 'subset'(var set of int, var set of int)
bool: 'superset'(set of int, set of int)
var bool: 'superset'(var set of int, var set of int)
set of $$E: 'union'(set of $$E, set of $$E)
var set of $$E: 'union'(var set of $$E, var set of $$E)
set of $$E: 'diff'(set of $$E, set of $$E)
var set of $$E: 'diff'(var set of $$E, var set of $$E)
set of $$E: 'symdiff'(set of $$E, set of $$E)
var set of $$E: 'symdiff'(var set of $$E, var set of $$E)
set of $$E: 'intersect'(set of $$E, set of $$E)
var set of $$E: 'intersect'(var set of $$E, var set of $$E)
string: '++'(string, string)
array[int] of any $T: '++'(array[int] of any $T, array[int] of any $T)
int: bool2int(bool)
var int: bool2int(var bool)
opt int: bool2int(opt bool)
var opt int: bool2int(var opt bool)
array[$X] of int: bool2int(array[$X] of bool)
array[$X] of var int: bool2int(array[$X] of var bool)
array[$X] of opt int: bool2int(array[$X] of opt bool)
array[$X] of var opt int: bool2int(array[$X] of var opt bool)
float: bool2float(bool)
var float: bool2float(var bool)
opt float: bool2float(opt bool)
var opt float: bool2float(var opt bool)
array[$X] of float: bool2float(array[$X] of bool)
array[$X] of var float: bool2float(array[$X] of var bool)
float: int2float(int)
var float: int2float(var int)
opt float: int2float(opt int)
var opt float: int2float(var opt int)
array[$X] of float: int2float(array[$X] of int)
array[$X] of var float: int2float(array[$X] of var int)
array[$X] of opt float: int2float(array[$X] of opt int)
array[$X] of var opt float: int2float(array[$X] of var opt int)
array[int] of $$E: set2array(set of $$E)
set of $$E: index_set(array[$$E] of any $T)
array[int] of any $T: array1d(array[$X] of any $T)
int: length(array[$X] of any $T)
string: show(any $T)
string: show(array[$X] of any $T)
string: showDzn(any $T)
string: showDzn(array[$X] of any $T)
string: showJSON(any $T)
string: showJSON(array[$X] of any $T)
string: format(any $T)
string: format(int, any $T)
string: format(array[$X] of any $T)
string: format(int, array[$X] of any $T)
string: showDznId(string)
string: join(string, array[$X] of string)
string: concat(array[$X] of string)
int: card(set of $$E)
var int: card(var set of $$E)
$$E: min(set of $$E)
$$E: max(set of $$E)
int: min(int, int)
var int: min(var int, var int)
float: min(float, float)
var float: min(var float, var float)
int: max(int, int)
var int: max(var int, var int)
float: max(float, float)
var float: max(var float, var float)
int: min(array[$X] of int)
var int: min(array[$X] of var int)
float: min(array[$X] of float)
var float: min(array[$X] of var float)
int: max(array[$X] of int)
var int: max(array[$X] of var int)
float: max(array[$X] of float)
var float: max(array[$X] of var float)
int: sum(array[$X] of int)
var int: sum(array[$X] of var int)
var int: sum(array[$X] of var opt int)
float: sum(array[$X] of float)
var float: sum(array[$X] of var float)
int: count(array[$X] of bool)
var int: count(array[$X] of var bool)
var int: count(array[$X] of var opt bool)
int: count(array[$X] of int, int)
var int: count(array[$X] of var int, var int)
bool: forall(array[$X] of bool)
var bool: forall(array[$X] of var bool)
bool: exists(array[$X] of bool)
var bool: exists(array[$X] of var bool)
$$E: to_enum(set of $$E, int)
var $$E: to_enum(set of $$E, var int)
opt $$E: to_enum(set of $$E, opt int)
var opt $$E: to_enum(set of $$E, var opt int)
set of $$E: to_enum(set of $$E, set of int)
var set of $$E: to_enum(set of $$E, var set of int)
array[$X] of $$E: to_enum(set of $$E, array[$X] of int)
array[$X] of var $$E: to_enum(set of $$E, array[$X] of var int)
set of $$E: enum_of(var opt $$E)
set of $$E: enum_of(var set of $$E)
set of $$E: enum_of(array[$X] of var opt $$E)
set of $$E: enum_of_internal(set of $$E)
set of $$E: enumFromConstructors(array[int] of set of $$E)
bool: occurs(opt $T)
var bool: occurs(var opt $T)
bool: absent(opt $T)
var bool: absent(var opt $T)
$T: deopt(opt $T)
var $T: deopt(var opt $T)
bool: assert(bool, string)
any $T: assert(bool, string, any $T)
any $T: mzn_deprecate(string, string, string, any $T)
var int: objective_deopt_(var opt int, bool)
var float: objective_deopt_(var opt float, bool)
var bool: symmetry_breaking_constraint(var bool)
var bool: redundant_constraint(var bool)
var bool: implied_constraint(var bool)
var bool: mzn_symmetry_breaking_constraint(var bool)
var bool: mzn_redundant_constraint(var bool)
set of int: anon_enum(int)
set of int: anon_enum(array[int] of $$E)
set of int: anon_enum_set(set of int)
ann: output_only
ann: mzn_was_undefined
ann: rhs_from_assignment
ann: mzn_check_var
ann: annotated_expression
ann: ctx_pos
ann: ctx_neg
ann: empty_annotation
ann: mzn_check_enum_var(array[int] of set of int)
ann: mzn_output_section(string)
ann: mzn_deprecated(string, string)
ann: mzn_add_annotated_expression(int)
";

const COMPARISONS: [&str; 6] = ["'='", "'!='", "'<'", "'<='", "'>'", "'>='"];

const COMPARISON_OPERANDS: [(&str, &str); 11] = [
    ("bool", "bool"),
    ("var bool", "var bool"),
    ("bool", "int"),
    ("var bool", "var int"),
    ("bool", "opt int"),
    ("var bool", "var opt int"),
    ("bool", "float"),
    ("var bool", "var float"),
    ("bool", "string"),
    ("bool", "set of int"),
    ("var bool", "var set of int"),
];

const LOGIC: [&str; 6] = ["'/\\'", "'\\/'", "'->'", "'<-'", "'<->'", "'xor'"];

/// `count_eq` and friends, the targets of the counting rewrite.
const COUNTING: [&str; 6] = [
    "count_eq",
    "count_neq",
    "count_lt",
    "count_leq",
    "count_gt",
    "count_geq",
];

/// Every builtin signature line.
fn signature_lines() -> Vec<String> {
    let mut lines: Vec<String> = SIGNATURES
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect();
    for op in COMPARISONS {
        for (ret, operand) in COMPARISON_OPERANDS {
            lines.push(format!("{ret}: {op}({operand}, {operand})"));
        }
    }
    for op in LOGIC {
        lines.push(format!("bool: {op}(bool, bool)"));
        lines.push(format!("var bool: {op}(var bool, var bool)"));
    }
    for name in COUNTING {
        lines.push(format!(
            "var bool: {name}(array[$X] of var int, var int, var int)"
        ));
    }
    for n in 2..=MAX_ARRAY_DIM {
        for i in 1..=n {
            let idx: Vec<&str> = (1..=n).map(|k| if k == i { "$$E" } else { "int" }).collect();
            lines.push(format!(
                "set of $$E: index_set_{i}of{n}(array[{}] of any $T)",
                idx.join(", ")
            ));
        }
    }
    for n in 1..=MAX_ARRAY_DIM {
        let vars: Vec<String> = (1..=n).map(|k| format!("$$E{k}")).collect();
        let sets: Vec<String> = vars.iter().map(|v| format!("set of {v}")).collect();
        lines.push(format!(
            "array[{}] of any $T: slice_{n}d(array[$X] of any $T, array[int] of set of int, {})",
            vars.join(", "),
            sets.join(", ")
        ));
    }
    lines
}

/// Prepend the builtin prelude to `model` as an include item.
///
/// Installing twice is a no-op.
pub fn install_prelude(model: &mut Model) -> Result<(), TypeCheckError> {
    let path = model.intern(PRELUDE_PATH);
    let installed = model
        .items
        .iter()
        .any(|it| matches!(&it.kind, ItemKind::Include { path: p, .. } if *p == path));
    if installed {
        return Ok(());
    }
    let mut items = Vec::new();
    for line in signature_lines() {
        let sig = SigParser::new(model, &line)?.signature()?;
        let kind = match sig.params {
            Some(param_tis) => {
                let params = param_tis
                    .into_iter()
                    .enumerate()
                    .map(|(i, ti)| model.mk_var_decl(&format!("x{i}"), ti, None))
                    .collect();
                let mut decl = FunctionDecl::new(sig.name, params, sig.ti, None);
                decl.from_stdlib = true;
                ItemKind::Function(model.push_function(decl))
            }
            None => {
                let vd = model.decl_node(Symbol::named(sig.name), sig.ti, None, true);
                ItemKind::VarDecl(vd)
            }
        };
        items.push(Item::new(kind, Span::DUMMY));
    }
    tracing::debug!(count = items.len(), "installed builtin prelude");
    model
        .items
        .insert(0, Item::new(ItemKind::Include { path, items }, Span::DUMMY));
    Ok(())
}
