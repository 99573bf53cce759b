//! Property-based tests for subtyping, coercion and name suggestions.
//!
//! - subtyping is reflexive and transitive over scalar and array types
//! - coercing an already coerced expression to the same target is a no-op
//! - edit distance behaves like a metric on short identifiers

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
#![allow(
    clippy::redundant_closure_for_method_calls,
    reason = "Proptest macros generate code with these patterns"
)]

use mzn_ir::ast::ItemKind;
use mzn_ir::{BaseType, Inst, Model, Type};
use mzn_types::{coerce, edit_distance, install_prelude, CheckEnv, EnumRegistry, TypecheckOptions};
use proptest::prelude::*;

// -- Strategies --

fn inst_strategy() -> impl Strategy<Value = Inst> {
    prop_oneof![Just(Inst::Par), Just(Inst::Var)]
}

fn base_strategy() -> impl Strategy<Value = BaseType> {
    prop_oneof![
        Just(BaseType::Bool),
        Just(BaseType::Int),
        Just(BaseType::Float),
        Just(BaseType::String),
    ]
}

/// Scalars and arrays of scalars, without enums.
fn type_strategy() -> impl Strategy<Value = Type> {
    (inst_strategy(), base_strategy(), any::<bool>(), 0i8..3)
        .prop_map(|(inst, base, opt, dim)| Type::new(inst, base, false, opt, dim))
}

fn identifier_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z_][a-z0-9_]{0,10}").expect("valid regex")
}

// -- Helpers --

/// A model with the prelude installed and its functions registered.
fn prelude_env() -> (Model, CheckEnv) {
    let mut model = Model::new("props.mzn");
    install_prelude(&mut model).unwrap();
    let mut env = CheckEnv::new(&model, TypecheckOptions::default());
    let ItemKind::Include { items, .. } = &model.items[0].kind else {
        panic!("expected the prelude include");
    };
    for it in items {
        if let ItemKind::Function(fid) = it.kind {
            env.fns.register(&model, fid, false).unwrap();
        }
    }
    (model, env)
}

fn rank(base: BaseType) -> u8 {
    match base {
        BaseType::Bool => 0,
        BaseType::Int => 1,
        _ => 2,
    }
}

// -- Properties --

proptest! {
    #[test]
    fn subtyping_is_reflexive(t in type_strategy()) {
        prop_assert!(t.is_subtype_of(&t, false));
        prop_assert!(t.is_subtype_of(&t, true));
        prop_assert!(EnumRegistry::new().is_subtype(t, t, true));
    }

    #[test]
    fn subtyping_is_transitive(a in type_strategy(), b in type_strategy(), c in type_strategy()) {
        prop_assume!(a.is_subtype_of(&b, false) && b.is_subtype_of(&c, false));
        prop_assert!(a.is_subtype_of(&c, false));
    }

    #[test]
    fn par_is_subtype_of_var(t in type_strategy()) {
        prop_assert!(t.to_par().is_subtype_of(&t.to_var(), false));
    }

    #[test]
    fn coercion_is_idempotent(
        from_int in any::<bool>(),
        target_base in prop_oneof![Just(BaseType::Bool), Just(BaseType::Int), Just(BaseType::Float)],
        target_inst in inst_strategy(),
    ) {
        let source = if from_int { BaseType::Int } else { BaseType::Bool };
        prop_assume!(rank(source) <= rank(target_base));
        let (mut model, mut env) = prelude_env();
        let e = if from_int { model.int(4) } else { model.bool_lit(true) };
        let target = Type::new(target_inst, target_base, false, false, 0);

        let once = coerce(&mut model, &mut env, e, target).unwrap();
        prop_assert_eq!(model.arena.ty(once).base, target_base);
        let twice = coerce(&mut model, &mut env, once, target).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn edit_distance_to_self_is_zero(s in identifier_strategy()) {
        prop_assert_eq!(edit_distance(&s, &s), 0);
    }

    #[test]
    fn edit_distance_is_symmetric(a in identifier_strategy(), b in identifier_strategy()) {
        prop_assert_eq!(edit_distance(&a, &b), edit_distance(&b, &a));
    }

    #[test]
    fn edit_distance_is_bounded(a in identifier_strategy(), b in identifier_strategy()) {
        let (la, lb) = (a.chars().count(), b.chars().count());
        let d = edit_distance(&a, &b);
        prop_assert!(d <= la.max(lb));
        prop_assert!(d >= la.abs_diff(lb));
    }
}
