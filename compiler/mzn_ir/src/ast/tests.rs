use super::*;

#[test]
fn test_int_val_ordering() {
    assert!(IntVal::NegInf < IntVal::Int(i64::MIN));
    assert!(IntVal::Int(i64::MAX) < IntVal::PosInf);
    assert_eq!(IntVal::Int(3).as_finite(), Some(3));
    assert_eq!(IntVal::PosInf.as_finite(), None);
    assert_eq!(IntVal::NegInf.to_string(), "-infinity");
}

#[test]
fn test_int_set_val() {
    let open = IntSetVal::unbounded();
    assert!(open.is_unbounded());
    assert_eq!(open.single_finite_range(), None);

    let r = IntSetVal::range(IntVal::Int(1), IntVal::Int(5));
    assert!(!r.is_unbounded());
    assert_eq!(r.single_finite_range(), Some((1, 5)));
    assert_eq!(r.min(), Some(IntVal::Int(1)));
}

#[test]
fn test_symbol_anonymous() {
    assert!(Symbol::default().is_anonymous());
    assert!(!Symbol::introduced(0).is_anonymous());
    assert!(!Symbol::named(Name::from_raw(4)).is_anonymous());
}

#[test]
fn test_expr_kind_accessors() {
    let kind = ExprKind::Call {
        name: Name::from_raw(9),
        args: Vec::new(),
        decl: None,
    };
    assert_eq!(kind.call_name(), Some(Name::from_raw(9)));
    assert!(kind.as_var_decl().is_none());
    assert!(ExprKind::Anon.is_anon());
}
