use super::*;
use proptest::prelude::*;
use serde_json::json;

#[test]
fn equality_treats_integer_and_float_as_equal() {
    assert!(Operator::Eq.apply(&json!(1), &json!(1.0)));
    assert!(!Operator::Ne.apply(&json!(1), &json!(1.0)));
    assert!(Operator::Eq.apply(&json!({"a": [1, 2]}), &json!({"a": [1.0, 2]})));
    assert!(!Operator::Eq.apply(&json!("1"), &json!(1)));
}

#[test]
fn identity_is_strict() {
    assert!(Operator::Is.apply(&JsonValue::Null, &JsonValue::Null));
    assert!(!Operator::Is.apply(&json!(1), &json!(1.0)));
    assert!(Operator::IsNot.apply(&json!(true), &JsonValue::Null));
}

#[test]
fn ordering_compares_numbers_strings_and_arrays() {
    assert!(Operator::Lt.apply(&json!(1), &json!(2.5)));
    assert!(Operator::Le.apply(&json!(2), &json!(2)));
    assert!(Operator::Gt.apply(&json!("b"), &json!("a")));
    assert!(Operator::Ge.apply(&json!([1, 3]), &json!([1, 2, 9])));
    assert!(Operator::Lt.apply(&json!([1]), &json!([1, 0])));
}

#[test]
fn ordering_incomparable_types_is_false() {
    assert!(!Operator::Lt.apply(&json!("a"), &json!(1)));
    assert!(!Operator::Ge.apply(&JsonValue::Null, &JsonValue::Null));
}

#[test]
fn membership_over_arrays_strings_and_objects() {
    assert!(Operator::In.apply(&json!("admin"), &json!(["admin", "user"])));
    assert!(Operator::NotIn.apply(&json!("guest"), &json!(["admin", "user"])));
    assert!(Operator::In.apply(&json!("dmi"), &json!("admin")));
    assert!(Operator::In.apply(&json!("id"), &json!({"id": 1})));
    assert!(!Operator::In.apply(&json!(1), &json!(7)));
}

#[test]
fn contains_reverses_membership() {
    assert!(Operator::Contains.apply(&json!(["a", "b"]), &json!("b")));
    assert!(Operator::Contains.apply(&json!("hello"), &json!("ell")));
    assert!(!Operator::Contains.apply(&json!("b"), &json!(["a", "b"])));
}

#[test]
fn between_is_inclusive_and_requires_two_bounds() {
    assert!(Operator::Between.apply(&json!(0), &json!([0, 10])));
    assert!(Operator::Between.apply(&json!(10), &json!([0, 10])));
    assert!(!Operator::Between.apply(&json!(11), &json!([0, 10])));
    assert!(!Operator::Between.apply(&json!(5), &json!([0])));
    assert!(!Operator::Between.apply(&json!(5), &json!(10)));
}

#[test]
fn parses_every_symbol_and_rejects_unknown() {
    for operator in Operator::ALL {
        assert_eq!(operator.symbol().parse::<Operator>(), Ok(operator));
    }
    assert_eq!(
        "=~".parse::<Operator>(),
        Err(OperatorError::UnsupportedOperator("=~".to_string()))
    );
    assert_eq!(
        apply("approx", &json!(1), &json!(1)),
        Err(OperatorError::UnsupportedOperator("approx".to_string()))
    );
}

#[test]
fn quantifiers_lift_operators() {
    let values = vec![json!(1), json!(1.0), json!(1)];
    assert_eq!(apply_range("all", &json!(1), "==", &values), Ok(true));
    let mixed = vec![json!(1), json!(2)];
    assert_eq!(apply_range("all", &json!(1), "==", &mixed), Ok(false));
    assert_eq!(apply_range("any", &json!(2), "==", &mixed), Ok(true));
    assert_eq!(apply_range("any", &json!(3), "==", &[]), Ok(false));
    assert_eq!(apply_range("all", &json!(3), "==", &[]), Ok(true));
    assert_eq!(
        apply_range("none", &json!(3), "==", &[]),
        Err(OperatorError::UnsupportedQuantifier("none".to_string()))
    );
}

#[test]
fn operators_round_trip_through_serde() {
    let encoded = serde_json::to_value(Operator::NotIn).expect("encode");
    assert_eq!(encoded, json!("not in"));
    let decoded: Quantifier = serde_json::from_value(json!("any")).expect("decode");
    assert_eq!(decoded, Quantifier::Any);
}

proptest! {
    #[test]
    fn between_matches_chained_comparison(x in -500i64..500, lo in -500i64..500, hi in -500i64..500) {
        let expected = lo <= x && x <= hi;
        prop_assert_eq!(Operator::Between.apply(&json!(x), &json!([lo, hi])), expected);
    }

    #[test]
    fn all_equal_iff_every_element_equal(values in proptest::collection::vec(0i64..3, 0..6), target in 0i64..3) {
        let sequence: Vec<JsonValue> = values.iter().map(|value| json!(value)).collect();
        let expected_all = values.iter().all(|value| *value == target);
        let expected_any = values.iter().any(|value| *value == target);
        prop_assert_eq!(Quantifier::All.apply(&json!(target), Operator::Eq, &sequence), expected_all);
        prop_assert_eq!(Quantifier::Any.apply(&json!(target), Operator::Eq, &sequence), expected_any);
    }
}
