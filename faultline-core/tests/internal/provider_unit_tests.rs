use super::*;
use crate::error::FaultlineError;
use crate::field::{ChoiceSpec, FieldMap, ListSpec};
use serde_json::json;

fn provide_from(kind: FaultKind, field: &Field, current: &JsonValue) -> Result<Vec<InvalidValue>> {
    let mut ctx = GenContext::from_seed(17);
    get_provider(kind)
        .expect("registered")
        .provide(field, "subject", current, &mut ctx, &GenerationConfig::default())
}

fn provide(kind: FaultKind, field: &Field) -> Result<Vec<InvalidValue>> {
    provide_from(kind, field, &JsonValue::Null)
}

fn single_from(kind: FaultKind, field: &Field, current: &JsonValue) -> JsonValue {
    let mut values = provide_from(kind, field, current).expect("provide");
    assert_eq!(values.len(), 1);
    let value = values.remove(0);
    assert_eq!(value.kind, kind);
    value.value
}

fn single(kind: FaultKind, field: &Field) -> JsonValue {
    let mut values = provide(kind, field).expect("provide");
    assert_eq!(values.len(), 1);
    let value = values.remove(0);
    assert_eq!(value.kind, kind);
    value.value
}

#[test]
fn missing_required_has_no_provider() {
    let error = get_provider(FaultKind::MissingRequired)
        .err()
        .expect("not registered");
    assert_eq!(
        error,
        ProviderError::UnknownFaultKind("missing_required".to_string())
    );
    assert!(matches!(
        provider_for_tag("exceed_everything"),
        Err(ProviderError::UnknownFaultKind(_))
    ));
}

#[test]
fn registry_covers_every_other_kind() {
    let kinds = registered_kinds();
    for kind in FaultKind::ALL {
        assert_eq!(kinds.contains(&kind), kind != FaultKind::MissingRequired);
    }
}

#[test]
fn char_length_faults_step_past_bounds() {
    let field = Field::char(CharSpec::default());
    let long = single(FaultKind::ExceedMaxLength, &field);
    assert_eq!(long.as_str().expect("string").chars().count(), 21);
    let short = single(FaultKind::ExceedMinLength, &field);
    assert_eq!(short, json!(""));
}

#[test]
fn char_length_faults_keep_affixes() {
    let field = Field::char(
        CharSpec::default()
            .with_min_length(Some(6))
            .with_max_length(Some(8))
            .with_prefix("u_"),
    );
    let long = single(FaultKind::ExceedMaxLength, &field);
    let long = long.as_str().expect("string");
    assert!(long.starts_with("u_"));
    assert_eq!(long.chars().count(), 9);
    let short = single(FaultKind::ExceedMinLength, &field);
    assert_eq!(short.as_str().expect("string").chars().count(), 5);
}

#[test]
fn integer_value_faults_step_past_bounds() {
    let field = Field::integer(Some(0), Some(100));
    assert_eq!(single(FaultKind::ExceedMaxValue, &field), json!(101));
    assert_eq!(single(FaultKind::ExceedMinValue, &field), json!(-1));

    let extreme = Field::integer(None, Some(i64::MAX));
    assert_eq!(
        single(FaultKind::ExceedMaxValue, &extreme),
        json!(i64::MAX as u64 + 1)
    );
}

#[test]
fn float_value_faults_step_past_bounds() {
    let field = Field::float(Some(-0.5), Some(0.5));
    assert_eq!(single(FaultKind::ExceedMaxValue, &field), json!(1.5));
    assert_eq!(single(FaultKind::ExceedMinValue, &field), json!(-1.5));
}

#[test]
fn unset_bound_is_a_precondition_error() {
    let field = Field::integer(None, Some(3));
    let error = provide(FaultKind::ExceedMinValue, &field).expect_err("precondition");
    assert_eq!(
        error,
        FaultlineError::Provider(ProviderError::Precondition {
            kind: FaultKind::ExceedMinValue,
            field: "subject".to_string(),
            bound: "min_value",
        })
    );
    let field = Field::char(CharSpec::default().with_max_length(None));
    assert!(matches!(
        provide(FaultKind::ExceedMaxLength, &field),
        Err(FaultlineError::Provider(ProviderError::Precondition { bound: "max_length", .. }))
    ));
}

#[test]
fn kind_mismatch_is_not_applicable() {
    let error = provide(FaultKind::Blank, &Field::boolean()).expect_err("not applicable");
    assert!(matches!(
        error,
        FaultlineError::Provider(ProviderError::NotApplicable { field_type: "boolean", .. })
    ));
}

#[test]
fn invalid_choice_is_never_a_choice() {
    let field = Field::choice(ChoiceSpec::new(["admin", "user"]));
    let value = single(FaultKind::InvalidChoice, &field);
    assert!(!["admin", "user"].contains(&value.as_str().expect("string")));
    assert_eq!(value.as_str().map(str::len), Some(10));
}

#[test]
fn null_and_blank_are_fixed_values() {
    let field = Field::char(CharSpec::default().with_allow_blank(false)).not_null();
    assert_eq!(single(FaultKind::Null, &field), JsonValue::Null);
    assert_eq!(single(FaultKind::Blank, &field), json!(""));
}

#[test]
fn invalid_type_changes_json_type() {
    assert!(single(FaultKind::InvalidType, &Field::char(CharSpec::default())).is_number());
    assert!(single(FaultKind::InvalidType, &Field::integer(None, None)).is_string());
    assert!(single(FaultKind::InvalidType, &Field::boolean()).is_string());
    let numeric_choices = Field::choice(ChoiceSpec::new([1, 2, 3]));
    assert!(single(FaultKind::InvalidType, &numeric_choices).is_string());
}

#[test]
fn list_length_faults_resize_the_baseline() {
    let field = Field::list(
        ListSpec::new(vec![Field::integer(Some(0), Some(9))])
            .with_min_length(Some(2))
            .with_max_length(Some(4)),
    );
    let current = json!([7, 8, 9]);
    let long = single_from(FaultKind::ExceedMaxLength, &field, &current);
    let long = long.as_array().expect("array");
    assert_eq!(long.len(), 5);
    assert_eq!(long[..3], [json!(7), json!(8), json!(9)]);
    let short = single_from(FaultKind::ExceedMinLength, &field, &current);
    assert_eq!(short, json!([7]));
}

#[test]
fn list_length_faults_fill_a_missing_baseline() {
    let field = Field::list(
        ListSpec::new(vec![Field::integer(Some(0), Some(9))])
            .with_min_length(Some(3))
            .with_max_length(Some(4)),
    );
    let long = single(FaultKind::ExceedMaxLength, &field);
    assert_eq!(long.as_array().map(Vec::len), Some(5));
    let short = single(FaultKind::ExceedMinLength, &field);
    assert_eq!(short.as_array().map(Vec::len), Some(2));
}

#[test]
fn fixed_list_length_pins_both_bounds() {
    let field = Field::list(ListSpec::new(vec![Field::boolean()]).with_length(3));
    let current = json!([true, false, true]);
    let long = single_from(FaultKind::ExceedMaxLength, &field, &current);
    assert_eq!(long.as_array().map(Vec::len), Some(4));
    let short = single_from(FaultKind::ExceedMinLength, &field, &current);
    assert_eq!(short, json!([true, false]));
}

#[test]
fn float_faults_step_past_bounds_beyond_integer_precision() {
    let field = Field::float(Some(-1e17), Some(1e17));
    let above = single(FaultKind::ExceedMaxValue, &field);
    assert!(above.as_f64().expect("number") > 1e17);
    let below = single(FaultKind::ExceedMinValue, &field);
    assert!(below.as_f64().expect("number") < -1e17);
}

#[test]
fn float_bound_at_the_largest_finite_is_unrepresentable() {
    let field = Field::float(Some(f64::MIN), Some(f64::MAX));
    let error = provide(FaultKind::ExceedMaxValue, &field).expect_err("unrepresentable");
    assert_eq!(
        error,
        FaultlineError::Provider(ProviderError::Unrepresentable {
            kind: FaultKind::ExceedMaxValue,
            field: "subject".to_string(),
        })
    );
    assert!(matches!(
        provide(FaultKind::ExceedMinValue, &field),
        Err(FaultlineError::Provider(ProviderError::Unrepresentable {
            kind: FaultKind::ExceedMinValue,
            ..
        }))
    ));
}

#[test]
fn nested_object_faults_recurse_with_sub_paths() {
    let field = Field::dict(
        FieldMap::new()
            .with(
                "zip",
                Field::char(
                    CharSpec::default()
                        .with_min_length(Some(5))
                        .with_max_length(Some(5)),
                )
                .required(),
            )
            .with(
                "geo",
                Field::dict(FieldMap::new().with("lat", Field::float(Some(-90.0), Some(90.0)))),
            ),
    );
    let mut ctx = GenContext::from_seed(3);
    let config = GenerationConfig::default();
    let baseline = field.valid_value(&mut ctx, &config).expect("valid").clone();
    let values = get_provider(FaultKind::InvalidNestedObject)
        .expect("registered")
        .provide(&field, "address", &baseline, &mut ctx, &config)
        .expect("provide");

    let summary: Vec<(FaultKind, String)> = values
        .iter()
        .map(|value| {
            (
                value.kind,
                value.sub_path.as_ref().expect("sub path").dotted(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            (FaultKind::MissingRequired, "zip".to_string()),
            (FaultKind::ExceedMaxLength, "zip".to_string()),
            (FaultKind::ExceedMinLength, "zip".to_string()),
            (FaultKind::ExceedMaxValue, "geo.lat".to_string()),
            (FaultKind::ExceedMinValue, "geo.lat".to_string()),
        ]
    );

    let missing = values[0].value.as_object().expect("object");
    assert!(!missing.contains_key("zip"));
    assert_eq!(missing.get("geo"), baseline.get("geo"));

    let lat = &values[3].value;
    assert_eq!(lat["geo"]["lat"], json!(91.0));
    assert_eq!(lat["zip"], baseline["zip"]);
}
