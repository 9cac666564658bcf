use super::*;
use crate::assertion::{Assertion, ResponseAssertion};
use crate::config::GenerationConfig;
use crate::field::{CharSpec, ChoiceSpec, Field};
use crate::operator::Operator;
use crate::relation::RelationConstraint;
use crate::schema::Schema;
use serde_json::json;

fn path(expression: &str) -> KeyPath {
    KeyPath::parse(expression).expect("path")
}

fn faker() -> Faker {
    let relation = RelationConstraint::new(
        Assertion::value(path("plan"), Operator::Eq, "team"),
        vec![Assertion::key_not_exists(path("coupon"))],
    )
    .expect("relation");
    let schema = Schema::builder()
        .field("email", Field::char(CharSpec::default()).required())
        .field("plan", Field::choice(ChoiceSpec::new(["team"])))
        .field("coupon", Field::char(CharSpec::default().with_max_length(None)))
        .relation(relation)
        .build()
        .expect("schema");
    Faker::new(schema, GenerationConfig::default())
}

fn binding() -> UseCaseBinding {
    let assertions = AssertionBinding::new()
        .with_valid(vec![ResponseAssertion::status_code(201)])
        .with_default_invalid(vec![ResponseAssertion::status_code(400)])
        .with_override(
            path("email"),
            FaultKind::MissingRequired,
            vec![ResponseAssertion::status_code(422)],
        )
        .with_relation_override(
            path("coupon"),
            "( coupon not exists )",
            vec![ResponseAssertion::status_code(409)],
        );
    UseCaseBinding::new(
        RequestTemplate::new("POST", "/signup").with_header("content-type", "application/json"),
        assertions,
    )
}

fn status_codes(case: &UseCase) -> Vec<u16> {
    case.assertions
        .iter()
        .filter_map(|assertion| match assertion {
            ResponseAssertion::StatusCode(code) => Some(*code),
            _ => None,
        })
        .collect()
}

#[test]
fn valid_case_comes_first() {
    let mut faker = faker();
    let cases = binding().use_cases(&mut faker).expect("cases");
    let valid = &cases[0];
    assert_eq!(valid.name, "<POST /signup | valid>");
    assert_eq!(valid.expected, ExpectedOutcome::Accept);
    assert_eq!(&valid.request.body, faker.valid_record().expect("valid"));
    assert_eq!(
        valid.request.headers.get("content-type").map(String::as_str),
        Some("application/json")
    );
    assert_eq!(status_codes(valid), vec![201]);
}

#[test]
fn invalid_cases_embed_path_and_fault_in_name() {
    let mut faker = faker();
    let cases = binding().use_cases(&mut faker).expect("cases");
    let names: Vec<&str> = cases[1..].iter().map(|case| case.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "<POST /signup | email | missing_required>",
            "<POST /signup | email | exceed_max_length>",
            "<POST /signup | plan | invalid_choice>",
            "<POST /signup | coupon | ( coupon not exists )>",
        ]
    );
    assert!(cases[1..]
        .iter()
        .all(|case| case.expected == ExpectedOutcome::Reject));
}

#[test]
fn overrides_win_over_default_invalid_set() {
    let mut faker = faker();
    let cases = binding().use_cases(&mut faker).expect("cases");
    let by_name = |suffix: &str| {
        cases
            .iter()
            .find(|case| case.name.ends_with(suffix))
            .expect("case")
    };
    assert_eq!(status_codes(by_name("email | missing_required>")), vec![422]);
    assert_eq!(status_codes(by_name("email | exceed_max_length>")), vec![400]);
    assert_eq!(
        status_codes(by_name("coupon | ( coupon not exists )>")),
        vec![409]
    );
}

#[test]
fn requests_carry_independent_bodies() {
    let mut faker = faker();
    let cases = binding().use_cases(&mut faker).expect("cases");
    let missing = &cases[1];
    assert!(missing.request.body.get("email").is_none());
    assert!(cases[0].request.body.get("email").is_some());
    let relation = cases.last().expect("relation case");
    assert!(relation.request.body.get("coupon").is_some());
    assert!(cases[0].request.body.get("coupon").is_none());
    assert_eq!(relation.whole_field_path, Some(path("coupon")));
    assert!(matches!(relation.fault, Some(Fault::Relation { .. })));
}

#[test]
fn request_template_round_trips_through_serde() {
    let template = RequestTemplate::new("PUT", "/items/1").with_body(json!({"a": 1}));
    let encoded = serde_json::to_value(&template).expect("encode");
    assert_eq!(encoded["method"], "PUT");
    let decoded: RequestTemplate = serde_json::from_value(encoded).expect("decode");
    assert_eq!(decoded, template);
}
