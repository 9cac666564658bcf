use super::*;
use crate::assertion::Assertion;
use crate::error::{FaultlineError, RelationError};
use crate::field::{CharSpec, ChoiceSpec, Field, FieldMap};
use crate::operator::Operator;
use crate::relation::RelationConstraint;
use serde_json::json;

fn path(expression: &str) -> KeyPath {
    KeyPath::parse(expression).expect("path")
}

fn account_schema() -> Schema {
    Schema::builder()
        .field(
            "username",
            Field::char(CharSpec::default().with_allow_blank(false))
                .required()
                .not_null(),
        )
        .field("age", Field::integer(Some(0), Some(100)).required())
        .field("verified", Field::boolean())
        .field(
            "address",
            Field::dict(
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
                    .with("city", Field::char(CharSpec::default())),
            ),
        )
        .build()
        .expect("schema")
}

fn changed_keys(baseline: &JsonValue, record: &JsonValue) -> Vec<String> {
    let baseline = baseline.as_object().expect("baseline object");
    let record = record.as_object().expect("record object");
    let mut keys: Vec<String> = baseline
        .keys()
        .chain(record.keys())
        .filter(|key| baseline.get(*key) != record.get(*key))
        .cloned()
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

#[test]
fn valid_record_is_memoized() {
    let mut faker = Faker::new(account_schema(), GenerationConfig::default());
    let first = faker.valid_record().expect("first").clone();
    let second = faker.valid_record().expect("second").clone();
    assert_eq!(first, second);
    let _ = faker.invalid_records().expect("invalid");
    assert_eq!(faker.valid_record().expect("third"), &first);
}

#[test]
fn same_seed_reproduces_every_record() {
    let config = GenerationConfig::default().with_seed(99);
    let mut first = Faker::new(account_schema(), config.clone());
    let mut second = Faker::new(account_schema(), config);
    assert_eq!(
        first.valid_record().expect("first").clone(),
        second.valid_record().expect("second").clone()
    );
    assert_eq!(
        first.invalid_records().expect("first"),
        second.invalid_records().expect("second")
    );
}

#[test]
fn required_fields_get_exactly_one_missing_case() {
    let mut faker = Faker::new(account_schema(), GenerationConfig::default());
    let baseline = faker.valid_record().expect("valid").clone();
    let cases = faker.invalid_records().expect("invalid");
    for name in ["username", "age"] {
        let missing: Vec<&InvalidData> = cases
            .iter()
            .filter(|case| case.data.get(name).is_none())
            .collect();
        assert_eq!(missing.len(), 1, "{name}");
        assert_eq!(
            missing[0].fault,
            Fault::Field {
                kind: FaultKind::MissingRequired
            }
        );
        assert_eq!(changed_keys(&baseline, &missing[0].data), vec![name.to_string()]);
    }
    assert!(cases.iter().all(|case| case.data.get("verified").is_some()));
}

#[test]
fn field_cases_change_exactly_one_top_level_key() {
    let mut faker = Faker::new(account_schema(), GenerationConfig::default().with_type_faults(true));
    let baseline = faker.valid_record().expect("valid").clone();
    let cases = faker.invalid_records().expect("invalid");
    assert!(!cases.is_empty());
    for case in &cases {
        assert_eq!(
            changed_keys(&baseline, &case.data),
            vec![case.field_name.clone()],
            "{}",
            case.whole_field_path
        );
    }
}

#[test]
fn cases_follow_declaration_and_registration_order() {
    let mut faker = Faker::new(account_schema(), GenerationConfig::default());
    let cases = faker.invalid_records().expect("invalid");
    let summary: Vec<(String, String)> = cases
        .iter()
        .map(|case| (case.whole_field_path.dotted(), case.fault.tag()))
        .collect();
    let expected = [
        ("username", "missing_required"),
        ("username", "null"),
        ("username", "blank"),
        ("username", "exceed_max_length"),
        ("age", "missing_required"),
        ("age", "exceed_max_value"),
        ("age", "exceed_min_value"),
        ("address.zip", "missing_required"),
        ("address.zip", "exceed_max_length"),
        ("address.zip", "exceed_min_length"),
        ("address.city", "exceed_max_length"),
    ];
    let expected: Vec<(String, String)> = expected
        .iter()
        .map(|(path, tag)| (path.to_string(), tag.to_string()))
        .collect();
    assert_eq!(summary, expected);
}

#[test]
fn boundary_values_match_declared_bounds() {
    let mut faker = Faker::new(account_schema(), GenerationConfig::default());
    let cases = faker.invalid_records().expect("invalid");
    let find = |path: &str, kind: FaultKind| {
        cases
            .iter()
            .find(|case| case.whole_field_path.dotted() == path && case.fault.kind() == Some(kind))
            .expect("case")
    };
    assert_eq!(find("age", FaultKind::ExceedMaxValue).data["age"], json!(101));
    assert_eq!(find("age", FaultKind::ExceedMinValue).data["age"], json!(-1));
    let long = &find("username", FaultKind::ExceedMaxLength).data["username"];
    assert_eq!(long.as_str().map(|text| text.chars().count()), Some(21));
    let short_zip = &find("address.zip", FaultKind::ExceedMinLength).data["address"]["zip"];
    assert_eq!(short_zip.as_str().map(str::len), Some(4));
}

fn role_schema() -> Schema {
    let relation = RelationConstraint::new(
        Assertion::value(path("status"), Operator::Eq, "active"),
        vec![Assertion::value(
            path("role"),
            Operator::In,
            json!(["admin", "user"]),
        )],
    )
    .expect("relation");
    Schema::builder()
        .field("status", Field::choice(ChoiceSpec::new(["active", "disabled"])))
        .field("role", Field::choice(ChoiceSpec::new(["admin", "user"])))
        .relation(relation)
        .build()
        .expect("schema")
}

#[test]
fn relation_repair_replaces_violating_value() {
    let mut faker = Faker::new(role_schema(), GenerationConfig::default());
    let record = json!({"status": "active", "role": "guest"});
    let (repaired, cases) = faker
        .apply_relation_constraints(record.clone())
        .expect("repair");

    let declared = faker
        .schema()
        .field_at(&path("role"))
        .and_then(Field::cached_valid_value)
        .cloned()
        .expect("role memo");
    assert_eq!(repaired["status"], json!("active"));
    assert_eq!(repaired["role"], declared);
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].data, record);
    assert_eq!(cases[0].data["role"], json!("guest"));
    assert_eq!(cases[0].whole_field_path, path("role"));
}

fn active_role_schema(roles: &[&str], allowed: JsonValue) -> Schema {
    let relation = RelationConstraint::new(
        Assertion::value(path("status"), Operator::Eq, "active"),
        vec![Assertion::value(path("role"), Operator::In, allowed)],
    )
    .expect("relation");
    Schema::builder()
        .field("status", Field::choice(ChoiceSpec::new(["active"])))
        .field("role", Field::choice(ChoiceSpec::new(roles.iter().copied())))
        .relation(relation)
        .build()
        .expect("schema")
}

#[test]
fn repaired_baseline_satisfies_value_constraints() {
    let mut repaired_seeds = 0;
    for seed in 0..32 {
        let schema = active_role_schema(&["admin", "user", "guest"], json!(["admin", "user"]));
        let mut faker = Faker::new(schema, GenerationConfig::default().with_seed(seed));
        let baseline = faker.valid_record().expect("valid").clone();
        let role = baseline["role"].as_str().expect("role");
        assert!(["admin", "user"].contains(&role), "seed {seed} kept role {role}");

        let cases = faker.invalid_records().expect("invalid");
        for case in cases.iter().filter(|case| matches!(case.fault, Fault::Relation { .. })) {
            repaired_seeds += 1;
            assert_eq!(case.data["role"], json!("guest"));
            assert_ne!(case.data, baseline);
        }
    }
    assert!(repaired_seeds > 0);
}

#[test]
fn value_constraint_without_satisfying_choice_is_unsatisfiable() {
    let schema = active_role_schema(&["guest"], json!(["admin"]));
    let mut faker = Faker::new(schema, GenerationConfig::default());
    let error = faker.valid_record().expect_err("unsatisfiable");
    assert!(matches!(
        error,
        FaultlineError::Relation(RelationError::Unsatisfiable { ref path, .. }) if path == "role"
    ));
}

#[test]
fn nested_cases_keep_keys_removed_by_repair() {
    let relation = RelationConstraint::new(
        Assertion::value(path("status"), Operator::Eq, "active"),
        vec![Assertion::key_not_exists(path("profile.legacy"))],
    )
    .expect("relation");
    let schema = Schema::builder()
        .field("status", Field::choice(ChoiceSpec::new(["active"])))
        .field(
            "profile",
            Field::dict(
                FieldMap::new()
                    .with("name", Field::char(CharSpec::default()).not_null())
                    .with("legacy", Field::char(CharSpec::default())),
            ),
        )
        .relation(relation)
        .build()
        .expect("schema");
    let mut faker = Faker::new(schema, GenerationConfig::default());
    let baseline = faker.valid_record().expect("valid").clone();
    assert!(baseline["profile"].get("legacy").is_none());

    let cases = faker.invalid_records().expect("invalid");
    let null_name = cases
        .iter()
        .find(|case| {
            case.whole_field_path == path("profile.name")
                && case.fault.kind() == Some(FaultKind::Null)
        })
        .expect("profile.name null case");
    assert_eq!(null_name.data["profile"], json!({"name": null}));
    for case in &cases {
        if case.whole_field_path == path("profile.legacy") {
            continue;
        }
        assert!(
            case.data["profile"].get("legacy").is_none(),
            "{} reintroduced profile.legacy",
            case.fault.tag()
        );
    }
}

#[test]
fn required_key_removed_by_repair_gets_no_missing_case() {
    let relation = RelationConstraint::new(
        Assertion::value(path("status"), Operator::Eq, "active"),
        vec![Assertion::key_not_exists(path("coupon"))],
    )
    .expect("relation");
    let schema = Schema::builder()
        .field("status", Field::choice(ChoiceSpec::new(["active"])))
        .field("coupon", Field::char(CharSpec::default()).required())
        .relation(relation)
        .build()
        .expect("schema");
    let mut faker = Faker::new(schema, GenerationConfig::default());
    let baseline = faker.valid_record().expect("valid").clone();
    assert!(baseline.get("coupon").is_none());

    let cases = faker.invalid_records().expect("invalid");
    assert!(!cases.iter().any(|case| case.field_name == "coupon"
        && case.fault.kind() == Some(FaultKind::MissingRequired)));
    assert!(cases.iter().all(|case| case.data != baseline));
    assert!(cases
        .iter()
        .any(|case| case.field_name == "coupon" && matches!(case.fault, Fault::Field { .. })));
}

#[test]
fn relation_is_skipped_when_condition_fails() {
    let mut faker = Faker::new(role_schema(), GenerationConfig::default());
    let record = json!({"status": "disabled", "role": "guest"});
    let (repaired, cases) = faker
        .apply_relation_constraints(record.clone())
        .expect("repair");
    assert_eq!(repaired, record);
    assert!(cases.is_empty());
}

#[test]
fn later_relations_see_earlier_repairs() {
    let first = RelationConstraint::new(
        Assertion::value(path("status"), Operator::Eq, "active"),
        vec![Assertion::key_exists(path("owner"))],
    )
    .expect("first");
    let second = RelationConstraint::new(
        Assertion::key_exists(path("owner")),
        vec![Assertion::key_not_exists(path("legacy"))],
    )
    .expect("second");
    let schema = Schema::builder()
        .field("status", Field::choice(ChoiceSpec::new(["active"])))
        .field("owner", Field::char(CharSpec::default()))
        .relation(first)
        .relation(second)
        .build()
        .expect("schema");
    let mut faker = Faker::new(schema, GenerationConfig::default());
    let (repaired, cases) = faker
        .apply_relation_constraints(json!({"status": "active", "legacy": true}))
        .expect("repair");
    assert!(repaired.get("owner").is_some());
    assert!(repaired.get("legacy").is_none());
    let tags: Vec<String> = cases.iter().map(|case| case.fault.tag()).collect();
    assert_eq!(
        tags,
        vec![
            r#"( missing_required | where status == "active" )"#.to_string(),
            "( legacy not exists )".to_string(),
        ]
    );
}

#[test]
fn relation_cases_follow_field_cases() {
    let relation = RelationConstraint::new(
        Assertion::value(path("status"), Operator::Eq, "active"),
        vec![Assertion::key_not_exists(path("note"))],
    )
    .expect("relation");
    let schema = Schema::builder()
        .field("status", Field::choice(ChoiceSpec::new(["active"])))
        .field("note", Field::char(CharSpec::default()))
        .relation(relation)
        .build()
        .expect("schema");
    let mut faker = Faker::new(schema, GenerationConfig::default());
    let baseline = faker.valid_record().expect("valid").clone();
    assert!(baseline.get("note").is_none());
    let cases = faker.invalid_records().expect("invalid");
    let last = cases.last().expect("relation case");
    assert!(matches!(last.fault, Fault::Relation { .. }));
    assert!(last.data.get("note").is_some());
    assert!(cases[..cases.len() - 1]
        .iter()
        .all(|case| matches!(case.fault, Fault::Field { .. })));
}

#[test]
fn explicit_fault_without_bound_fails_on_first_use() {
    let schema = Schema::builder()
        .field(
            "count",
            Field::integer(None, None).with_fault(FaultKind::ExceedMaxValue),
        )
        .build()
        .expect("schema");
    let mut faker = Faker::new(schema, GenerationConfig::default());
    let error = faker.invalid_records().expect_err("precondition");
    assert!(error.to_string().contains("max_value"));
}
