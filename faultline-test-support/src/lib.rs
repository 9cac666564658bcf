use std::collections::VecDeque;
use std::sync::Mutex;

use ctor::ctor;
use faultline_core::{
    Assertable, Assertion, CharSpec, ChoiceSpec, ConformanceChecker, Field, FieldMap, KeyPath,
    ListSpec, Operator, RelationConstraint, RequestSender, RequestTemplate, Response, Schema,
    SendFuture, TransportError,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[ctor]
fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn key(expression: &str) -> KeyPath {
    KeyPath::parse(expression).expect("key path")
}

/// A sign-up payload: bounded strings, numbers, a choice, a nested address,
/// a tag list, and one relation (`plan == "team"` forbids `coupon`).
pub fn user_account_schema() -> Schema {
    let relation = RelationConstraint::new(
        Assertion::value(key("plan"), Operator::Eq, "team"),
        vec![Assertion::key_not_exists(key("coupon"))],
    )
    .expect("relation");
    Schema::builder()
        .field(
            "username",
            Field::char(
                CharSpec::default()
                    .with_min_length(Some(3))
                    .with_max_length(Some(16))
                    .with_allow_blank(false),
            )
            .required()
            .not_null(),
        )
        .field(
            "email",
            Field::char(
                CharSpec::default()
                    .with_max_length(Some(40))
                    .with_suffix("@example.com"),
            )
            .required()
            .not_null(),
        )
        .field("age", Field::integer(Some(13), Some(120)).not_null())
        .field(
            "plan",
            Field::choice(ChoiceSpec::new(["team"]).with_allow_blank(false))
                .required()
                .not_null(),
        )
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
                    .with("lat", Field::float(Some(-90.0), Some(90.0))),
            ),
        )
        .field(
            "tags",
            Field::list(
                ListSpec::new(vec![Field::char(CharSpec::default().with_max_length(Some(8)))])
                    .with_max_length(Some(3)),
            ),
        )
        .field("coupon", Field::char(CharSpec::default().with_max_length(Some(8))))
        .relation(relation)
        .build()
        .expect("user account schema")
}

/// A fake endpoint that accepts exactly the records a schema admits.
///
/// Conforming bodies that satisfy every relation get `201` and an echo;
/// anything else gets `400` with the reasons under `errors`.
pub struct SchemaServer {
    schema: Schema,
    checker: ConformanceChecker,
}

impl SchemaServer {
    pub fn new(schema: Schema) -> Self {
        let checker = ConformanceChecker::new(&schema).expect("schema compiles");
        Self { schema, checker }
    }

    fn respond(&self, request: &RequestTemplate) -> Response {
        let mut errors = self.checker.violations(&request.body);
        for relation in self.schema.relations() {
            if relation.condition().evaluate(&request.body).is_err() {
                continue;
            }
            errors.extend(
                relation
                    .constraints()
                    .iter()
                    .filter_map(|constraint| constraint.evaluate(&request.body).err())
                    .map(|failure| failure.message),
            );
        }
        if errors.is_empty() {
            Response::json(201, json!({"created": request.body.clone()}))
        } else {
            Response::json(400, json!({"errors": errors}))
        }
    }
}

impl RequestSender for SchemaServer {
    fn send<'a>(&'a self, request: &'a RequestTemplate) -> SendFuture<'a> {
        let response = self.respond(request);
        Box::pin(async move { Ok(response) })
    }
}

/// Replays canned responses in order and records every request it saw.
#[derive(Default)]
pub struct ScriptedSender {
    responses: Mutex<VecDeque<Result<Response, TransportError>>>,
    requests: Mutex<Vec<RequestTemplate>>,
}

impl ScriptedSender {
    pub fn new(responses: Vec<Result<Response, TransportError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RequestTemplate> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl RequestSender for ScriptedSender {
    fn send<'a>(&'a self, request: &'a RequestTemplate) -> SendFuture<'a> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        let next = self
            .responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new("script exhausted")));
        Box::pin(async move { next })
    }
}
