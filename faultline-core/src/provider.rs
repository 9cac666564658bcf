//! Invalid-value providers, one per fault kind.
//!
//! The registry is an immutable table built on first use. Each provider derives
//! its values from the owning field's own bounds and fails with
//! [`ProviderError::Precondition`] when a bound it needs is unset.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde_json::{Number, Value as JsonValue};

use crate::config::GenerationConfig;
use crate::error::{ProviderError, Result};
use crate::fault::{FaultKind, InvalidValue};
use crate::field::{list_items, CharSpec, Field, FieldKind, FieldType};
use crate::path::KeyPath;
use crate::rng::{float_value, GenContext};

const CHOICE_RESAMPLE_ATTEMPTS: usize = 32;

/// Derives invalid values of one fault kind from a field's bounds.
pub trait InvalidValueProvider: Send + Sync {
    /// The fault kind this provider produces.
    fn kind(&self) -> FaultKind;

    /// Invalid values for `field`, named `field_name` in error messages.
    ///
    /// `current` is the value the field holds in the record being mutated;
    /// container faults start from it.
    fn provide(
        &self,
        field: &Field,
        field_name: &str,
        current: &JsonValue,
        ctx: &mut GenContext,
        config: &GenerationConfig,
    ) -> Result<Vec<InvalidValue>>;
}

type Registry = BTreeMap<FaultKind, &'static dyn InvalidValueProvider>;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

static NULL: NullProvider = NullProvider;
static BLANK: BlankProvider = BlankProvider;
static EXCEED_MAX_LENGTH: ExceedMaxLengthProvider = ExceedMaxLengthProvider;
static EXCEED_MIN_LENGTH: ExceedMinLengthProvider = ExceedMinLengthProvider;
static EXCEED_MAX_VALUE: ExceedMaxValueProvider = ExceedMaxValueProvider;
static EXCEED_MIN_VALUE: ExceedMinValueProvider = ExceedMinValueProvider;
static INVALID_CHOICE: InvalidChoiceProvider = InvalidChoiceProvider;
static INVALID_TYPE: InvalidTypeProvider = InvalidTypeProvider;
static INVALID_NESTED_OBJECT: InvalidNestedObjectProvider = InvalidNestedObjectProvider;

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| {
        let providers: [&'static dyn InvalidValueProvider; 9] = [
            &NULL,
            &BLANK,
            &EXCEED_MAX_LENGTH,
            &EXCEED_MIN_LENGTH,
            &EXCEED_MAX_VALUE,
            &EXCEED_MIN_VALUE,
            &INVALID_CHOICE,
            &INVALID_TYPE,
            &INVALID_NESTED_OBJECT,
        ];
        providers
            .into_iter()
            .map(|provider| (provider.kind(), provider))
            .collect()
    })
}

/// Looks up the provider registered for `kind`.
///
/// `missing_required` has no provider: the faker emits it by deleting the key.
pub fn get_provider(kind: FaultKind) -> std::result::Result<&'static dyn InvalidValueProvider, ProviderError> {
    registry()
        .get(&kind)
        .copied()
        .ok_or_else(|| ProviderError::UnknownFaultKind(kind.tag().to_string()))
}

/// Looks up a provider by its fault-kind tag.
pub fn provider_for_tag(tag: &str) -> std::result::Result<&'static dyn InvalidValueProvider, ProviderError> {
    get_provider(tag.parse()?)
}

/// Fault kinds with a registered provider.
pub fn registered_kinds() -> Vec<FaultKind> {
    registry().keys().copied().collect()
}

fn not_applicable(kind: FaultKind, field: &Field, field_name: &str) -> ProviderError {
    ProviderError::NotApplicable {
        kind,
        field: field_name.to_string(),
        field_type: field.field_type().tag(),
    }
}

fn unrepresentable(kind: FaultKind, field_name: &str) -> ProviderError {
    ProviderError::Unrepresentable {
        kind,
        field: field_name.to_string(),
    }
}

fn precondition(kind: FaultKind, field_name: &str, bound: &'static str) -> ProviderError {
    ProviderError::Precondition {
        kind,
        field: field_name.to_string(),
        bound,
    }
}

/// A string of exactly `length` characters, keeping the field's prefix and
/// suffix when they fit.
fn sized_string(spec: &CharSpec, length: usize, ctx: &mut GenContext) -> Result<JsonValue> {
    let alphabet = spec.alphabet_chars();
    let affix = spec.prefix.chars().count() + spec.suffix.chars().count();
    let value = if length > affix {
        let core = ctx.string(length - affix, &alphabet)?;
        format!("{}{core}{}", spec.prefix, spec.suffix)
    } else {
        ctx.string(length, &alphabet)?
    };
    Ok(JsonValue::String(value))
}

fn integer_value(value: i128) -> JsonValue {
    if let Ok(value) = i64::try_from(value) {
        return JsonValue::from(value);
    }
    if let Ok(value) = u64::try_from(value) {
        return JsonValue::from(value);
    }
    float_value(value as f64)
}

/// The next representable float strictly beyond `bound` in `direction`.
fn float_beyond(bound: f64, direction: f64) -> Option<JsonValue> {
    let stepped = bound + direction;
    let stepped = if stepped != bound {
        stepped
    } else if direction > 0.0 {
        bound.next_up()
    } else {
        bound.next_down()
    };
    stepped.is_finite().then(|| float_value(stepped))
}

struct NullProvider;

impl InvalidValueProvider for NullProvider {
    fn kind(&self) -> FaultKind {
        FaultKind::Null
    }

    fn provide(
        &self,
        _field: &Field,
        _field_name: &str,
        _current: &JsonValue,
        _ctx: &mut GenContext,
        _config: &GenerationConfig,
    ) -> Result<Vec<InvalidValue>> {
        Ok(vec![InvalidValue::new(JsonValue::Null, self.kind())])
    }
}

struct BlankProvider;

impl InvalidValueProvider for BlankProvider {
    fn kind(&self) -> FaultKind {
        FaultKind::Blank
    }

    fn provide(
        &self,
        field: &Field,
        field_name: &str,
        _current: &JsonValue,
        _ctx: &mut GenContext,
        _config: &GenerationConfig,
    ) -> Result<Vec<InvalidValue>> {
        match field.kind() {
            FieldKind::Char(_) | FieldKind::Choice(_) => Ok(vec![InvalidValue::new(
                JsonValue::String(String::new()),
                self.kind(),
            )]),
            _ => Err(not_applicable(self.kind(), field, field_name).into()),
        }
    }
}

struct ExceedMaxLengthProvider;

impl InvalidValueProvider for ExceedMaxLengthProvider {
    fn kind(&self) -> FaultKind {
        FaultKind::ExceedMaxLength
    }

    fn provide(
        &self,
        field: &Field,
        field_name: &str,
        current: &JsonValue,
        ctx: &mut GenContext,
        config: &GenerationConfig,
    ) -> Result<Vec<InvalidValue>> {
        let value = match field.kind() {
            FieldKind::Char(spec) => {
                let max = spec
                    .max_length
                    .ok_or_else(|| precondition(self.kind(), field_name, "max_length"))?;
                sized_string(spec, max + 1, ctx)?
            }
            FieldKind::List(spec) => {
                let max = spec
                    .effective_max_length()
                    .ok_or_else(|| precondition(self.kind(), field_name, "max_length"))?;
                let mut items = current.as_array().cloned().unwrap_or_default();
                items.truncate(max + 1);
                let start = items.len();
                items.extend(list_items(spec, start, max + 1 - start, ctx, config)?);
                JsonValue::Array(items)
            }
            _ => return Err(not_applicable(self.kind(), field, field_name).into()),
        };
        Ok(vec![InvalidValue::new(value, self.kind())])
    }
}

struct ExceedMinLengthProvider;

impl InvalidValueProvider for ExceedMinLengthProvider {
    fn kind(&self) -> FaultKind {
        FaultKind::ExceedMinLength
    }

    fn provide(
        &self,
        field: &Field,
        field_name: &str,
        current: &JsonValue,
        ctx: &mut GenContext,
        config: &GenerationConfig,
    ) -> Result<Vec<InvalidValue>> {
        let value = match field.kind() {
            FieldKind::Char(spec) => {
                let min = spec
                    .min_length
                    .filter(|min| *min > 0)
                    .ok_or_else(|| precondition(self.kind(), field_name, "min_length"))?;
                sized_string(spec, min - 1, ctx)?
            }
            FieldKind::List(spec) => {
                let min = spec
                    .effective_min_length()
                    .filter(|min| *min > 0)
                    .ok_or_else(|| precondition(self.kind(), field_name, "min_length"))?;
                let mut items = current.as_array().cloned().unwrap_or_default();
                items.truncate(min - 1);
                let start = items.len();
                items.extend(list_items(spec, start, min - 1 - start, ctx, config)?);
                JsonValue::Array(items)
            }
            _ => return Err(not_applicable(self.kind(), field, field_name).into()),
        };
        Ok(vec![InvalidValue::new(value, self.kind())])
    }
}

struct ExceedMaxValueProvider;

impl InvalidValueProvider for ExceedMaxValueProvider {
    fn kind(&self) -> FaultKind {
        FaultKind::ExceedMaxValue
    }

    fn provide(
        &self,
        field: &Field,
        field_name: &str,
        _current: &JsonValue,
        _ctx: &mut GenContext,
        _config: &GenerationConfig,
    ) -> Result<Vec<InvalidValue>> {
        let value = match field.kind() {
            FieldKind::Integer(bounds) => {
                let max = bounds
                    .max_value
                    .ok_or_else(|| precondition(self.kind(), field_name, "max_value"))?;
                integer_value(i128::from(max) + 1)
            }
            FieldKind::Float(bounds) => {
                let max = bounds
                    .max_value
                    .ok_or_else(|| precondition(self.kind(), field_name, "max_value"))?;
                float_beyond(max, 1.0).ok_or_else(|| unrepresentable(self.kind(), field_name))?
            }
            _ => return Err(not_applicable(self.kind(), field, field_name).into()),
        };
        Ok(vec![InvalidValue::new(value, self.kind())])
    }
}

struct ExceedMinValueProvider;

impl InvalidValueProvider for ExceedMinValueProvider {
    fn kind(&self) -> FaultKind {
        FaultKind::ExceedMinValue
    }

    fn provide(
        &self,
        field: &Field,
        field_name: &str,
        _current: &JsonValue,
        _ctx: &mut GenContext,
        _config: &GenerationConfig,
    ) -> Result<Vec<InvalidValue>> {
        let value = match field.kind() {
            FieldKind::Integer(bounds) => {
                let min = bounds
                    .min_value
                    .ok_or_else(|| precondition(self.kind(), field_name, "min_value"))?;
                integer_value(i128::from(min) - 1)
            }
            FieldKind::Float(bounds) => {
                let min = bounds
                    .min_value
                    .ok_or_else(|| precondition(self.kind(), field_name, "min_value"))?;
                float_beyond(min, -1.0).ok_or_else(|| unrepresentable(self.kind(), field_name))?
            }
            _ => return Err(not_applicable(self.kind(), field, field_name).into()),
        };
        Ok(vec![InvalidValue::new(value, self.kind())])
    }
}

struct InvalidChoiceProvider;

impl InvalidValueProvider for InvalidChoiceProvider {
    fn kind(&self) -> FaultKind {
        FaultKind::InvalidChoice
    }

    fn provide(
        &self,
        field: &Field,
        field_name: &str,
        _current: &JsonValue,
        ctx: &mut GenContext,
        config: &GenerationConfig,
    ) -> Result<Vec<InvalidValue>> {
        let FieldKind::Choice(spec) = field.kind() else {
            return Err(not_applicable(self.kind(), field, field_name).into());
        };
        if spec.choices.is_empty() {
            return Err(precondition(self.kind(), field_name, "choices").into());
        }
        for _ in 0..CHOICE_RESAMPLE_ATTEMPTS {
            let candidate = JsonValue::String(ctx.alphanumeric(config.random_string_length)?);
            if !spec.choices.contains(&candidate) {
                return Ok(vec![InvalidValue::new(candidate, self.kind())]);
            }
        }
        Ok(vec![InvalidValue::new(
            value_not_in_choices(&spec.choices),
            self.kind(),
        )])
    }
}

fn value_not_in_choices(choices: &[JsonValue]) -> JsonValue {
    let mut suffix = 0usize;
    loop {
        let candidate = JsonValue::String(format!("not_a_choice_{suffix}"));
        if !choices.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

struct InvalidTypeProvider;

impl InvalidValueProvider for InvalidTypeProvider {
    fn kind(&self) -> FaultKind {
        FaultKind::InvalidType
    }

    fn provide(
        &self,
        field: &Field,
        _field_name: &str,
        _current: &JsonValue,
        _ctx: &mut GenContext,
        _config: &GenerationConfig,
    ) -> Result<Vec<InvalidValue>> {
        let value = match field.kind() {
            FieldKind::Choice(spec) => {
                if spec.choices.iter().any(JsonValue::is_string) {
                    JsonValue::Number(Number::from(42))
                } else {
                    JsonValue::String("not-a-choice".to_string())
                }
            }
            _ => mismatched_type_value(field.field_type()),
        };
        Ok(vec![InvalidValue::new(value, self.kind())])
    }
}

fn mismatched_type_value(field_type: FieldType) -> JsonValue {
    match field_type {
        FieldType::Char => JsonValue::from(42),
        FieldType::Integer | FieldType::Float => JsonValue::String("not-a-number".to_string()),
        FieldType::Boolean => JsonValue::String("not-bool".to_string()),
        FieldType::List => JsonValue::String("not-array".to_string()),
        FieldType::Dict => JsonValue::String("not-object".to_string()),
        FieldType::Choice => JsonValue::Bool(true),
    }
}

/// Enumerates the single-fault catalogue of every sub-field of a dict.
///
/// Each value is the current nested object with one sub-field mutated; the
/// result's `sub_path` points at that sub-field relative to the dict. A
/// required sub-field already absent from the object yields no
/// missing-required case.
struct InvalidNestedObjectProvider;

impl InvalidValueProvider for InvalidNestedObjectProvider {
    fn kind(&self) -> FaultKind {
        FaultKind::InvalidNestedObject
    }

    fn provide(
        &self,
        field: &Field,
        field_name: &str,
        current: &JsonValue,
        ctx: &mut GenContext,
        config: &GenerationConfig,
    ) -> Result<Vec<InvalidValue>> {
        let Some(fields) = field.sub_fields() else {
            return Err(not_applicable(self.kind(), field, field_name).into());
        };
        let Some(object) = current.as_object() else {
            return Ok(Vec::new());
        };
        let mut values = Vec::new();
        for (name, sub_field) in fields.iter() {
            let sub_path = KeyPath::key(name);
            if sub_field.is_required() && object.contains_key(name) {
                let mut mutated = object.clone();
                mutated.remove(name);
                values.push(InvalidValue::nested(
                    JsonValue::Object(mutated),
                    FaultKind::MissingRequired,
                    sub_path.clone(),
                ));
            }
            let sub_current = match object.get(name) {
                Some(value) => value.clone(),
                None => sub_field.valid_value(ctx, config)?.clone(),
            };
            let qualified = format!("{field_name}.{name}");
            for invalid in sub_field.invalid_values(&qualified, &sub_current, ctx, config)? {
                let mut mutated = object.clone();
                mutated.insert(name.to_string(), invalid.value.clone());
                let path = match &invalid.sub_path {
                    Some(inner) => sub_path.join(inner),
                    None => sub_path.clone(),
                };
                values.push(InvalidValue::nested(
                    JsonValue::Object(mutated),
                    invalid.kind,
                    path,
                ));
            }
        }
        Ok(values)
    }
}

#[cfg(test)]
#[path = "../tests/internal/provider_unit_tests.rs"]
mod tests;
