//! Typed field declarations.
//!
//! A [`Field`] knows how to synthesize one valid value and which fault kinds it
//! supports. Both are memoized: the first call fixes the value for the lifetime
//! of the field, so every record derived from it agrees on the baseline.

use std::cell::OnceCell;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::config::GenerationConfig;
use crate::error::{FieldError, Result};
use crate::fault::{FaultKind, InvalidValue};
use crate::provider::get_provider;
use crate::rng::{float_value, GenContext};

/// Type tag of a field declaration.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Boolean,
    Char,
    Integer,
    Float,
    Choice,
    Dict,
    List,
}

impl FieldType {
    pub fn tag(self) -> &'static str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Char => "char",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Choice => "choice",
            FieldType::Dict => "dict",
            FieldType::List => "list",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Named character classes a char field may draw from.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharClass {
    Whitespace,
    AsciiLowercase,
    AsciiUppercase,
    AsciiLetters,
    Digits,
    HexDigits,
    OctDigits,
    Punctuation,
    /// Explicit characters.
    Literal(String),
}

impl CharClass {
    fn chars(&self) -> Vec<char> {
        match self {
            CharClass::Whitespace => "\t\n\r\x0b\x0c".chars().collect(),
            CharClass::AsciiLowercase => ('a'..='z').collect(),
            CharClass::AsciiUppercase => ('A'..='Z').collect(),
            CharClass::AsciiLetters => ('a'..='z').chain('A'..='Z').collect(),
            CharClass::Digits => ('0'..='9').collect(),
            CharClass::HexDigits => "0123456789abcdefABCDEF".chars().collect(),
            CharClass::OctDigits => ('0'..='7').collect(),
            CharClass::Punctuation => "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~".chars().collect(),
            CharClass::Literal(text) => text.chars().collect(),
        }
    }
}

/// Bounds and alphabet of a string field.
#[derive(Clone, Debug, PartialEq)]
pub struct CharSpec {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub allow_blank: bool,
    pub alphabet: Vec<CharClass>,
    pub prefix: String,
    pub suffix: String,
}

impl Default for CharSpec {
    fn default() -> Self {
        Self {
            min_length: Some(1),
            max_length: Some(20),
            allow_blank: true,
            alphabet: vec![CharClass::AsciiLetters, CharClass::Digits],
            prefix: String::new(),
            suffix: String::new(),
        }
    }
}

impl CharSpec {
    pub fn with_min_length(mut self, min_length: Option<usize>) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn with_max_length(mut self, max_length: Option<usize>) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_allow_blank(mut self, allow_blank: bool) -> Self {
        self.allow_blank = allow_blank;
        self
    }

    pub fn with_alphabet(mut self, alphabet: Vec<CharClass>) -> Self {
        self.alphabet = alphabet;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Distinct characters of the configured alphabet, in declaration order.
    pub fn alphabet_chars(&self) -> Vec<char> {
        let mut chars = Vec::new();
        for class in &self.alphabet {
            for ch in class.chars() {
                if !chars.contains(&ch) {
                    chars.push(ch);
                }
            }
        }
        chars
    }

    fn affix_len(&self) -> usize {
        self.prefix.chars().count() + self.suffix.chars().count()
    }

    /// Inclusive total-length range of generated valid strings.
    fn length_range(&self) -> (usize, usize) {
        let low = self.min_length.unwrap_or(1).max(self.affix_len() + 1);
        let high = self.max_length.unwrap_or_else(|| low.max(20));
        (low, high.max(low))
    }
}

/// Optional inclusive bounds shared by integer and float fields.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NumericBounds<T> {
    pub min_value: Option<T>,
    pub max_value: Option<T>,
}

impl<T: Copy + PartialOrd + fmt::Display> NumericBounds<T> {
    pub fn new(min_value: Option<T>, max_value: Option<T>) -> Self {
        Self {
            min_value,
            max_value,
        }
    }

    fn check(&self) -> std::result::Result<(), FieldError> {
        if let (Some(min), Some(max)) = (self.min_value, self.max_value) {
            if max < min {
                return Err(FieldError::InvertedValue {
                    min: min.to_string(),
                    max: max.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Resolves missing bounds against a default range, keeping the width when a
/// single declared bound falls outside it.
fn resolve_range<T>(bounds: &NumericBounds<T>, default: [T; 2], width: impl Fn(T, T) -> (T, T)) -> (T, T)
where
    T: Copy + PartialOrd,
{
    let [default_low, default_high] = default;
    match (bounds.min_value, bounds.max_value) {
        (Some(low), Some(high)) => (low, high),
        (Some(low), None) if low > default_high => width(low, default_high),
        (Some(low), None) => (low, default_high),
        (None, Some(high)) if high < default_low => width(high, default_low),
        (None, Some(high)) => (default_low, high),
        (None, None) => (default_low, default_high),
    }
}

/// A closed set of acceptable values.
#[derive(Clone, Debug, PartialEq)]
pub struct ChoiceSpec {
    pub choices: Vec<JsonValue>,
    pub allow_blank: bool,
}

impl ChoiceSpec {
    /// Builds a choice set, dropping duplicate values.
    pub fn new<I, V>(choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonValue>,
    {
        let mut unique: Vec<JsonValue> = Vec::new();
        for choice in choices.into_iter().map(Into::into) {
            if !unique.contains(&choice) {
                unique.push(choice);
            }
        }
        Self {
            choices: unique,
            allow_blank: true,
        }
    }

    pub fn with_allow_blank(mut self, allow_blank: bool) -> Self {
        self.allow_blank = allow_blank;
        self
    }

    fn blank_is_a_choice(&self) -> bool {
        self.choices.iter().any(|choice| choice.as_str() == Some(""))
    }
}

/// Ordered, named field declarations.
#[derive(Clone, Debug, Default)]
pub struct FieldMap {
    entries: Vec<(String, Field)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field; duplicates are reported by [`FieldMap::validate`].
    pub fn with(mut self, name: impl Into<String>, field: Field) -> Self {
        self.entries.push((name.into(), field));
        self
    }

    pub fn push(&mut self, name: impl Into<String>, field: Field) {
        self.entries.push((name.into(), field));
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, field)| field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.entries
            .iter()
            .map(|(name, field)| (name.as_str(), field))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks names are unique and every field is well-formed.
    pub fn validate(&self) -> std::result::Result<(), FieldError> {
        for (index, (name, field)) in self.entries.iter().enumerate() {
            if self.entries[..index].iter().any(|(other, _)| other == name) {
                return Err(FieldError::DuplicateField { name: name.clone() });
            }
            field.validate()?;
        }
        Ok(())
    }
}

/// Bounds of a list field; items cycle through `items` in order.
#[derive(Clone, Debug)]
pub struct ListSpec {
    pub items: Vec<Field>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub length: Option<usize>,
}

impl ListSpec {
    pub fn new(items: Vec<Field>) -> Self {
        Self {
            items,
            min_length: Some(1),
            max_length: Some(10),
            length: None,
        }
    }

    pub fn with_min_length(mut self, min_length: Option<usize>) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn with_max_length(mut self, max_length: Option<usize>) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    /// The lower length bound, pinned by a fixed `length` when set.
    pub fn effective_min_length(&self) -> Option<usize> {
        self.length.or(self.min_length)
    }

    /// The upper length bound, pinned by a fixed `length` when set.
    pub fn effective_max_length(&self) -> Option<usize> {
        self.length.or(self.max_length)
    }

    /// The item declaration used for position `index`.
    pub fn item_for(&self, index: usize) -> Option<&Field> {
        if self.items.is_empty() {
            return None;
        }
        self.items.get(index % self.items.len())
    }
}

/// Type-specific part of a field declaration.
#[derive(Clone, Debug)]
pub enum FieldKind {
    Boolean,
    Char(CharSpec),
    Integer(NumericBounds<i64>),
    Float(NumericBounds<f64>),
    Choice(ChoiceSpec),
    Dict(FieldMap),
    List(ListSpec),
}

/// A typed, bounded declaration of one input attribute.
#[derive(Clone, Debug)]
pub struct Field {
    kind: FieldKind,
    required: bool,
    allow_null: bool,
    extra_faults: Vec<FaultKind>,
    valid: OnceCell<JsonValue>,
    invalid: OnceCell<Vec<InvalidValue>>,
}

impl Field {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            allow_null: true,
            extra_faults: Vec::new(),
            valid: OnceCell::new(),
            invalid: OnceCell::new(),
        }
    }

    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    pub fn char(spec: CharSpec) -> Self {
        Self::new(FieldKind::Char(spec))
    }

    pub fn integer(min_value: Option<i64>, max_value: Option<i64>) -> Self {
        Self::new(FieldKind::Integer(NumericBounds::new(min_value, max_value)))
    }

    pub fn float(min_value: Option<f64>, max_value: Option<f64>) -> Self {
        Self::new(FieldKind::Float(NumericBounds::new(min_value, max_value)))
    }

    pub fn choice(spec: ChoiceSpec) -> Self {
        Self::new(FieldKind::Choice(spec))
    }

    pub fn dict(fields: FieldMap) -> Self {
        Self::new(FieldKind::Dict(fields))
    }

    pub fn list(spec: ListSpec) -> Self {
        Self::new(FieldKind::List(spec))
    }

    /// Marks the field as required; a missing-required case is generated for it.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Forbids `null`; registers the null provider.
    pub fn not_null(mut self) -> Self {
        self.allow_null = false;
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_allow_null(mut self, allow_null: bool) -> Self {
        self.allow_null = allow_null;
        self
    }

    /// Explicitly registers a provider in addition to the deduced ones.
    pub fn with_fault(mut self, kind: FaultKind) -> Self {
        if !self.extra_faults.contains(&kind) {
            self.extra_faults.push(kind);
        }
        self
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn field_type(&self) -> FieldType {
        match &self.kind {
            FieldKind::Boolean => FieldType::Boolean,
            FieldKind::Char(_) => FieldType::Char,
            FieldKind::Integer(_) => FieldType::Integer,
            FieldKind::Float(_) => FieldType::Float,
            FieldKind::Choice(_) => FieldType::Choice,
            FieldKind::Dict(_) => FieldType::Dict,
            FieldKind::List(_) => FieldType::List,
        }
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn allows_null(&self) -> bool {
        self.allow_null
    }

    /// Sub-field declarations of a dict field.
    pub fn sub_fields(&self) -> Option<&FieldMap> {
        match &self.kind {
            FieldKind::Dict(fields) => Some(fields),
            _ => None,
        }
    }

    /// Checks the declaration's own bounds, recursing into nested fields.
    pub fn validate(&self) -> std::result::Result<(), FieldError> {
        match &self.kind {
            FieldKind::Boolean => Ok(()),
            FieldKind::Char(spec) => {
                if let (Some(min), Some(max)) = (spec.min_length, spec.max_length) {
                    if max < min {
                        return Err(FieldError::InvertedLength { min, max });
                    }
                }
                if spec.alphabet_chars().is_empty() {
                    return Err(FieldError::EmptyAlphabet);
                }
                if let Some(max) = spec.max_length {
                    if spec.affix_len() >= max {
                        return Err(FieldError::AffixTooLong {
                            affix: spec.affix_len(),
                            max,
                        });
                    }
                }
                Ok(())
            }
            FieldKind::Integer(bounds) => bounds.check(),
            FieldKind::Float(bounds) => {
                for value in [bounds.min_value, bounds.max_value].into_iter().flatten() {
                    if !value.is_finite() {
                        return Err(FieldError::NonFiniteBound { value });
                    }
                }
                bounds.check()
            }
            FieldKind::Choice(spec) => {
                if spec.choices.is_empty() {
                    return Err(FieldError::EmptyChoices);
                }
                Ok(())
            }
            FieldKind::Dict(fields) => fields.validate(),
            FieldKind::List(spec) => {
                if spec.items.is_empty() {
                    return Err(FieldError::EmptyListItems);
                }
                let min = spec.min_length.unwrap_or(0);
                if let Some(max) = spec.max_length {
                    if max < min {
                        return Err(FieldError::InvertedLength { min, max });
                    }
                }
                if let Some(length) = spec.length {
                    let max = spec.max_length.unwrap_or(usize::MAX);
                    if length < min || length > max {
                        return Err(FieldError::FixedLengthOutOfBounds { length, min, max });
                    }
                }
                for item in &spec.items {
                    item.validate()?;
                }
                Ok(())
            }
        }
    }

    /// Fault kinds this field supports, in provider-registration order.
    ///
    /// The list is deduced from the declaration: `null` first when nulls are
    /// forbidden, then the kind-specific providers, then invalid-type when
    /// enabled, then explicitly registered kinds.
    pub fn fault_kinds(&self, config: &GenerationConfig) -> Vec<FaultKind> {
        let mut kinds = Vec::new();
        if !self.allow_null {
            kinds.push(FaultKind::Null);
        }
        match &self.kind {
            FieldKind::Boolean => {}
            FieldKind::Char(spec) => {
                if !spec.allow_blank {
                    kinds.push(FaultKind::Blank);
                }
                if spec.max_length.is_some() {
                    kinds.push(FaultKind::ExceedMaxLength);
                }
                if spec.min_length.is_some_and(|min| min > 1) {
                    kinds.push(FaultKind::ExceedMinLength);
                }
            }
            FieldKind::Integer(NumericBounds {
                min_value,
                max_value,
            }) => {
                if max_value.is_some() {
                    kinds.push(FaultKind::ExceedMaxValue);
                }
                if min_value.is_some() {
                    kinds.push(FaultKind::ExceedMinValue);
                }
            }
            FieldKind::Float(NumericBounds {
                min_value,
                max_value,
            }) => {
                if max_value.is_some() {
                    kinds.push(FaultKind::ExceedMaxValue);
                }
                if min_value.is_some() {
                    kinds.push(FaultKind::ExceedMinValue);
                }
            }
            FieldKind::Choice(spec) => {
                if !spec.choices.is_empty() {
                    kinds.push(FaultKind::InvalidChoice);
                }
                if !spec.allow_blank && !spec.blank_is_a_choice() {
                    kinds.push(FaultKind::Blank);
                }
            }
            FieldKind::Dict(fields) => {
                if !fields.is_empty() {
                    kinds.push(FaultKind::InvalidNestedObject);
                }
            }
            FieldKind::List(spec) => {
                if spec.effective_max_length().is_some() {
                    kinds.push(FaultKind::ExceedMaxLength);
                }
                if spec.effective_min_length().is_some_and(|min| min > 0) {
                    kinds.push(FaultKind::ExceedMinLength);
                }
            }
        }
        if config.type_faults {
            kinds.push(FaultKind::InvalidType);
        }
        for kind in &self.extra_faults {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
        kinds
    }

    /// The memoized valid value; sampled on first call.
    pub fn valid_value(&self, ctx: &mut GenContext, config: &GenerationConfig) -> Result<&JsonValue> {
        if let Some(value) = self.valid.get() {
            return Ok(value);
        }
        let value = self.generate(ctx, config)?;
        Ok(self.valid.get_or_init(|| value))
    }

    /// The memoized valid value, if it has been sampled.
    pub fn cached_valid_value(&self) -> Option<&JsonValue> {
        self.valid.get()
    }

    /// The memoized invalid values, one batch per registered provider.
    ///
    /// `current` is the value the field holds in the record being mutated.
    /// The first call fixes the batch for the lifetime of the declaration.
    pub fn invalid_values(
        &self,
        name: &str,
        current: &JsonValue,
        ctx: &mut GenContext,
        config: &GenerationConfig,
    ) -> Result<&[InvalidValue]> {
        if let Some(values) = self.invalid.get() {
            return Ok(values);
        }
        let mut values = Vec::new();
        for kind in self.fault_kinds(config) {
            let provider = get_provider(kind)?;
            values.extend(provider.provide(self, name, current, ctx, config)?);
        }
        Ok(self.invalid.get_or_init(|| values))
    }

    /// Samples a fresh valid value without touching the memo.
    pub(crate) fn generate(&self, ctx: &mut GenContext, config: &GenerationConfig) -> Result<JsonValue> {
        let value = match &self.kind {
            FieldKind::Boolean => JsonValue::Bool(ctx.boolean()?),
            FieldKind::Char(spec) => {
                let (low, high) = spec.length_range();
                let total = ctx.sample("char length", low..=high)?;
                let core = ctx.string(total - spec.affix_len(), &spec.alphabet_chars())?;
                JsonValue::String(format!("{}{core}{}", spec.prefix, spec.suffix))
            }
            FieldKind::Integer(bounds) => {
                let (low, high) = resolve_range(bounds, config.integer_range, |bound, other| {
                    let width = config.integer_range[1].saturating_sub(config.integer_range[0]);
                    if bound > other {
                        (bound, bound.saturating_add(width))
                    } else {
                        (bound.saturating_sub(width), bound)
                    }
                });
                JsonValue::from(ctx.integer(low, high)?)
            }
            FieldKind::Float(bounds) => {
                let (low, high) = resolve_range(bounds, config.float_range, |bound, other| {
                    let width = config.float_range[1] - config.float_range[0];
                    if bound > other {
                        (bound, bound + width)
                    } else {
                        (bound - width, bound)
                    }
                });
                float_value(ctx.float(low, high, config.float_precision)?)
            }
            FieldKind::Choice(spec) => ctx.choose(&spec.choices)?,
            FieldKind::Dict(fields) => {
                let mut map = JsonMap::new();
                for (name, field) in fields.iter() {
                    map.insert(name.to_string(), field.valid_value(ctx, config)?.clone());
                }
                JsonValue::Object(map)
            }
            FieldKind::List(spec) => {
                let length = match spec.length {
                    Some(length) => length,
                    None => {
                        let low = spec.min_length.unwrap_or(0);
                        let high = spec
                            .max_length
                            .unwrap_or(config.list_item_limit)
                            .max(low);
                        ctx.sample("list length", low..=high)?
                    }
                };
                JsonValue::Array(list_items(spec, 0, length, ctx, config)?)
            }
        };
        Ok(value)
    }
}

/// Fresh items for positions `start..start + count` of a list field.
pub(crate) fn list_items(
    spec: &ListSpec,
    start: usize,
    count: usize,
    ctx: &mut GenContext,
    config: &GenerationConfig,
) -> Result<Vec<JsonValue>> {
    let mut items = Vec::with_capacity(count);
    for index in start..start + count {
        let Some(item) = spec.item_for(index) else {
            return Err(FieldError::EmptyListItems.into());
        };
        items.push(item.generate(ctx, config)?);
    }
    Ok(items)
}

#[cfg(test)]
#[path = "../tests/internal/field_unit_tests.rs"]
mod tests;
