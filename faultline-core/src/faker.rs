//! Valid-record synthesis and single-fault enumeration for one schema.

use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::{debug, info};

use crate::assertion::{Assertable, Assertion};
use crate::config::GenerationConfig;
use crate::error::{RelationError, Result};
use crate::fault::{Fault, FaultKind, InvalidData};
use crate::path::KeyPath;
use crate::relation::repair;
use crate::rng::GenContext;
use crate::schema::Schema;

const REPAIR_ATTEMPTS: usize = 32;

/// The valid record after relation repair, plus the cases repair produced.
#[derive(Clone, Debug)]
struct Baseline {
    record: JsonValue,
    relation_cases: Vec<InvalidData>,
}

/// Generates the valid baseline and its single-fault variants.
///
/// A faker owns its schema so that per-field memoized values live exactly as
/// long as the faker: two fakers over clones of one schema sample
/// independently.
#[derive(Debug)]
pub struct Faker {
    schema: Schema,
    config: GenerationConfig,
    ctx: GenContext,
    baseline: Option<Baseline>,
}

impl Faker {
    pub fn new(schema: Schema, config: GenerationConfig) -> Self {
        let ctx = GenContext::from_seed(config.seed);
        Self {
            schema,
            config,
            ctx,
            baseline: None,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// The valid baseline; synthesized and repaired on first call.
    pub fn valid_record(&mut self) -> Result<&JsonValue> {
        Ok(&self.baseline()?.record)
    }

    fn baseline(&mut self) -> Result<&Baseline> {
        let baseline = match self.baseline.take() {
            Some(baseline) => baseline,
            None => self.synthesize()?,
        };
        Ok(self.baseline.insert(baseline))
    }

    fn synthesize(&mut self) -> Result<Baseline> {
        let mut record = JsonMap::new();
        for (name, field) in self.schema.fields().iter() {
            let value = field.valid_value(&mut self.ctx, &self.config)?;
            record.insert(name.to_string(), value.clone());
        }
        debug!(fields = record.len(), seed = self.ctx.seed(), "synthesized valid record");
        let (record, relation_cases) = self.apply_relation_constraints(JsonValue::Object(record))?;
        Ok(Baseline {
            record,
            relation_cases,
        })
    }

    /// Repairs `record` against every relation in declaration order.
    ///
    /// Returns the repaired record and one invalid case per repaired
    /// constraint. Later relations see earlier repairs.
    pub fn apply_relation_constraints(
        &mut self,
        record: JsonValue,
    ) -> Result<(JsonValue, Vec<InvalidData>)> {
        let mut record = record;
        let mut cases = Vec::new();
        for relation in self.schema.relations() {
            let condition = relation.condition();
            if condition.evaluate(&record).is_err() {
                continue;
            }
            info!(condition = %condition, "relation condition holds");
            for constraint in relation.constraints() {
                if constraint.evaluate(&record).is_ok() {
                    continue;
                }
                let (repaired, invalid) = repair_constraint(
                    &self.schema,
                    &mut self.ctx,
                    &self.config,
                    condition,
                    constraint,
                    &record,
                )?;
                info!(
                    constraint = %constraint,
                    path = %invalid.whole_field_path,
                    "repaired relation constraint"
                );
                record = repaired;
                cases.push(invalid);
            }
        }
        Ok((record, cases))
    }

    /// Field-level cases in declaration order, then relation cases.
    pub fn invalid_records(&mut self) -> Result<Vec<InvalidData>> {
        let baseline = self.baseline()?.clone();
        let Some(object) = baseline.record.as_object() else {
            return Ok(baseline.relation_cases);
        };

        let mut cases = Vec::new();
        for (name, field) in self.schema.fields().iter() {
            let before = cases.len();
            // A key removed by relation repair is already absent from the baseline.
            if field.is_required() && object.contains_key(name) {
                let mut data = object.clone();
                data.remove(name);
                cases.push(InvalidData {
                    data: JsonValue::Object(data),
                    field_name: name.to_string(),
                    fault: Fault::Field {
                        kind: FaultKind::MissingRequired,
                    },
                    whole_field_path: KeyPath::key(name),
                });
            }
            let current = match object.get(name) {
                Some(value) => value.clone(),
                None => field.valid_value(&mut self.ctx, &self.config)?.clone(),
            };
            for invalid in field.invalid_values(name, &current, &mut self.ctx, &self.config)? {
                let mut data = object.clone();
                data.insert(name.to_string(), invalid.value.clone());
                let whole_field_path = match &invalid.sub_path {
                    Some(sub_path) => KeyPath::key(name).join(sub_path),
                    None => KeyPath::key(name),
                };
                cases.push(InvalidData {
                    data: JsonValue::Object(data),
                    field_name: name.to_string(),
                    fault: Fault::Field { kind: invalid.kind },
                    whole_field_path,
                });
            }
            debug!(field = name, cases = cases.len() - before, "enumerated field faults");
        }
        cases.extend(baseline.relation_cases);
        Ok(cases)
    }
}

/// Repairs one failing constraint, resampling the target field until the
/// repaired record satisfies it.
///
/// The target's memoized valid value is tried first, then fresh samples.
fn repair_constraint(
    schema: &Schema,
    ctx: &mut GenContext,
    config: &GenerationConfig,
    condition: &Assertion,
    constraint: &Assertion,
    record: &JsonValue,
) -> Result<(JsonValue, InvalidData)> {
    let target = constraint
        .target_path()
        .and_then(|path| Some((path, schema.field_at(path)?)));
    let Some((path, field)) = target else {
        return repair(condition, constraint, record, None);
    };
    let mut candidate = field.valid_value(ctx, config)?.clone();
    for attempt in 0..REPAIR_ATTEMPTS {
        let (repaired, invalid) = repair(condition, constraint, record, Some(&candidate))?;
        if constraint.evaluate(&repaired).is_ok() {
            return Ok((repaired, invalid));
        }
        debug!(constraint = %constraint, attempt, "repair candidate rejected");
        candidate = field.generate(ctx, config)?;
    }
    Err(RelationError::Unsatisfiable {
        path: path.dotted(),
        constraint: constraint.to_string(),
    }
    .into())
}

#[cfg(test)]
#[path = "../tests/internal/faker_unit_tests.rs"]
mod tests;
