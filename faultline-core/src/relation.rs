//! Conditional cross-field rules and their repair handlers.

use std::fmt;

use serde_json::Value as JsonValue;

use crate::assertion::Assertion;
use crate::error::{RelationError, Result};
use crate::fault::{Fault, FaultKind, InvalidData};
use crate::path::{self, KeyPath, WriteMode};

/// "When `condition` holds, every constraint must hold too."
///
/// Constraints are limited to assertions with a repair handler: key-exists,
/// key-not-exists and value comparisons.
#[derive(Clone, Debug)]
pub struct RelationConstraint {
    condition: Assertion,
    constraints: Vec<Assertion>,
}

impl RelationConstraint {
    pub fn new(condition: Assertion, constraints: Vec<Assertion>) -> std::result::Result<Self, RelationError> {
        for constraint in &constraints {
            if constraint.target_path().is_none() {
                return Err(RelationError::UnrepairableConstraint(constraint.description()));
            }
        }
        Ok(Self {
            condition,
            constraints,
        })
    }

    pub fn condition(&self) -> &Assertion {
        &self.condition
    }

    pub fn constraints(&self) -> &[Assertion] {
        &self.constraints
    }

    /// Paths whose declared valid value is written during repair.
    pub(crate) fn repair_targets(&self) -> impl Iterator<Item = &KeyPath> {
        self.constraints.iter().filter_map(|constraint| match constraint {
            Assertion::KeyExists(path) | Assertion::Value { path, .. } => Some(path),
            _ => None,
        })
    }
}

impl fmt::Display for RelationConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let constraints = self
            .constraints
            .iter()
            .map(Assertion::description)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "where {} then [{constraints}]", self.condition)
    }
}

/// Repairs `record` so `constraint` holds, returning the repaired record and
/// the pre-repair record as an invalid case.
///
/// `default` is the declared valid value of the constraint's target; it is
/// unused for key-not-exists constraints.
pub(crate) fn repair(
    condition: &Assertion,
    constraint: &Assertion,
    record: &JsonValue,
    default: Option<&JsonValue>,
) -> Result<(JsonValue, InvalidData)> {
    let (repaired, path, description) = match constraint {
        Assertion::KeyExists(path) => {
            let repaired = path::write(record, path, required_default(path, default)?, WriteMode::CreateParents)?;
            let description = format!(
                "( {} | where {condition} )",
                FaultKind::MissingRequired.tag()
            );
            (repaired, path, description)
        }
        Assertion::Value { path, .. } => {
            let repaired = path::write(record, path, required_default(path, default)?, WriteMode::CreateParents)?;
            (repaired, path, format!("( {constraint} )"))
        }
        Assertion::KeyNotExists(path) => {
            let repaired = path::delete(record, path)?;
            (repaired, path, format!("( {constraint} )"))
        }
        Assertion::ListDict(_) => {
            return Err(RelationError::UnrepairableConstraint(constraint.description()).into())
        }
    };
    let invalid = InvalidData {
        data: record.clone(),
        field_name: path.last().to_string(),
        fault: Fault::Relation { description },
        whole_field_path: path.clone(),
    };
    Ok((repaired, invalid))
}

fn required_default(path: &KeyPath, default: Option<&JsonValue>) -> Result<JsonValue> {
    default
        .cloned()
        .ok_or_else(|| RelationError::UnknownField(path.dotted()).into())
}
