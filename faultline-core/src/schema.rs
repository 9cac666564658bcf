//! Ordered field declarations plus relation constraints for one endpoint.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use crate::error::{RelationError, Result};
use crate::field::{Field, FieldKind, FieldMap};
use crate::path::{KeyPath, PathSegment};
use crate::relation::RelationConstraint;

/// One step from a field to a nested declaration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Route {
    /// Position in a [`FieldMap`].
    Entry(usize),
    /// Position in a list field's item declarations.
    Item(usize),
}

/// A validated set of field declarations with a path index.
///
/// The index maps every dotted field path (`address`, `address.zip`,
/// `tags.0`) to the route that reaches its declaration.
#[derive(Clone, Debug)]
pub struct Schema {
    fields: FieldMap,
    relations: Vec<RelationConstraint>,
    index: BTreeMap<KeyPath, Vec<Route>>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Validates `fields` and builds the path index.
    pub fn new(fields: FieldMap) -> Result<Self> {
        Self::with_relations(fields, Vec::new())
    }

    /// Validates `fields` and `relations` and builds the path index.
    ///
    /// Value and key-exists constraints must target a declared field, since
    /// repair writes that field's valid value.
    pub fn with_relations(fields: FieldMap, relations: Vec<RelationConstraint>) -> Result<Self> {
        fields.validate()?;
        let mut index = BTreeMap::new();
        for (position, (name, field)) in fields.iter().enumerate() {
            index_field(
                &mut index,
                KeyPath::key(name),
                vec![Route::Entry(position)],
                field,
            );
        }
        let schema = Self {
            fields,
            relations,
            index,
        };
        for relation in &schema.relations {
            for path in relation.repair_targets() {
                if schema.field_at(path).is_none() {
                    return Err(RelationError::UnknownField(path.dotted()).into());
                }
            }
        }
        Ok(schema)
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn relations(&self) -> &[RelationConstraint] {
        &self.relations
    }

    /// Every indexed field path, in sorted order.
    pub fn field_paths(&self) -> impl Iterator<Item = &KeyPath> {
        self.index.keys()
    }

    /// The declaration addressed by `path`.
    ///
    /// List positions beyond the declared items resolve cyclically, matching
    /// how list values are generated.
    pub fn field_at(&self, path: &KeyPath) -> Option<&Field> {
        if let Some(route) = self.index.get(path) {
            return self.follow(route);
        }
        let segments = path.segments();
        let (first, rest) = segments.split_first()?;
        let PathSegment::Key(name) = first else {
            return None;
        };
        let mut field = self.fields.get(name)?;
        for segment in rest {
            field = match (field.kind(), segment) {
                (FieldKind::Dict(fields), PathSegment::Key(key)) => fields.get(key)?,
                (FieldKind::Dict(fields), PathSegment::Index(index)) => {
                    fields.get(&index.to_string())?
                }
                (FieldKind::List(spec), PathSegment::Index(index)) => spec.item_for(*index)?,
                _ => return None,
            };
        }
        Some(field)
    }

    fn follow(&self, route: &[Route]) -> Option<&Field> {
        let (first, rest) = route.split_first()?;
        let Route::Entry(position) = first else {
            return None;
        };
        let mut field = self.fields.iter().nth(*position)?.1;
        for step in rest {
            field = match (field.kind(), step) {
                (FieldKind::Dict(fields), Route::Entry(position)) => {
                    fields.iter().nth(*position)?.1
                }
                (FieldKind::List(spec), Route::Item(position)) => spec.items.get(*position)?,
                _ => return None,
            };
        }
        Some(field)
    }

    /// Draft 2020-12 JSON Schema expressing every field constraint.
    pub fn to_json_schema(&self) -> JsonValue {
        crate::conformance::schema_document(self)
    }
}

fn index_field(
    index: &mut BTreeMap<KeyPath, Vec<Route>>,
    path: KeyPath,
    route: Vec<Route>,
    field: &Field,
) {
    match field.kind() {
        FieldKind::Dict(fields) => {
            for (position, (name, sub_field)) in fields.iter().enumerate() {
                let mut sub_route = route.clone();
                sub_route.push(Route::Entry(position));
                index_field(index, path.child(name), sub_route, sub_field);
            }
        }
        FieldKind::List(spec) => {
            for (position, item) in spec.items.iter().enumerate() {
                let mut item_route = route.clone();
                item_route.push(Route::Item(position));
                index_field(index, path.child(position), item_route, item);
            }
        }
        _ => {}
    }
    index.insert(path, route);
}

/// Collects fields and relations before validation.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: FieldMap,
    relations: Vec<RelationConstraint>,
}

impl SchemaBuilder {
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.push(name, field);
        self
    }

    pub fn relation(mut self, relation: RelationConstraint) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn build(self) -> Result<Schema> {
        Schema::with_relations(self.fields, self.relations)
    }
}

#[cfg(test)]
#[path = "../tests/internal/schema_unit_tests.rs"]
mod tests;
