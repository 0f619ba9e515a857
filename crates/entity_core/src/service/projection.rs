//! Projection between a record's field bag and plain mappings.
//!
//! # Responsibility
//! - List data field names of a record.
//! - Merge-assign property bags into a record.
//! - Produce fresh plain mappings with references flattened to ids.
//!
//! # Invariants
//! - `assign` never removes fields missing from its input.
//! - Entity references are stored and projected as the referenced `id`.
//! - Projections never alias the record's bag.

use crate::model::canon::CanonShape;
use crate::model::field::{
    classify_key, is_control_key, FieldBag, FieldKey, FieldValue, CANON_FIELD, CONTROL_SUFFIX,
    ID_OVERRIDE_FIELD, MERGE_FIELD,
};
use crate::model::record::Record;
use serde_json::{Map, Value};

impl Record {
    /// Data field names, in insertion order.
    pub fn fields(&self) -> Vec<String> {
        self.fields
            .keys()
            .filter(|name| !is_control_key(name))
            .cloned()
            .collect()
    }

    /// Merge-assigns `data` into this record.
    ///
    /// - `foo_$` is stored as `foo`.
    /// - Keys starting or ending with `$` are skipped, except the recognized
    ///   controls `id$` and `merge$` (applied when not null).
    /// - A record value is stored as its `id`.
    pub fn assign(&mut self, data: &FieldBag) -> &mut Self {
        for (key, value) in data {
            let name = match classify_key(key) {
                FieldKey::Escaped(name) if name.starts_with(CONTROL_SUFFIX) => continue,
                FieldKey::Data(name) | FieldKey::Escaped(name) | FieldKey::Embedded(name) => name,
                FieldKey::Control(_) | FieldKey::Prefixed(_) => continue,
            };
            let stored = match value {
                FieldValue::Entity(record) => {
                    FieldValue::Data(record.id().unwrap_or(Value::Null))
                }
                FieldValue::Data(value) => FieldValue::Data(value.clone()),
            };
            self.fields.insert(name.to_string(), stored);
        }

        if let Some(id) = non_null_control(data, ID_OVERRIDE_FIELD) {
            self.id_override = Some(id);
        }
        if let Some(merge) = non_null_control(data, MERGE_FIELD) {
            self.merge = Some(merge);
        }
        self
    }

    /// Fresh plain mapping of every data field.
    ///
    /// With `include_canon`, the canon is placed first under `entity$` in the
    /// requested shape. `id` is an ordinary data field here.
    pub fn to_plain(&self, include_canon: bool, shape: CanonShape) -> Map<String, Value> {
        let mut out = Map::new();
        if include_canon {
            out.insert(CANON_FIELD.to_string(), self.canon.format(shape));
        }
        for (name, value) in &self.fields {
            if !is_control_key(name) {
                out.insert(name.clone(), value.flatten());
            }
        }
        out
    }

    /// `to_plain(true, CanonShape::Object)`.
    pub fn data(&self) -> Map<String, Value> {
        self.to_plain(true, CanonShape::Object)
    }

    /// Copy with the same canon and context and an independent field bag.
    ///
    /// References are flattened; `id$` and `merge$` are not carried over.
    pub fn clone_entity(&self) -> Record {
        let mut copy = Record::bind(self.canon.clone(), self.context.clone());
        for (name, value) in &self.fields {
            if !is_control_key(name) {
                copy.fields
                    .insert(name.clone(), FieldValue::Data(value.flatten()));
            }
        }
        copy
    }
}

fn non_null_control(data: &FieldBag, key: &str) -> Option<Value> {
    data.get(key)
        .map(FieldValue::flatten)
        .filter(|value| !value.is_null())
}
