//! Field keys and values of an entity record.
//!
//! # Responsibility
//! - Classify property keys as data, escaped data or control metadata.
//! - Hold field values, which are plain JSON data or entity references.
//!
//! # Invariants
//! - Classification happens once, through [`classify_key`].
//! - An entity reference always projects to the referenced record's `id`.

use crate::model::record::Record;
use indexmap::IndexMap;
use serde_json::Value;

/// Suffix that marks a key as control metadata.
pub const CONTROL_SUFFIX: char = '$';
/// Suffix that marks a data key whose logical name would look like control.
pub const ESCAPE_SUFFIX: &str = "_$";

/// Control key carrying a full canon (string, triple or mapping).
pub const CANON_FIELD: &str = "entity$";
/// Control key overriding the zone component.
pub const ZONE_FIELD: &str = "zone$";
/// Control key overriding the base component.
pub const BASE_FIELD: &str = "base$";
/// Control key overriding the name component.
pub const NAME_FIELD: &str = "name$";
/// Control key carrying an explicit identifier for the store.
pub const ID_OVERRIDE_FIELD: &str = "id$";
/// Control key requesting upsert semantics on save.
pub const MERGE_FIELD: &str = "merge$";
/// Conventional identifier data field.
pub const ID_FIELD: &str = "id";

/// Ordered property bag, as accepted by `make` and `assign`.
pub type FieldBag = IndexMap<String, FieldValue>;

/// Classification of one property key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey<'a> {
    /// Plain data field, no sigil anywhere.
    Data(&'a str),
    /// `foo_$`; carries the logical name `foo`.
    Escaped(&'a str),
    /// Ends with `$`; carries the full key.
    Control(&'a str),
    /// Starts with `$` (and does not end with it).
    Prefixed(&'a str),
    /// Contains `$` only in the middle, e.g. `a$b`.
    Embedded(&'a str),
}

/// Classifies a property key by the suffix convention.
pub fn classify_key(key: &str) -> FieldKey<'_> {
    if key.len() > ESCAPE_SUFFIX.len() && key.ends_with(ESCAPE_SUFFIX) {
        FieldKey::Escaped(&key[..key.len() - ESCAPE_SUFFIX.len()])
    } else if key.ends_with(CONTROL_SUFFIX) {
        FieldKey::Control(key)
    } else if key.starts_with(CONTROL_SUFFIX) {
        FieldKey::Prefixed(key)
    } else if key.contains(CONTROL_SUFFIX) {
        FieldKey::Embedded(key)
    } else {
        FieldKey::Data(key)
    }
}

/// Returns whether `key` ends in the control suffix.
pub fn is_control_key(key: &str) -> bool {
    key.ends_with(CONTROL_SUFFIX)
}

/// One value in a record's field bag.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Data(Value),
    /// Reference to another entity; projected as that entity's `id`.
    Entity(Record),
}

impl FieldValue {
    /// Projects this value to plain JSON, flattening references to their id.
    pub fn flatten(&self) -> Value {
        match self {
            Self::Data(value) => value.clone(),
            Self::Entity(record) => record.id().unwrap_or(Value::Null),
        }
    }

    pub fn as_data(&self) -> Option<&Value> {
        match self {
            Self::Data(value) => Some(value),
            Self::Entity(_) => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Record> {
        match self {
            Self::Entity(record) => Some(record),
            Self::Data(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_data().and_then(Value::as_str)
    }

    /// `true` for JSON null only.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Data(Value::Null))
    }
}

impl PartialEq<Value> for FieldValue {
    fn eq(&self, other: &Value) -> bool {
        matches!(self, Self::Data(value) if value == other)
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Data(value)
    }
}

impl From<Record> for FieldValue {
    fn from(value: Record) -> Self {
        Self::Entity(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Data(Value::from(value))
    }
}

/// Builds a bag from a JSON object; any other value yields an empty bag.
pub fn bag_from_json(value: Value) -> FieldBag {
    match value {
        Value::Object(entries) => entries
            .into_iter()
            .map(|(key, value)| (key, FieldValue::Data(value)))
            .collect(),
        _ => FieldBag::new(),
    }
}
