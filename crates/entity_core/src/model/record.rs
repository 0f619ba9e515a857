//! Entity record: canon, dispatcher context and field bag.
//!
//! # Responsibility
//! - Own the bound canon and the ordered field bag of one entity.
//! - Keep control state (`id$`, `merge$`) apart from persisted data.
//!
//! # Invariants
//! - The canon only changes through the deprecated `change_canon`.
//! - The field bag preserves insertion order.
//! - Rendering behavior is selected once, when the record is bound.

use crate::error::EntityResult;
use crate::model::canon::{AsCanon, Canon, ABSENT_SEGMENT};
use crate::model::context::{EntityContext, HasDispatcher};
use crate::model::field::{FieldValue, ID_FIELD};
use crate::render::Redaction;
use crate::service::dispatch::Dispatcher;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// One entity instance bound to a canon and a dispatcher context.
#[derive(Debug, Clone)]
pub struct Record {
    pub(crate) canon: Canon,
    pub(crate) context: EntityContext,
    pub(crate) fields: IndexMap<String, FieldValue>,
    pub(crate) id_override: Option<Value>,
    pub(crate) merge: Option<Value>,
    pub(crate) redaction: Arc<Redaction>,
}

impl Record {
    /// Binds an empty record, selecting its redaction by canon string.
    pub(crate) fn bind(canon: Canon, context: EntityContext) -> Self {
        let redaction = context.redaction().lookup(&canon);
        Self {
            canon,
            context,
            fields: IndexMap::new(),
            id_override: None,
            merge: None,
            redaction,
        }
    }

    pub fn canon(&self) -> &Canon {
        &self.canon
    }

    pub fn context(&self) -> &EntityContext {
        &self.context
    }

    pub fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        self.context.dispatcher()
    }

    /// Redaction bound when this record was made.
    pub fn redaction(&self) -> &Redaction {
        &self.redaction
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Direct field assignment. The key is stored as given.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> &mut Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Removes one field, keeping the order of the rest.
    pub fn remove_field(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.shift_remove(name)
    }

    /// The `id` data field, flattened; `None` when unset or null.
    pub fn id(&self) -> Option<Value> {
        self.fields
            .get(ID_FIELD)
            .map(FieldValue::flatten)
            .filter(|id| !id.is_null())
    }

    /// Identifier requested through the `id$` control field.
    pub fn id_override(&self) -> Option<&Value> {
        self.id_override.as_ref()
    }

    /// Upsert directive requested through the `merge$` control field.
    pub fn merge_directive(&self) -> Option<&Value> {
        self.merge.as_ref()
    }

    /// Compares this record's canon with `target`.
    ///
    /// # Errors
    /// - `InvalidCanon` when `target` is a string outside the canon grammar.
    pub fn is<T: AsCanon + ?Sized>(&self, target: &T) -> EntityResult<bool> {
        Ok(self.canon.isa(&target.as_canon()?))
    }

    /// Rewrites canon components in place.
    ///
    /// `None` leaves a component as is; `Some("-")` clears it.
    /// The bound redaction is not re-selected.
    #[deprecated(note = "derive a record with `make` instead of mutating its canon")]
    pub fn change_canon(&mut self, zone: Option<&str>, base: Option<&str>, name: Option<&str>) {
        for (slot, change) in [
            (&mut self.canon.zone, zone),
            (&mut self.canon.base, base),
            (&mut self.canon.name, name),
        ] {
            match change {
                None | Some("") => {}
                Some(ABSENT_SEGMENT) => *slot = None,
                Some(value) => *slot = Some(value.to_string()),
            }
        }
    }
}

impl HasDispatcher for Record {
    fn entity_context(&self) -> EntityContext {
        self.context.clone()
    }
}

impl AsCanon for Record {
    fn as_canon(&self) -> EntityResult<Canon> {
        Ok(self.canon.clone())
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.redaction.render(self))
    }
}
