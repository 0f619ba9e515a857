//! Record construction (`make`).
//!
//! # Responsibility
//! - Resolve a canon from positional components, control fields and the
//!   calling record's canon.
//! - Populate the new record's field bag from a property bag.
//!
//! # Invariants
//! - Positional components are right-aligned: one value is `name`, two are
//!   `base, name`, three are `zone, base, name`.
//! - `entity$` in the bag overrides every positional component.
//! - Positional `base`/`zone` win over shorthand embedded in `name`.
//! - Components still absent fall back to `base$`/`zone$`, then to the
//!   calling record's canon.
//! - The property bag and the calling record are never mutated.

use crate::error::EntityResult;
use crate::model::canon::Canon;
use crate::model::context::{EntityContext, HasDispatcher};
use crate::model::field::{
    classify_key, FieldBag, FieldKey, FieldValue, BASE_FIELD, CANON_FIELD, ID_OVERRIDE_FIELD,
    NAME_FIELD, ZONE_FIELD,
};
use crate::model::record::Record;
use log::debug;
use serde_json::Value;

const POSITIONAL_SLOTS: usize = 3;

/// Arguments for [`Record::make`].
///
/// Positional components are pushed left to right, as they would be written
/// in `make(zone, base, name)`.
#[derive(Debug, Clone, Default)]
pub struct MakeArgs {
    context: Option<EntityContext>,
    positional: Vec<Option<String>>,
    props: Option<FieldBag>,
}

impl MakeArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the new record to another dispatcher context.
    pub fn on(mut self, handle: &impl HasDispatcher) -> Self {
        self.context = Some(handle.entity_context());
        self
    }

    /// Appends one positional component.
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.positional.push(Some(value.into()));
        self
    }

    /// Appends an explicitly absent positional component.
    pub fn absent(mut self) -> Self {
        self.positional.push(None);
        self
    }

    /// Sets the property bag.
    pub fn props(mut self, props: FieldBag) -> Self {
        self.props = Some(props);
        self
    }
}

impl Record {
    /// Derives a new record from this one.
    ///
    /// # Errors
    /// - `InvalidCanon` when `entity$`, the positional `name` or `name$` is a
    ///   string outside the canon grammar.
    pub fn make(&self, args: MakeArgs) -> EntityResult<Record> {
        let MakeArgs {
            context,
            mut positional,
            props,
        } = args;
        let context = context.unwrap_or_else(|| self.context.clone());
        let props = props.unwrap_or_default();

        if positional.len() > POSITIONAL_SLOTS {
            debug!(
                "event=entity_make module=make status=trimmed dropped_args={}",
                positional.len() - POSITIONAL_SLOTS
            );
        }
        while positional.len() < POSITIONAL_SLOTS {
            positional.insert(0, None);
        }
        let name_arg = positional.pop().flatten();
        let base_arg = positional.pop().flatten().filter(|v| !v.is_empty());
        let zone_arg = positional.pop().flatten().filter(|v| !v.is_empty());

        let explicit = match props.get(CANON_FIELD) {
            Some(spec) => canon_override(spec)?,
            None => None,
        };
        let resolved = match explicit {
            Some(canon) => canon,
            None => {
                let shorthand = match name_arg.or_else(|| control_str(&props, NAME_FIELD)) {
                    Some(name) => Canon::parse(&name)?,
                    None => Canon::default(),
                };
                Canon {
                    zone: zone_arg.or(shorthand.zone),
                    base: base_arg.or(shorthand.base),
                    name: shorthand.name,
                }
            }
        };

        let canon = Canon {
            zone: resolved
                .zone
                .or_else(|| control_str(&props, ZONE_FIELD))
                .or_else(|| self.canon.zone.clone()),
            base: resolved
                .base
                .or_else(|| control_str(&props, BASE_FIELD))
                .or_else(|| self.canon.base.clone()),
            name: resolved.name.or_else(|| self.canon.name.clone()),
        };

        let mut entity = Record::bind(canon, context);
        for (key, value) in &props {
            if let FieldKey::Data(name) | FieldKey::Escaped(name) = classify_key(key) {
                entity.fields.insert(name.to_string(), value.clone());
            }
        }
        if let Some(id) = props.get(ID_OVERRIDE_FIELD).map(FieldValue::flatten) {
            if !id.is_null() {
                entity.id_override = Some(id);
            }
        }

        debug!(
            "event=entity_make module=make status=ok canon={} fields={}",
            entity.canon,
            entity.fields.len()
        );
        Ok(entity)
    }

    /// `make(name)`: sibling record differing in the given components.
    pub fn make_name(&self, name: &str) -> EntityResult<Record> {
        self.make(MakeArgs::new().arg(name))
    }

    /// `make(props)`: record under this canon (or `entity$`) with `props`.
    pub fn make_props(&self, props: FieldBag) -> EntityResult<Record> {
        self.make(MakeArgs::new().props(props))
    }
}

fn canon_override(spec: &FieldValue) -> EntityResult<Option<Canon>> {
    match spec {
        FieldValue::Data(value @ (Value::String(_) | Value::Array(_) | Value::Object(_))) => {
            Canon::from_value(value).map(Some)
        }
        FieldValue::Data(_) => Ok(None),
        FieldValue::Entity(record) => Ok(Some(record.canon.clone())),
    }
}

fn control_str(props: &FieldBag, key: &str) -> Option<String> {
    props
        .get(key)
        .and_then(FieldValue::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::MakeArgs;
    use crate::model::canon::Canon;
    use crate::model::context::EntityContext;
    use crate::model::field::bag_from_json;
    use crate::model::record::Record;
    use crate::service::dispatch::{DispatchReply, DispatchResult, Dispatcher, EntityMessage};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    struct IdleDispatcher;

    #[async_trait]
    impl Dispatcher for IdleDispatcher {
        async fn dispatch(&self, _message: EntityMessage<'_>) -> DispatchResult {
            Ok(DispatchReply::None)
        }
    }

    fn template(canon: &str) -> Record {
        let context = EntityContext::new(Arc::new(IdleDispatcher)).expect("empty options");
        context.make_entity(Canon::parse(canon).expect("valid canon"))
    }

    #[test]
    fn single_positional_is_name_and_inherits_the_rest() {
        let base = template("z/b/n");
        let derived = base.make_name("n2").expect("make");
        assert_eq!(derived.canon(), &Canon::new(Some("z"), Some("b"), Some("n2")));
    }

    #[test]
    fn two_positionals_are_base_and_name() {
        let base = template("z/b/n");
        let derived = base
            .make(MakeArgs::new().arg("b2").arg("n2"))
            .expect("make");
        assert_eq!(derived.canon(), &Canon::new(Some("z"), Some("b2"), Some("n2")));
    }

    #[test]
    fn absent_positionals_inherit() {
        let base = template("z/b/n");
        let derived = base
            .make(MakeArgs::new().arg("z2").absent().absent())
            .expect("make");
        assert_eq!(derived.canon(), &Canon::new(Some("z2"), Some("b"), Some("n")));
    }

    #[test]
    fn name_shorthand_supplies_zone_and_base() {
        let base = template("z/b/n");
        let derived = base.make_name("x/y/n2").expect("make");
        assert_eq!(derived.canon(), &Canon::new(Some("x"), Some("y"), Some("n2")));
    }

    #[test]
    fn positional_base_wins_over_name_shorthand() {
        let base = template("-/-/n");
        let derived = base
            .make(MakeArgs::new().arg("b2").arg("x/y/n2"))
            .expect("make");
        assert_eq!(derived.canon(), &Canon::new(Some("x"), Some("b2"), Some("n2")));
    }

    #[test]
    fn control_components_fill_gaps_before_inheritance() {
        let base = template("z/b/n");
        let derived = base
            .make(
                MakeArgs::new()
                    .arg("n2")
                    .props(bag_from_json(json!({"base$": "b3", "zone$": "z3"}))),
            )
            .expect("make");
        assert_eq!(derived.canon(), &Canon::new(Some("z3"), Some("b3"), Some("n2")));

        let from_name_control = base
            .make_props(bag_from_json(json!({"name$": "n4"})))
            .expect("make");
        assert_eq!(
            from_name_control.canon(),
            &Canon::new(Some("z"), Some("b"), Some("n4"))
        );
    }

    #[test]
    fn canon_control_overrides_positionals() {
        let base = template("z/b/n");
        let derived = base
            .make(
                MakeArgs::new()
                    .arg("ignored")
                    .props(bag_from_json(json!({"entity$": {"base": "b5", "name": "n5"}}))),
            )
            .expect("make");
        assert_eq!(derived.canon(), &Canon::new(Some("z"), Some("b5"), Some("n5")));
    }

    #[test]
    fn make_copies_data_and_escaped_keys_only() {
        let base = template("z/b/n");
        let derived = base
            .make_props(bag_from_json(json!({
                "a": 1,
                "foo_$": 2,
                "skip$": 3,
                "a$b": 4,
                "$c": 5,
                "id$": "fixed"
            })))
            .expect("make");
        assert_eq!(derived.fields(), vec!["a".to_string(), "foo".to_string()]);
        assert_eq!(derived.id_override(), Some(&json!("fixed")));
        assert_eq!(derived.id(), None);
    }

    #[test]
    fn invalid_name_shorthand_fails() {
        let base = template("z/b/n");
        assert!(base.make_name("///").is_err());
    }
}
