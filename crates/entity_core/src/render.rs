//! Redaction registry and textual rendering of records.
//!
//! # Responsibility
//! - Map canon strings to the field sets hidden from rendering.
//! - Render a record as `$canon;id=<id>;{field:value,...}`.
//!
//! # Invariants
//! - `id` is always hidden from the field dump; it is shown separately.
//! - The registry is only mutable before it is shared; records read it
//!   through `Arc<RedactionRegistry>`.
//! - Configuring one canon twice keeps the last declaration.

use crate::config::{EntityOptions, HideSpec};
use crate::error::EntityResult;
use crate::model::canon::{Canon, CANON_SIGIL};
use crate::model::field::ID_FIELD;
use crate::model::record::Record;
use indexmap::IndexSet;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

static BARE_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").expect("valid bare token regex"));

/// Fields hidden from one canon's rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redaction {
    hidden: IndexSet<String>,
}

impl Default for Redaction {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}

impl Redaction {
    /// Builds a redaction; `id` is always added.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut hidden: IndexSet<String> = fields.into_iter().map(Into::into).collect();
        hidden.insert(ID_FIELD.to_string());
        Self { hidden }
    }

    pub fn hides(&self, field: &str) -> bool {
        self.hidden.contains(field)
    }

    pub fn hidden_fields(&self) -> impl Iterator<Item = &str> {
        self.hidden.iter().map(String::as_str)
    }

    /// Renders `record` with this redaction applied.
    pub fn render(&self, record: &Record) -> String {
        let id = match record.id() {
            Some(Value::String(id)) => id,
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let mut dump = String::from("{");
        let mut first = true;
        for (name, value) in record.to_plain(false, Default::default()) {
            if self.hides(&name) {
                continue;
            }
            if !first {
                dump.push(',');
            }
            first = false;
            write_key(&name, &mut dump);
            dump.push(':');
            write_compact(&value, &mut dump);
        }
        dump.push('}');

        format!("{CANON_SIGIL}{};id={id};{dump}", record.canon())
    }
}

/// Canon string to redaction table.
#[derive(Debug, Clone, Default)]
pub struct RedactionRegistry {
    by_canon: HashMap<String, Arc<Redaction>>,
    fallback: Arc<Redaction>,
}

impl RedactionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated from `options.hide`.
    pub fn from_options(options: &EntityOptions) -> EntityResult<Self> {
        let mut registry = Self::new();
        registry.configure(options)?;
        Ok(registry)
    }

    /// Applies every `hide` declaration; later ones replace earlier ones.
    ///
    /// # Errors
    /// - `InvalidCanon` when a declaration key is not a valid canon. Entries
    ///   before the failing one stay applied.
    pub fn configure(&mut self, options: &EntityOptions) -> EntityResult<()> {
        for (pattern, spec) in &options.hide {
            let canon = Canon::parse(pattern)?;
            self.hide(&canon, spec);
        }
        Ok(())
    }

    /// Declares hidden fields for one canon.
    pub fn hide(&mut self, canon: &Canon, spec: &HideSpec) {
        let redaction = Redaction::new(spec.field_names());
        info!(
            "event=redaction_configure module=render status=ok canon={} hidden={}",
            canon,
            redaction.hidden.len()
        );
        self.by_canon.insert(canon.to_string(), Arc::new(redaction));
    }

    /// Redaction for `canon`, or the default one hiding only `id`.
    pub fn lookup(&self, canon: &Canon) -> Arc<Redaction> {
        self.by_canon
            .get(&canon.to_string())
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }

    pub fn len(&self) -> usize {
        self.by_canon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_canon.is_empty()
    }
}

fn write_key(key: &str, out: &mut String) {
    if BARE_TOKEN_RE.is_match(key) {
        out.push_str(key);
    } else {
        out.push_str(&Value::from(key).to_string());
    }
}

// Relaxed JSON: bare keys, bare simple strings, everything else as JSON.
fn write_compact(value: &Value, out: &mut String) {
    match value {
        Value::String(text) => {
            let keyword = matches!(text.as_str(), "true" | "false" | "null");
            if BARE_TOKEN_RE.is_match(text) && !keyword {
                out.push_str(text);
            } else {
                out.push_str(&value.to_string());
            }
        }
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_compact(item, out);
            }
            out.push(']');
        }
        Value::Object(entries) => {
            out.push('{');
            for (index, (key, item)) in entries.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_key(key, out);
                out.push(':');
                write_compact(item, out);
            }
            out.push('}');
        }
        other => out.push_str(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{write_compact, Redaction, RedactionRegistry};
    use crate::config::{EntityOptions, HideSpec};
    use crate::model::canon::Canon;
    use serde_json::json;

    #[test]
    fn redaction_always_hides_id() {
        let redaction = Redaction::new(["secret"]);
        assert!(redaction.hides("secret"));
        assert!(redaction.hides("id"));
        assert!(Redaction::default().hides("id"));
        assert!(!Redaction::default().hides("secret"));
    }

    #[test]
    fn compact_dump_uses_bare_tokens_where_possible() {
        let mut out = String::new();
        write_compact(
            &json!({"a": 1, "b": "word", "c": "two words", "d": [true, null], "e": "null"}),
            &mut out,
        );
        assert_eq!(out, r#"{a:1,b:word,c:"two words",d:[true,null],e:"null"}"#);
    }

    #[test]
    fn later_configuration_for_same_canon_wins() {
        let mut registry = RedactionRegistry::new();
        let options = EntityOptions::default()
            .with_hidden("z/b/n", HideSpec::Field("first".to_string()));
        registry.configure(&options).expect("valid canon");
        let options = EntityOptions::default()
            .with_hidden("$z/b/n", HideSpec::Field("second".to_string()));
        registry.configure(&options).expect("valid canon");

        let redaction = registry.lookup(&Canon::parse("z/b/n").expect("valid canon"));
        assert!(redaction.hides("second"));
        assert!(!redaction.hides("first"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn configure_rejects_invalid_canon_pattern() {
        let options =
            EntityOptions::default().with_hidden("///", HideSpec::Field("x".to_string()));
        assert!(RedactionRegistry::from_options(&options).is_err());
    }

    #[test]
    fn unknown_canon_uses_default_redaction() {
        let registry = RedactionRegistry::new();
        let redaction = registry.lookup(&Canon::named("anything"));
        assert_eq!(redaction.hidden_fields().collect::<Vec<_>>(), vec!["id"]);
    }
}
