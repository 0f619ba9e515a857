//! Canonical entity address (`zone/base/name`).
//!
//! # Responsibility
//! - Parse canon input from string, ordered-triple or mapping form.
//! - Render a canon in every supported shape.
//!
//! # Invariants
//! - Components are word tokens or absent; empty strings are never stored.
//! - String input is right-aligned: the last segment is always `name`, two
//!   segments are `base/name`, three are `zone/base/name`.
//! - Absent compares equal only to absent.

use crate::error::{EntityError, EntityResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Placeholder segment for an explicitly absent component.
pub const ABSENT_SEGMENT: &str = "-";
/// Optional leading sigil of a canon string.
pub const CANON_SIGIL: &str = "$";

// Searched, not anchored: the first `[$][seg/][seg/]seg` run in the input wins.
static CANON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$?(([A-Za-z0-9_]+|-)/)?(([A-Za-z0-9_]+|-)/)?([A-Za-z0-9_]+|-)")
        .expect("valid canon regex")
});

/// Output shape for [`Canon::format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanonShape {
    /// `zone/base/name`, absent components rendered as `-`.
    String,
    /// `$zone/base/name`.
    SigilString,
    /// `[zone, base, name]`, absent components rendered as `null`.
    Triple,
    /// `{zone, base, name}`, absent components omitted.
    #[default]
    Object,
    /// `{zone$, base$, name$}`, absent components omitted.
    ControlObject,
}

/// Three-part hierarchical entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Canon {
    pub(crate) zone: Option<String>,
    pub(crate) base: Option<String>,
    pub(crate) name: Option<String>,
}

impl Canon {
    /// Builds a canon from explicit components. Empty strings and `-` become
    /// absent.
    pub fn new(zone: Option<&str>, base: Option<&str>, name: Option<&str>) -> Self {
        Self {
            zone: component(zone),
            base: component(base),
            name: component(name),
        }
    }

    /// Canon with only `name` set.
    pub fn named(name: &str) -> Self {
        Self::new(None, None, Some(name))
    }

    /// Parses the canon string grammar.
    ///
    /// # Errors
    /// - `InvalidCanon` when no segment can be found in `input`.
    pub fn parse(input: &str) -> EntityResult<Self> {
        let caps = CANON_RE
            .captures(input)
            .ok_or_else(|| EntityError::InvalidCanon(input.to_string()))?;

        let first = caps.get(2).map(|m| m.as_str());
        let second = caps.get(4).map(|m| m.as_str());
        let (zone, base) = match second {
            Some(base) => (first, Some(base)),
            None => (None, first),
        };

        Ok(Self {
            zone: segment(zone),
            base: segment(base),
            name: segment(caps.get(5).map(|m| m.as_str())),
        })
    }

    /// Positional `[zone, base, name]`, no inference.
    pub fn from_triple(triple: &[Value]) -> Self {
        let at = |index: usize| triple.get(index).and_then(Value::as_str);
        Self::new(at(0), at(1), at(2))
    }

    /// Takes `zone`, `base` and `name` keys verbatim.
    pub fn from_mapping(mapping: &Map<String, Value>) -> Self {
        let at = |key: &str| mapping.get(key).and_then(Value::as_str);
        Self::new(at("zone"), at("base"), at("name"))
    }

    /// Dispatches on JSON shape: string, array, object. Other values yield an
    /// all-absent canon.
    pub fn from_value(value: &Value) -> EntityResult<Self> {
        match value {
            Value::String(text) => Self::parse(text),
            Value::Array(items) => Ok(Self::from_triple(items)),
            Value::Object(mapping) => Ok(Self::from_mapping(mapping)),
            _ => Ok(Self::default()),
        }
    }

    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Structural comparison; same as `==`.
    pub fn isa(&self, other: &Canon) -> bool {
        self == other
    }

    /// Renders this canon in the requested shape.
    pub fn format(&self, shape: CanonShape) -> Value {
        match shape {
            CanonShape::String => Value::String(self.to_string()),
            CanonShape::SigilString => Value::String(format!("{CANON_SIGIL}{self}")),
            CanonShape::Triple => Value::Array(
                self.components()
                    .into_iter()
                    .map(|(_, value)| value.map_or(Value::Null, |v| Value::String(v.to_string())))
                    .collect(),
            ),
            CanonShape::Object => self.mapping(""),
            CanonShape::ControlObject => self.mapping("$"),
        }
    }

    fn mapping(&self, suffix: &str) -> Value {
        let mut out = Map::new();
        for (label, value) in self.components() {
            if let Some(value) = value {
                out.insert(format!("{label}{suffix}"), Value::String(value.to_string()));
            }
        }
        Value::Object(out)
    }

    fn components(&self) -> [(&'static str, Option<&str>); 3] {
        [
            ("zone", self.zone()),
            ("base", self.base()),
            ("name", self.name()),
        ]
    }
}

impl Display for Canon {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.zone().unwrap_or(ABSENT_SEGMENT),
            self.base().unwrap_or(ABSENT_SEGMENT),
            self.name().unwrap_or(ABSENT_SEGMENT)
        )
    }
}

impl FromStr for Canon {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Anything a canon can be read from for comparison.
pub trait AsCanon {
    fn as_canon(&self) -> EntityResult<Canon>;
}

impl AsCanon for Canon {
    fn as_canon(&self) -> EntityResult<Canon> {
        Ok(self.clone())
    }
}

impl AsCanon for str {
    fn as_canon(&self) -> EntityResult<Canon> {
        Canon::parse(self)
    }
}

impl AsCanon for String {
    fn as_canon(&self) -> EntityResult<Canon> {
        Canon::parse(self)
    }
}

impl AsCanon for Value {
    fn as_canon(&self) -> EntityResult<Canon> {
        Canon::from_value(self)
    }
}

impl<T: AsCanon + ?Sized> AsCanon for &T {
    fn as_canon(&self) -> EntityResult<Canon> {
        (**self).as_canon()
    }
}

fn component(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.is_empty() && *v != ABSENT_SEGMENT)
        .map(str::to_string)
}

fn segment(value: Option<&str>) -> Option<String> {
    value.filter(|v| *v != ABSENT_SEGMENT).map(str::to_string)
}
