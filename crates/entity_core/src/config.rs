//! `entity` option block.
//!
//! # Responsibility
//! - Deserialize the `entity` configuration exposed by the dispatcher.
//!
//! # Invariants
//! - Loading configuration is the caller's concern; this module only parses
//!   JSON that has already been read.
//! - `hide` keeps declaration order, so later entries for the same canon win.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Options of the `entity` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityOptions {
    /// Canon pattern (`zone/base/name`) to hidden field names.
    #[serde(default)]
    pub hide: IndexMap<String, HideSpec>,
}

/// Hidden field declaration for one canon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HideSpec {
    Field(String),
    Fields(Vec<String>),
    /// Keys are field names; values are ignored.
    Mapping(Map<String, Value>),
}

impl HideSpec {
    pub fn field_names(&self) -> Vec<String> {
        match self {
            Self::Field(name) => vec![name.clone()],
            Self::Fields(names) => names.clone(),
            Self::Mapping(entries) => entries.keys().cloned().collect(),
        }
    }
}

impl EntityOptions {
    /// Parses an `entity` block, e.g. `{"hide": {"sys/user": ["pass"]}}`.
    pub fn from_json_str(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// Reads the `entity` block out of a full options document. A missing
    /// block yields defaults.
    pub fn from_root(root: &Value) -> Result<Self, serde_json::Error> {
        match root.get("entity") {
            Some(block) => Self::deserialize(block),
            None => Ok(Self::default()),
        }
    }

    /// Adds one hide declaration, replacing an earlier one for `canon`.
    pub fn with_hidden(mut self, canon: impl Into<String>, spec: HideSpec) -> Self {
        self.hide.insert(canon.into(), spec);
        self
    }
}
