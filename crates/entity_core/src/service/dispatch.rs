//! Dispatcher contract and CRUD message adapter.
//!
//! # Responsibility
//! - Define the external dispatcher contract and message schema.
//! - Translate `save`/`load`/`list`/`remove`/`native`/`close` intents on a
//!   record into messages and interpret the single reply.
//!
//! # Invariants
//! - Messages always carry `role = "entity"`; `zone`/`base`/`name` only when
//!   the record's canon defines them.
//! - `load` and `remove` without a resolvable query never reach the
//!   dispatcher and complete with `Ok(None)`.
//! - Dispatcher errors are returned unchanged.

use crate::config::EntityOptions;
use crate::error::EntityError;
use crate::model::field::{FieldBag, ID_FIELD};
use crate::model::record::Record;
use async_trait::async_trait;
use log::{debug, info};
use serde_json::{json, Map, Value};
use std::any::Any;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Message role for every entity command.
pub const ENTITY_ROLE: &str = "entity";

/// Error slot of a dispatcher completion, passed through untouched.
pub type DispatchError = Box<dyn Error + Send + Sync>;
pub type DispatchResult = Result<DispatchReply, DispatchError>;

/// Opaque driver handle returned by `native`.
pub type NativeHandle = Arc<dyn Any + Send + Sync>;

/// Entity command carried in `cmd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityCmd {
    Save,
    Load,
    List,
    Remove,
    Native,
    Close,
}

impl EntityCmd {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Save => "save",
            Self::Load => "load",
            Self::List => "list",
            Self::Remove => "remove",
            Self::Native => "native",
            Self::Close => "close",
        }
    }
}

impl Display for EntityCmd {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured message submitted to the dispatcher.
#[derive(Debug, Clone)]
pub struct EntityMessage<'a> {
    pub role: &'static str,
    pub cmd: EntityCmd,
    pub ent: &'a Record,
    pub zone: Option<&'a str>,
    pub base: Option<&'a str>,
    pub name: Option<&'a str>,
    /// Record providing query context; set for query-bearing commands.
    pub qent: Option<&'a Record>,
    pub q: Option<Value>,
}

impl<'a> EntityMessage<'a> {
    pub fn new(cmd: EntityCmd, ent: &'a Record) -> Self {
        let canon = ent.canon();
        Self {
            role: ENTITY_ROLE,
            cmd,
            ent,
            zone: canon.zone(),
            base: canon.base(),
            name: canon.name(),
            qent: None,
            q: None,
        }
    }

    /// Attaches a query, with the message's own record as query context.
    pub fn with_query(mut self, q: Value) -> Self {
        self.qent = Some(self.ent);
        self.q = Some(q);
        self
    }

    /// JSON form of the message; records are rendered with `data()`.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("role".to_string(), json!(self.role));
        out.insert("cmd".to_string(), json!(self.cmd.as_str()));
        out.insert("ent".to_string(), Value::Object(self.ent.data()));
        for (label, value) in [("zone", self.zone), ("base", self.base), ("name", self.name)] {
            if let Some(value) = value {
                out.insert(label.to_string(), json!(value));
            }
        }
        if let Some(qent) = self.qent {
            out.insert("qent".to_string(), Value::Object(qent.data()));
        }
        if let Some(q) = &self.q {
            out.insert("q".to_string(), q.clone());
        }
        Value::Object(out)
    }
}

/// Successful dispatcher completion.
pub enum DispatchReply {
    /// No result (e.g. nothing matched, or `close`).
    None,
    Entity(Record),
    Entities(Vec<Record>),
    Native(NativeHandle),
}

impl DispatchReply {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Entity(_) => "entity",
            Self::Entities(_) => "entities",
            Self::Native(_) => "native",
        }
    }
}

impl Debug for DispatchReply {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Entity(record) => f.debug_tuple("Entity").field(record).finish(),
            Self::Entities(records) => f.debug_tuple("Entities").field(records).finish(),
            Self::Native(_) => f.write_str("Native(..)"),
        }
    }
}

/// External message dispatcher. Completes each message exactly once.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, message: EntityMessage<'_>) -> DispatchResult;

    /// `entity` option block, read when an `EntityContext` is built.
    fn entity_options(&self) -> EntityOptions {
        EntityOptions::default()
    }
}

impl Record {
    /// Saves this record, merge-assigning `data` first.
    pub async fn save(&mut self, data: Option<&FieldBag>) -> Result<Option<Record>, DispatchError> {
        if let Some(data) = data {
            self.assign(data);
        }
        let reply = self.submit(EntityMessage::new(EntityCmd::Save, self)).await?;
        single(EntityCmd::Save, reply)
    }

    /// Loads one record. Without a query, reloads by this record's `id`.
    pub async fn load(&self, query: Option<Value>) -> Result<Option<Record>, DispatchError> {
        let Some(q) = resolve_id_query(query, self) else {
            self.skip(EntityCmd::Load);
            return Ok(None);
        };
        let message = EntityMessage::new(EntityCmd::Load, self).with_query(q);
        let reply = self.submit(message).await?;
        single(EntityCmd::Load, reply)
    }

    /// Lists matching records; no query matches all.
    pub async fn list(&self, query: Option<Value>) -> Result<Vec<Record>, DispatchError> {
        let q = match query {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(q) => q,
        };
        let message = EntityMessage::new(EntityCmd::List, self).with_query(q);
        match self.submit(message).await? {
            DispatchReply::Entities(records) => Ok(records),
            DispatchReply::None => Ok(Vec::new()),
            other => Err(unexpected(EntityCmd::List, &other)),
        }
    }

    /// Removes matching records. Without a resolvable query nothing is sent.
    pub async fn remove(&self, query: Option<Value>) -> Result<Option<Record>, DispatchError> {
        let Some(q) = resolve_id_query(query, self) else {
            self.skip(EntityCmd::Remove);
            return Ok(None);
        };
        let message = EntityMessage::new(EntityCmd::Remove, self).with_query(q);
        let reply = self.submit(message).await?;
        single(EntityCmd::Remove, reply)
    }

    /// Alias of [`Record::remove`].
    pub async fn delete(&self, query: Option<Value>) -> Result<Option<Record>, DispatchError> {
        self.remove(query).await
    }

    /// Requests the store's native driver handle.
    pub async fn native(&self) -> Result<NativeHandle, DispatchError> {
        match self
            .submit(EntityMessage::new(EntityCmd::Native, self))
            .await?
        {
            DispatchReply::Native(handle) => Ok(handle),
            other => Err(unexpected(EntityCmd::Native, &other)),
        }
    }

    /// Asks the dispatcher to release resources held for this entity type.
    pub async fn close(&self) -> Result<(), DispatchError> {
        info!(
            "event=entity_close module=dispatch status=start canon={}",
            self.canon
        );
        self.submit(EntityMessage::new(EntityCmd::Close, self))
            .await
            .map(|_| ())
    }

    async fn submit(&self, message: EntityMessage<'_>) -> DispatchResult {
        let cmd = message.cmd;
        debug!(
            "event=entity_dispatch module=dispatch status=start cmd={} canon={}",
            cmd, self.canon
        );
        let result = self.context.dispatcher().dispatch(message).await;
        match &result {
            Ok(reply) => debug!(
                "event=entity_dispatch module=dispatch status=ok cmd={} reply={}",
                cmd,
                reply.kind()
            ),
            Err(err) => debug!(
                "event=entity_dispatch module=dispatch status=error cmd={} error={}",
                cmd, err
            ),
        }
        result
    }

    fn skip(&self, cmd: EntityCmd) {
        debug!(
            "event=entity_skip module=dispatch status=ok cmd={} canon={} reason=no_query",
            cmd, self.canon
        );
    }
}

/// Resolves the query of `load`/`remove`.
///
/// - absent or null: `{id}` when the record has one, else nothing
/// - empty string: nothing
/// - string or number: `{id: q}`
/// - anything else: used as given
pub fn resolve_id_query(query: Option<Value>, ent: &Record) -> Option<Value> {
    match query {
        None | Some(Value::Null) => ent.id().map(|id| json!({ ID_FIELD: id })),
        Some(Value::String(text)) if text.is_empty() => None,
        Some(id @ (Value::String(_) | Value::Number(_))) => Some(json!({ ID_FIELD: id })),
        Some(q) => Some(q),
    }
}

fn single(cmd: EntityCmd, reply: DispatchReply) -> Result<Option<Record>, DispatchError> {
    match reply {
        DispatchReply::Entity(record) => Ok(Some(record)),
        DispatchReply::None => Ok(None),
        other => Err(unexpected(cmd, &other)),
    }
}

fn unexpected(cmd: EntityCmd, reply: &DispatchReply) -> DispatchError {
    Box::new(EntityError::UnexpectedReply {
        cmd,
        reply: reply.kind(),
    })
}
