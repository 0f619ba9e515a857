#![allow(dead_code)]

use async_trait::async_trait;
use entity_core::{
    Canon, DispatchReply, DispatchResult, Dispatcher, EntityCmd, EntityContext, EntityMessage,
    EntityOptions, Record,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// In-memory dispatcher that records every message it receives.
#[derive(Default)]
pub struct MemoryDispatcher {
    options: EntityOptions,
    fail_with: Option<String>,
    messages: Mutex<Vec<Value>>,
    rows: Mutex<Vec<Record>>,
}

impl MemoryDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EntityOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<Value> {
        self.messages.lock().unwrap().clone()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

fn matches_query(record: &Record, q: &Value) -> bool {
    let data = record.data();
    q.as_object()
        .map(|q| q.iter().all(|(key, value)| data.get(key) == Some(value)))
        .unwrap_or(false)
}

#[async_trait]
impl Dispatcher for MemoryDispatcher {
    async fn dispatch(&self, message: EntityMessage<'_>) -> DispatchResult {
        self.messages.lock().unwrap().push(message.to_json());
        if let Some(reason) = &self.fail_with {
            return Err(reason.clone().into());
        }

        let q = message.q.clone().unwrap_or(Value::Null);
        let mut rows = self.rows.lock().unwrap();
        match message.cmd {
            EntityCmd::Save => {
                let mut saved = message.ent.clone();
                if saved.id().is_none() {
                    let id = saved
                        .id_override()
                        .cloned()
                        .unwrap_or_else(|| json!(Uuid::new_v4().to_string()));
                    saved.set("id", id);
                }
                rows.retain(|row| row.canon() != saved.canon() || row.id() != saved.id());
                rows.push(saved.clone());
                Ok(DispatchReply::Entity(saved))
            }
            EntityCmd::Load => Ok(rows
                .iter()
                .find(|row| row.canon() == message.ent.canon() && matches_query(row, &q))
                .cloned()
                .map_or(DispatchReply::None, DispatchReply::Entity)),
            EntityCmd::List => Ok(DispatchReply::Entities(
                rows.iter()
                    .filter(|row| row.canon() == message.ent.canon() && matches_query(row, &q))
                    .cloned()
                    .collect(),
            )),
            EntityCmd::Remove => {
                let position = rows
                    .iter()
                    .position(|row| row.canon() == message.ent.canon() && matches_query(row, &q));
                Ok(position.map_or(DispatchReply::None, |index| {
                    DispatchReply::Entity(rows.remove(index))
                }))
            }
            EntityCmd::Native => Ok(DispatchReply::Native(Arc::new("memory-driver"))),
            EntityCmd::Close => Ok(DispatchReply::None),
        }
    }

    fn entity_options(&self) -> EntityOptions {
        self.options.clone()
    }
}

/// Context over `dispatcher` plus a root record at `canon`.
pub fn root(dispatcher: Arc<MemoryDispatcher>, canon: &str) -> Record {
    let context = EntityContext::new(dispatcher).expect("context should build");
    context.make_entity(Canon::parse(canon).expect("valid canon"))
}
