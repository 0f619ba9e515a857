//! Dispatcher context shared by records.
//!
//! A context pairs the external dispatcher with the redaction registry that
//! was built from its configuration. Records hold a clone of it; the
//! dispatcher lifetime is managed by whoever built the context.

use crate::error::EntityResult;
use crate::model::canon::Canon;
use crate::model::record::Record;
use crate::render::RedactionRegistry;
use crate::service::dispatch::Dispatcher;
use log::info;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Handle to the dispatcher plus the read-only redaction registry.
#[derive(Clone)]
pub struct EntityContext {
    dispatcher: Arc<dyn Dispatcher>,
    redaction: Arc<RedactionRegistry>,
}

impl EntityContext {
    /// Builds a context, loading `entity.hide` from the dispatcher options.
    ///
    /// # Errors
    /// - `InvalidCanon` when a configured hide pattern is not a valid canon.
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> EntityResult<Self> {
        let options = dispatcher.entity_options();
        let registry = RedactionRegistry::from_options(&options)?;
        info!(
            "event=entity_context module=context status=ok hidden_canons={}",
            registry.len()
        );
        Ok(Self::with_registry(dispatcher, Arc::new(registry)))
    }

    /// Builds a context around an already configured registry.
    pub fn with_registry(
        dispatcher: Arc<dyn Dispatcher>,
        redaction: Arc<RedactionRegistry>,
    ) -> Self {
        Self {
            dispatcher,
            redaction,
        }
    }

    pub fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        &self.dispatcher
    }

    pub fn redaction(&self) -> &Arc<RedactionRegistry> {
        &self.redaction
    }

    /// Creates a root record bound to `canon` with an empty field bag.
    pub fn make_entity(&self, canon: Canon) -> Record {
        Record::bind(canon, self.clone())
    }
}

impl Debug for EntityContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityContext")
            .field("redaction", &self.redaction)
            .finish_non_exhaustive()
    }
}

/// Capability of carrying a dispatcher context.
///
/// Passed to `MakeArgs::on` to rebind a derived record to another dispatcher.
pub trait HasDispatcher {
    fn entity_context(&self) -> EntityContext;
}

impl HasDispatcher for EntityContext {
    fn entity_context(&self) -> EntityContext {
        self.clone()
    }
}
