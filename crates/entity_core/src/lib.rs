//! Canonical addressing and record model for dispatcher-backed entities.
//! This crate resolves canons and builds messages; storage lives behind the
//! external `Dispatcher`.

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod render;
pub mod service;

pub use config::{EntityOptions, HideSpec};
pub use error::{EntityError, EntityResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::canon::{AsCanon, Canon, CanonShape};
pub use model::context::{EntityContext, HasDispatcher};
pub use model::field::{bag_from_json, classify_key, FieldBag, FieldKey, FieldValue};
pub use model::record::Record;
pub use render::{Redaction, RedactionRegistry};
pub use service::dispatch::{
    DispatchError, DispatchReply, DispatchResult, Dispatcher, EntityCmd, EntityMessage,
    NativeHandle,
};
pub use service::make::MakeArgs;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
