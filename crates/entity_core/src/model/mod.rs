//! Entity data model: canon, field bag and record.
//!
//! # Responsibility
//! - Define the canonical address and the record shape used by services.
//! - Keep field classification in one place.
//!
//! # Invariants
//! - Every record is bound to exactly one canon and one dispatcher context.
//! - Keys ending in `$` are control metadata and never persisted.

pub mod canon;
pub mod context;
pub mod field;
pub mod record;
