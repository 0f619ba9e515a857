//! Entity use-case services.
//!
//! - `make`: variadic record construction with canon inheritance.
//! - `projection`: field listing, merge-assign and plain projections.
//! - `dispatch`: CRUD intents translated into dispatcher messages.

pub mod dispatch;
pub mod make;
pub mod projection;
