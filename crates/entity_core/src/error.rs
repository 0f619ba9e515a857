//! Error taxonomy for canon parsing and entity dispatch.
//!
//! # Invariants
//! - `InvalidCanon` is the only error raised synchronously by this crate.
//! - Dispatcher errors never pass through this type; they are returned to
//!   callers unchanged as `DispatchError`.

use crate::service::dispatch::EntityCmd;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type EntityResult<T> = Result<T, EntityError>;

/// Errors produced by this crate itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityError {
    /// Input did not match `[$][segment/][segment/]segment`.
    InvalidCanon(String),
    /// Dispatcher answered a command with a reply of the wrong shape.
    UnexpectedReply {
        cmd: EntityCmd,
        reply: &'static str,
    },
}

impl Display for EntityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCanon(input) => write!(
                f,
                "invalid entity canon: `{input}`; expected format: zone/base/name"
            ),
            Self::UnexpectedReply { cmd, reply } => {
                write!(f, "dispatcher replied `{reply}` to entity command `{cmd}`")
            }
        }
    }
}

impl Error for EntityError {}

#[cfg(test)]
mod tests {
    use super::EntityError;
    use crate::service::dispatch::EntityCmd;

    #[test]
    fn invalid_canon_message_names_input_and_format() {
        let message = EntityError::InvalidCanon("//".to_string()).to_string();
        assert!(message.contains("`//`"));
        assert!(message.contains("zone/base/name"));
    }

    #[test]
    fn unexpected_reply_message_names_command() {
        let err = EntityError::UnexpectedReply {
            cmd: EntityCmd::Native,
            reply: "entities",
        };
        assert_eq!(
            err.to_string(),
            "dispatcher replied `entities` to entity command `native`"
        );
    }
}
