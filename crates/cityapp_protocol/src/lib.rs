//! Wizard Message Protocol
//!
//! Shared data model for the CityApp wizard. A caller launches a module by
//! name, receives a [`Message`], and answers it by echoing the message id
//! together with a [`Reply`]. The owning module decides the next message.
//!
//! # Message Shape
//!
//! ```text
//! { "message_id": "<module>.<step>", "message": { "text": ..., "list": [...], ... } }
//! ```
//!
//! The id always resolves to exactly one [`ModuleKind`] and one step number.

pub mod message;
pub mod module;
pub mod table;

pub use message::{Message, MessageBody, MessageId, Reply};
pub use module::ModuleKind;
pub use table::{DescriptionTable, Row, TableDescription};

use thiserror::Error;

/// Errors raised while decoding protocol values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown module '{0}'")]
    UnknownModule(String),

    #[error("malformed message id '{0}': expected <module>.<step>")]
    MalformedMessageId(String),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
