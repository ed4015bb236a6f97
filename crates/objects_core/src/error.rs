//! Object-layer error types.
//!
//! Only direct, typed access reports errors. Name-based operations absorb
//! resolution failures, log them, and return `None` / `false`.

use objects_store::{Entity, StoreError};

/// Errors raised by typed object and component access.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    /// The handle is null, or its entity no longer exists.
    #[error("{0} does not refer to a live object")]
    InvalidHandle(Entity),

    /// The object is alive but does not carry the requested value.
    #[error("'{component}' is not attached to {entity}")]
    MissingComponent {
        component: &'static str,
        entity: Entity,
    },

    /// No object or component type is registered under this name.
    #[error("type '{0}' is not registered")]
    UnknownType(String),

    /// The component is not in the allowed set of the object's type.
    #[error("component '{component}' is not allowed on object type '{object_type}'")]
    NotAllowed {
        component: String,
        object_type: String,
    },

    /// The type is registered but does not provide the operation.
    #[error("type '{name}' does not support '{op}'")]
    Unsupported { name: String, op: &'static str },

    /// Failed to encode a component to MessagePack.
    #[error("failed to encode component: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode a component from MessagePack.
    #[error("failed to decode component: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}
