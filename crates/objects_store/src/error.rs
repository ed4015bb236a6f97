//! Store-level error types.

use crate::entity::Entity;

/// Errors raised by the [`Store`](crate::Store).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// The entity was destroyed, or was never allocated by this store.
    #[error("entity {0} is not alive")]
    DeadEntity(Entity),

    /// The storage registered for a type holds a different type.
    #[error("storage registered for {0} holds a different type")]
    StorageMismatch(&'static str),
}
