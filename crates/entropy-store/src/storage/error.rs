//! Storage error types.

use thiserror::Error;

use crate::RoomId;

/// Errors that can occur during storage operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Room not found.
    ///
    /// Returned when writing or reading messages of a room that was never
    /// stored (or has been removed).
    #[error("room not found: {room_id:x}")]
    NotFound {
        /// Room ID that was not found
        room_id: RoomId,
    },

    /// Serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error (file system, database, etc.)
    #[error("I/O error: {0}")]
    Io(String),
}

impl StoreError {
    /// Returns true if this error may go away on a later attempt.
    ///
    /// Only I/O failures are transient; a missing room or a corrupt record
    /// stays that way until something writes over it.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_io_is_transient() {
        assert!(StoreError::Io("disk full".into()).is_transient());
        assert!(!StoreError::NotFound { room_id: 1 }.is_transient());
        assert!(!StoreError::Serialization("bad cbor".into()).is_transient());
    }
}
