//! Error types for observable collections.
//!
//! Both variants indicate a programmer error in a consumer (a stale index or a
//! mutation that breaks identity uniqueness). They are returned rather than
//! swallowed so the caller fails fast at the point of misuse.

use thiserror::Error;

/// Errors produced by collection access, mutation and change replay.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// Index outside `[0, count)`.
    ///
    /// Usually means a consumer cached an index across a change boundary.
    #[error("index {index} out of range for collection of {count} items")]
    OutOfRange {
        /// Index that was requested
        index: usize,
        /// Number of items at the time of the request
        count: usize,
    },

    /// A mutation would leave two items with the same identity.
    #[error("duplicate item identity: {0}")]
    DuplicateIdentity(String),
}

impl CollectionError {
    /// Returns true if this error was caused by a stale or invalid index.
    pub fn is_stale_index(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }
}
