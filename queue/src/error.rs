//! The main error enum for the project lives here, and documents the various
//! conditions that can arise while interacting with the system.

use crate::{
    item::ItemID,
};
use thiserror::Error;

/// This is our error enum. It contains an entry for any part of the system in
/// which an expectation is not met or a problem occurs.
#[derive(Error, Debug)]
pub enum Error {
    /// The queue's cancellation token has fired. This is terminal for the queue: every
    /// enqueue/dequeue from here on out will return it.
    #[error("Queue has been canceled")]
    Canceled,

    /// That item wasn't found in storage
    #[error("Item not found: {0}")]
    ItemNotFound(ItemID),

    /// A thread panicked while holding one of the queue's locks
    #[error("Error locking the queue: {0}")]
    LockPoisoned(String),

    /// Error serializing an object
    #[error("Error serializing")]
    Serde(#[from] bincode::Error),

    /// Error in storage layer
    #[error("Error in storage layer {0}")]
    StoreError(#[from] sled::Error),

    /// Error generating an id
    #[error("Error generating unique ID: {0}")]
    StoreIDError(String),

    /// Error storing item data. Meant for storage implementations that live outside this crate.
    #[error("Error handling item storage: {0}")]
    StoreItemError(String),
}

impl Error {
    /// Whether this error came out of the storage collaborator. These are recoverable: retry
    /// the enqueue or the dequeue/commit cycle.
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            Self::ItemNotFound(_) |
            Self::Serde(_) |
            Self::StoreError(_) |
            Self::StoreIDError(_) |
            Self::StoreItemError(_)
        )
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockPoisoned(err.to_string())
    }
}

/// Wraps `std::result::Result` around our `Error` enum
pub type Result<T> = std::result::Result<T, Error>;
