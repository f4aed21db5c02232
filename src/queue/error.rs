//! Dispatch queue error types.

use thiserror::Error;

/// Errors that can occur when operating a dispatch queue
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueueError {
    /// The queue was already shut down
    #[error("queue '{queue}' is already dead")]
    Dead { queue: String },

    /// The worker thread could not be started
    #[error("failed to start worker for queue '{queue}': {message}")]
    Spawn { queue: String, message: String },
}
