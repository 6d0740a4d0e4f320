use thiserror::Error;

/// Errors surfaced by lifecycle operations.
///
/// Most lifecycle calls are infallible (exit requests, event publication).
/// The fallible ones are the idempotency guards around one-shot setup
/// operations and thread spawning.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// `initialize` was called on a controller that is already initialized.
    #[error("lifecycle controller is already initialized")]
    AlreadyInitialized,

    /// `start` was called on a worker loop whose thread is still alive.
    #[error("worker loop is already active")]
    WorkerActive,

    /// The OS refused to spawn the worker thread.
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(String),
}

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;
