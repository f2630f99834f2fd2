//! Error types for the tick layer.

/// Errors that can occur while arming a repeating task.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// `arm` was called from a thread with no Tokio runtime to spawn the
    /// timer task on.
    #[error("no Tokio runtime available to run the timer")]
    NoRuntime,
}
