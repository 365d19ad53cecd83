use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Executor was already started.")]
    AlreadyStarted,
    #[error("Executor must be started from within a Tokio runtime.")]
    NoRuntime,
    #[error(
        "Stop timed out after {}ms; {in_flight} in-flight request(s) were cancelled.",
        grace.as_millis()
    )]
    StopTimeout { grace: Duration, in_flight: usize },
}
