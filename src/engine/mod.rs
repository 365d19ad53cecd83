//! Load-test execution: ramp-up scheduling, the worker pool, and the
//! start/poll/stop lifecycle.
mod budget;
mod control;
mod executor;
mod ramp;
mod request;
mod worker;


pub use control::CancelSignal;
pub use executor::{DEFAULT_TICK_INTERVAL, Executor, ExecutorSettings, ExecutorState};
pub use ramp::target_workers;
pub use request::{RequestExecutor, RequestResult};
