//! Load-test definitions, resolved requests, and run records.
mod config;
mod request;
mod run;


pub use config::{LoadTestConfig, MAX_CONCURRENCY, MIN_CONCURRENCY};
pub use request::{ExecutionConfig, Expectations, HttpMethod, ResolvedRequest, TlsPolicy, TlsVersion};
pub use run::{Run, RunId, RunStatus};
