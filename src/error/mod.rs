mod app;
mod config;
mod execution;
mod http;
mod store;
mod validation;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use execution::ExecutionError;
pub use http::HttpError;
pub use store::StoreError;
pub use validation::ValidationError;
