//! reqwest-backed request executor.
mod client;
mod execution;
mod executor;

#[cfg(test)]
mod tests;

pub use client::build_client;
pub use executor::HttpExecutor;
