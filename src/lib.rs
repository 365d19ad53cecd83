//! Core library for the `volley` CLI.
//!
//! The [`engine`] module is the embeddable part: an [`engine::Executor`] ramps
//! a worker pool up against a shared request budget, exposes live
//! [`metrics::Stats`] snapshots, and records a [`domain::Run`] through a
//! [`store::RunStore`] exactly once when the run ends. Requests go through
//! the [`engine::RequestExecutor`] trait; [`http::HttpExecutor`] is the
//! reqwest-backed implementation the CLI uses.
pub mod app;
pub mod args;
pub mod config;
pub mod domain;
pub mod engine;
pub mod entry;
pub mod error;
pub mod http;
pub mod metrics;
pub mod store;
pub mod system;
