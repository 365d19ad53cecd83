//! Process-level plumbing: logging and signal handling.
pub mod logger;
pub mod shutdown_handlers;
