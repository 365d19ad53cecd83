//! CLI argument types and parsing helpers.
mod cli;
pub(crate) mod parsers;

#[cfg(test)]
mod tests;

pub use cli::{
    Cli, Command, ConfigCommand, ConfigSaveArgs, OutputFormat, RunArgs, RunsCommand, TlsArgs,
};
