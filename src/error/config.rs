use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to parse JSON config '{path}': {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unsupported config extension '{ext}'. Use .toml or .json.")]
    UnsupportedExtension { ext: String },
    #[error("Config file must have .toml or .json extension.")]
    MissingExtension,
    #[error("Failed to read request file '{path}': {source}")]
    ReadRequestFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse request file '{path}': {message}")]
    ParseRequestFile { path: PathBuf, message: String },
    #[error("Unresolved variable '{{{{{name}}}}}' in request {field}.")]
    UnresolvedVariable { name: String, field: &'static str },
    #[error("Unterminated placeholder in request {field}.")]
    UnterminatedPlaceholder { field: &'static str },
    #[error("Invalid request URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid header name '{name}'.")]
    InvalidHeaderName { name: String },
    #[error("Invalid duration in '{field}': {message}")]
    InvalidDuration { field: &'static str, message: String },
    #[error("Unknown profile '{name}'.")]
    UnknownProfile { name: String },
}
