use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Config name must not be empty.")]
    EmptyConfigName,
    #[error("Config '{name}' must reference a request file.")]
    EmptyRequestFile { name: String },
    #[error("Concurrency must be between {min} and {max}, got {value}.")]
    ConcurrencyOutOfRange { value: usize, min: usize, max: usize },
    #[error("Total requests must be > 0.")]
    TotalRequestsZero,
    #[error("Profile name must not be empty.")]
    EmptyProfile,
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Invalid variable '{value}'. Expected 'key=value'.")]
    InvalidVariable { value: String },
    #[error("Invalid TLS version '{value}'. Use 1.0, 1.1, 1.2, or 1.3.")]
    InvalidTlsVersion { value: String },
    #[error("Invalid run id '{value}': {source}")]
    InvalidRunId {
        value: String,
        #[source]
        source: uuid::Error,
    },
    #[error("Missing request file (pass a saved config name or --request-file).")]
    MissingRequestFile,
    #[error("Unknown config '{name}'.")]
    UnknownConfig { name: String },
    #[error("Unknown run '{id}'.")]
    UnknownRun { id: String },
}
