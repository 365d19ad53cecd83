//! Settings files, request files, and variable substitution.
mod loader;
mod parse;
mod request_file;
mod template;
pub mod types;

#[cfg(test)]
mod tests;

pub use loader::{load_request_file, load_settings, load_settings_file};
pub use parse::{parse_duration_value, whole_seconds};
pub use request_file::RequestFile;
pub use template::render_template;
pub use types::{DurationValue, ProfileConfig, SettingsFile};
