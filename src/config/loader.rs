use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult, ConfigError};

use super::request_file::RequestFile;
use super::types::SettingsFile;

/// Loads the settings file from `path`, or from `volley.toml` / `volley.json`
/// in the working directory.
///
/// # Errors
///
/// Returns an error when the settings file cannot be read or parsed.
pub fn load_settings(path: Option<&Path>) -> AppResult<Option<SettingsFile>> {
    if let Some(path) = path {
        return Ok(Some(load_settings_file(path)?));
    }

    let toml_path = PathBuf::from("volley.toml");
    if toml_path.exists() {
        return Ok(Some(load_settings_file(&toml_path)?));
    }

    let json_path = PathBuf::from("volley.json");
    if json_path.exists() {
        return Ok(Some(load_settings_file(&json_path)?));
    }

    Ok(None)
}

/// # Errors
///
/// Returns an error when the file cannot be read, has an unsupported
/// extension, or does not parse.
pub fn load_settings_file(path: &Path) -> AppResult<SettingsFile> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseToml {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some("json") => serde_json::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some(ext) => Err(AppError::config(ConfigError::UnsupportedExtension {
            ext: ext.to_owned(),
        })),
        None => Err(AppError::config(ConfigError::MissingExtension)),
    }
}

/// Reads a request file; relative paths resolve against `base_dir`.
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed.
pub fn load_request_file(path: &Path, base_dir: Option<&Path>) -> AppResult<RequestFile> {
    let path = match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    };
    let content = std::fs::read_to_string(&path).map_err(|err| {
        AppError::config(ConfigError::ReadRequestFile {
            path: path.clone(),
            source: err,
        })
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => parse_request(&path, toml::from_str(&content)),
        Some("json") => parse_request(&path, serde_json::from_str(&content)),
        Some(ext) => Err(AppError::config(ConfigError::UnsupportedExtension {
            ext: ext.to_owned(),
        })),
        None => Err(AppError::config(ConfigError::MissingExtension)),
    }
}

fn parse_request<T, E>(path: &Path, parsed: Result<T, E>) -> AppResult<T>
where
    E: std::fmt::Display,
{
    parsed.map_err(|err| {
        AppError::config(ConfigError::ParseRequestFile {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    })
}
