use std::collections::BTreeMap;

use reqwest::header::HeaderName;
use serde::Deserialize;
use url::Url;

use crate::domain::{Expectations, HttpMethod, ResolvedRequest};
use crate::error::{AppError, AppResult, ConfigError};

use super::render_template;
use super::types::DurationValue;

/// A request definition as written on disk, before variables are applied.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestFile {
    #[serde(default)]
    pub method: HttpMethod,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub timeout: Option<DurationValue>,
    #[serde(default)]
    pub expect: Expectations,
}

impl RequestFile {
    /// Substitutes `vars` into the URL, header values, and body.
    ///
    /// # Errors
    ///
    /// Returns a config error for an unresolved placeholder, an invalid URL
    /// or header name, or a malformed timeout.
    pub fn resolve(&self, vars: &BTreeMap<String, String>) -> AppResult<ResolvedRequest> {
        let url = render_template(&self.url, vars, "url")?;
        if let Err(err) = Url::parse(&url) {
            return Err(AppError::config(ConfigError::InvalidUrl { url, source: err }));
        }

        let mut headers = BTreeMap::new();
        for (name, value) in &self.headers {
            if HeaderName::from_bytes(name.as_bytes()).is_err() {
                return Err(AppError::config(ConfigError::InvalidHeaderName {
                    name: name.clone(),
                }));
            }
            headers.insert(name.clone(), render_template(value, vars, "header")?);
        }

        let body = self
            .body
            .as_deref()
            .map(|body| render_template(body, vars, "body"))
            .transpose()?;

        let timeout = match self.timeout.as_ref() {
            Some(value) => {
                let timeout = value.to_duration().map_err(|err| {
                    AppError::config(ConfigError::InvalidDuration {
                        field: "timeout",
                        message: err.to_string(),
                    })
                })?;
                (!timeout.is_zero()).then_some(timeout)
            }
            None => None,
        };

        Ok(ResolvedRequest {
            method: self.method,
            url,
            headers,
            body,
            timeout,
            expect: self.expect.clone(),
        })
    }
}
