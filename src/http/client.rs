use reqwest::Client;

use crate::domain::{TlsPolicy, TlsVersion};
use crate::error::{AppError, AppResult, HttpError};

/// Builds a client honouring one TLS policy.
///
/// # Errors
///
/// Returns an error when the CA certificate cannot be read or parsed, or the
/// TLS backend rejects the settings.
pub fn build_client(policy: &TlsPolicy) -> AppResult<Client> {
    let mut builder = Client::builder().user_agent(concat!("volley/", env!("CARGO_PKG_VERSION")));

    if let Some(min) = policy.tls_min {
        builder = builder.min_tls_version(to_reqwest_tls_version(min));
    }

    if let Some(path) = policy.cacert.as_ref() {
        let bytes = std::fs::read(path).map_err(|err| {
            AppError::http(HttpError::ReadCacert {
                path: path.clone(),
                source: err,
            })
        })?;
        let cert = reqwest::Certificate::from_pem(&bytes).map_err(|err| {
            AppError::http(HttpError::InvalidCacert {
                path: path.clone(),
                source: err,
            })
        })?;
        builder = builder.add_root_certificate(cert);
    }

    if policy.insecure {
        builder = builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    }

    builder
        .build()
        .map_err(|err| AppError::http(HttpError::BuildClientFailed { source: err }))
}

const fn to_reqwest_tls_version(version: TlsVersion) -> reqwest::tls::Version {
    match version {
        TlsVersion::V1_0 => reqwest::tls::Version::TLS_1_0,
        TlsVersion::V1_1 => reqwest::tls::Version::TLS_1_1,
        TlsVersion::V1_2 => reqwest::tls::Version::TLS_1_2,
        TlsVersion::V1_3 => reqwest::tls::Version::TLS_1_3,
    }
}
