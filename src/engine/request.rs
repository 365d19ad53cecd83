use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ResolvedRequest, TlsPolicy};
use crate::metrics::OutcomeKind;

use super::CancelSignal;

/// Classified result of one request execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestResult {
    pub kind: OutcomeKind,
    pub latency: Duration,
    pub error: Option<String>,
}

impl RequestResult {
    #[must_use]
    pub const fn success(latency: Duration) -> Self {
        Self {
            kind: OutcomeKind::Success,
            latency,
            error: None,
        }
    }

    #[must_use]
    pub fn network_error(latency: Duration, error: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::NetworkError,
            latency,
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub fn validation_error(latency: Duration, error: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::ValidationError,
            latency,
            error: Some(error.into()),
        }
    }
}

/// Performs a single request on behalf of a worker.
///
/// Implementations own the transport; the engine only classifies and counts
/// what comes back. A call should return promptly once `cancel` fires.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(
        &self,
        request: &ResolvedRequest,
        tls: Option<&TlsPolicy>,
        cancel: CancelSignal,
    ) -> RequestResult;
}
