use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use reqwest::{Client, Method, Request};
use tokio::time::Instant;
use tracing::debug;

use crate::domain::{HttpMethod, ResolvedRequest, TlsPolicy};
use crate::engine::{CancelSignal, RequestExecutor, RequestResult};
use crate::error::{AppError, AppResult, HttpError};

use super::client::build_client;
use super::execution::{Verdict, execute_with_expectations};

/// Executes requests with reqwest, keeping one pooled client per TLS policy.
#[derive(Debug, Default)]
pub struct HttpExecutor {
    clients: Mutex<HashMap<TlsPolicy, Client>>,
}

impl HttpExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the client for `tls` ahead of a run so certificate problems
    /// surface before any request is claimed.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be built.
    pub fn prepare(&self, tls: Option<&TlsPolicy>) -> AppResult<()> {
        self.client_for(tls).map(drop)
    }

    fn lock_clients(&self) -> MutexGuard<'_, HashMap<TlsPolicy, Client>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn client_for(&self, tls: Option<&TlsPolicy>) -> AppResult<Client> {
        let policy = tls.cloned().unwrap_or_default();
        if let Some(client) = self.lock_clients().get(&policy) {
            return Ok(client.clone());
        }
        let client = build_client(&policy)?;
        debug!(?policy, "Built HTTP client");
        Ok(self.lock_clients().entry(policy).or_insert(client).clone())
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(
        &self,
        request: &ResolvedRequest,
        tls: Option<&TlsPolicy>,
        mut cancel: CancelSignal,
    ) -> RequestResult {
        let started = Instant::now();
        let prepared = self
            .client_for(tls)
            .and_then(|client| build_request(&client, request).map(|built| (client, built)));
        let (client, built) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => return RequestResult::network_error(started.elapsed(), err.to_string()),
        };

        let verdict = tokio::select! {
            biased;
            () = cancel.cancelled() => Verdict::Network("cancelled".to_owned()),
            verdict = execute_with_expectations(&client, built, &request.expect) => verdict,
        };
        let latency = started.elapsed();
        match verdict {
            Verdict::Success => RequestResult::success(latency),
            Verdict::Validation(reason) => RequestResult::validation_error(latency, reason),
            Verdict::Network(reason) => RequestResult::network_error(latency, reason),
        }
    }
}

fn build_request(client: &Client, request: &ResolvedRequest) -> AppResult<Request> {
    let mut builder = client.request(to_reqwest_method(request.method), &request.url);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(body) = request.body.as_ref() {
        builder = builder.body(body.clone());
    }
    if let Some(timeout) = request.timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|err| {
        AppError::http(HttpError::BuildRequest {
            url: request.url.clone(),
            source: err,
        })
    })
}

const fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
    }
}
