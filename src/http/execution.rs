use futures_util::StreamExt;
use reqwest::{Client, Request};

use crate::domain::Expectations;

/// How one response measured up against its expectations.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Verdict {
    Success,
    Validation(String),
    Network(String),
}

pub(super) async fn execute_with_expectations(
    client: &Client,
    request: Request,
    expect: &Expectations,
) -> Verdict {
    let response = match client.execute(request).await {
        Ok(response) => response,
        Err(err) if err.is_timeout() => return Verdict::Network(format!("timed out: {}", err)),
        Err(err) => return Verdict::Network(err.to_string()),
    };
    let status = response.status().as_u16();

    let body_found = match expect.body_contains.as_deref() {
        Some(fragment) => drain_body_contains(response, fragment).await,
        None => drain_response_body(response).await.map(|_| true),
    };
    let body_found = match body_found {
        Ok(found) => found,
        Err(err) => return Verdict::Network(format!("failed to read response body: {}", err)),
    };

    if !expect.status_matches(status) {
        return Verdict::Validation(match expect.status {
            Some(expected) => format!("expected status {}, got {}", expected, status),
            None => format!("unexpected status {}", status),
        });
    }
    if !body_found {
        return Verdict::Validation(format!(
            "response body does not contain '{}'",
            expect.body_contains.as_deref().unwrap_or_default()
        ));
    }
    Verdict::Success
}

async fn drain_response_body(response: reqwest::Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}

/// Streams the body, keeping only the last `needle.len() - 1` bytes between
/// chunks so a match split across chunk boundaries is still found.
async fn drain_body_contains(
    response: reqwest::Response,
    fragment: &str,
) -> Result<bool, reqwest::Error> {
    let needle = fragment.as_bytes();
    if needle.is_empty() {
        drain_response_body(response).await?;
        return Ok(true);
    }
    let keep = needle.len().saturating_sub(1);
    let mut found = false;
    let mut carry: Vec<u8> = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        if found {
            continue;
        }
        let mut window = std::mem::take(&mut carry);
        window.extend_from_slice(&bytes);
        found = window.windows(needle.len()).any(|slice| slice == needle);
        let start = window.len().saturating_sub(keep);
        carry = window.get(start..).map(<[u8]>::to_vec).unwrap_or_default();
    }
    Ok(found)
}
