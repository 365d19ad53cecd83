use super::*;
use crate::domain::{Expectations, HttpMethod, ResolvedRequest, TlsPolicy};
use crate::engine::{CancelSignal, RequestExecutor};
use crate::error::{AppError, HttpError};
use crate::metrics::OutcomeKind;
use std::collections::BTreeMap;
use std::future::Future;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

struct TestServer {
    base_url: String,
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.shutdown.send(()).is_err() {
            // accept loop already gone
        }
        if let Some(handle) = self.thread.take()
            && handle.join().is_err()
        {
            // accept loop panicked
        }
    }
}

fn spawn_server() -> Result<TestServer, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;
    let (shutdown, shutdown_rx) = mpsc::channel();

    let thread = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }
            match listener.accept() {
                Ok((stream, _)) => {
                    thread::spawn(move || handle_client(stream));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(5));
                }
                Err(_) => break,
            }
        }
    });

    Ok(TestServer {
        base_url: format!("http://{}", addr),
        shutdown,
        thread: Some(thread),
    })
}

fn handle_client(mut stream: TcpStream) {
    if stream.set_nonblocking(false).is_err() {
        return;
    }
    let mut buffer = [0u8; 2048];
    let Ok(read) = stream.read(&mut buffer) else {
        return;
    };
    let head = String::from_utf8_lossy(buffer.get(..read).unwrap_or_default());
    let path = head.split_whitespace().nth(1).unwrap_or("/");

    let (status_line, body) = match path {
        "/ok" => ("200 OK", "hello volley world"),
        "/created" => ("201 Created", "created"),
        "/missing" => ("404 Not Found", "nope"),
        "/slow" => {
            thread::sleep(Duration::from_secs(2));
            ("200 OK", "late")
        }
        _ => ("500 Internal Server Error", "boom"),
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    );
    if stream.write_all(response.as_bytes()).is_err() || stream.flush().is_err() {
        return;
    }
    drop(stream.shutdown(Shutdown::Both));
}

fn request(url: String, expect: Expectations) -> ResolvedRequest {
    ResolvedRequest {
        method: HttpMethod::Get,
        url,
        headers: BTreeMap::from([("X-Test".to_owned(), "1".to_owned())]),
        body: None,
        timeout: Some(Duration::from_secs(5)),
        expect,
    }
}

async fn classify(executor: &HttpExecutor, request: &ResolvedRequest) -> (OutcomeKind, String) {
    let result = executor
        .execute(request, None, CancelSignal::never())
        .await;
    (result.kind, result.error.unwrap_or_default())
}

#[test]
fn successful_response_is_success() -> Result<(), String> {
    let server = spawn_server()?;
    run_async_test(async move {
        let executor = HttpExecutor::new();
        let target = request(format!("{}/ok", server.base_url), Expectations::default());
        let (kind, error) = classify(&executor, &target).await;
        if kind != OutcomeKind::Success {
            return Err(format!("Expected success, got {:?}: {}", kind, error));
        }
        Ok(())
    })
}

#[test]
fn status_mismatch_is_validation_error() -> Result<(), String> {
    let server = spawn_server()?;
    run_async_test(async move {
        let executor = HttpExecutor::new();
        let exact = request(
            format!("{}/ok", server.base_url),
            Expectations {
                status: Some(201),
                body_contains: None,
            },
        );
        let (kind, error) = classify(&executor, &exact).await;
        if kind != OutcomeKind::ValidationError || !error.contains("201") {
            return Err(format!("Expected status mismatch, got {:?}: {}", kind, error));
        }

        let created = request(
            format!("{}/created", server.base_url),
            Expectations {
                status: Some(201),
                body_contains: None,
            },
        );
        if classify(&executor, &created).await.0 != OutcomeKind::Success {
            return Err("Expected matching status to succeed".to_owned());
        }

        let missing = request(format!("{}/missing", server.base_url), Expectations::default());
        if classify(&executor, &missing).await.0 != OutcomeKind::ValidationError {
            return Err("404 without expectation should fail validation".to_owned());
        }
        Ok(())
    })
}

#[test]
fn body_substring_is_checked() -> Result<(), String> {
    let server = spawn_server()?;
    run_async_test(async move {
        let executor = HttpExecutor::new();
        let present = request(
            format!("{}/ok", server.base_url),
            Expectations {
                status: None,
                body_contains: Some("volley".to_owned()),
            },
        );
        if classify(&executor, &present).await.0 != OutcomeKind::Success {
            return Err("Expected body match".to_owned());
        }
        let absent = request(
            format!("{}/ok", server.base_url),
            Expectations {
                status: None,
                body_contains: Some("absent".to_owned()),
            },
        );
        let (kind, error) = classify(&executor, &absent).await;
        if kind != OutcomeKind::ValidationError || !error.contains("absent") {
            return Err(format!("Expected body mismatch, got {:?}: {}", kind, error));
        }
        Ok(())
    })
}

#[test]
fn refused_connection_is_network_error() -> Result<(), String> {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0")
            .map_err(|err| format!("bind failed: {}", err))?;
        listener
            .local_addr()
            .map_err(|err| format!("addr failed: {}", err))?
            .port()
    };
    run_async_test(async move {
        let executor = HttpExecutor::new();
        let target = request(
            format!("http://127.0.0.1:{}/ok", port),
            Expectations::default(),
        );
        let (kind, _) = classify(&executor, &target).await;
        if kind != OutcomeKind::NetworkError {
            return Err(format!("Expected network error, got {:?}", kind));
        }
        Ok(())
    })
}

#[test]
fn request_timeout_is_network_error() -> Result<(), String> {
    let server = spawn_server()?;
    run_async_test(async move {
        let executor = HttpExecutor::new();
        let mut slow = request(format!("{}/slow", server.base_url), Expectations::default());
        slow.timeout = Some(Duration::from_millis(100));
        let result = executor.execute(&slow, None, CancelSignal::never()).await;
        if result.kind != OutcomeKind::NetworkError {
            return Err(format!("Expected timeout as network error: {:?}", result));
        }
        if result.latency >= Duration::from_secs(2) {
            return Err(format!("Timeout not applied: {:?}", result.latency));
        }
        Ok(())
    })
}

#[test]
fn missing_cacert_is_reported() -> Result<(), String> {
    let executor = HttpExecutor::new();
    let policy = TlsPolicy {
        insecure: false,
        cacert: Some("/nonexistent/volley-ca.pem".into()),
        tls_min: None,
    };
    match executor.prepare(Some(&policy)) {
        Err(AppError::Http(HttpError::ReadCacert { .. })) => {}
        other => return Err(format!("Expected cacert read error, got {:?}", other)),
    }
    executor
        .prepare(None)
        .map_err(|err| format!("Default client should build: {}", err))
}
