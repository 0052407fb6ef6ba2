use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value as Json;

use crate::error::DriverError;
use crate::transport::{Method, Request, Transport};

/// Install a subscriber so noisy-mode diagnostics show up in test output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// One scripted round trip: the request the driver is expected to make
/// and the JSON the fake peer replies with.
pub struct Expectation {
    pub method: Method,
    pub path: String,
    pub body: Option<Json>,
    pub response: Json,
}

impl Expectation {
    /// Also assert the request body (exact JSON equality).
    pub fn with_body(mut self, body: Json) -> Self {
        self.body = Some(body);
        self
    }
}

pub fn expect(method: Method, path: impl Into<String>, response: Json) -> Expectation {
    Expectation {
        method,
        path: path.into(),
        body: None,
        response,
    }
}

/// Transport fake replaying a fixed script of request/response pairs.
/// Requests must arrive in script order; anything past the end of the
/// script fails the call and is counted.
pub struct MockTransport {
    script: Mutex<VecDeque<Expectation>>,
    performed: AtomicUsize,
    unexpected: AtomicUsize,
    noisy: bool,
}

impl MockTransport {
    pub fn new(script: Vec<Expectation>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            performed: AtomicUsize::new(0),
            unexpected: AtomicUsize::new(0),
            noisy: false,
        }
    }

    pub fn noisy(mut self) -> Self {
        self.noisy = true;
        self
    }

    /// Expectations not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }

    /// Requests served so far.
    pub fn performed(&self) -> usize {
        self.performed.load(Ordering::SeqCst)
    }

    /// Requests that arrived after the script ran out.
    pub fn unexpected(&self) -> usize {
        self.unexpected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn perform(&self, request: Request) -> Result<Json, DriverError> {
        let next = self.script.lock().unwrap().pop_front();
        let Some(expected) = next else {
            self.unexpected.fetch_add(1, Ordering::SeqCst);
            return Err(DriverError::Transport(format!(
                "unexpected request: {:?} {}",
                request.method, request.path
            )));
        };
        assert_eq!(expected.method, request.method, "method for {}", request.path);
        assert_eq!(expected.path, request.path);
        if let Some(body) = &expected.body {
            assert_eq!(Some(body), request.body.as_ref(), "body for {}", request.path);
        }
        self.performed.fetch_add(1, Ordering::SeqCst);
        Ok(expected.response)
    }

    fn noisy(&self) -> bool {
        self.noisy
    }
}
