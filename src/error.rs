use serde_json::Value;
use thiserror::Error;

/// Driver error taxonomy, following the DB-API exception hierarchy.
///
/// `Interface` covers misuse of this layer's own API (bad arguments,
/// missing coordinates, resources that could not be resolved). The
/// remaining database kinds are raised from remote error envelopes;
/// envelopes without a more specific marker map to `Database`.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Warning: {0}")]
    Warning(String),

    #[error("Interface error: {0}")]
    Interface(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Operational error: {0}")]
    Operational(String),

    #[error("Programming error: {0}")]
    Programming(String),

    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// The remote peer replied with something this driver cannot make
    /// sense of (row/description mismatch, missing fields, wrong shape).
    #[error("Protocol violation: {0}")]
    Protocol(String),

    #[error("Transport error: {0}")]
    Transport(String),

    /// Explicit use of a connection or cursor after close().
    #[error("{0}")]
    Closed(&'static str),
}

impl From<reqwest::Error> for DriverError {
    fn from(err: reqwest::Error) -> Self {
        DriverError::Transport(err.to_string())
    }
}

impl From<url::ParseError> for DriverError {
    fn from(err: url::ParseError) -> Self {
        DriverError::Transport(format!("invalid URL: {}", err))
    }
}

impl From<serde_json::Error> for DriverError {
    fn from(err: serde_json::Error) -> Self {
        DriverError::Protocol(format!("malformed response: {}", err))
    }
}

impl From<config::ConfigError> for DriverError {
    fn from(err: config::ConfigError) -> Self {
        DriverError::Interface(format!("configuration: {}", err))
    }
}

/// Inspect a response body for the error envelope and translate it.
///
/// A failure is any JSON object carrying an `error` field. `kind == "O"`
/// marks an operational error; everything else is a generic database
/// error. The optional `trace` field holds a server-side stack trace and
/// is logged only when the transport runs in noisy mode.
pub fn check_envelope(body: Value, noisy: bool) -> Result<Value, DriverError> {
    let message = match body.get("error").and_then(Value::as_str) {
        Some(msg) => msg.to_string(),
        None => return Ok(body),
    };
    if noisy {
        if let Some(trace) = body.get("trace").and_then(Value::as_str) {
            tracing::error!("remote stack trace:\n{}", trace);
        }
    }
    match body.get("kind").and_then(Value::as_str) {
        Some("O") => Err(DriverError::Operational(message)),
        _ => Err(DriverError::Database(message)),
    }
}
