//! DB-API style driver that delegates SQL execution to a running
//! JetBrains IDE over HTTP+JSON. The IDE resolves data sources, holds
//! the real JDBC connections and cursors, and streams typed results
//! back through a compact textual wire format; this crate emulates the
//! familiar connection/cursor/execute/fetch contract on top of it.

pub mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod cursor;
pub mod dialect;
pub mod error;
pub mod models;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::SessionClient;
pub use config::Config;
pub use connection::{connect, ConnectParams, Connection};
pub use cursor::Cursor;
pub use dialect::{DbmsProfile, Grammar, ParamStyle};
pub use error::DriverError;
pub use models::{ColumnDescriptor, DataSource, Row};
pub use transport::{HttpTransport, Request, Transport};
pub use types::{Value, WireType};

/// DB-API contract level this driver emulates.
pub const API_LEVEL: &str = "2.0";
/// Connections and cursors must not be shared between threads.
pub const THREAD_SAFETY: u8 = 0;
/// Statements use positional `?` placeholders.
pub const PARAM_STYLE: &str = "qmark";
