use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named database target exposed by the IDE. Resolved once, then only
/// referenced by the connection that uses it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    pub uuid: Uuid,
    pub name: String,
    #[serde(default)]
    pub dbms: String,
    #[serde(default)]
    pub url: String,
}

/// Opaque token for server-side connection state. Owned by exactly one
/// `Connection` and invalidated when that connection closes.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ConnectionHandle {
    pub uuid: Uuid,
}

/// Opaque token for server-side cursor state. Owned by exactly one
/// `Cursor`, created against exactly one remote connection.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CursorHandle {
    pub uuid: Uuid,
}
