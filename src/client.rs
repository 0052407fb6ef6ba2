use std::sync::Arc;

use serde_json::{json, Map, Value as Json};

use crate::codec::Parameter;
use crate::error::DriverError;
use crate::models::{ConnectionHandle, CursorHandle, DataSource};
use crate::transport::{Request, Transport};

/// Thin RPC façade over the IDE's database endpoints: one method per
/// remote operation, one round trip per call, no state beyond the
/// transport handle. Envelope translation is the caller's job.
#[derive(Clone)]
pub struct SessionClient {
    transport: Arc<dyn Transport>,
}

impl SessionClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn noisy(&self) -> bool {
        self.transport.noisy()
    }

    pub async fn list_data_sources(&self) -> Result<Json, DriverError> {
        self.transport
            .perform(Request::get("database/dataSources/"))
            .await
    }

    pub async fn describe_data_source(&self, ds: &DataSource) -> Result<Json, DriverError> {
        self.transport
            .perform(Request::get(format!("database/dataSources/{}/", ds.uuid)))
            .await
    }

    pub async fn create_data_source(&self, name: &str, url: &str) -> Result<Json, DriverError> {
        let request = Request::post("database/dataSources/")
            .with_body(json!({"name": name, "url": url}));
        self.transport.perform(request).await
    }

    pub async fn delete_data_source(&self, ds: &DataSource) -> Result<Json, DriverError> {
        self.transport
            .perform(Request::delete(format!("database/dataSources/{}/", ds.uuid)))
            .await
    }

    pub async fn list_connections(&self, ds: &DataSource) -> Result<Json, DriverError> {
        self.transport
            .perform(Request::get(format!(
                "database/dataSources/{}/connections/",
                ds.uuid
            )))
            .await
    }

    pub async fn open_connection(
        &self,
        ds: &DataSource,
        autocommit: bool,
    ) -> Result<Json, DriverError> {
        let request = Request::post(format!("database/dataSources/{}/connections/", ds.uuid))
            .with_body(json!({"autocommit": autocommit}));
        self.transport.perform(request).await
    }

    pub async fn close_connection(
        &self,
        ds: &DataSource,
        con: &ConnectionHandle,
    ) -> Result<Json, DriverError> {
        self.transport
            .perform(Request::delete(format!(
                "database/dataSources/{}/connections/{}/",
                ds.uuid, con.uuid
            )))
            .await
    }

    pub async fn commit(
        &self,
        ds: &DataSource,
        con: &ConnectionHandle,
    ) -> Result<Json, DriverError> {
        self.transport
            .perform(Request::post(format!(
                "database/dataSources/{}/connections/{}/commit",
                ds.uuid, con.uuid
            )))
            .await
    }

    pub async fn rollback(
        &self,
        ds: &DataSource,
        con: &ConnectionHandle,
    ) -> Result<Json, DriverError> {
        self.transport
            .perform(Request::post(format!(
                "database/dataSources/{}/connections/{}/rollback",
                ds.uuid, con.uuid
            )))
            .await
    }

    pub async fn create_cursor(
        &self,
        ds: &DataSource,
        con: &ConnectionHandle,
    ) -> Result<Json, DriverError> {
        self.transport
            .perform(Request::post(format!(
                "database/dataSources/{}/connections/{}/cursors/",
                ds.uuid, con.uuid
            )))
            .await
    }

    pub async fn close_cursor(
        &self,
        ds: &DataSource,
        con: &ConnectionHandle,
        cur: &CursorHandle,
    ) -> Result<Json, DriverError> {
        self.transport
            .perform(Request::delete(format!(
                "database/dataSources/{}/connections/{}/cursors/{}/",
                ds.uuid, con.uuid, cur.uuid
            )))
            .await
    }

    /// `operation` is omitted from the body when continuing a prepared
    /// batch; the peer then reuses the previous statement.
    pub async fn execute(
        &self,
        ds: &DataSource,
        con: &ConnectionHandle,
        cur: &CursorHandle,
        operation: Option<&str>,
        parameters: &[Parameter],
    ) -> Result<Json, DriverError> {
        let mut body = Map::new();
        if let Some(operation) = operation {
            body.insert("operation".to_string(), json!(operation));
        }
        body.insert("parameters".to_string(), serde_json::to_value(parameters)?);

        let request = Request::post(format!(
            "database/dataSources/{}/connections/{}/cursors/{}/execute",
            ds.uuid, con.uuid, cur.uuid
        ))
        .with_body(Json::Object(body));
        self.transport.perform(request).await
    }

    /// `limit = None` asks for all remaining rows.
    pub async fn fetch(
        &self,
        ds: &DataSource,
        con: &ConnectionHandle,
        cur: &CursorHandle,
        limit: Option<u64>,
    ) -> Result<Json, DriverError> {
        let mut path = format!(
            "database/dataSources/{}/connections/{}/cursors/{}/fetch",
            ds.uuid, con.uuid, cur.uuid
        );
        if let Some(limit) = limit {
            path.push_str(&format!("?limit={}", limit));
        }
        self.transport.perform(Request::get(path)).await
    }

    pub async fn describe_cursor(
        &self,
        ds: &DataSource,
        con: &ConnectionHandle,
        cur: &CursorHandle,
    ) -> Result<Json, DriverError> {
        self.transport
            .perform(Request::get(format!(
                "database/dataSources/{}/connections/{}/cursors/{}/describe",
                ds.uuid, con.uuid, cur.uuid
            )))
            .await
    }

    pub async fn next_set(
        &self,
        ds: &DataSource,
        con: &ConnectionHandle,
        cur: &CursorHandle,
    ) -> Result<Json, DriverError> {
        self.transport
            .perform(Request::post(format!(
                "database/dataSources/{}/connections/{}/cursors/{}/nextSet",
                ds.uuid, con.uuid, cur.uuid
            )))
            .await
    }
}
