use std::sync::Arc;

use uuid::Uuid;

use crate::client::SessionClient;
use crate::cursor::Cursor;
use crate::dialect::DbmsProfile;
use crate::error::{check_envelope, DriverError};
use crate::models::{ConnectionHandle, DataSource};

/// Coordinates identifying the data source to connect to. Exactly one of
/// `ds` / `dsn` / `dsid` must be supplied.
#[derive(Debug, Default, Clone)]
pub struct ConnectParams {
    /// An already-resolved data source.
    pub ds: Option<DataSource>,
    /// Resolve by data source name.
    pub dsn: Option<String>,
    /// Resolve by data source uuid.
    pub dsid: Option<Uuid>,
    /// With `dsn`: create the data source at this JDBC URL when missing,
    /// replacing an existing one whose URL differs.
    pub create_url: Option<String>,
}

impl ConnectParams {
    pub fn ds(ds: DataSource) -> Self {
        ConnectParams {
            ds: Some(ds),
            ..Default::default()
        }
    }

    pub fn dsn(name: impl Into<String>) -> Self {
        ConnectParams {
            dsn: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn dsid(id: Uuid) -> Self {
        ConnectParams {
            dsid: Some(id),
            ..Default::default()
        }
    }

    pub fn with_create_url(mut self, url: impl Into<String>) -> Self {
        self.create_url = Some(url.into());
        self
    }
}

/// An open connection to one remote data source.
///
/// Construction resolves the data source and opens the remote connection
/// in one step: the caller either gets a usable connection or an error.
/// The remote handle is released exactly once, by `close()` or, as a
/// fallback, when the connection is dropped.
pub struct Connection {
    client: SessionClient,
    ds: Arc<DataSource>,
    handle: Option<ConnectionHandle>,
    profile: &'static DbmsProfile,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("ds", &self.ds)
            .field("handle", &self.handle)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

/// Open a connection. Shorthand for `Connection::connect`.
pub async fn connect(client: SessionClient, params: ConnectParams) -> Result<Connection, DriverError> {
    Connection::connect(client, params).await
}

impl Connection {
    pub async fn connect(
        client: SessionClient,
        params: ConnectParams,
    ) -> Result<Connection, DriverError> {
        let ds = Self::resolve(&client, params).await?;
        let profile = DbmsProfile::resolve(&ds.dbms);

        let body = check_envelope(
            client.open_connection(&ds, false).await?,
            client.noisy(),
        )?;
        let handle: ConnectionHandle = serde_json::from_value(body)?;
        tracing::info!("opened connection {} to data source '{}'", handle.uuid, ds.name);

        Ok(Connection {
            client,
            ds: Arc::new(ds),
            handle: Some(handle),
            profile,
        })
    }

    async fn resolve(
        client: &SessionClient,
        params: ConnectParams,
    ) -> Result<DataSource, DriverError> {
        let coords = params.ds.is_some() as u8 + params.dsn.is_some() as u8 + params.dsid.is_some() as u8;
        if coords == 0 {
            return Err(DriverError::Interface(
                "no data source coordinates provided".to_string(),
            ));
        }
        if coords > 1 {
            return Err(DriverError::Interface(
                "conflicting data source coordinates provided".to_string(),
            ));
        }

        if let Some(ds) = params.ds {
            return Ok(ds);
        }

        if let Some(name) = params.dsn {
            let mut found = Self::find_by_name(client, &name).await?;
            if let Some(url) = params.create_url {
                // Replace a stale data source pointing at a different URL.
                while let Some(ds) = &found {
                    if ds.url == url {
                        break;
                    }
                    check_envelope(client.delete_data_source(ds).await?, client.noisy())?;
                    found = Self::find_by_name(client, &name).await?;
                }
                if found.is_none() {
                    let body =
                        check_envelope(client.create_data_source(&name, &url).await?, client.noisy())?;
                    found = Some(serde_json::from_value(body)?);
                }
            }
            return found
                .ok_or_else(|| DriverError::Interface("no data source found".to_string()));
        }

        // dsid is the only coordinate left.
        let id = params.dsid.ok_or_else(|| {
            DriverError::Interface("no data source coordinates provided".to_string())
        })?;
        Self::list(client)
            .await?
            .into_iter()
            .find(|ds| ds.uuid == id)
            .ok_or_else(|| DriverError::Interface("no data source found".to_string()))
    }

    async fn list(client: &SessionClient) -> Result<Vec<DataSource>, DriverError> {
        let body = check_envelope(client.list_data_sources().await?, client.noisy())?;
        Ok(serde_json::from_value(body)?)
    }

    async fn find_by_name(
        client: &SessionClient,
        name: &str,
    ) -> Result<Option<DataSource>, DriverError> {
        Ok(Self::list(client).await?.into_iter().find(|ds| ds.name == name))
    }

    /// The DBMS identifier the IDE reports for this data source.
    pub fn dbms(&self) -> &str {
        &self.ds.dbms
    }

    pub fn profile(&self) -> &'static DbmsProfile {
        self.profile
    }

    pub fn data_source(&self) -> &DataSource {
        &self.ds
    }

    fn handle(&self) -> Result<&ConnectionHandle, DriverError> {
        self.handle
            .as_ref()
            .ok_or(DriverError::Closed("connection closed"))
    }

    pub async fn commit(&self) -> Result<(), DriverError> {
        let con = self.handle()?;
        check_envelope(self.client.commit(&self.ds, con).await?, self.client.noisy())?;
        Ok(())
    }

    pub async fn rollback(&self) -> Result<(), DriverError> {
        let con = self.handle()?;
        check_envelope(
            self.client.rollback(&self.ds, con).await?,
            self.client.noisy(),
        )?;
        Ok(())
    }

    /// Create a new cursor against this connection. Cursors have their
    /// own remote handle and may outlive this object, but become
    /// unusable once the remote connection is closed.
    pub async fn cursor(&self) -> Result<Cursor, DriverError> {
        let con = self.handle()?;
        let body = check_envelope(
            self.client.create_cursor(&self.ds, con).await?,
            self.client.noisy(),
        )?;
        let cur = serde_json::from_value(body)?;
        Ok(Cursor::new(self.client.clone(), self.ds.clone(), *con, cur))
    }

    /// Release the remote connection. Calling close on an already-closed
    /// connection is an error; drop-based cleanup is silent.
    pub async fn close(&mut self) -> Result<(), DriverError> {
        let con = self
            .handle
            .take()
            .ok_or(DriverError::Closed("connection closed"))?;
        let body = self.client.close_connection(&self.ds, &con).await?;
        check_envelope(body, self.client.noisy())?;
        tracing::info!("closed connection {}", con.uuid);
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let Some(con) = self.handle.take() else {
            return;
        };
        // Best effort: release the remote handle without blocking drop.
        // Failures are logged, never propagated.
        let client = self.client.clone();
        let ds = self.ds.clone();
        if let Ok(rt) = tokio::runtime::Handle::try_current() {
            rt.spawn(async move {
                if let Err(e) = client.close_connection(&ds, &con).await {
                    tracing::warn!("failed to release remote connection {}: {}", con.uuid, e);
                }
            });
        } else {
            tracing::warn!("dropping connection {} outside a runtime; remote handle leaks", con.uuid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{expect, MockTransport};
    use crate::transport::Method;
    use serde_json::json;

    const DS_UUID: &str = "11111111-1111-1111-1111-111111111111";
    const CON_UUID: &str = "22222222-2222-2222-2222-222222222222";

    fn listing() -> serde_json::Value {
        json!([
            {"uuid": DS_UUID, "name": "identifier.sqlite", "dbms": "SQLITE",
             "url": "jdbc:sqlite:identifier.sqlite"},
        ])
    }

    fn client(script: Vec<crate::test_support::Expectation>) -> (SessionClient, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new(script));
        (SessionClient::new(transport.clone()), transport)
    }

    fn open_script() -> Vec<crate::test_support::Expectation> {
        vec![
            expect(Method::Get, "database/dataSources/", listing()),
            expect(
                Method::Post,
                format!("database/dataSources/{}/connections/", DS_UUID),
                json!({"uuid": CON_UUID}),
            ),
        ]
    }

    #[tokio::test]
    async fn test_connect_by_name() {
        let (client, transport) = client(open_script());
        let con = Connection::connect(client, ConnectParams::dsn("identifier.sqlite"))
            .await
            .unwrap();
        assert_eq!(con.dbms(), "SQLITE");
        assert_eq!(transport.remaining(), 0);
        std::mem::forget(con); // handle release is covered elsewhere
    }

    #[tokio::test]
    async fn test_connect_by_id() {
        let script = open_script();
        let (client, _) = client(script);
        let con = Connection::connect(client, ConnectParams::dsid(DS_UUID.parse().unwrap()))
            .await
            .unwrap();
        assert_eq!(con.data_source().name, "identifier.sqlite");
        std::mem::forget(con);
    }

    #[tokio::test]
    async fn test_unknown_name_is_interface_error() {
        let (client, _) = client(vec![expect(Method::Get, "database/dataSources/", listing())]);
        let err = Connection::connect(client, ConnectParams::dsn("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Interface(_)));
    }

    #[tokio::test]
    async fn test_no_coordinates_is_interface_error() {
        let (client, transport) = client(vec![]);
        let err = Connection::connect(client, ConnectParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Interface(_)));
        // Misuse is rejected before any remote call.
        assert_eq!(transport.performed(), 0);
    }

    #[tokio::test]
    async fn test_conflicting_coordinates_is_interface_error() {
        let (client, transport) = client(vec![]);
        let params = ConnectParams {
            dsn: Some("a".to_string()),
            dsid: Some(Uuid::nil()),
            ..Default::default()
        };
        let err = Connection::connect(client, params).await.unwrap_err();
        assert!(matches!(err, DriverError::Interface(_)));
        assert_eq!(transport.performed(), 0);
    }

    #[tokio::test]
    async fn test_create_url_recreates_stale_data_source() {
        let fresh = json!({"uuid": DS_UUID, "name": "pg", "dbms": "POSTGRES",
                           "url": "jdbc:postgresql://localhost/new"});
        let stale_listing = json!([
            {"uuid": DS_UUID, "name": "pg", "dbms": "POSTGRES",
             "url": "jdbc:postgresql://localhost/old"},
        ]);
        let (client, transport) = client(vec![
            expect(Method::Get, "database/dataSources/", stale_listing),
            expect(
                Method::Delete,
                format!("database/dataSources/{}/", DS_UUID),
                json!({}),
            ),
            expect(Method::Get, "database/dataSources/", json!([])),
            expect(Method::Post, "database/dataSources/", fresh),
            expect(
                Method::Post,
                format!("database/dataSources/{}/connections/", DS_UUID),
                json!({"uuid": CON_UUID}),
            ),
        ]);
        let params =
            ConnectParams::dsn("pg").with_create_url("jdbc:postgresql://localhost/new");
        let con = Connection::connect(client, params).await.unwrap();
        assert_eq!(con.data_source().url, "jdbc:postgresql://localhost/new");
        assert_eq!(transport.remaining(), 0);
        std::mem::forget(con);
    }

    #[tokio::test]
    async fn test_open_failure_propagates_envelope() {
        let (client, _) = client(vec![
            expect(Method::Get, "database/dataSources/", listing()),
            expect(
                Method::Post,
                format!("database/dataSources/{}/connections/", DS_UUID),
                json!({"error": "cannot attach", "kind": "O"}),
            ),
        ]);
        let err = Connection::connect(client, ConnectParams::dsn("identifier.sqlite"))
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Operational(_)));
    }

    #[tokio::test]
    async fn test_commit_and_rollback() {
        let mut script = open_script();
        script.push(expect(
            Method::Post,
            format!("database/dataSources/{}/connections/{}/commit", DS_UUID, CON_UUID),
            json!({}),
        ));
        script.push(expect(
            Method::Post,
            format!(
                "database/dataSources/{}/connections/{}/rollback",
                DS_UUID, CON_UUID
            ),
            json!({}),
        ));
        let (client, transport) = client(script);
        let con = Connection::connect(client, ConnectParams::dsn("identifier.sqlite"))
            .await
            .unwrap();
        con.commit().await.unwrap();
        con.rollback().await.unwrap();
        assert_eq!(transport.remaining(), 0);
        std::mem::forget(con);
    }

    #[tokio::test]
    async fn test_double_close_is_an_error_but_releases_once() {
        let mut script = open_script();
        script.push(expect(
            Method::Delete,
            format!("database/dataSources/{}/connections/{}/", DS_UUID, CON_UUID),
            json!({}),
        ));
        let (client, transport) = client(script);
        let mut con = Connection::connect(client, ConnectParams::dsn("identifier.sqlite"))
            .await
            .unwrap();
        con.close().await.unwrap();
        assert!(matches!(
            con.close().await,
            Err(DriverError::Closed("connection closed"))
        ));
        // Drop after close must not issue another DELETE.
        drop(con);
        tokio::task::yield_now().await;
        assert_eq!(transport.unexpected(), 0);
        assert_eq!(transport.performed(), 3);
    }

    #[tokio::test]
    async fn test_drop_releases_handle_once() {
        let mut script = open_script();
        script.push(expect(
            Method::Delete,
            format!("database/dataSources/{}/connections/{}/", DS_UUID, CON_UUID),
            json!({}),
        ));
        let (client, transport) = client(script);
        let con = Connection::connect(client, ConnectParams::dsn("identifier.sqlite"))
            .await
            .unwrap();
        drop(con);
        // The release runs on a spawned task; give it a chance to finish.
        for _ in 0..10 {
            if transport.remaining() == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(transport.remaining(), 0);
        assert_eq!(transport.unexpected(), 0);
    }

    #[tokio::test]
    async fn test_use_after_close_is_rejected_locally() {
        let mut script = open_script();
        script.push(expect(
            Method::Delete,
            format!("database/dataSources/{}/connections/{}/", DS_UUID, CON_UUID),
            json!({}),
        ));
        let (client, transport) = client(script);
        let mut con = Connection::connect(client, ConnectParams::dsn("identifier.sqlite"))
            .await
            .unwrap();
        con.close().await.unwrap();
        assert!(matches!(con.commit().await, Err(DriverError::Closed(_))));
        assert!(matches!(con.cursor().await, Err(DriverError::Closed(_))));
        assert_eq!(transport.performed(), 3);
        std::mem::forget(con);
    }
}
