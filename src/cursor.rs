use std::sync::Arc;

use futures::Stream;

use crate::client::SessionClient;
use crate::codec::{decode_rows, encode_params};
use crate::error::{check_envelope, DriverError};
use crate::models::{ColumnDescriptor, ConnectionHandle, CursorHandle, DataSource, Row, WireColumn};
use crate::types::Value;

/// A statement-execution cursor over one remote connection.
///
/// Lifecycle: execute, then fetch until exhausted, then either execute
/// again or advance to the next result set. The column description is
/// fetched lazily and invalidated by every execute/executemany/nextset.
/// The remote handle is released exactly once, by `close()` or, as a
/// fallback, when the cursor is dropped.
pub struct Cursor {
    client: SessionClient,
    ds: Arc<DataSource>,
    con: ConnectionHandle,
    handle: Option<CursorHandle>,
    last_rowcount: i64,
    desc: Option<Vec<ColumnDescriptor>>,
    statement_active: bool,
    /// Default row count for `fetchmany` when no size is given.
    pub arraysize: usize,
}

impl Cursor {
    pub(crate) fn new(
        client: SessionClient,
        ds: Arc<DataSource>,
        con: ConnectionHandle,
        handle: CursorHandle,
    ) -> Self {
        Cursor {
            client,
            ds,
            con,
            handle: Some(handle),
            last_rowcount: -1,
            desc: None,
            statement_active: false,
            arraysize: 1,
        }
    }

    /// Rows affected by the most recent execute; -1 before the first one.
    pub fn rowcount(&self) -> i64 {
        self.last_rowcount
    }

    fn handle(&self) -> Result<&CursorHandle, DriverError> {
        self.handle
            .as_ref()
            .ok_or(DriverError::Closed("cursor closed"))
    }

    /// Run one statement. The literal operation `"commit"` is a
    /// compatibility shim: it commits on the owning connection instead
    /// of touching the remote cursor and resets the row count.
    pub async fn execute(
        &mut self,
        operation: &str,
        parameters: &[Value],
    ) -> Result<(), DriverError> {
        if operation == "commit" {
            check_envelope(
                self.client.commit(&self.ds, &self.con).await?,
                self.client.noisy(),
            )?;
            self.last_rowcount = -1;
            return Ok(());
        }
        let body = self.execute_raw(Some(operation), parameters).await?;
        self.last_rowcount = body
            .get("rowcount")
            .and_then(serde_json::Value::as_i64)
            .ok_or_else(|| {
                DriverError::Protocol("execute response missing rowcount".to_string())
            })?;
        self.statement_active = true;
        Ok(())
    }

    /// Run one statement once per parameter set, strictly in order. Only
    /// the first round trip carries the statement text; the peer reuses
    /// the prepared statement for the rest.
    pub async fn executemany(
        &mut self,
        operation: &str,
        parameter_sets: &[Vec<Value>],
    ) -> Result<(), DriverError> {
        for (i, parameters) in parameter_sets.iter().enumerate() {
            let operation = if i == 0 { Some(operation) } else { None };
            self.execute_raw(operation, parameters).await?;
            self.statement_active = true;
        }
        Ok(())
    }

    async fn execute_raw(
        &mut self,
        operation: Option<&str>,
        parameters: &[Value],
    ) -> Result<serde_json::Value, DriverError> {
        // A new statement invalidates the previous result's metadata.
        self.desc = None;
        let cur = self.handle()?;
        let params = encode_params(parameters);
        let body = self
            .client
            .execute(&self.ds, &self.con, cur, operation, &params)
            .await?;
        check_envelope(body, self.client.noisy())
    }

    /// Column metadata of the active result set, fetched lazily; `None`
    /// when the last statement produced no result set.
    pub async fn description(&mut self) -> Result<Option<&[ColumnDescriptor]>, DriverError> {
        self.ensure_desc().await?;
        Ok(self.desc.as_deref())
    }

    async fn ensure_desc(&mut self) -> Result<(), DriverError> {
        if self.desc.is_some() {
            return Ok(());
        }
        let cur = self.handle()?;
        let body = check_envelope(
            self.client.describe_cursor(&self.ds, &self.con, cur).await?,
            self.client.noisy(),
        )?;
        let columns: Vec<WireColumn> = serde_json::from_value(body)?;
        if !columns.is_empty() {
            self.desc = Some(columns.into_iter().map(ColumnDescriptor::from).collect());
        }
        Ok(())
    }

    async fn fetch(&mut self, limit: Option<u64>) -> Result<Vec<Row>, DriverError> {
        self.ensure_desc().await?;
        let cur = self.handle()?;
        let desc = self.desc.as_deref().unwrap_or(&[]);
        let body = check_envelope(
            self.client.fetch(&self.ds, &self.con, cur, limit).await?,
            self.client.noisy(),
        )?;
        decode_rows(&body, desc)
    }

    /// The next row, or `None` once the result set is exhausted.
    pub async fn fetchone(&mut self) -> Result<Option<Row>, DriverError> {
        let mut rows = self.fetch(Some(1)).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// Up to `size` rows (default `arraysize`); fewer when exhausted.
    pub async fn fetchmany(&mut self, size: Option<usize>) -> Result<Vec<Row>, DriverError> {
        let limit = size.unwrap_or(self.arraysize);
        self.fetch(Some(limit as u64)).await
    }

    /// All remaining rows; an empty vec once exhausted, never an error.
    pub async fn fetchall(&mut self) -> Result<Vec<Row>, DriverError> {
        self.fetch(None).await
    }

    /// Advance to the statement's next result set. Returns `false` when
    /// there are no more result sets.
    pub async fn nextset(&mut self) -> Result<bool, DriverError> {
        if !self.statement_active {
            return Err(DriverError::Programming(
                "no statement has been executed".to_string(),
            ));
        }
        // The next result set has its own columns.
        self.desc = None;
        let cur = self.handle()?;
        let body = check_envelope(
            self.client.next_set(&self.ds, &self.con, cur).await?,
            self.client.noisy(),
        )?;
        Ok(body
            .get("more")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false))
    }

    /// Single-pass row iteration: yields `fetchone` results until the
    /// result set is exhausted.
    pub fn rows(&mut self) -> impl Stream<Item = Result<Row, DriverError>> + '_ {
        futures::stream::try_unfold(self, |cursor| async move {
            Ok(cursor.fetchone().await?.map(move |row| (row, cursor)))
        })
    }

    /// Release the remote cursor. Calling close on an already-closed
    /// cursor is an error; drop-based cleanup is silent.
    pub async fn close(&mut self) -> Result<(), DriverError> {
        let cur = self
            .handle
            .take()
            .ok_or(DriverError::Closed("cursor closed"))?;
        let body = self.client.close_cursor(&self.ds, &self.con, &cur).await?;
        check_envelope(body, self.client.noisy())?;
        Ok(())
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        let Some(cur) = self.handle.take() else {
            return;
        };
        // Best effort: release the remote handle without blocking drop.
        let client = self.client.clone();
        let ds = self.ds.clone();
        let con = self.con;
        if let Ok(rt) = tokio::runtime::Handle::try_current() {
            rt.spawn(async move {
                if let Err(e) = client.close_cursor(&ds, &con, &cur).await {
                    tracing::warn!("failed to release remote cursor {}: {}", cur.uuid, e);
                }
            });
        } else {
            tracing::warn!("dropping cursor {} outside a runtime; remote handle leaks", cur.uuid);
        }
    }
}
