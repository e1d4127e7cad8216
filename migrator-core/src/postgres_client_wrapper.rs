use crate::error::MigrationError;
use crate::Result;
use bytes::Buf;
use futures::{pin_mut, TryStreamExt};
use tokio::task::JoinHandle;
use tokio_postgres::types::FromSqlOwned;
use tokio_postgres::{Client, CopyInSink, CopyOutStream, NoTls, Row};
use tracing::instrument;

/// A thin wrapper around `tokio_postgres::Client`. The destination adapter (§4.L) opens one of
/// these per worker; workers never share a connection.
pub struct PostgresClientWrapper {
    client: Client,
    join_handle: JoinHandle<()>,
    connection_string: String,
}

impl PostgresClientWrapper {
    /// Connects to the destination server and spawns the driver's connection future onto its
    /// own task.
    #[instrument(skip_all)]
    pub async fn new(connection_string: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(connection_string, NoTls).await?;

        let join_handle = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "postgres connection task ended with an error");
            }
        });

        Ok(PostgresClientWrapper {
            client,
            join_handle,
            connection_string: connection_string.to_string(),
        })
    }

    /// Opens another connection to the same server, for a second worker.
    pub async fn create_another_connection(&self) -> Result<Self> {
        Self::new(&self.connection_string).await
    }

    /// Runs a batch of DDL/DML statements that return no rows.
    pub async fn execute_non_query(&self, sql: &str) -> Result {
        self.client.batch_execute(sql).await?;
        Ok(())
    }

    /// Same as [`Self::execute_non_query`] but surfaces the raw driver error instead of wrapping
    /// it, for callers that attach their own [`MigrationError`] context (e.g. `CREATE TABLE`
    /// failures, which carry the offending SQL).
    pub async fn execute_non_query_raw(&self, sql: &str) -> std::result::Result<(), tokio_postgres::Error> {
        self.client.batch_execute(sql).await
    }

    /// Runs a query and collects every row into `T`.
    pub async fn get_results<T: FromRow>(&self, sql: &str) -> Result<Vec<T>> {
        let query_results = self.client.query_raw(sql, Vec::<i32>::new()).await?;
        pin_mut!(query_results);

        let mut output = Vec::new();
        while let Some(row) = query_results.try_next().await? {
            output.push(T::from_row(row)?);
        }
        Ok(output)
    }

    /// Runs a query and returns its single column, one value per row.
    pub async fn get_single_results<T: FromSqlOwned>(&self, sql: &str) -> Result<Vec<T>> {
        let r = self
            .get_results::<(T,)>(sql)
            .await?
            .into_iter()
            .map(|t| t.0)
            .collect();
        Ok(r)
    }

    /// Runs a query and returns its single column of its single row.
    pub async fn get_single_result<T: FromSqlOwned>(&self, sql: &str) -> Result<T> {
        let result = self.get_result::<(T,)>(sql).await?;
        Ok(result.0)
    }

    /// Runs a query expected to return exactly one row.
    pub async fn get_result<T: FromRow>(&self, sql: &str) -> Result<T> {
        let mut results = self.get_results(sql).await?;
        if results.len() != 1 {
            return Err(MigrationError::Config(format!(
                "expected exactly one result row from query, got {}: {sql}",
                results.len()
            )));
        }
        Ok(results.remove(0))
    }

    /// Starts a `COPY ... FROM STDIN` sink.
    pub async fn copy_in<U>(&self, sql: &str) -> Result<CopyInSink<U>>
    where
        U: Buf + Send + 'static,
    {
        let sink = self.client.copy_in(sql).await?;
        Ok(sink)
    }

    /// Starts a `COPY ... TO STDOUT` stream.
    pub async fn copy_out(&self, sql: &str) -> Result<CopyOutStream> {
        let stream = self.client.copy_out(sql).await?;
        Ok(stream)
    }

    #[cfg(test)]
    pub(crate) fn underlying_connection(&self) -> &Client {
        &self.client
    }
}

impl Drop for PostgresClientWrapper {
    fn drop(&mut self) {
        self.join_handle.abort();
    }
}

/// Reads an entire row into a tuple type.
pub trait FromRow: Sized {
    fn from_row(row: Row) -> Result<Self>;
}

impl<T1: FromSqlOwned> FromRow for (T1,) {
    fn from_row(row: Row) -> Result<Self> {
        Ok((row.try_get(0)?,))
    }
}

impl<T1: FromSqlOwned, T2: FromSqlOwned> FromRow for (T1, T2) {
    fn from_row(row: Row) -> Result<Self> {
        Ok((row.try_get(0)?, row.try_get(1)?))
    }
}

impl<T1: FromSqlOwned, T2: FromSqlOwned, T3: FromSqlOwned> FromRow for (T1, T2, T3) {
    fn from_row(row: Row) -> Result<Self> {
        Ok((row.try_get(0)?, row.try_get(1)?, row.try_get(2)?))
    }
}

impl<T1: FromSqlOwned, T2: FromSqlOwned, T3: FromSqlOwned, T4: FromSqlOwned> FromRow
    for (T1, T2, T3, T4)
{
    fn from_row(row: Row) -> Result<Self> {
        Ok((
            row.try_get(0)?,
            row.try_get(1)?,
            row.try_get(2)?,
            row.try_get(3)?,
        ))
    }
}
