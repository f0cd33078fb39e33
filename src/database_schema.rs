use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, FromRow};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::DbConfig;
use crate::error::GenerateError;

/// Every column of every table in a schema, ordered by table then position.
pub const COLUMN_DEFINITIONS_QUERY: &str = r#"
SELECT
    c.table_name::text AS table_name,
    c.column_name::text AS column_name,
    c.udt_name::text AS data_type,
    (c.is_nullable = 'YES') AS is_nullable
FROM information_schema.columns c
WHERE c.table_schema = $1
ORDER BY c.table_name, c.ordinal_position
"#;

#[derive(Clone, Debug, PartialEq, Eq, FromRow)]
pub struct ColumnDefinitionRow {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    pub is_nullable: bool,
}

/// Anything that can list the columns of a schema.
#[async_trait]
pub trait SchemaSource {
    async fn column_definitions(
        &mut self,
        schema: &str,
    ) -> Result<Vec<ColumnDefinitionRow>, GenerateError>;
}

/// Reads column definitions from a live PostgreSQL connection.
pub struct PgSchemaReader {
    connection: PgConnection,
    timeout: Option<Duration>,
}

impl PgSchemaReader {
    pub async fn connect(db: &DbConfig) -> Result<Self, GenerateError> {
        let options = db.connect_options();
        let timeout = db.connect_timeout();
        let connecting = PgConnection::connect_with(&options);

        let result = match timeout {
            Some(limit) => tokio::time::timeout(limit, connecting)
                .await
                .unwrap_or_else(|_| Err(timed_out("connecting", limit))),
            None => connecting.await,
        };
        let connection = result.map_err(|source| GenerateError::Connection {
            host: db.host.clone(),
            port: db.port,
            source,
        })?;

        debug!(host = %db.host, port = db.port, database = %db.db_name, "connected");
        Ok(Self {
            connection,
            timeout,
        })
    }

    pub async fn close(self) {
        if let Err(err) = self.connection.close().await {
            warn!(error = %err, "failed to close database connection");
        }
    }
}

#[async_trait]
impl SchemaSource for PgSchemaReader {
    async fn column_definitions(
        &mut self,
        schema: &str,
    ) -> Result<Vec<ColumnDefinitionRow>, GenerateError> {
        let timeout = self.timeout;
        let fetching = get_column_definitions(&mut self.connection, schema);

        let result = match timeout {
            Some(limit) => tokio::time::timeout(limit, fetching)
                .await
                .unwrap_or_else(|_| Err(timed_out("querying", limit))),
            None => fetching.await,
        };
        let rows = result.map_err(|source| GenerateError::Query {
            schema: schema.to_string(),
            source,
        })?;

        debug!(schema, rows = rows.len(), "fetched column definitions");
        Ok(rows)
    }
}

pub async fn get_column_definitions(
    connection: &mut PgConnection,
    schema: &str,
) -> Result<Vec<ColumnDefinitionRow>, sqlx::Error> {
    sqlx::query_as::<_, ColumnDefinitionRow>(COLUMN_DEFINITIONS_QUERY)
        .bind(schema)
        .fetch_all(connection)
        .await
}

fn timed_out(phase: &str, limit: Duration) -> sqlx::Error {
    sqlx::Error::Io(std::io::Error::new(
        std::io::ErrorKind::TimedOut,
        format!("{phase} timed out after {}s", limit.as_secs()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_filters_by_schema_and_orders_columns() {
        assert!(COLUMN_DEFINITIONS_QUERY.contains("information_schema.columns"));
        assert!(COLUMN_DEFINITIONS_QUERY.contains("WHERE c.table_schema = $1"));
        assert!(COLUMN_DEFINITIONS_QUERY.contains("ORDER BY c.table_name, c.ordinal_position"));
    }

    #[tokio::test]
    async fn test_unreachable_database_is_connection_error() {
        let db = DbConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "nobody".to_string(),
            password: String::new(),
            db_name: "nothing".to_string(),
            connect_timeout_secs: Some(5),
        };

        let err = PgSchemaReader::connect(&db).await.err().unwrap();

        assert!(matches!(err, GenerateError::Connection { port: 1, .. }), "{err}");
    }
}
