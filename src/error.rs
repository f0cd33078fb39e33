use std::path::PathBuf;
use thiserror::Error;

use crate::template::{ExecError, ParseError};

/// Every way a generation run can stop. The first failure ends the run.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to connect to database at {host}:{port}: {source}")]
    Connection {
        host: String,
        port: u16,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to query column definitions for schema `{schema}`: {source}")]
    Query {
        schema: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to read template {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template syntax error: {0}")]
    TemplateSyntax(#[from] ParseError),

    #[error("failed to render: {0}")]
    Render(#[from] ExecError),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
