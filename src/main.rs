use anyhow::{Context, Result};
use clap::Parser;
use dbschema_anygen::{logging, Config, Generator};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dbschema-anygen")]
#[command(version)]
#[command(about = "Generate source files from a PostgreSQL schema and text templates", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "anygen.toml")]
    config: PathBuf,

    /// Schema to read, overriding `target_schema`
    #[arg(short, long)]
    schema: Option<String>,

    /// Database password, overriding `db.password`
    #[arg(long, env = "ANYGEN_DB_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let mut config = Config::from_file(&cli.config)?;
    if let Some(schema) = cli.schema {
        config.target_schema = schema;
    }
    if let Some(password) = cli.password {
        config.db.password = password;
    }

    Generator::new()
        .generate(&config)
        .await
        .with_context(|| format!("generation for schema `{}` failed", config.target_schema))?;

    Ok(())
}
