//! CLI subcommands.

pub mod migrate;
pub mod seed;
pub mod users;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use qkart_storefront::config::{ConfigError, database_url_from_env};
use qkart_storefront::db::{RepositoryError, create_pool};

/// Errors shared by all commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Storage error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} invalid entries in seed file")]
    InvalidSeed(usize),

    #[error("No user with email {0}")]
    UnknownUser(String),
}

/// Connect to the storefront database.
async fn connect() -> Result<PgPool, CommandError> {
    let database_url: SecretString = database_url_from_env()?;
    tracing::info!("Connecting to storefront database...");
    Ok(create_pool(&database_url).await?)
}
