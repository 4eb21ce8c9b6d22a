use remnawave_sdk::RemnawaveError;
use thiserror::Error;

/// Infrastructure errors that can occur during application startup.
///
/// Display messages never include connection strings or keys. The `#[source]`
/// chain may, so log these with `%e` rather than `?e`.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("Database connection failed. Check DATABASE_URL and ensure the database is running.")]
    DatabaseConnection(#[source] sqlx::Error),

    #[error("Database migration failed")]
    Migration(#[source] sqlx::migrate::MigrateError),

    #[error("Configuration error: {var} is invalid ({reason})")]
    ConfigInvalid { var: &'static str, reason: String },

    #[error("Remnawave client setup failed. Check REMNAWAVE_API_URL and REMNAWAVE_API_KEY.")]
    Remnawave(#[source] RemnawaveError),

    #[error("HTTP client setup failed")]
    HttpClient(#[source] reqwest::Error),
}

impl From<sqlx::Error> for InfraError {
    fn from(e: sqlx::Error) -> Self {
        InfraError::DatabaseConnection(e)
    }
}

impl From<sqlx::migrate::MigrateError> for InfraError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        InfraError::Migration(e)
    }
}
