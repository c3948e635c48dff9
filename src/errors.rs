//! Errors for the catalog service
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Configuration error")]
    ConfigError(#[from] config::ConfigError),

    #[error("Invalid configuration: {message}")]
    ConfigurationError { message: String },

    #[error("IO error")]
    IoError(#[from] std::io::Error),

    #[error("Invalid popularity score: {0}")]
    InvalidPopularityScore(String),

    #[error("Invalid inquiry: {0}")]
    InvalidInquiry(String),

    #[error("Invalid appointment: {0}")]
    InvalidAppointment(String),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Database migration error")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),
}

impl CatalogError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        CatalogError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Whether the error was caused by the caller's input
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CatalogError::InvalidPopularityScore(_)
                | CatalogError::InvalidInquiry(_)
                | CatalogError::InvalidAppointment(_)
        )
    }
}
