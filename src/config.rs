//! Application configuration

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_with::serde_as;

use crate::errors::CatalogError;

const ENV_PREFIX: &str = "MEDTOUR";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub acquire_timeout: Duration,
}

impl AppConfig {
    /// Load from `config/default` (optional) and `MEDTOUR__*` variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder(File::with_name("config/default").required(false))?
            .build()?
            .try_deserialize()
    }

    /// Load from an explicit configuration file, environment still wins
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::builder(File::from(path).required(true))?
            .build()?
            .try_deserialize()
    }

    fn builder<S>(file: S) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 5)?
            .set_default("database.acquire_timeout", 5)?
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            ))
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), CatalogError> {
        self.server.validate()?;
        self.database.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.port == 0 {
            return Err(CatalogError::ConfigurationError {
                message: "Server port must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl DatabaseConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), CatalogError> {
        self.validate_url()?;
        self.validate_pool()?;
        Ok(())
    }

    fn validate_url(&self) -> Result<(), CatalogError> {
        if self.url.trim().is_empty() {
            return Err(CatalogError::ConfigurationError {
                message: "Database URL cannot be empty".to_string(),
            });
        }
        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err(CatalogError::ConfigurationError {
                message: "Database URL must use the postgres:// scheme".to_string(),
            });
        }
        Ok(())
    }

    fn validate_pool(&self) -> Result<(), CatalogError> {
        if self.max_connections == 0 {
            return Err(CatalogError::ConfigurationError {
                message: "Connection pool needs at least one connection".to_string(),
            });
        }
        if self.acquire_timeout.is_zero() {
            return Err(CatalogError::ConfigurationError {
                message: "Acquire timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;

    fn database_config(url: &str, max_connections: u32, timeout: u64) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            max_connections,
            acquire_timeout: Duration::from_secs(timeout),
        }
    }

    #[test]
    fn test_load_config() {
        env::set_var("MEDTOUR__DATABASE__URL", "postgres://test@localhost/medtour_test");
        env::set_var("MEDTOUR__SERVER__PORT", "8081");

        let config = AppConfig::load().unwrap();
        assert_eq!(config.database.url, "postgres://test@localhost/medtour_test");
        assert_eq!(config.server.port, 8081);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [server]
            host = "127.0.0.1"

            [database]
            url = "postgres://file@localhost/medtour"
            max_connections = 12
            acquire_timeout = 30
            "#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.server.host, IpAddr::from([127, 0, 0, 1]));
        assert_eq!(config.database.max_connections, 12);
        assert_eq!(config.database.acquire_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_database_config_validate() {
        let config = database_config("postgres://localhost/medtour", 5, 5);

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_database_config_validate_invalid_url() {
        assert!(database_config("", 5, 5).validate().is_err());
        assert!(database_config("mysql://localhost/medtour", 5, 5)
            .validate()
            .is_err());
    }

    #[test]
    fn test_database_config_validate_invalid_pool() {
        assert!(database_config("postgres://localhost/medtour", 0, 5)
            .validate()
            .is_err());
        assert!(database_config("postgres://localhost/medtour", 5, 0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_server_config_validate() {
        let config = ServerConfig {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 0,
        };
        assert!(config.validate().is_err());

        let config = ServerConfig { port: 80, ..config };
        assert!(config.validate().is_ok());
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:80");
    }
}
