//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub provider: ProviderConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (default: 3000)
    pub port: u16,
}

/// Object storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Bucket holding uploads and backups
    pub bucket: String,
    /// Public URL base objects are served from
    /// e.g., "https://files.example.com"
    pub public_url: String,
}

/// Storage provider credentials (S3-compatible, e.g. Cloudflare R2)
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Provider account ID
    pub account_id: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (EVENTOS_*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (EVENTOS_*)
            .add_source(
                Environment::with_prefix("EVENTOS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        if self.storage.bucket.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "storage.bucket must not be empty".to_string(),
            ));
        }

        if self.storage.public_url.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "storage.public_url must not be empty".to_string(),
            ));
        }

        if self.provider.account_id.trim().is_empty()
            || self.provider.access_key_id.trim().is_empty()
            || self.provider.secret_access_key.trim().is_empty()
        {
            return Err(crate::error::AppError::Config(
                "provider.account_id, provider.access_key_id and provider.secret_access_key are required"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            storage: StorageConfig {
                bucket: "eventos".to_string(),
                public_url: "https://files.example.com".to_string(),
            },
            provider: ProviderConfig {
                account_id: "account".to_string(),
                access_key_id: "access-key".to_string(),
                secret_access_key: "secret-key".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn validate_accepts_complete_config() {
        let config = valid_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_bucket() {
        let mut config = valid_config();
        config.storage.bucket = "  ".to_string();

        let error = config.validate().expect_err("empty bucket must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("storage.bucket")
        ));
    }

    #[test]
    fn validate_rejects_missing_credentials() {
        let mut config = valid_config();
        config.provider.secret_access_key = String::new();

        let error = config.validate().expect_err("missing secret must fail");
        assert!(matches!(
            error,
            crate::error::AppError::Config(message)
                if message.contains("provider.")
        ));
    }
}
