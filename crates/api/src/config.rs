//! Application configuration

use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,
    pub app_base_url: String,
    pub cors_allowed_origins: Vec<String>,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,
    pub run_migrations: bool,

    // Authentication
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,

    // Feature flags
    pub enable_billing: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Same variable the billing crate builds Stripe return URLs from
        let app_base_url =
            env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|origin| origin.trim().to_string())
                        .filter(|origin| !origin.is_empty())
                        .collect()
                })
                .unwrap_or_else(|_| vec![app_base_url.trim_end_matches('/').to_string()]),
            app_base_url,

            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            run_migrations: env::var("RUN_MIGRATIONS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),

            // Authentication
            jwt_secret: {
                let secret =
                    env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
                if secret.len() < 32 {
                    return Err(ConfigError::WeakSecret(
                        "JWT_SECRET must be at least 32 characters",
                    ));
                }
                secret
            },
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .unwrap_or(24),

            // Feature flags
            enable_billing: env::var("ENABLE_BILLING")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Weak secret: {0}")]
    WeakSecret(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn setup_minimal_config() {
        env::set_var("DATABASE_URL", "postgres://test");
        env::set_var(
            "JWT_SECRET",
            "test-jwt-secret-must-be-at-least-32-characters-long",
        );
    }

    fn cleanup_config() {
        for key in [
            "DATABASE_URL",
            "JWT_SECRET",
            "APP_BASE_URL",
            "CORS_ALLOWED_ORIGINS",
            "ENABLE_BILLING",
            "DATABASE_MAX_CONNECTIONS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        cleanup_config();
        setup_minimal_config();

        let config = Config::from_env().unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert_eq!(config.app_base_url, "http://localhost:3000");
        assert_eq!(config.cors_allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.database_max_connections, 5);
        assert!(config.enable_billing);
        assert!(!config.run_migrations);

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_app_base_url_is_default_allowed_origin() {
        cleanup_config();
        setup_minimal_config();
        env::set_var("APP_BASE_URL", "https://app.example.com/");

        let config = Config::from_env().unwrap();
        assert_eq!(config.app_base_url, "https://app.example.com/");
        assert_eq!(config.cors_allowed_origins, vec!["https://app.example.com"]);

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_missing_database_url() {
        cleanup_config();
        setup_minimal_config();
        env::remove_var("DATABASE_URL");

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_short_jwt_secret_rejected() {
        cleanup_config();
        setup_minimal_config();
        env::set_var("JWT_SECRET", "too-short");

        assert!(matches!(Config::from_env(), Err(ConfigError::WeakSecret(_))));

        cleanup_config();
    }

    #[test]
    #[serial]
    fn test_cors_origins_and_flags() {
        cleanup_config();
        setup_minimal_config();
        env::set_var(
            "CORS_ALLOWED_ORIGINS",
            "https://app.example.com, https://www.example.com,",
        );
        env::set_var("ENABLE_BILLING", "false");
        env::set_var("DATABASE_MAX_CONNECTIONS", "not-a-number");

        let config = Config::from_env().unwrap();
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://app.example.com", "https://www.example.com"]
        );
        assert!(!config.enable_billing);
        assert_eq!(config.database_max_connections, 5);

        cleanup_config();
    }
}
