use crate::error::{BudgetError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
const DEV_JWT_SECRET: &str = "check-balance-development-secret";
/// Upper bound on `auth.token_ttl_days`, ten years.
pub const MAX_TOKEN_TTL_DAYS: i64 = 3650;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/check_balance.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of issued tokens.
    pub token_ttl_days: i64,
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_days: 30,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory (if present) and apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();
        let mut config = if config_path.exists() {
            let config_content = fs::read_to_string(config_path).map_err(|e| {
                BudgetError::Config(format!(
                    "Failed to read config file '{}': {}",
                    config_path.display(),
                    e
                ))
            })?;
            toml::from_str(&config_content)?
        } else {
            Config::default()
        };

        config.apply_env_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("CHECK_BALANCE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("CHECK_BALANCE_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| BudgetError::Config(format!("Invalid CHECK_BALANCE_PORT '{port}': {e}")))?;
        }
        if let Some(path) = lookup("CHECK_BALANCE_DATABASE") {
            self.database.path = path;
        }
        if let Some(secret) = lookup("CHECK_BALANCE_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(days) = lookup("CHECK_BALANCE_TOKEN_TTL_DAYS") {
            self.auth.token_ttl_days = days.parse().map_err(|e| {
                BudgetError::Config(format!("Invalid CHECK_BALANCE_TOKEN_TTL_DAYS '{days}': {e}"))
            })?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(BudgetError::Config("auth.jwt_secret must not be empty".to_string()));
        }
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&self.auth.token_ttl_days) {
            return Err(BudgetError::Config(format!(
                "auth.token_ttl_days must be between 1 and {MAX_TOKEN_TTL_DAYS}"
            )));
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(BudgetError::Config(
                "auth.bcrypt_cost must be between 4 and 31".to_string(),
            ));
        }
        Ok(())
    }

    /// True while the built-in development secret is in use.
    pub fn uses_development_secret(&self) -> bool {
        self.auth.jwt_secret == DEV_JWT_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.token_ttl_days, 30);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9000\n\n[auth]\njwt_secret = \"s3cret\"").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert_eq!(config.database.path, "data/check_balance.db");
        assert!(!config.uses_development_secret());
    }

    #[test]
    fn env_overrides_win() {
        let vars: HashMap<&str, &str> = [
            ("CHECK_BALANCE_PORT", "7000"),
            ("CHECK_BALANCE_DATABASE", "/tmp/budget.db"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config
            .apply_env_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.database.path, "/tmp/budget.db");
    }

    #[test]
    fn bad_port_is_a_config_error() {
        let mut config = Config::default();
        let err = config
            .apply_env_overrides(|k| (k == "CHECK_BALANCE_PORT").then(|| "http".to_string()))
            .unwrap_err();
        assert!(matches!(err, BudgetError::Config(_)));
    }

    #[test]
    fn token_lifetime_is_bounded() {
        let mut config = Config::default();
        config
            .apply_env_overrides(|k| (k == "CHECK_BALANCE_TOKEN_TTL_DAYS").then(|| "100000".to_string()))
            .unwrap();
        assert!(matches!(config.validate(), Err(BudgetError::Config(_))));

        config.auth.token_ttl_days = 0;
        assert!(config.validate().is_err());
        config.auth.token_ttl_days = MAX_TOKEN_TTL_DAYS;
        assert!(config.validate().is_ok());
    }
}
