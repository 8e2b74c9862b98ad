//! Environment-driven configuration.

use figment::providers::Env;
use figment::Figment;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// sqlx connection string. Defaults to an embedded on-disk sqlite store.
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Base URL of the upstream scheduling site.
    #[serde(default = "default_upstream_base_url")]
    pub upstream_base_url: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Rate limiting is enforced by an external token-bucket service; this
    /// flag and the redis coordinates only describe that deployment.
    #[serde(default)]
    pub rate_limiting_enabled: bool,
    #[serde(default = "default_redis_host")]
    pub redis_host: String,
    #[serde(default = "default_redis_port")]
    pub redis_port: u16,
    #[serde(default)]
    pub redis_db: u32,
    #[serde(default)]
    pub testing_mode: bool,
}

fn default_database_url() -> String {
    "sqlite://timatalva.db".to_string()
}

fn default_upstream_base_url() -> String {
    "https://tg.glasir.fo".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_redis_host() -> String {
    "localhost".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new().merge(Env::raw()).extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_environment() {
        figment::Jail::expect_with(|_jail| {
            let config: Config = Figment::new().merge(Env::raw()).extract()?;
            assert_eq!(config.database_url, "sqlite://timatalva.db");
            assert_eq!(config.port, 8080);
            assert!(!config.rate_limiting_enabled);
            assert!(!config.testing_mode);
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("DATABASE_URL", "sqlite://other.db");
            jail.set_env("RATE_LIMITING_ENABLED", "true");
            jail.set_env("PORT", "9000");
            let config: Config = Figment::new().merge(Env::raw()).extract()?;
            assert_eq!(config.database_url, "sqlite://other.db");
            assert!(config.rate_limiting_enabled);
            assert_eq!(config.port, 9000);
            Ok(())
        });
    }
}
