use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::Department;

/// Signing secret used when none is configured. Fine for development only.
pub const DEFAULT_JWT_SECRET: &str = "change-me-hrdesk-secret";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub access: AccessConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Emit logs as JSON lines instead of the human readable format.
    pub json_logs: bool,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/hrdesk.db".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HMAC secret used to sign bearer tokens.
    pub jwt_secret: String,

    /// Lifetime of an issued token in hours.
    pub token_ttl_hours: u32,

    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Password assigned by the reset-password endpoint.
    pub standard_password: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_hours: 24,
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            standard_password: "password123".to_string(),
        }
    }
}

/// One extra department a team leader of `department` may see into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentGrant {
    pub department: Department,
    pub also_sees: Department,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub extended_visibility: Vec<DepartmentGrant>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            extended_visibility: vec![DepartmentGrant {
                department: Department::Sales,
                also_sees: Department::CustomerService,
            }],
        }
    }
}

impl AccessConfig {
    /// Departments whose members are visible to a team leader of `department`.
    #[must_use]
    pub fn visible_departments(&self, department: Department) -> Vec<Department> {
        let mut departments = vec![department];
        for grant in &self.extended_visibility {
            if grant.department == department && !departments.contains(&grant.also_sees) {
                departments.push(grant.also_sees);
            }
        }
        departments
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Environment variables win over values read from disk.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("HRDESK_DATABASE_URL") {
            self.general.database_path = url;
        }
        if let Ok(secret) = std::env::var("HRDESK_JWT_SECRET") {
            self.security.jwt_secret = secret;
        }
        if let Ok(level) = std::env::var("HRDESK_LOG_LEVEL") {
            self.general.log_level = level;
        }
        if let Ok(port) = std::env::var("HRDESK_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid HRDESK_PORT: {port}"))?;
        }
        if let Ok(origins) = std::env::var("HRDESK_CORS_ORIGINS") {
            self.server.cors_allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect();
        }
        Ok(())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("hrdesk").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".hrdesk").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.security.jwt_secret.trim().is_empty() {
            anyhow::bail!("security.jwt_secret cannot be empty");
        }

        if self.security.token_ttl_hours == 0 {
            anyhow::bail!("security.token_ttl_hours must be > 0");
        }

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!("general.min_db_connections cannot exceed max_db_connections");
        }

        self.bind_addr()?;

        Ok(())
    }

    pub fn bind_addr(&self) -> Result<std::net::SocketAddr> {
        format!("{}:{}", self.server.bind_address, self.server.port)
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.server.bind_address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.security.token_ttl_hours, 24);
        assert_eq!(config.security.standard_password, "password123");
        assert_eq!(config.server.port, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[security]"));
        assert!(toml_str.contains("also_sees = \"Customer-Service\""));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [security]
            token_ttl_hours = 8

            [[access.extended_visibility]]
            department = "Finance"
            also_sees = "IT"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.security.token_ttl_hours, 8);
        assert_eq!(config.security.jwt_secret, "change-me-hrdesk-secret");
        assert_eq!(
            config.access.visible_departments(Department::Finance),
            vec![Department::Finance, Department::It]
        );
        assert_eq!(
            config.access.visible_departments(Department::Sales),
            vec![Department::Sales]
        );
    }

    #[test]
    fn default_grant_lets_sales_see_customer_service() {
        let access = AccessConfig::default();
        assert_eq!(
            access.visible_departments(Department::Sales),
            vec![Department::Sales, Department::CustomerService]
        );
        assert_eq!(
            access.visible_departments(Department::CustomerService),
            vec![Department::CustomerService]
        );
    }

    #[test]
    fn validate_rejects_empty_secret_and_zero_ttl() {
        let mut config = Config::default();
        config.security.jwt_secret = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.security.token_ttl_hours = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.bind_address = "not an address".to_string();
        assert!(config.validate().is_err());
    }
}
