use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub enrollment: EnrollmentConfig,
    pub sheets: SheetsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Snapshot directory for the document store. Empty string disables
    /// persistence (everything stays in memory).
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    /// Lifetime of a normal login token.
    pub token_ttl_hours: u64,
    /// Lifetime of a SuperAdmin impersonation token.
    pub impersonation_ttl_hours: u64,
    pub seed_superadmin_email: String,
    pub seed_superadmin_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentConfig {
    pub default_section_capacity: usize,
    /// When set, adding a member to a full section fails instead of
    /// silently exceeding capacity.
    pub enforce_capacity: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    /// Directory the CSV fallback sheet store writes under.
    pub exports_dir: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("CAMPUS_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("CAMPUS_DATA_DIR") {
            self.server.data_dir = v;
        }

        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("TOKEN_TTL_HOURS") {
            self.security.token_ttl_hours = v.parse().unwrap_or(self.security.token_ttl_hours);
        }
        if let Ok(v) = env::var("IMPERSONATION_TTL_HOURS") {
            self.security.impersonation_ttl_hours = v
                .parse()
                .unwrap_or(self.security.impersonation_ttl_hours);
        }
        if let Ok(v) = env::var("SUPERADMIN_EMAIL") {
            self.security.seed_superadmin_email = v;
        }
        if let Ok(v) = env::var("SUPERADMIN_PASSWORD") {
            self.security.seed_superadmin_password = v;
        }

        if let Ok(v) = env::var("SECTION_CAPACITY") {
            self.enrollment.default_section_capacity = v
                .parse()
                .unwrap_or(self.enrollment.default_section_capacity);
        }
        if let Ok(v) = env::var("ENFORCE_SECTION_CAPACITY") {
            self.enrollment.enforce_capacity =
                v.parse().unwrap_or(self.enrollment.enforce_capacity);
        }

        if let Ok(v) = env::var("EXPORTS_DIR") {
            self.sheets.exports_dir = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                data_dir: String::new(),
            },
            security: SecurityConfig {
                jwt_secret: "campus-dev-secret".to_string(),
                token_ttl_hours: 8,
                impersonation_ttl_hours: 1,
                seed_superadmin_email: "superadmin@school.com".to_string(),
                seed_superadmin_password: "superadmin123".to_string(),
            },
            enrollment: EnrollmentConfig {
                default_section_capacity: 40,
                enforce_capacity: true,
            },
            sheets: SheetsConfig {
                exports_dir: "exports".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                data_dir: "data".to_string(),
            },
            ..Self::development()
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                data_dir: "data".to_string(),
            },
            security: SecurityConfig {
                // Must come from the environment in production; an empty
                // secret makes token issuance fail loudly.
                jwt_secret: String::new(),
                token_ttl_hours: 8,
                impersonation_ttl_hours: 1,
                seed_superadmin_email: "superadmin@school.com".to_string(),
                seed_superadmin_password: String::new(),
            },
            enrollment: EnrollmentConfig {
                default_section_capacity: 40,
                enforce_capacity: true,
            },
            sheets: SheetsConfig {
                exports_dir: "exports".to_string(),
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults() {
        let config = AppConfig::development();
        assert_eq!(config.security.token_ttl_hours, 8);
        assert_eq!(config.security.impersonation_ttl_hours, 1);
        assert_eq!(config.enrollment.default_section_capacity, 40);
        assert!(config.enrollment.enforce_capacity);
        assert!(config.server.data_dir.is_empty());
    }

    #[test]
    fn production_requires_secret_from_env() {
        let config = AppConfig::production();
        assert!(config.security.jwt_secret.is_empty());
        assert!(!config.server.data_dir.is_empty());
    }
}
