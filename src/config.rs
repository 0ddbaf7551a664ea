use std::path::PathBuf;

use thiserror::Error;

use crate::auth::SessionDuration;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Account created or reset at startup.
#[derive(Clone)]
pub struct AdminBootstrap {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminBootstrap")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub database_path: PathBuf,
    pub comments_dir: PathBuf,

    // Web Server
    pub web_host: String,
    pub web_port: u16,

    // Sessions
    pub session_ttl_hours: u64,
    pub cookie_secure: bool,

    // Bootstrap
    pub admin: Option<AdminBootstrap>,
    pub seed_defaults: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("./data/field-notes.sqlite"),
            comments_dir: PathBuf::from("./data/comments"),
            web_host: "0.0.0.0".to_string(),
            web_port: 8080,
            session_ttl_hours: 720,
            cookie_secure: true,
            admin: None,
            seed_defaults: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed, or if only
    /// half of the admin credentials are given.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let admin = match (optional_env("ADMIN_EMAIL"), optional_env("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminBootstrap {
                name: env_or_default("ADMIN_NAME", "Field Notes Admin"),
                email,
                password,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::MissingEnvVar("ADMIN_PASSWORD".to_string())),
            (None, Some(_)) => return Err(ConfigError::MissingEnvVar("ADMIN_EMAIL".to_string())),
        };

        Ok(Self {
            database_path: optional_env("DATABASE_PATH")
                .map_or(defaults.database_path, PathBuf::from),
            comments_dir: optional_env("COMMENTS_DIR").map_or(defaults.comments_dir, PathBuf::from),

            web_host: env_or_default("WEB_HOST", &defaults.web_host),
            web_port: parse_env_u16("WEB_PORT", defaults.web_port)?,

            session_ttl_hours: parse_env_u64("SESSION_TTL_HOURS", defaults.session_ttl_hours)?,
            cookie_secure: parse_env_bool("COOKIE_SECURE", defaults.cookie_secure)?,

            admin,
            seed_defaults: parse_env_bool("SEED_DEFAULTS", defaults.seed_defaults)?,
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_ttl_hours == 0 {
            return Err(ConfigError::InvalidValue {
                name: "SESSION_TTL_HOURS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if let Some(admin) = &self.admin {
            if !admin.email.contains('@') {
                return Err(ConfigError::InvalidValue {
                    name: "ADMIN_EMAIL".to_string(),
                    message: "must be an email address".to_string(),
                });
            }
            if admin.name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    name: "ADMIN_NAME".to_string(),
                    message: "cannot be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub const fn session_duration(&self) -> SessionDuration {
        SessionDuration::from_hours(self.session_ttl_hours)
    }

    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.web_host, self.web_port)
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    optional_env(name).unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 10] = [
        "DATABASE_PATH",
        "COMMENTS_DIR",
        "WEB_HOST",
        "WEB_PORT",
        "SESSION_TTL_HOURS",
        "COOKIE_SECURE",
        "ADMIN_EMAIL",
        "ADMIN_PASSWORD",
        "ADMIN_NAME",
        "SEED_DEFAULTS",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_env_bool("NONEXISTENT_VAR", true).unwrap());
        assert!(!parse_env_bool("NONEXISTENT_VAR", false).unwrap());
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::from_env().unwrap();
        assert_eq!(config.database_path, PathBuf::from("./data/field-notes.sqlite"));
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.session_duration().as_seconds(), 720 * 3600);
        assert!(config.cookie_secure);
        assert!(config.seed_defaults);
        assert!(config.admin.is_none());
        config.validate().unwrap();
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        std::env::set_var("WEB_PORT", "3000");
        std::env::set_var("COOKIE_SECURE", "off");
        std::env::set_var("ADMIN_EMAIL", "editor@example.com");
        std::env::set_var("ADMIN_PASSWORD", "secret");

        let config = Config::from_env().unwrap();
        assert_eq!(config.web_port, 3000);
        assert!(!config.cookie_secure);
        let admin = config.admin.unwrap();
        assert_eq!(admin.name, "Field Notes Admin");
        assert!(!format!("{admin:?}").contains("secret"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values() {
        clear_env();
        std::env::set_var("WEB_PORT", "eighty");
        assert!(matches!(Config::from_env(), Err(ConfigError::ParseInt { .. })));

        clear_env();
        std::env::set_var("SEED_DEFAULTS", "maybe");
        assert!(matches!(Config::from_env(), Err(ConfigError::ParseBool { .. })));

        clear_env();
        std::env::set_var("ADMIN_EMAIL", "editor@example.com");
        assert!(matches!(Config::from_env(), Err(ConfigError::MissingEnvVar(_))));

        clear_env();
        std::env::set_var("SESSION_TTL_HOURS", "0");
        assert!(Config::from_env().unwrap().validate().is_err());
        clear_env();
    }
}
