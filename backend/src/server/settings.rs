//! Application settings loaded via OrthoConfig.
//!
//! Values come from `GLUCOSE_*` environment variables, CLI flags or an
//! optional configuration file. Unset values fall back to the defaults
//! returned by the accessor methods.

use std::net::SocketAddr;
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DB_USER: &str = "postgres";
const DEFAULT_DB_NAME: &str = "glucose";
const DEFAULT_BRIDGING_DB_NAME: &str = "glucose_bridging";
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;
const DEFAULT_ROLE_ID: i64 = 3;
const DEFAULT_ACTIVITY_LOG_PATH: &str = "logs/activity.log";
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_POOL_MAX_SIZE: u32 = 10;

/// Connection parameters for one PostgreSQL database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub name: String,
    pub ssl: bool,
}

impl DatabaseTarget {
    /// Render a `postgres://` URL; TLS is required when `ssl` is set and
    /// preferred otherwise.
    pub fn url(&self) -> String {
        let credentials = match &self.password {
            Some(password) => format!("{}:{}", url_escape(&self.user), url_escape(password)),
            None => url_escape(&self.user),
        };
        let sslmode = if self.ssl { "require" } else { "prefer" };
        format!(
            "postgres://{credentials}@{}:{}/{}?sslmode={sslmode}",
            self.host, self.port, self.name
        )
    }
}

fn url_escape(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Settings controlling the HTTP server, both databases and the session layer.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "GLUCOSE")]
pub struct AppSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    pub db_host: Option<String>,
    pub db_port: Option<u16>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub db_name: Option<String>,
    #[ortho_config(default = false)]
    pub db_ssl: bool,
    pub bridging_db_host: Option<String>,
    pub bridging_db_port: Option<u16>,
    pub bridging_db_user: Option<String>,
    pub bridging_db_password: Option<String>,
    pub bridging_db_name: Option<String>,
    #[ortho_config(default = false)]
    pub bridging_db_ssl: bool,
    /// Secret used to sign session tokens.
    pub secret_key: Option<String>,
    pub token_ttl_secs: Option<u64>,
    /// Static token presented by the bridging partner.
    pub static_bridging_token: Option<String>,
    /// Comma separated list of browser origins allowed by CORS.
    pub frontend_url: Option<String>,
    /// Role granted to self-registered users.
    pub default_role_id: Option<i64>,
    pub activity_log_path: Option<PathBuf>,
    /// Interval of the background bridging reconciliation; `0` disables it.
    pub reconcile_interval_secs: Option<u64>,
    /// `development` or `production`.
    pub environment: Option<String>,
    #[ortho_config(default = false)]
    pub cookie_secure: bool,
    pub pool_max_size: Option<u32>,
}

/// Problems detected while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address {value:?}: {message}")]
    BindAddr { value: String, message: String },
    #[error("GLUCOSE_SECRET_KEY must be set")]
    MissingSecret,
}

impl AppSettings {
    /// Parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddr`] when the value is not a socket
    /// address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    /// Target for the canonical database.
    pub fn canonical_database(&self) -> DatabaseTarget {
        DatabaseTarget {
            host: self.db_host.clone().unwrap_or_else(|| DEFAULT_DB_HOST.to_owned()),
            port: self.db_port.unwrap_or(DEFAULT_DB_PORT),
            user: self.db_user.clone().unwrap_or_else(|| DEFAULT_DB_USER.to_owned()),
            password: self.db_password.clone(),
            name: self.db_name.clone().unwrap_or_else(|| DEFAULT_DB_NAME.to_owned()),
            ssl: self.db_ssl,
        }
    }

    /// Target for the bridging database. Host, port and credentials fall
    /// back to the canonical database's values.
    pub fn bridging_database(&self) -> DatabaseTarget {
        let canonical = self.canonical_database();
        DatabaseTarget {
            host: self.bridging_db_host.clone().unwrap_or(canonical.host),
            port: self.bridging_db_port.unwrap_or(canonical.port),
            user: self.bridging_db_user.clone().unwrap_or(canonical.user),
            password: self.bridging_db_password.clone().or(canonical.password),
            name: self
                .bridging_db_name
                .clone()
                .unwrap_or_else(|| DEFAULT_BRIDGING_DB_NAME.to_owned()),
            ssl: self.bridging_db_ssl,
        }
    }

    /// Signing secret for session tokens.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingSecret`] when unset or blank.
    pub fn secret_key(&self) -> Result<&str, SettingsError> {
        self.secret_key
            .as_deref()
            .filter(|secret| !secret.trim().is_empty())
            .ok_or(SettingsError::MissingSecret)
    }

    pub fn token_ttl_secs(&self) -> u64 {
        self.token_ttl_secs.unwrap_or(DEFAULT_TOKEN_TTL_SECS)
    }

    pub fn default_role_id(&self) -> i64 {
        self.default_role_id.unwrap_or(DEFAULT_ROLE_ID)
    }

    pub fn activity_log_path(&self) -> PathBuf {
        self.activity_log_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ACTIVITY_LOG_PATH))
    }

    /// Reconciliation interval in seconds; `None` when disabled.
    pub fn reconcile_interval_secs(&self) -> Option<u64> {
        self.reconcile_interval_secs.filter(|secs| *secs > 0)
    }

    pub fn environment(&self) -> &str {
        self.environment.as_deref().unwrap_or(DEFAULT_ENVIRONMENT)
    }

    pub fn is_production(&self) -> bool {
        self.environment().eq_ignore_ascii_case("production")
    }

    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }

    /// Allowed CORS origins, trimmed, with empty entries dropped.
    pub fn allowed_origins(&self) -> Vec<String> {
        self.frontend_url
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().trim_end_matches('/'))
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }
}
