//! Connection configuration.
//!
//! Provides the parameters a [`Driver`](crate::connection::Driver) needs to
//! open a connection, plus session options.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Connection parameters.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectConfig {
    /// Hostname or IP address
    pub host: String,
    /// Port number (default: 3306)
    pub port: u16,
    /// Username for authentication
    pub user: String,
    /// Password for authentication
    pub password: Option<String>,
    /// Database name; file-based drivers treat it as a path
    pub database: String,
    /// Log generated statements at INFO instead of DEBUG
    pub log_statements: bool,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: String::new(),
            password: None,
            database: String::new(),
            log_statements: false,
        }
    }
}

impl ConnectConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the hostname.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username.
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the database.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Log generated statements at INFO level.
    pub fn log_statements(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }

    /// Data source name in `user:password@tcp(host:port)/database` form.
    pub fn dsn(&self) -> String {
        self.format_dsn(self.password.as_deref().unwrap_or(""))
    }

    /// Same as [`ConnectConfig::dsn`] with the password masked, for logs.
    pub fn redacted_dsn(&self) -> String {
        self.format_dsn(if self.password.is_some() { "***" } else { "" })
    }

    fn format_dsn(&self, password: &str) -> String {
        format!(
            "{}:{}@tcp({}:{})/{}",
            self.user, password, self.host, self.port, self.database
        )
    }

    /// Session options derived from this configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            log_statements: self.log_statements,
        }
    }
}

impl std::fmt::Debug for ConnectConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .field("log_statements", &self.log_statements)
            .finish()
    }
}

/// Configuration for session behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Log generated statements at INFO instead of DEBUG.
    pub log_statements: bool,
}
