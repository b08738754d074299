//! Service configuration

use std::net::SocketAddr;
use std::path::PathBuf;

use access::GateMode;
use serde::{Deserialize, Deserializer};
use tracing_subscriber::filter::Directive;

/// Logging output format
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Logging {
    /// Additional filtering directives
    #[serde(default, deserialize_with = "Logging::deserialize_filters")]
    pub filters: Vec<Directive>,

    /// Logging format
    #[serde(default)]
    pub format: LogFormat,
}

impl Logging {
    fn deserialize_filters<'de, D>(deserializer: D) -> Result<Vec<Directive>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let dirs: Vec<String> = Deserialize::deserialize(deserializer)?;
        dirs.into_iter()
            .map(|dir| dir.parse().map_err(serde::de::Error::custom))
            .collect()
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Database {
    /// In-memory database, always migrated on startup
    Memory {
        #[serde(default = "Database::default_max_connections")]
        max_connections: u32,
    },
    /// File based SQLite database
    #[serde(rename = "sqlite")]
    SqLite {
        path: PathBuf,
        #[serde(default = "Database::default_max_connections")]
        max_connections: u32,
        /// Run migrations on startup
        #[serde(default)]
        migrate: bool,
    },
}

impl Database {
    fn default_max_connections() -> u32 {
        1
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::Memory { max_connections: 1 }
    }
}

/// Session and edge gate configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    /// How long a session stays valid after login
    #[serde(default = "Session::default_ttl_hours")]
    pub ttl_hours: u32,

    /// Sets the `Secure` attribute on the session cookie
    #[serde(default)]
    pub secure_cookie: bool,

    /// How the edge gate recognizes authenticated requests
    #[serde(default)]
    pub gate: GateMode,
}

impl Session {
    fn default_ttl_hours() -> u32 {
        24
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            ttl_hours: Self::default_ttl_hours(),
            secure_cookie: false,
            gate: GateMode::default(),
        }
    }
}

/// Administrator created when the users table is empty
#[derive(Debug, Clone, Deserialize)]
pub struct Admin {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Top level service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Address where to host the service
    #[serde(default = "Config::default_host")]
    pub host: SocketAddr,

    /// Enables GraphiQL endpoint
    #[serde(default)]
    pub graphiql: bool,

    /// Logging configuration
    #[serde(default)]
    pub logging: Logging,

    /// Database configuration
    #[serde(default)]
    pub db: Database,

    /// Session configuration
    #[serde(default)]
    pub session: Session,

    /// Bootstrap administrator
    #[serde(default)]
    pub admin: Option<Admin>,
}

impl Config {
    fn default_host() -> SocketAddr {
        ([127, 0, 0, 1], 3030).into()
    }
}
