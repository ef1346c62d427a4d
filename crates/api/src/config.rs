//! Server configuration.
//!
//! Sources, later ones overriding earlier ones:
//! 1. built-in defaults
//! 2. the file named by `FINHUB_CONFIG` (any format `config` understands), if set
//! 3. environment variables `FINHUB__<SECTION>__<KEY>`, e.g. `FINHUB__AUTH__JWT_SECRET`

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use finhub_observability::LoggingConfig;

pub const CONFIG_PATH_ENV: &str = "FINHUB_CONFIG";
pub const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,

    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            enable_cors: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,

    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    /// Admin account created at startup when no user with this email exists.
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_days: default_token_ttl_days(),
            bcrypt_cost: default_bcrypt_cost(),
            bootstrap_admin: None,
        }
    }
}

impl AuthConfig {
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (for development/testing)
    #[default]
    Memory,

    /// PostgreSQL storage, requires the `postgres` feature.
    Postgres {
        url: String,

        #[serde(default = "default_pool_size")]
        max_connections: u32,
    },
}

fn default_true() -> bool {
    true
}

fn default_token_ttl_days() -> i64 {
    30
}

fn default_bcrypt_cost() -> u32 {
    10
}

fn default_pool_size() -> u32 {
    10
}

impl AppConfig {
    /// Load configuration from defaults, `FINHUB_CONFIG` and the environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).ok();
        Self::load_from(path.as_deref())
    }

    pub fn load_from(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("FINHUB")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Defaults suitable for tests: in-memory storage, fast hashing.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            auth: AuthConfig {
                jwt_secret: jwt_secret.to_string(),
                bcrypt_cost: 4,
                ..AuthConfig::default()
            },
            ..Self::default()
        }
    }
}
