//! Connection configuration for the driver-backed manager

use mongodb::options::{ClientOptions, ServerApi, ServerApiVersion};
use std::time::Duration;
use tessera_common::{Result, TesseraError};

/// Default connection string used when `MONGODB_URI` is not set
pub const DEFAULT_URI: &str = "mongodb://localhost:27017";

/// Connection pool configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    /// Minimum number of connections in the pool (default: 0)
    pub min_pool_size: Option<u32>,
    /// Maximum number of connections in the pool (default: 10)
    pub max_pool_size: Option<u32>,
    /// Maximum time a connection can remain idle before being closed (default: none)
    pub max_idle_time: Option<Duration>,
    /// Connection timeout (default: 10s)
    pub connect_timeout: Option<Duration>,
    /// Server selection timeout (default: 30s)
    pub server_selection_timeout: Option<Duration>,
    /// Application name for server logs
    pub app_name: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_pool_size: None,
            max_pool_size: Some(10),
            max_idle_time: None,
            connect_timeout: Some(Duration::from_secs(10)),
            server_selection_timeout: Some(Duration::from_secs(30)),
            app_name: Some("tessera".to_string()),
        }
    }
}

impl PoolConfig {
    /// Copies every configured value onto the driver's client options.
    pub fn apply(&self, client_options: &mut ClientOptions) {
        if let Some(min) = self.min_pool_size {
            client_options.min_pool_size = Some(min);
        }
        if let Some(max) = self.max_pool_size {
            client_options.max_pool_size = Some(max);
        }
        if let Some(idle) = self.max_idle_time {
            client_options.max_idle_time = Some(idle);
        }
        if let Some(connect) = self.connect_timeout {
            client_options.connect_timeout = Some(connect);
        }
        if let Some(server_sel) = self.server_selection_timeout {
            client_options.server_selection_timeout = Some(server_sel);
        }
        if let Some(app) = &self.app_name {
            client_options.app_name = Some(app.clone());
        }
    }
}

/// Everything needed to build a driver-backed manager
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    pub uri: String,
    pub pool: PoolConfig,
    /// Pin the stable API version (V1) on the client
    pub stable_api: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            pool: PoolConfig::default(),
            stable_api: false,
        }
    }
}

impl ConnectionConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    /// Reads the configuration from the environment.
    ///
    /// * `MONGODB_URI` - connection string (default `mongodb://localhost:27017`)
    /// * `MONGODB_APP_NAME` - application name reported to the server
    /// * `MONGODB_MIN_POOL_SIZE` / `MONGODB_MAX_POOL_SIZE` - pool bounds
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::new(lookup("MONGODB_URI").unwrap_or_else(|| DEFAULT_URI.to_string()));

        if let Some(app_name) = lookup("MONGODB_APP_NAME") {
            config.pool.app_name = Some(app_name);
        }
        if let Some(min) = lookup("MONGODB_MIN_POOL_SIZE") {
            config.pool.min_pool_size = Some(parse_pool_size("MONGODB_MIN_POOL_SIZE", &min)?);
        }
        if let Some(max) = lookup("MONGODB_MAX_POOL_SIZE") {
            config.pool.max_pool_size = Some(parse_pool_size("MONGODB_MAX_POOL_SIZE", &max)?);
        }

        Ok(config)
    }

    /// Parses the connection string and applies the pool settings.
    pub async fn client_options(&self) -> Result<ClientOptions> {
        if self.uri.is_empty() {
            return Err(TesseraError::Connection(
                "Connection URI cannot be empty".to_string(),
            ));
        }

        let mut client_options = ClientOptions::parse(&self.uri)
            .await
            .map_err(|e| TesseraError::Connection(e.to_string()))?;
        self.pool.apply(&mut client_options);

        if self.stable_api {
            let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
            client_options.server_api = Some(server_api);
        }

        Ok(client_options)
    }
}

fn parse_pool_size(key: &str, value: &str) -> Result<u32> {
    value.parse::<u32>().map_err(|_| {
        TesseraError::Connection(format!("{} must be a non-negative integer, got '{}'", key, value))
    })
}
