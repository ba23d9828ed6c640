//! Runtime configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "PATH_GTFSRT_";

/// Shortest update period accepted.
pub const MIN_UPDATE_PERIOD: Duration = Duration::from_secs(1);

/// Invalid configuration values.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set but could not be parsed
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: String,
        value: String,
        reason: String,
    },

    #[error("update period must be at least {min:?}, got {0:?}", min = MIN_UPDATE_PERIOD)]
    UpdatePeriodTooShort(Duration),

    #[error("timeout must be non-zero")]
    ZeroTimeout,
}

/// Which upstream to read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    /// Port Authority ridepath feed, behind the shared response cache
    #[default]
    Panynj,
    /// Razza JSON API, one request per call
    Razza,
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "panynj" => Ok(SourceKind::Panynj),
            "razza" | "http" => Ok(SourceKind::Razza),
            other => Err(format!("unknown source {other:?}, expected panynj or razza")),
        }
    }
}

/// Settings for the feed and its HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Port the HTTP server listens on
    pub port: u16,
    /// Time between update cycles
    pub update_period: Duration,
    /// Deadline for each upstream call
    pub timeout: Duration,
    pub source: SourceKind,
    /// How long a PANYNJ response is reused
    pub cache_ttl: Duration,
    /// Number of status history entries kept
    pub history_capacity: usize,
    /// JSON file to read the topology from instead of asking the source
    pub topology_path: Option<PathBuf>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            update_period: Duration::from_secs(5),
            timeout: Duration::from_secs(5),
            source: SourceKind::default(),
            cache_ttl: Duration::from_secs(10),
            history_capacity: 100,
            topology_path: None,
        }
    }
}

impl FeedConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_update_period(mut self, period: Duration) -> Self {
        self.update_period = period;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_source(mut self, source: SourceKind) -> Self {
        self.source = source;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_topology_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.topology_path = Some(path.into());
        self
    }

    /// Read settings from `PATH_GTFSRT_*` environment variables, falling
    /// back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`] but with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            let var = format!("{ENV_PREFIX}{name}");
            lookup(&var)
                .filter(|v| !v.trim().is_empty())
                .map(|v| (var, v))
        };

        let mut config = Self::default();
        if let Some((var, v)) = get("PORT") {
            config.port = parse(&var, &v)?;
        }
        if let Some((var, v)) = get("UPDATE_PERIOD_SECS") {
            config.update_period = Duration::from_secs(parse(&var, &v)?);
        }
        if let Some((var, v)) = get("TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse(&var, &v)?);
        }
        if let Some((var, v)) = get("SOURCE") {
            config.source = parse(&var, &v)?;
        }
        if let Some((var, v)) = get("CACHE_TTL_SECS") {
            config.cache_ttl = Duration::from_secs(parse(&var, &v)?);
        }
        if let Some((var, v)) = get("HISTORY_CAPACITY") {
            config.history_capacity = parse(&var, &v)?;
        }
        if let Some((_, v)) = get("TOPOLOGY_PATH") {
            config.topology_path = Some(PathBuf::from(v));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.update_period < MIN_UPDATE_PERIOD {
            return Err(ConfigError::UpdatePeriodTooShort(self.update_period));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

fn parse<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var: var.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}
