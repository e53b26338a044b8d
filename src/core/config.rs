use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::features::checkpoints::dtos::CheckpointFilters;
use crate::shared::constants::CHECKPOINTS_TABLE;

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreConfig,
    pub database: Option<DatabaseConfig>,
    pub geocoding: GeocodingConfig,
    pub filters: FilterConfig,
}

/// Which backend serves checkpoint reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Hosted REST interface (PostgREST)
    Rest,
    /// Direct Postgres connection
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" | "supabase" => Ok(Self::Rest),
            "postgres" | "pg" => Ok(Self::Postgres),
            other => Err(format!(
                "CHECKPOINT_STORE must be 'rest' or 'postgres', got '{}'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Project URL of the hosted store, e.g. https://xyz.supabase.co
    pub url: String,
    /// Public (anon) API key sent with every request
    pub anon_key: String,
    pub table: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Settings for the place-name lookup used when a checkpoint has no coordinates
#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    pub base_url: String,
    pub user_agent: String,
    pub country: String,
    /// Minimum gap between outgoing requests (Nominatim allows one per second)
    pub min_interval: Duration,
}

/// Default query the binary runs at startup
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    pub state: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub upcoming: bool,
}

impl Config {
    /// Read configuration from the process environment. `.env` is loaded by
    /// the binary before logging starts.
    pub fn from_env() -> Result<Self, String> {
        let store = StoreConfig::from_env()?;
        let database = match store.backend {
            StoreBackend::Postgres => Some(DatabaseConfig::from_env()?),
            StoreBackend::Rest => None,
        };

        Ok(Config {
            store,
            database,
            geocoding: GeocodingConfig::from_env()?,
            filters: FilterConfig::from_env()?,
        })
    }
}

impl StoreConfig {
    const DEFAULT_TIMEOUT_SECS: u64 = 10;

    pub fn from_env() -> Result<Self, String> {
        let backend = env::var("CHECKPOINT_STORE")
            .unwrap_or_else(|_| "rest".to_string())
            .parse::<StoreBackend>()?;

        // Missing credentials only warn: requests will fail at the transport
        // layer and surface as fetch errors.
        let url = env::var("SUPABASE_URL").unwrap_or_default();
        let anon_key = env::var("SUPABASE_ANON_KEY").unwrap_or_default();
        if backend == StoreBackend::Rest && (url.is_empty() || anon_key.is_empty()) {
            tracing::warn!(
                "SUPABASE_URL or SUPABASE_ANON_KEY is not set; checkpoint requests will fail"
            );
        }

        let table =
            env::var("CHECKPOINTS_TABLE").unwrap_or_else(|_| CHECKPOINTS_TABLE.to_string());

        let timeout_secs = env::var("STORE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "STORE_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            backend,
            url: url.trim_end_matches('/').to_string(),
            anon_key,
            table,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl DatabaseConfig {
    // Default values for database connection pool (conservative defaults for a read-mostly client)
    const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set when CHECKPOINT_STORE=postgres".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl GeocodingConfig {
    const DEFAULT_MIN_INTERVAL_MS: u64 = 1000;

    pub fn from_env() -> Result<Self, String> {
        let base_url = env::var("GEOCODING_BASE_URL")
            .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string());
        let user_agent = env::var("GEOCODING_USER_AGENT")
            .unwrap_or_else(|_| "CheckpointMap/1.0 (checkpoint-map-core)".to_string());
        let country = env::var("GEOCODING_COUNTRY").unwrap_or_else(|_| "United States".to_string());

        let min_interval_ms = env::var("GEOCODING_MIN_INTERVAL_MS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_INTERVAL_MS.to_string())
            .parse::<u64>()
            .map_err(|_| "GEOCODING_MIN_INTERVAL_MS must be a valid number".to_string())?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent,
            country,
            min_interval: Duration::from_millis(min_interval_ms),
        })
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "CheckpointMap/1.0 (checkpoint-map-core)".to_string(),
            country: "United States".to_string(),
            min_interval: Duration::from_millis(Self::DEFAULT_MIN_INTERVAL_MS),
        }
    }
}

impl FilterConfig {
    pub fn from_env() -> Result<Self, String> {
        let non_empty = |key: &str| env::var(key).ok().filter(|s| !s.trim().is_empty());

        let upcoming = match env::var("FILTER_UPCOMING") {
            Ok(v) => parse_bool(&v)
                .ok_or_else(|| "FILTER_UPCOMING must be true or false".to_string())?,
            Err(_) => true,
        };

        Ok(Self {
            state: non_empty("FILTER_STATE"),
            city: non_empty("FILTER_CITY"),
            county: non_empty("FILTER_COUNTY"),
            upcoming,
        })
    }

    pub fn to_filters(&self) -> CheckpointFilters {
        CheckpointFilters {
            state: self.state.clone(),
            city: self.city.clone(),
            county: self.county.clone(),
            upcoming: self.upcoming,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_from_str() {
        assert_eq!("rest".parse::<StoreBackend>(), Ok(StoreBackend::Rest));
        assert_eq!("Supabase".parse::<StoreBackend>(), Ok(StoreBackend::Rest));
        assert_eq!(" postgres ".parse::<StoreBackend>(), Ok(StoreBackend::Postgres));
        assert!("mysql".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_filter_config_to_filters() {
        let config = FilterConfig {
            state: Some("CA".to_string()),
            city: None,
            county: Some("orange".to_string()),
            upcoming: true,
        };
        let filters = config.to_filters();
        assert_eq!(filters.state.as_deref(), Some("CA"));
        assert_eq!(filters.city, None);
        assert_eq!(filters.county.as_deref(), Some("orange"));
        assert!(filters.upcoming);
    }

    #[test]
    fn test_geocoding_config_reads_interval_from_environment() {
        env::set_var("GEOCODING_MIN_INTERVAL_MS", "250");
        let config = GeocodingConfig::from_env().unwrap();
        assert_eq!(config.min_interval, Duration::from_millis(250));

        env::set_var("GEOCODING_MIN_INTERVAL_MS", "soon");
        assert_eq!(
            GeocodingConfig::from_env().unwrap_err(),
            "GEOCODING_MIN_INTERVAL_MS must be a valid number"
        );
        env::remove_var("GEOCODING_MIN_INTERVAL_MS");
    }
}
