//! Runtime configuration for the Trademarket gateway.
//!
//! Everything comes from the environment (a `.env` file is honoured via
//! `dotenvy` in `main`). Regions, languages and the admin key have no
//! defaults: the process refuses to start without them.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// Immutable `region code -> upstream host` mapping.
#[derive(Debug, Clone)]
pub struct RegionRegistry {
    hosts: HashMap<String, String>,
}

impl RegionRegistry {
    /// Parse `na=na-trade.example.com,eu=eu-trade.example.com`.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut hosts = HashMap::new();
        for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (code, host) = pair
                .split_once('=')
                .with_context(|| format!("region entry `{pair}` is not `code=host`"))?;
            let (code, host) = (code.trim().to_lowercase(), host.trim());
            if code.is_empty() || host.is_empty() {
                bail!("region entry `{pair}` has an empty code or host");
            }
            hosts.insert(code, host.to_owned());
        }
        Self::from_map(hosts)
    }

    pub fn from_map(hosts: HashMap<String, String>) -> Result<Self> {
        if hosts.is_empty() {
            bail!("no market regions configured");
        }
        let hosts = hosts
            .into_iter()
            .map(|(code, host)| (code.to_lowercase(), host))
            .collect();
        Ok(Self { hosts })
    }

    pub fn host(&self, region: &str) -> Option<&str> {
        self.hosts.get(&region.to_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, region: &str) -> bool {
        self.host(region).is_some()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.hosts.keys().map(String::as_str)
    }
}

/// Capacity and lifetime of one cache domain.
#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    /// Max resident entries (per region for sharded domains).
    pub capacity: u64,
    /// Time since the last successful load after which an entry is gone.
    pub ttl: Duration,
    /// Fraction of `ttl` after which a read schedules a background reload.
    /// `None` disables refresh-ahead.
    pub refresh_ratio: Option<f64>,
}

impl CacheSettings {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            refresh_ratio: None,
        }
    }

    pub fn with_refresh_ahead(mut self, ratio: f64) -> Self {
        self.refresh_ratio = Some(ratio);
        self
    }

    /// Age after which an entry is due for a background reload.
    pub fn refresh_after(&self) -> Option<Duration> {
        self.refresh_ratio
            .filter(|r| *r > 0.0 && *r < 1.0)
            .map(|r| self.ttl.mul_f64(r))
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_addr: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub regions: RegionRegistry,
    /// Lower-cased language codes that have metadata collections.
    pub languages: Vec<String>,
    pub admin_api_key: String,
    pub upstream_timeout: Duration,
    pub raw_cache: CacheSettings,
    pub localized_cache: CacheSettings,
    pub metadata_cache: CacheSettings,
    pub dump_cache: CacheSettings,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into());
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let db_max_connections = parsed("DB_MAX_CONNECTIONS", 5);

        let regions = RegionRegistry::parse(
            &env::var("MARKET_REGIONS").context("MARKET_REGIONS must be set")?,
        )?;
        let languages =
            parse_languages(&env::var("MARKET_LANGUAGES").context("MARKET_LANGUAGES must be set")?)?;

        let admin_api_key = env::var("ADMIN_API_KEY").unwrap_or_default();
        if admin_api_key.trim().is_empty() {
            bail!("ADMIN_API_KEY must be set and non-empty");
        }

        let refresh_ratio = parsed("REFRESH_AHEAD_RATIO", 0.8_f64);

        Ok(Settings {
            server_addr,
            database_url,
            db_max_connections,
            regions,
            languages,
            admin_api_key,
            upstream_timeout: Duration::from_secs(parsed("UPSTREAM_TIMEOUT_SECS", 10)),
            raw_cache: cache_from_env("RAW", 40_000, 300).with_refresh_ahead(refresh_ratio),
            localized_cache: cache_from_env("LOCALIZED", 40_000, 300)
                .with_refresh_ahead(refresh_ratio),
            metadata_cache: cache_from_env("METADATA", 40_000, 3_600),
            dump_cache: cache_from_env("DUMP", 20, 86_400),
        })
    }
}

/// Parse `en,de,fr` into lower-cased codes; an empty list is an error.
pub fn parse_languages(spec: &str) -> Result<Vec<String>> {
    let languages: Vec<String> = spec
        .split(',')
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .collect();
    if languages.is_empty() {
        bail!("no languages configured");
    }
    Ok(languages)
}

fn parsed<T: std::str::FromStr>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn cache_from_env(domain: &str, capacity: u64, ttl_secs: u64) -> CacheSettings {
    CacheSettings::new(
        parsed(&format!("{domain}_CACHE_CAPACITY"), capacity),
        Duration::from_secs(parsed(&format!("{domain}_CACHE_TTL_SECS"), ttl_secs)),
    )
}
