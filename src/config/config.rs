// src/config/config.rs
use crate::utils::error::CoordinatorError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

/// Where mining progress is published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Redis reachable at `redis_host:redis_port`
    Redis,
    /// Process-local map (no outside readers)
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "redis" => Ok(StoreKind::Redis),
            "memory" => Ok(StoreKind::Memory),
            other => Err(format!("Unknown store backend: {}", other)),
        }
    }
}

/// Coordinator configuration
///
/// Built from defaults, then an optional TOML file, then environment
/// variables, then command-line overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP control surface binds to
    pub host: String,
    /// Port of the HTTP control surface
    pub port: u16,
    /// Base URL of the random-number source
    pub rng_url: String,
    /// Base URL of the hash engine
    pub hasher_url: String,
    /// Shared store host
    pub redis_host: String,
    /// Shared store port
    pub redis_port: u16,
    /// Shared store backend
    pub store_backend: StoreKind,
    /// Hash rounds requested per block
    pub difficulty: u32,
    /// Pause between loop iterations in milliseconds
    pub pacing_ms: u64,
    /// Rolling window length used for the mining rate
    pub window_size: usize,
    /// Expiry of stored results in seconds
    pub result_ttl_secs: u64,
    /// Length of the recent results list
    pub recent_results: usize,
    /// Per-request timeout for collaborator calls in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".into(),
            port: 8002,
            rng_url: "http://localhost:8000".into(),
            hasher_url: "http://localhost:8001".into(),
            redis_host: "localhost".into(),
            redis_port: 6379,
            store_backend: StoreKind::Redis,
            difficulty: 1,
            pacing_ms: 100,
            window_size: crate::stats::DEFAULT_WINDOW_SIZE,
            result_ttl_secs: 3600,
            recent_results: 100,
            request_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file; missing fields keep defaults
    ///
    /// # Errors
    /// Returns `CoordinatorError::ConfigError` if the file can't be read
    /// and `CoordinatorError::TomlError` if it can't be parsed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CoordinatorError> {
        let path = path.into();
        let config_str = std::fs::read_to_string(&path).map_err(|e| {
            CoordinatorError::ConfigError(format!(
                "Failed to read config at {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(toml::from_str(&config_str)?)
    }

    /// Applies overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), CoordinatorError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Applies overrides using `lookup` as the environment
    pub fn apply_env_with(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), CoordinatorError> {
        if let Some(v) = lookup("HOST") {
            self.host = v;
        }
        if let Some(v) = lookup("RNG_SERVICE_URL") {
            self.rng_url = v;
        }
        if let Some(v) = lookup("HASHER_SERVICE_URL") {
            self.hasher_url = v;
        }
        if let Some(v) = lookup("REDIS_HOST") {
            self.redis_host = v;
        }
        override_parsed(&lookup, "PORT", &mut self.port)?;
        override_parsed(&lookup, "REDIS_PORT", &mut self.redis_port)?;
        override_parsed(&lookup, "STORE_BACKEND", &mut self.store_backend)?;
        override_parsed(&lookup, "MINING_DIFFICULTY", &mut self.difficulty)?;
        override_parsed(&lookup, "PACING_DELAY_MS", &mut self.pacing_ms)?;
        override_parsed(&lookup, "STATS_WINDOW_SIZE", &mut self.window_size)?;
        override_parsed(&lookup, "RESULT_TTL_SECS", &mut self.result_ttl_secs)?;
        override_parsed(&lookup, "RECENT_RESULTS", &mut self.recent_results)?;
        override_parsed(&lookup, "REQUEST_TIMEOUT_MS", &mut self.request_timeout_ms)?;
        Ok(())
    }

    /// Checks values that would otherwise fail later at runtime
    pub fn validate(&self) -> Result<(), CoordinatorError> {
        self.rng_base()?;
        self.hasher_base()?;
        if self.window_size == 0 {
            return Err(CoordinatorError::ConfigError(
                "window_size must be at least 1".into(),
            ));
        }
        if self.recent_results == 0 {
            return Err(CoordinatorError::ConfigError(
                "recent_results must be at least 1".into(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(CoordinatorError::ConfigError(
                "request_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Parsed random source base URL
    pub fn rng_base(&self) -> Result<Url, CoordinatorError> {
        http_url("rng_url", &self.rng_url)
    }

    /// Parsed hash engine base URL
    pub fn hasher_base(&self) -> Result<Url, CoordinatorError> {
        http_url("hasher_url", &self.hasher_url)
    }

    /// Generates a commented TOML template with the default values
    pub fn generate_template() -> String {
        let d = Config::default();
        let mut template = String::new();
        template.push_str("# Mining coordinator configuration\n");
        template.push_str("# Every value can also be set through the environment (see names below)\n\n");
        template.push_str("# HTTP control surface (HOST, PORT)\n");
        template.push_str(&format!("host = \"{}\"\n", d.host));
        template.push_str(&format!("port = {}\n\n", d.port));
        template.push_str("# Collaborators (RNG_SERVICE_URL, HASHER_SERVICE_URL)\n");
        template.push_str(&format!("rng_url = \"{}\"\n", d.rng_url));
        template.push_str(&format!("hasher_url = \"{}\"\n", d.hasher_url));
        template.push_str("# Per-request timeout in ms (REQUEST_TIMEOUT_MS)\n");
        template.push_str(&format!("request_timeout_ms = {}\n\n", d.request_timeout_ms));
        template.push_str("# Shared store: \"redis\" or \"memory\" (STORE_BACKEND, REDIS_HOST, REDIS_PORT)\n");
        template.push_str("store_backend = \"redis\"\n");
        template.push_str(&format!("redis_host = \"{}\"\n", d.redis_host));
        template.push_str(&format!("redis_port = {}\n\n", d.redis_port));
        template.push_str("# Mining loop (MINING_DIFFICULTY, PACING_DELAY_MS, STATS_WINDOW_SIZE)\n");
        template.push_str(&format!("difficulty = {}\n", d.difficulty));
        template.push_str(&format!("pacing_ms = {}\n", d.pacing_ms));
        template.push_str(&format!("window_size = {}\n\n", d.window_size));
        template.push_str("# Result log (RESULT_TTL_SECS, RECENT_RESULTS)\n");
        template.push_str(&format!("result_ttl_secs = {}\n", d.result_ttl_secs));
        template.push_str(&format!("recent_results = {}\n", d.recent_results));
        template
    }
}

fn override_parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) -> Result<(), CoordinatorError> {
    if let Some(raw) = lookup(key) {
        *target = raw.trim().parse().map_err(|_| {
            CoordinatorError::ConfigError(format!("Invalid value for {}: {:?}", key, raw))
        })?;
    }
    Ok(())
}

fn http_url(field: &str, raw: &str) -> Result<Url, CoordinatorError> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(CoordinatorError::ConfigError(format!(
            "{} must use http or https, got {}",
            field, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.port, 8002);
        assert_eq!(config.pacing_ms, 100);
        assert_eq!(config.window_size, 100);
        assert_eq!(config.result_ttl_secs, 3600);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        config
            .apply_env_with(env(&[
                ("PORT", "9000"),
                ("RNG_SERVICE_URL", "http://rng:8000"),
                ("STORE_BACKEND", "Memory"),
                ("MINING_DIFFICULTY", "4"),
                ("STATS_WINDOW_SIZE", " 20 "),
            ]))
            .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.rng_url, "http://rng:8000");
        assert_eq!(config.store_backend, StoreKind::Memory);
        assert_eq!(config.difficulty, 4);
        assert_eq!(config.window_size, 20);
        assert_eq!(config.hasher_url, Config::default().hasher_url);
    }

    #[test]
    fn bad_env_value_is_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_env_with(env(&[("PACING_DELAY_MS", "fast")]))
            .unwrap_err();
        assert!(err.to_string().contains("PACING_DELAY_MS"));
    }

    #[test]
    fn validation_catches_bad_values() {
        let config = Config {
            window_size: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            hasher_url: "ftp://hasher".into(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            rng_url: "not a url".into(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CoordinatorError::ConfigError(_))
        ));
    }

    #[test]
    fn template_parses_back_to_defaults() {
        let parsed: Config = toml::from_str(&Config::generate_template()).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let parsed: Config = toml::from_str("port = 7000\nstore_backend = \"memory\"\n").unwrap();
        assert_eq!(parsed.port, 7000);
        assert_eq!(parsed.store_backend, StoreKind::Memory);
        assert_eq!(parsed.redis_port, 6379);
    }
}
