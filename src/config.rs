use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::geo::Coordinate;

const DEFAULT_GEOCODE_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const DEFAULT_DIRECTIONS_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/directions/json";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

// Oakland, Pittsburgh.
const DEFAULT_CENTER: Coordinate = Coordinate {
    lat: 40.4445,
    lng: -79.957155,
};

pub const API_KEY_ENV: &str = "WAYFINDER_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    geocode_endpoint: Option<String>,
    directions_endpoint: Option<String>,
    api_key: Option<String>,
    request_timeout_secs: Option<u64>,
    map_center: Option<CenterEntry>,
}

#[derive(Debug, Deserialize)]
struct CenterEntry {
    lat: f64,
    lng: f64,
}

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub geocode_endpoint: Url,
    pub directions_endpoint: Url,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
    pub map_center: Coordinate,
}

impl ServiceConfig {
    /// Load from an optional YAML file. A missing path (or a path that does
    /// not exist) falls back to defaults; a malformed file is an error. The
    /// `WAYFINDER_API_KEY` environment variable overrides the file's key.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let file = match config_path {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)?;
                Some(serde_yaml::from_str::<ConfigFile>(&contents)?)
            }
            _ => None,
        };

        let mut config = Self::defaults()?;
        if let Some(file) = file {
            if let Some(raw) = file.geocode_endpoint {
                config.geocode_endpoint = Url::parse(&raw)?;
            }
            if let Some(raw) = file.directions_endpoint {
                config.directions_endpoint = Url::parse(&raw)?;
            }
            if let Some(key) = file.api_key {
                config.api_key = Some(key);
            }
            if let Some(secs) = file.request_timeout_secs {
                config.request_timeout = Duration::from_secs(secs);
            }
            if let Some(center) = file.map_center {
                config.map_center = Coordinate::new(center.lat, center.lng);
            }
        }

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                config.api_key = Some(key);
            }
        }

        Ok(config)
    }

    fn defaults() -> Result<Self, ConfigError> {
        Ok(Self {
            geocode_endpoint: Url::parse(DEFAULT_GEOCODE_ENDPOINT)?,
            directions_endpoint: Url::parse(DEFAULT_DIRECTIONS_ENDPOINT)?,
            api_key: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            map_center: DEFAULT_CENTER,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_defaults() {
        let config = ServiceConfig::load(None).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config
            .geocode_endpoint
            .as_str()
            .starts_with("https://maps.googleapis.com/"));
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        use std::io::Write;
        writeln!(
            file,
            "geocode_endpoint: https://geo.example/json\nrequest_timeout_secs: 3\nmap_center:\n  lat: 40.0\n  lng: -79.9"
        )
        .unwrap();
        let config = ServiceConfig::load(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.geocode_endpoint.as_str(), "https://geo.example/json");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.map_center, Coordinate::new(40.0, -79.9));
        // untouched fields keep their defaults
        assert!(config
            .directions_endpoint
            .as_str()
            .starts_with("https://maps.googleapis.com/"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config =
            ServiceConfig::load(Some(PathBuf::from("/nonexistent/wayfinder.yaml"))).unwrap();
        assert_eq!(config.map_center, DEFAULT_CENTER);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }
}
