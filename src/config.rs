//! TOML configuration for the editor, CLI and server.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::constraint::TrimStrategy;
use crate::geometry::DEFAULT_ZONE_FILL;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub render: RenderConfig,
    pub constraint: ConstraintConfig,
    pub style: StyleConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the zoning map API, with trailing slash
    pub base_url: String,
    /// CSRF token sent on every mutating request
    pub csrf_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/zoning-map/".to_string(),
            csrf_token: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RenderConfig {
    /// Coalescing window for pan/zoom re-renders
    pub debounce_ms: u64,
    /// Below this zoom only the selected barangay is drawn
    pub low_zoom_threshold: f64,
}

impl RenderConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 150,
            low_zoom_threshold: 14.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ConstraintConfig {
    pub trim_strategy: TrimStrategy,
    /// Results with an area at or below this (square degrees) count as empty
    pub min_area: f64,
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        Self {
            trim_strategy: TrimStrategy::Sequential,
            min_area: 1e-12,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StyleConfig {
    pub municipal_color: String,
    pub barangay_color: String,
    pub zoning_fill: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            municipal_color: "#1d4ed8".to_string(),
            barangay_color: "#16a34a".to_string(),
            zoning_fill: DEFAULT_ZONE_FILL.to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[api]
base_url = "https://zoning.example.gov.ph/api/zoning-map/"
csrf_token = "abc123"

[constraint]
trim_strategy = "union"
"#
        )
        .unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.api.csrf_token.as_deref(), Some("abc123"));
        assert_eq!(config.constraint.trim_strategy, TrimStrategy::Union);
        assert_eq!(config.constraint.min_area, 1e-12);
        assert_eq!(config.render.debounce_ms, 150);
        assert_eq!(config.style.zoning_fill, DEFAULT_ZONE_FILL);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_file(dir.path().join("missing.toml")).is_err());
    }
}
