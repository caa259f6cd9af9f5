//! Environment-level configuration.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP listener binds to.
    pub bind: String,
    pub port: u16,
    /// When set, every route except /health answers 503.
    pub maintenance: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8000,
            maintenance: false,
        }
    }
}

/// Read configuration from the environment (`BIND_ADDR`, `PORT`,
/// `MAINTENANCE_MODE`), falling back to defaults.
pub fn load() -> Config {
    let defaults = Config::default();
    Config {
        bind: env::var("BIND_ADDR").unwrap_or(defaults.bind),
        port: env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port),
        maintenance: env::var("MAINTENANCE_MODE")
            .map(|v| flag(&v))
            .unwrap_or(defaults.maintenance),
    }
}

fn flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
