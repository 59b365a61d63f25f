use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

/// Settings shared by every service: logging and trace export.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub tracer_enabled: bool,
    #[serde(default = "default_tracer_endpoint")]
    pub tracer_endpoint: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tracer_endpoint() -> String {
    "http://jaeger:4317".to_string()
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// OTLP endpoint to export spans to, if tracing export is switched on.
    pub fn otlp_endpoint(&self) -> Option<&str> {
        self.tracer_enabled.then_some(self.tracer_endpoint.as_str())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            tracer_enabled: false,
            tracer_endpoint: default_tracer_endpoint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otlp_endpoint_follows_tracer_switch() {
        let mut config = Config::default();
        assert_eq!(config.otlp_endpoint(), None);

        config.tracer_enabled = true;
        assert_eq!(config.otlp_endpoint(), Some("http://jaeger:4317"));
    }
}
