use std::path::PathBuf;
use std::time::Duration;

use allurex_metrics::{Namespace, NamespaceError};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_STALE_AFTER_SECS: u64 = 300;
pub const DEFAULT_NAMESPACE: &str = "allure";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("update interval must be greater than zero")]
    ZeroInterval,

    #[error("staleness limit ({stale_after}s) must not be shorter than the update interval ({interval}s)")]
    StaleBeforeInterval { stale_after: u64, interval: u64 },

    #[error(transparent)]
    Namespace(#[from] NamespaceError),
}

/// Resolved runtime settings for one exporter process.
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    pub report_dir: PathBuf,
    pub bind: String,
    pub port: u16,
    pub interval: Duration,
    pub stale_after: Duration,
    pub namespace: Namespace,
}

impl ExporterConfig {
    /// Build from raw values, rejecting combinations that cannot work.
    pub fn new(
        report_dir: PathBuf,
        bind: String,
        port: u16,
        interval_secs: u64,
        stale_after_secs: u64,
        namespace: &str,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            report_dir,
            bind,
            port,
            interval: Duration::from_secs(interval_secs),
            stale_after: Duration::from_secs(stale_after_secs),
            namespace: Namespace::parse(namespace)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.stale_after < self.interval {
            return Err(ConfigError::StaleBeforeInterval {
                stale_after: self.stale_after.as_secs(),
                interval: self.interval.as_secs(),
            });
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(interval: u64, stale: u64, ns: &str) -> Result<ExporterConfig, ConfigError> {
        ExporterConfig::new(
            PathBuf::from("/reports/latest"),
            DEFAULT_BIND.to_string(),
            DEFAULT_PORT,
            interval,
            stale,
            ns,
        )
    }

    #[test]
    fn defaults_are_valid() {
        let config = build(
            DEFAULT_INTERVAL_SECS,
            DEFAULT_STALE_AFTER_SECS,
            DEFAULT_NAMESPACE,
        )
        .unwrap();
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert_eq!(config.interval, Duration::from_secs(30));
        assert_eq!(config.namespace.as_str(), "allure");
    }

    #[test]
    fn rejects_zero_interval() {
        assert!(matches!(
            build(0, 300, "allure"),
            Err(ConfigError::ZeroInterval)
        ));
    }

    #[test]
    fn rejects_staleness_shorter_than_interval() {
        let err = build(60, 30, "allure").unwrap_err();
        assert!(matches!(err, ConfigError::StaleBeforeInterval { .. }));
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn rejects_bad_namespace() {
        assert!(matches!(
            build(30, 300, "allure-reports"),
            Err(ConfigError::Namespace(_))
        ));
        assert!(build(30, 300, "").is_ok());
    }
}
