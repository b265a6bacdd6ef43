use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub archive: ArchiveConfig,
    pub report: ReportConfig,
}

/// Live modeling service reached over JSON-RPC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
    pub retries: u32,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Directory scanned for JSON-LD zip archives
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    /// Header/footer fragments and converter templates
    pub template_dir: PathBuf,
    /// Converter executable
    pub converter: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            timeout_secs: 10,
            retries: 3,
            retry_backoff_ms: 250,
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            template_dir: PathBuf::from("template"),
            converter: "pandoc".to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.endpoint())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Linear backoff: the n-th retry waits n times the base delay
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(attempt as u64))
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional `up-report` file and
    /// `UPR_`-prefixed environment variables, in that order
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        config = config.add_source(config::File::with_name("up-report").required(false));

        // e.g. UPR_SERVICE__PORT=8081
        config = config.add_source(
            config::Environment::with_prefix("UPR")
                .separator("__")
                .prefix_separator("_")
                .try_parsing(true),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.service.endpoint(), "127.0.0.1:8080");
        assert_eq!(config.service.url(), "http://127.0.0.1:8080");
        assert_eq!(config.service.timeout(), Duration::from_secs(10));
        assert_eq!(config.report.converter, "pandoc");
        assert_eq!(config.archive.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_backoff_is_linear() {
        let service = ServiceConfig::default();
        assert_eq!(service.backoff(1), Duration::from_millis(250));
        assert_eq!(service.backoff(3), Duration::from_millis(750));
    }

    #[test]
    fn test_defaults_survive_layering() {
        let built = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default()).unwrap())
            .build()
            .unwrap();
        let loaded: AppConfig = built.try_deserialize().unwrap();
        assert_eq!(loaded.service, ServiceConfig::default());
        assert_eq!(loaded.report.output_dir, PathBuf::from("output"));
    }
}
