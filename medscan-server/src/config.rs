//! 服务器配置
//!
//! 加载顺序：内置默认值、可选的TOML配置文件、`MEDSCAN_` 前缀环境变量。
//! 嵌套字段用双下划线分隔，例如 `MEDSCAN_GEMINI__API_KEY`、`MEDSCAN_SERVER__PORT`。

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use medscan_analysis::client::DEFAULT_ENDPOINT;
use medscan_analysis::{GeminiConfig, DEFAULT_MODEL};
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

/// 未配置密钥时读取的环境变量
pub const API_KEY_ENV: &str = "API_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub gemini: GeminiConfig,
    pub connectivity: ConnectivityConfig,
    pub sessions: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 网络探测配置
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectivityConfig {
    /// 探测目标，`host:port`
    pub probe_address: String,
    pub timeout_ms: u64,
    /// 为 false 时始终视为离线
    pub enabled: bool,
}

impl ConnectivityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// 会话表配置
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// 空闲超时（秒）
    pub idle_timeout_secs: u64,
    pub max_sessions: usize,
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl AppConfig {
    /// 加载配置，文件不存在时跳过
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080_i64)?
            .set_default("gemini.endpoint", DEFAULT_ENDPOINT)?
            .set_default("gemini.model", DEFAULT_MODEL)?
            .set_default(
                "connectivity.probe_address",
                "generativelanguage.googleapis.com:443",
            )?
            .set_default("connectivity.timeout_ms", 3000_i64)?
            .set_default("connectivity.enabled", true)?
            .set_default("sessions.idle_timeout_secs", 1800_i64)?
            .set_default("sessions.max_sessions", 1000_i64)?
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("MEDSCAN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: AppConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.apply_api_key_fallback(std::env::var(API_KEY_ENV).ok());

        info!("Configuration loaded (file: {})", path);
        Ok(config)
    }

    /// 配置中没有密钥时使用后备值
    pub fn apply_api_key_fallback(&mut self, fallback: Option<String>) {
        let configured = self
            .gemini
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if !configured {
            self.gemini.api_key = fallback.filter(|k| !k.trim().is_empty());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = AppConfig::load("/nonexistent/medscan-config").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.gemini.endpoint, DEFAULT_ENDPOINT);
        assert!(config.connectivity.enabled);
        assert_eq!(config.connectivity.timeout(), Duration::from_secs(3));
        assert_eq!(config.sessions.idle_timeout(), Duration::from_secs(1800));
        assert_eq!(config.sessions.max_sessions, 1000);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = std::env::temp_dir().join(format!("medscan-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("medscan.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[server]\nport = 9090\n\n[gemini]\nmodel = \"gemini-test\"\napi_key = \"from-file\"\n\n[connectivity]\nenabled = false\n\n[sessions]\nmax_sessions = 5"
        )
        .unwrap();

        let config = AppConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.gemini.model, "gemini-test");
        assert_eq!(config.gemini.api_key.as_deref(), Some("from-file"));
        assert!(!config.connectivity.enabled);
        assert_eq!(config.sessions.max_sessions, 5);
        assert_eq!(config.sessions.idle_timeout_secs, 1800);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_api_key_fallback() {
        let mut config = AppConfig::load("/nonexistent/medscan-config").unwrap();
        config.gemini.api_key = None;
        config.apply_api_key_fallback(Some("from-env".to_string()));
        assert_eq!(config.gemini.api_key.as_deref(), Some("from-env"));

        config.apply_api_key_fallback(Some("other".to_string()));
        assert_eq!(config.gemini.api_key.as_deref(), Some("from-env"));

        config.gemini.api_key = Some("  ".to_string());
        config.apply_api_key_fallback(Some(String::new()));
        assert!(config.gemini.api_key.is_none());
    }
}
