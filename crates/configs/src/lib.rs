use std::time::Duration;

use anyhow::anyhow;
use anyhow::Result;
use common::env::lookup_or_default;
use serde::Deserialize;

pub const ENV_REDIS: &str = "VMS_REDIS";
pub const ENV_PORT: &str = "VMS_PORT";

pub const DEFAULT_REDIS_ADDR: &str = "127.0.0.1:6379";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_POOL_SIZE: usize = 20;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: DEFAULT_PORT, worker_threads: None }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// `host:port` or a full `redis://` URL
    #[serde(default = "default_redis_addr")]
    pub addr: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            addr: default_redis_addr(),
            pool_size: DEFAULT_POOL_SIZE,
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Redis,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { DEFAULT_PORT }
fn default_redis_addr() -> String { DEFAULT_REDIS_ADDR.to_string() }
fn default_pool_size() -> usize { DEFAULT_POOL_SIZE }
fn default_connect_timeout() -> u64 { 5 }

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

/// Like [`load_from_file`], but a missing file yields the defaults.
/// An unreadable or malformed file is still an error.
pub fn load_optional(path: &str) -> Result<AppConfig> {
    match load_from_file(path) {
        Ok(cfg) => Ok(cfg),
        Err(e) => match e.downcast_ref::<std::io::Error>() {
            Some(io) if io.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
            _ => Err(e.context(format!("cannot load config file {path}"))),
        },
    }
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Full startup load: config file if present, then `VMS_*` overrides, then validation.
    pub fn load_and_validate() -> Result<Self> {
        // 配置文件可选；不存在时使用默认值，存在但无法解析则报错
        let mut cfg = load_optional(&config_path())?;
        cfg.apply_env(|k| std::env::var(k).ok())?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Override the backend address and listen port from the environment.
    ///
    /// Values already present in the config file act as the defaults.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.redis.addr = lookup_or_default(ENV_REDIS, &self.redis.addr, &lookup);
        let port = lookup_or_default(ENV_PORT, &self.server.port.to_string(), &lookup);
        self.server.port = port
            .trim()
            .parse::<u16>()
            .map_err(|e| anyhow!("{ENV_PORT}={port} is not a valid port: {e}"))?;
        Ok(())
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.redis.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if self.worker_threads == Some(0) {
            self.worker_threads = None;
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl RedisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.addr.trim().is_empty() {
            return Err(anyhow!("redis.addr is empty; set it in config.toml or {ENV_REDIS}"));
        }
        if self.pool_size == 0 {
            return Err(anyhow!("redis.pool_size must be >= 1"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(anyhow!("redis.connect_timeout_secs must be a positive number of seconds"));
        }
        Ok(())
    }

    /// Connection URL for the client; bare `host:port` gets the `redis://` scheme.
    pub fn url(&self) -> String {
        let addr = self.addr.trim();
        if addr.contains("://") {
            addr.to_string()
        } else {
            format!("redis://{addr}")
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_service() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(|_| None).unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.redis.addr, "127.0.0.1:6379");
        assert_eq!(cfg.redis.pool_size, 20);
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.bind_addr(), "0.0.0.0:8080");
        assert_eq!(cfg.storage.backend, StorageBackend::Redis);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9000
            [redis]
            addr = "10.0.0.1:6379"
            "#,
        )
        .unwrap();
        cfg.apply_env(|k| match k {
            ENV_REDIS => Some("redis.internal:6380".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.redis.addr, "redis.internal:6380");
        // VMS_PORT absent: the file value stays
        assert_eq!(cfg.server.port, 9000);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut cfg = AppConfig::default();
        let err = cfg.apply_env(|k| (k == ENV_PORT).then(|| "http".to_string()));
        assert!(err.is_err());

        let mut cfg = AppConfig::default();
        cfg.server.port = 0;
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn redis_url_accepts_both_forms() {
        let mut r = RedisConfig::default();
        assert_eq!(r.url(), "redis://127.0.0.1:6379");
        r.addr = "redis://:secret@cache:6379/2".into();
        assert_eq!(r.url(), "redis://:secret@cache:6379/2");
    }

    fn write_temp_config(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("vms_configs_{}_{name}.toml", std::process::id()));
        std::fs::write(&path, content).expect("write temp config");
        path
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!("vms_configs_{}_absent.toml", std::process::id()));
        let cfg = load_optional(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, DEFAULT_PORT);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = write_temp_config("broken", "[server\nport = ");
        assert!(load_optional(path.to_str().unwrap()).is_err());
        let _ = std::fs::remove_file(&path);

        // unknown enum value must not silently become the default backend
        let path = write_temp_config("typo", "[storage]\nbackend = \"memroy\"\n");
        let err = load_optional(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("cannot load config file"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn memory_backend_parses() {
        let cfg: AppConfig = toml::from_str("[storage]\nbackend = \"memory\"\n").unwrap();
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
        let mut cfg = cfg;
        cfg.redis.pool_size = 0;
        assert!(cfg.normalize_and_validate().is_err());
    }
}
