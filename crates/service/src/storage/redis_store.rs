use async_trait::async_trait;
use configs::RedisConfig;
use deadpool_redis::redis::{self, AsyncCommands};
use deadpool_redis::{Config, Connection, Pool, PoolConfig, Runtime};
use tracing::debug;

use super::{KvBackend, StoreError};

impl From<deadpool_redis::PoolError> for StoreError {
    fn from(e: deadpool_redis::PoolError) -> Self {
        StoreError::Connection(e.to_string())
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout() {
            StoreError::Connection(e.to_string())
        } else {
            StoreError::Command(e.to_string())
        }
    }
}

/// Redis backend over a fixed-size connection pool.
///
/// The pool hands out connections to concurrent requests; nothing else is
/// shared between them.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
    addr: String,
}

impl RedisStore {
    /// Build the pool. No connection is opened until the first command.
    pub fn connect(cfg: &RedisConfig) -> Result<Self, StoreError> {
        let mut pool_cfg = PoolConfig::new(cfg.pool_size);
        pool_cfg.timeouts.wait = Some(cfg.connect_timeout());
        pool_cfg.timeouts.create = Some(cfg.connect_timeout());
        pool_cfg.timeouts.recycle = Some(cfg.connect_timeout());

        let mut redis_cfg = Config::from_url(cfg.url());
        redis_cfg.pool = Some(pool_cfg);
        let pool = redis_cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { pool, addr: cfg.addr.clone() })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn conn(&self) -> Result<Connection, StoreError> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl KvBackend for RedisStore {
    async fn add_member(&self, set_key: &str, member: &str) -> Result<(), StoreError> {
        debug!(cmd = "SADD", key = set_key, member, "redis command");
        let mut conn = self.conn().await?;
        let _: () = conn.sadd(set_key, member).await?;
        Ok(())
    }

    async fn list_members(&self, set_key: &str) -> Result<Vec<String>, StoreError> {
        debug!(cmd = "SMEMBERS", key = set_key, "redis command");
        let mut conn = self.conn().await?;
        let members: Vec<String> = conn.smembers(set_key).await?;
        Ok(members)
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>, StoreError> {
        debug!(cmd = "GET", key, "redis command");
        let mut conn = self.conn().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<(), StoreError> {
        debug!(cmd = "SET", key, "redis command");
        let mut conn = self.conn().await?;
        let _: () = conn.set(key, value).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Option<RedisConfig> {
        // 仅在显式提供测试 Redis 时运行
        let addr = std::env::var("VMS_REDIS_TEST_URL").ok()?;
        Some(RedisConfig { addr, ..RedisConfig::default() })
    }

    #[tokio::test]
    async fn pool_builds_without_server() {
        let cfg = RedisConfig { addr: "127.0.0.1:1".into(), ..RedisConfig::default() };
        let store = RedisStore::connect(&cfg).expect("pool config is valid");
        assert_eq!(store.addr(), "127.0.0.1:1");
    }

    #[tokio::test]
    async fn unreachable_server_reports_error() {
        let cfg = RedisConfig { addr: "127.0.0.1:1".into(), connect_timeout_secs: 1, ..RedisConfig::default() };
        let store = RedisStore::connect(&cfg).expect("pool config is valid");
        assert!(store.ping().await.is_err());
        assert!(store.get_value("anything").await.is_err());
    }

    #[tokio::test]
    async fn redis_roundtrip_when_available() -> Result<(), anyhow::Error> {
        let Some(cfg) = test_config() else {
            eprintln!("VMS_REDIS_TEST_URL missing; skip redis test");
            return Ok(());
        };
        let store = RedisStore::connect(&cfg)?;
        store.ping().await?;

        let prefix = format!("vms-test-{}", uuid::Uuid::new_v4());
        let set_key = format!("{prefix}:set");
        store.add_member(&set_key, "a").await?;
        store.add_member(&set_key, "a").await?;
        store.add_member(&set_key, "b").await?;
        let mut members = store.list_members(&set_key).await?;
        members.sort();
        assert_eq!(members, vec!["a", "b"]);

        let key = format!("{prefix}:value");
        assert_eq!(store.get_value(&key).await?, None);
        store.set_value(&key, "1.2.3").await?;
        assert_eq!(store.get_value(&key).await?.as_deref(), Some("1.2.3"));
        assert!(store.list_members(&format!("{prefix}:missing")).await?.is_empty());
        Ok(())
    }
}
