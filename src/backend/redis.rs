//! Redis store backend.
//!
//! Every method is a direct binding to the corresponding Redis command via
//! a deadpool connection pool; semantics are whatever the Redis command
//! reference says they are.

use crate::error::{Error, Result};
use crate::store::{CacheStore, KeyExpiry, KeyTtl, ScoredMember, StoreCommands};
use deadpool_redis::redis::{self, AsyncCommands};
use deadpool_redis::{Config, PoolConfig, Runtime};
use std::collections::HashMap;
use std::time::Duration;

/// Default Redis connection pool size.
/// Formula: (CPU cores × 2) + 1
/// For 8-core systems: 16 connections is optimal
/// Override with REDIS_POOL_SIZE environment variable
const DEFAULT_POOL_SIZE: u32 = 16;

/// Configuration for the Redis backend.
#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub url: String, // e.g., "redis://127.0.0.1:6379"
    pub connection_timeout: Duration,
    pub pool_size: u32,
}

impl Default for RedisConfig {
    fn default() -> Self {
        RedisConfig {
            url: "redis://127.0.0.1:6379".to_string(),
            connection_timeout: Duration::from_secs(5),
            pool_size: 10,
        }
    }
}

impl RedisConfig {
    /// Build a configuration from the environment.
    ///
    /// - `REDIS_URL`: server URL (default `redis://127.0.0.1:6379`)
    /// - `REDIS_POOL_SIZE`: pool size (default 16)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let url =
            lookup("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string());
        let pool_size = lookup("REDIS_POOL_SIZE")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_POOL_SIZE);

        RedisConfig {
            url,
            pool_size,
            ..Default::default()
        }
    }
}

/// EXPIRE takes whole seconds; durations past `i64::MAX` seconds clamp.
fn expire_seconds(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)
}

fn command_error(op: &str, key: &str, e: redis::RedisError) -> Error {
    if e.code() == Some("WRONGTYPE") {
        Error::WrongTypeError(format!("Redis {} on key {}: {}", op, key, e))
    } else {
        Error::BackendError(format!("Redis {} failed for key {}: {}", op, key, e))
    }
}

/// Redis backend with connection pooling and async operations.
///
/// # Example
///
/// ```no_run
/// # use store_kit::backend::{RedisBackend, RedisConfig};
/// # use store_kit::{CacheStore, Result};
/// # async fn example() -> Result<()> {
/// let backend = RedisBackend::new(RedisConfig::default())?;
/// backend.write("key", b"value".to_vec()).await?;
/// let value = backend.read("key").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisBackend {
    pool: deadpool_redis::Pool,
}

impl RedisBackend {
    /// Create a new Redis backend from configuration.
    ///
    /// # Errors
    /// Returns `Err` if the URL is invalid or pool creation fails.
    pub fn new(config: RedisConfig) -> Result<Self> {
        let mut cfg = Config::from_url(config.url.clone());

        let mut pool_cfg = PoolConfig::new(config.pool_size as usize);
        pool_cfg.timeouts.wait = Some(config.connection_timeout);
        pool_cfg.timeouts.create = Some(config.connection_timeout);
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| Error::ConfigError(format!("Failed to create connection pool: {}", e)))?;

        info!(
            "✓ Redis backend initialized with server: {} (pool size: {})",
            config.url, config.pool_size
        );

        Ok(RedisBackend { pool })
    }

    /// Create from a server URL directly, pool size taken from the
    /// environment (see [`RedisConfig::from_env`]).
    pub fn from_url(url: impl Into<String>) -> Result<Self> {
        let config = RedisConfig {
            url: url.into(),
            ..RedisConfig::from_env()
        };
        Self::new(config)
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| Error::BackendError(format!("Failed to get Redis connection: {}", e)))
    }

    /// PING the server; `false` means unreachable.
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = match self.pool.get().await {
            Ok(conn) => conn,
            Err(_) => return Ok(false),
        };
        let pong: std::result::Result<String, _> =
            redis::cmd("PING").query_async(&mut conn).await;
        Ok(pong.is_ok())
    }
}

impl CacheStore for RedisBackend {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn().await?;
        let value: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| command_error("GET", key, e))?;
        match &value {
            Some(_) => debug!("✓ Redis GET {} -> HIT", key),
            None => debug!("✗ Redis GET {} -> MISS", key),
        }
        Ok(value)
    }

    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        let mut conn = self.conn().await?;
        conn.set::<_, _, ()>(key, bytes)
            .await
            .map_err(|e| command_error("SET", key, e))?;
        debug!("✓ Redis SET {}", key);
        Ok(())
    }
}

impl KeyExpiry for RedisBackend {
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn().await?;
        conn.expire(key, expire_seconds(ttl))
            .await
            .map_err(|e| command_error("EXPIRE", key, e))
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        let mut conn = self.conn().await?;
        let secs: i64 = conn
            .ttl(key)
            .await
            .map_err(|e| command_error("TTL", key, e))?;
        // Redis reports -2 for a missing key and -1 for a permanent one
        Ok(match secs {
            -2 => KeyTtl::Missing,
            -1 => KeyTtl::Persistent,
            s => KeyTtl::Expires(Duration::from_secs(s.max(0) as u64)),
        })
    }

    async fn persist(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        conn.persist(key)
            .await
            .map_err(|e| command_error("PERSIST", key, e))
    }
}

impl StoreCommands for RedisBackend {
    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        conn.keys(pattern)
            .await
            .map_err(|e| command_error("KEYS", pattern, e))
    }

    async fn scan(&self, cursor: u64, pattern: &str, count: i64) -> Result<(u64, Vec<String>)> {
        let mut conn = self.conn().await?;
        redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await
            .map_err(|e| command_error("SCAN", pattern, e))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| command_error("DEL", key, e))?;
        debug!("✓ Redis DEL {}", key);
        Ok(())
    }

    async fn del(&self, keys: &[&str]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(keys)
            .await
            .map_err(|e| command_error("DEL", &keys.join(","), e))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        conn.exists(key)
            .await
            .map_err(|e| command_error("EXISTS", key, e))
    }

    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.read(key).await
    }

    async fn mget(&self, keys: &[&str]) -> Result<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn().await?;
        conn.mget(keys)
            .await
            .map_err(|e| command_error("MGET", &keys.join(","), e))
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let mut conn = self.conn().await?;
        conn.incr(key, delta)
            .await
            .map_err(|e| command_error("INCRBY", key, e))
    }

    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let mut conn = self.conn().await?;
        conn.decr(key, delta)
            .await
            .map_err(|e| command_error("DECRBY", key, e))
    }

    async fn rpush(&self, key: &str, values: &[&str]) -> Result<i64> {
        let mut conn = self.conn().await?;
        conn.rpush(key, values)
            .await
            .map_err(|e| command_error("RPUSH", key, e))
    }

    async fn lpush(&self, key: &str, value: &str) -> Result<i64> {
        let mut conn = self.conn().await?;
        conn.lpush(key, value)
            .await
            .map_err(|e| command_error("LPUSH", key, e))
    }

    async fn lpop(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        conn.lpop(key, None)
            .await
            .map_err(|e| command_error("LPOP", key, e))
    }

    async fn lrem(&self, key: &str, count: i64, value: &str) -> Result<i64> {
        let mut conn = self.conn().await?;
        conn.lrem(key, count as isize, value)
            .await
            .map_err(|e| command_error("LREM", key, e))
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        conn.lrange(key, start as isize, stop as isize)
            .await
            .map_err(|e| command_error("LRANGE", key, e))
    }

    async fn llen(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn().await?;
        conn.llen(key)
            .await
            .map_err(|e| command_error("LLEN", key, e))
    }

    async fn lindex(&self, key: &str, index: i64) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        conn.lindex(key, index as isize)
            .await
            .map_err(|e| command_error("LINDEX", key, e))
    }

    async fn lset(&self, key: &str, index: i64, value: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        conn.lset::<_, _, ()>(key, index as isize, value)
            .await
            .map_err(|e| command_error("LSET", key, e))
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        conn.hset(key, field, value)
            .await
            .map_err(|e| command_error("HSET", key, e))
    }

    async fn hset_multiple(&self, key: &str, fields: &[(&str, &str)]) -> Result<()> {
        let mut conn = self.conn().await?;
        conn.hset_multiple::<_, _, _, ()>(key, fields)
            .await
            .map_err(|e| command_error("HMSET", key, e))
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        conn.hget(key, field)
            .await
            .map_err(|e| command_error("HGET", key, e))
    }

    async fn hlen(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn().await?;
        conn.hlen(key)
            .await
            .map_err(|e| command_error("HLEN", key, e))
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        conn.hdel(key, field)
            .await
            .map_err(|e| command_error("HDEL", key, e))
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        conn.hexists(key, field)
            .await
            .map_err(|e| command_error("HEXISTS", key, e))
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let mut conn = self.conn().await?;
        conn.hgetall(key)
            .await
            .map_err(|e| command_error("HGETALL", key, e))
    }

    async fn sadd(&self, key: &str, members: &[&str]) -> Result<i64> {
        let mut conn = self.conn().await?;
        conn.sadd(key, members)
            .await
            .map_err(|e| command_error("SADD", key, e))
    }

    async fn srem(&self, key: &str, members: &[&str]) -> Result<i64> {
        let mut conn = self.conn().await?;
        conn.srem(key, members)
            .await
            .map_err(|e| command_error("SREM", key, e))
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        conn.sismember(key, member)
            .await
            .map_err(|e| command_error("SISMEMBER", key, e))
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        conn.smembers(key)
            .await
            .map_err(|e| command_error("SMEMBERS", key, e))
    }

    async fn scard(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn().await?;
        conn.scard(key)
            .await
            .map_err(|e| command_error("SCARD", key, e))
    }

    async fn srandmember(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        conn.srandmember(key)
            .await
            .map_err(|e| command_error("SRANDMEMBER", key, e))
    }

    async fn zadd(&self, key: &str, members: &[ScoredMember]) -> Result<i64> {
        let mut conn = self.conn().await?;
        let items: Vec<(f64, &str)> = members
            .iter()
            .map(|m| (m.score, m.member.as_str()))
            .collect();
        conn.zadd_multiple(key, &items)
            .await
            .map_err(|e| command_error("ZADD", key, e))
    }

    async fn zrange_withscores(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<ScoredMember>> {
        let mut conn = self.conn().await?;
        let scored: Vec<(String, f64)> = conn
            .zrange_withscores(key, start as isize, stop as isize)
            .await
            .map_err(|e| command_error("ZRANGE", key, e))?;
        Ok(scored
            .into_iter()
            .map(|(member, score)| ScoredMember { member, score })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_config_default() {
        let config = RedisConfig::default();
        assert_eq!(config.url, "redis://127.0.0.1:6379");
        assert_eq!(config.pool_size, 10);
        assert_eq!(config.connection_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_redis_config_lookup_defaults() {
        let config = RedisConfig::from_lookup(|_| None);
        assert_eq!(config.url, "redis://127.0.0.1:6379");
        assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
    }

    #[test]
    fn test_redis_config_lookup_overrides() {
        let config = RedisConfig::from_lookup(|name| match name {
            "REDIS_URL" => Some("redis://cache.internal:6380".to_string()),
            "REDIS_POOL_SIZE" => Some("32".to_string()),
            _ => None,
        });
        assert_eq!(config.url, "redis://cache.internal:6380");
        assert_eq!(config.pool_size, 32);
    }

    #[test]
    fn test_redis_config_lookup_rejects_bad_pool_size() {
        let config =
            RedisConfig::from_lookup(|name| (name == "REDIS_POOL_SIZE").then(|| "junk".to_string()));
        assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
    }

    #[test]
    fn test_expire_seconds_clamps() {
        assert_eq!(expire_seconds(Duration::from_secs(30)), 30);
        assert_eq!(expire_seconds(Duration::MAX), i64::MAX);
    }

    #[test]
    fn test_backend_creation_rejects_bad_url() {
        let config = RedisConfig {
            url: "not a url".to_string(),
            ..Default::default()
        };
        let result = RedisBackend::new(config);
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }
}
