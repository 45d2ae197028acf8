//! Store capability traits.
//!
//! The surface is split into three traits so the fetch coordinator only
//! depends on the two operations it actually needs:
//!
//! - [`CacheStore`]: minimal read/write pair, the fetch core's sole dependency
//! - [`KeyExpiry`]: opt-in key expiration commands
//! - [`StoreCommands`]: the broad pass-through surface (lists, hashes, sets,
//!   sorted sets, counters, scanning)

use crate::error::Result;
use std::collections::HashMap;
use std::time::Duration;

/// Minimal key-value capability required by the fetch coordinator.
///
/// `read` distinguishes "not found" (`Ok(None)`) from store-level failures
/// (`Err`); the fetch path deliberately collapses the two, but other callers
/// may care.
#[allow(async_fn_in_trait)]
pub trait CacheStore: Send + Sync {
    /// Read the raw bytes stored under `key`, or `None` if absent.
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write `bytes` under `key` with no expiration.
    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<()>;
}

/// Remaining lifetime of a key, as reported by [`KeyExpiry::ttl`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyTtl {
    /// The key does not exist (or has already expired).
    Missing,
    /// The key exists and never expires.
    Persistent,
    /// The key expires after the given duration.
    Expires(Duration),
}

/// Opt-in key expiration commands.
///
/// Expiration is deliberately kept off [`CacheStore`]: the base write
/// contract sets no TTL, and callers that want expiring keys opt in through
/// this interface.
#[allow(async_fn_in_trait)]
pub trait KeyExpiry: Send + Sync {
    /// Set `key` to expire after `ttl`. Returns `false` if the key does
    /// not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Report the remaining lifetime of `key`.
    async fn ttl(&self, key: &str) -> Result<KeyTtl>;

    /// Remove any expiration from `key`, making it permanent. Returns
    /// `false` if the key does not exist or carried no expiration.
    async fn persist(&self, key: &str) -> Result<bool>;
}

/// A sorted-set member together with its score.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredMember {
    pub member: String,
    pub score: f64,
}

impl ScoredMember {
    pub fn new(member: impl Into<String>, score: f64) -> Self {
        ScoredMember {
            member: member.into(),
            score,
        }
    }
}

/// Extended store surface: direct bindings to the underlying store's
/// command set, with no logic added on top.
///
/// Semantics follow the Redis command reference throughout: negative list
/// indices count from the tail, `lrem` interprets the sign of `count`, and
/// commands issued against a key of the wrong kind fail with
/// [`crate::Error::WrongTypeError`].
#[allow(async_fn_in_trait)]
pub trait StoreCommands: Send + Sync {
    // -- keys ---------------------------------------------------------------

    /// Keys matching a glob pattern.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Incrementally iterate keys matching `pattern`. Returns the next
    /// cursor (0 when iteration is complete) and a batch of keys.
    async fn scan(&self, cursor: u64, pattern: &str, count: i64) -> Result<(u64, Vec<String>)>;

    /// Remove a single key. Absent keys are not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Remove multiple keys in one round trip.
    async fn del(&self, keys: &[&str]) -> Result<()>;

    /// Whether `key` currently exists.
    async fn exists(&self, key: &str) -> Result<bool>;

    // -- strings / counters -------------------------------------------------

    /// Raw bytes stored under `key`.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Values for several keys at once; `None` marks absent keys.
    async fn mget(&self, keys: &[&str]) -> Result<Vec<Option<String>>>;

    /// Atomically add `delta` to the integer at `key` (0 if absent) and
    /// return the new value.
    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64>;

    /// Atomically subtract `delta` from the integer at `key` and return
    /// the new value.
    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64>;

    // -- lists --------------------------------------------------------------

    /// Append values to the tail of the list at `key`.
    async fn rpush(&self, key: &str, values: &[&str]) -> Result<i64>;

    /// Prepend a value to the head of the list at `key`.
    async fn lpush(&self, key: &str, value: &str) -> Result<i64>;

    /// Pop the head element, or `None` if the list is empty or absent.
    async fn lpop(&self, key: &str) -> Result<Option<String>>;

    /// Remove occurrences of `value` from the list. `count > 0` removes
    /// from the head, `count < 0` from the tail, `count == 0` removes all.
    /// Returns the number of removed elements.
    async fn lrem(&self, key: &str, count: i64, value: &str) -> Result<i64>;

    /// Elements between `start` and `stop` inclusive (negative indices
    /// count from the tail; `0, -1` is the whole list).
    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>>;

    /// Length of the list, 0 if absent.
    async fn llen(&self, key: &str) -> Result<i64>;

    /// Element at `index`, or `None` if out of range.
    async fn lindex(&self, key: &str, index: i64) -> Result<Option<String>>;

    /// Overwrite the element at `index`. Fails on absent keys or
    /// out-of-range indices.
    async fn lset(&self, key: &str, index: i64, value: &str) -> Result<()>;

    // -- hashes -------------------------------------------------------------

    /// Set a single field. Returns `true` if the field was newly created.
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<bool>;

    /// Set several fields at once.
    async fn hset_multiple(&self, key: &str, fields: &[(&str, &str)]) -> Result<()>;

    /// Value of `field`, or `None` if the field or key is absent.
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>>;

    /// Number of fields in the hash, 0 if absent.
    async fn hlen(&self, key: &str) -> Result<i64>;

    /// Remove a field. Returns `true` if it existed.
    async fn hdel(&self, key: &str, field: &str) -> Result<bool>;

    /// Whether `field` exists in the hash.
    async fn hexists(&self, key: &str, field: &str) -> Result<bool>;

    /// All fields and values of the hash.
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>>;

    // -- sets ---------------------------------------------------------------

    /// Add members to the set. Returns the number actually added.
    async fn sadd(&self, key: &str, members: &[&str]) -> Result<i64>;

    /// Remove members from the set. Returns the number actually removed.
    async fn srem(&self, key: &str, members: &[&str]) -> Result<i64>;

    /// Whether `member` is in the set.
    async fn sismember(&self, key: &str, member: &str) -> Result<bool>;

    /// All members of the set.
    async fn smembers(&self, key: &str) -> Result<Vec<String>>;

    /// Cardinality of the set, 0 if absent.
    async fn scard(&self, key: &str) -> Result<i64>;

    /// An arbitrary member of the set, or `None` if empty or absent.
    async fn srandmember(&self, key: &str) -> Result<Option<String>>;

    // -- sorted sets --------------------------------------------------------

    /// Add members with scores; existing members have their score updated
    /// and are re-ranked. Returns the number of newly added members.
    async fn zadd(&self, key: &str, members: &[ScoredMember]) -> Result<i64>;

    /// Members between ranks `start` and `stop` inclusive, ordered by
    /// ascending score (negative ranks count from the highest score).
    async fn zrange_withscores(&self, key: &str, start: i64, stop: i64)
        -> Result<Vec<ScoredMember>>;
}
