//! In-memory store backend.
//!
//! The default backend: a process-local DashMap holding the same kinds of
//! entries the extended command surface expects (strings, lists, hashes,
//! sets, sorted sets), with lazy expiry and Redis-like edge-case behavior.
//! Useful on its own for single-process caching and as the test double for
//! everything built on the store traits.

use crate::error::{Error, Result};
use crate::store::{CacheStore, KeyExpiry, KeyTtl, ScoredMember, StoreCommands};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
enum Value {
    Raw(Vec<u8>),
    List(VecDeque<String>),
    Hash(HashMap<String, String>),
    Set(HashSet<String>),
    SortedSet(Vec<(String, f64)>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Raw(_) => "string",
            Value::List(_) => "list",
            Value::Hash(_) => "hash",
            Value::Set(_) => "set",
            Value::SortedSet(_) => "zset",
        }
    }

    /// Collections vanish when their last element is removed.
    fn is_empty_collection(&self) -> bool {
        match self {
            Value::Raw(_) => false,
            Value::List(l) => l.is_empty(),
            Value::Hash(h) => h.is_empty(),
            Value::Set(s) => s.is_empty(),
            Value::SortedSet(z) => z.is_empty(),
        }
    }
}

#[derive(Clone, Debug)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Entry {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

fn wrong_type(key: &str, value: &Value) -> Error {
    Error::WrongTypeError(format!("key \"{}\" holds a {}", key, value.kind()))
}

/// Normalize an inclusive `start..=stop` range with negative indices
/// counting from the tail. Returns `None` for empty results.
fn range_bounds(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = len as i64;
    let mut start = if start < 0 { len + start } else { start };
    let mut stop = if stop < 0 { len + stop } else { stop };
    if start < 0 {
        start = 0;
    }
    if stop >= len {
        stop = len - 1;
    }
    if start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}

/// Glob match supporting `*` (any run) and `?` (any single character).
fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            // Backtrack: let the last * absorb one more character
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

/// In-memory backend over a concurrent map.
///
/// Cloning is cheap and clones share the same underlying map, mirroring
/// how pooled network backends behave.
///
/// # Example
///
/// ```
/// use store_kit::{backend::InMemoryBackend, CacheStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> store_kit::Result<()> {
/// let backend = InMemoryBackend::new();
/// backend.write("k", b"v".to_vec()).await?;
/// assert_eq!(backend.read("k").await?, Some(b"v".to_vec()));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    entries: Arc<DashMap<String, Entry>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        InMemoryBackend {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Number of entries currently held, expired ones included until they
    /// are touched.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.clear();
        warn!("⚠ In-memory store cleared");
    }

    fn purge_if_expired(&self, key: &str) {
        let expired = self.entries.get(key).is_some_and(|e| e.is_expired());
        if expired {
            self.entries.remove(key);
            debug!("✗ expired key {} purged", key);
        }
    }

    fn drop_if_empty(&self, key: &str) {
        let empty = self
            .entries
            .get(key)
            .is_some_and(|e| e.value.is_empty_collection());
        if empty {
            self.entries.remove(key);
        }
    }
}

impl CacheStore for InMemoryBackend {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.purge_if_expired(key);
        match self.entries.get(key) {
            Some(entry) => match &entry.value {
                Value::Raw(bytes) => Ok(Some(bytes.clone())),
                other => Err(wrong_type(key, other)),
            },
            None => Ok(None),
        }
    }

    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        // A plain write overwrites any kind of entry and clears its TTL
        self.entries
            .insert(key.to_string(), Entry::new(Value::Raw(bytes)));
        Ok(())
    }
}

impl KeyExpiry for InMemoryBackend {
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.purge_if_expired(key);
        match self.entries.get_mut(key) {
            Some(mut entry) => {
                // Durations past the Instant range never fire
                entry.expires_at = Instant::now().checked_add(ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        self.purge_if_expired(key);
        match self.entries.get(key) {
            Some(entry) => match entry.expires_at {
                Some(at) => Ok(KeyTtl::Expires(at.saturating_duration_since(Instant::now()))),
                None => Ok(KeyTtl::Persistent),
            },
            None => Ok(KeyTtl::Missing),
        }
    }

    async fn persist(&self, key: &str) -> Result<bool> {
        self.purge_if_expired(key);
        match self.entries.get_mut(key) {
            Some(mut entry) if entry.expires_at.is_some() => {
                entry.expires_at = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl StoreCommands for InMemoryBackend {
    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut out = Vec::new();
        for item in self.entries.iter() {
            if !item.is_expired() && glob_match(pattern, item.key()) {
                out.push(item.key().clone());
            }
        }
        Ok(out)
    }

    async fn scan(&self, cursor: u64, pattern: &str, _count: i64) -> Result<(u64, Vec<String>)> {
        // The whole keyspace fits in one batch here; iteration always
        // completes on the first call.
        if cursor != 0 {
            return Ok((0, Vec::new()));
        }
        let keys = self.keys(pattern).await?;
        Ok((0, keys))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn del(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.entries.remove(*key);
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.purge_if_expired(key);
        Ok(self.entries.contains_key(key))
    }

    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.read(key).await
    }

    async fn mget(&self, keys: &[&str]) -> Result<Vec<Option<String>>> {
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            self.purge_if_expired(key);
            let value = self.entries.get(*key).and_then(|entry| match &entry.value {
                Value::Raw(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            });
            out.push(value);
        }
        Ok(out)
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        self.purge_if_expired(key);
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Raw(b"0".to_vec())));
        match &mut entry.value {
            Value::Raw(bytes) => {
                let current: i64 = std::str::from_utf8(bytes)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| {
                        Error::BackendError(format!("key \"{}\" does not hold an integer", key))
                    })?;
                let next = current.checked_add(delta).ok_or_else(|| {
                    Error::BackendError(format!(
                        "increment or decrement of key \"{}\" would overflow",
                        key
                    ))
                })?;
                *bytes = next.to_string().into_bytes();
                Ok(next)
            }
            other => Err(wrong_type(key, other)),
        }
    }

    async fn decr_by(&self, key: &str, delta: i64) -> Result<i64> {
        let negated = delta.checked_neg().ok_or_else(|| {
            Error::BackendError(format!(
                "increment or decrement of key \"{}\" would overflow",
                key
            ))
        })?;
        self.incr_by(key, negated).await
    }

    async fn rpush(&self, key: &str, values: &[&str]) -> Result<i64> {
        self.purge_if_expired(key);
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::List(VecDeque::new())));
        match &mut entry.value {
            Value::List(list) => {
                list.extend(values.iter().map(|v| v.to_string()));
                Ok(list.len() as i64)
            }
            other => Err(wrong_type(key, other)),
        }
    }

    async fn lpush(&self, key: &str, value: &str) -> Result<i64> {
        self.purge_if_expired(key);
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::List(VecDeque::new())));
        match &mut entry.value {
            Value::List(list) => {
                list.push_front(value.to_string());
                Ok(list.len() as i64)
            }
            other => Err(wrong_type(key, other)),
        }
    }

    async fn lpop(&self, key: &str) -> Result<Option<String>> {
        self.purge_if_expired(key);
        let popped = match self.entries.get_mut(key) {
            Some(mut entry) => match &mut entry.value {
                Value::List(list) => list.pop_front(),
                other => return Err(wrong_type(key, other)),
            },
            None => None,
        };
        self.drop_if_empty(key);
        Ok(popped)
    }

    async fn lrem(&self, key: &str, count: i64, value: &str) -> Result<i64> {
        self.purge_if_expired(key);
        let removed = match self.entries.get_mut(key) {
            Some(mut entry) => match &mut entry.value {
                Value::List(list) => {
                    let mut removed = 0i64;
                    if count >= 0 {
                        let limit = if count == 0 { u64::MAX } else { count as u64 };
                        let mut kept = VecDeque::with_capacity(list.len());
                        for item in list.drain(..) {
                            if item == value && (removed as u64) < limit {
                                removed += 1;
                            } else {
                                kept.push_back(item);
                            }
                        }
                        *list = kept;
                    } else {
                        let limit = count.unsigned_abs();
                        let mut kept = VecDeque::with_capacity(list.len());
                        for item in list.drain(..).rev() {
                            if item == value && (removed as u64) < limit {
                                removed += 1;
                            } else {
                                kept.push_front(item);
                            }
                        }
                        *list = kept;
                    }
                    removed
                }
                other => return Err(wrong_type(key, other)),
            },
            None => 0,
        };
        self.drop_if_empty(key);
        Ok(removed)
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        self.purge_if_expired(key);
        match self.entries.get(key) {
            Some(entry) => match &entry.value {
                Value::List(list) => Ok(match range_bounds(list.len(), start, stop) {
                    Some((lo, hi)) => list.iter().skip(lo).take(hi - lo + 1).cloned().collect(),
                    None => Vec::new(),
                }),
                other => Err(wrong_type(key, other)),
            },
            None => Ok(Vec::new()),
        }
    }

    async fn llen(&self, key: &str) -> Result<i64> {
        self.purge_if_expired(key);
        match self.entries.get(key) {
            Some(entry) => match &entry.value {
                Value::List(list) => Ok(list.len() as i64),
                other => Err(wrong_type(key, other)),
            },
            None => Ok(0),
        }
    }

    async fn lindex(&self, key: &str, index: i64) -> Result<Option<String>> {
        self.purge_if_expired(key);
        match self.entries.get(key) {
            Some(entry) => match &entry.value {
                Value::List(list) => {
                    let len = list.len() as i64;
                    let idx = if index < 0 { len + index } else { index };
                    if idx < 0 || idx >= len {
                        Ok(None)
                    } else {
                        Ok(list.get(idx as usize).cloned())
                    }
                }
                other => Err(wrong_type(key, other)),
            },
            None => Ok(None),
        }
    }

    async fn lset(&self, key: &str, index: i64, value: &str) -> Result<()> {
        self.purge_if_expired(key);
        match self.entries.get_mut(key) {
            Some(mut entry) => match &mut entry.value {
                Value::List(list) => {
                    let len = list.len() as i64;
                    let idx = if index < 0 { len + index } else { index };
                    if idx < 0 || idx >= len {
                        return Err(Error::BackendError(format!(
                            "index {} out of range for key \"{}\"",
                            index, key
                        )));
                    }
                    list[idx as usize] = value.to_string();
                    Ok(())
                }
                other => Err(wrong_type(key, other)),
            },
            None => Err(Error::BackendError(format!("no such key \"{}\"", key))),
        }
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<bool> {
        self.purge_if_expired(key);
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Hash(HashMap::new())));
        match &mut entry.value {
            Value::Hash(hash) => Ok(hash.insert(field.to_string(), value.to_string()).is_none()),
            other => Err(wrong_type(key, other)),
        }
    }

    async fn hset_multiple(&self, key: &str, fields: &[(&str, &str)]) -> Result<()> {
        for (field, value) in fields {
            self.hset(key, field, value).await?;
        }
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        self.purge_if_expired(key);
        match self.entries.get(key) {
            Some(entry) => match &entry.value {
                Value::Hash(hash) => Ok(hash.get(field).cloned()),
                other => Err(wrong_type(key, other)),
            },
            None => Ok(None),
        }
    }

    async fn hlen(&self, key: &str) -> Result<i64> {
        self.purge_if_expired(key);
        match self.entries.get(key) {
            Some(entry) => match &entry.value {
                Value::Hash(hash) => Ok(hash.len() as i64),
                other => Err(wrong_type(key, other)),
            },
            None => Ok(0),
        }
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<bool> {
        self.purge_if_expired(key);
        let removed = match self.entries.get_mut(key) {
            Some(mut entry) => match &mut entry.value {
                Value::Hash(hash) => hash.remove(field).is_some(),
                other => return Err(wrong_type(key, other)),
            },
            None => false,
        };
        self.drop_if_empty(key);
        Ok(removed)
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool> {
        Ok(self.hget(key, field).await?.is_some())
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        self.purge_if_expired(key);
        match self.entries.get(key) {
            Some(entry) => match &entry.value {
                Value::Hash(hash) => Ok(hash.clone()),
                other => Err(wrong_type(key, other)),
            },
            None => Ok(HashMap::new()),
        }
    }

    async fn sadd(&self, key: &str, members: &[&str]) -> Result<i64> {
        self.purge_if_expired(key);
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Set(HashSet::new())));
        match &mut entry.value {
            Value::Set(set) => {
                let mut added = 0;
                for member in members {
                    if set.insert(member.to_string()) {
                        added += 1;
                    }
                }
                Ok(added)
            }
            other => Err(wrong_type(key, other)),
        }
    }

    async fn srem(&self, key: &str, members: &[&str]) -> Result<i64> {
        self.purge_if_expired(key);
        let removed = match self.entries.get_mut(key) {
            Some(mut entry) => match &mut entry.value {
                Value::Set(set) => {
                    let mut removed = 0;
                    for member in members {
                        if set.remove(*member) {
                            removed += 1;
                        }
                    }
                    removed
                }
                other => return Err(wrong_type(key, other)),
            },
            None => 0,
        };
        self.drop_if_empty(key);
        Ok(removed)
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        self.purge_if_expired(key);
        match self.entries.get(key) {
            Some(entry) => match &entry.value {
                Value::Set(set) => Ok(set.contains(member)),
                other => Err(wrong_type(key, other)),
            },
            None => Ok(false),
        }
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        self.purge_if_expired(key);
        match self.entries.get(key) {
            Some(entry) => match &entry.value {
                Value::Set(set) => Ok(set.iter().cloned().collect()),
                other => Err(wrong_type(key, other)),
            },
            None => Ok(Vec::new()),
        }
    }

    async fn scard(&self, key: &str) -> Result<i64> {
        self.purge_if_expired(key);
        match self.entries.get(key) {
            Some(entry) => match &entry.value {
                Value::Set(set) => Ok(set.len() as i64),
                other => Err(wrong_type(key, other)),
            },
            None => Ok(0),
        }
    }

    async fn srandmember(&self, key: &str) -> Result<Option<String>> {
        self.purge_if_expired(key);
        match self.entries.get(key) {
            Some(entry) => match &entry.value {
                // Hash iteration order is arbitrary, which is random enough
                Value::Set(set) => Ok(set.iter().next().cloned()),
                other => Err(wrong_type(key, other)),
            },
            None => Ok(None),
        }
    }

    async fn zadd(&self, key: &str, members: &[ScoredMember]) -> Result<i64> {
        self.purge_if_expired(key);
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::SortedSet(Vec::new())));
        match &mut entry.value {
            Value::SortedSet(zset) => {
                let mut added = 0;
                for m in members {
                    match zset.iter_mut().find(|(name, _)| name == &m.member) {
                        Some(existing) => existing.1 = m.score,
                        None => {
                            zset.push((m.member.clone(), m.score));
                            added += 1;
                        }
                    }
                }
                zset.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
                Ok(added)
            }
            other => Err(wrong_type(key, other)),
        }
    }

    async fn zrange_withscores(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<ScoredMember>> {
        self.purge_if_expired(key);
        match self.entries.get(key) {
            Some(entry) => match &entry.value {
                Value::SortedSet(zset) => Ok(match range_bounds(zset.len(), start, stop) {
                    Some((lo, hi)) => zset[lo..=hi]
                        .iter()
                        .map(|(member, score)| ScoredMember::new(member.clone(), *score))
                        .collect(),
                    None => Vec::new(),
                }),
                other => Err(wrong_type(key, other)),
            },
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_read_write_round_trip() {
        let backend = InMemoryBackend::new();
        backend
            .write("k", b"hello".to_vec())
            .await
            .expect("Failed to write");
        assert_eq!(
            backend.read("k").await.expect("Failed to read"),
            Some(b"hello".to_vec())
        );
        assert_eq!(backend.read("absent").await.expect("Failed to read"), None);
    }

    #[tokio::test]
    async fn test_read_wrong_type() {
        let backend = InMemoryBackend::new();
        backend
            .rpush("jobs", &["a"])
            .await
            .expect("Failed to rpush");
        let err = backend.read("jobs").await.unwrap_err();
        assert!(matches!(err, Error::WrongTypeError(_)));
    }

    #[tokio::test]
    async fn test_write_overwrites_other_kinds_and_clears_ttl() {
        let backend = InMemoryBackend::new();
        backend.sadd("k", &["m"]).await.expect("Failed to sadd");
        backend
            .expire("k", Duration::from_secs(100))
            .await
            .expect("Failed to expire");

        backend
            .write("k", b"plain".to_vec())
            .await
            .expect("Failed to write");
        assert_eq!(
            backend.read("k").await.expect("Failed to read"),
            Some(b"plain".to_vec())
        );
        assert_eq!(
            backend.ttl("k").await.expect("Failed to ttl"),
            KeyTtl::Persistent
        );
    }

    #[tokio::test]
    async fn test_expiry_lifecycle() {
        let backend = InMemoryBackend::new();

        assert!(!backend
            .expire("absent", Duration::from_secs(1))
            .await
            .expect("Failed to expire"));
        assert_eq!(
            backend.ttl("absent").await.expect("Failed to ttl"),
            KeyTtl::Missing
        );

        backend.write("k", b"v".to_vec()).await.expect("Failed to write");
        assert_eq!(
            backend.ttl("k").await.expect("Failed to ttl"),
            KeyTtl::Persistent
        );
        assert!(!backend.persist("k").await.expect("Failed to persist"));

        assert!(backend
            .expire("k", Duration::from_secs(100))
            .await
            .expect("Failed to expire"));
        assert!(matches!(
            backend.ttl("k").await.expect("Failed to ttl"),
            KeyTtl::Expires(_)
        ));

        assert!(backend.persist("k").await.expect("Failed to persist"));
        assert_eq!(
            backend.ttl("k").await.expect("Failed to ttl"),
            KeyTtl::Persistent
        );
    }

    #[tokio::test]
    async fn test_expired_key_is_gone() {
        let backend = InMemoryBackend::new();
        backend.write("k", b"v".to_vec()).await.expect("Failed to write");
        backend
            .expire("k", Duration::from_millis(10))
            .await
            .expect("Failed to expire");

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(backend.read("k").await.expect("Failed to read"), None);
        assert!(!backend.exists("k").await.expect("Failed to exists"));
        assert_eq!(
            backend.ttl("k").await.expect("Failed to ttl"),
            KeyTtl::Missing
        );
    }

    #[tokio::test]
    async fn test_counters() {
        let backend = InMemoryBackend::new();
        assert_eq!(backend.incr_by("n", 5).await.expect("Failed to incr"), 5);
        assert_eq!(backend.incr_by("n", 2).await.expect("Failed to incr"), 7);
        assert_eq!(backend.decr_by("n", 3).await.expect("Failed to decr"), 4);

        backend.write("s", b"abc".to_vec()).await.expect("Failed to write");
        let err = backend.incr_by("s", 1).await.unwrap_err();
        assert!(matches!(err, Error::BackendError(_)));
    }

    #[tokio::test]
    async fn test_counter_overflow_is_an_error() {
        let backend = InMemoryBackend::new();
        backend
            .incr_by("n", i64::MAX)
            .await
            .expect("Failed to incr");

        let err = backend.incr_by("n", 1).await.unwrap_err();
        assert!(matches!(err, Error::BackendError(_)));

        // The stored value is untouched by the failed increment
        assert_eq!(
            backend.incr_by("n", 0).await.expect("Failed to incr"),
            i64::MAX
        );

        // i64::MIN has no positive counterpart to add
        let err = backend.decr_by("m", i64::MIN).await.unwrap_err();
        assert!(matches!(err, Error::BackendError(_)));
        assert_eq!(backend.decr_by("m", 1).await.expect("Failed to decr"), -1);
    }

    #[tokio::test]
    async fn test_expire_with_enormous_duration_never_fires() {
        let backend = InMemoryBackend::new();
        backend.write("k", b"v".to_vec()).await.expect("Failed to write");

        assert!(backend
            .expire("k", Duration::MAX)
            .await
            .expect("Failed to expire"));
        assert_eq!(
            backend.read("k").await.expect("Failed to read"),
            Some(b"v".to_vec())
        );
    }

    #[tokio::test]
    async fn test_list_push_pop_range() {
        let backend = InMemoryBackend::new();
        assert_eq!(
            backend.rpush("l", &["b", "c"]).await.expect("Failed to rpush"),
            2
        );
        assert_eq!(backend.lpush("l", "a").await.expect("Failed to lpush"), 3);
        assert_eq!(backend.llen("l").await.expect("Failed to llen"), 3);

        assert_eq!(
            backend.lrange("l", 0, -1).await.expect("Failed to lrange"),
            vec!["a", "b", "c"]
        );
        assert_eq!(
            backend.lrange("l", 1, 1).await.expect("Failed to lrange"),
            vec!["b"]
        );
        assert_eq!(
            backend.lrange("l", -2, -1).await.expect("Failed to lrange"),
            vec!["b", "c"]
        );
        assert!(backend
            .lrange("l", 5, 9)
            .await
            .expect("Failed to lrange")
            .is_empty());

        assert_eq!(
            backend.lindex("l", 0).await.expect("Failed to lindex"),
            Some("a".to_string())
        );
        assert_eq!(
            backend.lindex("l", -1).await.expect("Failed to lindex"),
            Some("c".to_string())
        );
        assert_eq!(backend.lindex("l", 9).await.expect("Failed to lindex"), None);

        assert_eq!(
            backend.lpop("l").await.expect("Failed to lpop"),
            Some("a".to_string())
        );
        assert_eq!(backend.llen("l").await.expect("Failed to llen"), 2);
    }

    #[tokio::test]
    async fn test_list_drains_away_when_empty() {
        let backend = InMemoryBackend::new();
        backend.rpush("l", &["only"]).await.expect("Failed to rpush");
        assert_eq!(
            backend.lpop("l").await.expect("Failed to lpop"),
            Some("only".to_string())
        );
        assert!(!backend.exists("l").await.expect("Failed to exists"));
        assert_eq!(backend.lpop("l").await.expect("Failed to lpop"), None);
    }

    #[tokio::test]
    async fn test_lrem_count_semantics() {
        let backend = InMemoryBackend::new();
        let items = ["x", "a", "x", "b", "x"];

        backend.rpush("l", &items).await.expect("Failed to rpush");
        assert_eq!(backend.lrem("l", 2, "x").await.expect("Failed to lrem"), 2);
        assert_eq!(
            backend.lrange("l", 0, -1).await.expect("Failed to lrange"),
            vec!["a", "b", "x"]
        );

        backend.delete("l").await.expect("Failed to delete");
        backend.rpush("l", &items).await.expect("Failed to rpush");
        assert_eq!(backend.lrem("l", -2, "x").await.expect("Failed to lrem"), 2);
        assert_eq!(
            backend.lrange("l", 0, -1).await.expect("Failed to lrange"),
            vec!["x", "a", "b"]
        );

        backend.delete("l").await.expect("Failed to delete");
        backend.rpush("l", &items).await.expect("Failed to rpush");
        assert_eq!(backend.lrem("l", 0, "x").await.expect("Failed to lrem"), 3);
        assert_eq!(
            backend.lrange("l", 0, -1).await.expect("Failed to lrange"),
            vec!["a", "b"]
        );
    }

    #[tokio::test]
    async fn test_lset() {
        let backend = InMemoryBackend::new();
        backend.rpush("l", &["a", "b"]).await.expect("Failed to rpush");

        backend.lset("l", 1, "B").await.expect("Failed to lset");
        assert_eq!(
            backend.lindex("l", 1).await.expect("Failed to lindex"),
            Some("B".to_string())
        );

        assert!(backend.lset("l", 5, "x").await.is_err());
        assert!(backend.lset("absent", 0, "x").await.is_err());
    }

    #[tokio::test]
    async fn test_hash_field_operations() {
        let backend = InMemoryBackend::new();

        assert!(backend.hset("h", "f1", "v1").await.expect("Failed to hset"));
        assert!(!backend.hset("h", "f1", "v2").await.expect("Failed to hset"));
        backend
            .hset_multiple("h", &[("f2", "v2"), ("f3", "v3")])
            .await
            .expect("Failed to hset_multiple");

        assert_eq!(
            backend.hget("h", "f1").await.expect("Failed to hget"),
            Some("v2".to_string())
        );
        assert_eq!(backend.hget("h", "nope").await.expect("Failed to hget"), None);
        assert_eq!(backend.hlen("h").await.expect("Failed to hlen"), 3);
        assert!(backend.hexists("h", "f2").await.expect("Failed to hexists"));

        let all = backend.hgetall("h").await.expect("Failed to hgetall");
        assert_eq!(all.len(), 3);
        assert_eq!(all.get("f3"), Some(&"v3".to_string()));

        assert!(backend.hdel("h", "f1").await.expect("Failed to hdel"));
        assert!(!backend.hdel("h", "f1").await.expect("Failed to hdel"));
        assert_eq!(backend.hlen("h").await.expect("Failed to hlen"), 2);
    }

    #[tokio::test]
    async fn test_set_membership() {
        let backend = InMemoryBackend::new();

        assert_eq!(
            backend.sadd("s", &["a", "b", "a"]).await.expect("Failed to sadd"),
            2
        );
        assert!(backend.sismember("s", "a").await.expect("Failed to sismember"));
        assert!(!backend.sismember("s", "z").await.expect("Failed to sismember"));
        assert_eq!(backend.scard("s").await.expect("Failed to scard"), 2);

        let mut members = backend.smembers("s").await.expect("Failed to smembers");
        members.sort();
        assert_eq!(members, vec!["a", "b"]);

        let random = backend
            .srandmember("s")
            .await
            .expect("Failed to srandmember")
            .expect("Set is empty");
        assert!(random == "a" || random == "b");

        assert_eq!(
            backend.srem("s", &["a", "z"]).await.expect("Failed to srem"),
            1
        );
        assert_eq!(backend.scard("s").await.expect("Failed to scard"), 1);
    }

    #[tokio::test]
    async fn test_zset_ordering_and_update() {
        let backend = InMemoryBackend::new();

        let added = backend
            .zadd(
                "z",
                &[
                    ScoredMember::new("c", 3.0),
                    ScoredMember::new("a", 1.0),
                    ScoredMember::new("b", 2.0),
                ],
            )
            .await
            .expect("Failed to zadd");
        assert_eq!(added, 3);

        let all = backend
            .zrange_withscores("z", 0, -1)
            .await
            .expect("Failed to zrange");
        let names: Vec<&str> = all.iter().map(|m| m.member.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        // Re-scoring an existing member re-ranks it without adding
        let added = backend
            .zadd("z", &[ScoredMember::new("a", 9.0)])
            .await
            .expect("Failed to zadd");
        assert_eq!(added, 0);

        let all = backend
            .zrange_withscores("z", 0, -1)
            .await
            .expect("Failed to zrange");
        let names: Vec<&str> = all.iter().map(|m| m.member.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);

        let top = backend
            .zrange_withscores("z", -1, -1)
            .await
            .expect("Failed to zrange");
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].member, "a");
        assert_eq!(top[0].score, 9.0);
    }

    #[tokio::test]
    async fn test_keys_and_scan() {
        let backend = InMemoryBackend::new();
        backend.write("user:1", b"a".to_vec()).await.expect("write");
        backend.write("user:2", b"b".to_vec()).await.expect("write");
        backend.write("job:1", b"c".to_vec()).await.expect("write");

        let mut keys = backend.keys("user:*").await.expect("Failed to keys");
        keys.sort();
        assert_eq!(keys, vec!["user:1", "user:2"]);

        let (cursor, mut keys) = backend.scan(0, "*:1", 10).await.expect("Failed to scan");
        assert_eq!(cursor, 0);
        keys.sort();
        assert_eq!(keys, vec!["job:1", "user:1"]);

        let (cursor, keys) = backend.scan(7, "*", 10).await.expect("Failed to scan");
        assert_eq!(cursor, 0);
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn test_mget_mixed() {
        let backend = InMemoryBackend::new();
        backend.write("a", b"1".to_vec()).await.expect("write");
        backend.write("c", b"3".to_vec()).await.expect("write");
        backend.rpush("list", &["x"]).await.expect("rpush");

        let values = backend
            .mget(&["a", "missing", "c", "list"])
            .await
            .expect("Failed to mget");
        assert_eq!(
            values,
            vec![Some("1".to_string()), None, Some("3".to_string()), None]
        );
    }

    #[tokio::test]
    async fn test_del_multiple() {
        let backend = InMemoryBackend::new();
        backend.write("a", b"1".to_vec()).await.expect("write");
        backend.write("b", b"2".to_vec()).await.expect("write");

        backend.del(&["a", "b", "absent"]).await.expect("Failed to del");
        assert!(backend.is_empty());
    }

    #[test]
    fn test_glob_match_basics() {
        assert!(glob_match("*", "anything"));
        assert!(glob_match("user:*", "user:42"));
        assert!(!glob_match("user:*", "job:42"));
        assert!(glob_match("u?er:1", "user:1"));
        assert!(!glob_match("u?er:1", "ur:1"));
        assert!(glob_match("*:1", "user:1"));
        assert!(glob_match("", ""));
        assert!(!glob_match("", "x"));
        assert!(glob_match("a*b*c", "a-xx-b-yy-c"));
        assert!(!glob_match("a*b*c", "a-xx-c"));
    }

    #[test]
    fn test_range_bounds() {
        assert_eq!(range_bounds(3, 0, -1), Some((0, 2)));
        assert_eq!(range_bounds(3, 1, 1), Some((1, 1)));
        assert_eq!(range_bounds(3, -2, -1), Some((1, 2)));
        assert_eq!(range_bounds(3, 5, 9), None);
        assert_eq!(range_bounds(3, 2, 1), None);
        assert_eq!(range_bounds(0, 0, -1), None);
        assert_eq!(range_bounds(3, -9, 0), Some((0, 0)));
    }

    proptest! {
        #[test]
        fn prop_star_matches_any_suffix(prefix in "[a-z]{0,8}", rest in "[a-z]{0,8}") {
            let pattern = format!("{}*", prefix);
            let text = format!("{}{}", prefix, rest);
            prop_assert!(glob_match(&pattern, &text));
        }

        #[test]
        fn prop_literal_pattern_matches_only_itself(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
            prop_assert!(glob_match(&a, &a));
            prop_assert_eq!(glob_match(&a, &b), a == b);
        }
    }
}
