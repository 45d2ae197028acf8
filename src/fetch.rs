//! Cache-aside fetch coordinator - main entry point for fetch-or-compute.

use crate::error::{Error, Result};
use crate::payload::Payload;
use crate::store::CacheStore;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Where the value returned by [`CacheFetcher::fetch`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchSource {
    /// The value was already present in the store.
    Hit,
    /// The value was produced by the compute closure on this call.
    Computed,
}

/// Result of a fetch-or-compute call.
///
/// On the miss path the computed value is always delivered, even when
/// persisting it failed; `write_error` carries that failure so callers can
/// decide whether unpersisted results matter to them.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Textual form of the value.
    pub value: String,
    /// Hit or computed on this call.
    pub source: FetchSource,
    /// Error from the populate write, if the miss-path write failed.
    pub write_error: Option<Error>,
}

impl FetchOutcome {
    pub fn is_hit(&self) -> bool {
        self.source == FetchSource::Hit
    }

    pub fn into_value(self) -> String {
        self.value
    }
}

/// Cache-aside fetch coordinator.
///
/// Collapses the classic "check, compute, populate" dance into a single
/// call over any [`CacheStore`]. The coordinator holds no state between
/// calls and performs no synchronization: concurrent misses on one key
/// each invoke their own compute closure and each write their result,
/// last write wins at the store.
///
/// # Example
///
/// ```
/// use store_kit::{backend::InMemoryBackend, CacheFetcher, Payload};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> store_kit::Result<()> {
/// let fetcher = CacheFetcher::new(InMemoryBackend::new());
///
/// let out = fetcher
///     .fetch("greeting", || Ok(Payload::from("hello")))
///     .await?;
/// assert_eq!(out.value, "hello");
/// # Ok(())
/// # }
/// ```
pub struct CacheFetcher<S: CacheStore> {
    store: S,
}

impl<S: CacheStore> CacheFetcher<S> {
    /// Create a new fetcher over the given store.
    pub fn new(store: S) -> Self {
        CacheFetcher { store }
    }

    /// Return the cached value for `key`, or compute, persist, and return
    /// a fresh one.
    ///
    /// The contract, in order:
    ///
    /// 1. Read `key`. On a hit the stored textual value is returned
    ///    unchanged and `compute` is never invoked.
    /// 2. An absent key **and** any read failure are both treated as a
    ///    miss; read errors are logged and swallowed, never propagated.
    ///    Callers that must distinguish genuine misses from store failures
    ///    should use [`CacheFetcher::get`] instead.
    /// 3. On a miss, `compute` runs exactly once. Its error (typically a
    ///    [`Payload::json`] serialization failure) aborts the call.
    /// 4. The payload is written back with no expiration. A write failure
    ///    does not discard the value: it is returned in
    ///    [`FetchOutcome::write_error`] alongside the computed value.
    ///
    /// No retries, no locking, no single-flight de-duplication. Deadlines
    /// are the caller's to impose, e.g. with `tokio::time::timeout`.
    ///
    /// # Errors
    ///
    /// Returns `Err` only when `compute` itself fails; store errors on the
    /// read path are absorbed and store errors on the write path are
    /// reported through the outcome.
    pub async fn fetch<F>(&self, key: &str, compute: F) -> Result<FetchOutcome>
    where
        F: FnOnce() -> Result<Payload>,
    {
        match self.store.read(key).await {
            Ok(Some(bytes)) => {
                debug!("✓ fetch {} -> HIT", key);
                return Ok(FetchOutcome {
                    value: String::from_utf8_lossy(&bytes).into_owned(),
                    source: FetchSource::Hit,
                    write_error: None,
                });
            }
            Ok(None) => {
                debug!("✗ fetch {} -> MISS", key);
            }
            Err(e) => {
                // A failing read is indistinguishable from absence here.
                debug!("✗ fetch {} -> read failed, treating as miss: {}", key, e);
            }
        }

        let payload = compute()?;
        let value = payload.to_text().into_owned();

        let write_error = self.store.write(key, payload.into_bytes()).await.err();
        match &write_error {
            None => debug!("✓ fetch {} -> computed and stored", key),
            Some(e) => warn!("⚠ fetch {} -> computed but not stored: {}", key, e),
        }

        Ok(FetchOutcome {
            value,
            source: FetchSource::Computed,
            write_error,
        })
    }

    /// Like [`CacheFetcher::fetch`], for compute closures that produce a
    /// serializable value rather than a ready payload.
    pub async fn fetch_json<T, F>(&self, key: &str, compute: F) -> Result<FetchOutcome>
    where
        T: Serialize,
        F: FnOnce() -> T,
    {
        self.fetch(key, || Payload::json(&compute())).await
    }

    /// Textual value stored under `key`, or `None` if absent.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .store
            .read(key)
            .await?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Store a value under `key` with no expiration.
    pub async fn set(&self, key: &str, value: impl Into<Payload>) -> Result<()> {
        self.store.write(key, value.into().into_bytes()).await
    }

    /// JSON-encode a value and store it under `key`.
    ///
    /// # Errors
    /// Returns `Error::SerializationError` if encoding fails; nothing is
    /// written in that case.
    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let payload = Payload::json(value)?;
        self.store.write(key, payload.into_bytes()).await
    }

    /// Read the value under `key` and JSON-decode it into `T`.
    ///
    /// # Errors
    /// Returns `Error::DeserializationError` if the stored value does not
    /// decode into `T`.
    pub async fn unmarshal<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.read(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                Error::DeserializationError(format!("failed to decode key {}: {}", key, e))
            }),
            None => Ok(None),
        }
    }

    /// Reference to the underlying store, for extended commands.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable reference to the underlying store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}
