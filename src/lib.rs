//! # store-kit
//!
//! A cache-aside store facade for Rust.
//!
//! ## Features
//!
//! - **Cache-aside fetch:** one call for "check, compute, populate"
//! - **Minimal core surface:** the fetch coordinator depends on a
//!   two-method [`CacheStore`] trait, nothing more
//! - **Extended commands:** lists, hashes, sets, sorted sets, counters,
//!   scanning, and key expiration through separate opt-in traits
//! - **Pluggable backends:** in-memory for tests and single-process use,
//!   Redis behind a connection pool for everything else
//! - **Explicit conversion:** values become bytes through [`Payload`],
//!   with fallible JSON encoding instead of silently dropped errors
//!
//! ## Quick Start
//!
//! ```
//! use store_kit::{backend::InMemoryBackend, CacheFetcher, Payload};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> store_kit::Result<()> {
//! let fetcher = CacheFetcher::new(InMemoryBackend::new());
//!
//! // First call misses, computes, and populates the store
//! let out = fetcher
//!     .fetch("report:today", || Ok(Payload::from("42 widgets")))
//!     .await?;
//! assert_eq!(out.value, "42 widgets");
//!
//! // Second call is served from the store; the closure never runs
//! let out = fetcher
//!     .fetch("report:today", || unreachable!())
//!     .await?;
//! assert!(out.is_hit());
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod error;
pub mod fetch;
pub mod payload;
pub mod store;

// Re-exports for convenience
pub use error::{Error, Result};
pub use fetch::{CacheFetcher, FetchOutcome, FetchSource};
pub use payload::Payload;
pub use store::{CacheStore, KeyExpiry, KeyTtl, ScoredMember, StoreCommands};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
