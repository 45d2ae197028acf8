//! Store backend implementations.
//!
//! Backends implement the capability traits from [`crate::store`]:
//! [`crate::CacheStore`] at minimum, plus [`crate::KeyExpiry`] and
//! [`crate::StoreCommands`] where the backing store supports them.

#[cfg(feature = "inmemory")]
mod inmemory;
#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryBackend;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use redis::{RedisBackend, RedisConfig};
