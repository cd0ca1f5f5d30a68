//! Keyed snapshot store with per-key TTL and atomic set-if-absent, the
//! shared state layer ingestors write into and analytics/the router read
//! from. Grounded in the host project's preference for `dashmap` +
//! `parking_lot` over locking a single giant map (see `scrapers::polymarket_book_store`).

mod in_memory;

pub use in_memory::InMemoryStore;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// Pluggable backend for the keyed snapshot store. The in-process
/// `InMemoryStore` is the default and is sufficient for tests; a remote
/// cache is an allowed alternate backend behind this same trait.
pub trait Store: Send + Sync {
    /// Store `value` under `key`. `ttl` is wall-clock seconds; `None` means
    /// no expiry.
    fn set(&self, key: &str, value: serde_json::Value, ttl: Option<i64>);

    /// Read the value stored under `key`, or `None` if absent or expired.
    /// A read past TTL must behave identically to the key never having
    /// been set.
    fn get(&self, key: &str) -> Option<serde_json::Value>;

    /// Atomically set `key` to `true` iff it is currently absent (or
    /// expired), arming a TTL of `ttl` seconds. Returns whether this call
    /// performed the set.
    fn set_if_absent(&self, key: &str, ttl: i64) -> bool;

    /// Returns `true` and arms a `cooldown`-second TTL on `name` iff no
    /// alert of that name has fired within the window. A single name
    /// fires at most once per cooldown.
    fn check_throttle(&self, name: &str, cooldown: i64) -> bool {
        self.set_if_absent(&format!("throttle:{name}"), cooldown)
    }

    /// Remove a key outright, regardless of TTL.
    fn delete(&self, key: &str);

    fn now(&self) -> DateTime<Utc> {
        crate::time::now()
    }
}

/// Convenience typed accessors layered over the type-erased `Store` trait.
pub trait StoreExt: Store {
    fn set_typed<T: Serialize>(&self, key: &str, value: &T, ttl: Option<i64>) {
        match serde_json::to_value(value) {
            Ok(v) => self.set(key, v, ttl),
            Err(e) => tracing::warn!(key, error = %e, "failed to serialize snapshot value"),
        }
    }

    fn get_typed<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| serde_json::from_value(v).ok())
    }
}

impl<S: Store + ?Sized> StoreExt for S {}
