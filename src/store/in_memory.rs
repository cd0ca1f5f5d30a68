use super::Store;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

struct Entry {
    value: serde_json::Value,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(exp) => now < exp,
            None => true,
        }
    }
}

/// Default `Store` backend: a sharded concurrent map with lazy expiry on
/// read. No background sweep thread — an expired entry is simply treated
/// as absent the next time anything touches it, per the spec's "TTLs
/// never resurrect values" invariant.
#[derive(Default)]
pub struct InMemoryStore {
    entries: DashMap<String, Entry>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Store for InMemoryStore {
    fn set(&self, key: &str, value: serde_json::Value, ttl: Option<i64>) {
        let now = crate::time::now();
        let expires_at = ttl.map(|secs| now + chrono::Duration::seconds(secs));
        self.entries
            .insert(key.to_string(), Entry { value, expires_at });
    }

    fn get(&self, key: &str) -> Option<serde_json::Value> {
        let now = crate::time::now();
        // Resolve liveness into a local and let the shard read-guard drop
        // at the end of this statement before `remove` takes the write
        // lock on the same shard — holding the `Ref` across `remove`
        // deadlocks `parking_lot`'s shard lock.
        let live = self.entries.get(key).map(|entry| (entry.is_live(now), entry.value.clone()));
        match live {
            Some((true, value)) => Some(value),
            Some((false, _)) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set_if_absent(&self, key: &str, ttl: i64) -> bool {
        let now = crate::time::now();
        match self.entries.entry(key.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(mut occ) => {
                if occ.get().is_live(now) {
                    false
                } else {
                    occ.insert(Entry {
                        value: serde_json::Value::Bool(true),
                        expires_at: Some(now + chrono::Duration::seconds(ttl)),
                    });
                    true
                }
            }
            dashmap::mapref::entry::Entry::Vacant(vac) => {
                vac.insert(Entry {
                    value: serde_json::Value::Bool(true),
                    expires_at: Some(now + chrono::Duration::seconds(ttl)),
                });
                true
            }
        }
    }

    fn delete(&self, key: &str) {
        self.entries.remove(key);
    }
}
