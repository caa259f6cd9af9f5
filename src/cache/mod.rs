//! Short-lived in-memory response cache.
//!
//! A fixed set of namespaces, each an independent LRU store with its own
//! capacity and time-to-live. Keys are `namespace:sha1(identifier)`, so
//! identical identifiers in different namespaces can never collide;
//! collisions within a namespace would require a SHA-1 collision and are
//! not specially handled. Values are stored as serialized JSON.
//!
//! Expiry is checked lazily on read; a full namespace evicts its
//! least-recently-used entry on write. State lives in process memory
//! only; callers must treat the cache purely as a latency optimization,
//! never as a source of truth.

use lru::LruCache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha1::{Digest, Sha1};
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Search,
    Lyrics,
    Stream,
    Recommendations,
}

impl Namespace {
    const ALL: [Namespace; 4] = [
        Namespace::Search,
        Namespace::Lyrics,
        Namespace::Stream,
        Namespace::Recommendations,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Namespace::Search => "search",
            Namespace::Lyrics => "lyrics",
            Namespace::Stream => "stream",
            Namespace::Recommendations => "recommendations",
        }
    }

    /// (default TTL, max entry count). Stream entries are short-lived
    /// because upstream signed URLs expire.
    fn policy(self) -> (Duration, usize) {
        match self {
            Namespace::Search => (Duration::from_secs(86_400), 500),
            Namespace::Lyrics => (Duration::from_secs(86_400), 500),
            Namespace::Stream => (Duration::from_secs(7_200), 100),
            Namespace::Recommendations => (Duration::from_secs(3_600), 10),
        }
    }
}

struct Entry {
    body: String,
    expires_at: Instant,
}

struct Store {
    entries: LruCache<String, Entry>,
    ttl: Duration,
}

impl Store {
    fn new(ns: Namespace) -> Self {
        let (ttl, capacity) = ns.policy();
        Self {
            entries: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            ttl,
        }
    }
}

pub struct TimedCache {
    stores: [Mutex<Store>; 4],
}

impl TimedCache {
    pub fn new() -> Self {
        Self {
            stores: std::array::from_fn(|i| Mutex::new(Store::new(Namespace::ALL[i]))),
        }
    }

    fn store(&self, ns: Namespace) -> MutexGuard<'_, Store> {
        // a poisoned store only means a panic mid-operation; the data is
        // still a valid cache
        self.stores[ns as usize]
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn key(ns: Namespace, identifier: &str) -> String {
        format!(
            "{}:{}",
            ns.as_str(),
            hex::encode(Sha1::digest(identifier.as_bytes()))
        )
    }

    pub fn get<T: DeserializeOwned>(&self, ns: Namespace, identifier: &str) -> Option<T> {
        let key = Self::key(ns, identifier);
        let mut store = self.store(ns);
        match store.entries.get(&key) {
            None => return None,
            Some(entry) if entry.expires_at > Instant::now() => {
                return serde_json::from_str(&entry.body).ok();
            }
            Some(_) => {}
        }
        store.entries.pop(&key);
        None
    }

    /// Write with the namespace default TTL. A write fully replaces any
    /// prior value for the same key.
    pub fn set<T: Serialize>(&self, ns: Namespace, identifier: &str, value: &T) {
        let ttl = self.store(ns).ttl;
        self.set_with_ttl(ns, identifier, value, ttl);
    }

    pub fn set_with_ttl<T: Serialize>(
        &self,
        ns: Namespace,
        identifier: &str,
        value: &T,
        ttl: Duration,
    ) {
        let Ok(body) = serde_json::to_string(value) else {
            return;
        };
        let entry = Entry {
            body,
            expires_at: Instant::now() + ttl,
        };
        self.store(ns).entries.put(Self::key(ns, identifier), entry);
    }
}

impl Default for TimedCache {
    fn default() -> Self {
        Self::new()
    }
}
