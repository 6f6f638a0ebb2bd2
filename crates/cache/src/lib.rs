// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! The Palisade cache gateway.
//!
//! A uniform async key/value store, namespaced by the owning service.
//! Entries are held in a local in-memory tier and optionally distributed
//! via redis; expiry is the sole deletion mechanism.

use core::fmt::Display;
use core::time::Duration;
use std::collections::BTreeSet;
use std::hash::Hash;
use std::time::Instant;

use moka::future::Cache as LocalCache;
use redis::{AsyncCommands, RedisError, ToRedisArgs};
use serde::de::DeserializeOwned;
use serde::Serialize;
use snafu::Snafu;

type RedisConnection = redis::aio::ConnectionManager;

/// Errors of the cache gateway
#[derive(Debug, Snafu)]
pub enum CacheError {
    /// The distributed tier could not be reached; transient, callers may retry
    #[snafu(display("cache backend unavailable: {source}"), context(false))]
    Unavailable {
        /// Underlying transport error
        source: RedisError,
    },

    /// A value could not be encoded or decoded
    ///
    /// Values are stored as JSON on the distributed tier; rule
    /// configurations and records embed arbitrary JSON documents that a
    /// non-self-describing codec cannot round-trip.
    #[snafu(display("failed to serialise cache value: {source}"), context(false))]
    Serde {
        /// Underlying codec error
        source: serde_json::Error,
    },
}

/// A default specialized Result type for cache operations
pub type Result<T, E = CacheError> = std::result::Result<T, E>;

/// Service-namespaced cache which stores entries both locally and, when
/// configured, distributed using redis
pub struct Cache<K, V> {
    namespace: String,
    local: LocalCache<K, LocalEntry<V>>,
    redis: Option<RedisConfig>,
}

struct RedisConfig {
    redis: RedisConnection,
    ttl: Duration,
}

impl<K, V> Cache<K, V>
where
    K: Display + Hash + Eq + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Create a memory-only cache for the given service namespace
    pub fn new(namespace: impl Into<String>, ttl: Duration) -> Self {
        Self {
            namespace: namespace.into(),
            local: LocalCache::builder().time_to_live(ttl).build(),
            redis: None,
        }
    }

    /// Add a distributed redis tier
    pub fn with_redis(self, redis: RedisConnection, ttl: Duration) -> Self {
        Self {
            redis: Some(RedisConfig { redis, ttl }),
            ..self
        }
    }

    /// The namespace this cache stores its entries under
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Return the longest duration an entry might live for
    pub fn longest_ttl(&self) -> Duration {
        let local_ttl = self
            .local
            .policy()
            .time_to_live()
            .expect("local always has a ttl");

        if let Some(redis) = &self.redis {
            redis.ttl.max(local_ttl)
        } else {
            local_ttl
        }
    }

    /// Fetch the value stored under `key`
    ///
    /// Returns `None` if the entry is absent or expired.
    pub async fn get(&self, key: &K) -> Result<Option<V>> {
        if let Some(entry) = self
            .local
            .get(key)
            .await
            .filter(|entry| entry.still_valid())
        {
            Ok(Some(entry.value))
        } else if let Some(RedisConfig { redis, .. }) = &self.redis {
            let v: Option<Vec<u8>> = redis
                .clone()
                .get(RedisCacheKey {
                    namespace: &self.namespace,
                    key,
                })
                .await?;

            if let Some(v) = v {
                let v = serde_json::from_slice(&v)?;

                Ok(Some(v))
            } else {
                Ok(None)
            }
        } else {
            Ok(None)
        }
    }

    /// Insert a key-value pair with the cache's default TTL
    pub async fn insert(&self, key: K, value: V) -> Result<()> {
        if let Some(RedisConfig { redis, ttl }) = &self.redis {
            redis
                .clone()
                .set_ex::<_, _, ()>(
                    RedisCacheKey {
                        namespace: &self.namespace,
                        key: &key,
                    },
                    serde_json::to_vec(&value)?,
                    ttl.as_secs(),
                )
                .await?;
        }

        self.local
            .insert(
                key,
                LocalEntry {
                    value,
                    expires_at: None,
                },
            )
            .await;

        Ok(())
    }

    /// Insert an entry with a custom TTL
    ///
    /// Note that TTLs larger than the configured one will be ignored
    pub async fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) -> Result<()> {
        if ttl >= self.longest_ttl() {
            return self.insert(key, value).await;
        }

        if let Some(RedisConfig { redis, .. }) = &self.redis {
            redis
                .clone()
                .set_ex::<_, _, ()>(
                    RedisCacheKey {
                        namespace: &self.namespace,
                        key: &key,
                    },
                    serde_json::to_vec(&value)?,
                    ttl.as_secs(),
                )
                .await?;
        }

        self.local
            .insert(
                key,
                LocalEntry {
                    value,
                    expires_at: Some(Instant::now() + ttl),
                },
            )
            .await;

        Ok(())
    }

    /// Enumerate the keys in this namespace starting with `prefix`
    ///
    /// Merges the local and distributed tiers; keys are returned in their
    /// `Display` form, deduplicated.
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = BTreeSet::new();

        for (key, entry) in self.local.iter() {
            if !entry.still_valid() {
                continue;
            }
            let key = key.to_string();
            if key.starts_with(prefix) {
                let _ = keys.insert(key);
            }
        }

        if let Some(RedisConfig { redis, .. }) = &self.redis {
            let namespace_prefix = format!("palisade-cache:{}:", self.namespace);
            let pattern = format!("{namespace_prefix}{prefix}*");

            let mut redis = redis.clone();
            let mut iter = redis.scan_match::<_, String>(pattern).await?;
            while let Some(key) = iter.next_item().await {
                let _ = keys.insert(
                    key.strip_prefix(&namespace_prefix)
                        .unwrap_or(&key)
                        .to_owned(),
                );
            }
        }

        Ok(keys.into_iter().collect())
    }
}

/// [`ToRedisArgs`] implementation for the cache-key
///
/// Combines the service namespace and the cache-key into a redis-key.
struct RedisCacheKey<'a, K> {
    namespace: &'a str,
    key: &'a K,
}

impl<K: Display> Display for RedisCacheKey<'_, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "palisade-cache:{}:{}", self.namespace, self.key)
    }
}

impl<D: Display> ToRedisArgs for RedisCacheKey<'_, D> {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + redis::RedisWrite,
    {
        out.write_arg_fmt(self)
    }
}

#[derive(Debug, Clone, Copy)]
struct LocalEntry<V> {
    value: V,
    /// Custom expiration value to work around moka's limitation to set a custom ttl for an entry
    expires_at: Option<Instant>,
}

impl<V> LocalEntry<V> {
    // Check if the custom ttl has expired
    fn still_valid(&self) -> bool {
        if let Some(exp) = self.expires_at {
            exp.saturating_duration_since(Instant::now()) > Duration::ZERO
        } else {
            true
        }
    }
}
