//! Profile sub-feed cache
//!
//! Caches the viewer-independent tweet lists behind a profile page
//! (tweets, replies, likes, retweets) for a bounded time window.
//!
//! Key format: v{VERSION}:profile:{feed}:{user_id}:{offset}:{limit}
//!
//! Entries are dropped early when the service observes the matching change
//! event (`invalidate_user`), or for every user at once (`invalidate_feed`).

mod local_backend;
mod redis_backend;

pub use local_backend::LocalCacheBackend;
pub use redis_backend::RedisCacheBackend;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{Page, TweetDetail};
use crate::metrics::PROFILE_CACHE_EVENTS;

/// Cache schema version - increment when changing key formats or payloads
pub const CACHE_VERSION: u32 = 1;

/// Default revalidation window (seconds)
pub const DEFAULT_TTL_SECS: u64 = 300;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Raw key/value storage with expiry
#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()>;

    /// Delete every key starting with `prefix`, returning how many were removed
    async fn delete_prefix(&self, prefix: &str) -> CacheResult<usize>;
}

/// The four cached profile sub-feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileFeed {
    Tweets,
    Replies,
    Likes,
    Retweets,
}

impl ProfileFeed {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileFeed::Tweets => "tweets",
            ProfileFeed::Replies => "replies",
            ProfileFeed::Likes => "likes",
            ProfileFeed::Retweets => "retweets",
        }
    }
}

pub struct CacheKey;

impl CacheKey {
    /// Format: v1:profile:{feed}:{user_id}:{offset}:{limit}
    pub fn profile_feed(feed: ProfileFeed, user_id: Uuid, page: Page) -> String {
        format!(
            "{}{}:{}",
            Self::user_prefix(feed, user_id),
            page.offset,
            page.limit
        )
    }

    /// Every page of one user's sub-feed
    pub fn user_prefix(feed: ProfileFeed, user_id: Uuid) -> String {
        format!("{}{}:", Self::feed_prefix(feed), user_id)
    }

    /// Every user's entries of one sub-feed
    pub fn feed_prefix(feed: ProfileFeed) -> String {
        format!("v{}:profile:{}:", CACHE_VERSION, feed.as_str())
    }
}

/// Time-boxed cache of profile sub-feeds.
///
/// Failures never reach callers: reads degrade to a miss and writes or
/// invalidations are logged.
#[derive(Clone)]
pub struct ProfileFeedCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl ProfileFeedCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    pub async fn get(
        &self,
        feed: ProfileFeed,
        user_id: Uuid,
        page: Page,
    ) -> Option<Vec<TweetDetail>> {
        let key = CacheKey::profile_feed(feed, user_id, page);

        match self.backend.get(&key).await {
            Ok(Some(data)) => match serde_json::from_str::<Vec<TweetDetail>>(&data) {
                Ok(tweets) => {
                    debug!(key = %key, "Profile cache HIT");
                    PROFILE_CACHE_EVENTS.with_label_values(&["hit"]).inc();
                    Some(tweets)
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Profile cache entry is corrupt");
                    PROFILE_CACHE_EVENTS.with_label_values(&["error"]).inc();
                    None
                }
            },
            Ok(None) => {
                debug!(key = %key, "Profile cache MISS");
                PROFILE_CACHE_EVENTS.with_label_values(&["miss"]).inc();
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Profile cache read failed");
                PROFILE_CACHE_EVENTS.with_label_values(&["error"]).inc();
                None
            }
        }
    }

    pub async fn put(&self, feed: ProfileFeed, user_id: Uuid, page: Page, tweets: &[TweetDetail]) {
        let key = CacheKey::profile_feed(feed, user_id, page);

        let data = match serde_json::to_string(tweets) {
            Ok(data) => data,
            Err(e) => {
                warn!(key = %key, error = %e, "Profile cache serialization failed");
                return;
            }
        };

        if let Err(e) = self.backend.set(&key, data, self.ttl).await {
            warn!(key = %key, error = %e, "Profile cache write failed");
            PROFILE_CACHE_EVENTS.with_label_values(&["error"]).inc();
        }
    }

    /// Drop every cached page of one user's sub-feed
    pub async fn invalidate_user(&self, feed: ProfileFeed, user_id: Uuid) {
        let prefix = CacheKey::user_prefix(feed, user_id);
        self.invalidate_prefix(&prefix).await;
    }

    /// Drop one sub-feed for every user
    pub async fn invalidate_feed(&self, feed: ProfileFeed) {
        let prefix = CacheKey::feed_prefix(feed);
        self.invalidate_prefix(&prefix).await;
    }

    async fn invalidate_prefix(&self, prefix: &str) {
        match self.backend.delete_prefix(prefix).await {
            Ok(removed) => {
                debug!(prefix = %prefix, removed, "Profile cache invalidated");
                PROFILE_CACHE_EVENTS
                    .with_label_values(&["invalidate"])
                    .inc();
            }
            Err(e) => {
                warn!(prefix = %prefix, error = %e, "Profile cache invalidation failed");
                PROFILE_CACHE_EVENTS.with_label_values(&["error"]).inc();
            }
        }
    }
}
