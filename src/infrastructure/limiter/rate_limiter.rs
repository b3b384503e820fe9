use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use async_trait::async_trait;
use dashmap::DashMap;
use deadpool_redis::Pool as RedisPool;
use parking_lot::Mutex;

/// Admission check keyed by an arbitrary string (client IP for the contact form).
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Records an attempt and returns whether it is allowed.
    async fn check(&self, key: &str) -> bool;

    /// Drops expired bookkeeping. Returns the number of evicted keys.
    fn sweep(&self) -> usize {
        0
    }
}

/// A counting window that starts with the first request for a key.
#[derive(Debug)]
struct FixedWindow {
    count: u64,
    resets_at: Instant,
}

impl FixedWindow {
    fn new(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            resets_at: now + window,
        }
    }

    /// Blocked attempts are not counted.
    fn allow(&mut self, now: Instant, window: Duration, limit: u64) -> bool {
        if self.resets_at <= now {
            *self = FixedWindow::new(now, window);
            return true;
        }
        if self.count >= limit {
            return false;
        }
        self.count += 1;
        true
    }
}

/// Process-local fixed window limiter. Each instance counts separately, so
/// multi-instance deployments should use [`RedisFixedWindowLimiter`].
#[derive(Clone)]
pub struct FixedWindowLimiter {
    map: Arc<DashMap<String, Arc<Mutex<FixedWindow>>>>,
    limit: u64,
    window: Duration,
}

impl FixedWindowLimiter {
    pub fn new(limit: u64, window: Duration) -> Self {
        Self {
            map: Arc::new(DashMap::new()),
            limit,
            window,
        }
    }

    pub fn tracked_keys(&self) -> usize {
        self.map.len()
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        if let Some(existing) = self.map.get(key) {
            let window = existing.clone();
            drop(existing);
            return window.lock().allow(now, self.window, self.limit);
        }

        match self.map.entry(key.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                let window = entry.get().clone();
                drop(entry);
                window.lock().allow(now, self.window, self.limit)
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(Arc::new(Mutex::new(FixedWindow::new(now, self.window))));
                self.limit > 0
            }
        }
    }

    fn sweep_at(&self, now: Instant) -> usize {
        let before = self.map.len();
        self.map.retain(|_, window| window.lock().resets_at > now);
        before.saturating_sub(self.map.len())
    }
}

#[async_trait]
impl RateLimiter for FixedWindowLimiter {
    async fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }
}

/// Fixed window shared through Redis. Redis failures let the request through.
#[derive(Clone)]
pub struct RedisFixedWindowLimiter {
    pool: RedisPool,
    prefix: String,
    limit: u64,
    window: Duration,
}

impl RedisFixedWindowLimiter {
    pub fn new(pool: RedisPool, prefix: &str, limit: u64, window: Duration) -> Self {
        Self {
            pool,
            prefix: prefix.to_string(),
            limit,
            window,
        }
    }

    async fn increment(&self, key: &str) -> Result<u64, String> {
        let mut conn = self.pool.get().await.map_err(|e| e.to_string())?;
        let redis_key = format!("{}:{}", self.prefix, key);

        let (count,): (u64,) = window_pipeline(&redis_key, self.window)
            .query_async(&mut conn)
            .await
            .map_err(|e| e.to_string())?;
        Ok(count)
    }
}

/// `SET key 0 EX window NX` then `INCR` in one MULTI block, so the counter
/// never exists without its expiry.
fn window_pipeline(redis_key: &str, window: Duration) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .cmd("SET")
        .arg(redis_key)
        .arg(0)
        .arg("EX")
        .arg(window.as_secs().max(1))
        .arg("NX")
        .ignore()
        .cmd("INCR")
        .arg(redis_key);
    pipe
}

#[async_trait]
impl RateLimiter for RedisFixedWindowLimiter {
    async fn check(&self, key: &str) -> bool {
        match self.increment(key).await {
            Ok(count) => count <= self.limit,
            Err(e) => {
                tracing::warn!(error = %e, "Redis rate limiter unavailable, allowing request");
                true
            }
        }
    }
}
