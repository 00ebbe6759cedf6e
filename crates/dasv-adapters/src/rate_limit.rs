//! Shared token-bucket rate limiting for adapters
//!
//! One [`RateLimiter`] is shared (via `Arc`) by every adapter that draws on
//! the same provider budget, across all concurrently running subjects.

use crate::{AdapterError, AdapterResponse, SourceAdapter};
use async_trait::async_trait;
use dasv_domain::{AdapterHealth, FieldRequest, SubjectId};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

/// Shared token-bucket budget as written in a fixture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Bucket size; also the burst allowance
    pub capacity: u32,
    /// Tokens added per second
    pub refill_per_sec: f64,
}

impl RateLimitConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("rate_limit.capacity must be greater than 0".to_string());
        }
        if !(self.refill_per_sec.is_finite() && self.refill_per_sec >= 0.0) {
            return Err(format!(
                "rate_limit.refill_per_sec must be a finite value >= 0, got {}",
                self.refill_per_sec
            ));
        }
        Ok(())
    }

    /// Build the limiter every adapter in the fixture shares
    pub fn build(&self) -> Arc<RateLimiter> {
        Arc::new(RateLimiter::new(self.capacity, self.refill_per_sec))
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket shared between adapters
#[derive(Debug)]
pub struct RateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Create a full bucket holding `capacity` tokens, refilled continuously
    pub fn new(capacity: u32, refill_per_sec: f64) -> Self {
        let capacity = f64::from(capacity.max(1));
        Self {
            capacity,
            refill_per_sec: refill_per_sec.max(0.0),
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Bucket> {
        // Bucket state is always consistent; ignore poisoning.
        self.bucket.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        bucket.last_refill = now;
    }

    /// Take one token if available
    pub fn try_acquire(&self) -> bool {
        let mut bucket = self.lock();
        self.refill(&mut bucket);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Time until the next token is available, `None` if it never will be
    fn wait_time(&self) -> Option<Duration> {
        let mut bucket = self.lock();
        self.refill(&mut bucket);
        if bucket.tokens >= 1.0 {
            return Some(Duration::ZERO);
        }
        if self.refill_per_sec <= 0.0 {
            return None;
        }
        // Too slow to represent as a Duration: treat as never refilling
        Duration::try_from_secs_f64((1.0 - bucket.tokens) / self.refill_per_sec).ok()
    }

    /// Wait for one token
    ///
    /// # Errors
    /// Returns [`AdapterError::RateLimited`] if the bucket is empty and never refills
    pub async fn acquire(&self, adapter: &str) -> Result<(), AdapterError> {
        loop {
            if self.try_acquire() {
                return Ok(());
            }
            let wait = self
                .wait_time()
                .ok_or_else(|| AdapterError::RateLimited(adapter.to_string()))?;
            debug!(adapter, wait_ms = wait.as_millis() as u64, "Waiting for rate-limit token");
            tokio::time::sleep(wait).await;
        }
    }

    /// Tokens currently available
    pub fn available(&self) -> f64 {
        let mut bucket = self.lock();
        self.refill(&mut bucket);
        bucket.tokens
    }
}

/// Adapter wrapper that takes one token per fetch
pub struct RateLimited<A> {
    inner: A,
    limiter: Arc<RateLimiter>,
}

impl<A: SourceAdapter> RateLimited<A> {
    /// Wrap an adapter behind a shared limiter
    pub fn new(inner: A, limiter: Arc<RateLimiter>) -> Self {
        Self { inner, limiter }
    }

    /// Wrapped adapter
    pub fn inner(&self) -> &A {
        &self.inner
    }
}

#[async_trait]
impl<A: SourceAdapter> SourceAdapter for RateLimited<A> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn reliability(&self) -> f64 {
        self.inner.reliability()
    }

    fn health(&self) -> AdapterHealth {
        self.inner.health()
    }

    async fn fetch(
        &self,
        subject: &SubjectId,
        fields: &[FieldRequest],
    ) -> Result<AdapterResponse, AdapterError> {
        self.limiter.acquire(self.inner.name()).await?;
        self.inner.fetch(subject, fields).await
    }
}
