//! Token-bucket admission control shared by every dispatch path.
//!
//! Capacity and burst equal the configured requests-per-minute; the bucket
//! refills continuously at `rpm / 60` tokens per second and starts full.
//!
//! ```rust
//! use pprovider::Limiter;
//!
//! let limiter = Limiter::per_minute(2);
//! assert_eq!(limiter.limit(), Some(2));
//! assert!(limiter.try_acquire());
//! assert!(limiter.try_acquire());
//! assert!(!limiter.try_acquire());
//!
//! let open = Limiter::unbounded();
//! assert_eq!(open.limit(), None);
//! assert!(open.try_acquire());
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use pcommon::{Context, ContextError};
use tokio::time::Instant;

const MIN_WAIT: Duration = Duration::from_millis(1);

#[derive(Debug)]
pub struct Limiter {
    rpm: Option<u32>,
    bucket: Option<Mutex<Bucket>>,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    burst: f64,
    per_second: f64,
    refilled_at: Instant,
}

impl Bucket {
    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.refilled_at).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.per_second).min(self.burst);
        self.refilled_at = now;
    }

    /// Takes a token, or reports how long until one is available.
    fn reserve(&mut self, now: Instant) -> Result<(), Duration> {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            return Ok(());
        }

        let missing = 1.0 - self.tokens;
        let wait = Duration::from_secs_f64(missing / self.per_second);
        Err(wait.max(MIN_WAIT))
    }
}

impl Limiter {
    /// `0` is treated as `1`; use [`Limiter::unbounded`] to disable limiting.
    pub fn per_minute(rpm: u32) -> Self {
        let rpm = rpm.max(1);
        let burst = f64::from(rpm);

        Self {
            rpm: Some(rpm),
            bucket: Some(Mutex::new(Bucket {
                tokens: burst,
                burst,
                per_second: burst / 60.0,
                refilled_at: Instant::now(),
            })),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            rpm: None,
            bucket: None,
        }
    }

    /// A limiter at a new rate that keeps this one's unspent tokens, capped at
    /// the new burst. Leaving an unbounded limiter starts from a full bucket.
    pub fn rescaled(&self, requests_per_minute: Option<u32>) -> Self {
        let Some(rpm) = requests_per_minute else {
            return Self::unbounded();
        };

        let next = Self::per_minute(rpm);
        if let (Some(current), Some(bucket)) = (&self.bucket, &next.bucket) {
            let now = Instant::now();
            let mut current = lock(current);
            current.refill(now);

            let mut bucket = lock(bucket);
            bucket.tokens = current.tokens.min(bucket.burst);
            bucket.refilled_at = now;
        }
        next
    }

    /// `None` for an unbounded limiter.
    pub fn limit(&self) -> Option<u32> {
        self.rpm
    }

    pub fn is_unbounded(&self) -> bool {
        self.bucket.is_none()
    }

    pub fn try_acquire(&self) -> bool {
        match &self.bucket {
            Some(bucket) => lock(bucket).reserve(Instant::now()).is_ok(),
            None => true,
        }
    }

    /// Waits for one token. Fails without consuming a token if `ctx` ends first.
    pub async fn wait(&self, ctx: &Context) -> Result<(), ContextError> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        let Some(bucket) = &self.bucket else {
            return Ok(());
        };

        loop {
            let delay = match lock(bucket).reserve(Instant::now()) {
                Ok(()) => return Ok(()),
                Err(delay) => delay,
            };

            tokio::select! {
                biased;
                err = ctx.done() => return Err(err),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

fn lock(bucket: &Mutex<Bucket>) -> MutexGuard<'_, Bucket> {
    bucket.lock().unwrap_or_else(PoisonError::into_inner)
}
