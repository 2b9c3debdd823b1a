//! Time source and fixed-interval request gate.
//!
//! All waits of the fetch client (politeness delay, backoff, rate-limit
//! cooldown) go through a [`Clock`], so tests can run against the
//! `VirtualClock` of the `test-util` feature without real delays.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

/// Monotonic time source with an async sleep.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock was created.
    fn now(&self) -> Duration;

    async fn sleep(&self, duration: Duration);
}

/// Wall-clock time backed by tokio timers.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Simulated clock: `sleep` advances time instantly and is recorded.
#[cfg(any(test, feature = "test-util"))]
#[derive(Default)]
pub struct VirtualClock {
    inner: Mutex<VirtualInner>,
}

#[cfg(any(test, feature = "test-util"))]
#[derive(Default)]
struct VirtualInner {
    now: Duration,
    sleeps: Vec<Duration>,
}

#[cfg(any(test, feature = "test-util"))]
impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward without recording a sleep (time spent "in flight").
    pub fn advance(&self, duration: Duration) {
        self.inner.lock().now += duration;
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.inner.lock().sleeps.clone()
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        self.inner.lock().now
    }

    async fn sleep(&self, duration: Duration) {
        let mut inner = self.inner.lock();
        inner.now += duration;
        inner.sleeps.push(duration);
    }
}

/// Keeps at least `interval` between the end of one request and the start
/// of the next.
pub struct IntervalGate {
    interval: Duration,
    last_release: Mutex<Option<Duration>>,
}

impl IntervalGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_release: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the next request may start.
    pub async fn wait(&self, clock: &dyn Clock) {
        let remaining = {
            let last = *self.last_release.lock();
            match last {
                Some(at) => (at + self.interval).saturating_sub(clock.now()),
                None => Duration::ZERO,
            }
        };
        if !remaining.is_zero() {
            debug!(wait_ms = remaining.as_millis() as u64, "Politeness delay");
            clock.sleep(remaining).await;
        }
    }

    /// Record that a request just finished, whatever its outcome.
    pub fn release(&self, clock: &dyn Clock) {
        *self.last_release.lock() = Some(clock.now());
    }
}
