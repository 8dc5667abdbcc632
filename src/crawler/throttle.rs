//! Adaptive pause between crawl items
//!
//! After every item the driver sleeps for a multiple of how long the item
//! took, so a slow server gets proportionally more breathing room.

use crate::config::CrawlConfig;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    /// Sleep as a multiple of the measured duration
    factor: f64,

    /// Durations below this are rounded up before multiplying
    floor: Duration,
}

impl Throttle {
    pub fn new(factor: f64, floor: Duration) -> Self {
        Self { factor, floor }
    }

    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new(
            config.throttle_factor,
            Duration::from_secs_f64(config.min_fetch_secs.max(0.0)),
        )
    }

    /// Calculates the pause after an item that took `elapsed`
    ///
    /// # Returns
    ///
    /// `factor × max(elapsed, floor)`
    pub fn delay_for(&self, elapsed: Duration) -> Duration {
        if self.factor <= 0.0 {
            return Duration::ZERO;
        }
        elapsed.max(self.floor).mul_f64(self.factor)
    }

    /// Sleeps for the pause owed to an item started at `started`
    pub async fn pause(&self, started: Instant) {
        let delay = self.delay_for(started.elapsed());
        if !delay.is_zero() {
            tracing::trace!("Throttling for {:.2}s", delay.as_secs_f64());
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(1.4, Duration::from_secs(2))
    }
}
