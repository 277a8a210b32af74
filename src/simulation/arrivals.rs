//! Poisson arrival streams
//!
//! One stream per approach. Inter-arrival gaps are drawn from an
//! exponential distribution with mean 1/lambda, making each stream an
//! independent renewal process; approaches never coordinate.

use log::debug;
use rand::Rng;

use super::types::Approach;

/// Seconds per hour, for vehicles-per-hour rate conversion
const SECONDS_PER_HOUR: f64 = 3600.0;

/// A Poisson arrival generator for one approach
#[derive(Debug, Clone)]
pub struct ArrivalStream {
    pub approach: Approach,
    /// Arrival rate lambda in vehicles per second
    rate_per_sec: f64,
    /// Next scheduled arrival instant; `f64::INFINITY` when the stream
    /// cannot fire (lambda <= 0)
    next_time: f64,
    pub active: bool,
}

impl ArrivalStream {
    pub fn new(approach: Approach, vph: f64) -> Self {
        Self {
            approach,
            rate_per_sec: vph / SECONDS_PER_HOUR,
            next_time: 0.0,
            active: true,
        }
    }

    pub fn rate_per_sec(&self) -> f64 {
        self.rate_per_sec
    }

    pub fn next_time(&self) -> f64 {
        self.next_time
    }

    /// Schedule the next arrival after `now`.
    ///
    /// Exponential inter-arrival gap: `-ln(1 - U) / lambda` with U uniform
    /// in [0, 1). A non-positive rate schedules the unreachable sentinel.
    pub fn schedule<R: Rng>(&mut self, now: f64, rng: &mut R) {
        if self.rate_per_sec <= 0.0 {
            self.next_time = f64::INFINITY;
            return;
        }
        let u: f64 = rng.random_range(0.0..1.0);
        let gap = -(1.0 - u).ln() / self.rate_per_sec;
        self.next_time = now + gap;
    }

    /// Recompute lambda from a vehicles-per-hour figure. A stream that had
    /// no arrival scheduled (was inactive) is rescheduled from `now`.
    pub fn update_rate<R: Rng>(&mut self, vph: f64, now: f64, rng: &mut R) {
        self.rate_per_sec = vph / SECONDS_PER_HOUR;
        if self.next_time.is_infinite() {
            self.schedule(now, rng);
        }
    }

    /// Returns true when the clock has reached the next scheduled arrival,
    /// consuming it and scheduling the following one. The caller builds and
    /// registers the vehicle.
    pub fn try_generate<R: Rng>(&mut self, now: f64, rng: &mut R) -> bool {
        if !self.active || now < self.next_time {
            return false;
        }
        debug!("arrival fired on {} at t={:.2}", self.approach, now);
        self.schedule(now, rng);
        true
    }
}
