//! Injectable time source
//!
//! Every timestamp and simulated delay in an execution goes through a
//! [`Clock`]. [`SystemClock`] uses wall time and tokio timers;
//! [`ManualClock`] keeps virtual time that only moves when something sleeps
//! on it or a test advances it.
//!
//! Virtual time behaves like a paused tokio timer: a sleeper registers its
//! deadline and waits; time jumps to the earliest registered deadline, never
//! past it. Concurrent sleepers therefore overlap instead of adding up, and a
//! case's elapsed virtual time is exactly the sum of its own sleeps.

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Time source for executions
#[async_trait::async_trait]
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Wait for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by tokio timers
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait::async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock driven by its sleepers
#[derive(Debug)]
pub struct ManualClock {
    state: Mutex<VirtualTime>,
}

#[derive(Debug)]
struct VirtualTime {
    now: DateTime<Utc>,
    /// Pending deadlines and how many sleepers wait on each
    deadlines: BTreeMap<DateTime<Utc>, usize>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().unwrap_or_default())
    }
}

impl ManualClock {
    /// Clock starting at `start`
    #[inline]
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            state: Mutex::new(VirtualTime {
                now: start,
                deadlines: BTreeMap::new(),
            }),
        }
    }

    /// Move time forward by `duration`
    pub fn advance(&self, duration: Duration) {
        let mut state = self.state.lock();
        if let Some(next) = offset(state.now, duration) {
            state.now = next;
        }
    }

    /// Jump to `instant`
    pub fn set(&self, instant: DateTime<Utc>) {
        self.state.lock().now = instant;
    }

    /// Number of sleepers currently waiting
    #[must_use]
    pub fn pending_sleepers(&self) -> usize {
        self.state.lock().deadlines.values().sum()
    }

    fn release(&self, deadline: DateTime<Utc>) {
        let mut state = self.state.lock();
        if let Some(count) = state.deadlines.get_mut(&deadline) {
            *count -= 1;
            if *count == 0 {
                state.deadlines.remove(&deadline);
            }
        }
    }
}

fn offset(from: DateTime<Utc>, duration: Duration) -> Option<DateTime<Utc>> {
    chrono::Duration::from_std(duration)
        .ok()
        .and_then(|delta| from.checked_add_signed(delta))
}

/// Drops a registered deadline, also when the sleep is cancelled
struct Registration<'a> {
    clock: &'a ManualClock,
    deadline: DateTime<Utc>,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.clock.release(self.deadline);
    }
}

#[async_trait::async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.state.lock().now
    }

    async fn sleep(&self, duration: Duration) {
        let deadline = {
            let mut state = self.state.lock();
            let Some(deadline) = offset(state.now, duration) else {
                return;
            };
            *state.deadlines.entry(deadline).or_default() += 1;
            deadline
        };
        let _registration = Registration {
            clock: self,
            deadline,
        };

        loop {
            // let every runnable peer register its own deadline first
            tokio::task::yield_now().await;

            let mut state = self.state.lock();
            if state.now >= deadline {
                return;
            }
            if state.deadlines.keys().next() == Some(&deadline) {
                state.now = deadline;
                return;
            }
        }
    }
}
