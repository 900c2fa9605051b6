//! Cancellable one-shot deadline timer for draft picks.
//!
//! A [`PickTimer`] runs at most one pending expiry at a time. Arming it
//! spawns a Tokio task that sleeps until the deadline and then runs the
//! caller's expiry future. Re-arming or cancelling aborts the pending task.
//!
//! # Generations
//!
//! Aborting a task does not help once it has already woken up and is
//! waiting for the draft lock. Every arming therefore gets a fresh
//! generation number which is passed to the expiry future. After taking
//! the lock, the owner calls [`PickTimer::claim_expiry`] with that number;
//! a stale or cancelled expiry is rejected there.
//!
//! ```ignore
//! let generation = timer.arm(budget, move |generation| async move {
//!     let mut state = shared.lock().await;
//!     if !state.timer.claim_expiry(generation) {
//!         return; // a pick, pause or completion got there first
//!     }
//!     state.auto_draft();
//! });
//! ```

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::trace;

/// Cancellable one-shot timer. One per draft room.
#[derive(Debug, Default)]
pub struct PickTimer {
    generation: u64,
    handle: Option<JoinHandle<()>>,
    /// Monotonic deadline, used for remaining-time math.
    deadline: Option<Instant>,
    /// Wall-clock deadline, reported to clients as unix seconds.
    wall_deadline: Option<DateTime<Utc>>,
}

impl PickTimer {
    /// Creates a disarmed timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer for `duration`, replacing any pending expiry.
    ///
    /// `on_expire` runs on its own task once the deadline passes, with the
    /// generation returned here. It must re-validate under the owner's
    /// lock with [`claim_expiry`](Self::claim_expiry).
    pub fn arm<F, Fut>(&mut self, duration: Duration, on_expire: F) -> u64
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        self.generation += 1;
        let generation = self.generation;
        let deadline = Instant::now() + duration;
        self.deadline = Some(deadline);
        self.wall_deadline = Utc::now().checked_add_signed(to_delta(duration));

        self.handle = Some(tokio::spawn(async move {
            time::sleep_until(deadline).await;
            trace!(generation, "pick timer fired");
            on_expire(generation).await;
        }));

        trace!(generation, budget_ms = duration.as_millis() as u64, "pick timer armed");
        generation
    }

    /// Disarms the timer. Returns `true` if an expiry was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline = None;
        self.wall_deadline = None;
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                trace!(generation = self.generation, "pick timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Accepts an expiry for `generation` if it is still the armed one.
    ///
    /// On success the timer is disarmed without aborting the calling task
    /// (which is the expiry task itself). Returns `false` for an expiry
    /// that was cancelled or superseded after it fired.
    pub fn claim_expiry(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.handle.is_none() {
            return false;
        }
        // Dropping a JoinHandle detaches; it does not abort.
        self.handle = None;
        self.deadline = None;
        self.wall_deadline = None;
        true
    }

    /// Time left before the pending expiry, or `None` when disarmed.
    /// Saturates at zero once the deadline has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// The pending deadline as unix seconds, or `None` when disarmed.
    pub fn deadline_unix(&self) -> Option<i64> {
        self.wall_deadline.map(|d| d.timestamp())
    }

    /// Whether an expiry is pending.
    pub fn is_armed(&self) -> bool {
        self.handle.is_some()
    }

    /// The generation of the most recent arming (0 if never armed).
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for PickTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}
