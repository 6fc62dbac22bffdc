//! Daily request quota
//!
//! Usage is persisted under [`QUOTA_KEY`] and reset lazily: the first read
//! at or after the stored reset time zeroes the counter and moves the reset
//! to the next UTC midnight.
//!
//! Requests reserve quota before dispatch and commit it once the backend
//! answers. A reservation dropped without committing (failed or abandoned
//! request) is released, so only completed requests are charged. A reset
//! clears outstanding reservations, and a reservation taken before the
//! reset is never charged to the new day.

use chrono::{DateTime, Utc};
use distill_core::classify::{classify, RawFailure};
use distill_core::clock::{next_utc_midnight, Clock};
use distill_core::error::Result;
use distill_core::models::RateLimitStatus;
use distill_store::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

/// Store key of the persisted quota state
pub const QUOTA_KEY: &str = "quota/state";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct QuotaState {
    used: u32,
    reset_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Counters {
    used: u32,
    /// Reserved by in-flight requests, not yet charged
    reserved: u32,
    reset_at: DateTime<Utc>,
}

impl Counters {
    fn reset_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if now < self.reset_at {
            return false;
        }
        tracing::info!(previous_used = self.used, "Daily quota reset");
        self.used = 0;
        self.reserved = 0;
        self.reset_at = next_utc_midnight(now);
        true
    }

    fn status(&self, daily_cap: u32) -> RateLimitStatus {
        RateLimitStatus { requests_used: self.used, daily_cap, reset_at: self.reset_at }
    }

    fn state(&self) -> QuotaState {
        QuotaState { used: self.used, reset_at: self.reset_at }
    }
}

/// Tracks requests against a daily cap.
///
/// Admission checks and counter updates happen under one lock, so concurrent
/// callers can never push usage past the cap.
pub struct QuotaTracker {
    daily_cap: u32,
    clock: Arc<dyn Clock>,
    store: Arc<dyn KeyValueStore>,
    counters: Mutex<Counters>,
    /// Serializes writes so the last write carries the latest counters
    persist: tokio::sync::Mutex<()>,
}

impl QuotaTracker {
    /// Load persisted usage, starting fresh if none is stored
    pub async fn load(
        daily_cap: u32,
        clock: Arc<dyn Clock>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        let now = clock.now();
        let stored = match store.get(QUOTA_KEY).await? {
            Some(raw) => match serde_json::from_str::<QuotaState>(&raw) {
                Ok(state) => Some(state),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable quota state: {}", e);
                    None
                }
            },
            None => None,
        };

        let mut counters = match stored {
            Some(state) => Counters { used: state.used, reserved: 0, reset_at: state.reset_at },
            None => Counters { used: 0, reserved: 0, reset_at: next_utc_midnight(now) },
        };
        counters.reset_if_due(now);

        tracing::debug!(used = counters.used, daily_cap, reset_at = %counters.reset_at, "Loaded quota");

        Ok(Self {
            daily_cap,
            clock,
            store,
            counters: Mutex::new(counters),
            persist: tokio::sync::Mutex::new(()),
        })
    }

    pub fn daily_cap(&self) -> u32 {
        self.daily_cap
    }

    /// Current usage, applying a due reset first
    pub fn status(&self) -> RateLimitStatus {
        let mut counters = self.counters();
        counters.reset_if_due(self.clock.now());
        counters.status(self.daily_cap)
    }

    /// Charge `n` requests immediately, or fail with `RateLimit` when they do
    /// not fit the remaining quota. A rejected call changes nothing.
    pub async fn try_consume(&self, n: u32) -> Result<RateLimitStatus> {
        let status = {
            let mut counters = self.counters();
            self.admit(&mut counters, n)?;
            counters.used += n;
            counters.status(self.daily_cap)
        };
        self.persist_latest().await;
        Ok(status)
    }

    /// Hold `n` requests of quota for an in-flight request
    pub fn reserve(self: &Arc<Self>, n: u32) -> Result<QuotaReservation> {
        let mut counters = self.counters();
        self.admit(&mut counters, n)?;
        counters.reserved += n;
        Ok(QuotaReservation { tracker: Arc::clone(self), held: n, period: counters.reset_at })
    }

    fn admit(&self, counters: &mut Counters, n: u32) -> Result<()> {
        counters.reset_if_due(self.clock.now());
        let committed = counters.used.saturating_add(counters.reserved);
        if committed.saturating_add(n) > self.daily_cap {
            tracing::warn!(
                used = counters.used,
                reserved = counters.reserved,
                requested = n,
                daily_cap = self.daily_cap,
                "Daily quota exhausted"
            );
            return Err(classify(RawFailure::QuotaExhausted { reset_at: counters.reset_at }));
        }
        Ok(())
    }

    /// Return a hold taken in the quota period ending at `period`.
    /// Holds from an earlier period were already cleared by the reset.
    fn release(&self, n: u32, period: DateTime<Utc>) {
        let mut counters = self.counters();
        counters.reset_if_due(self.clock.now());
        if counters.reset_at == period {
            counters.reserved = counters.reserved.saturating_sub(n);
        }
    }

    /// Write the current counters. Failures are logged; usage stays
    /// authoritative in memory for the rest of the process.
    async fn persist_latest(&self) {
        let _guard = self.persist.lock().await;
        let state = self.counters().state();

        let payload = match serde_json::to_string(&state) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to encode quota state: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.put(QUOTA_KEY, &payload).await {
            tracing::warn!(code = e.code(), "Failed to persist quota usage: {}", e);
        }
    }

    fn counters(&self) -> MutexGuard<'_, Counters> {
        // Counter updates cannot panic midway, so a poisoned lock still holds valid data
        self.counters.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Quota held for one in-flight request.
///
/// Dropping the reservation without calling [`commit`](Self::commit)
/// returns the quota.
#[must_use = "dropping a reservation releases its quota"]
pub struct QuotaReservation {
    tracker: Arc<QuotaTracker>,
    held: u32,
    /// Reset time of the period the hold was taken in
    period: DateTime<Utc>,
}

impl QuotaReservation {
    /// Charge the reserved requests and persist the new usage.
    ///
    /// A hold that outlived a daily reset is dropped instead of being
    /// charged to the new period.
    pub async fn commit(mut self) -> RateLimitStatus {
        let held = std::mem::take(&mut self.held);
        let (status, charged) = {
            let mut counters = self.tracker.counters();
            counters.reset_if_due(self.tracker.clock.now());
            let charged = counters.reset_at == self.period;
            if charged {
                counters.reserved = counters.reserved.saturating_sub(held);
                counters.used = counters.used.saturating_add(held);
            } else {
                tracing::debug!(held, "Dropping reservation from before the daily reset");
            }
            (counters.status(self.tracker.daily_cap), charged)
        };
        if charged {
            self.tracker.persist_latest().await;
        }
        status
    }
}

impl Drop for QuotaReservation {
    fn drop(&mut self) {
        if self.held > 0 {
            self.tracker.release(self.held, self.period);
        }
    }
}
