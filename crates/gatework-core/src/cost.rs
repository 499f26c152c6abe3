// crates/gatework-core/src/cost.rs
// ============================================================================
// Module: Cost Tracker
// Description: Accounts token/credit usage per run and enforces the
//              `max_tokens` budget.
// Purpose: Give the Router a single, monotonic source of truth for
//          "budget remaining" and flip into drain mode on overdraw rather
//          than panicking or silently clamping.
// Dependencies: std::sync::atomic
// ============================================================================

//! ## Overview
//! Budget is reserved optimistically at routing time (a [`Reservation`]
//! records the estimate the Router used to pick an adapter) but only
//! actually debited at [`CostTracker::settle`], against the adapter's
//! *actual* reported spend. A settle that would drive `remaining()`
//! negative is still applied — overdraws are permitted post hoc — and
//! flips the tracker into drain mode, after which the Router refuses to
//! route any step with a nonzero estimated cost.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use crate::error::CostError;

/// A routing-time reservation of budget against an adapter's estimated
/// cost. Carries no state of its own; it exists so [`CostTracker::settle`]
/// always takes one, keeping reserve/settle paired in the executor's
/// control flow.
#[derive(Debug, Clone, Copy)]
pub struct Reservation {
    estimate: u64,
}

impl Reservation {
    /// The estimate this reservation was made against.
    #[must_use]
    pub const fn estimate(self) -> u64 {
        self.estimate
    }
}

/// Tracks token/credit spend for a single run.
pub struct CostTracker {
    remaining: AtomicI64,
    draining: AtomicBool,
}

impl CostTracker {
    /// Creates a tracker with `max_tokens` remaining.
    #[must_use]
    pub fn new(max_tokens: u64) -> Self {
        let initial = i64::try_from(max_tokens).unwrap_or(i64::MAX);
        Self { remaining: AtomicI64::new(initial), draining: AtomicBool::new(false) }
    }

    /// Tokens remaining. Negative once in drain mode.
    #[must_use]
    pub fn remaining(&self) -> i64 {
        self.remaining.load(Ordering::SeqCst)
    }

    /// Whether a prior settle has driven this tracker negative.
    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::SeqCst)
    }

    /// Records a routing-time estimate. Does not debit the budget; only
    /// [`Self::settle`] does that, against the adapter's actual reported
    /// spend.
    #[must_use]
    pub const fn reserve(&self, estimate: u64) -> Reservation {
        Reservation { estimate }
    }

    /// Debits `actual` tokens against the reservation's estimate and
    /// returns the new `remaining()`. Always applies the debit, even if it
    /// drives `remaining()` negative; in that case the tracker enters
    /// drain mode.
    ///
    /// # Errors
    /// Returns [`CostError::Overflow`] if `actual` does not fit in an
    /// `i64`.
    pub fn settle(&self, _reservation: Reservation, actual: u64) -> Result<i64, CostError> {
        let delta = i64::try_from(actual).map_err(|_| CostError::Overflow { amount: actual })?;
        let new = self.remaining.fetch_sub(delta, Ordering::SeqCst) - delta;
        if new < 0 {
            self.draining.store(true, Ordering::SeqCst);
        }
        Ok(new)
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use super::CostTracker;

    #[test]
    fn settle_debits_actual_not_estimate() {
        let tracker = CostTracker::new(1000);
        let reservation = tracker.reserve(900);
        let remaining = tracker.settle(reservation, 0).expect("settles");
        assert_eq!(remaining, 1000);
        assert!(!tracker.is_draining());
    }

    #[test]
    fn overdraw_enters_drain_mode() {
        let tracker = CostTracker::new(1000);
        let reservation = tracker.reserve(600);
        let remaining = tracker.settle(reservation, 600).expect("settles");
        assert_eq!(remaining, 400);
        assert!(!tracker.is_draining());

        let reservation = tracker.reserve(600);
        let remaining = tracker.settle(reservation, 600).expect("settles");
        assert_eq!(remaining, -200);
        assert!(tracker.is_draining());
    }
}
