use std::sync::atomic::{AtomicU64, Ordering};

/// Shared request budget; workers claim one unit per request.
pub(super) struct RequestBudget {
    total: u64,
    claimed: AtomicU64,
}

impl RequestBudget {
    pub(super) const fn new(total: u64) -> Self {
        Self {
            total,
            claimed: AtomicU64::new(0),
        }
    }

    /// Claims one request. Never lets the claimed count pass the total, no
    /// matter how many workers race for the last unit.
    pub(super) fn try_claim(&self) -> bool {
        loop {
            let current = self.claimed.load(Ordering::Acquire);
            if current >= self.total {
                return false;
            }
            let Some(next) = current.checked_add(1) else {
                return false;
            };
            if self
                .claimed
                .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return true;
            }
        }
    }

    pub(super) fn claimed(&self) -> u64 {
        self.claimed.load(Ordering::Acquire)
    }

    pub(super) fn is_exhausted(&self) -> bool {
        self.claimed() >= self.total
    }
}
