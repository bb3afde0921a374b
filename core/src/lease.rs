//! Lease based admission control.
//!
//! A [Lease] starts [LeaseWindow::Unbounded] and allows everything. The first refresh installs a
//! bounded window: a deadline plus a count of requests which may be sent before it. A refresh
//! always replaces the window, the quota left over from the previous one is discarded.
//!
//! Expiry is evaluated lazily on each [Lease::allow], no timer is owned here.

use crate::error::LeaseDenial;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Upper bound for a deadline computed from a ttl, far enough to never be reached
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LeaseWindow {
    /// No lease was ever received, requests are not limited
    Unbounded,
    Bounded { deadline: Instant, remaining: u64 },
}

pub struct Lease {
    window: Mutex<LeaseWindow>,
}

impl Default for Lease {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Lease {
    #[inline]
    pub fn new() -> Self {
        Self { window: Mutex::new(LeaseWindow::Unbounded) }
    }

    /// Replace the window with `quota` requests allowed until `deadline`.
    #[inline]
    pub fn refresh(&self, deadline: Instant, quota: u64) {
        *self.window.lock() = LeaseWindow::Bounded { deadline, remaining: quota };
    }

    /// Like [Lease::refresh] with the deadline `ttl` from now, a huge `ttl` saturates.
    #[inline]
    pub fn refresh_ttl(&self, ttl: Duration, quota: u64) {
        let now = Instant::now();
        let deadline = now
            .checked_add(ttl)
            .or_else(|| now.checked_add(MAX_TTL))
            .unwrap_or(now);
        self.refresh(deadline, quota)
    }

    /// Consume one unit of quota, never blocks.
    #[inline]
    pub fn allow(&self) -> Result<(), LeaseDenial> {
        self.allow_at(Instant::now())
    }

    pub fn allow_at(&self, now: Instant) -> Result<(), LeaseDenial> {
        let mut guard = self.window.lock();
        match &mut *guard {
            LeaseWindow::Unbounded => Ok(()),
            LeaseWindow::Bounded { deadline, remaining } => {
                if now >= *deadline {
                    Err(LeaseDenial::Expired)
                } else if *remaining == 0 {
                    Err(LeaseDenial::Exhausted)
                } else {
                    *remaining -= 1;
                    Ok(())
                }
            }
        }
    }

    #[inline]
    pub fn window(&self) -> LeaseWindow {
        *self.window.lock()
    }

    #[inline]
    pub fn is_bounded(&self) -> bool {
        matches!(self.window(), LeaseWindow::Bounded { .. })
    }
}

impl std::fmt::Debug for Lease {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.window() {
            LeaseWindow::Unbounded => write!(f, "Lease(unbounded)"),
            LeaseWindow::Bounded { deadline, remaining } => {
                let left = deadline.saturating_duration_since(Instant::now());
                write!(f, "Lease(remaining={}, ttl_left={:?})", remaining, left)
            }
        }
    }
}
