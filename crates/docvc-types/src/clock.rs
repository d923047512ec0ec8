//! Write-time clocks.
//!
//! The engine stamps every version, branch update, and restore point itself
//! instead of deferring to the store. [`HybridLogicalClock`] is the production
//! clock; [`ManualClock`] lets tests control wall-clock time (retention
//! windows, ordering).

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::temporal::TemporalAnchor;

/// A source of strictly increasing timestamps.
pub trait Clock: Send + Sync {
    /// The next timestamp. Must be strictly greater than every value this
    /// clock returned before.
    fn now(&self) -> TemporalAnchor;
}

/// Internal mutable state of the Hybrid Logical Clock.
struct HlcState {
    physical_ms: u64,
    logical: u32,
}

/// Hybrid Logical Clock for write ordering.
///
/// Combines wall-clock time with a logical counter to produce monotonically
/// increasing [`TemporalAnchor`] values, even when the wall clock stalls or
/// steps backwards.
///
/// - **Local event**: `physical = max(wall_clock, state.physical)`.
///   If physical advanced, `logical = 0`; otherwise `logical += 1`.
/// - **Receive**: `physical = max(wall_clock, state.physical, received.physical)`,
///   with logical strictly greater than both counters on a tie.
pub struct HybridLogicalClock {
    node_id: u16,
    state: Mutex<HlcState>,
}

impl HybridLogicalClock {
    /// Create a new HLC for the given node.
    pub fn new(node_id: u16) -> Self {
        Self {
            node_id,
            state: Mutex::new(HlcState {
                physical_ms: 0,
                logical: 0,
            }),
        }
    }

    /// Merge a timestamp observed elsewhere (e.g. a record loaded from the
    /// store), returning a timestamp strictly greater than both.
    pub fn update(&self, received: &TemporalAnchor) -> TemporalAnchor {
        let wall = wall_clock_ms();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let new_physical = wall.max(state.physical_ms).max(received.physical_ms);

        let new_logical = if new_physical > state.physical_ms
            && new_physical > received.physical_ms
        {
            0
        } else if new_physical == state.physical_ms && new_physical == received.physical_ms {
            state.logical.max(received.logical) + 1
        } else if new_physical == state.physical_ms {
            state.logical + 1
        } else {
            received.logical + 1
        };

        state.physical_ms = new_physical;
        state.logical = new_logical;

        TemporalAnchor::new(new_physical, new_logical, self.node_id)
    }

    /// The node identifier this clock was created with.
    pub fn node_id(&self) -> u16 {
        self.node_id
    }
}

impl Default for HybridLogicalClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for HybridLogicalClock {
    fn now(&self) -> TemporalAnchor {
        let wall = wall_clock_ms();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let new_physical = wall.max(state.physical_ms);
        let new_logical = if new_physical > state.physical_ms {
            0
        } else {
            state.logical + 1
        };

        state.physical_ms = new_physical;
        state.logical = new_logical;

        TemporalAnchor::new(new_physical, new_logical, self.node_id)
    }
}

/// A clock whose wall-clock component only moves when told to.
///
/// Each call to [`Clock::now`] still bumps the logical counter, so the
/// monotonicity contract holds.
pub struct ManualClock {
    state: Mutex<HlcState>,
}

impl ManualClock {
    /// Start the clock at `physical_ms`.
    pub fn new(physical_ms: u64) -> Self {
        Self {
            state: Mutex::new(HlcState {
                physical_ms,
                logical: 0,
            }),
        }
    }

    /// Move wall-clock time forward.
    pub fn advance(&self, by: Duration) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.physical_ms += by.as_millis() as u64;
        state.logical = 0;
    }

    /// The current wall-clock reading, without ticking.
    pub fn physical_ms(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .physical_ms
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TemporalAnchor {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.logical += 1;
        TemporalAnchor::new(state.physical_ms, state.logical, 0)
    }
}

fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn hlc_is_strictly_monotonic() {
        let clock = HybridLogicalClock::new(1);
        let mut last = clock.now();
        for _ in 0..1000 {
            let next = clock.now();
            assert!(next > last);
            last = next;
        }
    }

    #[test]
    fn hlc_update_moves_past_received() {
        let clock = HybridLogicalClock::new(1);
        let far_future = TemporalAnchor::new(u64::MAX / 2, 7, 9);
        let merged = clock.update(&far_future);
        assert!(merged > far_future);
        assert!(clock.now() > merged);
    }

    #[test]
    fn hlc_concurrent_ticks_are_unique() {
        let clock = Arc::new(HybridLogicalClock::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let clock = Arc::clone(&clock);
                thread::spawn(move || (0..250).map(|_| clock.now()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<TemporalAnchor> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total);
    }

    #[test]
    fn manual_clock_only_moves_when_advanced() {
        let clock = ManualClock::new(5_000);
        let a = clock.now();
        let b = clock.now();
        assert_eq!(a.physical_ms, 5_000);
        assert_eq!(b.physical_ms, 5_000);
        assert!(b > a);

        clock.advance(Duration::from_secs(2));
        let c = clock.now();
        assert_eq!(c.physical_ms, 7_000);
        assert!(c > b);
        assert_eq!(clock.physical_ms(), 7_000);
    }
}
