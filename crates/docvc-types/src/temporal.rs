use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// When a version, change, or restore point was written.
///
/// Stamped by the engine's [`Clock`](crate::Clock), never by the store.
/// Fields compare in declaration order, so anchors sort by wall time, then
/// by the logical counter that separates writes within one millisecond,
/// then by node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TemporalAnchor {
    pub physical_ms: u64,
    pub logical: u32,
    pub node_id: u16,
}

impl TemporalAnchor {
    pub fn new(physical_ms: u64, logical: u32, node_id: u16) -> Self {
        Self {
            physical_ms,
            logical,
            node_id,
        }
    }

    /// Placeholder stamp for changes not yet attached to a version.
    pub const fn zero() -> Self {
        Self {
            physical_ms: 0,
            logical: 0,
            node_id: 0,
        }
    }

    /// Wall time elapsed from this anchor to `now`; zero if `now` is earlier.
    pub fn age_at(&self, now: &Self) -> Duration {
        Duration::from_millis(now.physical_ms.saturating_sub(self.physical_ms))
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.physical_ms as i64)
            .single()
            .unwrap_or_default()
    }
}

impl fmt::Display for TemporalAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.n{}", self.physical_ms, self.logical, self.node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_by_wall_time_then_counter_then_node() {
        let mut stamps = vec![
            TemporalAnchor::new(200, 0, 0),
            TemporalAnchor::new(100, 2, 0),
            TemporalAnchor::new(100, 1, 9),
            TemporalAnchor::new(100, 1, 2),
        ];
        stamps.sort();
        assert_eq!(
            stamps,
            vec![
                TemporalAnchor::new(100, 1, 2),
                TemporalAnchor::new(100, 1, 9),
                TemporalAnchor::new(100, 2, 0),
                TemporalAnchor::new(200, 0, 0),
            ]
        );
        assert!(TemporalAnchor::zero() < stamps[0]);
    }

    #[test]
    fn age_is_wall_time_and_saturates() {
        let written = TemporalAnchor::new(1_000, 4, 0);
        let later = TemporalAnchor::new(61_000, 0, 0);
        assert_eq!(written.age_at(&later), Duration::from_secs(60));
        assert_eq!(later.age_at(&written), Duration::ZERO);
    }

    #[test]
    fn renders_for_people_and_logs() {
        let anchor = TemporalAnchor::new(86_400_000, 3, 1);
        assert_eq!(anchor.to_datetime().to_rfc3339(), "1970-01-02T00:00:00+00:00");
        assert_eq!(anchor.to_string(), "86400000.3.n1");
    }
}
