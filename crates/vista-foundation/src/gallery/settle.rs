//! Turns per-frame scroll events into settled ones.

use web_time::{Duration, Instant};

use super::scroll_state::ScrollStateRecord;

/// Default quiet period before a scroll counts as settled.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(150);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettlePolicy {
    pub quiet_period: Duration,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
        }
    }
}

impl SettlePolicy {
    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }
}

/// Debounces raw scroll positions.
///
/// Feed every frame into [`on_scroll`](Self::on_scroll) and poll from the
/// host loop; a position is reported once, after no new event arrived for
/// the quiet period or when the host says the gesture ended.
#[derive(Debug, Default)]
pub struct ScrollSettleDebouncer {
    policy: SettlePolicy,
    pending: Option<(ScrollStateRecord, Instant)>,
    last_settled: Option<ScrollStateRecord>,
}

impl ScrollSettleDebouncer {
    pub fn new(policy: SettlePolicy) -> Self {
        Self {
            policy,
            pending: None,
            last_settled: None,
        }
    }

    pub fn on_scroll(&mut self, index: usize, offset: i32) {
        self.on_scroll_at(index, offset, Instant::now());
    }

    pub fn on_scroll_at(&mut self, index: usize, offset: i32, now: Instant) {
        self.pending = Some((ScrollStateRecord::new(index, offset), now));
    }

    pub fn poll(&mut self) -> Option<ScrollStateRecord> {
        self.poll_at(Instant::now())
    }

    /// Returns the settled position once the quiet period has elapsed.
    pub fn poll_at(&mut self, now: Instant) -> Option<ScrollStateRecord> {
        let (_, at) = self.pending?;
        if now.saturating_duration_since(at) < self.policy.quiet_period {
            return None;
        }
        self.settle()
    }

    /// Gesture ended; settle right away.
    pub fn on_idle(&mut self) -> Option<ScrollStateRecord> {
        self.settle()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn settle(&mut self) -> Option<ScrollStateRecord> {
        let (record, _) = self.pending.take()?;
        if self.last_settled == Some(record) {
            return None;
        }
        self.last_settled = Some(record);
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settles_after_quiet_period() {
        let mut debouncer = ScrollSettleDebouncer::new(SettlePolicy::default());
        let start = Instant::now();
        debouncer.on_scroll_at(1, 0, start);
        debouncer.on_scroll_at(2, 30, start + Duration::from_millis(16));

        assert_eq!(debouncer.poll_at(start + Duration::from_millis(100)), None);
        assert!(debouncer.is_pending());
        assert_eq!(
            debouncer.poll_at(start + Duration::from_millis(200)),
            Some(ScrollStateRecord::new(2, 30))
        );
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_idle_settles_immediately_once() {
        let mut debouncer = ScrollSettleDebouncer::default();
        debouncer.on_scroll(3, 4);
        assert_eq!(debouncer.on_idle(), Some(ScrollStateRecord::new(3, 4)));
        assert_eq!(debouncer.on_idle(), None);

        debouncer.on_scroll(3, 4);
        assert_eq!(debouncer.on_idle(), None);
    }
}
