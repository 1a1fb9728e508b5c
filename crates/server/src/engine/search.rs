//! Ball search scheduling.

use orrery_core::config::BallSearchConfig;

/// Decides when the playfield has gone quiet long enough to search for a
/// stuck ball. Times are the machine's clock in milliseconds.
#[derive(Debug, Clone)]
pub struct BallSearchSchedule {
    config: BallSearchConfig,
    last_activity_ms: u64,
    last_search_ms: Option<u64>,
}

impl BallSearchSchedule {
    pub fn new(config: BallSearchConfig) -> Self {
        Self {
            config,
            last_activity_ms: 0,
            last_search_ms: None,
        }
    }

    /// Any switch activity means the balls are moving.
    pub fn record_activity(&mut self, now_ms: u64) {
        self.last_activity_ms = now_ms;
        self.last_search_ms = None;
    }

    /// Whether a search should run now. Marks the search as started when it
    /// returns true.
    pub fn poll(&mut self, now_ms: u64, balls_requested: u32) -> bool {
        if !self.config.enabled || balls_requested == 0 {
            return false;
        }
        if now_ms.saturating_sub(self.last_activity_ms) < self.config.idle_timeout_ms {
            return false;
        }
        let due = match self.last_search_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.config.interval_ms,
        };
        if due {
            self.last_search_ms = Some(now_ms);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> BallSearchSchedule {
        BallSearchSchedule::new(BallSearchConfig {
            enabled: true,
            idle_timeout_ms: 1000,
            interval_ms: 500,
        })
    }

    #[test]
    fn test_waits_for_idle_timeout() {
        let mut schedule = schedule();
        assert!(!schedule.poll(999, 1));
        assert!(schedule.poll(1000, 1));
    }

    #[test]
    fn test_repeats_at_interval_while_quiet() {
        let mut schedule = schedule();
        assert!(schedule.poll(1000, 1));
        assert!(!schedule.poll(1200, 1));
        assert!(schedule.poll(1500, 1));
        assert!(!schedule.poll(1600, 1));
        assert!(schedule.poll(2000, 1));
    }

    #[test]
    fn test_activity_resets_the_clock() {
        let mut schedule = schedule();
        assert!(schedule.poll(1000, 1));
        schedule.record_activity(1100);
        assert!(!schedule.poll(1600, 1));
        assert!(schedule.poll(2100, 1));
    }

    #[test]
    fn test_no_search_without_balls_in_play_or_when_disabled() {
        let mut schedule = schedule();
        assert!(!schedule.poll(5000, 0));

        let mut disabled = BallSearchSchedule::new(BallSearchConfig {
            enabled: false,
            ..BallSearchConfig::default()
        });
        assert!(!disabled.poll(60_000, 3));
    }
}
