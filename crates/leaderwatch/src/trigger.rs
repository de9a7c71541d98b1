//! Escalation schedule evaluation shared by both watch engines.

use serde::{Deserialize, Serialize};

/// Tolerance around time-based checkpoints and repeater boundaries.
const HEARTBEAT_TOLERANCE_SECS: u64 = 30;

/// Repeat-alert schedule: one-shot checkpoints plus a repeater interval.
///
/// Checkpoints are assumed ascending; the evaluator does not enforce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSchedule {
    /// Once the condition's total magnitude reaches this value, alerts
    /// repeat every `repeater` units instead of at checkpoints.
    pub repeater: u64,

    /// One-shot thresholds crossed on the way up to the repeater.
    #[serde(default)]
    pub checkpoints: Vec<u64>,
}

impl TriggerSchedule {
    pub fn new(repeater: u64, checkpoints: Vec<u64>) -> Self {
        Self {
            repeater,
            checkpoints,
        }
    }

    /// Count-based decision for an ongoing miss streak.
    ///
    /// `total` is the cumulative magnitude since the condition started;
    /// `delta` the magnitude accrued since the last alert. Below the
    /// repeater, a checkpoint `t` fires iff `t >= total - delta && t <= delta`
    /// (the bounds are deliberately literal; changing them alters alert
    /// timing). At or above the repeater, fire once a full repeater
    /// interval's worth of new magnitude has accrued.
    pub fn should_fire(&self, total: u64, delta: u64) -> bool {
        if total < self.repeater {
            let floor = total.saturating_sub(delta);
            self.checkpoints.iter().any(|&t| t >= floor && t <= delta)
        } else {
            delta >= self.repeater
        }
    }

    /// Time-based decision for an ongoing outage, `secs` seconds in.
    ///
    /// Fires near any checkpoint, and every `repeater` seconds thereafter,
    /// both with a 30-second tolerance to absorb poll-interval jitter.
    pub fn should_fire_after(&self, secs: u64) -> bool {
        if self
            .checkpoints
            .iter()
            .any(|&t| secs.abs_diff(t) <= HEARTBEAT_TOLERANCE_SECS)
        {
            return true;
        }
        self.repeater > 0 && secs % self.repeater < HEARTBEAT_TOLERANCE_SECS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_repeater_checkpoint_window() {
        // Schedule [5, 1, 3] from the bot's config: repeater 5, checkpoints 1 and 3.
        let schedule = TriggerSchedule::new(5, vec![1, 3]);

        // total=3, delta=2: window floor is 1, checkpoint 1 satisfies
        // 1 >= 1 && 1 <= 2.
        assert!(schedule.should_fire(3, 2));

        // total=4, delta=1: floor 3, checkpoint 3 satisfies 3 >= 3 but
        // fails 3 <= 1.
        assert!(!schedule.should_fire(4, 1));

        // total=3, delta=3: checkpoint 3 satisfies 3 >= 0 && 3 <= 3.
        assert!(schedule.should_fire(3, 3));
    }

    #[test]
    fn test_post_repeater_requires_full_interval() {
        let schedule = TriggerSchedule::new(5, vec![1, 3]);

        assert!(!schedule.should_fire(10, 4));
        assert!(schedule.should_fire(10, 5));
        assert!(schedule.should_fire(100, 12));
    }

    #[test]
    fn test_checkpoint_not_consumed_twice() {
        // Walk a streak through several cycles: once a checkpoint has fired,
        // the moving floor (total - delta) excludes it from later windows.
        let schedule = TriggerSchedule::new(10, vec![2, 5]);

        // Record {start: 1, last: 1}; missed reaches 3: total=3, delta=2.
        // Checkpoint 2 lies in the window, fires, last becomes 3.
        assert!(schedule.should_fire(3, 2));

        // missed=4: total=4, delta=1, floor=3. Checkpoint 2 is below the
        // floor now and can never qualify again; 5 exceeds the delta.
        assert!(!schedule.should_fire(4, 1));

        // missed=9: total=9, delta=6, floor=3. Checkpoint 5 fires.
        assert!(schedule.should_fire(9, 6));
    }

    #[test]
    fn test_no_checkpoints_before_repeater_is_silent() {
        let schedule = TriggerSchedule::new(50, vec![]);
        assert!(!schedule.should_fire(10, 10));
        assert!(schedule.should_fire(50, 50));
    }

    #[test]
    fn test_time_based_repeater_heartbeat() {
        // Repeater 60, no checkpoints.
        let schedule = TriggerSchedule::new(60, vec![]);

        // 35s down: 35 % 60 = 35, outside tolerance.
        assert!(!schedule.should_fire_after(35));
        // 65s down: 65 % 60 = 5 < 30.
        assert!(schedule.should_fire_after(65));
        // 125s down: next heartbeat.
        assert!(schedule.should_fire_after(125));
    }

    #[test]
    fn test_time_based_checkpoint_proximity() {
        let schedule = TriggerSchedule::new(3600, vec![300, 900]);

        assert!(schedule.should_fire_after(280));
        assert!(schedule.should_fire_after(330));
        assert!(!schedule.should_fire_after(350));
        assert!(schedule.should_fire_after(895));
    }

    #[test]
    fn test_time_based_zero_repeater_does_not_panic() {
        let schedule = TriggerSchedule::new(0, vec![]);
        assert!(!schedule.should_fire_after(10));
    }
}
