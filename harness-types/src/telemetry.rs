//! Cumulative lap-time tracking for [`crate::decoder::DecodedState`] rows on
//! their way into durable storage (SPEC_FULL.md §4.8, §8 invariant 4).

/// Tracks `i_total_time`, a monotonically non-decreasing clock built from a
/// per-lap timer that resets (wraps) at the start of every lap.
///
/// Grounded on `DatabaseStateInterface._update_timestamps`/
/// `_add_cumulative_time`: a lap wrap is detected by the current lap timer
/// going backwards relative to the previous row, at which point the previous
/// row's completed lap time is folded into the running total.
#[derive(Debug, Default, Clone, Copy)]
pub struct CumulativeTimeTracker {
    previous_timestamp: u64,
    accumulated_previous_laps: u64,
}

impl CumulativeTimeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one row's `i_current_time` and `i_last_time` and returns the
    /// row's `i_total_time`.
    pub fn advance(&mut self, i_current_time: u64, i_last_time: u64) -> u64 {
        if self.previous_timestamp > i_current_time {
            self.accumulated_previous_laps += i_last_time;
        }
        self.previous_timestamp = i_current_time;
        i_current_time + self.accumulated_previous_laps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_across_a_lap_wrap() {
        let mut tracker = CumulativeTimeTracker::new();
        assert_eq!(tracker.advance(9000, 9100), 9000);
        assert_eq!(tracker.advance(500, 9100), 9600);
        assert_eq!(tracker.advance(900, 9100), 10000);
    }

    #[test]
    fn is_non_decreasing_across_many_wraps() {
        let mut tracker = CumulativeTimeTracker::new();
        let mut previous = 0u64;
        let mut t = 0u64;
        for lap in 0..5u64 {
            for step in 0..10u64 {
                t = step * 100;
                let total = tracker.advance(t, 1000);
                assert!(total >= previous, "lap {lap} step {step} went backwards");
                previous = total;
            }
        }
        let _ = t;
    }
}
