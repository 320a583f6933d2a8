use crate::types::*;
use log::trace;

/// Turns a stream of tracked hand positions into discrete strum events.
///
/// # How it works
///
/// The strum zone has a horizontal mid-line. A strum is the moment the
/// tracked point crosses that line between two consecutive in-zone samples,
/// moving faster than `velocity_threshold` pixels per frame. Requiring a
/// crossing rejects slow drift; requiring speed rejects a hand resting on
/// the line.
///
/// # Debounce
///
/// Jitter around the mid-line can produce several crossings for one
/// physical stroke. Any crossing within `min_interval_ms` of the last
/// emitted strum is dropped.
///
/// # Baseline
///
/// The first in-zone sample only records a baseline. Leaving the zone (or
/// losing the hand) discards it, so the sample right after re-entry can
/// never fire.
pub struct StrumDetector {
    last_y: Option<f32>,
    last_strum_ms: Option<u64>,
    /// True from a strum until the hand leaves the zone (highlight state)
    pub is_active: bool,
    velocity_threshold: f32,
    min_interval_ms: u64,
}

impl StrumDetector {
    pub fn new(velocity_threshold: f32, min_interval_ms: u64) -> Self {
        Self {
            last_y: None,
            last_strum_ms: None,
            is_active: false,
            velocity_threshold,
            min_interval_ms,
        }
    }

    /// Evaluate one motion sample (or its absence) against the zone.
    pub fn on_sample(&mut self, sample: Option<MotionSample>, zone: &StrumZone) -> Option<StrumEvent> {
        let sample = match sample {
            Some(s) if zone.contains(s.x, s.y) => s,
            _ => {
                self.release();
                return None;
            }
        };

        let last_y = match self.last_y {
            Some(y) => y,
            None => {
                self.last_y = Some(sample.y);
                return None;
            }
        };
        self.last_y = Some(sample.y);

        let velocity = sample.y - last_y;
        let speed = velocity.abs();
        let mid = zone.mid_y();
        let crossed = (last_y < mid && sample.y >= mid) || (last_y > mid && sample.y <= mid);

        if !crossed || speed <= self.velocity_threshold {
            return None;
        }

        let now = sample.timestamp_ms;
        if let Some(last) = self.last_strum_ms {
            if now.saturating_sub(last) <= self.min_interval_ms {
                trace!("strum_det: crossing at t={}ms debounced", now);
                return None;
            }
        }

        self.last_strum_ms = Some(now);
        self.is_active = true;
        let direction = StrumDirection::from_velocity(velocity);
        trace!("strum_det: {} strum at t={}ms speed={:.1}", direction, now, speed);
        Some(StrumEvent {
            direction,
            timestamp_ms: now,
        })
    }

    /// Timestamp of the last emitted strum, if any.
    pub fn last_strum_ms(&self) -> Option<u64> {
        self.last_strum_ms
    }

    /// Hand left the zone: drop the baseline and the highlight.
    fn release(&mut self) {
        self.last_y = None;
        self.is_active = false;
    }

    /// Reset all state (e.g., on session end).
    pub fn reset(&mut self) {
        self.release();
        self.last_strum_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 600×200 zone at (600, 400): mid-line at y=500.
    fn zone() -> StrumZone {
        StrumZone::new(600.0, 400.0, 600.0, 200.0)
    }

    fn at(y: f32, t: u64) -> Option<MotionSample> {
        Some(MotionSample {
            x: 900.0,
            y,
            timestamp_ms: t,
        })
    }

    fn detector() -> StrumDetector {
        StrumDetector::new(18.0, 150)
    }

    #[test]
    fn test_fast_down_crossing_fires() {
        let mut det = detector();
        let z = zone();
        assert!(det.on_sample(at(480.0, 0), &z).is_none(), "baseline only");
        let ev = det.on_sample(at(505.0, 16), &z).expect("speed 25 > 18 should fire");
        assert_eq!(ev.direction, StrumDirection::Down);
        assert_eq!(ev.timestamp_ms, 16);
        assert!(det.is_active);
    }

    #[test]
    fn test_entry_on_top_edge_sets_baseline() {
        // 40 px tall zone: top edge y=400, mid-line y=420
        let z = StrumZone::new(600.0, 400.0, 600.0, 40.0);
        let mut det = detector();
        assert!(det.on_sample(at(400.0, 0), &z).is_none(), "baseline only");
        let ev = det.on_sample(at(425.0, 16), &z).expect("speed 25 > 18 should fire");
        assert_eq!(ev.direction, StrumDirection::Down);
    }

    #[test]
    fn test_fast_up_crossing_fires() {
        let mut det = detector();
        let z = zone();
        det.on_sample(at(520.0, 0), &z);
        let ev = det.on_sample(at(490.0, 16), &z).unwrap();
        assert_eq!(ev.direction, StrumDirection::Up);
    }

    #[test]
    fn test_slow_crossing_ignored() {
        let mut det = detector();
        let z = zone();
        det.on_sample(at(495.0, 0), &z);
        assert!(det.on_sample(at(505.0, 16), &z).is_none(), "speed 10 < 18");
        assert!(!det.is_active);
    }

    #[test]
    fn test_speed_equal_to_threshold_ignored() {
        let mut det = detector();
        let z = zone();
        det.on_sample(at(491.0, 0), &z);
        assert!(det.on_sample(at(509.0, 16), &z).is_none(), "speed 18 is not > 18");
    }

    #[test]
    fn test_fast_without_crossing_ignored() {
        let mut det = detector();
        let z = zone();
        det.on_sample(at(410.0, 0), &z);
        assert!(det.on_sample(at(480.0, 16), &z).is_none());
        assert!(det.on_sample(at(420.0, 32), &z).is_none());
    }

    #[test]
    fn test_landing_exactly_on_mid_line_counts() {
        let mut det = detector();
        let z = zone();
        det.on_sample(at(470.0, 0), &z);
        assert!(det.on_sample(at(500.0, 16), &z).is_some());
    }

    #[test]
    fn test_debounce_suppresses_second_crossing() {
        let mut det = detector();
        let z = zone();
        det.on_sample(at(470.0, 0), &z);
        assert!(det.on_sample(at(530.0, 16), &z).is_some());
        // Jitter back up through the line 100ms later
        assert!(det.on_sample(at(470.0, 116), &z).is_none());
        assert_eq!(det.last_strum_ms(), Some(16), "only the first strum is recorded");
        // Exactly at the interval is still suppressed
        assert!(det.on_sample(at(530.0, 166), &z).is_none());
        // Past the interval fires
        assert!(det.on_sample(at(470.0, 200), &z).is_some());
        assert_eq!(det.last_strum_ms(), Some(200));
    }

    #[test]
    fn test_no_hand_resets_baseline() {
        let mut det = detector();
        let z = zone();
        det.on_sample(at(470.0, 0), &z);
        assert!(det.on_sample(None, &z).is_none());
        // Re-entry below the line: only a new baseline, no strum
        assert!(det.on_sample(at(530.0, 32), &z).is_none());
    }

    #[test]
    fn test_leaving_zone_resets_baseline_and_highlight() {
        let mut det = detector();
        let z = zone();
        det.on_sample(at(470.0, 0), &z);
        det.on_sample(at(530.0, 16), &z);
        assert!(det.is_active);

        // Outside the rectangle (x too small)
        let outside = Some(MotionSample {
            x: 100.0,
            y: 470.0,
            timestamp_ms: 300,
        });
        assert!(det.on_sample(outside, &z).is_none());
        assert!(!det.is_active);
        // First sample back inside only records a baseline
        assert!(det.on_sample(at(530.0, 320), &z).is_none());
        assert!(det.on_sample(at(470.0, 336), &z).is_some());
    }

    #[test]
    fn test_reset_clears_debounce() {
        let mut det = detector();
        let z = zone();
        det.on_sample(at(470.0, 100), &z);
        det.on_sample(at(530.0, 116), &z);
        det.reset();
        assert_eq!(det.last_strum_ms(), None);
        det.on_sample(at(470.0, 120), &z);
        assert!(det.on_sample(at(530.0, 136), &z).is_some());
    }
}
