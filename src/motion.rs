use crate::config::Layout;
use crate::types::*;
use log::trace;

/// Turns the estimator's per-frame hand list into a single tracked point.
///
/// # Hand selection
///
/// 1. Hands with fewer than 21 landmarks or non-finite coordinates are
///    ignored.
/// 2. Hands whose wrist sits in the upper part of the frame (screen-Y at or
///    above `layout.face_filter_y`) are treated as face false positives. A
///    strumming hand stays low.
/// 3. Of the remaining hands, the one with the smallest wrist X in
///    estimator space wins. The display is mirrored, so that is the hand
///    furthest right on screen: the strumming hand of a right-handed player.
///
/// The tracked point is the mean of the index, middle and ring fingertips,
/// scaled to screen pixels and mirrored horizontally.
///
/// Only the current and previous sample are kept. A frame with no valid
/// hand clears both, so velocity never spans a dropout.
pub struct MotionSampleBuffer {
    current: Option<MotionSample>,
    previous: Option<MotionSample>,
}

impl MotionSampleBuffer {
    pub fn new() -> Self {
        Self {
            current: None,
            previous: None,
        }
    }

    /// Ingest one estimator frame. Returns the tracked sample, or `None`
    /// when no valid hand was found.
    pub fn update(&mut self, frame: &HandFrame, layout: &Layout) -> Option<MotionSample> {
        let sample = select_hand(&frame.hands, frame.scale, layout)
            .map(|hand| tracked_point(hand, frame.scale, layout, frame.timestamp_ms));

        match sample {
            Some(s) => {
                self.previous = self.current.replace(s);
                trace!("motion: {}", s);
            }
            None => {
                self.previous = None;
                self.current = None;
            }
        }
        sample
    }

    pub fn current(&self) -> Option<MotionSample> {
        self.current
    }

    /// Vertical velocity between the last two samples, px/frame.
    /// Positive = moving down the screen.
    pub fn vertical_velocity(&self) -> Option<f32> {
        match (self.previous, self.current) {
            (Some(p), Some(c)) => Some(c.y - p.y),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.previous = None;
    }
}

impl Default for MotionSampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_usable(hand: &HandPose) -> bool {
    hand.landmarks.len() >= MIN_LANDMARKS
        && hand
            .landmarks
            .iter()
            .all(|p| p[0].is_finite() && p[1].is_finite())
}

fn select_hand<'a>(
    hands: &'a [HandPose],
    scale: EstimatorScale,
    layout: &Layout,
) -> Option<&'a HandPose> {
    hands
        .iter()
        .filter(|h| is_usable(h))
        .filter(|h| {
            let wrist_y = h.landmarks[WRIST][1] * scale.v;
            wrist_y > layout.face_filter_y
        })
        // First of equal candidates wins, matching the estimator's order.
        .fold(None, |best: Option<&HandPose>, h| match best {
            Some(b) if b.landmarks[WRIST][0] <= h.landmarks[WRIST][0] => Some(b),
            _ => Some(h),
        })
}

fn tracked_point(
    hand: &HandPose,
    scale: EstimatorScale,
    layout: &Layout,
    timestamp_ms: u64,
) -> MotionSample {
    let tips = [INDEX_TIP, MIDDLE_TIP, RING_TIP];
    let (sx, sy) = tips.iter().fold((0.0f32, 0.0f32), |(ax, ay), &i| {
        (ax + hand.landmarks[i][0], ay + hand.landmarks[i][1])
    });
    let n = tips.len() as f32;
    MotionSample {
        x: layout.viewport.width - (sx / n) * scale.h,
        y: (sy / n) * scale.v,
        timestamp_ms,
    }
}
