//! Game tunables and the viewport-derived layout.
//!
//! All positions, windows and velocities are in screen pixels of the
//! current viewport; velocities are pixels per frame.

use crate::types::{StrumZone, Viewport};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// What an in-zone strum does when no note is inside the hit window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedStrumPolicy {
    /// No score effect, no sound
    #[default]
    Silent,
    /// No score effect, play the muted chuck
    Muted,
}

/// Strum rectangle placement relative to the viewport.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StrumZoneLayout {
    /// Distance from the right edge to the zone's left edge
    pub right_inset: f32,
    pub width: f32,
    /// Zone top as a fraction of viewport height
    pub top_ratio: f32,
    /// Zone height as a fraction of viewport height
    pub height_ratio: f32,
}

impl Default for StrumZoneLayout {
    fn default() -> Self {
        Self {
            right_inset: 650.0,
            width: 600.0,
            top_ratio: 0.65,
            height_ratio: 0.30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    /// Minimum vertical speed (px/frame) for a mid-line crossing to count
    pub velocity_threshold: f32,
    /// Debounce between two strums
    pub min_strum_interval_ms: u64,
    /// Note scroll speed (px/frame)
    pub note_speed: f32,
    /// Half-width of the judgment window around the hit line (px)
    pub hit_window: f32,
    pub note_spawn_interval_ms: u64,
    /// Perfect when distance < hit_window / perfect_window_divisor
    pub perfect_window_divisor: f32,
    pub perfect_score: u32,
    pub great_score: u32,
    /// Off-screen x where new notes appear
    pub note_spawn_x: f32,
    /// Notes further than this past the right edge are pruned
    pub prune_margin: f32,
    pub fret_palette: Vec<i32>,
    /// Hands whose wrist is above this fraction of the viewport are faces
    pub face_filter_ratio: f32,
    /// Distance of the hit line from the right edge
    pub hit_zone_inset: f32,
    pub strum_zone: StrumZoneLayout,
    pub unmatched_strum: UnmatchedStrumPolicy,
    pub viewport: Viewport,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            velocity_threshold: 18.0,
            min_strum_interval_ms: 150,
            note_speed: 16.0,
            hit_window: 120.0,
            note_spawn_interval_ms: 1100,
            perfect_window_divisor: 3.5,
            perfect_score: 1000,
            great_score: 500,
            note_spawn_x: -100.0,
            prune_margin: 200.0,
            fret_palette: vec![0, 3, 5, 7, 10, 12],
            face_filter_ratio: 0.45,
            hit_zone_inset: 250.0,
            strum_zone: StrumZoneLayout::default(),
            unmatched_strum: UnmatchedStrumPolicy::Silent,
            viewport: Viewport::default(),
        }
    }
}

impl GameConfig {
    /// Load from a JSON file. Returns None if file is absent or malformed.
    pub fn load(path: &Path) -> Option<Self> {
        let data = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&data) {
            Ok(c) => {
                info!("Loaded game config from {:?}", path);
                Some(c)
            }
            Err(e) => {
                warn!("Failed to parse game config {:?}: {}", path, e);
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        std::fs::write(path, json)?;
        info!("Game config saved to {:?}", path);
        Ok(())
    }

    /// Geometry for the given viewport.
    pub fn layout(&self, viewport: Viewport) -> Layout {
        let z = &self.strum_zone;
        let strum_zone = StrumZone::new(
            viewport.width - z.right_inset,
            viewport.height * z.top_ratio,
            z.width,
            viewport.height * z.height_ratio,
        );
        Layout {
            viewport,
            strum_zone,
            hit_zone_x: viewport.width - self.hit_zone_inset,
            prune_x: viewport.width + self.prune_margin,
            face_filter_y: viewport.height * self.face_filter_ratio,
        }
    }

    /// Distance below which a hit is Perfect.
    pub fn perfect_window(&self) -> f32 {
        if self.perfect_window_divisor > 0.0 {
            self.hit_window / self.perfect_window_divisor
        } else {
            0.0
        }
    }
}

/// Viewport-derived geometry. Recomputed on resize, never mid-tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub viewport: Viewport,
    pub strum_zone: StrumZone,
    /// X of the judgment line
    pub hit_zone_x: f32,
    /// Notes beyond this x are removed
    pub prune_x: f32,
    /// Wrists with screen-Y at or above this are rejected
    pub face_filter_y: f32,
}
