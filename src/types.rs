use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

// ─── Hand-pose estimator input ──────────────────────────────────────────────

/// One hand as reported by the external hand-pose estimator.
/// Landmarks are in estimator space (camera pixels, not mirrored).
/// Index 0 = wrist, 8/12/16 = index/middle/ring fingertips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandPose {
    pub landmarks: Vec<[f32; 2]>,
}

impl HandPose {
    pub fn new(landmarks: Vec<[f32; 2]>) -> Self {
        Self { landmarks }
    }
}

/// Estimator-space → screen-space scale factors
/// (viewport width / video width, viewport height / video height).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EstimatorScale {
    pub h: f32,
    pub v: f32,
}

impl EstimatorScale {
    pub fn new(h: f32, v: f32) -> Self {
        Self { h, v }
    }

    /// Scale for a camera frame of `video_w`×`video_h` drawn over `viewport`.
    pub fn for_video(video_w: f32, video_h: f32, viewport: Viewport) -> Self {
        let h = if video_w > 0.0 { viewport.width / video_w } else { 1.0 };
        let v = if video_h > 0.0 { viewport.height / video_h } else { 1.0 };
        Self { h, v }
    }
}

impl Default for EstimatorScale {
    fn default() -> Self {
        Self { h: 1.0, v: 1.0 }
    }
}

/// Everything the estimator produced for one camera frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandFrame {
    /// Milliseconds since session start
    pub timestamp_ms: u64,
    pub hands: Vec<HandPose>,
    pub scale: EstimatorScale,
}

impl HandFrame {
    /// A frame in which the estimator found nothing.
    pub fn empty(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            hands: Vec::new(),
            scale: EstimatorScale::default(),
        }
    }
}

// ─── Screen geometry ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Axis-aligned strum rectangle plus the horizontal line that bisects it.
/// Construct through [`StrumZone::new`] so that `mid_y` always equals
/// `y + height / 2`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct StrumZone {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    mid_y: f32,
}

impl StrumZone {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            mid_y: y + height / 2.0,
        }
    }

    pub fn mid_y(&self) -> f32 {
        self.mid_y
    }

    /// Horizontal bounds are strict; the top and bottom edges count as
    /// inside, so a hand entering exactly on the top edge sets a baseline.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x > self.x && x < self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

// ─── Motion ─────────────────────────────────────────────────────────────────

/// Screen-space position of the tracked hand point for one frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MotionSample {
    pub x: f32,
    pub y: f32,
    pub timestamp_ms: u64,
}

impl fmt::Display for MotionSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={:>8}ms  x={:>7.1}  y={:>7.1}", self.timestamp_ms, self.x, self.y)
    }
}

/// Screen Y grows downward, so a positive vertical velocity is a down-strum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StrumDirection {
    Up,
    Down,
}

impl StrumDirection {
    pub fn from_velocity(velocity: f32) -> Self {
        if velocity > 0.0 {
            StrumDirection::Down
        } else {
            StrumDirection::Up
        }
    }
}

impl fmt::Display for StrumDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrumDirection::Up => write!(f, "up"),
            StrumDirection::Down => write!(f, "down"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StrumEvent {
    pub direction: StrumDirection,
    pub timestamp_ms: u64,
}

// ─── Notes ──────────────────────────────────────────────────────────────────

/// A scrolling target. `hit` and `missed` are terminal: once either is set
/// the note never takes part in matching or sweeping again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub id: u64,
    pub x: f32,
    pub target_fret: i32,
    pub hit: bool,
    pub missed: bool,
}

impl Note {
    pub fn new(id: u64, x: f32, target_fret: i32) -> Self {
        Self {
            id,
            x,
            target_fret,
            hit: false,
            missed: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.hit || self.missed
    }

    /// Fret value safe to hand to display/audio, whatever was spawned.
    pub fn clamped_fret(&self) -> u8 {
        clamp_fret(self.target_fret as i64)
    }
}

// ─── Fret state ─────────────────────────────────────────────────────────────

/// One fret offset per string, index 0 = low E. 0 = open.
pub type FretArray = [u8; STRING_COUNT];

pub const STRING_COUNT: usize = 6;
pub const OPEN_FRETS: FretArray = [0; STRING_COUNT];
pub const MAX_FRET: u8 = 24;

/// Clamp any incoming fret number into `0..=MAX_FRET`.
pub fn clamp_fret(value: i64) -> u8 {
    value.clamp(0, MAX_FRET as i64) as u8
}

// ─── Inter-thread messages ──────────────────────────────────────────────────

/// Events from the peer channel collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    Connected,
    Disconnected,
    /// Raw JSON text as received on the data channel
    Message(String),
}

/// Everything the coordinator consumes, in arrival order.
#[derive(Debug, Clone)]
pub enum InputEvent {
    /// One estimator result; drives exactly one tick.
    Frame(HandFrame),
    Peer(PeerEvent),
    Start,
    TogglePause,
    Resize(Viewport),
    Stop,
}

// ─── Session clock ──────────────────────────────────────────────────────────

/// Monotonic clock for the play session.
#[derive(Clone)]
pub struct SessionClock {
    start: Instant,
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Constants ──────────────────────────────────────────────────────────────

/// Landmark indices used by the tracker (21-point hand model).
pub const WRIST: usize = 0;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP: usize = 16;
pub const MIN_LANDMARKS: usize = 21;

/// Open-string names, low E first.
pub const STRING_NAMES: [&str; STRING_COUNT] = ["E2", "A2", "D3", "G3", "B3", "E4"];
