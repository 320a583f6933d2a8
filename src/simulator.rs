use crate::config::{GameConfig, Layout};
use crate::protocol::{self, PeerMessage};
use crate::types::*;
use crossbeam_channel::Sender;
use log::{info, warn};
use std::f32::consts::PI;
use std::thread;
use std::time::Duration;

/// Camera resolution the simulated estimator reports landmarks in.
const VIDEO_WIDTH: f32 = 640.0;
const VIDEO_HEIGHT: f32 = 480.0;
/// Strum stroke amplitude around the zone mid-line (screen px).
const STROKE_AMPLITUDE: f32 = 90.0;
/// Wrist sits this far below the fingertips (screen px).
const WRIST_DROP: f32 = 60.0;

/// Scripted stand-in for the camera, hand-pose estimator and phone
/// controller. Produces the same `InputEvent` stream the live collaborators
/// would, so the whole pipeline runs without hardware.
///
/// Frame timestamps are nominal (`frame_index * 1000 / fps`), which makes a
/// script fully deterministic. [`replay`] paces it against the wall clock.
pub struct Simulator {
    config: GameConfig,
    layout: Layout,
    scale: EstimatorScale,
    fps: u32,
    frame: u64,
    events: Vec<InputEvent>,
}

/// Where the simulated hand is.
#[derive(Clone, Copy)]
struct SimState {
    hand: Option<(f32, f32)>,
    /// Face false positive present alongside the hand
    decoy: bool,
}

impl Simulator {
    pub fn new(config: &GameConfig, fps: u32) -> Self {
        let layout = config.layout(config.viewport);
        Self {
            scale: EstimatorScale::for_video(VIDEO_WIDTH, VIDEO_HEIGHT, layout.viewport),
            layout,
            fps: fps.max(1),
            config: config.clone(),
            frame: 0,
            events: Vec::new(),
        }
    }

    /// Turn a gesture list into input events. Does not append `Stop`.
    pub fn script(mut self, gestures: &[Gesture]) -> Vec<InputEvent> {
        let mut state = SimState {
            hand: Some(self.rest_point()),
            decoy: false,
        };
        for gesture in gestures {
            self.execute(gesture, &mut state);
        }
        self.events
    }

    /// The demo session, repeated `repeats` times back to back.
    pub fn demo(config: &GameConfig, fps: u32, repeats: u32) -> Vec<InputEvent> {
        let mut gestures = vec![
            Gesture::Connect,
            Gesture::Message(r#"{"type":"READY"}"#.into()),
            Gesture::Hold { ms: 500 },
            Gesture::Start,
        ];
        for _ in 0..repeats.max(1) {
            gestures.extend(demo_sequence());
        }
        gestures.push(Gesture::Disconnect);
        gestures.push(Gesture::Hold { ms: 300 });
        Simulator::new(config, fps).script(&gestures)
    }

    fn execute(&mut self, gesture: &Gesture, state: &mut SimState) {
        match gesture {
            Gesture::Hold { ms } => {
                state.hand = Some(self.rest_point());
                for _ in 0..self.frames_for(*ms) {
                    self.emit_frame(state);
                }
            }

            Gesture::HandAway { ms } => {
                state.hand = None;
                for _ in 0..self.frames_for(*ms) {
                    self.emit_frame(state);
                }
                state.hand = Some(self.rest_point());
            }

            Gesture::Strum { ms, period_ms } => {
                self.strum(state, *ms, *period_ms);
            }

            Gesture::StrumWithDecoy { ms, period_ms } => {
                state.decoy = true;
                self.strum(state, *ms, *period_ms);
                state.decoy = false;
            }

            Gesture::Chord { frets } => {
                match protocol::encode(&PeerMessage::FretUpdate { payload: frets.to_vec() }) {
                    Ok(text) => self.push(InputEvent::Peer(PeerEvent::Message(text))),
                    Err(e) => warn!("simulator: cannot encode chord: {}", e),
                }
            }

            Gesture::Message(text) => self.push(InputEvent::Peer(PeerEvent::Message(text.clone()))),
            Gesture::Connect => self.push(InputEvent::Peer(PeerEvent::Connected)),
            Gesture::Disconnect => self.push(InputEvent::Peer(PeerEvent::Disconnected)),
            Gesture::Start => self.push(InputEvent::Start),
            Gesture::TogglePause => self.push(InputEvent::TogglePause),

            Gesture::Resize { width, height } => {
                let viewport = Viewport::new(*width, *height);
                self.layout = self.config.layout(viewport);
                self.scale = EstimatorScale::for_video(VIDEO_WIDTH, VIDEO_HEIGHT, viewport);
                self.push(InputEvent::Resize(viewport));
            }
        }
    }

    /// Sinusoidal up/down strokes across the mid-line. Two crossings per
    /// period; the half-frame phase offset keeps samples off the line.
    fn strum(&mut self, state: &mut SimState, ms: u32, period_ms: u32) {
        let zone = self.layout.strum_zone;
        let x = zone.x + zone.width / 2.0;
        let mid = zone.mid_y();
        let period_frames = (self.frames_for(period_ms) as f32).max(2.0);
        for i in 0..self.frames_for(ms) {
            let phase = 2.0 * PI * (i as f32 + 0.5) / period_frames;
            state.hand = Some((x, mid + STROKE_AMPLITUDE * phase.sin()));
            self.emit_frame(state);
        }
        state.hand = Some(self.rest_point());
    }

    /// Hand parked left of the zone, so it never crosses the mid-line.
    fn rest_point(&self) -> (f32, f32) {
        let zone = self.layout.strum_zone;
        (zone.x - 80.0, zone.mid_y() - 40.0)
    }

    fn emit_frame(&mut self, state: &SimState) {
        let timestamp_ms = self.frame * 1000 / self.fps as u64;
        self.frame += 1;

        let mut hands = Vec::new();
        if state.decoy {
            // High in the frame and further right on screen than the real hand
            let w = self.layout.viewport.width;
            let h = self.layout.viewport.height;
            hands.push(self.pose_at(w - 20.0, h * 0.15, h * 0.25));
        }
        if let Some((x, y)) = state.hand {
            hands.push(self.pose_at(x, y, y + WRIST_DROP));
        }

        self.push(InputEvent::Frame(HandFrame {
            timestamp_ms,
            hands,
            scale: self.scale,
        }));
    }

    /// A 21-landmark hand whose tracked fingertips land on screen point
    /// (`x`, `tip_y`), expressed in un-mirrored estimator space.
    fn pose_at(&self, x: f32, tip_y: f32, wrist_y: f32) -> HandPose {
        let est_x = (self.layout.viewport.width - x) / self.scale.h;
        let mut landmarks = vec![[est_x, wrist_y / self.scale.v]; MIN_LANDMARKS];
        for i in [INDEX_TIP, MIDDLE_TIP, RING_TIP] {
            landmarks[i] = [est_x, tip_y / self.scale.v];
        }
        HandPose::new(landmarks)
    }

    fn frames_for(&self, ms: u32) -> u64 {
        ms as u64 * self.fps as u64 / 1000
    }

    fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }
}

/// Send `events` to the coordinator, holding each frame back until the
/// wall clock reaches its timestamp. Ends with `Stop`. Blocks the calling
/// thread.
pub fn replay(events: Vec<InputEvent>, tx: Sender<InputEvent>) {
    info!("Simulator replaying {} events...", events.len());
    let clock = SessionClock::new();
    for event in events {
        if let InputEvent::Frame(frame) = &event {
            let now = clock.now_ms();
            if frame.timestamp_ms > now {
                thread::sleep(Duration::from_millis(frame.timestamp_ms - now));
            }
        }
        if tx.send(event).is_err() {
            warn!("Simulator: coordinator gone, stopping early");
            return;
        }
    }
    info!("Simulator: script complete");
    let _ = tx.send(InputEvent::Stop);
}

// ─── Gesture types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Gesture {
    /// Hand resting beside the zone
    Hold { ms: u32 },
    /// Estimator loses the hand
    HandAway { ms: u32 },
    Strum { ms: u32, period_ms: u32 },
    /// Strumming with a face false positive in every frame
    StrumWithDecoy { ms: u32, period_ms: u32 },
    /// Controller sends a `FRET_UPDATE` (not validated here)
    Chord { frets: Vec<i64> },
    /// Arbitrary controller text
    Message(String),
    Connect,
    Disconnect,
    Start,
    TogglePause,
    Resize { width: f32, height: f32 },
}

/// One pass of the demo: chord changes, dropouts, a decoy face, a pause
/// and some garbage from the controller. Roughly 14 seconds.
fn demo_sequence() -> Vec<Gesture> {
    vec![
        // E major, steady eighths
        Gesture::Chord { frets: vec![0, 2, 2, 1, 0, 0] },
        Gesture::Strum { ms: 3000, period_ms: 400 },

        // Hand drops out of view briefly
        Gesture::HandAway { ms: 300 },

        // A major with a face in the frame
        Gesture::Chord { frets: vec![0, 0, 2, 2, 2, 0] },
        Gesture::StrumWithDecoy { ms: 2000, period_ms: 400 },

        // Slow drift: crosses the line below the speed threshold
        Gesture::Strum { ms: 1600, period_ms: 1600 },

        Gesture::TogglePause,
        Gesture::Hold { ms: 500 },
        Gesture::TogglePause,

        // Malformed update, then D major
        Gesture::Message(r#"{"type":"FRET_UPDATE","payload":[2,3]}"#.into()),
        Gesture::Strum { ms: 1000, period_ms: 400 },
        Gesture::Chord { frets: vec![0, 0, 0, 2, 3, 2] },
        Gesture::Strum { ms: 3000, period_ms: 400 },

        Gesture::Hold { ms: 600 },
        Gesture::Message("not json".into()),
        Gesture::Strum { ms: 2000, period_ms: 400 },
    ]
}
