use crate::audio::AudioSink;
use crate::config::{GameConfig, Layout};
use crate::error::Fault;
use crate::judgment::{Judgment, JudgmentEngine};
use crate::motion::MotionSampleBuffer;
use crate::note_stream::{FretPicker, NoteStream};
use crate::protocol::{self, PeerMessage};
use crate::remote_fret::RemoteFretState;
use crate::session::{SessionSnapshot, SessionState};
use crate::strum_detector::StrumDetector;
use crate::types::*;
use log::{debug, info, trace, warn};

/// Lifecycle of a play session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Tracking runs, no notes spawn yet
    Ready,
    Playing,
    Paused,
    /// Terminal; every tick is a no-op
    Ended,
}

/// Everything one tick produced, for presentation and sync.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub timestamp_ms: u64,
    pub sample: Option<MotionSample>,
    pub strum: Option<StrumEvent>,
    /// Misses from the sweep first, then at most one hit
    pub judgments: Vec<Judgment>,
    pub faults: Vec<Fault>,
    /// Strum highlight
    pub strumming: bool,
    /// Taken after all mutation in this tick
    pub snapshot: SessionSnapshot,
}

/// The strum/judgment core for one session. Single-threaded: every call
/// runs to completion and the host calls [`Game::tick`] once per frame.
///
/// # Tick order
///
/// 1. spawn a note if due (only while playing)
/// 2. advance notes one frame
/// 3. sweep misses, judging each as Miss
/// 4. ingest the frame's motion sample and run the strum detector
/// 5. judge the strum against the notes that survived the sweep
/// 6. prune resolved and off-screen notes, then drop any note that breaks
///    the stream's invariants
/// 7. snapshot the session
///
/// Sweeping before matching means a note that left the window this tick
/// is a miss, never a late hit.
pub struct Game {
    config: GameConfig,
    layout: Layout,
    motion: MotionSampleBuffer,
    detector: StrumDetector,
    notes: NoteStream,
    engine: JudgmentEngine,
    session: SessionState,
    frets: RemoteFretState,
    phase: Phase,
    ticks: u64,
}

impl Game {
    pub fn new(config: GameConfig, picker: Box<dyn FretPicker>) -> Self {
        let layout = config.layout(config.viewport);
        Self {
            motion: MotionSampleBuffer::new(),
            detector: StrumDetector::new(config.velocity_threshold, config.min_strum_interval_ms),
            notes: NoteStream::new(
                config.note_speed,
                config.note_spawn_x,
                config.fret_palette.clone(),
                picker,
            ),
            engine: JudgmentEngine::new(&config),
            session: SessionState::new(),
            frets: RemoteFretState::new(),
            phase: Phase::Ready,
            ticks: 0,
            layout,
            config,
        }
    }

    /// Begin (or resume) spawning notes.
    pub fn start(&mut self) {
        match self.phase {
            Phase::Ready | Phase::Paused => {
                info!("session playing");
                self.phase = Phase::Playing;
            }
            Phase::Playing | Phase::Ended => {}
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.phase {
            Phase::Playing => {
                info!("session paused");
                self.phase = Phase::Paused;
                self.release_tracking();
            }
            Phase::Paused => {
                info!("session resumed");
                self.phase = Phase::Playing;
            }
            Phase::Ready | Phase::Ended => {}
        }
    }

    /// Stop for good: discard notes and tracking state. The score stays
    /// readable.
    pub fn end_session(&mut self) {
        if self.phase == Phase::Ended {
            return;
        }
        info!("session ended after {} ticks: {}", self.ticks, self.session.snapshot());
        self.phase = Phase::Ended;
        self.notes.clear();
        self.detector.reset();
        self.motion.clear();
    }

    /// Recompute geometry for a new viewport. Takes effect on the next tick.
    pub fn resize(&mut self, viewport: Viewport) {
        self.layout = self.config.layout(viewport);
        self.release_tracking();
        debug!("resized to {}x{}", viewport.width, viewport.height);
    }

    /// Apply one peer-channel event. This is the only writer of the
    /// remote fret state; the score is never touched here.
    pub fn handle_peer_event(&mut self, event: &PeerEvent) {
        match event {
            PeerEvent::Connected => self.frets.on_connected(),
            PeerEvent::Disconnected => self.frets.on_disconnected(),
            PeerEvent::Message(text) => match protocol::decode(text) {
                Ok(PeerMessage::FretUpdate { payload }) => self.frets.apply_payload(&payload),
                Ok(PeerMessage::Ready { .. }) => info!("controller ready"),
                Ok(other) => debug!("ignoring inbound {}", other.type_name()),
                Err(e) => warn!("dropping peer message: {}", e),
            },
        }
    }

    /// Run one frame.
    pub fn tick(&mut self, frame: &HandFrame, audio: &mut dyn AudioSink) -> TickReport {
        let now = frame.timestamp_ms;
        let mut report = TickReport {
            timestamp_ms: now,
            sample: None,
            strum: None,
            judgments: Vec::new(),
            faults: Vec::new(),
            strumming: false,
            snapshot: self.session.snapshot(),
        };

        match self.phase {
            Phase::Ended => return report,
            Phase::Paused => {
                self.release_tracking();
                return report;
            }
            Phase::Ready | Phase::Playing => {}
        }
        self.ticks += 1;

        let hit_x = self.layout.hit_zone_x;
        let window = self.config.hit_window;

        if self.phase == Phase::Playing {
            self.notes.spawn_if_due(now, self.config.note_spawn_interval_ms);
            self.notes.advance(1.0);
            for note in self.notes.sweep_misses(hit_x, window) {
                let j = self.engine.on_miss(&note, &mut self.session, audio);
                report.judgments.push(j);
            }
        }

        report.sample = self.motion.update(frame, &self.layout);
        report.strum = self.detector.on_sample(report.sample, &self.layout.strum_zone);
        report.strumming = self.detector.is_active;

        if let Some(event) = report.strum {
            if let Some(j) = self.judge_strum(&event, audio, &mut report.faults) {
                report.judgments.push(j);
            }
        }

        self.notes.prune(self.layout.prune_x);
        while let Err(fault) = self.notes.validate() {
            warn!("note stream fault: {}; dropping note", fault);
            let dropped = self.notes.drop_note(fault.note_id());
            report.faults.push(fault);
            if !dropped {
                break;
            }
        }
        report.snapshot = self.session.snapshot();

        trace!(
            "tick {} t={}ms notes={} {}",
            self.ticks,
            now,
            self.notes.len(),
            report.snapshot
        );
        report
    }

    /// Judge a strum, dropping any corrupt note that gets in the way.
    fn judge_strum(
        &mut self,
        event: &StrumEvent,
        audio: &mut dyn AudioSink,
        faults: &mut Vec<Fault>,
    ) -> Option<Judgment> {
        loop {
            let result = self.engine.on_strum(
                event,
                &mut self.notes,
                self.layout.hit_zone_x,
                self.config.hit_window,
                &self.frets,
                &mut self.session,
                audio,
            );
            match result {
                Ok(j) => return j,
                Err(fault) => {
                    warn!("judgment fault: {}; dropping note", fault);
                    let dropped = self.notes.drop_note(fault.note_id());
                    faults.push(fault);
                    if !dropped {
                        return None;
                    }
                }
            }
        }
    }

    /// Forget the current hand baseline so the next sample starts fresh.
    fn release_tracking(&mut self) {
        self.motion.clear();
        self.detector.on_sample(None, &self.layout.strum_zone);
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn remote_frets(&self) -> &RemoteFretState {
        &self.frets
    }

    pub fn notes(&self) -> &NoteStream {
        &self.notes
    }

    /// Mutable note access for hosts that script their own charts.
    pub fn notes_mut(&mut self) -> &mut NoteStream {
        &mut self.notes
    }

    pub fn detector(&self) -> &StrumDetector {
        &self.detector
    }
}
