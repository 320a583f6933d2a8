use crate::audio::AudioSink;
use crate::config::{GameConfig, UnmatchedStrumPolicy};
use crate::error::Fault;
use crate::note_stream::NoteStream;
use crate::remote_fret::RemoteFretState;
use crate::session::SessionState;
use crate::types::*;
use log::debug;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum Grade {
    Perfect,
    Great,
    Miss,
}

impl Grade {
    /// Text shown to the player.
    pub fn label(&self) -> &'static str {
        match self {
            Grade::Perfect => "PERFECT",
            Grade::Great => "GREAT",
            Grade::Miss => "MISS",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome for one note.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Judgment {
    pub grade: Grade,
    pub note_id: u64,
    /// The note's fret, clamped into range
    pub target_fret: u8,
    pub score_delta: u32,
    pub combo_after: u32,
    /// Strum direction for hits, None for misses
    pub direction: Option<StrumDirection>,
}

/// Matches strums to notes and applies the score/combo consequences.
///
/// Two positive grades only: a strum whose best note is closer than
/// `hit_window / perfect_window_divisor` to the hit line is Perfect,
/// anything else inside the window is Great. Misses come exclusively from
/// the note stream's sweep, never from a strum.
pub struct JudgmentEngine {
    perfect_window: f32,
    perfect_score: u32,
    great_score: u32,
    unmatched: UnmatchedStrumPolicy,
}

impl JudgmentEngine {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            perfect_window: config.perfect_window(),
            perfect_score: config.perfect_score,
            great_score: config.great_score,
            unmatched: config.unmatched_strum,
        }
    }

    /// Judge one strum. `Ok(None)` means no note was in the window (the
    /// unmatched-strum policy decides whether anything is heard).
    ///
    /// With no controller connected, `frets` reads all-open and the strum is
    /// judged on timing alone.
    #[allow(clippy::too_many_arguments)]
    pub fn on_strum(
        &self,
        event: &StrumEvent,
        notes: &mut NoteStream,
        hit_zone_x: f32,
        hit_window: f32,
        frets: &RemoteFretState,
        session: &mut SessionState,
        audio: &mut dyn AudioSink,
    ) -> Result<Option<Judgment>, Fault> {
        let (note_id, dist, target_fret) = match notes.find_best_match(hit_zone_x, hit_window)? {
            Some(n) => (n.id, (n.x - hit_zone_x).abs(), n.clamped_fret()),
            None => {
                debug!("{} strum at t={}ms with no note in window", event.direction, event.timestamp_ms);
                if self.unmatched == UnmatchedStrumPolicy::Muted {
                    audio.play_muted();
                }
                return Ok(None);
            }
        };

        if !notes.mark_hit(note_id) {
            return Ok(None);
        }

        let perfect = dist < self.perfect_window;
        let (grade, points) = if perfect {
            (Grade::Perfect, self.perfect_score)
        } else {
            (Grade::Great, self.great_score)
        };
        let combo_after = session.record_hit(perfect, points);
        audio.play_strum(frets.frets(), event.direction);

        debug!(
            "note {} {} (dist {:.1}px) +{} combo {}",
            note_id, grade, dist, points, combo_after
        );
        Ok(Some(Judgment {
            grade,
            note_id,
            target_fret,
            score_delta: points,
            combo_after,
            direction: Some(event.direction),
        }))
    }

    /// Apply a miss for a note the stream has just swept.
    pub fn on_miss(&self, note: &Note, session: &mut SessionState, audio: &mut dyn AudioSink) -> Judgment {
        session.record_miss();
        audio.play_muted();
        debug!("note {} MISS, combo reset", note.id);
        Judgment {
            grade: Grade::Miss,
            note_id: note.id,
            target_fret: note.clamped_fret(),
            score_delta: 0,
            combo_after: 0,
            direction: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioCommand;
    use crate::note_stream::SequentialFretPicker;

    const HIT_X: f32 = 1030.0;
    const WINDOW: f32 = 120.0;

    struct Rig {
        engine: JudgmentEngine,
        notes: NoteStream,
        frets: RemoteFretState,
        session: SessionState,
        audio: Vec<AudioCommand>,
    }

    fn rig(config: GameConfig) -> Rig {
        Rig {
            engine: JudgmentEngine::new(&config),
            notes: NoteStream::new(16.0, -100.0, vec![0], Box::new(SequentialFretPicker::new())),
            frets: RemoteFretState::new(),
            session: SessionState::new(),
            audio: Vec::new(),
        }
    }

    fn down(t: u64) -> StrumEvent {
        StrumEvent {
            direction: StrumDirection::Down,
            timestamp_ms: t,
        }
    }

    impl Rig {
        fn strum(&mut self, ev: StrumEvent) -> Option<Judgment> {
            self.engine
                .on_strum(
                    &ev,
                    &mut self.notes,
                    HIT_X,
                    WINDOW,
                    &self.frets,
                    &mut self.session,
                    &mut self.audio,
                )
                .unwrap()
        }
    }

    #[test]
    fn test_perfect_hit() {
        let mut r = rig(GameConfig::default());
        r.notes.push_note(HIT_X - 30.0, 5);
        let j = r.strum(down(0)).expect("note in window");
        assert_eq!(j.grade, Grade::Perfect, "30 < 120/3.5");
        assert_eq!(j.score_delta, 1000);
        assert_eq!(j.combo_after, 1);
        assert_eq!(j.target_fret, 5);
        assert_eq!(r.session.score(), 1000);
        assert!(r.notes.notes()[0].hit);
        assert_eq!(r.audio, vec![AudioCommand::strum(OPEN_FRETS, StrumDirection::Down)]);
    }

    #[test]
    fn test_great_hit() {
        let mut r = rig(GameConfig::default());
        r.notes.push_note(HIT_X + 35.0, 0);
        let j = r.strum(down(0)).unwrap();
        assert_eq!(j.grade, Grade::Great, "35 >= 34.3");
        assert_eq!(j.score_delta, 500);
    }

    #[test]
    fn test_note_matched_once() {
        let mut r = rig(GameConfig::default());
        r.notes.push_note(HIT_X, 0);
        assert!(r.strum(down(0)).is_some());
        assert!(r.strum(down(200)).is_none(), "hit note cannot be matched again");
        assert_eq!(r.session.combo(), 1);
    }

    #[test]
    fn test_unmatched_strum_silent_by_default() {
        let mut r = rig(GameConfig::default());
        assert!(r.strum(down(0)).is_none());
        assert!(r.audio.is_empty());
        assert_eq!(r.session.snapshot(), SessionState::new().snapshot());
    }

    #[test]
    fn test_unmatched_strum_muted_policy() {
        let mut cfg = GameConfig::default();
        cfg.unmatched_strum = UnmatchedStrumPolicy::Muted;
        let mut r = rig(cfg);
        assert!(r.strum(down(0)).is_none());
        assert_eq!(r.audio, vec![AudioCommand::Muted]);
        assert_eq!(r.session.combo(), 0);
        assert_eq!(r.session.counts().miss, 0, "unmatched strum is not a miss");
    }

    #[test]
    fn test_uses_remote_frets_and_direction() {
        let mut r = rig(GameConfig::default());
        r.frets.apply_payload(&[0, 2, 2, 1, 0, 0]);
        r.notes.push_note(HIT_X, 0);
        let up = StrumEvent {
            direction: StrumDirection::Up,
            timestamp_ms: 0,
        };
        r.strum(up);
        assert_eq!(r.audio, vec![AudioCommand::strum([0, 2, 2, 1, 0, 0], StrumDirection::Up)]);
    }

    #[test]
    fn test_out_of_range_fret_clamped() {
        let mut r = rig(GameConfig::default());
        r.notes.push_note(HIT_X, 99);
        let j = r.strum(down(0)).unwrap();
        assert_eq!(j.target_fret, MAX_FRET);
    }

    #[test]
    fn test_fault_on_corrupt_note() {
        let mut r = rig(GameConfig::default());
        r.notes.push_note(f32::INFINITY, 0);
        let res = r.engine.on_strum(
            &down(0),
            &mut r.notes,
            HIT_X,
            WINDOW,
            &r.frets,
            &mut r.session,
            &mut r.audio,
        );
        assert!(matches!(res, Err(Fault::NonFinitePosition { id: 0, .. })));
        assert_eq!(r.session.score(), 0);
    }

    #[test]
    fn test_miss_resets_combo_and_mutes() {
        let mut r = rig(GameConfig::default());
        r.notes.push_note(HIT_X, 0);
        r.strum(down(0));
        let missed = Note::new(9, HIT_X + WINDOW + 1.0, 3);
        let j = r.engine.on_miss(&missed, &mut r.session, &mut r.audio);
        assert_eq!(j.grade, Grade::Miss);
        assert_eq!(j.combo_after, 0);
        assert_eq!(r.session.combo(), 0);
        assert_eq!(r.session.max_combo(), 1);
        assert_eq!(r.session.counts().miss, 1);
        assert_eq!(r.audio.last(), Some(&AudioCommand::Muted));
    }

    #[test]
    fn test_grade_labels() {
        assert_eq!(Grade::Perfect.to_string(), "PERFECT");
        assert_eq!(Grade::Great.label(), "GREAT");
        assert_eq!(Grade::Miss.label(), "MISS");
    }
}
