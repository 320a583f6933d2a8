//! Property tests for the strum detector, note stream, judgment laws and
//! the controller wire format.

use proptest::prelude::*;

use air_strum::audio::AudioCommand;
use air_strum::config::GameConfig;
use air_strum::game::Game;
use air_strum::judgment::{Grade, JudgmentEngine};
use air_strum::note_stream::{NoteStream, SequentialFretPicker};
use air_strum::protocol::{self, PeerMessage};
use air_strum::remote_fret::RemoteFretState;
use air_strum::session::SessionState;
use air_strum::strum_detector::StrumDetector;
use air_strum::types::*;

// Default 1280×720 strum zone: x∈(630,1230) y∈(468,684), mid 576.
const THRESHOLD: f32 = 18.0;
const DEBOUNCE_MS: u64 = 150;
const HIT_X: f32 = 1030.0;
const WINDOW: f32 = 120.0;

fn zone() -> StrumZone {
    StrumZone::new(630.0, 468.0, 600.0, 216.0)
}

fn sample(y: f32, t: u64) -> Option<MotionSample> {
    Some(MotionSample {
        x: 900.0,
        y,
        timestamp_ms: t,
    })
}

fn stream() -> NoteStream {
    NoteStream::new(16.0, -100.0, vec![0], Box::new(SequentialFretPicker::new()))
}

proptest! {
    #[test]
    fn prop_no_crossing_no_strum(
        above in any::<bool>(),
        offsets in prop::collection::vec(0.5f32..100.0, 1..60),
        gaps in prop::collection::vec(1u64..500, 60),
    ) {
        let z = zone();
        let mut det = StrumDetector::new(THRESHOLD, DEBOUNCE_MS);
        let mut t = 0;
        for (off, gap) in offsets.iter().zip(&gaps) {
            t += gap;
            let y = if above { z.mid_y() - off } else { z.mid_y() + off };
            prop_assert!(det.on_sample(sample(y, t), &z).is_none());
        }
    }

    #[test]
    fn prop_speed_threshold_decides(
        before in 0.1f32..100.0,
        after in 0.0f32..100.0,
        down in any::<bool>(),
    ) {
        let z = zone();
        let mid = z.mid_y();
        let (y0, y1) = if down { (mid - before, mid + after) } else { (mid + before, mid - after) };
        let mut det = StrumDetector::new(THRESHOLD, DEBOUNCE_MS);
        det.on_sample(sample(y0, 0), &z);
        let event = det.on_sample(sample(y1, 16), &z);

        let speed = (y1 - y0).abs();
        prop_assert_eq!(event.is_some(), speed > THRESHOLD);
        if let Some(e) = event {
            let expected = if down { StrumDirection::Down } else { StrumDirection::Up };
            prop_assert_eq!(e.direction, expected);
        }
    }

    #[test]
    fn prop_debounce_keeps_first(gap in 1u64..400) {
        let z = zone();
        let mut det = StrumDetector::new(THRESHOLD, DEBOUNCE_MS);
        det.on_sample(sample(540.0, 0), &z);
        let first = det.on_sample(sample(620.0, 16), &z);
        let second = det.on_sample(sample(540.0, 16 + gap), &z);

        prop_assert!(first.is_some());
        prop_assert_eq!(second.is_some(), gap > DEBOUNCE_MS);
        let expected_last = if gap > DEBOUNCE_MS { 16 + gap } else { 16 };
        prop_assert_eq!(det.last_strum_ms(), Some(expected_last));
    }

    #[test]
    fn prop_sweep_is_idempotent(xs in prop::collection::vec(-200.0f32..1600.0, 0..20)) {
        let mut notes = stream();
        for &x in &xs {
            notes.push_note(x, 0);
        }
        let first = notes.sweep_misses(HIT_X, WINDOW);
        let second = notes.sweep_misses(HIT_X, WINDOW);

        let expected = xs.iter().filter(|&&x| x > HIT_X + WINDOW).count();
        prop_assert_eq!(first.len(), expected);
        prop_assert!(second.is_empty());
    }

    #[test]
    fn prop_combo_laws(outcomes in prop::collection::vec(any::<bool>(), 0..60)) {
        let engine = JudgmentEngine::new(&GameConfig::default());
        let frets = RemoteFretState::new();
        let mut session = SessionState::new();
        let mut notes = stream();
        let mut audio: Vec<AudioCommand> = Vec::new();
        let strum = StrumEvent { direction: StrumDirection::Down, timestamp_ms: 0 };

        for hit in outcomes {
            let combo_before = session.combo();
            let max_before = session.max_combo();
            let score_before = session.score();

            if hit {
                notes.push_note(HIT_X, 0);
                let j = engine
                    .on_strum(&strum, &mut notes, HIT_X, WINDOW, &frets, &mut session, &mut audio)
                    .unwrap()
                    .unwrap();
                prop_assert_eq!(j.grade, Grade::Perfect);
                prop_assert_eq!(session.combo(), combo_before + 1);
                notes.prune(f32::MAX);
            } else {
                let note = Note::new(u64::MAX, HIT_X + WINDOW + 1.0, 0);
                engine.on_miss(&note, &mut session, &mut audio);
                prop_assert_eq!(session.combo(), 0);
            }

            prop_assert!(session.max_combo() >= max_before);
            prop_assert!(session.max_combo() >= session.combo());
            prop_assert!(session.score() >= score_before);
        }
        let counts = session.counts();
        prop_assert_eq!(session.score(), counts.perfect as u64 * 1000);
    }

    #[test]
    fn prop_fret_update_round_trip(frets in prop::array::uniform6(0u8..=MAX_FRET)) {
        let text = protocol::encode(&PeerMessage::fret_update(&frets)).unwrap();
        let decoded = protocol::decode(&text).unwrap();
        let expected: Vec<i64> = frets.iter().map(|&f| f as i64).collect();
        prop_assert_eq!(decoded, PeerMessage::FretUpdate { payload: expected });

        let mut game = Game::new(GameConfig::default(), Box::new(SequentialFretPicker::new()));
        game.handle_peer_event(&PeerEvent::Message(text));
        prop_assert_eq!(game.remote_frets().frets(), frets);
    }
}
