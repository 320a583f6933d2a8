//! Commands for the external synthesizer.
//!
//! The core never renders audio. It emits [`AudioCommand`]s through an
//! [`AudioSink`]; the host forwards them to whatever synth it runs.

use crate::types::*;
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

/// Standard tuning, low E first, as MIDI note numbers (E2 A2 D3 G3 B3 E4).
pub const OPEN_STRING_MIDI: [u8; STRING_COUNT] = [40, 45, 50, 55, 59, 64];
/// Delay between consecutive strings in one strum.
pub const STRUM_STRING_DELAY_MS: f32 = 15.0;
pub const STRUM_VELOCITY: f32 = 0.85;
/// Muted "chuck": a short low E1.
pub const MUTED_MIDI: u8 = 28;
pub const MUTED_VELOCITY: f32 = 0.3;

/// One string of a strum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StrumVoice {
    pub string: usize,
    pub midi: u8,
    /// Offset from the strum onset
    pub delay_ms: f32,
    pub velocity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AudioCommand {
    /// Chord strike. `frets` is exactly what the controller last sent.
    Strum {
        frets: FretArray,
        direction: StrumDirection,
        voices: Vec<StrumVoice>,
    },
    Muted,
}

impl AudioCommand {
    pub fn strum(frets: FretArray, direction: StrumDirection) -> Self {
        AudioCommand::Strum {
            frets,
            direction,
            voices: strum_voices(&frets, direction),
        }
    }
}

/// String order for a strum: low→high index going down, high→low going up.
pub fn string_order(direction: StrumDirection) -> [usize; STRING_COUNT] {
    match direction {
        StrumDirection::Down => [0, 1, 2, 3, 4, 5],
        StrumDirection::Up => [5, 4, 3, 2, 1, 0],
    }
}

/// Per-string pitches and onsets for a strum with the given fret offsets.
pub fn strum_voices(frets: &FretArray, direction: StrumDirection) -> Vec<StrumVoice> {
    string_order(direction)
        .iter()
        .enumerate()
        .map(|(i, &string)| StrumVoice {
            string,
            midi: OPEN_STRING_MIDI[string] + frets[string].min(MAX_FRET),
            delay_ms: i as f32 * STRUM_STRING_DELAY_MS,
            velocity: STRUM_VELOCITY,
        })
        .collect()
}

/// Convert MIDI note number to Hz (A4 = 440 Hz).
pub fn midi_to_hz(midi: f64) -> f64 {
    440.0 * 2.0_f64.powf((midi - 69.0) / 12.0)
}

/// Fire-and-forget audio output.
pub trait AudioSink {
    fn send(&mut self, cmd: AudioCommand);

    fn play_strum(&mut self, frets: FretArray, direction: StrumDirection) {
        self.send(AudioCommand::strum(frets, direction));
    }

    fn play_muted(&mut self) {
        self.send(AudioCommand::Muted);
    }
}

/// Collects commands in memory.
impl AudioSink for Vec<AudioCommand> {
    fn send(&mut self, cmd: AudioCommand) {
        self.push(cmd);
    }
}

/// Forwards commands to an audio thread. A disconnected receiver drops
/// commands silently; audio never stalls the frame loop.
pub struct ChannelAudio {
    tx: Sender<AudioCommand>,
}

impl ChannelAudio {
    pub fn new(tx: Sender<AudioCommand>) -> Self {
        Self { tx }
    }
}

impl AudioSink for ChannelAudio {
    fn send(&mut self, cmd: AudioCommand) {
        let _ = self.tx.try_send(cmd);
    }
}
