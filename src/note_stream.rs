use crate::error::Fault;
use crate::types::Note;
use log::{debug, trace};

/// Chooses the target fret for each spawned note.
pub trait FretPicker: Send {
    fn pick(&mut self, palette: &[i32]) -> i32;
}

/// Seeded linear congruential picker. Deterministic for a given seed so
/// sessions can be replayed in tests.
pub struct LcgFretPicker {
    state: u64,
}

impl LcgFretPicker {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_unit(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 11) as f64) / ((1_u64 << 53) as f64)
    }
}

impl FretPicker for LcgFretPicker {
    fn pick(&mut self, palette: &[i32]) -> i32 {
        if palette.is_empty() {
            return 0;
        }
        let i = (self.next_unit() * palette.len() as f64) as usize;
        palette[i.min(palette.len() - 1)]
    }
}

/// Cycles through the palette in order. Handy for scripted demos.
pub struct SequentialFretPicker {
    next: usize,
}

impl SequentialFretPicker {
    pub fn new() -> Self {
        Self { next: 0 }
    }
}

impl Default for SequentialFretPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl FretPicker for SequentialFretPicker {
    fn pick(&mut self, palette: &[i32]) -> i32 {
        if palette.is_empty() {
            return 0;
        }
        let fret = palette[self.next % palette.len()];
        self.next = self.next.wrapping_add(1);
        fret
    }
}

/// The live set of scrolling notes, kept in spawn order.
///
/// Only the stream sets `missed` and removes notes. The judgment engine
/// sets `hit` through [`NoteStream::mark_hit`].
pub struct NoteStream {
    notes: Vec<Note>,
    next_id: u64,
    last_spawn_ms: Option<u64>,
    speed: f32,
    spawn_x: f32,
    palette: Vec<i32>,
    picker: Box<dyn FretPicker>,
}

impl NoteStream {
    pub fn new(speed: f32, spawn_x: f32, palette: Vec<i32>, picker: Box<dyn FretPicker>) -> Self {
        Self {
            notes: Vec::with_capacity(16),
            next_id: 0,
            last_spawn_ms: None,
            speed,
            spawn_x,
            palette,
            picker,
        }
    }

    /// Spawn a note at the off-screen start position if more than
    /// `min_interval_ms` have passed since the last spawn. The very first
    /// call always spawns.
    pub fn spawn_if_due(&mut self, now_ms: u64, min_interval_ms: u64) -> Option<&Note> {
        if let Some(last) = self.last_spawn_ms {
            if now_ms.saturating_sub(last) <= min_interval_ms {
                return None;
            }
        }
        let fret = self.picker.pick(&self.palette);
        let note = Note::new(self.next_id, self.spawn_x, fret);
        self.next_id += 1;
        self.last_spawn_ms = Some(now_ms);
        debug!("note {} spawned (fret {}) at t={}ms", note.id, fret, now_ms);
        self.notes.push(note);
        self.notes.last()
    }

    /// Insert a note at an explicit position (scripted charts). Returns its id.
    pub fn push_note(&mut self, x: f32, target_fret: i32) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.notes.push(Note::new(id, x, target_fret));
        id
    }

    /// Move notes `speed * delta_frames` to the right. Hit notes stay put;
    /// missed notes keep scrolling so they leave the screen and get pruned.
    pub fn advance(&mut self, delta_frames: f32) {
        let dx = self.speed * delta_frames;
        for note in self.notes.iter_mut().filter(|n| !n.hit) {
            note.x += dx;
        }
    }

    /// Mark every unresolved note past `hit_zone_x + hit_window` as missed and
    /// return the newly missed notes. Calling it again without an intervening
    /// `advance` returns nothing.
    pub fn sweep_misses(&mut self, hit_zone_x: f32, hit_window: f32) -> Vec<Note> {
        let limit = hit_zone_x + hit_window;
        let mut missed = Vec::new();
        for note in self.notes.iter_mut() {
            if !note.is_resolved() && note.x > limit {
                note.missed = true;
                trace!("note {} missed at x={:.1}", note.id, note.x);
                missed.push(note.clone());
            }
        }
        missed
    }

    /// The unresolved note closest to the hit line, strictly inside the
    /// window. Ties go to the oldest note.
    ///
    /// Fails if an unresolved note has a non-finite position; the caller
    /// should drop that note and retry.
    pub fn find_best_match(&self, hit_zone_x: f32, hit_window: f32) -> Result<Option<&Note>, Fault> {
        let mut best: Option<(&Note, f32)> = None;
        for note in self.notes.iter().filter(|n| !n.is_resolved()) {
            if !note.x.is_finite() {
                return Err(Fault::NonFinitePosition {
                    id: note.id,
                    x: note.x,
                });
            }
            let dist = (note.x - hit_zone_x).abs();
            if dist >= hit_window {
                continue;
            }
            best = match best {
                Some((b, bd)) if bd < dist || (bd == dist && b.id < note.id) => Some((b, bd)),
                _ => Some((note, dist)),
            };
        }
        Ok(best.map(|(n, _)| n))
    }

    /// Set `hit` on an unresolved note. Returns false if the note is gone
    /// or already resolved.
    pub fn mark_hit(&mut self, id: u64) -> bool {
        match self.notes.iter_mut().find(|n| n.id == id) {
            Some(n) if !n.is_resolved() => {
                n.hit = true;
                true
            }
            _ => false,
        }
    }

    /// Remove hit notes and notes scrolled beyond `prune_x`.
    pub fn prune(&mut self, prune_x: f32) {
        self.notes.retain(|n| !n.hit && n.x <= prune_x);
    }

    /// Remove the most recently pushed note carrying `id` (fault recovery).
    /// With a duplicated id the earlier, legitimate note survives.
    pub fn drop_note(&mut self, id: u64) -> bool {
        match self.notes.iter().rposition(|n| n.id == id) {
            Some(i) => {
                self.notes.remove(i);
                true
            }
            None => false,
        }
    }

    /// Check live-note invariants: unique ids, finite positions.
    pub fn validate(&self) -> Result<(), Fault> {
        for (i, note) in self.notes.iter().enumerate() {
            if !note.x.is_finite() {
                return Err(Fault::NonFinitePosition {
                    id: note.id,
                    x: note.x,
                });
            }
            if self.notes[..i].iter().any(|n| n.id == note.id) {
                return Err(Fault::DuplicateNoteId(note.id));
            }
        }
        Ok(())
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    #[cfg(test)]
    pub(crate) fn notes_mut(&mut self) -> &mut Vec<Note> {
        &mut self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Discard all notes and spawn timing (session end).
    pub fn clear(&mut self) {
        self.notes.clear();
        self.last_spawn_ms = None;
    }
}
