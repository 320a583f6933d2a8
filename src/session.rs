use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-grade tallies.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GradeCounts {
    pub perfect: u32,
    pub great: u32,
    pub miss: u32,
}

impl GradeCounts {
    pub fn judged(&self) -> u32 {
        self.perfect + self.great + self.miss
    }
}

/// Score and combo for one play session.
///
/// Mutated only by the judgment engine (the mutators are crate-private).
/// `score` and `max_combo` never decrease and `combo <= max_combo` holds
/// after every mutation.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    score: u64,
    combo: u32,
    max_combo: u32,
    counts: GradeCounts,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn counts(&self) -> GradeCounts {
        self.counts
    }

    /// Record a Perfect or Great. Returns the combo after the hit.
    pub(crate) fn record_hit(&mut self, perfect: bool, points: u32) -> u32 {
        self.score += points as u64;
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        if perfect {
            self.counts.perfect += 1;
        } else {
            self.counts.great += 1;
        }
        self.combo
    }

    pub(crate) fn record_miss(&mut self) {
        self.combo = 0;
        self.counts.miss += 1;
    }

    /// Consistent copy for presentation and peer sync. Take it at the end
    /// of a tick, never mid-judgment.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            score: self.score,
            combo: self.combo,
            max_combo: self.max_combo,
            counts: self.counts,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub counts: GradeCounts,
}

impl SessionSnapshot {
    /// Fraction of judged notes that were hit, 0.0 when nothing was judged.
    pub fn accuracy(&self) -> f32 {
        let judged = self.counts.judged();
        if judged == 0 {
            return 0.0;
        }
        (self.counts.perfect + self.counts.great) as f32 / judged as f32
    }

    /// The subset the controller displays.
    pub fn score_update(&self) -> ScoreUpdate {
        ScoreUpdate {
            score: self.score,
            combo: self.combo,
        }
    }
}

impl fmt::Display for SessionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "score={}  combo={}  max={}  P/G/M={}/{}/{}  acc={:.1}%",
            self.score,
            self.combo,
            self.max_combo,
            self.counts.perfect,
            self.counts.great,
            self.counts.miss,
            self.accuracy() * 100.0,
        )
    }
}

/// `data` of the outbound `game_update` message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub score: u64,
    pub combo: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hits_build_combo() {
        let mut s = SessionState::new();
        assert_eq!(s.record_hit(true, 1000), 1);
        assert_eq!(s.record_hit(false, 500), 2);
        assert_eq!(s.score(), 1500);
        assert_eq!(s.max_combo(), 2);
        assert_eq!(s.counts().perfect, 1);
        assert_eq!(s.counts().great, 1);
    }

    #[test]
    fn test_miss_resets_combo_keeps_max() {
        let mut s = SessionState::new();
        s.record_hit(true, 1000);
        s.record_hit(true, 1000);
        s.record_miss();
        assert_eq!(s.combo(), 0);
        assert_eq!(s.max_combo(), 2);
        assert_eq!(s.score(), 2000, "miss never lowers score");
        s.record_hit(false, 500);
        assert_eq!(s.combo(), 1);
        assert_eq!(s.max_combo(), 2);
        assert!(s.combo() <= s.max_combo());
    }

    #[test]
    fn test_snapshot_accuracy() {
        let mut s = SessionState::new();
        assert_eq!(s.snapshot().accuracy(), 0.0);
        s.record_hit(true, 1000);
        s.record_hit(false, 500);
        s.record_hit(false, 500);
        s.record_miss();
        let snap = s.snapshot();
        assert!((snap.accuracy() - 0.75).abs() < 1e-6);
        assert_eq!(snap.score_update(), ScoreUpdate { score: 2000, combo: 0 });
    }
}
