use crate::types::*;
use log::{debug, info, warn};

/// Latest fret configuration from the paired controller.
///
/// Replaced as a whole on every update; readers only ever get a full
/// array copy. The setters are crate-private: the game's peer-event
/// handler is the single writer. While no controller is connected the
/// state reads as all-open, never as unknown.
///
/// After a disconnect, late `FRET_UPDATE`s are ignored until the next
/// connect; before the first connect, updates are accepted as they come.
#[derive(Debug, Clone)]
pub struct RemoteFretState {
    frets: FretArray,
    connected: bool,
    link_closed: bool,
    updates: u64,
}

impl RemoteFretState {
    pub fn new() -> Self {
        Self {
            frets: OPEN_FRETS,
            connected: false,
            link_closed: false,
            updates: 0,
        }
    }

    pub fn frets(&self) -> FretArray {
        self.frets
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Number of `FRET_UPDATE`s applied this session.
    pub fn update_count(&self) -> u64 {
        self.updates
    }

    /// Replace the whole array from a wire payload. Wrong length → all open;
    /// out-of-range values are clamped into `0..=MAX_FRET`.
    pub(crate) fn apply_payload(&mut self, payload: &[i64]) {
        if self.link_closed {
            debug!("ignoring FRET_UPDATE {:?} after disconnect", payload);
            return;
        }
        self.updates += 1;
        if payload.len() != STRING_COUNT {
            warn!(
                "FRET_UPDATE with {} values (expected {}), using open strings",
                payload.len(),
                STRING_COUNT
            );
            self.frets = OPEN_FRETS;
            return;
        }

        let mut next = OPEN_FRETS;
        for (slot, &raw) in next.iter_mut().zip(payload) {
            *slot = clamp_fret(raw);
        }
        if next.iter().zip(payload).any(|(&c, &raw)| c as i64 != raw) {
            warn!("FRET_UPDATE {:?} out of range, clamped to {:?}", payload, next);
        }
        self.frets = next;
        debug!("frets ← {:?}", self.frets);
    }

    pub(crate) fn on_connected(&mut self) {
        if self.connected {
            info!("controller reconnected (replacing previous link)");
        } else {
            info!("controller connected");
        }
        self.connected = true;
        self.link_closed = false;
    }

    pub(crate) fn on_disconnected(&mut self) {
        info!("controller disconnected, falling back to open strings");
        self.connected = false;
        self.link_closed = true;
        self.frets = OPEN_FRETS;
    }
}

impl Default for RemoteFretState {
    fn default() -> Self {
        Self::new()
    }
}
