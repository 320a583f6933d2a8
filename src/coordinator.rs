use crate::audio::AudioSink;
use crate::game::{Game, TickReport};
use crate::protocol::{self, PeerMessage};
use crate::session::{ScoreUpdate, SessionSnapshot};
use crate::types::*;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, info, trace, warn};

/// The coordinator owns the [`Game`] and drives it from a single
/// `InputEvent` channel, producing [`TickReport`]s for downstream consumers.
///
/// # Ordering
///
/// Events are handled strictly in arrival order on one thread. Each
/// `Frame` event is exactly one tick. Peer events land between ticks, so a
/// fret update is never observed half-applied and the score is never read
/// mid-judgment.
///
/// # Peer sync
///
/// After a tick whose score or combo differs from what the controller last
/// saw, a `game_update` message is encoded and pushed to `peer_tx`.
pub struct Coordinator {
    input_rx: Receiver<InputEvent>,
    report_txs: Vec<Sender<TickReport>>,
    peer_tx: Option<Sender<String>>,
    audio: Box<dyn AudioSink + Send>,
    game: Game,
    last_sent: Option<ScoreUpdate>,
}

impl Coordinator {
    pub fn new(
        input_rx: Receiver<InputEvent>,
        report_txs: Vec<Sender<TickReport>>,
        audio: Box<dyn AudioSink + Send>,
        game: Game,
    ) -> Self {
        Self {
            input_rx,
            report_txs,
            peer_tx: None,
            audio,
            game,
            last_sent: None,
        }
    }

    /// Send `game_update` messages to the controller through `tx`.
    pub fn with_peer_sync(mut self, tx: Sender<String>) -> Self {
        self.peer_tx = Some(tx);
        self
    }

    /// Process events until `Stop` or until every sender is dropped.
    /// Returns the final session snapshot.
    pub fn run(&mut self) -> SessionSnapshot {
        info!("Coordinator running (peer sync: {})",
              if self.peer_tx.is_some() { "ON" } else { "OFF" });

        let mut frame_count: u64 = 0;

        while let Ok(event) = self.input_rx.recv() {
            match event {
                InputEvent::Frame(frame) => {
                    let report = self.game.tick(&frame, self.audio.as_mut());
                    self.sync_peer(&report.snapshot);

                    for j in &report.judgments {
                        trace!("t={}ms {} note {}", report.timestamp_ms, j.grade, j.note_id);
                    }
                    for tx in &self.report_txs {
                        let _ = tx.send(report.clone());
                    }

                    frame_count += 1;
                    if frame_count % 600 == 0 {
                        debug!("Coordinator: {} frames processed, {}", frame_count, report.snapshot);
                    }
                }
                InputEvent::Peer(peer) => self.game.handle_peer_event(&peer),
                InputEvent::Start => self.game.start(),
                InputEvent::TogglePause => self.game.toggle_pause(),
                InputEvent::Resize(viewport) => self.game.resize(viewport),
                InputEvent::Stop => break,
            }
        }

        self.game.end_session();
        let final_snapshot = self.game.session().snapshot();
        info!("Coordinator shutting down after {} frames: {}", frame_count, final_snapshot);
        final_snapshot
    }

    fn sync_peer(&mut self, snapshot: &SessionSnapshot) {
        let Some(tx) = &self.peer_tx else {
            return;
        };
        let update = snapshot.score_update();
        if self.last_sent == Some(update) {
            return;
        }
        match protocol::encode(&PeerMessage::game_update(update)) {
            Ok(text) => {
                let _ = tx.send(text);
                self.last_sent = Some(update);
            }
            Err(e) => warn!("failed to encode game_update: {}", e),
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }
}
