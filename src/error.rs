//! Error types for the strum/judgment core.
//!
//! Expected conditions (no hand, no note in window, debounced strum,
//! malformed fret payload) are not errors and never show up here.

use thiserror::Error;

/// An invariant violation inside the core. The host logs it and drops the
/// offending note; the session keeps running.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Fault {
    /// A note's position is NaN or infinite
    #[error("note {id} has non-finite position {x}")]
    NonFinitePosition { id: u64, x: f32 },

    /// Two live notes share one id
    #[error("duplicate note id {0}")]
    DuplicateNoteId(u64),
}

impl Fault {
    /// Id of the note the host should drop to recover.
    pub fn note_id(&self) -> u64 {
        match self {
            Fault::NonFinitePosition { id, .. } => *id,
            Fault::DuplicateNoteId(id) => *id,
        }
    }
}

/// Inbound peer text that could not be turned into a message.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message has no \"type\" field")]
    MissingType,

    #[error("unknown message type: {0}")]
    UnknownType(String),
}
