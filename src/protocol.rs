//! Peer data-channel messages (JSON text, one message per datagram).
//!
//! Inbound from the controller: `{"type":"FRET_UPDATE","payload":[0,2,2,1,0,0]}`,
//! plus `READY` and `STRUM_EVENT`, which carry nothing the core uses.
//! Outbound to the controller: `{"type":"game_update","data":{"score":..,"combo":..}}`.

use crate::error::ProtocolError;
use crate::session::ScoreUpdate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum PeerMessage {
    /// Whole fret array, one entry per string, low E first. May be
    /// malformed on the wire; see [`decode`].
    #[serde(rename = "FRET_UPDATE")]
    FretUpdate { payload: Vec<i64> },

    #[serde(rename = "READY")]
    Ready {
        #[serde(default, skip_serializing_if = "Value::is_null")]
        payload: Value,
    },

    #[serde(rename = "STRUM_EVENT")]
    StrumEvent {
        #[serde(default, skip_serializing_if = "Value::is_null")]
        payload: Value,
    },

    #[serde(rename = "game_update")]
    GameUpdate { data: ScoreUpdate },
}

impl PeerMessage {
    pub fn fret_update(frets: &[u8]) -> Self {
        PeerMessage::FretUpdate {
            payload: frets.iter().map(|&f| f as i64).collect(),
        }
    }

    pub fn game_update(update: ScoreUpdate) -> Self {
        PeerMessage::GameUpdate { data: update }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            PeerMessage::FretUpdate { .. } => "FRET_UPDATE",
            PeerMessage::Ready { .. } => "READY",
            PeerMessage::StrumEvent { .. } => "STRUM_EVENT",
            PeerMessage::GameUpdate { .. } => "game_update",
        }
    }
}

pub fn encode(msg: &PeerMessage) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(msg)?)
}

/// Parse one inbound message.
///
/// A `FRET_UPDATE` whose payload is missing or contains anything other than
/// integers decodes to an empty payload rather than an error, so the fret
/// store can fall back to open strings. Length is not checked here.
pub fn decode(text: &str) -> Result<PeerMessage, ProtocolError> {
    let value: Value = serde_json::from_str(text)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingType)?;

    match kind {
        "FRET_UPDATE" => Ok(PeerMessage::FretUpdate {
            payload: integer_payload(value.get("payload")).unwrap_or_default(),
        }),
        "READY" | "STRUM_EVENT" | "game_update" => Ok(serde_json::from_value(value)?),
        other => Err(ProtocolError::UnknownType(other.to_string())),
    }
}

fn integer_payload(payload: Option<&Value>) -> Option<Vec<i64>> {
    payload?.as_array()?.iter().map(Value::as_i64).collect()
}
