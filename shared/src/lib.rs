//! Wire protocol shared by the paddle game client and its tests.
//!
//! The protocol runs over one TCP stream per player:
//! - handshake: the simulator sends a fixed-width ASCII player index
//!   ([`PREAMBLE_LEN`] bytes), the client answers with one JSON line
//!   carrying its [`PlayerIdentity`]
//! - inbound: newline-terminated JSON [`Snapshot`] messages
//! - outbound: bare [`Intent`] tokens, repeated every tick a direction is held

pub mod framing;
pub mod skins;

pub use framing::{FrameDecodeError, FrameDecoder};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub const WORLD_WIDTH: f32 = 800.0;
pub const WORLD_HEIGHT: f32 = 600.0;
pub const PADDLE_WIDTH: f32 = 20.0;
pub const PADDLE_HEIGHT: f32 = 100.0;
pub const PADDLE_MARGIN: f32 = 20.0;
pub const BALL_RADIUS: f32 = 10.0;

pub const DEFAULT_SERVER: &str = "127.0.0.1:8080";

/// Width of the player index preamble sent by the simulator after accept.
pub const PREAMBLE_LEN: usize = 24;

/// Winner value the client substitutes when the stream dies mid-game.
pub const DISCONNECT_WINNER: i32 = -1;

pub const MOVE_UP_TOKEN: &[u8] = b"UP";
pub const MOVE_DOWN_TOKEN: &[u8] = b"DOWN";

/// Cosmetic identity sent once, as the last step of the handshake.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PlayerIdentity {
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "ball_skin")]
    pub ball_skin_id: String,
    #[serde(rename = "paddle_skin")]
    pub paddle_skin_id: String,
}

impl PlayerIdentity {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ball_skin_id: skins::DEFAULT_BALL_SKIN.to_string(),
            paddle_skin_id: skins::DEFAULT_PADDLE_SKIN.to_string(),
        }
    }

    /// Encodes the identity as one handshake line, newline included.
    pub fn encode_line(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
}

/// One authoritative state message pushed by the simulator.
///
/// Every field is optional on the wire: lobby and countdown messages carry
/// only the fields that matter at that point of the match.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Snapshot {
    /// Paddle top edge keyed by player index.
    pub paddles: BTreeMap<u8, f32>,
    pub ball: Ball,
    pub scores: (u32, u32),
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_event: Option<String>,
}

impl Snapshot {
    pub fn paddle_y(&self, player: u8) -> Option<f32> {
        self.paddles.get(&player).copied()
    }

    /// Seconds left before play starts, `None` once the countdown is over.
    pub fn active_countdown(&self) -> Option<i32> {
        self.countdown.filter(|&n| n > 0)
    }

    pub fn is_disconnect(&self) -> bool {
        self.winner == Some(DISCONNECT_WINNER)
    }

    /// Builds the terminal snapshot shown after the stream is lost.
    ///
    /// Keeps the last known field positions and scores so the end screen can
    /// still show them; a game that already has a winner is left untouched.
    pub fn disconnected_from(last: Option<&Snapshot>) -> Snapshot {
        match last {
            Some(snapshot) if snapshot.winner.is_some() => snapshot.clone(),
            Some(snapshot) => Snapshot {
                countdown: None,
                winner: Some(DISCONNECT_WINNER),
                sound_event: None,
                ..snapshot.clone()
            },
            None => Snapshot {
                winner: Some(DISCONNECT_WINNER),
                ..Snapshot::default()
            },
        }
    }
}

/// Local directional control for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Intent {
    MoveUp,
    MoveDown,
    #[default]
    None,
}

impl Intent {
    /// Up wins when both directions are held.
    pub fn from_controls(up: bool, down: bool) -> Self {
        if up {
            Intent::MoveUp
        } else if down {
            Intent::MoveDown
        } else {
            Intent::None
        }
    }

    /// Literal bytes written to the stream, `None` for the neutral intent.
    pub fn token(self) -> Option<&'static [u8]> {
        match self {
            Intent::MoveUp => Some(MOVE_UP_TOKEN),
            Intent::MoveDown => Some(MOVE_DOWN_TOKEN),
            Intent::None => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreambleError {
    #[error("preamble must be {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("preamble is not ASCII decimal: {0:?}")]
    NotDecimal(String),
}

/// Parses the fixed-width player index preamble.
///
/// The index may be padded on either side with spaces or NUL bytes. Negative
/// values are rejected, since `-1` is reserved for [`DISCONNECT_WINNER`].
pub fn parse_preamble(bytes: &[u8]) -> Result<i32, PreambleError> {
    if bytes.len() != PREAMBLE_LEN {
        return Err(PreambleError::WrongLength {
            expected: PREAMBLE_LEN,
            actual: bytes.len(),
        });
    }

    let text = std::str::from_utf8(bytes)
        .map_err(|_| PreambleError::NotDecimal(String::from_utf8_lossy(bytes).into_owned()))?;
    let trimmed = text.trim_matches(|c: char| c.is_ascii_whitespace() || c == '\0');

    match trimmed.parse::<i32>() {
        Ok(index) if index >= 0 => Ok(index),
        _ => Err(PreambleError::NotDecimal(text.to_string())),
    }
}
