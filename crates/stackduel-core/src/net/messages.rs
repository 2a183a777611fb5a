use serde::{Deserialize, Deserializer, Serialize};

use crate::player::SessionId;

/// Events a client sends to the coordinator.
///
/// On the wire every event is a JSON object `{"event": "<name>", "data": <payload>}`;
/// events without a payload omit `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Request to be paired, carrying the display name.
    JoinGame(JoinName),
    /// Per-tick snapshot of the sender's own board.
    GameUpdate(GameUpdateMsg),
    /// Raw number of rows the sender just cleared.
    LinesCleared(LinesClearedMsg),
    /// The sender topped out and lost the named session.
    GameOver(SessionId),
}

impl ClientEvent {
    /// Wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinGame(_) => "join_game",
            Self::GameUpdate(_) => "game_update",
            Self::LinesCleared(_) => "lines_cleared",
            Self::GameOver(_) => "game_over",
        }
    }

    /// Whether handling this event can change queue or session membership.
    /// Pure relay events only need shared access to the coordinator.
    pub fn mutates_sessions(&self) -> bool {
        matches!(self, Self::JoinGame(_) | Self::GameOver(_))
    }
}

/// Display name as sent in `join_game`, before validation.
///
/// A missing, null or non-string payload decodes as the empty name so the
/// sender gets a `join_error` back instead of silence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct JoinName(String);

impl JoinName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JoinName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for JoinName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl<'de> Deserialize<'de> for JoinName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<serde_json::Value>::deserialize(deserializer)? {
            Some(serde_json::Value::String(name)) => Ok(Self(name)),
            _ => Ok(Self::default()),
        }
    }
}

/// Events the coordinator sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// The client was queued and is waiting for an opponent.
    WaitingForPlayer,
    /// Names currently waiting, oldest first.
    WaitingPlayersUpdate(Vec<String>),
    /// A session was formed. Both members receive the identical payload.
    GameStart(GameStartMsg),
    /// The opponent's latest board snapshot.
    OpponentUpdate(OpponentUpdateMsg),
    /// Number of penalty rows to push onto the receiver's board.
    AddPenaltyLines(u32),
    /// The opponent topped out: the receiver won.
    OpponentLost,
    /// The opponent left mid-game; the session is over.
    OpponentDisconnected,
    /// The join request was rejected.
    JoinError(String),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::WaitingForPlayer => "waiting_for_player",
            Self::WaitingPlayersUpdate(_) => "waiting_players_update",
            Self::GameStart(_) => "game_start",
            Self::OpponentUpdate(_) => "opponent_update",
            Self::AddPenaltyLines(_) => "add_penalty_lines",
            Self::OpponentLost => "opponent_lost",
            Self::OpponentDisconnected => "opponent_disconnected",
            Self::JoinError(_) => "join_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameUpdateMsg {
    pub game_id: SessionId,
    /// Board snapshot. The coordinator never looks inside it.
    pub grid: serde_json::Value,
    pub score: u64,
    pub lines: u64,
}

impl GameUpdateMsg {
    /// Strip the session id, leaving what the opponent gets to see.
    pub fn into_opponent_update(self) -> OpponentUpdateMsg {
        OpponentUpdateMsg {
            grid: self.grid,
            score: self.score,
            lines: self.lines,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinesClearedMsg {
    pub game_id: SessionId,
    pub line_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStartMsg {
    pub game_id: SessionId,
    pub player1: String,
    pub player2: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentUpdateMsg {
    pub grid: serde_json::Value,
    pub score: u64,
    pub lines: u64,
}
